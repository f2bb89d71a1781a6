//! `syd ready` — Wait until an environment accepts connections.

use std::time::Duration;

use clap::Args;
use stackyard_common::types::EnvironmentId;
use stackyard_registry::Registry;

/// Arguments for the `ready` command.
#[derive(Args, Debug)]
pub struct ReadyArgs {
    /// Environment identifier (root-relative path).
    pub id: String,

    /// Seconds to keep polling before giving up.
    #[arg(short, long, default_value_t = 20)]
    pub timeout: u64,
}

/// Executes the `ready` command.
///
/// # Errors
///
/// Returns an error on an invalid identifier, and when the environment
/// never becomes ready (so scripts can branch on the exit code).
pub fn execute(registry: &Registry, args: ReadyArgs) -> anyhow::Result<()> {
    let report = registry
        .wait_ready(
            &EnvironmentId::new(&args.id),
            Duration::from_secs(args.timeout),
        )
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    match (report.ready, report.port) {
        (true, Some(port)) => {
            println!("Ready on http://127.0.0.1:{port}/");
            Ok(())
        }
        (true, None) => {
            println!("Ready.");
            Ok(())
        }
        (false, Some(port)) => Err(anyhow::anyhow!(
            "port {port} is published but did not answer within {}s",
            args.timeout
        )),
        (false, None) => Err(anyhow::anyhow!(
            "no published port appeared within {}s",
            args.timeout
        )),
    }
}
