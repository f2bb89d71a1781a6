//! `syd start` — Bring an environment up, detached.

use std::time::Duration;

use clap::Args;
use stackyard_common::error::StackyardError;
use stackyard_common::types::EnvironmentId;
use stackyard_registry::Registry;

/// Arguments for the `start` command.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Environment identifier (root-relative path).
    pub id: String,

    /// After starting, wait up to this many seconds for the environment
    /// to accept connections.
    #[arg(short, long)]
    pub wait: Option<u64>,
}

/// Executes the `start` command.
///
/// # Errors
///
/// Returns an error if the environment cannot be started.
pub fn execute(registry: &Registry, args: StartArgs) -> anyhow::Result<()> {
    let id = EnvironmentId::new(&args.id);

    if let Err(error) = registry.start(&id) {
        if let StackyardError::CommandFailed {
            port_conflict: true,
            ref diagnostic,
        } = error
        {
            eprintln!("{diagnostic}");
            eprintln!(
                "A host port this environment needs is already taken. \
                 Stop the environment (or other service) holding it and retry."
            );
        }
        return Err(anyhow::anyhow!("{error}"));
    }

    println!("Started {id}");

    if let Some(secs) = args.wait {
        let report = registry
            .wait_ready(&id, Duration::from_secs(secs))
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        match (report.ready, report.port) {
            (true, Some(port)) => println!("Ready on http://127.0.0.1:{port}/"),
            (false, Some(port)) => {
                println!("Port {port} is published but did not answer within {secs}s");
            }
            (_, None) => println!("No published port appeared within {secs}s"),
        }
    }

    Ok(())
}
