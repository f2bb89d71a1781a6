//! `syd stop` — Tear an environment down.

use clap::Args;
use stackyard_common::types::EnvironmentId;
use stackyard_registry::Registry;

/// Arguments for the `stop` command.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Environment identifier (root-relative path).
    pub id: String,
}

/// Executes the `stop` command.
///
/// # Errors
///
/// Returns an error if the environment cannot be stopped.
pub fn execute(registry: &Registry, args: StopArgs) -> anyhow::Result<()> {
    let id = EnvironmentId::new(&args.id);
    registry.stop(&id).map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("Stopped {id}");
    Ok(())
}
