//! `syd pull` — Pull an environment's images, streaming progress.

use clap::Args;
use stackyard_common::types::EnvironmentId;
use stackyard_registry::Registry;

/// Arguments for the `pull` command.
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Environment identifier (root-relative path).
    pub id: String,
}

/// Executes the `pull` command.
///
/// Prints each output line as the pull subprocess produces it.
///
/// # Errors
///
/// Returns an error if the pull cannot be spawned.
pub fn execute(registry: &Registry, args: PullArgs) -> anyhow::Result<()> {
    let stream = registry
        .pull_images(&EnvironmentId::new(&args.id))
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    for line in stream {
        println!("{line}");
    }
    println!("Pull finished.");
    Ok(())
}
