//! `syd refresh` — Invalidate the cache and rescan the tree.

use clap::Args;
use stackyard_registry::Registry;

/// Arguments for the `refresh` command.
#[derive(Args, Debug)]
pub struct RefreshArgs {}

/// Executes the `refresh` command.
///
/// # Errors
///
/// Returns an error if the rescan fails.
pub fn execute(registry: &Registry, _args: RefreshArgs) -> anyhow::Result<()> {
    let snapshot = registry.refresh().map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("Rescanned {} environment(s).", snapshot.len());
    Ok(())
}
