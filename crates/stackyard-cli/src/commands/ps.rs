//! `syd ps` — List currently running containers.

use clap::Args;
use stackyard_registry::Registry;

/// Arguments for the `ps` command.
#[derive(Args, Debug)]
pub struct PsArgs {
    /// Emit the container list as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `ps` command.
///
/// # Errors
///
/// Returns an error if the container CLI cannot be queried.
pub fn execute(registry: &Registry, args: PsArgs) -> anyhow::Result<()> {
    let containers = registry
        .running_containers()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&containers)?);
        return Ok(());
    }

    if containers.is_empty() {
        println!("No containers running.");
        return Ok(());
    }

    println!(
        "{:<14} {:<28} {:<28} {:<20} {:<24}",
        "CONTAINER ID", "NAME", "IMAGE", "STATUS", "PORTS"
    );
    for c in &containers {
        println!(
            "{:<14} {:<28} {:<28} {:<20} {:<24}",
            c.id, c.name, c.image, c.status, c.ports
        );
    }

    Ok(())
}
