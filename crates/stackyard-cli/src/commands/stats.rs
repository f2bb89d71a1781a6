//! `syd stats` — Show aggregate registry statistics.

use clap::Args;
use stackyard_registry::Registry;

/// Arguments for the `stats` command.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Emit the statistics as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `stats` command.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be produced.
pub fn execute(registry: &Registry, args: StatsArgs) -> anyhow::Result<()> {
    let stats = registry.stats().map_err(|e| anyhow::anyhow!("{e}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Environments:        {}", stats.total);
    println!("Running:             {}", stats.running);
    println!("With exploit code:   {}", stats.with_exploit_artifacts);
    println!("Images all local:    {}", stats.with_all_images_locally);

    if !stats.categories.is_empty() {
        println!("\nBy category:");
        for (category, count) in &stats.categories {
            println!("  {category:<30} {count}");
        }
    }

    Ok(())
}
