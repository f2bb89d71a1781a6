//! `syd list` — List every environment in the registry.

use clap::Args;
use stackyard_registry::Registry;

use crate::output;

/// Arguments for the `list` command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Bypass the cache and rescan the tree.
    #[arg(short, long)]
    pub refresh: bool,

    /// Reconcile statuses against running containers before listing.
    #[arg(long)]
    pub reconcile: bool,

    /// Emit the snapshot as JSON.
    #[arg(long)]
    pub json: bool,

    /// Only show environments in this category.
    #[arg(short, long)]
    pub category: Option<String>,
}

/// Executes the `list` command.
///
/// # Errors
///
/// Returns an error if scanning fails or the snapshot cannot be
/// serialized.
pub fn execute(registry: &Registry, args: ListArgs) -> anyhow::Result<()> {
    let mut snapshot = registry
        .list(args.refresh)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    if args.reconcile {
        let _ = registry
            .reconcile_status()
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        snapshot = registry.list(false).map_err(|e| anyhow::anyhow!("{e}"))?;
    }

    let records: Vec<_> = snapshot
        .records()
        .iter()
        .filter(|record| {
            args.category
                .as_deref()
                .is_none_or(|category| record.category == category)
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No environments found.");
        return Ok(());
    }

    println!(
        "{:<45} {:<15} {:<9} {:<24} {:<12}",
        "IDENTIFIER", "CATEGORY", "STATUS", "PORTS", "FLAGS"
    );
    for record in &records {
        println!(
            "{:<45} {:<15} {:<9} {:<24} {:<12}",
            record.id,
            record.category,
            record.status,
            output::ports_cell(record),
            output::flags_cell(record)
        );
    }
    println!("\n{} environment(s)", records.len());

    Ok(())
}
