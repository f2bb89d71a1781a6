//! `syd images` — Report which of an environment's images are missing.

use clap::Args;
use stackyard_common::types::EnvironmentId;
use stackyard_registry::Registry;

/// Arguments for the `images` command.
#[derive(Args, Debug)]
pub struct ImagesArgs {
    /// Environment identifier (root-relative path).
    pub id: String,

    /// Emit the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `images` command.
///
/// # Errors
///
/// Returns an error only if the report cannot be serialized.
pub fn execute(registry: &Registry, args: ImagesArgs) -> anyhow::Result<()> {
    let report = registry.check_images(&EnvironmentId::new(&args.id));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(warning) = &report.warning {
        println!("warning: {warning}");
    }

    if report.missing.is_empty() {
        println!("All images are available locally.");
    } else {
        println!("Missing images:");
        for image in &report.missing {
            println!("  {image}");
        }
        println!("\nRun `syd pull {}` to fetch them.", args.id);
    }

    Ok(())
}
