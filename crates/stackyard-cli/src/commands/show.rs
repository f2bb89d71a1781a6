//! `syd show` — Show one environment in detail.

use clap::Args;
use stackyard_common::types::EnvironmentId;
use stackyard_registry::Registry;

/// Arguments for the `show` command.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Environment identifier (root-relative path).
    pub id: String,

    /// Emit the detail as JSON.
    #[arg(long)]
    pub json: bool,

    /// Print the raw manifest text.
    #[arg(long)]
    pub manifest: bool,
}

/// Executes the `show` command.
///
/// # Errors
///
/// Returns an error if the environment cannot be found.
pub fn execute(registry: &Registry, args: ShowArgs) -> anyhow::Result<()> {
    let detail = registry
        .get(&EnvironmentId::new(&args.id))
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let record = &detail.record;
    println!("{}", record.id);
    println!("  category: {}", record.category);
    println!("  label:    {}", record.label);
    println!("  status:   {}", record.status);

    if record.services.is_empty() {
        println!("  services: (none parsed)");
    } else {
        println!("  services:");
        for service in &record.services {
            match record.host_ports.get(service) {
                Some(port) => println!("    {service} (host port {port})"),
                None => println!("    {service}"),
            }
        }
    }

    println!(
        "  docs: {}{}",
        if record.has_documentation { "yes" } else { "no" },
        if record.has_localized_documentation {
            " (localized variant available)"
        } else {
            ""
        }
    );
    println!(
        "  images local: {}",
        if record.has_all_images_locally { "yes" } else { "no" }
    );

    if !detail.exploit_files.is_empty() {
        println!("  exploit files:");
        for file in &detail.exploit_files {
            match &file.usage {
                Some(usage) => println!("    {} — {usage}", file.relative_path),
                None => println!("    {}", file.relative_path),
            }
        }
    }

    if !detail.pictures.is_empty() {
        println!("  pictures: {}", detail.pictures.join(", "));
    }

    if args.manifest {
        println!("\n{}", detail.manifest.trim_end());
    }

    Ok(())
}
