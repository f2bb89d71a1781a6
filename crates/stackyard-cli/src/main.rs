//! # syd — Stackyard CLI
//!
//! Registry and lifecycle manager for trees of compose-based
//! environments. Single binary for listing, inspecting, starting, and
//! stopping environments.

mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
        )
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
