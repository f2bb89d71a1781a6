//! CLI command definitions and dispatch.

pub mod images;
pub mod list;
pub mod ps;
pub mod pull;
pub mod ready;
pub mod refresh;
pub mod show;
pub mod start;
pub mod stats;
pub mod stop;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stackyard_common::config::RegistryConfig;
use stackyard_registry::Registry;

/// Stackyard — registry and lifecycle manager for compose environments.
#[derive(Parser, Debug)]
#[command(name = "syd", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Root directory of the environment tree.
    #[arg(
        long,
        global = true,
        env = stackyard_common::constants::ROOT_ENV_VAR,
        default_value = "."
    )]
    pub root: PathBuf,

    /// Path to the registry cache file.
    #[arg(long, global = true)]
    pub cache_file: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every environment in the registry.
    List(list::ListArgs),
    /// Show one environment in detail.
    Show(show::ShowArgs),
    /// Bring an environment up, detached.
    Start(start::StartArgs),
    /// Tear an environment down.
    Stop(stop::StopArgs),
    /// Report which of an environment's images are missing locally.
    Images(images::ImagesArgs),
    /// Pull an environment's images, streaming progress.
    Pull(pull::PullArgs),
    /// Wait until an environment accepts connections.
    Ready(ready::ReadyArgs),
    /// Invalidate the cache and rescan the tree.
    Refresh(refresh::RefreshArgs),
    /// Show aggregate registry statistics.
    Stats(stats::StatsArgs),
    /// List currently running containers.
    Ps(ps::PsArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let mut config = RegistryConfig::for_root(cli.root);
    if let Some(cache_file) = cli.cache_file {
        config = config.with_cache_file(cache_file);
    }
    tracing::debug!(
        root = %config.root.display(),
        cache_file = %config.cache_file.display(),
        "registry configured"
    );
    let registry = Registry::new(config);

    match cli.command {
        Command::List(args) => list::execute(&registry, args),
        Command::Show(args) => show::execute(&registry, args),
        Command::Start(args) => start::execute(&registry, args),
        Command::Stop(args) => stop::execute(&registry, args),
        Command::Images(args) => images::execute(&registry, args),
        Command::Pull(args) => pull::execute(&registry, args),
        Command::Ready(args) => ready::execute(&registry, args),
        Command::Refresh(args) => refresh::execute(&registry, args),
        Command::Stats(args) => stats::execute(&registry, args),
        Command::Ps(args) => ps::execute(&registry, args),
    }
}
