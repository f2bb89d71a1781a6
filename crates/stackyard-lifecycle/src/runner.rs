//! Container CLI discovery and invocation.
//!
//! All interaction with the orchestration tooling goes through the
//! [`ContainerCli`] trait so the driver can be exercised against a
//! scripted implementation in tests. The real implementation detects the
//! modern `docker compose` plugin or the legacy `docker-compose` binary
//! once and reuses the choice for the process's lifetime.

use std::path::Path;
use std::process::{Command, Stdio};

use stackyard_common::error::{Result, StackyardError};

use crate::stream::PullStream;

/// Captured output of one CLI invocation.
#[derive(Debug, Clone, Default)]
pub struct CliOutput {
    /// Whether the process exited with a zero status.
    pub success: bool,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CliOutput {
    /// Builds a failed output carrying only a diagnostic message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: message.into(),
        }
    }

    /// Returns the most useful diagnostic text for this invocation:
    /// stderr when present, stdout otherwise.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let err = self.stderr.trim();
        if !err.is_empty() {
            return err.to_string();
        }
        let out = self.stdout.trim();
        if !out.is_empty() {
            return out.to_string();
        }
        "command produced no diagnostic output".to_string()
    }
}

/// Checks whether container images are present in the local store.
pub trait ImageInspector: Send + Sync {
    /// Returns `true` when `image` is available locally.
    fn image_present(&self, image: &str) -> bool;
}

/// Low-level access to the orchestration CLI.
pub trait ContainerCli: ImageInspector {
    /// Runs a compose subcommand in `dir`, capturing its output.
    fn compose(&self, dir: &Path, args: &[&str]) -> CliOutput;

    /// Runs a plain `docker` subcommand, capturing its output.
    fn docker(&self, args: &[&str]) -> CliOutput;

    /// Spawns `compose pull` in `dir` and returns its live output stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the subprocess cannot be spawned.
    fn compose_pull(&self, dir: &Path) -> Result<PullStream>;
}

/// Compose invocation forms probed during detection, modern first.
const COMPOSE_CANDIDATES: &[&[&str]] = &[&["docker", "compose"], &["docker-compose"]];

/// The real orchestration CLI, shelling out to Docker.
pub struct DockerCompose {
    compose_cmd: Vec<String>,
}

impl DockerCompose {
    /// Detects the available compose invocation form.
    ///
    /// Probes each candidate with its `version` subcommand; when none
    /// answers, defaults to `docker compose` so later invocations surface
    /// the real diagnostic instead of a detection guess.
    #[must_use]
    pub fn detect() -> Self {
        for candidate in COMPOSE_CANDIDATES {
            if which::which(candidate[0]).is_err() {
                continue;
            }
            let mut args: Vec<&str> = candidate[1..].to_vec();
            args.push("version");
            let output = run_captured(None, candidate[0], &args);
            if output.success {
                tracing::info!(command = %candidate.join(" "), "compose command detected");
                return Self {
                    compose_cmd: candidate.iter().map(ToString::to_string).collect(),
                };
            }
        }

        tracing::warn!("no compose command detected, defaulting to 'docker compose'");
        Self {
            compose_cmd: vec!["docker".to_string(), "compose".to_string()],
        }
    }

    /// Builds an instance around an explicit invocation form.
    #[must_use]
    pub fn with_command(compose_cmd: Vec<String>) -> Self {
        Self { compose_cmd }
    }

    fn compose_args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full: Vec<&str> = self.compose_cmd[1..].iter().map(String::as_str).collect();
        full.extend_from_slice(args);
        full
    }
}

impl ImageInspector for DockerCompose {
    fn image_present(&self, image: &str) -> bool {
        self.docker(&["image", "inspect", image]).success
    }
}

impl ContainerCli for DockerCompose {
    fn compose(&self, dir: &Path, args: &[&str]) -> CliOutput {
        run_captured(Some(dir), &self.compose_cmd[0], &self.compose_args(args))
    }

    fn docker(&self, args: &[&str]) -> CliOutput {
        run_captured(None, "docker", args)
    }

    fn compose_pull(&self, dir: &Path) -> Result<PullStream> {
        let args = self.compose_args(&["pull"]);
        tracing::info!(dir = %dir.display(), "spawning compose pull");

        let mut cmd = Command::new(&self.compose_cmd[0]);
        let _ = cmd
            .args(&args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(StackyardError::io(&self.compose_cmd[0]))?;
        Ok(PullStream::from_child(child))
    }
}

/// Runs a command to completion, capturing stdout and stderr.
///
/// Spawn failures (missing binary, permission problems) degrade to a
/// failed [`CliOutput`] carrying the error text, mirroring how a nonzero
/// exit is reported.
fn run_captured(dir: Option<&Path>, program: &str, args: &[&str]) -> CliOutput {
    let mut cmd = Command::new(program);
    let _ = cmd.args(args);
    if let Some(dir) = dir {
        let _ = cmd.current_dir(dir);
    }

    match cmd.output() {
        Ok(output) => CliOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        },
        Err(error) => {
            tracing::debug!(program, %error, "command could not be run");
            CliOutput::failure(format!("failed to run {program}: {error}"))
        }
    }
}
