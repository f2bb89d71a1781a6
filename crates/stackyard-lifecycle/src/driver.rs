//! Environment lifecycle driver.
//!
//! Every operation takes an environment identifier, resolves it against
//! the scan root, and shells out to the orchestration CLI in the
//! resolved directory. Resolution is the sole security boundary: an
//! identifier that escapes the root or lacks a manifest is rejected
//! before any subprocess is invoked.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use stackyard_common::error::{Result, StackyardError};
use stackyard_common::types::EnvironmentId;

use crate::probe;
use crate::runner::{CliOutput, ContainerCli, ImageInspector};
use crate::stream::PullStream;

/// Delay between readiness polling rounds.
const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome of an image availability check.
///
/// Always produced at the API level: an unresolved environment yields an
/// empty missing list plus a warning so callers can invoke the check
/// speculatively.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageReport {
    /// Images the manifest requires that are absent locally.
    pub missing: Vec<String>,
    /// Annotation set when the check was skipped rather than performed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Outcome of a readiness wait.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReadyReport {
    /// Whether any published port answered a probe.
    pub ready: bool,
    /// The port that answered, or the first discovered port when nothing
    /// answered (attached for diagnostics).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// One currently running container, as reported by `docker ps`.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerSummary {
    /// Short container id.
    pub id: String,
    /// Container name.
    pub name: String,
    /// Image the container was created from.
    pub image: String,
    /// Human-readable status string.
    pub status: String,
    /// Published-ports description.
    pub ports: String,
}

/// Drives environment lifecycle through the orchestration CLI.
pub struct LifecycleDriver {
    root: PathBuf,
    cli: Arc<dyn ContainerCli>,
    client: reqwest::blocking::Client,
}

impl LifecycleDriver {
    /// Creates a driver rooted at `root` over the given CLI.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, cli: Arc<dyn ContainerCli>) -> Self {
        Self {
            root: root.into(),
            cli,
            client: probe::probe_client(),
        }
    }

    /// Returns the scan root this driver resolves identifiers against.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves an identifier to its environment directory.
    ///
    /// # Errors
    ///
    /// Returns [`StackyardError::InvalidIdentifier`] when the identifier
    /// is empty, absolute, contains non-normal path components (`..`,
    /// prefixes), or names a directory without a manifest.
    pub fn resolve(&self, id: &EnvironmentId) -> Result<PathBuf> {
        let raw = id.as_str();
        let rel = Path::new(raw);

        let contained = !raw.is_empty()
            && !rel.is_absolute()
            && rel
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !contained {
            return Err(invalid(id));
        }

        let dir = self.root.join(rel);
        if stackyard_compose::manifest_in(&dir).is_none() {
            return Err(invalid(id));
        }
        Ok(dir)
    }

    /// Brings the environment up, detached.
    ///
    /// # Errors
    ///
    /// Returns [`StackyardError::CommandFailed`] carrying the CLI's
    /// diagnostic verbatim, with `port_conflict` set when the text
    /// indicates a bind failure.
    pub fn start(&self, id: &EnvironmentId) -> Result<()> {
        let dir = self.resolve(id)?;
        tracing::info!(id = %id, "starting environment");
        let output = self.cli.compose(&dir, &["up", "-d"]);
        if output.success {
            Ok(())
        } else {
            Err(command_failure(&output))
        }
    }

    /// Tears the environment down.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::start`].
    pub fn stop(&self, id: &EnvironmentId) -> Result<()> {
        let dir = self.resolve(id)?;
        tracing::info!(id = %id, "stopping environment");
        let output = self.cli.compose(&dir, &["down"]);
        if output.success {
            Ok(())
        } else {
            Err(command_failure(&output))
        }
    }

    /// Reports which of the environment's images are absent locally.
    ///
    /// Asks the CLI to enumerate required images, falling back to the
    /// manifest's own textual image list when that fails. Never fails at
    /// the API level.
    #[must_use]
    pub fn check_images(&self, id: &EnvironmentId) -> ImageReport {
        let Ok(dir) = self.resolve(id) else {
            return ImageReport {
                missing: Vec::new(),
                warning: Some(format!("environment {id} could not be resolved, check skipped")),
            };
        };

        let output = self.cli.compose(&dir, &["config", "--images"]);
        let images: Vec<String> = if output.success {
            output
                .stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToString::to_string)
                .collect()
        } else {
            manifest_images(&dir)
        };

        let missing = images
            .into_iter()
            .filter(|image| !self.cli.image_present(image))
            .collect();
        ImageReport {
            missing,
            warning: None,
        }
    }

    /// Spawns a pull for the environment's images and returns the live
    /// output stream.
    ///
    /// # Errors
    ///
    /// Fails on an invalid identifier or when the subprocess cannot be
    /// spawned.
    pub fn pull_images(&self, id: &EnvironmentId) -> Result<PullStream> {
        let dir = self.resolve(id)?;
        tracing::info!(id = %id, "pulling environment images");
        self.cli.compose_pull(&dir)
    }

    /// Waits until a published port of the environment answers an HTTP
    /// probe, or `timeout` elapses.
    ///
    /// Polls once per second: discovers currently published host ports,
    /// then probes each candidate. Reports not-ready with the first
    /// discovered port attached when nothing ever answers, and without a
    /// port when none is ever published.
    ///
    /// # Errors
    ///
    /// Fails only on an invalid identifier.
    pub fn wait_ready(&self, id: &EnvironmentId, timeout: Duration) -> Result<ReadyReport> {
        let dir = self.resolve(id)?;
        let deadline = Instant::now() + timeout;
        let mut observed = None;

        loop {
            let ports = self.published_ports(&dir);
            if observed.is_none() {
                observed = ports.first().copied();
            }
            for port in ports {
                if probe::probe_port(&self.client, port) {
                    tracing::info!(id = %id, port, "environment is accepting connections");
                    return Ok(ReadyReport {
                        ready: true,
                        port: Some(port),
                    });
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(READY_POLL_INTERVAL);
        }

        Ok(ReadyReport {
            ready: false,
            port: observed,
        })
    }

    /// Lists every currently running container on the host.
    ///
    /// # Errors
    ///
    /// Returns [`StackyardError::CommandFailed`] when `docker ps` fails.
    pub fn running_containers(&self) -> Result<Vec<ContainerSummary>> {
        let output = self.cli.docker(&["ps", "--format", "{{json .}}"]);
        if !output.success {
            return Err(command_failure(&output));
        }

        Ok(output
            .stdout
            .lines()
            .filter_map(|line| serde_json::from_str::<Value>(line.trim()).ok())
            .map(|value| container_summary(&value))
            .collect())
    }

    /// Returns the compose working directories of all running containers.
    ///
    /// Used to reconcile registry status against reality without driving
    /// any lifecycle transition.
    ///
    /// # Errors
    ///
    /// Returns [`StackyardError::CommandFailed`] when `docker ps` fails.
    pub fn running_project_dirs(&self) -> Result<HashSet<PathBuf>> {
        let output = self.cli.docker(&[
            "ps",
            "--format",
            "{{.Label \"com.docker.compose.project.working_dir\"}}",
        ]);
        if !output.success {
            return Err(command_failure(&output));
        }

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    fn published_ports(&self, dir: &Path) -> Vec<u16> {
        let output = self.cli.compose(dir, &["ps", "--format", "json"]);
        if !output.success {
            return Vec::new();
        }
        parse_published_ports(&output.stdout)
    }
}

impl ImageInspector for LifecycleDriver {
    fn image_present(&self, image: &str) -> bool {
        self.cli.image_present(image)
    }
}

fn invalid(id: &EnvironmentId) -> StackyardError {
    StackyardError::InvalidIdentifier {
        id: id.as_str().to_string(),
    }
}

fn command_failure(output: &CliOutput) -> StackyardError {
    let diagnostic = output.diagnostic();
    StackyardError::CommandFailed {
        port_conflict: is_port_conflict(&diagnostic),
        diagnostic,
    }
}

/// Whether CLI diagnostic text indicates a host-port bind conflict.
fn is_port_conflict(text: &str) -> bool {
    let text = text.to_lowercase();
    text.contains("address already in use") || text.contains("port is already allocated")
}

/// Reads image references straight from the environment's manifest.
fn manifest_images(dir: &Path) -> Vec<String> {
    stackyard_compose::manifest_in(dir)
        .and_then(|manifest| std::fs::read_to_string(manifest).ok())
        .map(|text| stackyard_compose::images_from_text(&text))
        .unwrap_or_default()
}

/// Extracts published host ports from `compose ps` output.
///
/// Accepts both shapes the CLI produces: one JSON object per line
/// (modern) and a single JSON array (older releases). Ports are
/// deduplicated in first-seen order.
fn parse_published_ports(raw: &str) -> Vec<u16> {
    let values: Vec<Value> = match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Array(items)) => items,
        _ => raw
            .lines()
            .filter_map(|line| serde_json::from_str(line.trim()).ok())
            .collect(),
    };

    let mut ports = Vec::new();
    for value in &values {
        let mut found = Vec::new();
        if let Some(ports_field) = value.get("Ports").and_then(Value::as_str) {
            found.extend(host_ports_in(ports_field));
        }
        // Newer compose releases report a Publishers array instead.
        if let Some(publishers) = value.get("Publishers").and_then(Value::as_array) {
            found.extend(
                publishers
                    .iter()
                    .filter_map(|p| p.get("PublishedPort").and_then(Value::as_u64))
                    .filter(|&port| port != 0)
                    .filter_map(|port| u16::try_from(port).ok()),
            );
        }
        for port in found {
            if !ports.contains(&port) {
                ports.push(port);
            }
        }
    }
    ports
}

/// Parses host ports out of a docker `Ports` description such as
/// `0.0.0.0:8080->80/tcp, :::8080->80/tcp`.
fn host_ports_in(description: &str) -> Vec<u16> {
    static PUBLISHED: OnceLock<Regex> = OnceLock::new();
    let pattern = PUBLISHED.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r":(\d+)->\d+/(?:tcp|udp)").unwrap()
    });

    pattern
        .captures_iter(description)
        .filter_map(|capture| capture[1].parse().ok())
        .collect()
}

fn container_summary(value: &Value) -> ContainerSummary {
    let text = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let mut id = text("ID");
    id.truncate(12);
    ContainerSummary {
        id,
        name: text("Names"),
        image: text("Image"),
        status: text("Status"),
        ports: text("Ports"),
    }
}
