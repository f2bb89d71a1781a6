//! Domain primitive types used across the Stackyard workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for an environment within a registry.
///
/// The identifier is the manifest directory's path relative to the scan
/// root, using forward slashes on every platform (e.g.
/// `nexus/CVE-2020-10199`). It is the external key for all lifecycle
/// operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentId(String);

impl EnvironmentId {
    /// Creates an environment ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first path segment, used for category grouping.
    #[must_use]
    pub fn first_segment(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }

    /// Returns the last path segment, used as the display label.
    #[must_use]
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EnvironmentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Lifecycle status of an environment as tracked by the registry.
///
/// Mutated only by lifecycle operations or explicit status
/// reconciliation, never by a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentStatus {
    /// No lifecycle operation has been observed for this environment.
    #[default]
    Unknown,
    /// The environment's services were last seen up.
    Running,
    /// The environment's services were last seen down.
    Stopped,
}

impl fmt::Display for EnvironmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_segments() {
        let id = EnvironmentId::new("nexus/CVE-2020-10199");
        assert_eq!(id.first_segment(), "nexus");
        assert_eq!(id.last_segment(), "CVE-2020-10199");
    }

    #[test]
    fn id_single_segment() {
        let id = EnvironmentId::new("standalone");
        assert_eq!(id.first_segment(), "standalone");
        assert_eq!(id.last_segment(), "standalone");
    }

    #[test]
    fn status_display() {
        assert_eq!(EnvironmentStatus::Running.to_string(), "running");
        assert_eq!(EnvironmentStatus::default().to_string(), "unknown");
    }
}
