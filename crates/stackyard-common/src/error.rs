//! Unified error types for the Stackyard workspace.
//!
//! Manifest parse failures are deliberately absent: parsing is
//! best-effort and degrades to empty collections instead of erroring, so
//! a registry stays usable over a tree full of malformed manifests.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum StackyardError {
    /// The configured scan root does not exist.
    #[error("scan root not found: {path}")]
    RootNotFound {
        /// The missing root directory.
        path: PathBuf,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// An environment identifier failed containment or existence checks.
    ///
    /// Raised before any subprocess invocation; identifiers are never
    /// silently corrected.
    #[error("invalid environment identifier: {id}")]
    InvalidIdentifier {
        /// The rejected identifier.
        id: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// A container CLI invocation exited unsuccessfully.
    ///
    /// Carries the CLI's diagnostic text verbatim; `port_conflict` is set
    /// when the text matches a known bind-failure phrasing so callers can
    /// offer a specific remediation.
    #[error("container command failed: {diagnostic}")]
    CommandFailed {
        /// Diagnostic text from the CLI, unmodified.
        diagnostic: String,
        /// Whether the failure looks like a host-port bind conflict.
        port_conflict: bool,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StackyardError>;

impl StackyardError {
    /// Maps an I/O error to [`StackyardError::Io`] with the offending path.
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
