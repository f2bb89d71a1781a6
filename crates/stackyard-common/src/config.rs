//! Configuration model for the Stackyard registry.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration consumed by the registry core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Root directory scanned for compose-manifest environments.
    pub root: PathBuf,
    /// Location of the persistent cache envelope.
    pub cache_file: PathBuf,
    /// Age beyond which the on-disk cache is stale by policy.
    pub cache_ttl: Duration,
}

impl RegistryConfig {
    /// Creates a configuration for the given scan root with default cache
    /// location and TTL.
    #[must_use]
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache_file: crate::constants::default_cache_file(),
            cache_ttl: crate::constants::DEFAULT_CACHE_TTL,
        }
    }

    /// Overrides the cache envelope location.
    #[must_use]
    pub fn with_cache_file(mut self, cache_file: impl Into<PathBuf>) -> Self {
        self.cache_file = cache_file.into();
        self
    }

    /// Overrides the cache TTL.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::for_root(".")
    }
}
