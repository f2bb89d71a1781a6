//! The registry composition root.
//!
//! Owns the cache, the scanner configuration, and the lifecycle driver,
//! and is the only component that mutates in-process snapshot state.
//! Lifecycle successes are reflected back into the cached snapshot by
//! mutating exactly one record's status; nothing here triggers a rescan
//! as a side effect of a lifecycle operation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use stackyard_common::config::RegistryConfig;
use stackyard_common::error::{Result, StackyardError};
use stackyard_common::types::{EnvironmentId, EnvironmentStatus};
use stackyard_lifecycle::{
    ContainerCli, ContainerSummary, DockerCompose, ImageReport, LifecycleDriver, PullStream,
    ReadyReport,
};

use crate::cache::RegistryCache;
use crate::detail::{self, EnvironmentDetail};
use crate::record::{RegistryStats, RegistrySnapshot};
use crate::scanner::EnvironmentScanner;

/// The facade consumed by presentation layers.
pub struct Registry {
    config: RegistryConfig,
    cache: RegistryCache,
    driver: LifecycleDriver,
    rebuild_lock: Mutex<()>,
}

impl Registry {
    /// Creates a registry over the real orchestration CLI.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_cli(config, Arc::new(DockerCompose::detect()))
    }

    /// Creates a registry over an explicit CLI implementation. This is
    /// the seam tests use to substitute a scripted CLI.
    #[must_use]
    pub fn with_cli(config: RegistryConfig, cli: Arc<dyn ContainerCli>) -> Self {
        let cache = RegistryCache::new(config.cache_file.clone(), config.cache_ttl);
        let driver = LifecycleDriver::new(config.root.clone(), cli);
        Self {
            config,
            cache,
            driver,
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Returns the configuration this registry was built with.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Lists every environment, serving from cache when possible.
    ///
    /// # Errors
    ///
    /// Fails when the scan root is missing or a rebuilt snapshot cannot
    /// be persisted.
    pub fn list(&self, force_refresh: bool) -> Result<RegistrySnapshot> {
        if !force_refresh {
            if let Some(snapshot) = self.cache.load(&self.config.root) {
                return Ok(snapshot);
            }
        }
        self.rebuild(force_refresh)
    }

    /// Forces cache invalidation followed by a full rescan.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::list`].
    pub fn refresh(&self) -> Result<RegistrySnapshot> {
        self.cache.invalidate();
        self.rebuild(true)
    }

    /// Loads the raw detail view for one environment.
    ///
    /// The record is built from the directory itself so detail never
    /// forces a tree-wide rescan; a cached lifecycle status is carried
    /// over when present.
    ///
    /// # Errors
    ///
    /// Returns [`StackyardError::NotFound`] when the identifier does not
    /// name an environment under the root.
    pub fn get(&self, id: &EnvironmentId) -> Result<EnvironmentDetail> {
        let dir = self
            .driver
            .resolve(id)
            .map_err(|_| StackyardError::NotFound {
                kind: "environment",
                id: id.as_str().to_string(),
            })?;

        let scanner = EnvironmentScanner::new(&self.config.root, &self.driver);
        let mut record = scanner
            .scan_directory(&dir)
            .ok_or_else(|| StackyardError::NotFound {
                kind: "environment",
                id: id.as_str().to_string(),
            })?;
        if let Some(status) = self.cache.cached_status(id) {
            record.status = status;
        }
        Ok(detail::load_detail(&dir, record))
    }

    /// Starts an environment and marks its cached record running.
    ///
    /// # Errors
    ///
    /// Surfaces the driver's failure unchanged; on failure the cached
    /// status is left as it was.
    pub fn start(&self, id: &EnvironmentId) -> Result<()> {
        self.driver.start(id)?;
        let _ = self.cache.set_status(id, EnvironmentStatus::Running);
        Ok(())
    }

    /// Stops an environment and marks its cached record stopped.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::start`].
    pub fn stop(&self, id: &EnvironmentId) -> Result<()> {
        self.driver.stop(id)?;
        let _ = self.cache.set_status(id, EnvironmentStatus::Stopped);
        Ok(())
    }

    /// Reports which of the environment's images are missing locally.
    #[must_use]
    pub fn check_images(&self, id: &EnvironmentId) -> ImageReport {
        self.driver.check_images(id)
    }

    /// Spawns an image pull and returns its live output stream.
    ///
    /// # Errors
    ///
    /// Fails on an invalid identifier or an unspawnable subprocess.
    pub fn pull_images(&self, id: &EnvironmentId) -> Result<PullStream> {
        self.driver.pull_images(id)
    }

    /// Waits for the environment to accept connections.
    ///
    /// # Errors
    ///
    /// Fails only on an invalid identifier.
    pub fn wait_ready(&self, id: &EnvironmentId, timeout: Duration) -> Result<ReadyReport> {
        self.driver.wait_ready(id, timeout)
    }

    /// Aggregates statistics over the current snapshot.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::list`].
    pub fn stats(&self) -> Result<RegistryStats> {
        Ok(self.list(false)?.stats())
    }

    /// Lists all currently running containers on the host.
    ///
    /// # Errors
    ///
    /// Fails when the container CLI cannot be queried.
    pub fn running_containers(&self) -> Result<Vec<ContainerSummary>> {
        self.driver.running_containers()
    }

    /// Reconciles cached statuses against the containers actually
    /// running, returning how many records changed.
    ///
    /// This is the one sanctioned way to learn statuses outside
    /// lifecycle operations; scans never do it implicitly.
    ///
    /// # Errors
    ///
    /// Fails when the snapshot cannot be produced or the container CLI
    /// cannot be queried.
    pub fn reconcile_status(&self) -> Result<usize> {
        let _ = self.list(false)?;
        let running = self.driver.running_project_dirs()?;

        let root = std::fs::canonicalize(&self.config.root)
            .unwrap_or_else(|_| self.config.root.clone());
        let changed = self.cache.reconcile_statuses(|record| {
            if running.contains(&root.join(record.id.as_str())) {
                EnvironmentStatus::Running
            } else {
                EnvironmentStatus::Stopped
            }
        });
        if changed > 0 {
            tracing::info!(changed, "reconciled environment statuses");
        }
        Ok(changed)
    }

    fn rebuild(&self, force: bool) -> Result<RegistrySnapshot> {
        let _guard = self.lock_rebuild();

        // A concurrent caller may have finished the rebuild while this
        // one waited on the lock; serve its result instead of scanning
        // again.
        if !force {
            if let Some(snapshot) = self.cache.load(&self.config.root) {
                return Ok(snapshot);
            }
        }

        let scanner = EnvironmentScanner::new(&self.config.root, &self.driver);
        let snapshot = scanner.scan()?;
        self.cache.store(&self.config.root, &snapshot)?;
        Ok(snapshot)
    }

    fn lock_rebuild(&self) -> MutexGuard<'_, ()> {
        self.rebuild_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
