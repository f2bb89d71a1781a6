//! Two-tier registry cache.
//!
//! Tier one is the in-process snapshot; tier two is a JSON envelope on
//! disk. Corruption and staleness are never errors: both degrade to a
//! miss so the caller rebuilds. The envelope file is written with a
//! temp-file-and-rename so a crash mid-write never clobbers the previous
//! valid cache.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stackyard_common::error::{Result, StackyardError};
use stackyard_common::types::{EnvironmentId, EnvironmentStatus};

use crate::fingerprint::manifest_set_fingerprint;
use crate::record::{EnvironmentRecord, RegistrySnapshot};

/// The persisted cache payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEnvelope {
    /// The cached registry snapshot.
    pub snapshot: RegistrySnapshot,
    /// When the snapshot was captured.
    pub captured_at: DateTime<Utc>,
    /// Digest of the manifest path set the snapshot was built from.
    pub fingerprint: String,
    /// Scan root the snapshot was built from.
    pub root: PathBuf,
}

/// Owns both cache tiers. The registry is the sole caller of the
/// mutating operations; no other component touches the envelope file.
pub struct RegistryCache {
    file: PathBuf,
    ttl: Duration,
    memory: Mutex<Option<RegistrySnapshot>>,
}

impl RegistryCache {
    /// Creates a cache backed by `file` with the given TTL.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            file: file.into(),
            ttl,
            memory: Mutex::new(None),
        }
    }

    /// Returns the cached snapshot, or `None` on a miss.
    ///
    /// The in-process tier answers without I/O. The disk tier is
    /// rejected when it is older than the TTL, was built for a different
    /// root, or its fingerprint no longer matches the manifest set under
    /// `root`; a rejected or unreadable envelope is a miss, never an
    /// error.
    #[must_use]
    pub fn load(&self, root: &Path) -> Option<RegistrySnapshot> {
        if let Some(snapshot) = self.memory().as_ref() {
            return Some(snapshot.clone());
        }

        let envelope = self.read_envelope()?;
        if envelope.root != root {
            tracing::info!(
                cached = %envelope.root.display(),
                current = %root.display(),
                "cache was built for a different root"
            );
            return None;
        }

        let stale = Utc::now()
            .signed_duration_since(envelope.captured_at)
            .to_std()
            .is_ok_and(|age| age > self.ttl);
        if stale {
            tracing::info!("cache exceeded its TTL");
            return None;
        }

        let current = manifest_set_fingerprint(root).ok()?;
        if current != envelope.fingerprint {
            tracing::info!("manifest set changed since the cache was written");
            return None;
        }

        tracing::info!(count = envelope.snapshot.len(), "hydrated registry from disk cache");
        *self.memory() = Some(envelope.snapshot.clone());
        Some(envelope.snapshot)
    }

    /// Stores a freshly built snapshot in both tiers.
    ///
    /// # Errors
    ///
    /// Returns an error when the fingerprint cannot be computed or the
    /// envelope cannot be written.
    pub fn store(&self, root: &Path, snapshot: &RegistrySnapshot) -> Result<()> {
        *self.memory() = Some(snapshot.clone());

        let envelope = CacheEnvelope {
            snapshot: snapshot.clone(),
            captured_at: Utc::now(),
            fingerprint: manifest_set_fingerprint(root)?,
            root: root.to_path_buf(),
        };
        self.persist(&envelope)
    }

    /// Clears the in-process snapshot and deletes the envelope file. A
    /// subsequent [`Self::load`] is guaranteed to miss.
    pub fn invalidate(&self) {
        *self.memory() = None;
        match std::fs::remove_file(&self.file) {
            Ok(()) => tracing::info!(file = %self.file.display(), "cache envelope deleted"),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => {
                tracing::warn!(file = %self.file.display(), %error, "could not delete cache envelope");
            }
        }
    }

    /// Updates one record's status in the in-process tier.
    ///
    /// Returns whether a record with that identifier was present. The
    /// disk envelope is untouched: it records scan results, and status
    /// is a runtime observation.
    pub fn set_status(&self, id: &EnvironmentId, status: EnvironmentStatus) -> bool {
        let mut guard = self.memory();
        let Some(snapshot) = guard.as_mut() else {
            return false;
        };
        match snapshot.find_mut(id) {
            Some(record) => {
                record.status = status;
                true
            }
            None => false,
        }
    }

    /// Reads one record's status from the in-process tier, without
    /// touching disk.
    #[must_use]
    pub fn cached_status(&self, id: &EnvironmentId) -> Option<EnvironmentStatus> {
        self.memory()
            .as_ref()
            .and_then(|snapshot| snapshot.find(id))
            .map(|record| record.status)
    }

    /// Rewrites every cached record's status through `decide`, returning
    /// how many records changed.
    pub fn reconcile_statuses(
        &self,
        decide: impl Fn(&EnvironmentRecord) -> EnvironmentStatus,
    ) -> usize {
        let mut guard = self.memory();
        let Some(snapshot) = guard.as_mut() else {
            return 0;
        };
        let mut changed = 0;
        for record in snapshot.records_mut() {
            let status = decide(record);
            if record.status != status {
                record.status = status;
                changed += 1;
            }
        }
        changed
    }

    fn memory(&self) -> MutexGuard<'_, Option<RegistrySnapshot>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_envelope(&self) -> Option<CacheEnvelope> {
        let bytes = match std::fs::read(&self.file) {
            Ok(bytes) => bytes,
            Err(error) => {
                if error.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(file = %self.file.display(), %error, "cache envelope unreadable");
                }
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(envelope) => Some(envelope),
            Err(error) => {
                tracing::warn!(file = %self.file.display(), %error, "cache envelope corrupt, ignoring");
                None
            }
        }
    }

    fn persist(&self, envelope: &CacheEnvelope) -> Result<()> {
        let parent = self.file.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(StackyardError::io(parent))?;

        let mut tmp =
            tempfile::NamedTempFile::new_in(parent).map_err(StackyardError::io(parent))?;
        serde_json::to_writer_pretty(&mut tmp, envelope)?;
        tmp.write_all(b"\n").map_err(StackyardError::io(&self.file))?;
        let _ = tmp.persist(&self.file).map_err(|error| StackyardError::Io {
            path: self.file.clone(),
            source: error.error,
        })?;

        tracing::info!(
            file = %self.file.display(),
            count = envelope.snapshot.len(),
            "cache envelope written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(id: &str) -> EnvironmentRecord {
        let id = EnvironmentId::new(id);
        EnvironmentRecord {
            category: id.first_segment().to_string(),
            label: id.last_segment().to_string(),
            id,
            services: vec!["web".to_string()],
            host_ports: BTreeMap::new(),
            status: EnvironmentStatus::Unknown,
            has_exploit_artifacts: false,
            has_bundled_images: false,
            has_documentation: false,
            has_localized_documentation: false,
            has_all_images_locally: false,
        }
    }

    fn make_env(root: &Path, rel: &str) {
        let dir = root.join(rel);
        std::fs::create_dir_all(&dir).expect("env dir");
        std::fs::write(dir.join("docker-compose.yml"), "services: {}\n").expect("manifest");
    }

    fn snapshot() -> RegistrySnapshot {
        RegistrySnapshot::from_records(vec![record("a/one"), record("b/two")])
    }

    #[test]
    fn round_trip_through_disk_tier() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "a/one");
        make_env(tmp.path(), "b/two");
        let file = tmp.path().join("cache.json");

        let writer = RegistryCache::new(&file, Duration::from_secs(3600));
        writer.store(tmp.path(), &snapshot()).expect("store");

        // A fresh instance has an empty memory tier and must hydrate
        // from disk.
        let reader = RegistryCache::new(&file, Duration::from_secs(3600));
        let loaded = reader.load(tmp.path()).expect("hit");
        assert_eq!(loaded, snapshot());
    }

    #[test]
    fn memory_tier_answers_without_disk() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "a/one");
        make_env(tmp.path(), "b/two");
        let file = tmp.path().join("cache.json");

        let cache = RegistryCache::new(&file, Duration::from_secs(3600));
        cache.store(tmp.path(), &snapshot()).expect("store");
        std::fs::remove_file(&file).expect("delete file behind the cache");

        assert!(cache.load(tmp.path()).is_some());
    }

    #[test]
    fn fingerprint_mismatch_is_a_miss() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "a/one");
        let file = tmp.path().join("cache.json");

        let writer = RegistryCache::new(&file, Duration::from_secs(3600));
        writer.store(tmp.path(), &snapshot()).expect("store");

        make_env(tmp.path(), "c/new");

        let reader = RegistryCache::new(&file, Duration::from_secs(3600));
        assert!(reader.load(tmp.path()).is_none());
    }

    #[test]
    fn expired_ttl_is_a_miss() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "a/one");
        let file = tmp.path().join("cache.json");

        let writer = RegistryCache::new(&file, Duration::ZERO);
        writer.store(tmp.path(), &snapshot()).expect("store");

        std::thread::sleep(Duration::from_millis(10));
        let reader = RegistryCache::new(&file, Duration::ZERO);
        assert!(reader.load(tmp.path()).is_none());
    }

    #[test]
    fn root_mismatch_is_a_miss() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let other = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "a/one");
        make_env(other.path(), "a/one");
        let file = tmp.path().join("cache.json");

        let writer = RegistryCache::new(&file, Duration::from_secs(3600));
        writer.store(tmp.path(), &snapshot()).expect("store");

        let reader = RegistryCache::new(&file, Duration::from_secs(3600));
        assert!(reader.load(other.path()).is_none());
    }

    #[test]
    fn corrupt_envelope_is_a_miss() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "a/one");
        let file = tmp.path().join("cache.json");
        std::fs::write(&file, "{ not json").expect("corrupt file");

        let cache = RegistryCache::new(&file, Duration::from_secs(3600));
        assert!(cache.load(tmp.path()).is_none());
    }

    #[test]
    fn invalidate_guarantees_a_miss() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "a/one");
        make_env(tmp.path(), "b/two");
        let file = tmp.path().join("cache.json");

        let cache = RegistryCache::new(&file, Duration::from_secs(3600));
        cache.store(tmp.path(), &snapshot()).expect("store");
        cache.invalidate();

        assert!(cache.load(tmp.path()).is_none());
        assert!(!file.exists());
    }

    #[test]
    fn set_status_touches_only_the_named_record() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "a/one");
        make_env(tmp.path(), "b/two");
        let file = tmp.path().join("cache.json");

        let cache = RegistryCache::new(&file, Duration::from_secs(3600));
        cache.store(tmp.path(), &snapshot()).expect("store");

        assert!(cache.set_status(&EnvironmentId::new("a/one"), EnvironmentStatus::Running));
        let loaded = cache.load(tmp.path()).expect("hit");
        assert_eq!(
            loaded.find(&EnvironmentId::new("a/one")).expect("a/one").status,
            EnvironmentStatus::Running
        );
        assert_eq!(
            loaded.find(&EnvironmentId::new("b/two")).expect("b/two").status,
            EnvironmentStatus::Unknown
        );
    }

    #[test]
    fn set_status_without_snapshot_reports_false() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cache = RegistryCache::new(tmp.path().join("cache.json"), Duration::from_secs(3600));
        assert!(!cache.set_status(&EnvironmentId::new("a/one"), EnvironmentStatus::Running));
    }

    #[test]
    fn reconcile_counts_changes_only() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "a/one");
        make_env(tmp.path(), "b/two");
        let file = tmp.path().join("cache.json");

        let cache = RegistryCache::new(&file, Duration::from_secs(3600));
        cache.store(tmp.path(), &snapshot()).expect("store");

        let changed = cache.reconcile_statuses(|record| {
            if record.id.as_str() == "a/one" {
                EnvironmentStatus::Running
            } else {
                EnvironmentStatus::Stopped
            }
        });
        assert_eq!(changed, 2);

        let unchanged = cache.reconcile_statuses(|record| record.status);
        assert_eq!(unchanged, 0);
    }
}
