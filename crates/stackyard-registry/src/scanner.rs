//! Environment scanning.
//!
//! Walks the scan root, parses every manifest, and augments each result
//! with filesystem probes and local image availability. Per-environment
//! work is independent, so it runs on a bounded worker pool; the bound
//! exists because image inspection shells out per image and subprocess
//! fan-out is the dominant cost, not filesystem I/O.
//!
//! A scan runs to completion before results are published; callers
//! needing cancellation discard the result instead.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use stackyard_common::constants::{
    DEFAULT_SCAN_WORKERS, LOCALIZED_README_FILE_NAMES, README_FILE_NAMES, SCAN_PROGRESS_INTERVAL,
};
use stackyard_common::error::Result;
use stackyard_common::types::{EnvironmentId, EnvironmentStatus};
use stackyard_compose::{find_manifests, parse_manifest, relative_identifier};
use stackyard_lifecycle::ImageInspector;

use crate::probes;
use crate::record::{EnvironmentRecord, RegistrySnapshot};

/// Produces the full registry snapshot for one scan root.
pub struct EnvironmentScanner<'a> {
    root: &'a Path,
    inspector: &'a dyn ImageInspector,
    workers: usize,
}

impl<'a> EnvironmentScanner<'a> {
    /// Creates a scanner over `root`, checking image availability
    /// through `inspector`.
    #[must_use]
    pub fn new(root: &'a Path, inspector: &'a dyn ImageInspector) -> Self {
        Self {
            root,
            inspector,
            workers: DEFAULT_SCAN_WORKERS,
        }
    }

    /// Overrides the worker-pool bound.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = if workers == 0 { 1 } else { workers };
        self
    }

    /// Scans the whole tree and returns the sorted snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`stackyard_common::error::StackyardError::RootNotFound`]
    /// when the scan root does not exist.
    pub fn scan(&self) -> Result<RegistrySnapshot> {
        let manifests = find_manifests(self.root)?;
        let total = manifests.len();
        tracing::info!(root = %self.root.display(), total, "scanning environment tree");

        let queue = Mutex::new(manifests.into_iter());
        let records = Mutex::new(Vec::with_capacity(total));
        let scanned = AtomicUsize::new(0);

        let workers = self.workers.min(total.max(1));
        std::thread::scope(|scope| {
            for _ in 0..workers {
                let _ = scope.spawn(|| {
                    while let Some(manifest) = next_in(&queue) {
                        if let Some(record) = self.scan_manifest(&manifest) {
                            lock(&records).push(record);
                        }
                        let done = scanned.fetch_add(1, Ordering::Relaxed) + 1;
                        if done % SCAN_PROGRESS_INTERVAL == 0 {
                            tracing::info!(done, total, "scan progress");
                        }
                    }
                });
            }
        });

        let records = records
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let snapshot = RegistrySnapshot::from_records(records);
        tracing::info!(count = snapshot.len(), "scan complete");
        Ok(snapshot)
    }

    /// Builds the record for a single environment directory, if the
    /// directory is a proper descendant of the scan root.
    #[must_use]
    pub fn scan_directory(&self, dir: &Path) -> Option<EnvironmentRecord> {
        let manifest = stackyard_compose::manifest_in(dir)?;
        self.scan_manifest(&manifest)
    }

    fn scan_manifest(&self, manifest: &Path) -> Option<EnvironmentRecord> {
        let dir = manifest.parent()?;
        // A manifest sitting at the root itself has no usable identifier.
        let id = EnvironmentId::new(relative_identifier(self.root, dir)?);

        let summary = parse_manifest(manifest);
        let has_all_images_locally = !summary.images.is_empty()
            && summary
                .images
                .iter()
                .all(|image| self.inspector.image_present(image));

        Some(EnvironmentRecord {
            category: id.first_segment().to_string(),
            label: id.last_segment().to_string(),
            id,
            services: summary.services,
            host_ports: summary.host_ports,
            status: EnvironmentStatus::Unknown,
            has_exploit_artifacts: probes::has_exploit_artifacts(dir),
            has_bundled_images: !probes::picture_files(dir).is_empty(),
            has_documentation: probes::has_file(dir, README_FILE_NAMES),
            has_localized_documentation: probes::has_file(dir, LOCALIZED_README_FILE_NAMES),
            has_all_images_locally,
        })
    }
}

fn next_in(queue: &Mutex<std::vec::IntoIter<PathBuf>>) -> Option<PathBuf> {
    lock(queue).next()
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoImages;

    impl ImageInspector for NoImages {
        fn image_present(&self, _image: &str) -> bool {
            false
        }
    }

    struct AllImages;

    impl ImageInspector for AllImages {
        fn image_present(&self, _image: &str) -> bool {
            true
        }
    }

    fn make_env(root: &Path, rel: &str, manifest: &str) {
        let dir = root.join(rel);
        std::fs::create_dir_all(&dir).expect("env dir");
        std::fs::write(dir.join("docker-compose.yml"), manifest).expect("manifest");
    }

    const WEB_MANIFEST: &str = "services:\n  web:\n    image: nginx:1.25\n    ports:\n      - \"8080:80\"\n";

    #[test]
    fn scan_produces_sorted_unknown_status_records() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "zeta/CVE-2021-0002", WEB_MANIFEST);
        make_env(tmp.path(), "alpha/CVE-2020-0001", WEB_MANIFEST);

        let inspector = NoImages;
        let snapshot = EnvironmentScanner::new(tmp.path(), &inspector)
            .scan()
            .expect("scan");

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.records()[0].id.as_str(), "alpha/CVE-2020-0001");
        assert_eq!(snapshot.records()[0].category, "alpha");
        assert_eq!(snapshot.records()[0].label, "CVE-2020-0001");
        assert!(snapshot
            .records()
            .iter()
            .all(|r| r.status == EnvironmentStatus::Unknown));
    }

    #[test]
    fn repeated_scans_serialize_identically() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "a/one", WEB_MANIFEST);
        make_env(tmp.path(), "b/two", "services:\n  db:\n    image: redis:7\n");

        let inspector = NoImages;
        let scanner = EnvironmentScanner::new(tmp.path(), &inspector);
        let first = serde_json::to_vec(&scanner.scan().expect("scan")).expect("json");
        let second = serde_json::to_vec(&scanner.scan().expect("scan")).expect("json");
        assert_eq!(first, second);
    }

    #[test]
    fn records_carry_manifest_metadata() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "web/env", WEB_MANIFEST);

        let inspector = NoImages;
        let snapshot = EnvironmentScanner::new(tmp.path(), &inspector)
            .scan()
            .expect("scan");
        let record = &snapshot.records()[0];
        assert_eq!(record.services, vec!["web"]);
        assert_eq!(record.host_ports.get("web").map(String::as_str), Some("8080"));
    }

    #[test]
    fn image_availability_requires_every_image() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "a/full", WEB_MANIFEST);

        let none = NoImages;
        let all = AllImages;
        let absent = EnvironmentScanner::new(tmp.path(), &none)
            .scan()
            .expect("scan");
        let present = EnvironmentScanner::new(tmp.path(), &all)
            .scan()
            .expect("scan");
        assert!(!absent.records()[0].has_all_images_locally);
        assert!(present.records()[0].has_all_images_locally);
    }

    #[test]
    fn empty_image_list_is_never_locally_satisfied() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "a/bare", "services:\n  built:\n    build: .\n");

        let inspector = AllImages;
        let snapshot = EnvironmentScanner::new(tmp.path(), &inspector)
            .scan()
            .expect("scan");
        assert!(!snapshot.records()[0].has_all_images_locally);
    }

    #[test]
    fn malformed_manifest_still_yields_a_record() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "broken/env", ": not yaml [\n\t");

        let inspector = NoImages;
        let snapshot = EnvironmentScanner::new(tmp.path(), &inspector)
            .scan()
            .expect("scan");
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.records()[0].services.is_empty());
    }

    #[test]
    fn documentation_probes_are_reflected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        make_env(tmp.path(), "doc/env", WEB_MANIFEST);
        std::fs::write(tmp.path().join("doc/env/README.md"), "# env").expect("readme");
        std::fs::write(tmp.path().join("doc/env/README.zh-cn.md"), "# 環境").expect("readme zh");

        let inspector = NoImages;
        let snapshot = EnvironmentScanner::new(tmp.path(), &inspector)
            .scan()
            .expect("scan");
        let record = &snapshot.records()[0];
        assert!(record.has_documentation);
        assert!(record.has_localized_documentation);
    }

    #[test]
    fn missing_root_fails_the_scan() {
        let inspector = NoImages;
        let result = EnvironmentScanner::new(Path::new("/no/such/root"), &inspector).scan();
        assert!(result.is_err());
    }
}
