//! The normalized environment record and the registry snapshot.
//!
//! Every source of environment data is adapted into this one shape at
//! its boundary; nothing in the core branches on alternate record
//! layouts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stackyard_common::types::{EnvironmentId, EnvironmentStatus};

/// One compose-manifest directory, as seen by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentRecord {
    /// Root-relative identifier; the external key for all operations.
    pub id: EnvironmentId,
    /// First identifier segment, used for grouping.
    pub category: String,
    /// Last identifier segment, used for display.
    pub label: String,
    /// Service names in manifest order.
    pub services: Vec<String>,
    /// First recoverable host port per service.
    pub host_ports: BTreeMap<String, String>,
    /// Lifecycle status; scans always produce `Unknown`.
    pub status: EnvironmentStatus,
    /// Whether the directory carries exploit or proof-of-concept code.
    pub has_exploit_artifacts: bool,
    /// Whether the directory carries first-level picture files.
    pub has_bundled_images: bool,
    /// Whether a README is present.
    pub has_documentation: bool,
    /// Whether a localized README variant is present.
    pub has_localized_documentation: bool,
    /// Whether every image the manifest references exists locally.
    pub has_all_images_locally: bool,
}

/// The full ordered registry: records sorted by identifier, duplicate
/// free, so repeated scans of an unchanged tree serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrySnapshot {
    records: Vec<EnvironmentRecord>,
}

impl RegistrySnapshot {
    /// Builds a snapshot, sorting by identifier and dropping duplicates.
    #[must_use]
    pub fn from_records(mut records: Vec<EnvironmentRecord>) -> Self {
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records.dedup_by(|a, b| a.id == b.id);
        Self { records }
    }

    /// Returns the ordered records.
    #[must_use]
    pub fn records(&self) -> &[EnvironmentRecord] {
        &self.records
    }

    /// Looks up one record by identifier.
    #[must_use]
    pub fn find(&self, id: &EnvironmentId) -> Option<&EnvironmentRecord> {
        self.records
            .binary_search_by(|record| record.id.cmp(id))
            .ok()
            .map(|index| &self.records[index])
    }

    pub(crate) fn find_mut(&mut self, id: &EnvironmentId) -> Option<&mut EnvironmentRecord> {
        self.records
            .binary_search_by(|record| record.id.cmp(id))
            .ok()
            .map(|index| &mut self.records[index])
    }

    pub(crate) fn records_mut(&mut self) -> &mut [EnvironmentRecord] {
        &mut self.records
    }

    /// Number of environments in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot holds no environments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Aggregates display statistics over the snapshot.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let mut categories: BTreeMap<String, usize> = BTreeMap::new();
        for record in &self.records {
            *categories.entry(record.category.clone()).or_insert(0) += 1;
        }
        RegistryStats {
            total: self.records.len(),
            running: self
                .records
                .iter()
                .filter(|r| r.status == EnvironmentStatus::Running)
                .count(),
            with_exploit_artifacts: self
                .records
                .iter()
                .filter(|r| r.has_exploit_artifacts)
                .count(),
            with_all_images_locally: self
                .records
                .iter()
                .filter(|r| r.has_all_images_locally)
                .count(),
            categories,
        }
    }
}

impl<'a> IntoIterator for &'a RegistrySnapshot {
    type Item = &'a EnvironmentRecord;
    type IntoIter = std::slice::Iter<'a, EnvironmentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Aggregate counts over a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    /// Total environments in the registry.
    pub total: usize,
    /// Environments currently marked running.
    pub running: usize,
    /// Environments bundling exploit or proof-of-concept code.
    pub with_exploit_artifacts: usize,
    /// Environments whose images are all available locally.
    pub with_all_images_locally: usize,
    /// Environment count per category.
    pub categories: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> EnvironmentRecord {
        let id = EnvironmentId::new(id);
        EnvironmentRecord {
            category: id.first_segment().to_string(),
            label: id.last_segment().to_string(),
            id,
            services: Vec::new(),
            host_ports: BTreeMap::new(),
            status: EnvironmentStatus::Unknown,
            has_exploit_artifacts: false,
            has_bundled_images: false,
            has_documentation: false,
            has_localized_documentation: false,
            has_all_images_locally: false,
        }
    }

    #[test]
    fn from_records_sorts_by_identifier() {
        let snapshot = RegistrySnapshot::from_records(vec![
            record("zeta/z"),
            record("alpha/a"),
            record("mid/m"),
        ]);
        let ids: Vec<&str> = snapshot
            .records()
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["alpha/a", "mid/m", "zeta/z"]);
    }

    #[test]
    fn from_records_drops_duplicate_identifiers() {
        let snapshot =
            RegistrySnapshot::from_records(vec![record("a/x"), record("a/x"), record("b/y")]);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn find_locates_records_after_sorting() {
        let snapshot = RegistrySnapshot::from_records(vec![record("b/y"), record("a/x")]);
        assert!(snapshot.find(&EnvironmentId::new("a/x")).is_some());
        assert!(snapshot.find(&EnvironmentId::new("c/z")).is_none());
    }

    #[test]
    fn stats_counts_by_category_and_flags() {
        let mut running = record("web/one");
        running.status = EnvironmentStatus::Running;
        let mut armed = record("web/two");
        armed.has_exploit_artifacts = true;
        let snapshot = RegistrySnapshot::from_records(vec![running, armed, record("db/three")]);

        let stats = snapshot.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.running, 1);
        assert_eq!(stats.with_exploit_artifacts, 1);
        assert_eq!(stats.categories.get("web"), Some(&2));
        assert_eq!(stats.categories.get("db"), Some(&1));
    }
}
