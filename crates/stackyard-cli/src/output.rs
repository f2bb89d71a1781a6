//! Formatted output helpers for CLI commands.

use stackyard_registry::EnvironmentRecord;

/// Renders a record's probe flags as a compact cell, e.g. `EXP DOC IMG`.
#[must_use]
pub fn flags_cell(record: &EnvironmentRecord) -> String {
    let mut flags = Vec::new();
    if record.has_exploit_artifacts {
        flags.push("EXP");
    }
    if record.has_documentation {
        flags.push("DOC");
    }
    if record.has_all_images_locally {
        flags.push("IMG");
    }
    if flags.is_empty() {
        "-".to_string()
    } else {
        flags.join(" ")
    }
}

/// Renders a record's host ports as `service:port` pairs.
#[must_use]
pub fn ports_cell(record: &EnvironmentRecord) -> String {
    if record.host_ports.is_empty() {
        return "-".to_string();
    }
    record
        .host_ports
        .iter()
        .map(|(service, port)| format!("{service}:{port}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use stackyard_common::types::{EnvironmentId, EnvironmentStatus};

    fn record() -> EnvironmentRecord {
        EnvironmentRecord {
            id: EnvironmentId::new("web/env"),
            category: "web".to_string(),
            label: "env".to_string(),
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

    #[test]
    fn flags_cell_shows_dash_when_nothing_is_set() {
        assert_eq!(flags_cell(&record()), "-");
    }

    #[test]
    fn flags_cell_lists_set_flags() {
        let mut r = record();
        r.has_exploit_artifacts = true;
        r.has_all_images_locally = true;
        assert_eq!(flags_cell(&r), "EXP IMG");
    }

    #[test]
    fn ports_cell_pairs_service_and_port() {
        let mut r = record();
        let _ = r.host_ports.insert("web".to_string(), "8080".to_string());
        assert_eq!(ports_cell(&r), "web:8080");
    }
}
