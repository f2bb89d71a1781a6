//! Best-effort extraction of metadata from a single compose manifest.
//!
//! Parsing never fails the caller: a registry must still list every
//! manifest directory even when individual manifests are malformed, so
//! any read or parse error degrades to empty collections.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde_yaml::Value;

/// Metadata recovered from one compose manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestSummary {
    /// Service names in manifest declaration order.
    pub services: Vec<String>,
    /// First recoverable host port per service.
    pub host_ports: BTreeMap<String, String>,
    /// Image references in declaration order, deduplicated.
    pub images: Vec<String>,
}

/// Parses the manifest at `path`, degrading to empty collections on any
/// read or parse error.
#[must_use]
pub fn parse_manifest(path: &Path) -> ManifestSummary {
    match std::fs::read_to_string(path) {
        Ok(text) => summary_from_text(&text),
        Err(error) => {
            tracing::debug!(path = %path.display(), %error, "manifest unreadable");
            ManifestSummary::default()
        }
    }
}

/// Extracts a [`ManifestSummary`] from raw manifest text.
///
/// Falls back to a textual `image:` line scan when structured parsing is
/// unavailable or yields no image references.
#[must_use]
pub fn summary_from_text(text: &str) -> ManifestSummary {
    let mut summary = ManifestSummary::default();

    if let Ok(doc) = serde_yaml::from_str::<Value>(text) {
        fill_from_document(&doc, &mut summary);
    }

    if summary.images.is_empty() {
        summary.images = images_from_text(text);
    }

    summary
}

fn fill_from_document(doc: &Value, summary: &mut ManifestSummary) {
    let Some(services) = doc.get("services").and_then(Value::as_mapping) else {
        return;
    };

    for (name, service) in services {
        let Some(name) = name.as_str() else { continue };
        summary.services.push(name.to_string());

        if let Some(image) = service.get("image").and_then(Value::as_str) {
            if !summary.images.iter().any(|known| known == image) {
                summary.images.push(image.to_string());
            }
        }

        let ports = service
            .get("ports")
            .and_then(Value::as_sequence)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if let Some(port) = ports.iter().find_map(host_port_of_entry) {
            let _ = summary.host_ports.insert(name.to_string(), port);
        }
    }
}

/// Recovers the host port from one declared port mapping, if possible.
///
/// `host:container[/proto]` and `bindaddr:host:container[/proto]` strings
/// yield the second-to-last colon token when it is numeric; long-syntax
/// mappings yield their `published` value; a bare token with no colon is
/// kept verbatim as a best-effort guess.
fn host_port_of_entry(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) => host_port_of_str(s),
        Value::Number(n) => host_port_of_str(&n.to_string()),
        Value::Mapping(_) => match entry.get("published") {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        },
        _ => None,
    }
}

fn host_port_of_str(entry: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }
    let tokens: Vec<&str> = entry.split(':').collect();
    if tokens.len() >= 2 {
        let host = tokens[tokens.len() - 2];
        host.parse::<u32>().ok().map(|port| port.to_string())
    } else {
        Some(entry.to_string())
    }
}

/// Scans raw manifest text for `image:` declarations.
///
/// Used as the degraded path when YAML parsing fails, and by the
/// lifecycle driver when the compose CLI cannot enumerate images itself.
#[must_use]
pub fn images_from_text(text: &str) -> Vec<String> {
    static IMAGE_LINE: OnceLock<Regex> = OnceLock::new();
    let pattern = IMAGE_LINE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?m)^\s*image\s*:\s*([^\s#]+)").unwrap()
    });

    let mut images = Vec::new();
    for capture in pattern.captures_iter(text) {
        let image = capture[1].trim_matches(['"', '\'']).to_string();
        if !image.is_empty() && !images.contains(&image) {
            images.push(image);
        }
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn services_keep_manifest_order() {
        let summary = summary_from_text(
            "services:\n  web:\n    image: nginx:1.25\n  db:\n    image: redis:7\n",
        );
        assert_eq!(summary.services, vec!["web", "db"]);
        assert_eq!(summary.images, vec!["nginx:1.25", "redis:7"]);
    }

    #[test]
    fn host_port_from_short_syntax() {
        let summary = summary_from_text(
            "services:\n  web:\n    ports:\n      - \"8080:80\"\n",
        );
        assert_eq!(summary.host_ports.get("web").map(String::as_str), Some("8080"));
    }

    #[test]
    fn host_port_with_bind_address() {
        let summary = summary_from_text(
            "services:\n  web:\n    ports:\n      - \"127.0.0.1:8080:80\"\n",
        );
        assert_eq!(summary.host_ports.get("web").map(String::as_str), Some("8080"));
    }

    #[test]
    fn host_port_with_protocol_suffix() {
        let summary = summary_from_text(
            "services:\n  dns:\n    ports:\n      - \"5353:53/udp\"\n",
        );
        assert_eq!(summary.host_ports.get("dns").map(String::as_str), Some("5353"));
    }

    #[test]
    fn unparseable_port_entry_yields_no_port() {
        let summary = summary_from_text(
            "services:\n  web:\n    ports:\n      - \"host.docker.internal:web\"\n",
        );
        assert!(summary.host_ports.is_empty());
        assert_eq!(summary.services, vec!["web"]);
    }

    #[test]
    fn first_recoverable_port_wins() {
        let summary = summary_from_text(
            "services:\n  web:\n    ports:\n      - \"bad:entry\"\n      - \"8443:443\"\n      - \"9000:9000\"\n",
        );
        assert_eq!(summary.host_ports.get("web").map(String::as_str), Some("8443"));
    }

    #[test]
    fn long_syntax_uses_published_field() {
        let summary = summary_from_text(
            "services:\n  web:\n    ports:\n      - target: 80\n        published: 8080\n        protocol: tcp\n",
        );
        assert_eq!(summary.host_ports.get("web").map(String::as_str), Some("8080"));
    }

    #[test]
    fn bare_token_is_best_effort_guess() {
        let summary = summary_from_text("services:\n  web:\n    ports:\n      - \"8080\"\n");
        assert_eq!(summary.host_ports.get("web").map(String::as_str), Some("8080"));
    }

    #[test]
    fn malformed_yaml_degrades_to_image_scan() {
        let summary = summary_from_text(
            "services:\n  web:\n   image: nginx:1.25\n\t bad-indent: [unclosed\n",
        );
        assert!(summary.services.is_empty());
        assert_eq!(summary.images, vec!["nginx:1.25"]);
    }

    #[test]
    fn image_scan_dedups_and_strips_quotes() {
        let images = images_from_text(
            "services:\n  a:\n    image: \"nginx:1.25\"\n  b:\n    image: nginx:1.25\n  c:\n    image: redis:7 # cache\n",
        );
        assert_eq!(images, vec!["nginx:1.25", "redis:7"]);
    }

    #[test]
    fn missing_file_yields_empty_summary() {
        let summary = parse_manifest(Path::new("/nonexistent/docker-compose.yml"));
        assert_eq!(summary, ManifestSummary::default());
    }

    #[test]
    fn duplicate_images_across_services_collapse() {
        let summary = summary_from_text(
            "services:\n  a:\n    image: nginx:1.25\n  b:\n    image: nginx:1.25\n",
        );
        assert_eq!(summary.images, vec!["nginx:1.25"]);
    }
}
