//! # stackyard-compose
//!
//! Manifest discovery and parsing for compose-based environments.
//!
//! Handles:
//! - **Discover**: Locating every compose manifest under a scan root,
//!   one per directory, in deterministic order.
//! - **Manifest**: Best-effort extraction of service names, host-port
//!   mappings, and image references from a single manifest.

pub mod discover;
pub mod manifest;

pub use discover::{find_manifests, manifest_in, relative_identifier};
pub use manifest::{ManifestSummary, images_from_text, parse_manifest};
