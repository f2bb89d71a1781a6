//! Manifest-set fingerprinting.
//!
//! A cheap change detector: hashing the sorted relative paths of every
//! manifest under the root requires only a directory walk, not manifest
//! parsing. Added or removed manifests change the digest; edits to a
//! manifest's contents deliberately do not.

use std::path::Path;

use sha2::{Digest, Sha256};
use stackyard_common::error::Result;
use stackyard_compose::{find_manifests, relative_identifier};

/// Computes the SHA-256 digest over the sorted, concatenated relative
/// paths of every manifest currently under `root`.
///
/// # Errors
///
/// Returns [`stackyard_common::error::StackyardError::RootNotFound`]
/// when `root` does not exist.
pub fn manifest_set_fingerprint(root: &Path) -> Result<String> {
    let manifests = find_manifests(root)?;
    let mut rels: Vec<String> = manifests
        .iter()
        .filter_map(|manifest| relative_identifier(root, manifest))
        .collect();
    rels.sort();

    let mut hasher = Sha256::new();
    for rel in &rels {
        hasher.update(rel.as_bytes());
    }
    Ok(to_hex(&hasher.finalize()))
}

fn to_hex(digest: &[u8]) -> String {
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}
