//! Manifest discovery across an environment tree.
//!
//! Walks the scan root recursively and returns one manifest path per
//! directory in sorted order, so that repeated walks of an unchanged
//! tree are byte-identical.

use std::path::{Path, PathBuf};

use stackyard_common::constants::MANIFEST_FILE_NAMES;
use stackyard_common::error::{Result, StackyardError};

/// Returns the manifest file for a single directory, if present.
///
/// When a directory carries several recognized manifest names, the first
/// name in [`MANIFEST_FILE_NAMES`] wins so a directory maps to exactly
/// one environment.
#[must_use]
pub fn manifest_in(dir: &Path) -> Option<PathBuf> {
    MANIFEST_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Recursively enumerates every manifest under `root`, sorted by path.
///
/// Unreadable subdirectories are skipped rather than failing the walk;
/// symlinked directories are not followed.
///
/// # Errors
///
/// Returns [`StackyardError::RootNotFound`] if `root` is not a directory.
pub fn find_manifests(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(StackyardError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut found = Vec::new();
    walk(root, &mut found);
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) {
    if let Some(manifest) = manifest_in(dir) {
        found.push(manifest);
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::debug!(dir = %dir.display(), %error, "skipping unreadable directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let is_dir = entry.file_type().is_ok_and(|ft| ft.is_dir());
        if is_dir {
            walk(&entry.path(), found);
        }
    }
}

/// Derives the forward-slash identifier of `dir` relative to `root`.
///
/// Returns `None` when `dir` is not under `root` or equals it.
#[must_use]
pub fn relative_identifier(root: &Path, dir: &Path) -> Option<String> {
    let rel = dir.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in rel.components() {
        segments.push(component.as_os_str().to_str()?);
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}
