//! Raw per-environment contents for single-entry views.
//!
//! The presentation layer renders markdown, thumbnails, and syntax
//! highlighting; this module only gathers the raw material: manifest
//! text, the preferred README, exploit sources, and picture file names.

use std::path::Path;

use serde::Serialize;
use stackyard_common::constants::{
    LOCALIZED_README_FILE_NAMES, MAX_EXPLOIT_CONTENT_BYTES, README_FILE_NAMES,
};

use crate::probes;
use crate::record::EnvironmentRecord;

/// One exploit or proof-of-concept source file.
#[derive(Debug, Clone, Serialize)]
pub struct ExploitFile {
    /// File name.
    pub name: String,
    /// Path relative to the environment directory.
    pub relative_path: String,
    /// File contents, capped at a fixed size.
    pub content: String,
    /// Whether `content` was truncated.
    pub truncated: bool,
    /// A usage hint extracted from the file's leading comments, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

/// Everything a single-environment view needs, in raw form.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentDetail {
    /// The environment's registry record.
    pub record: EnvironmentRecord,
    /// Raw manifest text.
    pub manifest: String,
    /// Raw markdown of the preferred README (localized variant first).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    /// Bundled exploit sources.
    pub exploit_files: Vec<ExploitFile>,
    /// First-level picture file names, bounded.
    pub pictures: Vec<String>,
}

/// Loads the detail view for a resolved environment directory.
#[must_use]
pub fn load_detail(dir: &Path, record: EnvironmentRecord) -> EnvironmentDetail {
    let manifest = stackyard_compose::manifest_in(dir)
        .and_then(|path| std::fs::read_to_string(path).ok())
        .unwrap_or_default();

    EnvironmentDetail {
        record,
        manifest,
        readme: preferred_readme(dir),
        exploit_files: load_exploit_files(dir),
        pictures: probes::picture_files(dir),
    }
}

/// Returns the raw markdown of the preferred README, localized first.
fn preferred_readme(dir: &Path) -> Option<String> {
    LOCALIZED_README_FILE_NAMES
        .iter()
        .chain(README_FILE_NAMES)
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .and_then(|path| std::fs::read_to_string(path).ok())
}

fn load_exploit_files(dir: &Path) -> Vec<ExploitFile> {
    probes::exploit_files(dir)
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let name = path.file_name()?.to_string_lossy().into_owned();
            let relative_path = path
                .strip_prefix(dir)
                .ok()?
                .to_string_lossy()
                .replace('\\', "/");
            let (content, truncated) = cap_content(content);
            Some(ExploitFile {
                name,
                relative_path,
                usage: usage_hint(&content),
                content,
                truncated,
            })
        })
        .collect()
}

fn cap_content(mut content: String) -> (String, bool) {
    if content.len() <= MAX_EXPLOIT_CONTENT_BYTES {
        return (content, false);
    }
    let mut cut = MAX_EXPLOIT_CONTENT_BYTES;
    while !content.is_char_boundary(cut) {
        cut -= 1;
    }
    content.truncate(cut);
    (content, true)
}

/// Scans the first lines of a script for a usage or example note.
fn usage_hint(content: &str) -> Option<String> {
    content.lines().take(20).find_map(|line| {
        let lowered = line.to_lowercase();
        if lowered.contains("usage:") || lowered.contains("example:") {
            Some(line.trim().to_string())
        } else {
            None
        }
    })
}
