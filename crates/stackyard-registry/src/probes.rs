//! First-level filesystem probes shared by the scanner and the detail
//! loader. All probes are bounded to a directory's first level so a
//! scan never recurses beyond what discovery already walked.

use std::path::{Path, PathBuf};

use stackyard_common::constants::{
    EXPLOIT_DIR_NAMES, EXPLOIT_FILE_NAMES, EXPLOIT_SOURCE_EXTENSIONS, MAX_PICTURE_FILES,
    PICTURE_FILE_EXTENSIONS,
};

/// Whether any of the given file names exists in `dir`.
pub(crate) fn has_file(dir: &Path, names: &[&str]) -> bool {
    names.iter().any(|name| dir.join(name).is_file())
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|ext| ext.to_string_lossy().to_lowercase())
}

fn first_level_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_file()))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    files
}

/// Whether `name` looks like an exploit or proof-of-concept script.
fn is_exploit_file_name(name: &str) -> bool {
    let name = name.to_lowercase();
    if EXPLOIT_FILE_NAMES.contains(&name.as_str()) {
        return true;
    }
    name.contains("exploit") && (name.ends_with(".py") || name.ends_with(".sh"))
}

/// Whether the directory bundles exploit or proof-of-concept code,
/// either as a dedicated subdirectory or as first-level script files.
pub(crate) fn has_exploit_artifacts(dir: &Path) -> bool {
    if EXPLOIT_DIR_NAMES.iter().any(|name| dir.join(name).is_dir()) {
        return true;
    }
    first_level_files(dir).iter().any(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy())
            .is_some_and(|name| is_exploit_file_name(&name))
    })
}

/// First-level picture file names, sorted, capped at
/// [`MAX_PICTURE_FILES`].
pub(crate) fn picture_files(dir: &Path) -> Vec<String> {
    first_level_files(dir)
        .iter()
        .filter(|path| {
            extension_of(path).is_some_and(|ext| PICTURE_FILE_EXTENSIONS.contains(&ext.as_str()))
        })
        .filter_map(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .take(MAX_PICTURE_FILES)
        .collect()
}

/// Exploit file paths: sources inside dedicated subdirectories plus
/// first-level scripts matching the exploit name patterns.
pub(crate) fn exploit_files(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for sub in EXPLOIT_DIR_NAMES {
        let sub_dir = dir.join(sub);
        if !sub_dir.is_dir() {
            continue;
        }
        for path in first_level_files(&sub_dir) {
            let is_source = extension_of(&path)
                .is_some_and(|ext| EXPLOIT_SOURCE_EXTENSIONS.contains(&ext.as_str()));
            if is_source {
                found.push(path);
            }
        }
    }

    for path in first_level_files(dir) {
        let matches = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .is_some_and(|name| is_exploit_file_name(&name));
        if matches {
            found.push(path);
        }
    }

    found
}
