//! Resource catalog: which resources have a complete, loadable index.
//!
//! A resource is available only when its directory holds both index
//! artifacts (see [`crate::index`]). Partially written resources are
//! invisible here, which is what makes ingestion's skip check and the
//! `/resources` endpoint safe against half-finished saves.

use std::path::Path;

use crate::index::{DOCSTORE_FILE, VECTORS_FILE};

/// List resource names with a complete index under `root`.
///
/// Returned in directory enumeration order (not sorted); callers wanting
/// stable ordering sort explicitly. A missing or empty `root` yields an
/// empty list. Read-only, safe to call concurrently.
///
/// Directories named `<name>.tmp` or `<name>.old` are save-in-progress
/// state (see [`crate::index`]) and never listed; resource names are cut
/// at the first dot, so a real resource cannot collide with them.
pub fn list_available(root: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| (entry.path(), entry.file_name().to_string_lossy().to_string()))
        .filter(|(_, name)| !name.ends_with(".tmp") && !name.ends_with(".old"))
        .filter(|(path, _)| is_complete_dir(path))
        .map(|(_, name)| name)
        .collect()
}

/// Whether `root/<name>` holds both index artifacts.
pub fn is_complete(root: &Path, name: &str) -> bool {
    is_complete_dir(&root.join(name))
}

fn is_complete_dir(dir: &Path) -> bool {
    dir.join(VECTORS_FILE).is_file() && dir.join(DOCSTORE_FILE).is_file()
}

/// Derive a resource name from a source file name.
///
/// The name is the file name up to the first dot, with any character
/// outside `[A-Za-z0-9._-]` replaced by `_` so it is always safe as a
/// directory name. Returns `None` for names that sanitize to nothing.
pub fn resource_name(file_name: &str) -> Option<String> {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '_' || c == '.') {
        None
    } else {
        Some(sanitized)
    }
}
