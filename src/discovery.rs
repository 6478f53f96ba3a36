//! Recursive discovery of input data files.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Find every file under `root` (recursively) whose extension matches
/// `extension`, as absolute paths in a deterministic (sorted) order.
///
/// A missing root or a root with no matching files yields an empty list;
/// callers treat that as a no-op, not an error.
pub fn discover_files(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext == extension)
        })
        .map(|entry| {
            let path = entry.into_path();
            path.canonicalize().unwrap_or(path)
        })
        .collect();
    files.sort();
    files
}
