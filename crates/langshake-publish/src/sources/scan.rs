//! Page discovery

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension of scanned pages
const PAGE_EXT: &str = "html";

/// All `.html` files under `input_dir`, recursively, sorted
///
/// Symlinks are followed; each directory is visited once. A missing or
/// unreadable directory yields an empty list rather than an error.
#[must_use]
pub fn scan_pages(input_dir: impl AsRef<Path>) -> Vec<PathBuf> {
    let input_dir = input_dir.as_ref();
    if !input_dir.is_dir() {
        debug!(dir = %input_dir.display(), "input directory missing, nothing to scan");
        return Vec::new();
    }

    let mut pages = Vec::new();
    let mut visited = HashSet::new();
    let mut pending = vec![input_dir.to_path_buf()];

    while let Some(dir) = pending.pop() {
        if let Ok(canonical) = fs::canonicalize(&dir) {
            if !visited.insert(canonical) {
                continue;
            }
        }
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            // fs::metadata follows symlinks
            let Ok(meta) = fs::metadata(&path) else {
                continue;
            };
            if meta.is_dir() {
                pending.push(path);
            } else if meta.is_file() && is_page(&path) {
                pages.push(path);
            }
        }
    }

    pages.sort();
    debug!(dir = %input_dir.display(), count = pages.len(), "scanned pages");
    pages
}

fn is_page(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PAGE_EXT))
}
