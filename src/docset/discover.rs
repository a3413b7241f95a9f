//! Filesystem discovery of docset bundles.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Recursion limit for the bundle scan. Deep enough for any realistic layout;
/// stops symlink cycles from recursing forever.
const MAX_SCAN_DEPTH: usize = 16;

/// Directories carrying this extension are treated as bundles.
const BUNDLE_EXTENSION: &str = "docset";

/// Collect every `.docset` bundle under `root`, depth-first.
///
/// A bundle directory is yielded and not descended into; everything else is.
/// Results are sorted for deterministic load order. Unreadable directories
/// are skipped.
pub fn find_bundles(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk(root, 0, &mut found);
    found.sort();
    found
}

fn walk(dir: &Path, depth: usize, found: &mut Vec<PathBuf>) {
    if depth > MAX_SCAN_DEPTH {
        warn!(
            "bundle scan exceeded depth {} at {}; pruning",
            MAX_SCAN_DEPTH,
            dir.display()
        );
        return;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("skipping unreadable directory {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.filter_map(std::result::Result::ok) {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if is_bundle(&path) {
            found.push(path);
        } else {
            walk(&path, depth + 1, found);
        }
    }
}

fn is_bundle(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(BUNDLE_EXTENSION))
}

/// The fixed secondary location for docsets shipped alongside the
/// executable.
pub fn bundled_docsets_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()?
        .parent()
        .map(|dir| dir.join("docsets"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use tempfile::TempDir;

    #[test]
    fn test_find_bundles_recurses_but_not_into_bundles() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("langs/Go.docset/Contents")).unwrap();
        std::fs::create_dir_all(root.join("Python.docset")).unwrap();
        // Nested inside a bundle: must not be reported.
        std::fs::create_dir_all(root.join("langs/Go.docset/Inner.docset")).unwrap();
        std::fs::create_dir_all(root.join("notes")).unwrap();
        std::fs::write(root.join("stray.docset"), "a file, not a bundle").unwrap();

        let bundles = find_bundles(root);
        check!(
            bundles
                == vec![
                    root.join("Python.docset"),
                    root.join("langs/Go.docset"),
                ]
        );
    }

    #[test]
    fn test_find_bundles_missing_root() {
        let temp = TempDir::new().unwrap();
        let bundles = find_bundles(&temp.path().join("does-not-exist"));
        check!(bundles.is_empty());
    }
}
