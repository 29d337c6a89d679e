//! File discovery under the sandbox.

use std::path::{Component, Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

/// Every regular file under `root`, sorted by path. Symlinks are not followed.
///
/// A missing or unreadable root yields no files; unreadable entries are logged and skipped.
fn walk_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                if err.depth() > 0 {
                    warn!(err = %err, "skipping unreadable entry");
                }
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    files
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

/// True if any directory below `root` on the way to `path` is named in `excluded`.
pub fn is_excluded(root: &Path, path: &Path, excluded: &[String]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|component| match component {
        Component::Normal(name) => excluded.iter().any(|dir| name == dir.as_str()),
        _ => false,
    })
}

/// Test files (`<prefix>*.<extension>`) anywhere under `root`, excluded directories included.
pub fn find_test_files(root: &Path, prefix: &str, extension: &str) -> Vec<PathBuf> {
    walk_files(root)
        .into_iter()
        .filter(|path| has_extension(path, extension))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(prefix))
        })
        .collect()
}

/// Source files (`*.<extension>`) under `root`, skipping excluded directories.
pub fn find_source_files(root: &Path, extension: &str, excluded: &[String]) -> Vec<PathBuf> {
    walk_files(root)
        .into_iter()
        .filter(|path| has_extension(path, extension))
        .filter(|path| !is_excluded(root, path, excluded))
        .collect()
}
