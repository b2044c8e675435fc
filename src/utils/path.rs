//! Path normalization helpers.

use std::path::{Component, Path, PathBuf};

/// Normalize a path without touching the file system.
///
/// Resolves `.` and `..` components lexically so that paths coming from
/// notify events, config files and import resolution compare equal.
/// Does not resolve symlinks.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Pop unless we'd pop past a root/prefix
                if !matches!(
                    result.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                ) {
                    result.pop();
                } else if result.as_os_str().is_empty() {
                    result.push(component);
                }
            }
            other => result.push(other),
        }
    }

    result
}

/// Join a possibly-relative path onto a base directory and normalize.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// Whether the path's file name starts with a hidden-file marker (`.`).
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}
