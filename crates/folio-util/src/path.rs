//! Path utilities.
//!
//! Snapshot metadata records file locations as forward-slash relative keys
//! (`notes/today.md`) so histories stay portable between platforms. This
//! module converts between those keys and native paths.

use std::path::{Component, Path, PathBuf};

/// Markers that identify a folio project root, in lookup order.
const PROJECT_MARKERS: &[&str] = &[".folio", "folio.jsonc", "folio.json", ".git"];

/// Convert a relative path into a forward-slash key.
///
/// Returns `None` for absolute paths, paths containing `..`, empty paths,
/// and paths that are not valid UTF-8.
pub fn to_slash(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Convert a forward-slash key back into a native relative path.
pub fn from_slash(key: &str) -> PathBuf {
    key.split('/').filter(|part| !part.is_empty()).collect()
}

/// Normalize a path by removing `.` and `..` components.
///
/// Unlike `canonicalize`, this doesn't require the path to exist.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            _ => {
                result.push(component);
            }
        }
    }

    result
}

/// Join a slash key onto a base directory, refusing keys that escape it.
pub fn safe_join(base: &Path, key: &str) -> Option<PathBuf> {
    let relative = Path::new(key);
    if relative.is_absolute() || key.split('/').any(|part| part == "..") {
        return None;
    }

    let joined = normalize(&base.join(from_slash(key)));
    if joined.starts_with(normalize(base)) && joined != normalize(base) {
        Some(joined)
    } else {
        None
    }
}

/// Find the project root by walking up the directory tree.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        for marker in PROJECT_MARKERS {
            if current.join(marker).exists() {
                return Some(current);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}
