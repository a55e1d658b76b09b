//! Path normalization utilities.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `relative_stem` - path below a root with its extension dropped

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// A path that no longer exists (a removed file) keeps its file name and
/// canonicalizes its parent instead, so removal events still compare equal
/// to paths recorded while the file existed.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    if let (Some(parent), Some(name)) = (path.parent(), path.file_name())
        && let Ok(parent) = parent.canonicalize()
    {
        return parent.join(name);
    }

    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    }
}

/// Lowercased extension of a path, if any.
#[inline]
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Path of `path` below `root`, without its extension.
///
/// Returns `None` when `path` is not inside `root`.
///
/// # Example
/// ```ignore
/// relative_stem(Path::new("/site/src/slim/blog/post.slim"), Path::new("/site/src/slim"))
///     == Some(PathBuf::from("blog/post"))
/// ```
pub fn relative_stem(path: &Path, root: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    Some(rel.with_extension(""))
}

/// Render a path relative to `root` for log output.
pub fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
