//! Source tree discovery.
//!
//! Walks every configured source subtree and classifies each file.

mod classifier;

pub use classifier::Classifier;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use jwalk::WalkDir;

use crate::config::BuildConfig;
use crate::core::Role;
use crate::utils::path::normalize_path;

const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// A classified source file. Identity is `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub role: Role,
    pub modified: Option<SystemTime>,
}

impl SourceFile {
    pub fn new(path: PathBuf, role: Role) -> Self {
        let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
        Self {
            path,
            role,
            modified,
        }
    }
}

/// Collect all files from a directory recursively.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(|e| e.path())
        .collect()
}

/// Scan all source subtrees, sorted by path.
///
/// Nested subtrees are walked more than once; each path is kept once with
/// the role the classifier assigns it. Files classified `Other` are dropped.
pub fn scan_sources(build: &BuildConfig, classifier: &Classifier) -> Vec<SourceFile> {
    let mut files = BTreeMap::new();

    for (_, dir) in build.source_dirs() {
        if !dir.is_dir() {
            continue;
        }
        for path in collect_all_files(dir) {
            let path = normalize_path(&path);
            if files.contains_key(&path) {
                continue;
            }
            let role = classifier.classify(&path);
            if role != Role::Other {
                files.insert(path.clone(), SourceFile::new(path, role));
            }
        }
    }

    files.into_values().collect()
}
