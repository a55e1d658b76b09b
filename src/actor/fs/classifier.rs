use std::path::PathBuf;

use rustc_hash::FxHashMap;

use super::debouncer::is_temp_file;
use super::types::{ChangeKind, DebouncedEvents};
use crate::source::collect_all_files;
use crate::utils::path::normalize_path;

/// Turns raw debounced events into file-level events.
///
/// Pipeline: correct_by_existence → expand_created_dirs → filter_actionable
pub(super) struct EventClassifier;

impl EventClassifier {
    pub(super) fn classify(raw: FxHashMap<PathBuf, ChangeKind>) -> Option<DebouncedEvents> {
        let mut changes = raw;

        Self::correct_by_existence(&mut changes);
        Self::expand_created_dirs(&mut changes);
        Self::filter_actionable(&mut changes);

        if changes.is_empty() {
            return None;
        }
        let mut events: Vec<_> = changes.into_iter().collect();
        events.sort_by(|a, b| a.0.cmp(&b.0));
        Some(DebouncedEvents(events))
    }

    /// Reconcile event kinds with actual filesystem state.
    ///
    /// The watcher may report stale events (e.g., Created for a file that's already
    /// been deleted, or Removed for a file that still exists after an atomic save).
    pub(super) fn correct_by_existence(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
        for (path, kind) in changes.iter_mut() {
            let exists = path.exists();
            match *kind {
                ChangeKind::Modified if !exists => {
                    crate::debug!("watch"; "upgrade modified->removed: {}", path.display());
                    *kind = ChangeKind::Removed;
                }
                ChangeKind::Removed if exists => {
                    crate::debug!("watch"; "downgrade removed->modified: {}", path.display());
                    *kind = ChangeKind::Modified;
                }
                _ => {}
            }
        }
        changes.retain(|path, kind| {
            let keep = *kind != ChangeKind::Created || path.exists();
            if !keep {
                crate::debug!("watch"; "discard created (gone): {}", path.display());
            }
            keep
        });
    }

    /// A directory moved into a watched tree arrives as one event; its files
    /// get none of their own.
    fn expand_created_dirs(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
        let created_dirs: Vec<PathBuf> = changes
            .iter()
            .filter(|(p, k)| **k == ChangeKind::Created && p.is_dir())
            .map(|(p, _)| p.clone())
            .collect();

        for dir in created_dirs {
            for file in collect_all_files(&dir) {
                if is_temp_file(&file) {
                    continue;
                }
                let file = normalize_path(&file);
                crate::debug!("watch"; "dir-scan found: {}", file.display());
                changes.entry(file).or_insert(ChangeKind::Created);
            }
        }
    }

    /// Created/Modified must be files. Removed paths are kept as-is: a
    /// removed directory is expanded later against the index.
    pub(super) fn filter_actionable(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
        changes.retain(|p, k| match k {
            ChangeKind::Created | ChangeKind::Modified => p.is_file(),
            ChangeKind::Removed => true,
        });
    }
}
