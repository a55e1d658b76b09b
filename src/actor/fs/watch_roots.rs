use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// Keeps every watch root attached, including roots that are deleted and
/// later recreated (e.g. `rm -rf src/markdown && git checkout .`).
pub(super) struct WatchRoots {
    roots: Vec<PathBuf>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            attached: FxHashSet::default(),
        }
    }

    /// Attach every root that exists now. Missing roots are picked up by
    /// [`maintain`](Self::maintain).
    pub(super) fn attach_existing(
        &mut self,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<()> {
        for root in &self.roots {
            if !root.exists() {
                crate::debug!("watch"; "not watching missing {}", root.display());
                continue;
            }
            watcher.watch(root, RecursiveMode::Recursive)?;
            self.attached.insert(root.clone());
        }
        Ok(())
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        // the watch on a deleted root is dead; forget it
        self.attached.retain(|root| root.exists());

        for root in &self.roots {
            if self.attached.contains(root) || !root.exists() {
                continue;
            }
            if watcher.watch(root, RecursiveMode::Recursive).is_ok() {
                self.attached.insert(root.clone());
                crate::debug!("watch"; "re-attached watch: {}", root.display());
            }
        }
    }
}
