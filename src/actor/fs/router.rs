use std::path::{Path, PathBuf};

use super::types::DebouncedEvents;
use crate::compiler::ChangeSet;
use crate::config::SiteConfig;
use crate::source::Classifier;

pub(super) fn log_events(events: &DebouncedEvents) {
    for (path, kind) in &events.0 {
        crate::debug!("watch"; "{}: {}", kind.label(), path.display());
    }
}

/// Maps file-level events to the change set of one batch.
pub(super) struct EventRouter {
    classifier: Classifier,
    /// Roots of every source subtree
    source_dirs: Vec<PathBuf>,
    /// Output subtrees whose changes only reload the browser
    reload_dirs: Vec<PathBuf>,
}

impl EventRouter {
    pub(super) fn new(config: &SiteConfig) -> Self {
        Self {
            classifier: Classifier::new(&config.build),
            source_dirs: config
                .build
                .source_dirs()
                .iter()
                .map(|(_, dir)| dir.to_path_buf())
                .collect(),
            reload_dirs: config.reload_dirs(),
        }
    }

    /// `None` when nothing in `events` concerns the build.
    pub(super) fn route(&self, events: DebouncedEvents) -> Option<ChangeSet> {
        let mut changes = ChangeSet::default();

        for (path, kind) in events.0 {
            if self.reload_dirs.iter().any(|dir| path.starts_with(dir)) {
                changes.reload_only = true;
                continue;
            }

            let role = self.classifier.classify(&path);
            let relevant = if role.is_tracked() {
                crate::debug!("watch"; "{} {}: {}", role, kind.label(), path.display());
                true
            } else {
                // a removed directory has no extension to classify by
                kind.is_structural() && !path.exists() && self.in_source_tree(&path)
            };
            if !relevant {
                crate::debug!("watch"; "ignored: {}", path.display());
                continue;
            }

            changes.structural |= kind.is_structural();
            changes.paths.insert(path);
        }

        (!changes.is_empty()).then_some(changes)
    }

    fn in_source_tree(&self, path: &Path) -> bool {
        self.source_dirs.iter().any(|dir| path.starts_with(dir))
    }
}
