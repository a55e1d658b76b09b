//! Build pipeline: owns the dependency index and runs batches.
//!
//! ```text
//! ChangeSet → (rebuild index) → plan → Scheduler → BatchReport
//! ```
//!
//! The pipeline is the one owner of pipeline state. The watch loop moves it
//! onto the blocking pool for each batch and takes it back afterwards.

use std::collections::BTreeSet;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compiler::dependency::DependencyIndex;
use crate::compiler::plan::TaskGraphBuilder;
use crate::compiler::registry::{RegenerationTask, TransformKind, TransformRegistry};
use crate::compiler::scheduler::{BatchReport, Scheduler};
use crate::compiler::transform::Toolchain;
use crate::config::SiteConfig;
use crate::logger::ProgressLine;
use crate::reload::ReloadTransport;
use crate::source::scan_sources;

/// Debounced changes that make up one batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    /// Changed source paths (modified, created or removed).
    pub paths: BTreeSet<PathBuf>,
    /// A source was created or removed: the index must be rebuilt.
    pub structural: bool,
    /// A watched output asset changed: the batch ends in a full reload.
    pub reload_only: bool,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && !self.reload_only
    }

    /// Fold a later change set into this one.
    pub fn merge(&mut self, other: ChangeSet) {
        self.paths.extend(other.paths);
        self.structural |= other.structural;
        self.reload_only |= other.reload_only;
    }
}

pub struct Pipeline {
    config: Arc<SiteConfig>,
    registry: TransformRegistry,
    index: DependencyIndex,
    toolchain: Toolchain,
}

impl Pipeline {
    /// Scan the source tree and build the initial index.
    pub fn new(config: Arc<SiteConfig>, toolchain: Toolchain) -> Self {
        let registry = TransformRegistry::new(&config.build);
        let mut pipeline = Self {
            config,
            registry,
            index: DependencyIndex::default(),
            toolchain,
        };
        pipeline.rebuild_index();
        pipeline
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    pub fn index(&self) -> &DependencyIndex {
        &self.index
    }

    /// Rescan every source subtree and replace the index wholesale.
    pub fn rebuild_index(&mut self) {
        let files = scan_sources(&self.config.build, self.registry.classifier());
        self.index = DependencyIndex::build(&files, &self.registry);
    }

    pub fn plan(&self, changed: &BTreeSet<PathBuf>) -> Vec<RegenerationTask> {
        TaskGraphBuilder::new(&self.registry, &self.index).plan(changed)
    }

    pub fn plan_full(&self) -> Vec<RegenerationTask> {
        TaskGraphBuilder::new(&self.registry, &self.index).plan_full()
    }

    /// Run planned tasks as one batch.
    pub fn run(&self, tasks: &[RegenerationTask], transport: &dyn ReloadTransport) -> BatchReport {
        Scheduler::new(&self.registry, &self.index, &self.toolchain).run_batch(tasks, transport)
    }

    /// Build every page, content document and style entry point.
    pub fn full_build(&self, transport: &dyn ReloadTransport) -> BatchReport {
        let tasks = self.plan_full();
        crate::debug!("build"; "{} tasks planned", tasks.len());

        if !std::io::stdout().is_terminal() {
            return self.run(&tasks, transport);
        }

        let progress = ProgressLine::new(&progress_counts(&tasks));
        let report = Scheduler::new(&self.registry, &self.index, &self.toolchain)
            .with_progress(&progress)
            .run_batch(&tasks, transport);
        progress.finish();
        report
    }

    /// Run one debounced batch of changes.
    pub fn process(&mut self, changes: &ChangeSet, transport: &dyn ReloadTransport) -> BatchReport {
        // expand against the old index: it still knows what the directory held
        let paths = self.expand_removed_dirs(&changes.paths);

        if changes.structural || self.index_is_stale(&paths) {
            crate::debug!("index"; "source added or removed, rebuilding");
            self.rebuild_index();
        }

        let tasks = self.plan(&paths);
        Scheduler::new(&self.registry, &self.index, &self.toolchain)
            .with_assets_changed(changes.reload_only)
            .run_batch(&tasks, transport)
    }

    /// Removed directories stand for every source that was indexed below them.
    fn expand_removed_dirs(&self, paths: &BTreeSet<PathBuf>) -> BTreeSet<PathBuf> {
        let mut expanded = paths.clone();
        for path in paths {
            if path.exists() || self.registry.classify(path).is_tracked() {
                continue;
            }
            expanded.extend(self.index.sources_under(path).map(Path::to_path_buf));
        }
        expanded
    }

    /// A tracked path whose presence on disk disagrees with the index.
    fn index_is_stale(&self, paths: &BTreeSet<PathBuf>) -> bool {
        paths.iter().any(|path| {
            self.registry.classify(path).is_tracked() && path.exists() != self.index.contains(path)
        })
    }
}

fn progress_counts(tasks: &[RegenerationTask]) -> Vec<(&'static str, usize)> {
    [
        TransformKind::Style,
        TransformKind::Markup,
        TransformKind::Markdown,
        TransformKind::Merge,
    ]
    .into_iter()
    .map(|kind| (kind.name(), tasks.iter().filter(|t| t.kind == kind).count()))
    .collect()
}
