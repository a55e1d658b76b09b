//! Task scheduler: runs a planned batch on the rayon pool.
//!
//! Every `Produce` task finishes before the first `Merge` task starts. A
//! failed task never stops the others; its outcome lands in the result list
//! and its destination is left untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use dashmap::DashMap;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::compiler::dependency::DependencyIndex;
use crate::compiler::registry::{Phase, RegenerationTask, TransformKind, TransformRegistry};
use crate::compiler::transform::{Compiled, Toolchain, read_source};
use crate::compiler::write::{remove_artifact, write_atomic};
use crate::logger::ProgressLine;
use crate::reload::{ReloadKind, ReloadTransport};
use crate::utils::path::display_relative;

/// How a single task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    CompileError(String),
    WriteError(String),
}

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub task: RegenerationTask,
    pub outcome: Outcome,
}

impl BuildResult {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Error detail, if the task failed.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success => None,
            Outcome::CompileError(detail) | Outcome::WriteError(detail) => Some(detail),
        }
    }
}

/// Results of one batch plus the reload it triggered.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<BuildResult>,
    pub reload: Option<ReloadKind>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &BuildResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn succeeded(&self) -> usize {
        self.results.len() - self.failed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// One block per failed task, paths shown relative to `root`.
    pub fn failure_detail(&self, root: &Path) -> String {
        self.failures()
            .map(|r| {
                format!(
                    "{} ({}): {}",
                    display_relative(&r.task.source, root),
                    r.task.kind,
                    r.error().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Executes task lists against one index snapshot and toolchain.
pub struct Scheduler<'a> {
    registry: &'a TransformRegistry,
    index: &'a DependencyIndex,
    toolchain: &'a Toolchain,
    include_dirs: Vec<PathBuf>,
    /// Compiled layouts, keyed by name. Cleared at the start of every batch.
    layouts: DashMap<String, Result<Arc<str>, String>>,
    progress: Option<&'a ProgressLine>,
    /// Watched output assets changed alongside this batch
    assets_changed: bool,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        registry: &'a TransformRegistry,
        index: &'a DependencyIndex,
        toolchain: &'a Toolchain,
    ) -> Self {
        Self {
            registry,
            index,
            toolchain,
            include_dirs: registry.include_dirs(),
            layouts: DashMap::new(),
            progress: None,
            assets_changed: false,
        }
    }

    pub fn with_progress(mut self, progress: &'a ProgressLine) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Reload the whole page after this batch, whatever its tasks.
    pub fn with_assets_changed(mut self, assets_changed: bool) -> Self {
        self.assets_changed = assets_changed;
        self
    }

    /// Run `tasks` (in plan order) and return one result per task, same order.
    pub fn run(&self, tasks: &[RegenerationTask]) -> Vec<BuildResult> {
        self.layouts.clear();

        let mut outcomes: Vec<Option<Outcome>> = tasks.iter().map(|_| None).collect();
        for (i, outcome) in claim_destinations(tasks) {
            outcomes[i] = Some(outcome);
        }

        for phase in [Phase::Produce, Phase::Merge] {
            let failed_markdown: FxHashSet<&Path> = tasks
                .iter()
                .zip(&outcomes)
                .filter(|(task, outcome)| {
                    task.kind == TransformKind::Markdown
                        && !matches!(outcome, Some(Outcome::Success))
                })
                .map(|(task, _)| task.source.as_path())
                .collect();

            let pending: Vec<usize> = (0..tasks.len())
                .filter(|&i| outcomes[i].is_none() && tasks[i].kind.phase() == phase)
                .collect();

            let finished: Vec<(usize, Outcome)> = pending
                .par_iter()
                .map(|&i| (i, self.execute(&tasks[i], &failed_markdown)))
                .collect();

            for (i, outcome) in finished {
                outcomes[i] = Some(outcome);
            }
        }

        tasks
            .iter()
            .cloned()
            .zip(outcomes)
            .map(|(task, outcome)| BuildResult {
                task,
                outcome: outcome
                    .unwrap_or_else(|| Outcome::CompileError("task was never scheduled".into())),
            })
            .collect()
    }

    /// Run a batch and send exactly one reload notification for it.
    pub fn run_batch(
        &self,
        tasks: &[RegenerationTask],
        transport: &dyn ReloadTransport,
    ) -> BatchReport {
        let start = Instant::now();
        let results = self.run(tasks);

        let reload = reload_kind(tasks, self.assets_changed);
        if let Some(kind) = reload {
            transport.notify(kind);
        }

        BatchReport {
            results,
            reload,
            elapsed: start.elapsed(),
        }
    }

    fn execute(&self, task: &RegenerationTask, failed_markdown: &FxHashSet<&Path>) -> Outcome {
        // keep a panicking transform from taking the batch down
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.execute_inner(task, failed_markdown)
        }))
        .unwrap_or_else(|_| Outcome::CompileError(format!("{} panicked", task.kind)));

        match &outcome {
            Outcome::Success => crate::debug!("build"; "{} {}", task.kind, task.destination.display()),
            _ => crate::debug!("build"; "{} failed for {}", task.kind, task.source.display()),
        }
        if let Some(progress) = self.progress {
            progress.inc(task.kind.name());
        }
        outcome
    }

    fn execute_inner(&self, task: &RegenerationTask, failed_markdown: &FxHashSet<&Path>) -> Outcome {
        match task.kind {
            TransformKind::Prune => return self.prune(task),
            TransformKind::Merge if failed_markdown.contains(task.source.as_path()) => {
                return Outcome::CompileError("not merged: the markdown step failed".into());
            }
            _ => {}
        }

        let compiled = match self.compile(task) {
            Ok(compiled) => compiled,
            Err(e) => return Outcome::CompileError(format!("{e:#}")),
        };
        match write_compiled(&task.destination, compiled) {
            Ok(()) => Outcome::Success,
            Err(e) => Outcome::WriteError(format!("{e:#}")),
        }
    }

    fn compile(&self, task: &RegenerationTask) -> Result<Compiled> {
        let toolchain = self.toolchain;
        match task.kind {
            TransformKind::Style => toolchain.style.compile(&task.source),
            TransformKind::Markup => toolchain
                .markup
                .compile(&task.source, &self.include_dirs)
                .map(Compiled::from),
            TransformKind::Markdown => toolchain.markdown.compile(&task.source).map(Compiled::from),
            TransformKind::Merge => self.merge(task).map(Compiled::from),
            TransformKind::Prune => Err(anyhow!("prune tasks produce no content")),
        }
    }

    fn merge(&self, task: &RegenerationTask) -> Result<String> {
        let intermediate = self
            .registry
            .intermediate_of(&task.source)
            .with_context(|| format!("{} is outside the content dir", task.source.display()))?;
        let fragment = read_source(&intermediate)?;

        let name = self
            .index
            .layout_for(&task.source)
            .with_context(|| format!("{} is not indexed", task.source.display()))?;
        let layout = self.layout(name).map_err(|e| anyhow!(e))?;

        self.toolchain.merge.merge(&fragment, &layout)
    }

    /// Compiled layout HTML, compiled at most once per batch.
    fn layout(&self, name: &str) -> Result<Arc<str>, String> {
        if let Some(cached) = self.layouts.get(name) {
            return cached.value().clone();
        }
        self.layouts
            .entry(name.to_string())
            .or_insert_with(|| {
                self.compile_layout(name)
                    .map(Arc::from)
                    .map_err(|e| format!("{e:#}"))
            })
            .value()
            .clone()
    }

    fn compile_layout(&self, name: &str) -> Result<String> {
        let file = self.index.layout_file(name).with_context(|| {
            format!(
                "layout `{name}` not found in {}",
                self.registry.build_config().layouts.display()
            )
        })?;
        self.toolchain
            .markup
            .compile(file, &self.include_dirs)
            .with_context(|| format!("layout `{name}`"))
    }

    fn prune(&self, task: &RegenerationTask) -> Outcome {
        for artifact in self.registry.artifacts_of(task) {
            if let Err(e) = remove_artifact(&artifact) {
                return Outcome::WriteError(format!("{e:#}"));
            }
        }
        Outcome::Success
    }
}

/// Write an artifact. A source map goes first, so the sheet never points at
/// a map that is not there yet.
fn write_compiled(destination: &Path, compiled: Compiled) -> Result<()> {
    let Some(map) = compiled.source_map else {
        return write_atomic(destination, &compiled.content);
    };

    let map_path = TransformRegistry::source_map_of(destination);
    write_atomic(&map_path, &map)?;
    let name = map_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    write_atomic(
        destination,
        &format!("{}\n/*# sourceMappingURL={name} */\n", compiled.content.trim_end()),
    )
}

/// Pre-resolved outcomes for tasks that must not run.
///
/// The first task (plan order) to claim a destination owns it; later
/// claimants fail with `WriteError`. A prune whose destination is rewritten
/// in the same batch is a no-op.
fn claim_destinations(tasks: &[RegenerationTask]) -> Vec<(usize, Outcome)> {
    let mut owners: FxHashMap<&Path, usize> = FxHashMap::default();
    let mut resolved = Vec::new();

    for (i, task) in tasks.iter().enumerate() {
        if task.kind == TransformKind::Prune {
            continue;
        }
        match owners.get(task.destination.as_path()) {
            Some(&owner) => resolved.push((
                i,
                Outcome::WriteError(format!(
                    "{} is already produced by {}",
                    task.destination.display(),
                    tasks[owner].source.display()
                )),
            )),
            None => {
                owners.insert(task.destination.as_path(), i);
            }
        }
    }

    for (i, task) in tasks.iter().enumerate() {
        if task.kind == TransformKind::Prune && owners.contains_key(task.destination.as_path()) {
            resolved.push((i, Outcome::Success));
        }
    }
    resolved
}

/// `StyleInject` iff every task is a style compile and no output asset
/// changed; nothing for an empty batch without asset changes.
fn reload_kind(tasks: &[RegenerationTask], assets_changed: bool) -> Option<ReloadKind> {
    if assets_changed {
        Some(ReloadKind::FullReload)
    } else if tasks.is_empty() {
        None
    } else if tasks.iter().all(|t| t.kind == TransformKind::Style) {
        Some(ReloadKind::StyleInject)
    } else {
        Some(ReloadKind::FullReload)
    }
}
