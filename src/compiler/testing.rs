//! Test fixtures: on-disk sites and an in-process toolchain.
//!
//! `FakeMarkup` stands in for the template compiler: every line of the form
//! `include <name>` is replaced by `<name>.slim` from the first include dir
//! that has it, other lines are copied. Sources containing `FAIL` fail.
//! `FakeStyle` copies the sheet and adds a stub source map when it contains
//! `/* map */`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tempfile::TempDir;

use crate::compiler::pipeline::{ChangeSet, Pipeline};
use crate::compiler::transform::{
    CommentMerge, Compiled, MarkupCompiler, PulldownMarkdown, StyleCompiler, Toolchain, read_source,
};
use crate::config::{SiteConfig, test_config_at};
use crate::reload::{ReloadKind, ReloadTransport};

const CONFIG_FILE: &str = "kiln.toml";

type CallLog = Arc<Mutex<FxHashMap<PathBuf, usize>>>;

/// A throwaway project directory.
pub struct TestSite {
    _dir: TempDir,
    root: PathBuf,
    markup_calls: CallLog,
}

impl TestSite {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        Self {
            _dir: dir,
            root,
            markup_calls: CallLog::default(),
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// `path` relative to the site root, `/`-separated.
    pub fn rel(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn write_config(&self, content: &str) {
        self.write(CONFIG_FILE, content);
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.path(rel)).unwrap();
    }

    pub fn config(&self) -> SiteConfig {
        let content = fs::read_to_string(self.path(CONFIG_FILE)).unwrap_or_default();
        test_config_at(&self.root, &content)
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(Arc::new(self.config()), self.toolchain())
    }

    pub fn toolchain(&self) -> Toolchain {
        Toolchain {
            style: Box::new(FakeStyle),
            markup: Box::new(FakeMarkup {
                calls: Arc::clone(&self.markup_calls),
            }),
            markdown: Box::new(PulldownMarkdown::default()),
            merge: Box::new(CommentMerge),
        }
    }

    /// Changes to existing or removed paths; the pipeline works out the rest.
    pub fn changes(&self, rels: &[&str]) -> ChangeSet {
        ChangeSet {
            paths: rels.iter().map(|rel| self.path(rel)).collect(),
            ..ChangeSet::default()
        }
    }

    /// How often the markup compiler ran on `rel`.
    pub fn markup_calls(&self, rel: &str) -> usize {
        self.markup_calls
            .lock()
            .get(&self.path(rel))
            .copied()
            .unwrap_or(0)
    }

    /// Every file below `rel` with its content.
    pub fn snapshot(&self, rel: &str) -> BTreeMap<String, String> {
        crate::source::collect_all_files(&self.path(rel))
            .into_iter()
            .map(|path| {
                let content = fs::read_to_string(&path).unwrap();
                (self.rel(&path), content)
            })
            .collect()
    }
}

struct FakeStyle;

impl StyleCompiler for FakeStyle {
    fn compile(&self, source: &Path) -> Result<Compiled> {
        let css = read_source(source)?;
        if css.contains("FAIL") {
            bail!("style error in {}", source.display());
        }
        let source_map = css
            .contains("/* map */")
            .then(|| r#"{"version":3,"mappings":""}"#.to_string());
        Ok(Compiled {
            content: css,
            source_map,
        })
    }
}

struct FakeMarkup {
    calls: CallLog,
}

impl MarkupCompiler for FakeMarkup {
    fn compile(&self, source: &Path, include_dirs: &[PathBuf]) -> Result<String> {
        *self.calls.lock().entry(source.to_path_buf()).or_default() += 1;

        let text = read_source(source)?;
        if text.contains("FAIL") {
            bail!("markup error in {}", source.display());
        }

        let mut lines = Vec::new();
        for line in text.lines() {
            match line.trim().strip_prefix("include ") {
                Some(name) => {
                    let Some(found) = include_dirs
                        .iter()
                        .map(|dir| dir.join(format!("{}.slim", name.trim())))
                        .find(|candidate| candidate.is_file())
                    else {
                        bail!("cannot include `{}`", name.trim());
                    };
                    lines.push(read_source(&found)?);
                }
                None => lines.push(line.to_string()),
            }
        }
        Ok(lines.join("\n"))
    }
}

/// Records every reload notification.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<ReloadKind>>,
}

impl RecordingTransport {
    pub fn take(&self) -> Vec<ReloadKind> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl ReloadTransport for RecordingTransport {
    fn notify(&self, kind: ReloadKind) {
        self.sent.lock().push(kind);
    }
}
