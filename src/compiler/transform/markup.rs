//! Markup pages and layouts through an external template compiler.

use std::path::{Path, PathBuf};

use anyhow::Result;
use rustc_hash::FxHashMap;

use super::{MarkupCompiler, read_source};
use crate::config::MarkupConfig;
use crate::utils::exec::{Cmd, resolve_args};

pub struct CommandMarkup {
    command: Vec<String>,
    root: PathBuf,
}

impl CommandMarkup {
    pub fn new(config: &MarkupConfig, root: &Path) -> Self {
        Self {
            command: config.command.clone(),
            root: root.to_path_buf(),
        }
    }

    fn args_for(&self, source: &Path, include_dirs: &[PathBuf]) -> Vec<String> {
        let mut vars = FxHashMap::default();
        vars.insert("SOURCE", source.display().to_string());
        vars.insert("INCLUDE_DIRS", include_dirs_literal(include_dirs));

        let mut args = resolve_args(&self.command, &vars);
        if !self.command.iter().any(|arg| arg.contains("$SOURCE")) {
            args.push(source.display().to_string());
        }
        args
    }
}

impl MarkupCompiler for CommandMarkup {
    fn compile(&self, source: &Path, include_dirs: &[PathBuf]) -> Result<String> {
        // hand-written HTML layouts need no compiler
        if source
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
        {
            return read_source(source);
        }

        let args = self.args_for(source, include_dirs);
        Cmd::from_slice(&args).cwd(&self.root).run_stdout()
    }
}

/// `["a/", "b/"]`, the form template compilers accept as an option value.
fn include_dirs_literal(dirs: &[PathBuf]) -> String {
    let dirs: Vec<String> = dirs
        .iter()
        .map(|dir| format!("{}/", dir.display().to_string().trim_end_matches('/')))
        .collect();
    serde_json::to_string(&dirs).unwrap_or_else(|_| "[]".to_string())
}
