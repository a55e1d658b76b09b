//! `[build]` section configuration.
//!
//! Source subtrees, the output tree and the per-role compiler settings.
//!
//! # Example
//!
//! ```toml
//! [build]
//! output = "dist"                 # Deployable output tree
//! intermediate = ".kiln/md2html"  # Markdown HTML before layout merge
//! styles = "src/sass"
//! pages = "src/slim"
//! fragments = "src/slim/0.include"
//! layouts = "src/layout"
//! content = "src/markdown"
//!
//! [build.style]
//! extensions = ["scss", "sass", "css"]
//! command = ["sass", "--no-source-map", "--style=compressed"]
//! output = "css"                  # Subdirectory of the output tree
//! browsers = ["last 2 versions", "> 5%", "Firefox ESR"]
//! minify = true
//! source_map = false              # Write `<name>.css.map` next to each sheet
//!
//! [build.markup]
//! extensions = ["slim"]
//! command = ["slimrb", "--require", "slim/include", "$SOURCE"]
//! include_dirs = []               # Searched after the fragments dir
//!
//! [build.markdown]
//! extensions = ["md", "markdown"]
//! output = ""                     # Subdirectory for merged documents
//!
//! [build.merge]
//! default = "default"             # Layout for documents without a rule
//! publish = false                 # Also render layouts as pages
//! publish_dir = "layouts"
//! rules = [{ prefix = "blog", layout = "post" }]
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Output root.
    pub output: PathBuf,

    /// Intermediate directory for compiled markdown.
    pub intermediate: PathBuf,

    /// Style sheet sources.
    pub styles: PathBuf,

    /// Markup page sources.
    pub pages: PathBuf,

    /// Markup fragments (include directory).
    pub fragments: PathBuf,

    /// Layout sources.
    pub layouts: PathBuf,

    /// Markdown content sources.
    pub content: PathBuf,

    pub style: StyleConfig,
    pub markup: MarkupConfig,
    pub markdown: MarkdownConfig,
    pub merge: MergeConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: "dist".into(),
            intermediate: ".kiln/md2html".into(),
            styles: "src/sass".into(),
            pages: "src/slim".into(),
            fragments: "src/slim/0.include".into(),
            layouts: "src/layout".into(),
            content: "src/markdown".into(),
            style: StyleConfig::default(),
            markup: MarkupConfig::default(),
            markdown: MarkdownConfig::default(),
            merge: MergeConfig::default(),
        }
    }
}

/// `[build.style]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub extensions: Vec<String>,

    /// Compiler command. The source path is appended as the last argument
    /// unless an argument mentions `$SOURCE`.
    pub command: Vec<String>,

    /// Style subtree below the output root.
    pub output: PathBuf,

    /// Browserslist queries for vendor prefixing.
    pub browsers: Vec<String>,

    pub minify: bool,

    /// Emit a source map per sheet. The compiler is asked to embed its own
    /// map so the final one points at the original sources.
    pub source_map: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["scss".into(), "sass".into(), "css".into()],
            command: vec![
                "sass".into(),
                "--no-source-map".into(),
                "--style=compressed".into(),
            ],
            output: "css".into(),
            browsers: vec![
                "last 2 versions".into(),
                "> 5%".into(),
                "Firefox ESR".into(),
            ],
            minify: true,
            source_map: false,
        }
    }
}

/// `[build.markup]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    pub extensions: Vec<String>,

    /// Compiler command. `$SOURCE` is the page path, `$INCLUDE_DIRS` the
    /// ordered include search path as an array literal.
    pub command: Vec<String>,

    /// Extra include directories, searched after the fragments dir.
    pub include_dirs: Vec<PathBuf>,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["slim".into()],
            command: [
                "slimrb",
                "--pretty",
                "--require",
                "slim/include",
                "--option",
                "format=:xhtml",
                "--option",
                "include_dirs=$INCLUDE_DIRS",
                "$SOURCE",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            include_dirs: Vec::new(),
        }
    }
}

/// `[build.markdown]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub extensions: Vec<String>,

    /// Subdirectory of the output root for merged documents.
    pub output: PathBuf,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["md".into(), "markdown".into()],
            output: PathBuf::new(),
        }
    }
}

/// `[build.merge]`: how content documents find their layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Layout used when no rule matches.
    pub default: String,

    /// Render layouts as standalone pages too.
    pub publish: bool,

    /// Subdirectory of the output root for published layouts.
    pub publish_dir: PathBuf,

    /// Content prefix → layout associations (longest prefix wins).
    pub rules: Vec<LayoutRule>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            default: "default".into(),
            publish: false,
            publish_dir: "layouts".into(),
            rules: Vec::new(),
        }
    }
}

/// `{ prefix = "blog", layout = "post" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRule {
    /// Path prefix relative to the content dir.
    pub prefix: PathBuf,
    /// Layout name (path below the layouts dir, no extension).
    pub layout: String,
}

impl BuildConfig {
    /// Resolve every path against `root` and tidy extension lists.
    pub(crate) fn normalize(&mut self, root: &Path) {
        use crate::utils::path::normalize_path;

        for dir in [
            &mut self.output,
            &mut self.intermediate,
            &mut self.styles,
            &mut self.pages,
            &mut self.fragments,
            &mut self.layouts,
            &mut self.content,
        ] {
            *dir = normalize_path(&root.join(&*dir));
        }
        for dir in &mut self.markup.include_dirs {
            *dir = normalize_path(&root.join(&*dir));
        }

        for list in [
            &mut self.style.extensions,
            &mut self.markup.extensions,
            &mut self.markdown.extensions,
        ] {
            for ext in list.iter_mut() {
                *ext = ext.trim_start_matches('.').to_ascii_lowercase();
            }
        }
    }

    /// Source subtrees with their config field, in classification order.
    /// Extra include dirs hold fragments too, so they come last.
    pub fn source_dirs(&self) -> Vec<(FieldPath, &Path)> {
        let mut dirs = vec![
            (FieldPath::new("build.fragments"), self.fragments.as_path()),
            (FieldPath::new("build.layouts"), self.layouts.as_path()),
            (FieldPath::new("build.content"), self.content.as_path()),
            (FieldPath::new("build.styles"), self.styles.as_path()),
            (FieldPath::new("build.pages"), self.pages.as_path()),
        ];
        dirs.extend(
            self.markup
                .include_dirs
                .iter()
                .map(|dir| (FieldPath::new("build.markup.include_dirs"), dir.as_path())),
        );
        dirs
    }

    /// Validate build configuration. Expects normalized paths.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (field, list) in [
            (FieldPath::new("build.style.extensions"), &self.style.extensions),
            (FieldPath::new("build.markup.extensions"), &self.markup.extensions),
            (FieldPath::new("build.markdown.extensions"), &self.markdown.extensions),
        ] {
            if list.iter().all(|e| e.is_empty()) {
                diag.error(field, "extension list must not be empty");
            }
        }

        if self.style.command.is_empty() {
            diag.error_with_hint(
                FieldPath::new("build.style.command"),
                "command must not be empty",
                r#"command = ["sass", "--no-source-map"]"#,
            );
        }
        if self.markup.command.is_empty() {
            diag.error_with_hint(
                FieldPath::new("build.markup.command"),
                "command must not be empty",
                r#"command = ["slimrb", "$SOURCE"]"#,
            );
        }

        for (field, dir) in self.source_dirs() {
            if dir.starts_with(&self.output) || self.output.starts_with(dir) {
                diag.error(
                    FieldPath::new("build.output"),
                    format!("output root overlaps {} (`{}`)", field.as_str(), dir.display()),
                );
            }
            if dir.starts_with(&self.intermediate) || self.intermediate.starts_with(dir) {
                diag.error(
                    FieldPath::new("build.intermediate"),
                    format!("intermediate dir overlaps {} (`{}`)", field.as_str(), dir.display()),
                );
            }
            if !dir.exists() {
                diag.warn(field, format!("directory `{}` not found", dir.display()));
            }
        }

        for rule in &self.merge.rules {
            if rule.layout.is_empty() {
                diag.error(FieldPath::new("build.merge.rules"), "rule without a layout name");
            }
        }
    }
}
