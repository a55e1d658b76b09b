//! Transforms: the compilers each regeneration task runs.
//!
//! Each collaborator sits behind a trait so the scheduler never cares
//! whether a transform shells out or runs in process.
//!
//! | Trait              | Default                                      |
//! |--------------------|----------------------------------------------|
//! | [`StyleCompiler`]  | external command + lightningcss post-pass    |
//! | [`MarkupCompiler`] | external command, `.html` passthrough        |
//! | [`MarkdownCompiler`] | pulldown-cmark                             |
//! | [`MergeTransform`] | placeholder/block comment merge              |

mod markdown;
mod markup;
mod merge;
mod style;

pub use markdown::PulldownMarkdown;
pub use markup::CommandMarkup;
pub use merge::CommentMerge;
pub use style::CommandStyle;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::SiteConfig;

/// Text for a task's destination, plus a source map to write beside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compiled {
    pub content: String,
    pub source_map: Option<String>,
}

impl From<String> for Compiled {
    fn from(content: String) -> Self {
        Self {
            content,
            source_map: None,
        }
    }
}

/// `(style path) -> CSS (+ source map)`
pub trait StyleCompiler: Send + Sync {
    fn compile(&self, source: &Path) -> Result<Compiled>;
}

/// `(markup path, ordered include dirs) -> HTML`
pub trait MarkupCompiler: Send + Sync {
    fn compile(&self, source: &Path, include_dirs: &[PathBuf]) -> Result<String>;
}

/// `(markdown path) -> HTML`
pub trait MarkdownCompiler: Send + Sync {
    fn compile(&self, source: &Path) -> Result<String>;
}

/// `(HTML fragment, layout HTML) -> HTML`
pub trait MergeTransform: Send + Sync {
    fn merge(&self, fragment: &str, layout: &str) -> Result<String>;
}

/// The set of transforms a build runs with.
pub struct Toolchain {
    pub style: Box<dyn StyleCompiler>,
    pub markup: Box<dyn MarkupCompiler>,
    pub markdown: Box<dyn MarkdownCompiler>,
    pub merge: Box<dyn MergeTransform>,
}

impl Toolchain {
    /// Default transforms configured from `[build]`.
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            style: Box::new(CommandStyle::new(&config.build.style, config.get_root())?),
            markup: Box::new(CommandMarkup::new(&config.build.markup, config.get_root())),
            markdown: Box::new(PulldownMarkdown::default()),
            merge: Box::new(CommentMerge),
        })
    }
}

/// Read a source file as UTF-8 text.
pub(crate) fn read_source(path: &Path) -> Result<String> {
    use anyhow::Context;
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
