//! Transform registry: which transform a source needs and where it lands.
//!
//! | Role     | Kind(s)            | Destination                                   |
//! |----------|--------------------|-----------------------------------------------|
//! | Style    | Style              | `output/<style.output>/<rel>.css`             |
//! | Page     | Markup             | `output/<rel>.html`                           |
//! | Content  | Markdown, Merge    | `intermediate/<rel>.html`, then `output/<markdown.output>/<rel>.html` |
//! | Layout   | Markup (publish)   | `output/<merge.publish_dir>/<name>.html`      |
//!
//! Style partials (`_name.scss`) have no destination of their own.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::BuildConfig;
use crate::core::Role;
use crate::source::Classifier;
use crate::utils::path::relative_stem;

/// Kind of regeneration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransformKind {
    Style,
    Markup,
    Markdown,
    Merge,
    /// Delete the artifact of a source that no longer exists
    Prune,
}

/// Execution phase. Every `Produce` task finishes before any `Merge` task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Produce,
    Merge,
}

impl TransformKind {
    pub fn phase(self) -> Phase {
        match self {
            Self::Merge => Phase::Merge,
            Self::Style | Self::Markup | Self::Markdown | Self::Prune => Phase::Produce,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Markup => "markup",
            Self::Markdown => "markdown",
            Self::Merge => "merge",
            Self::Prune => "prune",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One regeneration step. Identity is `(source, kind)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegenerationTask {
    pub source: PathBuf,
    pub kind: TransformKind,
    pub destination: PathBuf,
}

impl RegenerationTask {
    pub fn new(source: impl Into<PathBuf>, kind: TransformKind, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            kind,
            destination: destination.into(),
        }
    }
}

/// Maps classified sources to transforms and destinations.
#[derive(Debug, Clone)]
pub struct TransformRegistry {
    classifier: Classifier,
    build: BuildConfig,
}

impl TransformRegistry {
    pub fn new(build: &BuildConfig) -> Self {
        Self {
            classifier: Classifier::new(build),
            build: build.clone(),
        }
    }

    #[inline]
    pub fn classify(&self, path: &Path) -> Role {
        self.classifier.classify(path)
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn build_config(&self) -> &BuildConfig {
        &self.build
    }

    /// Sass partial: only compiled through the entry points that use it.
    pub fn is_style_partial(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('_'))
    }

    /// Ordered include search path for the markup compiler.
    pub fn include_dirs(&self) -> Vec<PathBuf> {
        std::iter::once(self.build.fragments.clone())
            .chain(self.build.markup.include_dirs.iter().cloned())
            .collect()
    }

    /// Layout name: path below the layouts dir without extension.
    pub fn layout_name(&self, path: &Path) -> Option<String> {
        let stem = relative_stem(path, &self.build.layouts)?;
        Some(slash_path(&stem))
    }

    /// Intermediate HTML for a content document.
    pub fn intermediate_of(&self, content: &Path) -> Option<PathBuf> {
        let rel = relative_with_extension(content, &self.build.content, "html")?;
        Some(self.build.intermediate.join(rel))
    }

    /// Primary destination of a source, ignoring whether it exists.
    pub fn destination(&self, path: &Path, role: Role) -> Option<PathBuf> {
        let out = &self.build.output;
        match role {
            Role::Style if Self::is_style_partial(path) => None,
            Role::Style => {
                let rel = relative_with_extension(path, &self.build.styles, "css")?;
                Some(out.join(&self.build.style.output).join(rel))
            }
            Role::Page => {
                let rel = relative_with_extension(path, &self.build.pages, "html")?;
                Some(out.join(rel))
            }
            Role::Content => {
                let rel = relative_with_extension(path, &self.build.content, "html")?;
                Some(out.join(&self.build.markdown.output).join(rel))
            }
            Role::Layout if self.build.merge.publish => {
                let name = self.layout_name(path)?;
                Some(out.join(&self.build.merge.publish_dir).join(format!("{name}.html")))
            }
            Role::Layout | Role::Fragment | Role::Other => None,
        }
    }

    /// Tasks that regenerate an existing source's own artifacts.
    pub fn tasks_for(&self, path: &Path, role: Role) -> Vec<RegenerationTask> {
        let Some(destination) = self.destination(path, role) else {
            return Vec::new();
        };

        match role {
            Role::Style => vec![RegenerationTask::new(path, TransformKind::Style, destination)],
            Role::Page | Role::Layout => {
                vec![RegenerationTask::new(path, TransformKind::Markup, destination)]
            }
            Role::Content => {
                let Some(intermediate) = self.intermediate_of(path) else {
                    return Vec::new();
                };
                vec![
                    RegenerationTask::new(path, TransformKind::Markdown, intermediate),
                    RegenerationTask::new(path, TransformKind::Merge, destination),
                ]
            }
            Role::Fragment | Role::Other => Vec::new(),
        }
    }

    /// `app.css` → `app.css.map`
    pub fn source_map_of(destination: &Path) -> PathBuf {
        let mut path = destination.as_os_str().to_owned();
        path.push(".map");
        PathBuf::from(path)
    }

    /// Task that removes the artifacts of a source that no longer exists.
    pub fn prune_for(&self, path: &Path, role: Role) -> Option<RegenerationTask> {
        let destination = self.destination(path, role)?;
        Some(RegenerationTask::new(path, TransformKind::Prune, destination))
    }

    /// Every file a pruned source may have left behind.
    pub fn artifacts_of(&self, task: &RegenerationTask) -> Vec<PathBuf> {
        let mut artifacts = vec![task.destination.clone()];
        match self.classify(&task.source) {
            Role::Content => artifacts.extend(self.intermediate_of(&task.source)),
            Role::Style => artifacts.push(Self::source_map_of(&task.destination)),
            _ => {}
        }
        artifacts
    }
}

/// `path` below `root` with its last extension replaced.
///
/// Only the final extension changes: `jquery.min.scss` becomes `jquery.min.css`.
fn relative_with_extension(path: &Path, root: &Path, ext: &str) -> Option<PathBuf> {
    let rel = path.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    Some(rel.with_extension(ext))
}

/// Render a relative path with `/` separators on every platform.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
