//! Dependency index for cascading rebuilds.
//!
//! Edges come from convention, never from reading file contents:
//! - Fragment → every Page (include-directory membership), plus every Layout
//!   and the Content documents merged into it, since layouts are compiled
//!   with the same include path
//! - Layout → the Content documents associated with it by `[build.merge]`
//! - Style partial → every style entry point
//!
//! Two layout files with the same name (`post.slim`, `post.html`): the first
//! one scanned is used, the other is shadowed and has no dependents.
//!
//! The index is rebuilt wholesale whenever a source is created or removed
//! and is read-only while a batch runs.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::compiler::registry::TransformRegistry;
use crate::config::MergeConfig;
use crate::core::Role;
use crate::source::SourceFile;

pub type PathSet = BTreeSet<PathBuf>;

/// Snapshot of the source tree's dependency edges.
#[derive(Debug, Default, Clone)]
pub struct DependencyIndex {
    pages: PathSet,
    contents: PathSet,
    style_entries: PathSet,
    style_partials: PathSet,
    fragments: PathSet,
    /// Layout name → layout file
    layouts: BTreeMap<String, PathBuf>,
    /// Layout files whose name is already taken
    shadowed: PathSet,
    /// Content document → associated layout name
    layout_of: BTreeMap<PathBuf, String>,
    /// Layout name → associated content documents
    contents_of: BTreeMap<String, PathSet>,
}

impl DependencyIndex {
    /// Build the index from a full source scan.
    pub fn build(files: &[SourceFile], registry: &TransformRegistry) -> Self {
        let merge = &registry.build_config().merge;
        let content_root = &registry.build_config().content;
        let mut index = Self::default();

        for file in files {
            let path = &file.path;
            match file.role {
                Role::Page => {
                    index.pages.insert(path.clone());
                }
                Role::Fragment => {
                    index.fragments.insert(path.clone());
                }
                Role::Style if TransformRegistry::is_style_partial(path) => {
                    index.style_partials.insert(path.clone());
                }
                Role::Style => {
                    index.style_entries.insert(path.clone());
                }
                Role::Layout => {
                    let Some(name) = registry.layout_name(path) else {
                        continue;
                    };
                    if let Some(existing) = index.layouts.get(&name) {
                        crate::log!(
                            "warning";
                            "layout `{}` is defined by both {} and {}, ignoring the latter",
                            name,
                            existing.display(),
                            path.display()
                        );
                        index.shadowed.insert(path.clone());
                        continue;
                    }
                    index.layouts.insert(name, path.clone());
                }
                Role::Content => {
                    let name = associate_layout(path, content_root, merge);
                    index.contents.insert(path.clone());
                    index
                        .contents_of
                        .entry(name.clone())
                        .or_default()
                        .insert(path.clone());
                    index.layout_of.insert(path.clone(), name);
                }
                Role::Other => {}
            }
        }

        crate::debug!(
            "index";
            "{} pages, {} documents, {} styles, {} fragments, {} layouts",
            index.pages.len(),
            index.contents.len(),
            index.style_entries.len(),
            index.fragments.len(),
            index.layouts.len()
        );
        index
    }

    /// Sources whose output depends on `path`.
    ///
    /// Role and layout name come from the path itself, so a removed
    /// fragment or layout still reports the dependents it used to have.
    pub fn dependents_of(&self, path: &Path, registry: &TransformRegistry) -> PathSet {
        match registry.classify(path) {
            Role::Fragment => self.fragment_dependents(),
            Role::Layout if self.shadowed.contains(path) => PathSet::new(),
            Role::Layout => registry
                .layout_name(path)
                .and_then(|name| self.contents_of.get(&name))
                .cloned()
                .unwrap_or_default(),
            Role::Style if TransformRegistry::is_style_partial(path) => self.style_entries.clone(),
            _ => PathSet::new(),
        }
    }

    /// Pages, layout files, and content merged into a layout that exists.
    fn fragment_dependents(&self) -> PathSet {
        let merged = self
            .contents_of
            .iter()
            .filter(|(name, _)| self.layouts.contains_key(*name))
            .flat_map(|(_, contents)| contents.iter().cloned());

        self.pages
            .iter()
            .cloned()
            .chain(self.layouts.values().cloned())
            .chain(merged)
            .collect()
    }

    /// Layout name associated with a content document.
    pub fn layout_for(&self, content: &Path) -> Option<&str> {
        self.layout_of.get(content).map(String::as_str)
    }

    /// File defining the named layout.
    pub fn layout_file(&self, name: &str) -> Option<&Path> {
        self.layouts.get(name).map(PathBuf::as_path)
    }

    pub fn pages(&self) -> &PathSet {
        &self.pages
    }

    pub fn contents(&self) -> &PathSet {
        &self.contents
    }

    pub fn style_entries(&self) -> &PathSet {
        &self.style_entries
    }

    pub fn layouts(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.layouts.iter().map(|(n, p)| (n.as_str(), p.as_path()))
    }

    /// Indexed sources at or below `dir`.
    pub fn sources_under<'a>(&'a self, dir: &'a Path) -> impl Iterator<Item = &'a Path> + 'a {
        self.pages
            .iter()
            .chain(&self.contents)
            .chain(&self.style_entries)
            .chain(&self.style_partials)
            .chain(&self.fragments)
            .chain(self.layouts.values())
            .chain(&self.shadowed)
            .filter(move |path| path.starts_with(dir))
            .map(PathBuf::as_path)
    }

    /// Whether `path` was present when the index was built.
    pub fn contains(&self, path: &Path) -> bool {
        self.pages.contains(path)
            || self.contents.contains(path)
            || self.style_entries.contains(path)
            || self.style_partials.contains(path)
            || self.fragments.contains(path)
            || self.layouts.values().any(|p| p == path)
            || self.shadowed.contains(path)
    }
}

/// Longest matching rule prefix wins; otherwise the default layout.
fn associate_layout(content: &Path, content_root: &Path, merge: &MergeConfig) -> String {
    let Ok(rel) = content.strip_prefix(content_root) else {
        return merge.default.clone();
    };

    merge
        .rules
        .iter()
        .filter(|rule| rel.starts_with(&rule.prefix))
        .max_by_key(|rule| rule.prefix.components().count())
        .map_or_else(|| merge.default.clone(), |rule| rule.layout.clone())
}
