//! Path → role classification.
//!
//! Each source subtree is a prefix rule with an extension filter. When
//! subtrees nest (fragments usually live inside the pages dir) the longest
//! matching prefix wins; equal prefixes fall back to declaration order.

use std::path::{Path, PathBuf};

use crate::config::BuildConfig;
use crate::core::Role;
use crate::utils::path::extension_of;

#[derive(Debug, Clone)]
struct Rule {
    prefix: PathBuf,
    extensions: Vec<String>,
    role: Role,
}

impl Rule {
    fn matches(&self, path: &Path, ext: Option<&str>) -> bool {
        path.starts_with(&self.prefix)
            && path != self.prefix
            && ext.is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

/// Total, deterministic classifier built from `[build]`.
#[derive(Debug, Clone)]
pub struct Classifier {
    /// Sorted longest prefix first, ties in declaration order
    rules: Vec<Rule>,
    /// Generated trees, never sources
    excluded: Vec<PathBuf>,
}

impl Classifier {
    pub fn new(build: &BuildConfig) -> Self {
        let markup = build.markup.extensions.clone();
        let mut layout_exts = markup.clone();
        if !layout_exts.iter().any(|e| e == "html") {
            layout_exts.push("html".into());
        }

        let mut rules = vec![
            Rule {
                prefix: build.fragments.clone(),
                extensions: markup.clone(),
                role: Role::Fragment,
            },
            Rule {
                prefix: build.layouts.clone(),
                extensions: layout_exts,
                role: Role::Layout,
            },
            Rule {
                prefix: build.content.clone(),
                extensions: build.markdown.extensions.clone(),
                role: Role::Content,
            },
            Rule {
                prefix: build.styles.clone(),
                extensions: build.style.extensions.clone(),
                role: Role::Style,
            },
            Rule {
                prefix: build.pages.clone(),
                extensions: markup.clone(),
                role: Role::Page,
            },
        ];
        rules.extend(build.markup.include_dirs.iter().map(|dir| Rule {
            prefix: dir.clone(),
            extensions: markup.clone(),
            role: Role::Fragment,
        }));
        // Stable sort keeps declaration order among equal depths
        rules.sort_by_key(|rule| std::cmp::Reverse(rule.prefix.components().count()));

        Self {
            rules,
            excluded: vec![build.output.clone(), build.intermediate.clone()],
        }
    }

    /// Role of `path`. Expects an absolute, normalized path.
    pub fn classify(&self, path: &Path) -> Role {
        if self.excluded.iter().any(|dir| path.starts_with(dir)) {
            return Role::Other;
        }

        let ext = extension_of(path);
        self.rules
            .iter()
            .find(|rule| rule.matches(path, ext.as_deref()))
            .map_or(Role::Other, |rule| rule.role)
    }
}
