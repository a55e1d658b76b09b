//! Source file roles.

use std::fmt;

/// Role of a source file, determined purely by its path.
///
/// Leaves (`Style`, `Page`, `Content`) produce output directly.
/// `Fragment` and `Layout` only produce output through their dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Style sheet (scss/sass/css)
    Style,
    /// Templated markup page
    Page,
    /// Markup partial included by pages
    Fragment,
    /// Page shell that content documents are merged into
    Layout,
    /// Markdown document
    Content,
    /// Not part of the build (output tree, stray files)
    Other,
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Page => "page",
            Self::Fragment => "fragment",
            Self::Layout => "layout",
            Self::Content => "content",
            Self::Other => "other",
        }
    }

    /// Whether adding or removing a file of this role changes the
    /// dependency index.
    #[inline]
    pub fn is_tracked(self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
