//! Layout merge driven by HTML comments.
//!
//! Layout:
//! ```html
//! <title><!-- @@placeholder=title --></title>
//! <main><!-- @@placeholder=content --></main>
//! ```
//!
//! Fragment:
//! ```html
//! <!-- @@block=title -->About<!-- @@close -->
//! <!-- @@block=content --><h1>About</h1><!-- @@close -->
//! ```
//!
//! A fragment without blocks fills `content` whole. Unfilled placeholders
//! render empty.

use std::sync::OnceLock;

use anyhow::Result;
use regex::{Captures, Regex};
use rustc_hash::FxHashMap;

use super::MergeTransform;

const DEFAULT_BLOCK: &str = "content";

fn block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<!--\s*@@block=([\w\-/.]+)\s*-->(.*?)<!--\s*@@close\s*-->").unwrap()
    })
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<!--\s*@@placeholder=([\w\-/.]+)\s*-->").unwrap())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CommentMerge;

impl CommentMerge {
    /// Named blocks of a fragment; the whole fragment as `content` if none.
    fn blocks(fragment: &str) -> FxHashMap<&str, &str> {
        let mut blocks = FxHashMap::default();
        for caps in block_re().captures_iter(fragment) {
            if let (Some(name), Some(body)) = (caps.get(1), caps.get(2)) {
                blocks.insert(name.as_str(), body.as_str());
            }
        }
        if blocks.is_empty() {
            blocks.insert(DEFAULT_BLOCK, fragment);
        }
        blocks
    }
}

impl MergeTransform for CommentMerge {
    fn merge(&self, fragment: &str, layout: &str) -> Result<String> {
        let blocks = Self::blocks(fragment);
        let merged = placeholder_re().replace_all(layout, |caps: &Captures| {
            caps.get(1)
                .and_then(|name| blocks.get(name.as_str()))
                .copied()
                .unwrap_or_default()
                .to_string()
        });
        Ok(merged.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: &str =
        "<title><!-- @@placeholder=title --></title><main><!-- @@placeholder=content --></main>";

    #[test]
    fn test_whole_fragment_fills_content() {
        let out = CommentMerge.merge("<h1>Hi</h1>", LAYOUT).unwrap();
        assert_eq!(out, "<title></title><main><h1>Hi</h1></main>");
    }

    #[test]
    fn test_named_blocks() {
        let fragment = "<!-- @@block=title -->About<!-- @@close -->\n\
                        <!-- @@block=content -->\n<p>x</p>\n<!-- @@close -->";
        let out = CommentMerge.merge(fragment, LAYOUT).unwrap();
        assert_eq!(out, "<title>About</title><main>\n<p>x</p>\n</main>");
    }

    #[test]
    fn test_layout_without_placeholders() {
        let out = CommentMerge.merge("<p>x</p>", "<html></html>").unwrap();
        assert_eq!(out, "<html></html>");
    }

    #[test]
    fn test_fragment_with_replacement_syntax() {
        // `$` in content must not be treated as a capture reference
        let out = CommentMerge.merge("<p>$1 costs $5</p>", LAYOUT).unwrap();
        assert!(out.contains("<p>$1 costs $5</p>"));
    }
}
