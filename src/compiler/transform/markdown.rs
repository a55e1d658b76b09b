//! Markdown documents to HTML fragments with pulldown-cmark.

use std::path::Path;

use anyhow::Result;
use pulldown_cmark::{Options, Parser, html};

use super::{MarkdownCompiler, read_source};

pub struct PulldownMarkdown {
    options: Options,
}

impl Default for PulldownMarkdown {
    fn default() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        Self { options }
    }
}

impl PulldownMarkdown {
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

impl MarkdownCompiler for PulldownMarkdown {
    fn compile(&self, source: &Path) -> Result<String> {
        Ok(self.render(&read_source(source)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic() {
        let html = PulldownMarkdown::default().render("# Title\n\nSome *text*.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>text</em>"));
    }

    #[test]
    fn test_render_extensions() {
        let md = PulldownMarkdown::default();
        assert!(md.render("| a |\n|---|\n| 1 |").contains("<table>"));
        assert!(md.render("~~gone~~").contains("<del>gone</del>"));
        assert!(md.render("- [x] done").contains("checkbox"));
    }

    #[test]
    fn test_compile_missing_file() {
        let err = PulldownMarkdown::default()
            .compile(Path::new("/nonexistent/kiln/a.md"))
            .unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
