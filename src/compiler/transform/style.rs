//! Style sheets: external compiler, then a lightningcss pass for vendor
//! prefixes and minification.
//!
//! With `source_map` on, the compiler embeds its map in the CSS it prints
//! (`--embed-source-map --embed-sources` replaces `--no-source-map`), and
//! lightningcss folds it into the map it writes, so mappings lead back to
//! the `.scss` sources.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;
use rustc_hash::FxHashMap;

use super::{Compiled, StyleCompiler, read_source};
use crate::config::StyleConfig;
use crate::utils::exec::{Cmd, resolve_args};

pub struct CommandStyle {
    command: Vec<String>,
    root: PathBuf,
    targets: Targets,
    minify: bool,
    source_map: bool,
}

impl CommandStyle {
    pub fn new(config: &StyleConfig, root: &Path) -> Result<Self> {
        let browsers = if config.browsers.is_empty() {
            None
        } else {
            Browsers::from_browserslist(config.browsers.iter().map(String::as_str))
                .map_err(|e| anyhow!("invalid `build.style.browsers`: {e}"))?
        };

        let command = if config.source_map {
            with_embedded_map(&config.command)
        } else {
            config.command.clone()
        };

        Ok(Self {
            command,
            root: root.to_path_buf(),
            targets: Targets {
                browsers,
                ..Targets::default()
            },
            minify: config.minify,
            source_map: config.source_map,
        })
    }

    fn run_compiler(&self, source: &Path) -> Result<String> {
        let mut vars = FxHashMap::default();
        vars.insert("SOURCE", source.display().to_string());

        let mut args = resolve_args(&self.command, &vars);
        if !self.command.iter().any(|arg| arg.contains("$SOURCE")) {
            args.push(source.display().to_string());
        }

        Cmd::from_slice(&args).cwd(&self.root).run_stdout()
    }

    /// Prefix for the configured browsers, optionally minify and map.
    fn finish(&self, source: &Path, css: &str) -> Result<Compiled> {
        let filename = source.display().to_string();
        let mut sheet = StyleSheet::parse(
            css,
            ParserOptions {
                filename: filename.clone(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| anyhow!("css parse error: {e}"))?;

        sheet
            .minify(MinifyOptions {
                targets: self.targets.clone(),
                ..MinifyOptions::default()
            })
            .map_err(|e| anyhow!("css transform error: {e}"))?;

        let mut map = self.source_map.then(|| SourceMap::new(&self.root.to_string_lossy()));
        // without an embedded map, positions refer to the file itself
        if let Some(map) = map.as_mut()
            && sheet.source_map(0).is_none()
        {
            let index = map.add_source(&filename);
            map.set_source_content(index as usize, css)
                .map_err(|e| anyhow!("source map error: {e}"))?;
        }

        let result = sheet
            .to_css(PrinterOptions {
                minify: self.minify,
                targets: self.targets.clone(),
                source_map: map.as_mut(),
                ..PrinterOptions::default()
            })
            .map_err(|e| anyhow!("css print error: {e}"))?;

        let source_map = match map.as_mut() {
            Some(map) => Some(
                map.to_json(None)
                    .map_err(|e| anyhow!("source map error: {e}"))?,
            ),
            None => None,
        };
        Ok(Compiled {
            content: result.code,
            source_map,
        })
    }
}

/// Swap `--no-source-map` for flags that embed the map and its sources.
fn with_embedded_map(command: &[String]) -> Vec<String> {
    let mut args: Vec<String> = command
        .iter()
        .filter(|arg| arg.as_str() != "--no-source-map")
        .cloned()
        .collect();
    for flag in ["--embed-source-map", "--embed-sources"] {
        if !args.iter().any(|arg| arg == flag) {
            // keep the program name first
            args.insert(1.min(args.len()), flag.to_string());
        }
    }
    args
}

impl StyleCompiler for CommandStyle {
    fn compile(&self, source: &Path) -> Result<Compiled> {
        let is_plain_css = source
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("css"));

        let css = if is_plain_css {
            read_source(source)?
        } else {
            self.run_compiler(source)?
        };
        self.finish(source, &css)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn style(minify: bool, browsers: &[&str]) -> CommandStyle {
        let config = StyleConfig {
            minify,
            browsers: browsers.iter().map(|s| s.to_string()).collect(),
            ..StyleConfig::default()
        };
        CommandStyle::new(&config, Path::new("/")).unwrap()
    }

    fn finish(style: &CommandStyle, css: &str) -> String {
        style.finish(Path::new("/a.css"), css).unwrap().content
    }

    #[test]
    fn test_plain_css_minified() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.css");
        std::fs::write(&path, "body {\n  color: red;\n}\n").unwrap();

        let css = style(true, &[]).compile(&path).unwrap();
        assert_eq!(css.content, "body{color:red}");
        assert_eq!(css.source_map, None);
    }

    #[test]
    fn test_prefixes_for_old_browsers() {
        let css = finish(&style(true, &["safari 8"]), ".a { user-select: none }");
        assert!(css.contains("-webkit-user-select"));
    }

    #[test]
    fn test_unminified_output_keeps_layout() {
        let css = finish(&style(false, &[]), "a{color:red}");
        assert!(css.contains("a {"));
    }

    #[test]
    fn test_source_map_for_plain_css() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.css");
        std::fs::write(&path, "body {\n  color: red;\n}\n").unwrap();

        let config = StyleConfig {
            source_map: true,
            browsers: Vec::new(),
            ..StyleConfig::default()
        };
        let css = CommandStyle::new(&config, dir.path())
            .unwrap()
            .compile(&path)
            .unwrap();

        assert_eq!(css.content, "body{color:red}");
        let map = css.source_map.unwrap();
        assert!(map.contains("\"version\":3"));
        assert!(map.contains("app.css"));
        assert!(map.contains("color: red"));
    }

    #[test]
    fn test_source_map_flags() {
        let command: Vec<String> = ["sass", "--no-source-map", "--style=compressed"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            with_embedded_map(&command),
            vec!["sass", "--embed-sources", "--embed-source-map", "--style=compressed"]
        );
    }

    #[test]
    fn test_invalid_browsers_query() {
        let config = StyleConfig {
            browsers: vec!["not a real query ###".into()],
            ..StyleConfig::default()
        };
        assert!(CommandStyle::new(&config, Path::new("/")).is_err());
    }

    #[test]
    fn test_missing_compiler_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.scss");
        std::fs::write(&path, "body { color: red }").unwrap();

        let config = StyleConfig {
            command: vec!["kiln-no-such-sass".into()],
            ..StyleConfig::default()
        };
        let err = CommandStyle::new(&config, dir.path())
            .unwrap()
            .compile(&path)
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
