use std::path::PathBuf;

use crate::config::SiteConfig;

/// Source subtrees (extra include dirs among them) plus the output subtrees
/// that only trigger a reload.
pub(super) fn collect_watch_paths(config: &SiteConfig) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = config
        .build
        .source_dirs()
        .into_iter()
        .map(|(_, dir)| dir.to_path_buf())
        .collect();
    paths.extend(config.reload_dirs());

    dedupe_nested(&mut paths);
    paths
}

/// Drop duplicates and roots already covered by a recursive ancestor.
///
/// The fragments dir usually lives inside the pages dir; watching both
/// would deliver every fragment event twice.
fn dedupe_nested(paths: &mut Vec<PathBuf>) {
    paths.sort();
    paths.dedup();
    let all = paths.clone();
    paths.retain(|path| !all.iter().any(|other| other != path && path.starts_with(other)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn drops_nested_and_duplicate_roots() {
        let mut paths = vec![
            PathBuf::from("/site/src/slim/0.include"),
            PathBuf::from("/site/src/slim"),
            PathBuf::from("/site/src/markdown"),
            PathBuf::from("/site/src/markdown"),
            PathBuf::from("/site/dist/js"),
        ];

        dedupe_nested(&mut paths);

        assert_eq!(
            paths,
            vec![
                PathBuf::from("/site/dist/js"),
                PathBuf::from("/site/src/markdown"),
                PathBuf::from("/site/src/slim"),
            ]
        );
    }

    #[test]
    fn sibling_prefixes_are_kept() {
        // component-wise prefix: `src/slim2` is not inside `src/slim`
        let mut paths = vec![PathBuf::from("/site/src/slim"), PathBuf::from("/site/src/slim2")];
        dedupe_nested(&mut paths);
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn default_layout_watch_paths() {
        let config = SiteConfig::with_root(Path::new("/site"));
        let paths = collect_watch_paths(&config);

        assert!(paths.contains(&PathBuf::from("/site/src/slim")));
        assert!(paths.contains(&PathBuf::from("/site/src/markdown")));
        assert!(paths.contains(&PathBuf::from("/site/src/sass")));
        assert!(paths.contains(&PathBuf::from("/site/src/layout")));
        assert!(paths.contains(&PathBuf::from("/site/dist/js")));
        assert!(!paths.contains(&PathBuf::from("/site/src/slim/0.include")));
    }

    #[test]
    fn include_dirs_are_watched() {
        let mut config = SiteConfig::default();
        config.build.markup.include_dirs = vec!["vendor/partials".into()];
        config.build.normalize(Path::new("/site"));

        let paths = collect_watch_paths(&config);
        assert!(paths.contains(&PathBuf::from("/site/vendor/partials")));
    }
}
