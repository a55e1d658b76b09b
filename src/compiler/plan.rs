//! Task graph builder: changed paths → ordered regeneration tasks.
//!
//! 1. Classify each changed path.
//! 2. Leaves yield their own tasks, or a prune task once deleted.
//! 3. Fragments, layouts and style partials cascade to their dependents.
//! 4. Tasks are deduplicated by `(source, kind)`.
//! 5. Produce-phase tasks come before merge-phase tasks, each ordered by path.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::compiler::dependency::DependencyIndex;
use crate::compiler::registry::{Phase, RegenerationTask, TransformKind, TransformRegistry};
use crate::core::Role;

type TaskKey = (Phase, PathBuf, TransformKind);

/// Plans regeneration work against a dependency index snapshot.
pub struct TaskGraphBuilder<'a> {
    registry: &'a TransformRegistry,
    index: &'a DependencyIndex,
}

/// Ordered, deduplicated set of tasks under construction.
#[derive(Default)]
struct TaskSet(BTreeMap<TaskKey, RegenerationTask>);

impl TaskSet {
    fn extend(&mut self, tasks: impl IntoIterator<Item = RegenerationTask>) {
        for task in tasks {
            let key = (task.kind.phase(), task.source.clone(), task.kind);
            self.0.entry(key).or_insert(task);
        }
    }

    fn into_vec(self) -> Vec<RegenerationTask> {
        self.0.into_values().collect()
    }
}

impl<'a> TaskGraphBuilder<'a> {
    pub fn new(registry: &'a TransformRegistry, index: &'a DependencyIndex) -> Self {
        Self { registry, index }
    }

    /// Plan the tasks needed after `changed` paths were modified, created or
    /// removed.
    pub fn plan(&self, changed: &BTreeSet<PathBuf>) -> Vec<RegenerationTask> {
        let mut tasks = TaskSet::default();

        for path in changed {
            let role = self.registry.classify(path);
            match role {
                Role::Other => {}
                Role::Style if TransformRegistry::is_style_partial(path) => {
                    self.cascade(path, &mut tasks);
                }
                Role::Style | Role::Page | Role::Content => {
                    tasks.extend(self.leaf_tasks(path, role));
                }
                Role::Fragment => self.cascade(path, &mut tasks),
                Role::Layout => {
                    self.cascade(path, &mut tasks);
                    tasks.extend(self.leaf_tasks(path, role));
                }
            }
        }

        tasks.into_vec()
    }

    /// Plan every page, content document and style entry point.
    pub fn plan_full(&self) -> Vec<RegenerationTask> {
        let mut tasks = TaskSet::default();
        let index = self.index;

        for page in index.pages() {
            tasks.extend(self.registry.tasks_for(page, Role::Page));
        }
        for content in index.contents() {
            tasks.extend(self.registry.tasks_for(content, Role::Content));
        }
        for style in index.style_entries() {
            tasks.extend(self.registry.tasks_for(style, Role::Style));
        }
        for (_, layout) in index.layouts() {
            tasks.extend(self.registry.tasks_for(layout, Role::Layout));
        }

        tasks.into_vec()
    }

    /// A source's own tasks, or its prune task if it is gone.
    fn leaf_tasks(&self, path: &Path, role: Role) -> Vec<RegenerationTask> {
        if path.exists() {
            self.registry.tasks_for(path, role)
        } else {
            self.registry.prune_for(path, role).into_iter().collect()
        }
    }

    fn cascade(&self, path: &Path, tasks: &mut TaskSet) {
        let dependents = self.index.dependents_of(path, self.registry);
        crate::debug!(
            "plan";
            "{} -> {} dependent(s)",
            path.display(),
            dependents.len()
        );

        for dependent in dependents {
            if !dependent.exists() {
                crate::log!(
                    "plan";
                    "index out of date, skipping missing {}",
                    dependent.display()
                );
                continue;
            }
            let role = self.registry.classify(&dependent);
            tasks.extend(self.registry.tasks_for(&dependent, role));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::testing::TestSite;

    fn kinds(tasks: &[RegenerationTask], site: &TestSite) -> Vec<(String, TransformKind)> {
        tasks
            .iter()
            .map(|t| (site.rel(&t.source), t.kind))
            .collect()
    }

    fn changed(site: &TestSite, rels: &[&str]) -> BTreeSet<PathBuf> {
        rels.iter().map(|r| site.path(r)).collect()
    }

    fn standard_site() -> TestSite {
        let site = TestSite::new();
        site.write("src/slim/index.slim", "h1 home\ninclude header");
        site.write("src/slim/about.slim", "h1 about");
        site.write("src/slim/blog/list.slim", "include header");
        site.write("src/slim/0.include/header.slim", "header");
        site.write("src/layout/default.slim", "<!-- @@placeholder=content -->");
        site.write("src/layout/post.slim", "<article><!-- @@placeholder=content --></article>");
        site.write("src/markdown/about.md", "# About");
        site.write("src/markdown/blog/a.md", "# A");
        site.write("src/markdown/blog/b.md", "# B");
        site.write("src/sass/app.scss", "body{}");
        site.write("src/sass/_vars.scss", "$x: 1;");
        site
    }

    #[test]
    fn test_page_edit_plans_one_task() {
        let site = standard_site();
        let pipeline = site.pipeline();
        let tasks = pipeline.plan(&changed(&site, &["src/slim/about.slim"]));

        assert_eq!(
            kinds(&tasks, &site),
            vec![("src/slim/about.slim".into(), TransformKind::Markup)]
        );
        assert_eq!(tasks[0].destination, site.path("dist/about.html"));
    }

    fn sources_of(tasks: &[RegenerationTask], kind: TransformKind) -> BTreeSet<PathBuf> {
        tasks
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.source.clone())
            .collect()
    }

    #[test]
    fn test_fragment_change_plans_every_page() {
        let site = standard_site();
        let pipeline = site.pipeline();
        let tasks = pipeline.plan(&changed(&site, &["src/slim/0.include/header.slim"]));

        assert_eq!(&sources_of(&tasks, TransformKind::Markup), pipeline.index().pages());
        // layouts see the same include path, so merged documents are redone too
        assert_eq!(
            &sources_of(&tasks, TransformKind::Merge),
            pipeline.index().contents()
        );
    }

    #[test]
    fn test_layout_change_plans_associated_content_only() {
        let site = standard_site();
        site.write_config("[build.merge]\nrules = [{ prefix = \"blog\", layout = \"post\" }]");
        let pipeline = site.pipeline();

        let tasks = pipeline.plan(&changed(&site, &["src/layout/post.slim"]));
        assert_eq!(
            kinds(&tasks, &site),
            vec![
                ("src/markdown/blog/a.md".into(), TransformKind::Markdown),
                ("src/markdown/blog/b.md".into(), TransformKind::Markdown),
                ("src/markdown/blog/a.md".into(), TransformKind::Merge),
                ("src/markdown/blog/b.md".into(), TransformKind::Merge),
            ]
        );
    }

    #[test]
    fn test_dedup_across_cascades() {
        let site = standard_site();
        let pipeline = site.pipeline();
        let tasks = pipeline.plan(&changed(
            &site,
            &[
                "src/slim/index.slim",
                "src/slim/0.include/header.slim",
                "src/markdown/about.md",
                "src/layout/default.slim",
            ],
        ));

        let mut identities: Vec<_> = tasks.iter().map(|t| (&t.source, t.kind)).collect();
        let total = identities.len();
        identities.sort();
        identities.dedup();
        assert_eq!(identities.len(), total);
        // 3 pages + 3 documents x (markdown, merge)
        assert_eq!(total, 9);
    }

    #[test]
    fn test_two_phase_order() {
        let site = standard_site();
        let pipeline = site.pipeline();
        let tasks = pipeline.plan(&changed(
            &site,
            &["src/layout/default.slim", "src/sass/app.scss", "src/slim/about.slim"],
        ));

        let first_merge = tasks
            .iter()
            .position(|t| t.kind == TransformKind::Merge)
            .unwrap();
        assert!(tasks[..first_merge]
            .iter()
            .all(|t| t.kind.phase() == Phase::Produce));
        assert!(tasks[first_merge..]
            .iter()
            .all(|t| t.kind == TransformKind::Merge));

        let produce: Vec<_> = tasks[..first_merge].iter().map(|t| &t.source).collect();
        let mut sorted = produce.clone();
        sorted.sort();
        assert_eq!(produce, sorted);
    }

    #[test]
    fn test_removed_leaf_is_pruned() {
        let site = standard_site();
        let pipeline = site.pipeline();
        site.remove("src/slim/about.slim");

        let tasks = pipeline.plan(&changed(&site, &["src/slim/about.slim"]));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].kind, TransformKind::Prune);
        assert_eq!(tasks[0].destination, site.path("dist/about.html"));
    }

    #[test]
    fn test_missing_dependent_is_skipped() {
        let site = standard_site();
        let pipeline = site.pipeline();
        // index still lists the page
        site.remove("src/slim/blog/list.slim");

        let tasks = pipeline.plan(&changed(&site, &["src/slim/0.include/header.slim"]));
        let pages: Vec<_> = sources_of(&tasks, TransformKind::Markup)
            .iter()
            .map(|p| site.rel(p))
            .collect();
        assert_eq!(pages, vec!["src/slim/about.slim", "src/slim/index.slim"]);
    }

    #[test]
    fn test_extra_include_dir_change_plans_every_page() {
        let site = standard_site();
        site.write_config("[build.markup]\ninclude_dirs = [\"vendor/partials\"]");
        site.write("vendor/partials/nav.slim", "<nav></nav>");
        site.write("src/slim/nav.slim", "include nav");
        let mut pipeline = site.pipeline();

        let tasks = pipeline.plan(&changed(&site, &["vendor/partials/nav.slim"]));
        assert_eq!(&sources_of(&tasks, TransformKind::Markup), pipeline.index().pages());

        site.write("vendor/partials/nav.slim", "<nav>v2</nav>");
        let report = pipeline.process(
            &site.changes(&["vendor/partials/nav.slim"]),
            &crate::compiler::testing::RecordingTransport::default(),
        );
        assert!(report.is_success(), "{:?}", report.results);
        assert_eq!(site.read("dist/nav.html"), "<nav>v2</nav>");
    }

    #[test]
    fn test_style_partial_cascades_to_entries() {
        let site = standard_site();
        let pipeline = site.pipeline();
        let tasks = pipeline.plan(&changed(&site, &["src/sass/_vars.scss"]));
        assert_eq!(
            kinds(&tasks, &site),
            vec![("src/sass/app.scss".into(), TransformKind::Style)]
        );
    }

    #[test]
    fn test_other_paths_plan_nothing() {
        let site = standard_site();
        let pipeline = site.pipeline();
        assert!(pipeline
            .plan(&changed(&site, &["dist/index.html", "README.md"]))
            .is_empty());
    }

    #[test]
    fn test_plan_full_covers_all_leaves() {
        let site = standard_site();
        let pipeline = site.pipeline();
        let tasks = pipeline.plan_full();

        // 3 pages, 3 documents x 2, 1 style entry
        assert_eq!(tasks.len(), 10);
        assert!(!tasks.iter().any(|t| site.rel(&t.source).contains("_vars")));
        assert!(!tasks.iter().any(|t| site.rel(&t.source).contains("0.include")));
    }
}
