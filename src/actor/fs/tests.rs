use std::path::PathBuf;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tempfile::TempDir;

use super::classifier::EventClassifier;
use super::debouncer::Debouncer;
use super::router::EventRouter;
use super::types::{ChangeKind, DebouncedEvents};
use crate::config::SiteConfig;
use crate::utils::path::normalize_path;

const DEBOUNCE: Duration = Duration::from_millis(40);

fn debouncer() -> Debouncer {
    Debouncer::new(DEBOUNCE, Duration::ZERO)
}

fn make_config() -> (TempDir, SiteConfig) {
    let temp = TempDir::new().unwrap();
    let config = SiteConfig::with_root(temp.path());
    for (_, dir) in config.build.source_dirs() {
        std::fs::create_dir_all(dir).unwrap();
    }
    (temp, config)
}

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

// ----------------------------------------------------------------------------
// Debouncer
// ----------------------------------------------------------------------------

#[test]
fn test_debouncer_empty() {
    let debouncer = debouncer();
    assert!(!debouncer.is_ready());
}

#[test]
fn test_event_routing_by_kind() {
    let mut debouncer = debouncer();

    debouncer.add_event(&make_event(vec!["/tmp/kiln-a.slim"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/kiln-b.slim"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/kiln-c.slim"], remove_kind()));

    assert_eq!(debouncer.changes.len(), 3);
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/kiln-a.slim")],
        ChangeKind::Created
    );
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/kiln-b.slim")],
        ChangeKind::Modified
    );
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/kiln-c.slim")],
        ChangeKind::Removed
    );
}

#[test]
fn test_metadata_events_ignored() {
    let mut debouncer = debouncer();
    let kind = notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ));
    debouncer.add_event(&make_event(vec!["/tmp/kiln-a.slim"], kind));
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_temp_file_ignored() {
    let mut debouncer = debouncer();
    debouncer.add_event(&make_event(vec!["/tmp/kiln-a.md"], modify_kind()));
    let first_time = debouncer.last_event.unwrap();

    std::thread::sleep(Duration::from_millis(5));

    for temp in ["/tmp/.kiln-a.md.swp", "/tmp/kiln-a.md~", "/tmp/kiln-a.bak"] {
        debouncer.add_event(&make_event(vec![temp], modify_kind()));
    }
    assert_eq!(debouncer.last_event.unwrap(), first_time);
    assert_eq!(debouncer.changes.len(), 1);
}

#[test]
fn test_dedup_first_event_wins() {
    let mut debouncer = debouncer();
    debouncer.add_event(&make_event(vec!["/tmp/kiln-a.slim"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/kiln-a.slim"], modify_kind()));

    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/kiln-a.slim")],
        ChangeKind::Created
    );
}

#[test]
fn test_remove_then_create_restores() {
    let mut debouncer = debouncer();
    debouncer.add_event(&make_event(vec!["/tmp/kiln-a.slim"], remove_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/kiln-a.slim"], create_kind()));

    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/kiln-a.slim")],
        ChangeKind::Created
    );
}

#[test]
fn test_create_then_remove_discards() {
    let mut debouncer = debouncer();
    debouncer.add_event(&make_event(vec!["/tmp/kiln-a.slim"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/kiln-a.slim"], remove_kind()));

    assert!(debouncer.changes.is_empty());
}

#[test]
fn test_modify_then_remove_upgrades() {
    let mut debouncer = debouncer();
    debouncer.add_event(&make_event(vec!["/tmp/kiln-a.slim"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/kiln-a.slim"], remove_kind()));

    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/kiln-a.slim")],
        ChangeKind::Removed
    );
}

#[test]
fn test_two_rapid_saves_coalesce() {
    let mut debouncer = debouncer();
    debouncer.add_event(&make_event(vec!["/tmp/kiln-a.scss"], modify_kind()));
    std::thread::sleep(DEBOUNCE / 2);
    debouncer.add_event(&make_event(vec!["/tmp/kiln-a.scss"], modify_kind()));

    // still inside the window
    assert!(debouncer.take_if_ready().is_none());

    std::thread::sleep(DEBOUNCE + Duration::from_millis(10));
    let batch = debouncer.take_if_ready().unwrap();
    assert_eq!(batch.len(), 1);
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_sleep_duration_no_events() {
    let debouncer = debouncer();
    assert!(debouncer.sleep_duration() >= Duration::from_secs(3600));
}

#[test]
fn test_sleep_duration_after_event() {
    let mut debouncer = debouncer();
    debouncer.last_event = Some(std::time::Instant::now());

    let dur = debouncer.sleep_duration();
    assert!(dur <= DEBOUNCE);
    assert!(dur >= Duration::from_millis(1));
}

#[test]
fn test_sleep_duration_respects_cooldown() {
    let cooldown = Duration::from_secs(5);
    let mut debouncer = Debouncer::new(DEBOUNCE, cooldown);
    debouncer.last_event = Some(std::time::Instant::now());
    debouncer.last_batch = Some(std::time::Instant::now());

    let dur = debouncer.sleep_duration();
    assert!(dur > DEBOUNCE);
    assert!(dur <= cooldown);
}

// ----------------------------------------------------------------------------
// EventClassifier
// ----------------------------------------------------------------------------

#[test]
fn test_correct_by_existence() {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path());
    let kept = root.join("kept.md");
    std::fs::write(&kept, "x").unwrap();

    let mut changes = FxHashMap::default();
    changes.insert(kept.clone(), ChangeKind::Removed);
    changes.insert(root.join("gone.md"), ChangeKind::Modified);
    changes.insert(root.join("flash.md"), ChangeKind::Created);

    EventClassifier::correct_by_existence(&mut changes);

    assert_eq!(changes.len(), 2);
    assert_eq!(changes[&kept], ChangeKind::Modified);
    assert_eq!(changes[&root.join("gone.md")], ChangeKind::Removed);
}

#[test]
fn test_created_dir_expands_to_files() {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path());
    let dir = root.join("blog");
    std::fs::create_dir_all(dir.join("2024")).unwrap();
    std::fs::write(dir.join("a.md"), "a").unwrap();
    std::fs::write(dir.join("2024/b.md"), "b").unwrap();
    std::fs::write(dir.join(".a.md.swp"), "").unwrap();

    let mut raw = FxHashMap::default();
    raw.insert(dir.clone(), ChangeKind::Created);
    let events = EventClassifier::classify(raw).unwrap();

    let paths: Vec<_> = events.0.iter().map(|(p, _)| p.clone()).collect();
    assert_eq!(paths, vec![dir.join("2024/b.md"), dir.join("a.md")]);
    assert!(events.0.iter().all(|(_, k)| *k == ChangeKind::Created));
}

// ----------------------------------------------------------------------------
// EventRouter
// ----------------------------------------------------------------------------

fn events(list: Vec<(PathBuf, ChangeKind)>) -> DebouncedEvents {
    DebouncedEvents(list)
}

#[test]
fn test_route_modified_page() {
    let (_temp, config) = make_config();
    let router = EventRouter::new(&config);
    let page = config.build.pages.join("index.slim");

    let changes = router
        .route(events(vec![(page.clone(), ChangeKind::Modified)]))
        .unwrap();
    assert!(changes.paths.contains(&page));
    assert!(!changes.structural);
    assert!(!changes.reload_only);
}

#[test]
fn test_route_created_fragment_is_structural() {
    let (_temp, config) = make_config();
    let router = EventRouter::new(&config);
    let fragment = config.build.fragments.join("nav.slim");

    let changes = router
        .route(events(vec![(fragment, ChangeKind::Created)]))
        .unwrap();
    assert!(changes.structural);
}

#[test]
fn test_route_reload_dir() {
    let (_temp, config) = make_config();
    let router = EventRouter::new(&config);
    let script = config.build.output.join("js/app.js");

    let changes = router
        .route(events(vec![(script, ChangeKind::Modified)]))
        .unwrap();
    assert!(changes.reload_only);
    assert!(changes.paths.is_empty());
}

#[test]
fn test_route_ignores_output_and_strays() {
    let (_temp, config) = make_config();
    let router = EventRouter::new(&config);

    let routed = router.route(events(vec![
        (config.build.output.join("index.html"), ChangeKind::Modified),
        (config.get_root().join("README.md"), ChangeKind::Modified),
        (config.build.pages.join("notes.txt"), ChangeKind::Modified),
    ]));
    assert!(routed.is_none());
}

#[test]
fn test_route_removed_source_dir() {
    let (_temp, config) = make_config();
    let router = EventRouter::new(&config);
    let dir = config.build.content.join("blog");

    let changes = router
        .route(events(vec![(dir.clone(), ChangeKind::Removed)]))
        .unwrap();
    assert!(changes.structural);
    assert!(changes.paths.contains(&dir));
}

#[test]
fn test_route_extra_include_dir() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let config =
        crate::config::test_config_at(&root, "[build.markup]\ninclude_dirs = [\"vendor/partials\"]");
    let router = EventRouter::new(&config);
    let partial = root.join("vendor/partials/nav.slim");

    let changes = router
        .route(events(vec![(partial.clone(), ChangeKind::Modified)]))
        .unwrap();
    assert!(changes.paths.contains(&partial));
    assert!(!changes.structural);
}
