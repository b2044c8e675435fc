use std::path::PathBuf;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tempfile::TempDir;

use super::batch::build_batch;
use super::debouncer::Debouncer;
use super::types::ChangeKind;
use crate::graph::DependencyGraph;
use crate::reload::message::ChangeEvent;
use crate::utils::path::normalize_path;

const QUIET: Duration = Duration::from_millis(150);

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

#[test]
fn test_debouncer_empty() {
    let debouncer = Debouncer::new(QUIET);
    assert!(!debouncer.is_ready());
}

#[test]
fn test_event_routing_by_kind() {
    let mut debouncer = Debouncer::new(QUIET);

    debouncer.add_event(&make_event(vec!["/tmp/a.tsx"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/b.tsx"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/c.tsx"], remove_kind()));

    assert_eq!(debouncer.changes.len(), 3);
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/a.tsx")],
        ChangeKind::Created
    );
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/b.tsx")],
        ChangeKind::Modified
    );
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/c.tsx")],
        ChangeKind::Removed
    );
}

#[test]
fn test_temp_file_ignored() {
    let mut debouncer = Debouncer::new(QUIET);

    debouncer.add_event(&make_event(vec!["/tmp/real.tsx"], modify_kind()));
    assert!(debouncer.last_event.is_some());
    let first_time = debouncer.last_event.unwrap();

    std::thread::sleep(Duration::from_millis(5));

    // Temp file event — should NOT update last_event or add to changes
    debouncer.add_event(&make_event(vec!["/tmp/.Invoice.tsx.swp"], modify_kind()));
    assert_eq!(debouncer.last_event.unwrap(), first_time);
    assert_eq!(debouncer.changes.len(), 1);
}

#[test]
fn test_dedup_first_event_wins() {
    let mut debouncer = Debouncer::new(QUIET);

    // Same path: create then modify — first one (create) wins
    debouncer.add_event(&make_event(vec!["/tmp/a.tsx"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.tsx"], modify_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/a.tsx")],
        ChangeKind::Created
    );
}

#[test]
fn test_dedup_same_event() {
    let mut debouncer = Debouncer::new(QUIET);
    debouncer.add_event(&make_event(vec!["/tmp/a.tsx", "/tmp/a.tsx"], modify_kind()));
    assert_eq!(debouncer.changes.len(), 1);
}

#[test]
fn test_sleep_duration_no_events() {
    let debouncer = Debouncer::new(QUIET);
    assert!(debouncer.sleep_duration() >= Duration::from_secs(3600));
}

#[test]
fn test_sleep_duration_after_event() {
    let mut debouncer = Debouncer::new(QUIET);
    debouncer.last_event = Some(std::time::Instant::now());

    let dur = debouncer.sleep_duration();
    assert!(dur >= QUIET - Duration::from_millis(10));
    assert!(dur <= QUIET + Duration::from_millis(10));
}

#[test]
fn test_remove_then_create_restores() {
    let mut debouncer = Debouncer::new(QUIET);

    // File removed, then restored (created) — should become Created
    debouncer.add_event(&make_event(vec!["/tmp/a.tsx"], remove_kind()));
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/a.tsx")],
        ChangeKind::Removed
    );

    debouncer.add_event(&make_event(vec!["/tmp/a.tsx"], create_kind()));
    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/a.tsx")],
        ChangeKind::Created
    );
}

#[test]
fn test_create_then_remove_discards() {
    let mut debouncer = Debouncer::new(QUIET);

    // File created, then removed — net no-op, should be discarded entirely
    debouncer.add_event(&make_event(vec!["/tmp/a.tsx"], create_kind()));
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/a.tsx")],
        ChangeKind::Created
    );

    debouncer.add_event(&make_event(vec!["/tmp/a.tsx"], remove_kind()));
    assert!(
        debouncer.changes.is_empty(),
        "created+removed should discard"
    );
}

#[test]
fn test_modify_then_remove_upgrades() {
    let mut debouncer = Debouncer::new(QUIET);

    // File modified, then removed — should upgrade to Removed
    debouncer.add_event(&make_event(vec!["/tmp/a.tsx"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.tsx"], remove_kind()));
    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/a.tsx")],
        ChangeKind::Removed
    );
}

// =============================================================================
// Batch building
// =============================================================================

/// documents/Invoice.tsx → shared.ts, documents/Receipt.tsx → shared.ts
fn fixture_tree() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path());

    std::fs::write(root.join("shared.ts"), "export const theme = {};").unwrap();
    std::fs::write(
        root.join("Invoice.tsx"),
        "import { theme } from \"./shared\";\nexport default () => null;",
    )
    .unwrap();
    std::fs::write(
        root.join("Receipt.tsx"),
        "import { theme } from \"./shared\";\nexport default () => null;",
    )
    .unwrap();

    (temp, root)
}

#[test]
fn test_shared_change_fans_out_to_dependents() {
    let (_temp, root) = fixture_tree();
    let mut graph = DependencyGraph::build(&root);

    let mut raw = FxHashMap::default();
    raw.insert(root.join("shared.ts"), ChangeKind::Modified);

    let records = build_batch(raw, &mut graph, &root);

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].filename, "shared.ts");
    assert_eq!(records[0].event, ChangeEvent::Change);
    let names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
    assert!(names.contains(&"Invoice.tsx"));
    assert!(names.contains(&"Receipt.tsx"));
}

#[test]
fn test_removal_reports_unlink_and_dependents() {
    let (_temp, root) = fixture_tree();
    let mut graph = DependencyGraph::build(&root);

    let shared = root.join("shared.ts");
    std::fs::remove_file(&shared).unwrap();

    let mut raw = FxHashMap::default();
    raw.insert(shared.clone(), ChangeKind::Removed);

    let records = build_batch(raw, &mut graph, &root);

    assert_eq!(records[0].event, ChangeEvent::Unlink);
    assert_eq!(records[0].filename, "shared.ts");
    // Dependents were resolved before the node was dropped
    assert_eq!(records.len(), 3);
    assert!(graph.dependents_of(&shared).is_none());
}

#[test]
fn test_hidden_and_foreign_files_excluded() {
    let (_temp, root) = fixture_tree();
    let mut graph = DependencyGraph::build(&root);

    let mut raw = FxHashMap::default();
    raw.insert(root.join(".hidden.tsx"), ChangeKind::Modified);
    raw.insert(root.join("notes.md"), ChangeKind::Modified);

    let records = build_batch(raw, &mut graph, &root);
    assert!(records.is_empty());
}

#[test]
fn test_duplicate_records_collapse() {
    let (_temp, root) = fixture_tree();
    let mut graph = DependencyGraph::build(&root);

    // Both templates import shared.ts; changing one template and the shared
    // module must yield a single record per file
    let mut raw = FxHashMap::default();
    raw.insert(root.join("shared.ts"), ChangeKind::Modified);
    raw.insert(root.join("Invoice.tsx"), ChangeKind::Modified);

    let records = build_batch(raw, &mut graph, &root);

    let invoice_count = records.iter().filter(|r| r.filename == "Invoice.tsx").count();
    assert_eq!(invoice_count, 1);
    assert_eq!(records.len(), 3);
}

#[test]
fn test_batch_order_is_deterministic() {
    let (_temp, root) = fixture_tree();

    // Mixed kinds across several files must come out path-sorted regardless
    // of hash-map iteration order
    let mut raw = FxHashMap::default();
    raw.insert(root.join("Receipt.tsx"), ChangeKind::Modified);
    raw.insert(root.join("Invoice.tsx"), ChangeKind::Created);
    raw.insert(root.join("shared.ts"), ChangeKind::Modified);

    let mut graph = DependencyGraph::build(&root);
    let records = build_batch(raw, &mut graph, &root);

    let names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["Invoice.tsx", "Receipt.tsx", "shared.ts"]);
    assert_eq!(records[0].event, ChangeEvent::Add);
}

#[test]
fn test_new_import_updates_graph() {
    let (_temp, root) = fixture_tree();
    let mut graph = DependencyGraph::build(&root);

    // Invoice drops its import of shared.ts
    std::fs::write(root.join("Invoice.tsx"), "export default () => null;").unwrap();

    let mut raw = FxHashMap::default();
    raw.insert(root.join("Invoice.tsx"), ChangeKind::Modified);
    build_batch(raw, &mut graph, &root);

    // A later change to shared.ts now only affects Receipt
    let mut raw = FxHashMap::default();
    raw.insert(root.join("shared.ts"), ChangeKind::Modified);
    let records = build_batch(raw, &mut graph, &root);

    let names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
    assert!(names.contains(&"Receipt.tsx"));
    assert!(!names.contains(&"Invoice.tsx"));
}
