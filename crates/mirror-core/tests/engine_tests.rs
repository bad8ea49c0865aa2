//! Scenario tests for a single mirror run.

use mirror_core::{
    ActionKind, Error, MemorySink, MirrorEngine, MirrorOptions, NullSink, SyncReport, mirror_once,
};
use mirror_test_utils::{TestTree, snapshot};
use pretty_assertions::assert_eq;
use rstest::rstest;

use ActionKind::*;

fn run(tree: &TestTree) -> SyncReport {
    MirrorEngine::default()
        .mirror_once(&tree.source(), &tree.replica(), &NullSink)
        .unwrap()
}

fn owned(expected: &[(ActionKind, &str)]) -> Vec<(ActionKind, String)> {
    expected
        .iter()
        .map(|(kind, path)| (*kind, path.to_string()))
        .collect()
}

#[test]
fn scenario_a_new_file_in_new_directory() {
    let tree = TestTree::new();
    tree.source_file("a/b.txt", "x");

    let report = run(&tree);

    assert_eq!(report.summary(), owned(&[(DirCreated, "a"), (FileCopied, "a/b.txt")]));
    tree.assert_replica_content("a/b.txt", "x");
    assert!(report.errors.is_empty());
}

#[test]
fn default_entry_point_mirrors_with_defaults() {
    let tree = TestTree::new();
    tree.source_file("notes/today.md", "hello");
    tree.replica_file("stale.bin", "zz");

    let report = mirror_once(&tree.source(), &tree.replica()).unwrap();

    assert_eq!(
        report.summary(),
        owned(&[(DirCreated, "notes"), (FileCopied, "notes/today.md"), (FileRemoved, "stale.bin")])
    );
    assert!(!report.dry_run);
    tree.assert_converged();
}

#[test]
fn scenario_b_identical_trees_do_nothing() {
    let tree = TestTree::new();
    tree.source_file("a/b.txt", "x");
    tree.replica_file("a/b.txt", "x");

    let report = run(&tree);

    assert!(report.is_clean(), "unexpected actions: {report}");
}

#[test]
fn scenario_c_changed_content_is_overwritten() {
    let tree = TestTree::new();
    tree.source_file("a/b.txt", "x");
    tree.replica_file("a/b.txt", "y");

    let report = run(&tree);

    assert_eq!(report.summary(), owned(&[(FileCopied, "a/b.txt")]));
    tree.assert_replica_content("a/b.txt", "x");
}

#[test]
fn scenario_d_extraneous_tree_is_removed_contents_first() {
    let tree = TestTree::new();
    tree.replica_file("old/old.txt", "stale");

    let report = run(&tree);

    assert_eq!(
        report.summary(),
        owned(&[(FileRemoved, "old/old.txt"), (DirRemoved, "old")])
    );
    tree.assert_replica_missing("old");
}

#[test]
fn scenario_e_missing_source_is_traversal_error_without_changes() {
    let tree = TestTree::new();
    tree.replica_file("keep/me.txt", "precious");
    let before = snapshot(&tree.replica());

    let result = MirrorEngine::default().mirror_once(
        &tree.root().join("does-not-exist"),
        &tree.replica(),
        &NullSink,
    );

    assert!(matches!(result, Err(Error::Traversal { .. })));
    assert_eq!(snapshot(&tree.replica()), before);
}

#[test]
fn second_run_is_empty() {
    let tree = TestTree::new();
    tree.source_file("a/b.txt", "x");
    tree.source_file("a/c/d.txt", "nested");
    tree.source_file("top.txt", "top");
    tree.source_dir("empty");
    tree.replica_file("stale/file.txt", "gone soon");
    tree.replica_file("top.txt", "outdated");

    let first = run(&tree);
    assert!(!first.is_clean());
    tree.assert_converged();

    let second = run(&tree);
    assert!(second.is_clean(), "second run was not idempotent: {second}");
}

#[test]
fn mixed_changes_are_reported_in_pass_order() {
    let tree = TestTree::new();
    tree.source_file("keep.txt", "new");
    tree.replica_file("keep.txt", "old");
    tree.replica_file("gone.txt", "bye");
    tree.replica_file("olddir/x", "bye");

    let report = run(&tree);

    assert_eq!(
        report.summary(),
        owned(&[
            (FileCopied, "keep.txt"),
            (FileRemoved, "gone.txt"),
            (FileRemoved, "olddir/x"),
            (DirRemoved, "olddir"),
        ])
    );
    tree.assert_converged();
}

#[test]
fn nested_doomed_directories_are_removed_bottom_up() {
    let tree = TestTree::new();
    tree.replica_file("old/sub/deep.txt", "x");

    let report = run(&tree);

    assert_eq!(
        report.summary(),
        owned(&[
            (FileRemoved, "old/sub/deep.txt"),
            (DirRemoved, "old/sub"),
            (DirRemoved, "old"),
        ])
    );
}

#[test]
fn entries_present_in_both_are_preserved() {
    let tree = TestTree::new();
    tree.source_file("shared/a.txt", "same");
    tree.replica_file("shared/a.txt", "same");
    tree.replica_file("shared/extra.txt", "extra");

    let report = run(&tree);

    assert_eq!(report.summary(), owned(&[(FileRemoved, "shared/extra.txt")]));
    tree.assert_replica_content("shared/a.txt", "same");
}

#[test]
fn empty_source_directory_is_mirrored() {
    let tree = TestTree::new();
    tree.source_dir("empty/inner");

    let report = run(&tree);

    assert_eq!(
        report.summary(),
        owned(&[(DirCreated, "empty"), (DirCreated, "empty/inner")])
    );
    tree.assert_replica_exists("empty/inner");
}

#[test]
fn replica_file_in_place_of_source_directory_is_replaced() {
    let tree = TestTree::new();
    tree.source_file("thing/inside.txt", "x");
    tree.replica_file("thing", "i am a file");

    let report = run(&tree);

    assert_eq!(
        report.summary(),
        owned(&[
            (FileRemoved, "thing"),
            (DirCreated, "thing"),
            (FileCopied, "thing/inside.txt"),
        ])
    );
    tree.assert_converged();
    assert!(run(&tree).is_clean());
}

#[test]
fn replica_directory_in_place_of_source_file_is_replaced() {
    let tree = TestTree::new();
    tree.source_file("thing", "file now");
    tree.replica_file("thing/old.txt", "x");

    let report = run(&tree);

    assert_eq!(report.summary(), owned(&[(DirRemoved, "thing"), (FileCopied, "thing")]));
    tree.assert_replica_content("thing", "file now");
    assert!(run(&tree).is_clean());
}

#[test]
fn repeated_root_name_inside_tree_maps_structurally() {
    let tree = TestTree::new();
    tree.source_file("source/replica/source.txt", "nested names");

    run(&tree);

    tree.assert_replica_content("source/replica/source.txt", "nested names");
    tree.assert_converged();
}

#[rstest]
#[case::same_root("source", "source")]
#[case::replica_inside_source("source", "source/replica")]
#[case::source_inside_replica("replica/source", "replica")]
fn overlapping_roots_are_rejected(#[case] source: &str, #[case] replica: &str) {
    let tree = TestTree::new();
    tree.replica_dir("source");
    let before = snapshot(tree.root());

    let result = MirrorEngine::default().mirror_once(
        &tree.root().join(source),
        &tree.root().join(replica),
        &NullSink,
    );

    assert!(matches!(result, Err(Error::OverlappingRoots { .. })), "{result:?}");
    assert_eq!(snapshot(tree.root()), before);
}

#[test]
fn source_that_is_a_file_is_rejected() {
    let tree = TestTree::new();
    tree.source_file("plain.txt", "x");

    let result = MirrorEngine::default().mirror_once(
        &tree.source().join("plain.txt"),
        &tree.replica(),
        &NullSink,
    );

    assert!(matches!(result, Err(Error::NotADirectory { .. })));
}

#[test]
fn sink_sees_every_action_in_report_order() {
    let tree = TestTree::new();
    tree.source_file("a/b.txt", "x");
    tree.replica_file("old.txt", "y");
    let sink = MemorySink::new();

    let report = MirrorEngine::default()
        .mirror_once(&tree.source(), &tree.replica(), &sink)
        .unwrap();

    let logged: Vec<_> = sink.actions().into_iter().map(|r| (r.kind, r.path)).collect();
    let reported: Vec<_> = report.actions.into_iter().map(|a| (a.kind, a.path)).collect();
    assert_eq!(logged, reported);
    assert!(sink.failures().is_empty());
}

#[test]
fn dry_run_reports_without_modifying() {
    let tree = TestTree::new();
    tree.source_file("a/b.txt", "x");
    tree.replica_file("old/old.txt", "stale");
    tree.replica_file("changed.txt", "before");
    tree.source_file("changed.txt", "after!");
    let before = snapshot(&tree.replica());

    let dry = MirrorEngine::new(MirrorOptions {
        dry_run: true,
        ..MirrorOptions::default()
    })
    .mirror_once(&tree.source(), &tree.replica(), &NullSink)
    .unwrap();

    assert!(dry.dry_run);
    assert_eq!(snapshot(&tree.replica()), before);

    let real = run(&tree);
    assert_eq!(dry.actions, real.actions);
}
