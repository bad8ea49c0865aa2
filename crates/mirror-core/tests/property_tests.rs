//! Convergence and idempotence over generated trees.

use mirror_core::{ActionKind, MirrorEngine, NullSink};
use mirror_test_utils::TestTree;
use proptest::prelude::*;

/// Relative file paths up to three levels deep over a small alphabet, so
/// source and replica trees collide often.
fn file_set() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec(
        (
            proptest::collection::vec("[ab]", 1..4).prop_map(|parts| parts.join("/")),
            "[xy]{0,3}",
        ),
        0..8,
    )
}

/// Drop paths that would need a file and a directory at the same place.
fn consistent(files: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut kept: Vec<(String, String)> = Vec::new();
    for (path, content) in files {
        let clashes = kept.iter().any(|(other, _)| {
            other == &path
                || other.starts_with(&format!("{path}/"))
                || path.starts_with(&format!("{other}/"))
        });
        if !clashes {
            kept.push((path, content));
        }
    }
    kept
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn mirror_converges_and_is_idempotent(source in file_set(), replica in file_set()) {
        let tree = TestTree::new();
        for (path, content) in consistent(source) {
            tree.source_file(&path, &content);
        }
        for (path, content) in consistent(replica) {
            tree.replica_file(&path, &content);
        }

        let engine = MirrorEngine::default();
        let first = engine.mirror_once(&tree.source(), &tree.replica(), &NullSink).unwrap();
        prop_assert!(first.errors.is_empty(), "errors: {:?}", first.errors);
        tree.assert_converged();

        let second = engine.mirror_once(&tree.source(), &tree.replica(), &NullSink).unwrap();
        prop_assert!(second.is_clean(), "second run: {}", second);
    }

    #[test]
    fn identical_files_are_never_copied(files in file_set()) {
        let tree = TestTree::new();
        for (path, content) in consistent(files) {
            tree.source_file(&path, &content);
            tree.replica_file(&path, &content);
        }

        let report = MirrorEngine::default()
            .mirror_once(&tree.source(), &tree.replica(), &NullSink)
            .unwrap();

        prop_assert_eq!(report.count(ActionKind::FileCopied), 0);
        prop_assert!(report.is_clean());
    }
}
