//! [`TestTree`] builder for mirror test scenarios.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding a `source/` and a `replica/` tree.
///
/// # Example
///
/// ```rust,no_run
/// use mirror_test_utils::TestTree;
///
/// let tree = TestTree::new();
/// tree.source_file("a/b.txt", "x");
/// tree.assert_replica_missing("a/b.txt");
/// ```
pub struct TestTree {
    temp_dir: TempDir,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Create empty `source/` and `replica/` directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("source")).unwrap();
        fs::create_dir(temp_dir.path().join("replica")).unwrap();
        Self { temp_dir }
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn source(&self) -> PathBuf {
        self.root().join("source")
    }

    pub fn replica(&self) -> PathBuf {
        self.root().join("replica")
    }

    /// Write `content` to `rel` under the source, creating parents.
    pub fn source_file(&self, rel: &str, content: &str) {
        write_file(&self.source().join(rel), content);
    }

    /// Write `content` to `rel` under the replica, creating parents.
    pub fn replica_file(&self, rel: &str, content: &str) {
        write_file(&self.replica().join(rel), content);
    }

    pub fn source_dir(&self, rel: &str) {
        fs::create_dir_all(self.source().join(rel)).unwrap();
    }

    pub fn replica_dir(&self, rel: &str) {
        fs::create_dir_all(self.replica().join(rel)).unwrap();
    }

    /// Read a replica file.
    ///
    /// # Panics
    /// Panics with the path if the file cannot be read.
    pub fn read_replica(&self, rel: &str) -> String {
        let path = self.replica().join(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// Assert that the replica file at `rel` has exactly `content`.
    pub fn assert_replica_content(&self, rel: &str, content: &str) {
        assert_eq!(
            self.read_replica(rel),
            content,
            "Unexpected content in replica file {}",
            rel
        );
    }

    pub fn assert_replica_exists(&self, rel: &str) {
        let path = self.replica().join(rel);
        assert!(path.exists(), "Expected to exist: {}", path.display());
    }

    pub fn assert_replica_missing(&self, rel: &str) {
        let path = self.replica().join(rel);
        assert!(!path.exists(), "Expected NOT to exist: {}", path.display());
    }

    /// Assert that the replica holds exactly the source's entries and bytes.
    ///
    /// # Panics
    /// Panics with both listings if they differ.
    pub fn assert_converged(&self) {
        let source = snapshot(&self.source());
        let replica = snapshot(&self.replica());
        assert!(
            source == replica,
            "Replica does not match source.\nSource: {:#?}\nReplica: {:#?}",
            source,
            replica
        );
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Map every entry below `root` to its content digest, or `None` for
/// directories. Keys use forward slashes.
pub fn snapshot(root: &Path) -> BTreeMap<String, Option<String>> {
    walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| {
            let entry = entry.unwrap();
            let rel = entry.path().strip_prefix(root).unwrap();
            let digest = if entry.file_type().is_dir() {
                None
            } else {
                Some(mirror_fs::compute_file_checksum(entry.path()).unwrap())
            };
            (mirror_fs::display_relative(rel), digest)
        })
        .collect()
}
