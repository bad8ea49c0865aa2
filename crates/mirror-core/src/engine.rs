//! MirrorEngine implementation
//!
//! One run converges the replica tree onto the source tree in two passes:
//!
//! - **reconcile** walks the source pre-order, creating missing replica
//!   directories before their contents and copying files whose content
//!   differs;
//! - **prune** walks the replica post-order, removing entries that have no
//!   counterpart in the source, contents before their directory.
//!
//! The engine keeps no state between runs. Running it twice with no change in
//! between yields an empty report the second time.

use std::fs::{self, Metadata};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use mirror_fs::io::{self, RobustnessConfig};
use mirror_fs::{RootPair, compute_file_checksum, resolve_root, roots_overlap};
use walkdir::WalkDir;

use crate::report::{ActionKind, EntryError, EntryErrorKind, SyncAction, SyncReport};
use crate::sink::{ActionRecord, ActionSink, TracingSink};
use crate::{Error, Result};

/// Options for mirror runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorOptions {
    /// Report what would change without modifying the replica
    pub dry_run: bool,
    /// Treat a size mismatch as a change without hashing either file
    pub size_prefilter: bool,
    /// Retry policy for replica writes
    pub robustness: RobustnessConfig,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            size_prefilter: true,
            robustness: RobustnessConfig::default(),
        }
    }
}

/// One-way directory mirror.
#[derive(Debug, Clone, Default)]
pub struct MirrorEngine {
    options: MirrorOptions,
}

/// Mirror `source` into `replica` once with default options, logging
/// actions through `tracing`.
pub fn mirror_once(source: &Path, replica: &Path) -> Result<SyncReport> {
    MirrorEngine::default().mirror_once(source, replica, &TracingSink)
}

/// Validate a pair of roots without modifying anything.
///
/// Checks, in order: the source is a listable directory, the replica (if it
/// exists) is a listable directory, and neither root contains the other.
/// Returns the resolved roots.
pub fn check_roots(source: &Path, replica: &Path) -> Result<RootPair> {
    let source_meta = fs::metadata(source).map_err(|e| Error::traversal(source, e))?;
    if !source_meta.is_dir() {
        return Err(Error::NotADirectory {
            path: source.to_path_buf(),
        });
    }
    fs::read_dir(source).map_err(|e| Error::traversal(source, e))?;

    match fs::metadata(replica) {
        Ok(meta) if !meta.is_dir() => {
            return Err(Error::NotADirectory {
                path: replica.to_path_buf(),
            });
        }
        Ok(_) => {
            fs::read_dir(replica).map_err(|e| Error::traversal(replica, e))?;
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(Error::traversal(replica, e)),
    }

    let source_root = resolve_root(source)?;
    let replica_root = resolve_root(replica)?;
    if roots_overlap(&source_root, &replica_root) {
        return Err(Error::OverlappingRoots {
            source_root,
            replica_root,
        });
    }

    Ok(RootPair::new(source_root, replica_root))
}

impl MirrorEngine {
    pub fn new(options: MirrorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MirrorOptions {
        &self.options
    }

    /// Run both passes once.
    ///
    /// # Errors
    ///
    /// Fails before touching the replica if the roots do not pass
    /// [`check_roots`], or if a missing replica root cannot be created.
    /// Failures on individual entries are collected in the report instead.
    pub fn mirror_once(
        &self,
        source: &Path,
        replica: &Path,
        sink: &dyn ActionSink,
    ) -> Result<SyncReport> {
        let roots = check_roots(source, replica)?;

        if !roots.replica().exists() && !self.options.dry_run {
            io::create_dir_all(roots.replica())?;
            tracing::info!(replica = %roots.replica().display(), "Created replica root");
        }

        tracing::info!(
            source = %roots.source().display(),
            replica = %roots.replica().display(),
            dry_run = self.options.dry_run,
            "Starting sync"
        );

        let mut run = Run {
            roots: &roots,
            options: &self.options,
            sink,
            report: SyncReport::new(self.options.dry_run),
        };
        run.reconcile();
        run.prune();

        let report = run.report;
        tracing::info!(
            actions = report.actions.len(),
            errors = report.errors.len(),
            "Sync completed"
        );
        Ok(report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
    /// Sockets, FIFOs, devices: never copied
    Special,
}

fn source_kind(entry: &walkdir::DirEntry) -> mirror_fs::Result<EntryKind> {
    let file_type = entry.file_type();
    if file_type.is_dir() {
        Ok(EntryKind::Dir)
    } else if file_type.is_file() {
        Ok(EntryKind::File)
    } else if file_type.is_symlink() {
        let target = io::source_metadata(entry.path())?;
        Ok(if target.is_dir() {
            EntryKind::Dir
        } else if target.is_file() {
            EntryKind::File
        } else {
            EntryKind::Special
        })
    } else {
        Ok(EntryKind::Special)
    }
}

/// State of a single run
struct Run<'a> {
    roots: &'a RootPair,
    options: &'a MirrorOptions,
    sink: &'a dyn ActionSink,
    report: SyncReport,
}

impl Run<'_> {
    fn reconcile(&mut self) {
        let roots = self.roots;
        let mut walker = WalkDir::new(roots.source())
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.walk_failure(roots.source(), e);
                    continue;
                }
            };
            let rel = match roots.source_relative(entry.path()) {
                Ok(rel) => rel,
                Err(e) => {
                    self.fail(EntryError::from_fs(entry.path(), &e));
                    continue;
                }
            };

            match source_kind(&entry) {
                Ok(EntryKind::Dir) => {
                    let created = self.ensure_dir(&rel);
                    // A symlinked directory is mirrored as an empty directory
                    // and never entered, so only real directories are skipped.
                    if !created && entry.file_type().is_dir() {
                        walker.skip_current_dir();
                    }
                }
                Ok(EntryKind::File) => self.sync_file(&rel),
                Ok(EntryKind::Special) => {
                    tracing::debug!(path = %entry.path().display(), "Skipping special file");
                }
                Err(e) => self.fail(EntryError::from_fs(&rel, &e)),
            }
        }
    }

    fn prune(&mut self) {
        let roots = self.roots;
        // Only reachable in a dry run against a replica root not created yet.
        if !roots.replica().is_dir() {
            return;
        }

        let walker = WalkDir::new(roots.replica())
            .min_depth(1)
            .follow_links(false)
            .contents_first(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.walk_failure(roots.replica(), e);
                    continue;
                }
            };
            let rel = match roots.replica_relative(entry.path()) {
                Ok(rel) => rel,
                Err(e) => {
                    self.fail(EntryError::from_fs(entry.path(), &e));
                    continue;
                }
            };

            match fs::symlink_metadata(roots.to_source(&rel)) {
                Ok(_) => continue,
                Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {}
                Err(e) => {
                    // Presence unknown: keep the replica entry.
                    let source = roots.to_source(&rel);
                    self.fail(EntryError::from_fs(&rel, &mirror_fs::Error::read(source, e)));
                    continue;
                }
            }

            if entry.file_type().is_dir() {
                self.remove_replica_dir(&rel);
            } else {
                self.remove_replica_file(&rel);
            }
        }
    }

    /// Make sure the replica directory for `rel` exists.
    ///
    /// Returns false if it could not be created.
    fn ensure_dir(&mut self, rel: &Path) -> bool {
        let target = self.roots.to_replica(rel);
        match fs::symlink_metadata(&target) {
            Ok(meta) if meta.is_dir() => return true,
            Ok(_) => {
                if !self.remove_replica_file(rel) {
                    return false;
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                self.fail(EntryError::from_fs(rel, &mirror_fs::Error::write(&target, e)));
                return false;
            }
        }

        self.apply(ActionKind::DirCreated, rel, || io::create_dir_all(&target))
    }

    fn sync_file(&mut self, rel: &Path) {
        let source = self.roots.to_source(rel);
        let target = self.roots.to_replica(rel);

        match fs::symlink_metadata(&target) {
            Ok(meta) if meta.is_dir() => {
                if !self.remove_replica_dir(rel) {
                    return;
                }
            }
            Ok(meta) => match self.needs_copy(&source, &target, &meta) {
                Ok(true) => {}
                Ok(false) => return,
                Err(e) => {
                    self.fail(EntryError::from_fs(rel, &e));
                    return;
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                self.fail(EntryError::from_fs(rel, &mirror_fs::Error::write(&target, e)));
                return;
            }
        }

        let robustness = self.options.robustness;
        self.apply(ActionKind::FileCopied, rel, || {
            io::copy_atomic(&source, &target, robustness).map(|_| ())
        });
    }

    /// Decide whether an existing replica file must be overwritten.
    ///
    /// Content decides; modification times are never consulted.
    fn needs_copy(
        &self,
        source: &Path,
        target: &Path,
        target_meta: &Metadata,
    ) -> mirror_fs::Result<bool> {
        if self.options.size_prefilter {
            let source_meta = io::source_metadata(source)?;
            if source_meta.len() != target_meta.len() {
                return Ok(true);
            }
        }

        let source_digest = compute_file_checksum(source)?;
        let replica_digest = match compute_file_checksum(target) {
            Ok(digest) => digest,
            Err(e) => {
                tracing::debug!(error = %e, "Replica file unreadable, overwriting");
                return Ok(true);
            }
        };

        Ok(source_digest != replica_digest)
    }

    fn remove_replica_file(&mut self, rel: &Path) -> bool {
        let target = self.roots.to_replica(rel);
        self.apply(ActionKind::FileRemoved, rel, || io::remove_file(&target))
    }

    fn remove_replica_dir(&mut self, rel: &Path) -> bool {
        let target = self.roots.to_replica(rel);
        self.apply(ActionKind::DirRemoved, rel, || io::remove_dir_all(&target))
    }

    /// Perform `op` unless this is a dry run, then record the outcome.
    fn apply(
        &mut self,
        kind: ActionKind,
        rel: &Path,
        op: impl FnOnce() -> mirror_fs::Result<()>,
    ) -> bool {
        if !self.options.dry_run
            && let Err(e) = op()
        {
            self.fail(EntryError::from_fs(rel, &e));
            return false;
        }

        self.sink.action(&ActionRecord::now(kind, rel));
        self.report.actions.push(SyncAction::new(kind, rel));
        true
    }

    fn fail(&mut self, error: EntryError) {
        self.sink.failure(&error, Utc::now());
        self.report.errors.push(error);
    }

    fn walk_failure(&mut self, root: &Path, error: walkdir::Error) {
        let rel = error
            .path()
            .and_then(|p| p.strip_prefix(root).ok())
            .map(Path::to_path_buf)
            .unwrap_or_else(PathBuf::new);
        self.fail(EntryError::new(EntryErrorKind::Read, rel, error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_options() {
        let options = MirrorOptions::default();
        assert!(!options.dry_run);
        assert!(options.size_prefilter);
    }

    #[test]
    fn test_creates_missing_replica_root() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        fs::create_dir(&source).unwrap();
        let replica = temp.path().join("replica");

        let report = MirrorEngine::default()
            .mirror_once(&source, &replica, &NullSink)
            .unwrap();

        assert!(replica.is_dir());
        assert!(report.is_clean());
    }

    #[test]
    fn test_dry_run_leaves_missing_replica_root_alone() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        fs::create_dir_all(source.join("a")).unwrap();
        fs::write(source.join("a").join("b.txt"), "x").unwrap();
        let replica = temp.path().join("replica");

        let engine = MirrorEngine::new(MirrorOptions {
            dry_run: true,
            ..MirrorOptions::default()
        });
        let report = engine.mirror_once(&source, &replica, &NullSink).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.count(ActionKind::DirCreated), 1);
        assert_eq!(report.count(ActionKind::FileCopied), 1);
        assert!(!replica.exists());
    }

    #[test]
    fn test_equal_size_different_content_is_copied() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let replica = temp.path().join("replica");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&replica).unwrap();
        fs::write(source.join("f"), "abc").unwrap();
        fs::write(replica.join("f"), "abd").unwrap();

        let report = MirrorEngine::default()
            .mirror_once(&source, &replica, &NullSink)
            .unwrap();

        assert_eq!(report.count(ActionKind::FileCopied), 1);
        assert_eq!(fs::read_to_string(replica.join("f")).unwrap(), "abc");
    }

    #[test]
    fn test_without_size_prefilter_still_detects_changes() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let replica = temp.path().join("replica");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&replica).unwrap();
        fs::write(source.join("f"), "short").unwrap();
        fs::write(replica.join("f"), "much longer").unwrap();

        let engine = MirrorEngine::new(MirrorOptions {
            size_prefilter: false,
            ..MirrorOptions::default()
        });
        let report = engine.mirror_once(&source, &replica, &NullSink).unwrap();

        assert_eq!(report.count(ActionKind::FileCopied), 1);
        assert_eq!(fs::read_to_string(replica.join("f")).unwrap(), "short");
    }
}
