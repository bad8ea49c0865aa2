//! Source/replica path correspondence
//!
//! Every entry is addressed by its path relative to the tree root. Mapping
//! between the two trees joins that relative path onto the other root, so a
//! root string repeated deeper inside a path is never rewritten.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// The two roots of a mirror run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPair {
    source: PathBuf,
    replica: PathBuf,
}

impl RootPair {
    pub fn new(source: impl Into<PathBuf>, replica: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn replica(&self) -> &Path {
        &self.replica
    }

    /// Relative path of an entry found while walking the source tree.
    pub fn source_relative(&self, path: &Path) -> Result<PathBuf> {
        relative_to(path, &self.source)
    }

    /// Relative path of an entry found while walking the replica tree.
    pub fn replica_relative(&self, path: &Path) -> Result<PathBuf> {
        relative_to(path, &self.replica)
    }

    pub fn to_source(&self, relative: &Path) -> PathBuf {
        self.source.join(relative)
    }

    pub fn to_replica(&self, relative: &Path) -> PathBuf {
        self.replica.join(relative)
    }
}

/// Strip `root` from `path`, component-wise.
///
/// # Errors
///
/// Returns [`Error::OutsideRoot`] if `path` does not live under `root`.
pub fn relative_to(path: &Path, root: &Path) -> Result<PathBuf> {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .map_err(|_| Error::OutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })
}

/// Resolve a root to an absolute, symlink-free path.
///
/// Existing paths are canonicalized directly. For a path that does not exist
/// yet, the nearest existing ancestor is canonicalized and the missing tail
/// re-appended, so a replica root can be compared before it is created.
pub fn resolve_root(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| Error::io(path, e))?
            .join(path)
    };

    let mut existing = absolute.as_path();
    let mut tail: Vec<OsString> = Vec::new();

    loop {
        match dunce::canonicalize(existing) {
            Ok(mut resolved) => {
                for name in tail.iter().rev() {
                    resolved.push(name);
                }
                return Ok(resolved);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        tail.push(name.to_os_string());
                        existing = parent;
                    }
                    _ => return Err(Error::io(path, e)),
                }
            }
            Err(e) => return Err(Error::io(path, e)),
        }
    }
}

/// True when the two resolved roots are equal or one contains the other.
pub fn roots_overlap(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

/// Render a relative path with forward slashes on every platform.
pub fn display_relative(relative: &Path) -> String {
    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
