//! Error types for mirror-core

use std::path::PathBuf;

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole mirror run.
///
/// Failures on individual entries never surface here; they are collected in
/// [`SyncReport::errors`](crate::SyncReport) and the run carries on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A root could not be listed
    #[error("Cannot traverse {path}: {source}")]
    Traversal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A root exists but is not a directory
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Source and replica are the same tree or nested inside each other
    #[error("Source {source_root} and replica {replica_root} overlap")]
    OverlappingRoots {
        source_root: PathBuf,
        replica_root: PathBuf,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The blocking task running a cycle panicked or was cancelled
    #[error("Mirror task failed: {message}")]
    Task { message: String },

    /// Filesystem error from mirror-fs
    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),
}

impl Error {
    pub fn traversal(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Traversal {
            path: path.into(),
            source,
        }
    }
}
