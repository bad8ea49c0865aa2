//! Per-run action report
//!
//! A [`SyncReport`] is built fresh for every run and lists, in the order they
//! happened, the actions taken on the replica and the entries that failed.

use std::fmt;
use std::path::PathBuf;

use mirror_fs::display_relative;
use serde::{Deserialize, Serialize};

/// Kind of change applied to the replica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    DirCreated,
    FileCopied,
    FileRemoved,
    DirRemoved,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirCreated => "DirCreated",
            Self::FileCopied => "FileCopied",
            Self::FileRemoved => "FileRemoved",
            Self::DirRemoved => "DirRemoved",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One change applied (or, in a dry run, planned) on the replica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAction {
    pub kind: ActionKind,
    /// Path relative to the tree roots
    pub path: PathBuf,
}

impl SyncAction {
    pub fn new(kind: ActionKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, display_relative(&self.path))
    }
}

/// Which side of the mirror an entry failure happened on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryErrorKind {
    /// A source entry could not be listed, hashed or read
    Read,
    /// A replica entry could not be created, written or removed
    Write,
}

/// A failure confined to a single entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryError {
    pub kind: EntryErrorKind,
    /// Path relative to the tree roots
    pub path: PathBuf,
    pub message: String,
}

impl EntryError {
    pub fn new(kind: EntryErrorKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Classify a mirror-fs error by the side it happened on.
    pub fn from_fs(path: impl Into<PathBuf>, error: &mirror_fs::Error) -> Self {
        let kind = if error.is_read() {
            EntryErrorKind::Read
        } else {
            EntryErrorKind::Write
        };
        Self::new(kind, path, error.to_string())
    }
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            EntryErrorKind::Read => "ReadError",
            EntryErrorKind::Write => "WriteError",
        };
        write!(f, "{} {}: {}", tag, display_relative(&self.path), self.message)
    }
}

/// Report from one mirror run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Actions in the order they were taken
    pub actions: Vec<SyncAction>,
    /// Entries that could not be reconciled
    pub errors: Vec<EntryError>,
    /// True when nothing was actually modified
    pub dry_run: bool,
}

impl SyncReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// No actions and no errors: the replica already matched the source.
    pub fn is_clean(&self) -> bool {
        self.actions.is_empty() && self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Number of actions of the given kind
    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind == kind).count()
    }

    /// Action kinds paired with display paths, handy for assertions.
    pub fn summary(&self) -> Vec<(ActionKind, String)> {
        self.actions
            .iter()
            .map(|a| (a.kind, display_relative(&a.path)))
            .collect()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for action in &self.actions {
            writeln!(f, "{}", action)?;
        }
        for error in &self.errors {
            writeln!(f, "{}", error)?;
        }
        Ok(())
    }
}
