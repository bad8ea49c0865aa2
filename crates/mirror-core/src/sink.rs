//! Action log sink
//!
//! The engine emits one [`ActionRecord`] per action and one failure record
//! per entry error. Where those records end up (a log file, the console, a
//! test buffer) is decided by whoever passes the sink in.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use mirror_fs::display_relative;
use serde::Serialize;

use crate::report::{ActionKind, EntryError, EntryErrorKind};

/// Structured record of one action taken on the replica
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: ActionKind,
    /// Path relative to the tree roots
    pub path: PathBuf,
}

impl ActionRecord {
    pub fn now(kind: ActionKind, path: impl Into<PathBuf>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            path: path.into(),
        }
    }
}

/// Destination for the engine's action log.
pub trait ActionSink: Send + Sync {
    /// Called once for every action, in the order the actions were taken
    fn action(&self, record: &ActionRecord);

    /// Called once for every entry that could not be reconciled
    fn failure(&self, error: &EntryError, timestamp: DateTime<Utc>);
}

/// Sink that forwards records to `tracing`.
///
/// Actions are `info` events, failures `warn` events; both carry `action`
/// and `path` fields so a structured subscriber can filter on them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ActionSink for TracingSink {
    fn action(&self, record: &ActionRecord) {
        tracing::info!(
            action = record.kind.as_str(),
            path = %display_relative(&record.path),
            "{} {}",
            record.kind,
            display_relative(&record.path)
        );
    }

    fn failure(&self, error: &EntryError, _timestamp: DateTime<Utc>) {
        let action = match error.kind {
            EntryErrorKind::Read => "ReadError",
            EntryErrorKind::Write => "WriteError",
        };
        tracing::warn!(
            action,
            path = %display_relative(&error.path),
            "{}",
            error
        );
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ActionSink for NullSink {
    fn action(&self, _record: &ActionRecord) {}

    fn failure(&self, _error: &EntryError, _timestamp: DateTime<Utc>) {}
}

/// Sink that keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    actions: Mutex<Vec<ActionRecord>>,
    failures: Mutex<Vec<EntryError>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<ActionRecord> {
        self.actions
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn failures(&self) -> Vec<EntryError> {
        self.failures
            .lock()
            .map(|errors| errors.clone())
            .unwrap_or_default()
    }
}

impl ActionSink for MemorySink {
    fn action(&self, record: &ActionRecord) {
        if let Ok(mut records) = self.actions.lock() {
            records.push(record.clone());
        }
    }

    fn failure(&self, error: &EntryError, _timestamp: DateTime<Utc>) {
        if let Ok(mut errors) = self.failures.lock() {
            errors.push(error.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.action(&ActionRecord::now(ActionKind::DirCreated, "a"));
        sink.action(&ActionRecord::now(ActionKind::FileCopied, "a/b.txt"));

        let kinds: Vec<_> = sink.actions().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![ActionKind::DirCreated, ActionKind::FileCopied]);
    }

    #[test]
    fn test_record_serializes_with_timestamp() {
        let record = ActionRecord::now(ActionKind::FileRemoved, "old.txt");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "FileRemoved");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_tracing_sink_does_not_panic_without_subscriber() {
        let sink = TracingSink;
        sink.action(&ActionRecord::now(ActionKind::DirRemoved, "old"));
        sink.failure(
            &EntryError::new(EntryErrorKind::Write, "x", "denied"),
            Utc::now(),
        );
    }
}
