//! Core mirroring layer for Folder Mirror
//!
//! This crate provides:
//! - [`MirrorEngine`]: one-way, content-aware directory mirroring
//! - [`SyncReport`]: the ordered list of actions and failures of a run
//! - [`ActionSink`]: the structured action log the engine writes to
//! - [`PeriodicMirror`]: a cancellable interval driver around the engine

pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod scheduler;
pub mod sink;

pub use config::MirrorConfig;
pub use engine::{MirrorEngine, MirrorOptions, check_roots, mirror_once};
pub use error::{Error, Result};
pub use report::{ActionKind, EntryError, EntryErrorKind, SyncAction, SyncReport};
pub use scheduler::{CycleOutcome, CycleSummary, PeriodicMirror};
pub use sink::{ActionRecord, ActionSink, MemorySink, NullSink, TracingSink};
