//! Cancellable periodic driver
//!
//! Runs the engine on a fixed interval until a shutdown future resolves. At
//! most one run is in flight at a time; a shutdown that arrives mid-run lets
//! that run finish before returning.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::engine::MirrorEngine;
use crate::report::SyncReport;
use crate::sink::ActionSink;
use crate::{Error, Result};

/// Result of one scheduled run
#[derive(Debug)]
pub struct CycleOutcome {
    /// 1-based cycle number
    pub cycle: u64,
    pub finished_at: DateTime<Utc>,
    pub result: Result<SyncReport>,
}

/// Totals over the lifetime of a [`PeriodicMirror::run`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub cycles: u64,
    /// Runs that aborted with an [`Error`]
    pub failed: u64,
    /// Runs that completed but reported entry errors
    pub with_errors: u64,
}

pub struct PeriodicMirror {
    engine: MirrorEngine,
    source: PathBuf,
    replica: PathBuf,
    interval: Duration,
    sink: Arc<dyn ActionSink>,
}

impl PeriodicMirror {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a zero interval.
    pub fn new(
        engine: MirrorEngine,
        source: impl Into<PathBuf>,
        replica: impl Into<PathBuf>,
        interval: Duration,
        sink: Arc<dyn ActionSink>,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::InvalidConfig {
                message: "sync interval must be greater than zero".into(),
            });
        }

        Ok(Self {
            engine,
            source: source.into(),
            replica: replica.into(),
            interval,
            sink,
        })
    }

    fn spawn_cycle(&self) -> JoinHandle<Result<SyncReport>> {
        let engine = self.engine.clone();
        let source = self.source.clone();
        let replica = self.replica.clone();
        let sink = Arc::clone(&self.sink);

        tokio::task::spawn_blocking(move || engine.mirror_once(&source, &replica, sink.as_ref()))
    }

    /// Run cycles until `shutdown` resolves.
    ///
    /// `on_cycle` is called after every run, successful or not. A run that
    /// fails as a whole is retried on the next tick.
    pub async fn run<F, C>(&self, shutdown: F, mut on_cycle: C) -> CycleSummary
    where
        F: Future<Output = ()>,
        C: FnMut(CycleOutcome),
    {
        tokio::pin!(shutdown);
        let mut summary = CycleSummary::default();
        let mut shutdown_requested = false;

        loop {
            summary.cycles += 1;
            let cycle = summary.cycles;
            let mut task = self.spawn_cycle();

            let joined = loop {
                tokio::select! {
                    joined = &mut task => break joined,
                    () = &mut shutdown, if !shutdown_requested => {
                        shutdown_requested = true;
                        tracing::info!(cycle, "Shutdown requested, finishing current sync");
                    }
                }
            };

            let result = joined
                .map_err(|e| Error::Task {
                    message: e.to_string(),
                })
                .and_then(|r| r);

            match &result {
                Ok(report) if report.has_errors() => {
                    summary.with_errors += 1;
                    tracing::warn!(
                        cycle,
                        errors = report.errors.len(),
                        "Sync finished with errors"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(cycle, error = %e, "Sync failed");
                }
            }

            on_cycle(CycleOutcome {
                cycle,
                finished_at: Utc::now(),
                result,
            });

            if shutdown_requested {
                break;
            }

            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = &mut shutdown => break,
            }
        }

        tracing::info!(cycles = summary.cycles, "Scheduler stopped");
        summary
    }
}
