//! Periodic mirroring until interrupted

use std::sync::Arc;

use chrono::Local;
use colored::Colorize;

use mirror_core::{
    CycleOutcome, MirrorConfig, MirrorEngine, PeriodicMirror, TracingSink, check_roots,
};

use crate::error::{CliError, Result};

/// Mirror on the configured interval until Ctrl-C.
///
/// Root problems found before the first run are fatal; later ones are
/// reported per cycle and retried.
pub fn run_watch(config: &MirrorConfig) -> Result<()> {
    check_roots(&config.source, &config.replica)?;

    let log_target = config
        .log_file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "console".to_string());
    println!(
        "{} Sync started. Log file: {}. Press Ctrl-C to stop.",
        "=>".blue().bold(),
        log_target.cyan()
    );
    tracing::info!(
        source = %config.source.display(),
        replica = %config.replica.display(),
        interval_secs = config.interval_secs,
        "Sync started"
    );

    let driver = PeriodicMirror::new(
        MirrorEngine::new(config.options()),
        &config.source,
        &config.replica,
        config.interval(),
        Arc::new(TracingSink),
    )?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::user(format!("Failed to start runtime: {}", e)))?;

    let interval_secs = config.interval_secs;
    let summary = runtime.block_on(driver.run(shutdown_signal(), |outcome| {
        print_cycle(&outcome, interval_secs);
    }));

    println!();
    println!("{} Sync stopped by user.", "=>".blue().bold());
    tracing::info!(
        cycles = summary.cycles,
        failed = summary.failed,
        with_errors = summary.with_errors,
        "Sync stopped by user"
    );
    Ok(())
}

fn print_cycle(outcome: &CycleOutcome, interval_secs: u64) {
    let at = outcome.finished_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
    match &outcome.result {
        Ok(report) if report.has_errors() => println!(
            "{} Sync completed at {} with {} failed entries. Next sync in {} seconds.",
            "WARN".yellow().bold(),
            at,
            report.errors.len(),
            interval_secs
        ),
        Ok(_) => println!(
            "{} Sync completed at {}. Next sync in {} seconds.",
            "OK".green().bold(),
            at,
            interval_secs
        ),
        Err(e) => println!(
            "{} Sync failed: {}. Retrying in {} seconds.",
            "ERROR".red().bold(),
            e,
            interval_secs
        ),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Unable to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
