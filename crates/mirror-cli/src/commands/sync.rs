//! Single-run command
//!
//! Mirrors once, prints the report and exits.

use colored::Colorize;

use mirror_core::{ActionKind, MirrorConfig, MirrorEngine, SyncReport, TracingSink};

use crate::error::{CliError, Result};

/// Run one sync and print its report.
///
/// Fails when any entry could not be synchronized, so the exit status
/// reflects whether the replica now matches the source.
pub fn run_once(config: &MirrorConfig, json: bool) -> Result<()> {
    if !json {
        println!(
            "{} Synchronizing {} -> {}{}",
            "=>".blue().bold(),
            config.source.display(),
            config.replica.display(),
            if config.dry_run { " [dry-run]".yellow().to_string() } else { String::new() }
        );
    }

    let engine = MirrorEngine::new(config.options());
    let report = engine.mirror_once(&config.source, &config.replica, &TracingSink)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.has_errors() {
        return Err(CliError::user(format!(
            "{} entries could not be synchronized",
            report.errors.len()
        )));
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    if report.is_clean() {
        println!("{} Already synchronized. No changes needed.", "OK".green().bold());
        return;
    }

    if report.actions.is_empty() {
        println!("{} Synchronization incomplete:", "WARN".yellow().bold());
    } else if report.dry_run {
        println!("{} Would apply:", "DRY-RUN".yellow().bold());
    } else {
        println!("{} Synchronization complete:", "OK".green().bold());
    }

    for action in &report.actions {
        let marker = match action.kind {
            ActionKind::DirCreated | ActionKind::FileCopied => "+".green(),
            ActionKind::FileRemoved | ActionKind::DirRemoved => "-".red(),
        };
        println!("   {} {}", marker, action);
    }
    for error in &report.errors {
        println!("   {} {}", "!".red(), error);
    }
}
