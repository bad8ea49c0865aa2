//! Merge command-line arguments with an optional config file

use mirror_core::MirrorConfig;

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Interval recorded for `--once` runs, where it is never waited on.
const ONCE_INTERVAL_SECS: u64 = 60;

/// Build the effective configuration.
///
/// Values given on the command line win over the config file. `--dry-run`
/// and `--no-size-prefilter` can only switch behaviour on, never off.
pub fn resolve(cli: &Cli) -> Result<MirrorConfig> {
    let file = cli.config.as_deref().map(MirrorConfig::load).transpose()?;

    let source = cli
        .source
        .clone()
        .or_else(|| file.as_ref().map(|c| c.source.clone()))
        .ok_or_else(|| CliError::user("missing SOURCE folder (pass it or use --config)"))?;
    let replica = cli
        .replica
        .clone()
        .or_else(|| file.as_ref().map(|c| c.replica.clone()))
        .ok_or_else(|| CliError::user("missing REPLICA folder (pass it or use --config)"))?;
    let interval_secs = match cli.interval.or(file.as_ref().map(|c| c.interval_secs)) {
        Some(secs) => secs,
        None if cli.once => ONCE_INTERVAL_SECS,
        None => return Err(CliError::user("missing INTERVAL in seconds (or pass --once)")),
    };

    let mut config = MirrorConfig::new(source, replica, interval_secs);
    config.log_file = cli
        .log_file
        .clone()
        .or_else(|| file.as_ref().and_then(|c| c.log_file.clone()));
    config.dry_run = cli.dry_run || file.as_ref().is_some_and(|c| c.dry_run);
    config.size_prefilter =
        !cli.no_size_prefilter && file.as_ref().is_none_or(|c| c.size_prefilter);

    config.validate()?;
    Ok(config)
}
