//! Tracing subscriber setup for the `mirror` binary

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{CliError, Result};

/// Initialize the global tracing subscriber.
///
/// With a log file, records are appended to it without colours. The console
/// (stderr) layer is added when there is no log file or `verbose` is set.
/// `RUST_LOG` overrides the default level of `info` (`debug` when verbose).
pub fn init(log_file: Option<&Path>, verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| CliError::user(format!("Invalid log filter: {}", e)))?;

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    let console_layer = (verbose || log_file.is_none()).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(verbose)
            .compact()
    });

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| CliError::user(format!("Failed to set tracing subscriber: {}", e)))?;

    Ok(())
}
