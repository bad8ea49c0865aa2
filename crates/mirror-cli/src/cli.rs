//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;

/// Folder Mirror - keep a replica directory identical to a source directory
///
/// Runs forever, mirroring SOURCE into REPLICA every INTERVAL seconds, until
/// interrupted with Ctrl-C.
///
/// Examples:
///   mirror ./data /mnt/backup 60 mirror.log   # Every minute, log to file
///   mirror ./data /mnt/backup --once          # Single run
///   mirror --config mirror.toml               # Settings from a file
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source folder path
    pub source: Option<PathBuf>,

    /// Replica folder path
    pub replica: Option<PathBuf>,

    /// Sync interval in seconds
    pub interval: Option<u64>,

    /// Log file path
    pub log_file: Option<PathBuf>,

    /// Load settings from a TOML, JSON or YAML file (arguments take precedence)
    #[arg(short, long, env = "MIRROR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run a single sync and exit
    #[arg(long)]
    pub once: bool,

    /// Preview changes without applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report as JSON (requires --once)
    #[arg(long, requires = "once")]
    pub json: bool,

    /// Always hash files, even when their sizes differ
    #[arg(long)]
    pub no_size_prefilter: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
