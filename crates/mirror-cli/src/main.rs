//! Folder Mirror CLI
//!
//! Keeps a replica directory identical to a source directory, either once or
//! on a fixed interval until interrupted.

mod cli;
mod commands;
mod error;
mod logging;
mod settings;

use clap::Parser;
use colored::Colorize;

use cli::Cli;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = settings::resolve(&cli)?;

    logging::init(config.log_file.as_deref(), cli.verbose)?;
    tracing::debug!(?config, "Resolved configuration");

    if cli.once {
        commands::run_once(&config, cli.json)
    } else {
        commands::run_watch(&config)
    }
}
