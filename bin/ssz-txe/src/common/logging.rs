//! Logging configuration for the ssz-txe CLI tool.
//!
//! Verbosity is raised with `-v` flags, `RUST_LOG` overrides it, and `--log.file` redirects
//! output to a file.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use super::Result;

/// Logging configuration arguments.
#[derive(Debug, Clone, Default, Parser)]
pub struct LogArgs {
    /// Increase logging verbosity (-v = error, -vv = warn, -vvv = info, -vvvv = debug, -vvvvv =
    /// trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log file path. If specified, logs are written to this file instead of stderr.
    #[arg(long = "log.file", visible_aliases = ["log-file"], global = true)]
    pub log_file: Option<PathBuf>,

    /// Disable colorful console logging. Only applies when logging to stderr (no --log.file).
    #[arg(long = "log.no-color", visible_aliases = ["log-no-color"], global = true)]
    pub log_no_color: bool,
}

impl LogArgs {
    /// Initialize the tracing subscriber based on the logging configuration.
    ///
    /// `RUST_LOG` takes precedence over `-v` flags. Without either, logging is off. The log
    /// target is only shown from DEBUG level on.
    pub fn init(&self) -> Result<()> {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if let Some(level) = self.level() {
            EnvFilter::new(format!("ssz_txe={level},ssz_tx={level}"))
        } else {
            EnvFilter::new("off")
        };

        let show_target = self.verbose >= 4;

        if let Some(ref log_file) = self.log_file {
            // files never get ANSI colors
            let file = std::fs::File::create(log_file)?;
            fmt()
                .with_env_filter(filter)
                .with_target(show_target)
                .with_writer(file)
                .with_ansi(false)
                .init();
        } else {
            fmt()
                .with_env_filter(filter)
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .with_ansi(!self.log_no_color)
                .init();
        }
        Ok(())
    }

    /// Level selected by the `-v` flags, or `None` if logging is off.
    pub const fn level(&self) -> Option<Level> {
        match self.verbose {
            0 => None,
            1 => Some(Level::ERROR),
            2 => Some(Level::WARN),
            3 => Some(Level::INFO),
            4 => Some(Level::DEBUG),
            _ => Some(Level::TRACE),
        }
    }
}
