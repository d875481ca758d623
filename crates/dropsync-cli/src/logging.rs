//! Console and per-run log file setup
//!
//! The console gets human-readable lines on stderr at a level raised by
//! `-v` and lowered by `--quiet`; `RUST_LOG` overrides it. Every run also
//! writes a fresh log file named after its start time.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use dropsync_core::config::{expand_tilde, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Log file name for a run started at `started`
pub fn log_file_name(started: DateTime<Local>) -> String {
    started.format("%Y%m%d.%H%M%S%6f.log").to_string()
}

fn base_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::INFO)
}

/// Level for the log file: the configured level, raised by `-v`
pub fn file_level(configured: &str, verbose: u8) -> LevelFilter {
    match verbose {
        0 => base_level(configured),
        1 => base_level(configured).max(LevelFilter::DEBUG),
        _ => LevelFilter::TRACE,
    }
}

/// Level for the console; `--quiet` wins over `-v`
pub fn console_level(configured: &str, verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::WARN
    } else {
        file_level(configured, verbose)
    }
}

/// Installs the global subscriber
///
/// The returned guard flushes the file writer when dropped and must be held
/// until the run ends.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a subscriber
/// is already installed
pub fn init(config: &LoggingConfig, verbose: u8, quiet: bool) -> Result<(WorkerGuard, PathBuf)> {
    let dir = expand_tilde(&config.directory);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let file_name = log_file_name(Local::now());
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, &file_name));

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(console_level(&config.level, verbose, quiet).to_string())
    });
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let level = file_level(&config.level, verbose);
    let file_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_filter(level)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .with_filter(level)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok((guard, dir.join(file_name)))
}
