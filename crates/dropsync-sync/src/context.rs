//! Per-run context
//!
//! One [`RunContext`] is created when a run starts and threaded through both
//! passes. It owns the run's counters and start time; nothing about a run
//! lives in globals.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use dropsync_core::domain::{RemotePath, SyncCounters};
use tracing::info;

/// Formats a runtime as `D days H hours M mins S secs`
pub fn format_runtime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (days, rest) = (secs / 86_400, secs % 86_400);
    let (hours, rest) = (rest / 3_600, rest % 3_600);
    let (mins, secs) = (rest / 60, rest % 60);
    format!("{days} days {hours} hours {mins} mins {secs} secs")
}

/// State owned by one sync run
#[derive(Debug)]
pub struct RunContext {
    local_root: PathBuf,
    remote_root: RemotePath,
    started: Instant,
    /// Totals across every pass that has finished (or stopped) so far
    pub counters: SyncCounters,
}

impl RunContext {
    pub fn new(local_root: impl Into<PathBuf>, remote_root: RemotePath) -> Self {
        Self {
            local_root: local_root.into(),
            remote_root,
            started: Instant::now(),
            counters: SyncCounters::default(),
        }
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    pub fn remote_root(&self) -> &RemotePath {
        &self.remote_root
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn log_runtime(&self) {
        info!("Runtime: {}", format_runtime(self.elapsed()));
    }

    /// Logs the final counters and runtime
    ///
    /// Called once at the end of every run, including aborted ones.
    pub fn log_summary(&self) {
        let c = &self.counters;
        info!(count = c.uploaded_new, "New files uploaded");
        info!(count = c.uploaded_updated, "Updated files uploaded");
        info!(bytes = c.bytes_uploaded, "Total bytes uploaded");
        info!(count = c.downloaded_new, "New files downloaded");
        info!(count = c.downloaded_updated, "Updated files downloaded");
        info!(bytes = c.bytes_downloaded, "Total bytes downloaded");
        self.log_runtime();
    }
}
