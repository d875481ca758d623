//! Progress reporter port
//!
//! The engine reports every per-file outcome as it happens. The CLI prints
//! them; tests record them.
//!
//! ## Design Notes
//!
//! - Reports are fire-and-forget; the engine never waits on the reporter.

use serde::Serialize;

use crate::domain::decision::{ConflictKind, SkipReason};
use crate::domain::entry::WriteMode;

/// Direction of the pass that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upload,
    Download,
}

/// What happened to one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Uploaded { mode: WriteMode, bytes: u64 },
    Downloaded { overwrite: bool, bytes: u64 },
    Skipped { reason: SkipReason },
    Conflict { conflict: ConflictKind },
    Failed { error: String },
}

/// One reported outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncEvent {
    pub direction: Direction,
    /// Local path of the entry
    pub path: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Receives per-file outcomes
pub trait IProgressReporter: Send + Sync {
    fn report(&self, event: &SyncEvent);
}

/// Reporter that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl IProgressReporter for SilentReporter {
    fn report(&self, _event: &SyncEvent) {}
}
