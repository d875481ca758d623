//! Reconciliation decisions
//!
//! A [`Decision`] is what the reconciler concludes for one local/remote pair.
//! Every reachable pair maps to exactly one variant.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::entry::WriteMode;

/// Why nothing was transferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Size and client-modified time match at second precision
    StatsMatch,
    /// Stats differed but the bytes are identical
    ContentMatch,
    /// The remote copy is not newer than the local one
    NotNewer,
    /// The confirmation policy answered no
    Declined,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::StatsMatch => "stats match",
            SkipReason::ContentMatch => "content match",
            SkipReason::NotNewer => "remote not newer",
            SkipReason::Declined => "declined",
        };
        write!(f, "{}", s)
    }
}

/// A pair of entries that cannot be reconciled automatically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictKind {
    /// A local file has the same name as a remote folder
    RemoteFolder,
    /// The remote listing holds a name that differs only by case
    CaseCollision { remote_name: String },
    /// A remote file maps onto an existing local directory
    LocalDirectory,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::RemoteFolder => write!(f, "remote entry is a folder"),
            ConflictKind::CaseCollision { remote_name } => {
                write!(f, "case-insensitive collision with remote {}", remote_name)
            }
            ConflictKind::LocalDirectory => write!(f, "local entry is a directory"),
        }
    }
}

/// Outcome of reconciling one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    /// Send the local file to the store
    Upload { mode: WriteMode },
    /// Fetch the remote file
    Download { overwrite: bool },
    /// Leave both sides alone
    Skip { reason: SkipReason },
    /// Report and leave both sides alone
    Conflict { conflict: ConflictKind },
    /// The user asked to stop the run
    Abort,
}

impl Decision {
    pub fn skip(reason: SkipReason) -> Self {
        Decision::Skip { reason }
    }

    pub fn conflict(conflict: ConflictKind) -> Self {
        Decision::Conflict { conflict }
    }

    /// Whether this decision moves bytes
    pub fn is_transfer(&self) -> bool {
        matches!(self, Decision::Upload { .. } | Decision::Download { .. })
    }
}
