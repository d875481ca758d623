//! Local and remote entry snapshots
//!
//! All timestamps in this module are UTC with whole-second precision.
//! Sub-second parts are dropped on construction so that stats comparisons
//! between the two sides never disagree on fractions of a second.

use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{normalize_filename, RemotePath};

/// Truncates a timestamp to whole seconds
pub fn whole_seconds(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(0)
}

/// Converts a filesystem timestamp into a whole-second UTC timestamp
pub fn from_system_time(ts: SystemTime) -> DateTime<Utc> {
    whole_seconds(DateTime::<Utc>::from(ts))
}

// ============================================================================
// Local side
// ============================================================================

/// A file found by the local tree walker
///
/// Snapshot taken at walk time; the file may change before it is transferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileEntry {
    /// Absolute path on disk
    pub path: PathBuf,
    /// File name (last path component)
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time, whole seconds
    pub modified: DateTime<Utc>,
    /// Name starts with `.`
    pub hidden: bool,
}

impl LocalFileEntry {
    pub fn new(path: PathBuf, name: impl Into<String>, size: u64, modified: DateTime<Utc>) -> Self {
        let name = name.into();
        let hidden = name.starts_with('.');
        Self {
            path,
            name,
            size,
            modified: whole_seconds(modified),
            hidden,
        }
    }

    /// NFC form of the name, used for remote listing lookups
    pub fn normalized_name(&self) -> String {
        normalize_filename(&self.name)
    }
}

// ============================================================================
// Remote side
// ============================================================================

/// Metadata describing a remote file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// File name as stored remotely
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Timestamp set by the uploader, whole seconds
    pub client_modified: DateTime<Utc>,
}

/// A single entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemoteEntry {
    File(FileMetadata),
    Folder { name: String },
}

impl RemoteEntry {
    pub fn name(&self) -> &str {
        match self {
            RemoteEntry::File(meta) => &meta.name,
            RemoteEntry::Folder { name } => name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, RemoteEntry::Folder { .. })
    }

    pub fn normalized_name(&self) -> String {
        normalize_filename(self.name())
    }
}

/// One page of a paginated remote listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Entries in server order
    pub entries: Vec<RemoteEntry>,
    /// Opaque continuation cursor
    pub cursor: String,
    /// Whether another page can be fetched with `cursor`
    pub has_more: bool,
}

/// Account details returned by the token liveness probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_id: String,
    pub display_name: String,
    pub email: String,
}

// ============================================================================
// Transfers
// ============================================================================

/// Remote write mode for uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Fail if the target already exists
    Add,
    /// Replace the target
    Overwrite,
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::Add => write!(f, "add"),
            WriteMode::Overwrite => write!(f, "overwrite"),
        }
    }
}

/// State of one chunked upload in flight
///
/// Owned by a single upload and dropped when it completes or fails.
/// The offset is advanced by the caller from the bytes it has sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSession {
    pub session_id: String,
    pub offset: u64,
    pub target: RemotePath,
    pub mode: WriteMode,
    pub client_modified: DateTime<Utc>,
}

impl TransferSession {
    pub fn new(
        session_id: impl Into<String>,
        target: RemotePath,
        mode: WriteMode,
        client_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            offset: 0,
            target,
            mode,
            client_modified: whole_seconds(client_modified),
        }
    }

    /// Records that `bytes` more bytes were accepted by the store
    pub fn advance(&mut self, bytes: u64) {
        self.offset += bytes;
    }
}
