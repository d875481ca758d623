//! Local filesystem port (driven/secondary port)
//!
//! This module defines the interface for interacting with the local
//! filesystem: enumerating directories, reading files whole or in chunks,
//! writing downloaded content and stamping its modification time.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific.
//! - Directory entries carry the raw `OsString` name; the walker decides
//!   what to do with names that are not valid UTF-8.
//! - Timestamps are UTC with whole-second precision.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

// ============================================================================
// FileSystemState struct
// ============================================================================

/// Snapshot of a path's state on the local filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemState {
    /// Whether the file/directory exists on disk
    pub exists: bool,
    /// Whether this is a regular file (false for directories and other types)
    pub is_file: bool,
    /// Size in bytes (0 for directories or non-existent files)
    pub size: u64,
    /// Last modification time, whole seconds (None if the path doesn't exist)
    pub modified: Option<DateTime<Utc>>,
}

impl FileSystemState {
    /// Returns a state representing a non-existent path
    pub fn not_found() -> Self {
        Self {
            exists: false,
            is_file: false,
            size: 0,
            modified: None,
        }
    }

    /// Returns true if the file exists and is a regular file
    pub fn is_regular_file(&self) -> bool {
        self.exists && self.is_file
    }

    /// Returns true if the path exists and is a directory
    pub fn is_directory(&self) -> bool {
        self.exists && !self.is_file
    }
}

// ============================================================================
// DirectoryEntry struct
// ============================================================================

/// Kind of a directory entry, symlinks resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Sockets, FIFOs, dangling links and the like
    Other,
}

/// One entry of a local directory
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Absolute path of the entry
    pub path: PathBuf,
    /// Raw file name
    pub file_name: OsString,
    pub kind: EntryKind,
    /// Size in bytes (0 for non-files)
    pub size: u64,
    /// Last modification time, whole seconds
    pub modified: DateTime<Utc>,
}

// ============================================================================
// ILocalFileSystem trait
// ============================================================================

/// Port trait for local filesystem operations
///
/// ## Implementation Notes
///
/// - All paths are absolute.
/// - `read_directory` returns entries sorted by name so traversal order is
///   stable between runs.
#[async_trait::async_trait]
pub trait ILocalFileSystem: Send + Sync {
    /// Lists the immediate children of a directory
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read
    async fn read_directory(&self, path: &Path) -> anyhow::Result<Vec<DirectoryEntry>>;

    /// Reads the entire contents of a file
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be read
    async fn read_file(&self, path: &Path) -> anyhow::Result<Vec<u8>>;

    /// Reads up to `len` bytes starting at `offset`
    ///
    /// Returns fewer than `len` bytes only at end of file.
    async fn read_chunk(&self, path: &Path, offset: u64, len: usize) -> anyhow::Result<Vec<u8>>;

    /// Writes data to a file, replacing any previous content
    ///
    /// Parent directories are created as needed.
    async fn write_file(&self, path: &Path, data: &[u8]) -> anyhow::Result<()>;

    /// Sets the modification time of a file
    async fn set_modified(&self, path: &Path, modified: DateTime<Utc>) -> anyhow::Result<()>;

    /// Gets the current state of a file or directory
    ///
    /// Returns `FileSystemState::not_found()` if the path doesn't exist
    /// (does not return an error for missing paths).
    async fn get_state(&self, path: &Path) -> anyhow::Result<FileSystemState>;

    /// Creates a directory and all parent directories as needed
    async fn create_directory(&self, path: &Path) -> anyhow::Result<()>;
}
