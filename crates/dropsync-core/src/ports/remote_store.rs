//! Remote store port (driven/secondary port)
//!
//! This module defines the interface for the hierarchical remote object
//! store being synchronized against. Implementations handle the transport
//! details (HTTP endpoints, argument headers, authentication).
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because the error types differ between stores.
//!   Callers decide which failures are recoverable.
//! - Paths are always canonical [`RemotePath`] values.
//! - The store is called strictly sequentially; implementations don't need
//!   to support overlapping calls.

use chrono::{DateTime, Utc};

use crate::domain::entry::{AccountInfo, FileMetadata, ListingPage, TransferSession, WriteMode};
use crate::domain::newtypes::RemotePath;

/// Port trait for the remote object store
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Lists the first page of a remote directory
    ///
    /// # Arguments
    /// * `path` - Directory to list (`""` for the store root)
    async fn list_folder(&self, path: &RemotePath) -> anyhow::Result<ListingPage>;

    /// Fetches the next page of a listing
    ///
    /// # Arguments
    /// * `cursor` - Cursor from the previous page
    async fn list_folder_continue(&self, cursor: &str) -> anyhow::Result<ListingPage>;

    /// Downloads a file, returning its metadata and full content
    async fn download(&self, path: &RemotePath) -> anyhow::Result<(FileMetadata, Vec<u8>)>;

    /// Uploads a file in a single call
    ///
    /// # Arguments
    /// * `path` - Destination path
    /// * `data` - Full file content
    /// * `mode` - Whether an existing file may be replaced
    /// * `client_modified` - Timestamp recorded on the remote file
    async fn upload(
        &self,
        path: &RemotePath,
        data: Vec<u8>,
        mode: WriteMode,
        client_modified: DateTime<Utc>,
    ) -> anyhow::Result<FileMetadata>;

    /// Starts a chunked upload session carrying the first chunk
    ///
    /// # Returns
    /// The session identifier
    async fn upload_session_start(&self, first_chunk: Vec<u8>) -> anyhow::Result<String>;

    /// Appends a chunk at `offset` to an open session
    async fn upload_session_append(
        &self,
        chunk: Vec<u8>,
        session_id: &str,
        offset: u64,
    ) -> anyhow::Result<()>;

    /// Sends the final chunk and commits the file described by `session`
    ///
    /// `session.offset` is the number of bytes already sent.
    async fn upload_session_finish(
        &self,
        last_chunk: Vec<u8>,
        session: &TransferSession,
    ) -> anyhow::Result<FileMetadata>;

    /// Token liveness probe
    async fn get_current_account(&self) -> anyhow::Result<AccountInfo>;
}
