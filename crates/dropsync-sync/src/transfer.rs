//! Transfer Engine
//!
//! Executes upload and download decisions against the remote store.
//!
//! ## Upload
//!
//! Files at or below the large-file threshold go up in one `upload` call.
//! Larger files use the session protocol: `upload_session_start` carries the
//! first chunk, `upload_session_append` sends each following chunk while
//! more than one chunk remains, and `upload_session_finish` sends the last
//! chunk together with the commit metadata. The offset is tracked locally
//! from the bytes sent, never queried from the store.
//!
//! The size that picks the path and drives the session is read from disk
//! when the upload starts, not taken from the walk.
//!
//! ## Download
//!
//! One `download` call returns the content and metadata; the file is written
//! atomically and its mtime set to the remote client-modified time.
//!
//! Every failure is returned as [`SyncError::Transfer`] so the orchestrator
//! can skip the file and carry on.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use dropsync_core::config::TransferConfig;
use dropsync_core::domain::{FileMetadata, LocalFileEntry, RemotePath, TransferSession, WriteMode};
use dropsync_core::ports::local_filesystem::ILocalFileSystem;
use dropsync_core::ports::remote_store::IRemoteStore;
use tracing::{debug, instrument};

use crate::SyncError;

/// Default large-file threshold (10 MiB)
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Default session chunk size (4 MiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 4 * 1024 * 1024;

/// Moves file content between the local filesystem and the remote store
pub struct TransferEngine {
    remote_store: Arc<dyn IRemoteStore + Send + Sync>,
    local_filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
    /// Files larger than this (in bytes) use the session protocol
    large_file_threshold: u64,
    /// Bytes per session call
    chunk_size: u64,
}

impl TransferEngine {
    pub fn new(
        remote_store: Arc<dyn IRemoteStore + Send + Sync>,
        local_filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
    ) -> Self {
        Self {
            remote_store,
            local_filesystem,
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Applies the threshold and chunk size from the transfer configuration
    pub fn with_config(self, config: &TransferConfig) -> Self {
        self.with_limits(config.threshold_bytes(), config.chunk_size_bytes())
    }

    /// Sets the threshold and chunk size in bytes
    pub fn with_limits(mut self, large_file_threshold: u64, chunk_size: u64) -> Self {
        self.large_file_threshold = large_file_threshold;
        self.chunk_size = chunk_size.max(1);
        self
    }

    // ========================================================================
    // Upload
    // ========================================================================

    /// Uploads `file` to `target`, stamping it with the local mtime
    ///
    /// # Errors
    /// Returns [`SyncError::Transfer`] if reading the file or any remote call fails
    #[instrument(skip(self, file), fields(path = %file.path.display(), size = file.size, mode = %mode))]
    pub async fn upload(
        &self,
        file: &LocalFileEntry,
        target: &RemotePath,
        mode: WriteMode,
    ) -> Result<FileMetadata, SyncError> {
        let started = Instant::now();

        let result = match self.current_size(file).await {
            Ok(size) if size <= self.large_file_threshold => {
                self.upload_single(file, target, mode).await
            }
            Ok(size) => self.upload_session(file, size, target, mode).await,
            Err(e) => Err(e),
        };

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "upload of {} finished",
            target
        );
        result.map_err(|e| SyncError::transfer(target, &e))
    }

    async fn current_size(&self, file: &LocalFileEntry) -> anyhow::Result<u64> {
        let state = self
            .local_filesystem
            .get_state(&file.path)
            .await
            .context("Failed to stat local file")?;
        if !state.is_regular_file() {
            anyhow::bail!("{} is no longer a regular file", file.path.display());
        }
        if state.size != file.size {
            debug!(
                walked = file.size,
                current = state.size,
                "File size changed since the walk"
            );
        }
        Ok(state.size)
    }

    async fn upload_single(
        &self,
        file: &LocalFileEntry,
        target: &RemotePath,
        mode: WriteMode,
    ) -> anyhow::Result<FileMetadata> {
        let data = self
            .local_filesystem
            .read_file(&file.path)
            .await
            .context("Failed to read local file")?;
        self.remote_store
            .upload(target, data, mode, file.modified)
            .await
    }

    async fn upload_session(
        &self,
        file: &LocalFileEntry,
        size: u64,
        target: &RemotePath,
        mode: WriteMode,
    ) -> anyhow::Result<FileMetadata> {
        let chunk_len = self.chunk_size as usize;

        let first = self.read_chunk(file, 0, chunk_len).await?;
        let sent = first.len() as u64;
        let session_id = self.remote_store.upload_session_start(first).await?;

        let mut session = TransferSession::new(session_id, target.clone(), mode, file.modified);
        session.advance(sent);
        debug!(session_id = %session.session_id, "Upload session started");

        loop {
            let remaining = size.saturating_sub(session.offset);
            if remaining <= self.chunk_size {
                let last = self
                    .read_chunk(file, session.offset, remaining as usize)
                    .await?;
                if (last.len() as u64) < remaining {
                    anyhow::bail!("file shrank during upload at offset {}", session.offset);
                }
                return self.remote_store.upload_session_finish(last, &session).await;
            }

            let chunk = self.read_chunk(file, session.offset, chunk_len).await?;
            if chunk.is_empty() {
                anyhow::bail!("file shrank during upload at offset {}", session.offset);
            }
            let sent = chunk.len() as u64;
            self.remote_store
                .upload_session_append(chunk, &session.session_id, session.offset)
                .await?;
            session.advance(sent);
        }
    }

    async fn read_chunk(
        &self,
        file: &LocalFileEntry,
        offset: u64,
        len: usize,
    ) -> anyhow::Result<Vec<u8>> {
        self.local_filesystem
            .read_chunk(&file.path, offset, len)
            .await
            .with_context(|| format!("Failed to read local file at offset {}", offset))
    }

    // ========================================================================
    // Download
    // ========================================================================

    /// Downloads `source` into memory
    ///
    /// Used for content comparison; nothing is written locally.
    ///
    /// # Errors
    /// Returns [`SyncError::Transfer`] if the download fails
    pub async fn fetch(&self, source: &RemotePath) -> Result<Vec<u8>, SyncError> {
        let started = Instant::now();
        let (_, data) = self
            .remote_store
            .download(source)
            .await
            .map_err(|e| SyncError::transfer(source, &e))?;
        debug!(
            path = %source,
            bytes = data.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "download finished"
        );
        Ok(data)
    }

    /// Downloads `source`, saves it at `target` and sets its mtime
    ///
    /// # Returns
    /// The remote metadata and the number of bytes written
    ///
    /// # Errors
    /// Returns [`SyncError::Transfer`] if the download or the local write fails
    #[instrument(skip(self), fields(source = %source, target = %target.display()))]
    pub async fn download_to(
        &self,
        source: &RemotePath,
        target: &Path,
    ) -> Result<(FileMetadata, u64), SyncError> {
        let started = Instant::now();
        let result = self.download_and_save(source, target).await;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "download and save finished"
        );
        result.map_err(|e| SyncError::transfer(source, &e))
    }

    async fn download_and_save(
        &self,
        source: &RemotePath,
        target: &Path,
    ) -> anyhow::Result<(FileMetadata, u64)> {
        let (meta, data) = self.remote_store.download(source).await?;
        self.local_filesystem
            .write_file(target, &data)
            .await
            .context("Failed to write local file")?;
        self.local_filesystem
            .set_modified(target, meta.client_modified)
            .await
            .context("Failed to set local modification time")?;
        Ok((meta, data.len() as u64))
    }
}
