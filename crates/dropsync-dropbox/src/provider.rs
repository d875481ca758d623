//! DropboxRemoteStore - IRemoteStore implementation for the Dropbox API
//!
//! Wraps the [`DropboxClient`] and delegates to the listing and transfer
//! modules to fulfil the [`IRemoteStore`] port contract.
//!
//! ## Design Notes
//!
//! - The client is immutable after construction, so no lock is needed
//!   around it; the engine never overlaps calls anyway.
//! - Errors are returned as `anyhow::Error` wrapping [`DropboxError`]
//!   (see [`crate::DropboxError`]) so callers can downcast when they need the status.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::debug;

use dropsync_core::domain::{
    AccountInfo, FileMetadata, ListingPage, RemotePath, TransferSession, WriteMode,
};
use dropsync_core::ports::IRemoteStore;

use crate::client::DropboxClient;
use crate::listing;
use crate::transfer;

/// Remote store implementation that delegates to the Dropbox API
pub struct DropboxRemoteStore {
    client: DropboxClient,
}

impl DropboxRemoteStore {
    /// Creates a new `DropboxRemoteStore` wrapping the given [`DropboxClient`]
    pub fn new(client: DropboxClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl IRemoteStore for DropboxRemoteStore {
    async fn list_folder(&self, path: &RemotePath) -> Result<ListingPage> {
        debug!(path = %path, "DropboxRemoteStore::list_folder");
        listing::list_folder(&self.client, path).await
    }

    async fn list_folder_continue(&self, cursor: &str) -> Result<ListingPage> {
        debug!("DropboxRemoteStore::list_folder_continue");
        listing::list_folder_continue(&self.client, cursor).await
    }

    async fn download(&self, path: &RemotePath) -> Result<(FileMetadata, Vec<u8>)> {
        debug!(path = %path, "DropboxRemoteStore::download");
        transfer::download(&self.client, path).await
    }

    async fn upload(
        &self,
        path: &RemotePath,
        data: Vec<u8>,
        mode: WriteMode,
        client_modified: DateTime<Utc>,
    ) -> Result<FileMetadata> {
        debug!(path = %path, size = data.len(), "DropboxRemoteStore::upload");
        transfer::upload(&self.client, path, data, mode, client_modified).await
    }

    async fn upload_session_start(&self, first_chunk: Vec<u8>) -> Result<String> {
        debug!(size = first_chunk.len(), "DropboxRemoteStore::upload_session_start");
        transfer::upload_session_start(&self.client, first_chunk).await
    }

    async fn upload_session_append(
        &self,
        chunk: Vec<u8>,
        session_id: &str,
        offset: u64,
    ) -> Result<()> {
        transfer::upload_session_append(&self.client, chunk, session_id, offset).await
    }

    async fn upload_session_finish(
        &self,
        last_chunk: Vec<u8>,
        session: &TransferSession,
    ) -> Result<FileMetadata> {
        debug!(path = %session.target, "DropboxRemoteStore::upload_session_finish");
        transfer::upload_session_finish(&self.client, last_chunk, session).await
    }

    async fn get_current_account(&self) -> Result<AccountInfo> {
        debug!("DropboxRemoteStore::get_current_account");
        self.client.get_current_account().await
    }
}
