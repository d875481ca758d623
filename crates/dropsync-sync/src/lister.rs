//! Remote Lister
//!
//! Follows the store's cursor protocol to enumerate one remote directory and
//! builds the name-keyed map the reconciler looks files up in.
//!
//! Listing failures never abort a run: [`RemoteLister::list_or_empty`] logs
//! the failure and treats the directory as empty.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use dropsync_core::domain::{fold_filename, normalize_filename, RemoteEntry, RemotePath};
use dropsync_core::ports::remote_store::IRemoteStore;
use tracing::{debug, warn};

use crate::SyncError;

// ============================================================================
// RemoteListing
// ============================================================================

/// Entries of one remote directory keyed by NFC name
///
/// Two names that normalize to the same NFC form are the same entry; the
/// later one in listing order wins. A second, case-folded index answers
/// "is there an entry that differs only by case".
#[derive(Debug, Default)]
pub struct RemoteListing {
    by_name: HashMap<String, RemoteEntry>,
    by_folded: HashMap<String, String>,
}

impl RemoteListing {
    pub fn from_entries(entries: Vec<RemoteEntry>) -> Self {
        let mut listing = Self::default();
        for entry in entries {
            let name = entry.normalized_name();
            listing.by_folded.insert(fold_filename(&name), entry.name().to_string());
            listing.by_name.insert(name, entry);
        }
        listing
    }

    /// Looks up an entry by (not necessarily normalized) name
    pub fn get(&self, name: &str) -> Option<&RemoteEntry> {
        self.by_name.get(&normalize_filename(name))
    }

    /// Returns the remote name that matches `name` only when case is ignored
    ///
    /// An exact NFC match is not a collision and yields `None`.
    pub fn case_collision(&self, name: &str) -> Option<&str> {
        if self.get(name).is_some() {
            return None;
        }
        self.by_folded.get(&fold_filename(name)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

// ============================================================================
// RemoteLister
// ============================================================================

/// Enumerates remote directories page by page
pub struct RemoteLister {
    remote_store: Arc<dyn IRemoteStore + Send + Sync>,
    max_pages: Option<usize>,
}

impl RemoteLister {
    pub fn new(remote_store: Arc<dyn IRemoteStore + Send + Sync>) -> Self {
        Self {
            remote_store,
            max_pages: None,
        }
    }

    /// Stops following the cursor after `max_pages` pages
    ///
    /// Production runs trust the store to end the listing; tests use this to
    /// bound a misbehaving fake.
    pub fn with_page_limit(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Lists every entry of `path` in server order
    ///
    /// Calls `list_folder` once, then `list_folder_continue` while the last
    /// page reports more entries.
    ///
    /// # Errors
    /// Returns [`SyncError::Listing`] if any page fails
    pub async fn list_all(&self, path: &RemotePath) -> Result<Vec<RemoteEntry>, SyncError> {
        let started = Instant::now();

        let mut page = self
            .remote_store
            .list_folder(path)
            .await
            .map_err(|e| SyncError::listing(path, &e))?;
        let mut entries = std::mem::take(&mut page.entries);
        let mut pages = 1usize;

        while page.has_more {
            if self.max_pages.is_some_and(|max| pages >= max) {
                warn!(path = %path, pages, "Listing page limit reached, truncating");
                break;
            }
            page = self
                .remote_store
                .list_folder_continue(&page.cursor)
                .await
                .map_err(|e| SyncError::listing(path, &e))?;
            entries.append(&mut page.entries);
            pages += 1;
        }

        debug!(
            path = %path,
            entries = entries.len(),
            pages,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "list_folder complete"
        );
        Ok(entries)
    }

    /// Lists `path`, treating any failure as an empty directory
    pub async fn list_or_empty(&self, path: &RemotePath) -> Vec<RemoteEntry> {
        match self.list_all(path).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path, error = %e, "Folder listing failed, assuming empty");
                Vec::new()
            }
        }
    }

    /// Lists `path` into a name-keyed map, empty on failure
    pub async fn listing(&self, path: &RemotePath) -> RemoteListing {
        RemoteListing::from_entries(self.list_or_empty(path).await)
    }

    /// Checks that `path` can be listed at all
    ///
    /// # Errors
    /// Returns [`SyncError::Listing`] if the first page cannot be fetched
    pub async fn probe(&self, path: &RemotePath) -> Result<(), SyncError> {
        self.remote_store
            .list_folder(path)
            .await
            .map(|_| ())
            .map_err(|e| SyncError::listing(path, &e))
    }
}
