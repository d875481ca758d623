//! Reconciler - the decision tables
//!
//! Given one local file and the listing of its remote directory (upload
//! direction), or one remote file and the state of its local target
//! (download direction), decides exactly one [`Decision`].
//!
//! ## Upload direction
//!
//! | Remote state                          | Decision                                   |
//! |---------------------------------------|--------------------------------------------|
//! | absent, no case-insensitive match     | Upload(add) if confirmed, default yes      |
//! | absent, differs only by case          | Conflict(CaseCollision)                    |
//! | folder                                | Conflict(RemoteFolder)                     |
//! | file, size and mtime equal            | Skip(stats match)                          |
//! | file, stats differ, bytes equal       | Skip(content match)                        |
//! | file, stats differ, bytes differ      | Upload(overwrite) if confirmed             |
//!
//! ## Download direction
//!
//! | Local state                           | Decision                                   |
//! |---------------------------------------|--------------------------------------------|
//! | missing                               | Download(new) if confirmed, default yes    |
//! | directory                             | Conflict(LocalDirectory)                   |
//! | file, remote client-modified newer    | Download(overwrite) if confirmed, default yes |
//! | file, remote not newer                | Skip(not newer)                            |
//!
//! Confirmation goes through the injected [`IConfirmationPolicy`]; an
//! `Abort` answer becomes [`Decision::Abort`].

use std::path::Path;
use std::sync::Arc;

use dropsync_core::domain::{
    ConflictKind, Decision, FileMetadata, LocalFileEntry, RemoteEntry, RemotePath, SkipReason,
    WriteMode,
};
use dropsync_core::ports::confirmation::{Answer, IConfirmationPolicy};
use dropsync_core::ports::local_filesystem::ILocalFileSystem;
use tracing::debug;

use crate::lister::RemoteListing;
use crate::transfer::TransferEngine;
use crate::SyncError;

pub struct Reconciler {
    confirmation: Arc<dyn IConfirmationPolicy + Send + Sync>,
    local_filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
    transfer: Arc<TransferEngine>,
    /// Default answer for "upload and overwrite"
    overwrite_default: bool,
}

impl Reconciler {
    pub fn new(
        confirmation: Arc<dyn IConfirmationPolicy + Send + Sync>,
        local_filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
        transfer: Arc<TransferEngine>,
        overwrite_default: bool,
    ) -> Self {
        Self {
            confirmation,
            local_filesystem,
            transfer,
            overwrite_default,
        }
    }

    fn confirm(&self, message: &str, default: bool, on_yes: Decision) -> Decision {
        match self.confirmation.confirm(message, default) {
            Answer::Yes => on_yes,
            Answer::No => Decision::skip(SkipReason::Declined),
            Answer::Abort => Decision::Abort,
        }
    }

    /// Asks whether to descend into a local subdirectory
    pub fn confirm_descend(&self, name: &str) -> Answer {
        self.confirmation.confirm(&format!("Descend into {}", name), true)
    }

    // ========================================================================
    // Local -> Remote
    // ========================================================================

    /// Decides what to do with a local file
    ///
    /// `remote_dir` is the remote directory `listing` was taken from.
    ///
    /// # Errors
    /// Returns [`SyncError::Transfer`] if the content comparison cannot
    /// download the remote copy or read the local one
    pub async fn decide_upload(
        &self,
        file: &LocalFileEntry,
        listing: &RemoteListing,
        remote_dir: &RemotePath,
    ) -> Result<Decision, SyncError> {
        let remote = match listing.get(&file.name) {
            Some(RemoteEntry::File(meta)) => meta,
            Some(RemoteEntry::Folder { .. }) => {
                return Ok(Decision::conflict(ConflictKind::RemoteFolder));
            }
            None => {
                if let Some(remote_name) = listing.case_collision(&file.name) {
                    return Ok(Decision::conflict(ConflictKind::CaseCollision {
                        remote_name: remote_name.to_string(),
                    }));
                }
                return Ok(self.confirm(
                    &format!("Upload and save {}", file.name),
                    true,
                    Decision::Upload {
                        mode: WriteMode::Add,
                    },
                ));
            }
        };

        if stats_match(file, remote) {
            return Ok(Decision::skip(SkipReason::StatsMatch));
        }

        debug!(name = %file.name, "Exists with different stats, comparing content");
        let remote_path = remote_dir.join(&file.name);
        let remote_bytes = self.transfer.fetch(&remote_path).await?;
        let local_bytes = self
            .local_filesystem
            .read_file(&file.path)
            .await
            .map_err(|e| SyncError::transfer(file.path.display(), &e))?;

        if remote_bytes == local_bytes {
            return Ok(Decision::skip(SkipReason::ContentMatch));
        }

        debug!(name = %file.name, "Has changed since last sync");
        Ok(self.confirm(
            &format!("Upload and overwrite {}", file.name),
            self.overwrite_default,
            Decision::Upload {
                mode: WriteMode::Overwrite,
            },
        ))
    }

    // ========================================================================
    // Remote -> Local
    // ========================================================================

    /// Decides what to do with a remote file whose local counterpart is `target`
    ///
    /// # Errors
    /// Returns [`SyncError::Transfer`] if the local state cannot be read
    pub async fn decide_download(
        &self,
        remote: &FileMetadata,
        source: &RemotePath,
        target: &Path,
    ) -> Result<Decision, SyncError> {
        let state = self
            .local_filesystem
            .get_state(target)
            .await
            .map_err(|e| SyncError::transfer(target.display(), &e))?;

        if !state.exists {
            return Ok(self.confirm(
                &format!("Download and save {}", source),
                true,
                Decision::Download { overwrite: false },
            ));
        }
        if state.is_directory() {
            return Ok(Decision::conflict(ConflictKind::LocalDirectory));
        }

        let newer = state
            .modified
            .map_or(true, |local| remote.client_modified > local);
        if newer {
            Ok(self.confirm(
                &format!("Download and overwrite {}", source),
                true,
                Decision::Download { overwrite: true },
            ))
        } else {
            Ok(Decision::skip(SkipReason::NotNewer))
        }
    }
}

/// Size equal and client-modified equal to the local mtime, to the second
fn stats_match(local: &LocalFileEntry, remote: &FileMetadata) -> bool {
    local.size == remote.size && local.modified == remote.client_modified
}
