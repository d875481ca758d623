//! Sync orchestrator
//!
//! The [`SyncEngine`] drives up to two independent passes over a local root
//! and a remote root.
//!
//! ## Sync Flow
//!
//! 1. **Upload pass** (local → remote): walk the local tree depth-first,
//!    list each visited remote directory once, reconcile every admitted
//!    file and execute upload decisions.
//! 2. **Download pass** (remote → local): probe the remote root, then drain
//!    a worklist of remote directories, creating local directories and
//!    executing download decisions.
//! 3. **Bookkeeping**: each pass builds its own [`SyncCounters`] and adds them
//!    to the [`RunContext`] when it ends, however it ends.
//!
//! The upload pass always completes before the download pass begins. Remote
//! calls are awaited one at a time.
//!
//! ## Failure handling
//!
//! Listing, transfer and encoding failures are reported for the affected
//! entry and the run continues. An `Abort` answer from the confirmation
//! policy stops the run in order and returns [`RunStatus::Aborted`]. Any
//! other error is returned to the caller.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dropsync_core::config::{Config, LivenessConfig};
use dropsync_core::domain::{
    validate_entry_name, AccountInfo, Decision, FileMetadata, LocalFileEntry, RemoteEntry,
    RemotePath, SyncCounters,
};
use dropsync_core::ports::confirmation::{Answer, IConfirmationPolicy};
use dropsync_core::ports::local_filesystem::ILocalFileSystem;
use dropsync_core::ports::remote_store::IRemoteStore;
use dropsync_core::ports::reporter::{Direction, IProgressReporter, Outcome, SyncEvent};
use tracing::{debug, info, warn};

use crate::context::RunContext;
use crate::liveness::LivenessMonitor;
use crate::lister::{RemoteLister, RemoteListing};
use crate::reconciler::Reconciler;
use crate::transfer::TransferEngine;
use crate::walker::LocalTreeWalker;
use crate::SyncError;

// ============================================================================
// SyncMode / RunStatus
// ============================================================================

/// Which passes a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Local → remote only
    Upload,
    /// Remote → local only
    Download,
    /// Upload pass, then download pass
    Full,
}

impl SyncMode {
    pub fn uploads(self) -> bool {
        matches!(self, SyncMode::Upload | SyncMode::Full)
    }

    pub fn downloads(self) -> bool {
        matches!(self, SyncMode::Download | SyncMode::Full)
    }

    /// Default answer for overwriting a changed remote file
    ///
    /// In upload-only mode the local tree is authoritative; in a full sync
    /// the newer remote copy may be about to come down, so the default is no.
    pub fn overwrite_default(self) -> bool {
        self == SyncMode::Upload
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// The confirmation policy answered `Abort`
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Abort,
}

// ============================================================================
// SyncEngine
// ============================================================================

/// Reconciliation and transfer orchestrator
///
/// ## Dependencies
///
/// - `remote_store`: Listing and transfer calls against the store
/// - `local_filesystem`: Local reads, writes and metadata
/// - `confirmation`: Yes/no/abort answers for every transfer and descent
/// - `reporter`: Receives one [`SyncEvent`] per file outcome
pub struct SyncEngine {
    remote_store: Arc<dyn IRemoteStore + Send + Sync>,
    local_filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
    reporter: Arc<dyn IProgressReporter + Send + Sync>,
    walker: LocalTreeWalker,
    lister: RemoteLister,
    reconciler: Reconciler,
    transfer: Arc<TransferEngine>,
    liveness: LivenessConfig,
    mode: SyncMode,
}

impl SyncEngine {
    /// Creates a new `SyncEngine`
    ///
    /// # Arguments
    /// * `remote_store` - Remote store operations (IRemoteStore)
    /// * `local_filesystem` - Local file operations (ILocalFileSystem)
    /// * `confirmation` - Answers confirmation questions (IConfirmationPolicy)
    /// * `reporter` - Receives per-file outcomes (IProgressReporter)
    /// * `config` - Hidden-file, transfer and liveness settings
    /// * `mode` - Which passes to run
    pub fn new(
        remote_store: Arc<dyn IRemoteStore + Send + Sync>,
        local_filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
        confirmation: Arc<dyn IConfirmationPolicy + Send + Sync>,
        reporter: Arc<dyn IProgressReporter + Send + Sync>,
        config: &Config,
        mode: SyncMode,
    ) -> Self {
        let transfer = Arc::new(
            TransferEngine::new(Arc::clone(&remote_store), Arc::clone(&local_filesystem))
                .with_config(&config.transfer),
        );
        let reconciler = Reconciler::new(
            confirmation,
            Arc::clone(&local_filesystem),
            Arc::clone(&transfer),
            mode.overwrite_default(),
        );

        Self {
            walker: LocalTreeWalker::new(
                Arc::clone(&local_filesystem),
                config.sync.include_hidden,
            ),
            lister: RemoteLister::new(Arc::clone(&remote_store)),
            remote_store,
            local_filesystem,
            reporter,
            reconciler,
            transfer,
            liveness: config.liveness.clone(),
            mode,
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// Probes the token by fetching the current account
    ///
    /// # Errors
    /// Returns [`SyncError::Auth`] if the store rejects the call
    pub async fn authenticate(&self) -> Result<AccountInfo, SyncError> {
        let account = self
            .remote_store
            .get_current_account()
            .await
            .map_err(|e| SyncError::Auth(format!("{e:#}")))?;
        info!(account = %account.display_name, "Access token accepted");
        Ok(account)
    }

    /// Runs the passes selected by the sync mode
    ///
    /// Counters accumulate in `ctx` even when this returns early or fails.
    ///
    /// # Errors
    /// Returns an error for failures that cannot be confined to one entry
    #[tracing::instrument(skip(self, ctx), fields(mode = ?self.mode))]
    pub async fn run(&self, ctx: &mut RunContext) -> anyhow::Result<RunStatus> {
        if self.mode.uploads() && self.upload_pass(ctx).await? == Flow::Abort {
            info!("Run aborted during upload pass");
            return Ok(RunStatus::Aborted);
        }

        if self.mode.downloads() {
            match self.lister.probe(ctx.remote_root()).await {
                Ok(()) => {
                    if self.download_pass(ctx).await? == Flow::Abort {
                        info!("Run aborted during download pass");
                        return Ok(RunStatus::Aborted);
                    }
                }
                Err(e) => {
                    warn!(path = %ctx.remote_root(), error = %e, "Unable to start download pass");
                }
            }
        }

        Ok(RunStatus::Completed)
    }

    // ========================================================================
    // Upload pass
    // ========================================================================

    async fn upload_pass(&self, ctx: &mut RunContext) -> anyhow::Result<Flow> {
        info!(
            local = %ctx.local_root().display(),
            remote = %ctx.remote_root(),
            "Starting upload pass"
        );
        let mut tally = SyncCounters::default();
        let result = self.walk_local_tree(ctx, &mut tally).await;
        ctx.counters += tally;
        result
    }

    /// Depth-first, top-down walk using an explicit stack
    async fn walk_local_tree(
        &self,
        ctx: &RunContext,
        tally: &mut SyncCounters,
    ) -> anyhow::Result<Flow> {
        let mut liveness = LivenessMonitor::for_upload(&self.liveness);
        let mut stack: Vec<(PathBuf, RemotePath)> =
            vec![(ctx.local_root().to_path_buf(), ctx.remote_root().clone())];

        while let Some((local_dir, remote_dir)) = stack.pop() {
            let batch = match self.walker.scan(&local_dir).await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(path = %local_dir.display(), error = %format!("{e:#}"), "Cannot read local directory, skipping");
                    continue;
                }
            };

            for path in &batch.unsupported {
                let err = SyncError::encoding(path.display(), "name is not valid UTF-8");
                self.recover(Direction::Upload, path.display().to_string(), err)?;
            }

            if !batch.files.is_empty() {
                // One listing per visited directory, shared by all its files.
                let listing = self.lister.listing(&remote_dir).await;
                info!(path = %remote_dir, files = batch.files.len(), "Descending into");

                for file in &batch.files {
                    liveness.tick(tally.transfers(), ctx.elapsed());
                    if self.upload_file(file, &listing, &remote_dir, tally).await? == Flow::Abort {
                        return Ok(Flow::Abort);
                    }
                }
            }

            let mut keep = Vec::with_capacity(batch.subdirs.len());
            for sub in batch.subdirs {
                match self.reconciler.confirm_descend(&sub.name) {
                    Answer::Yes => {
                        debug!(name = %sub.name, "Keeping directory");
                        let remote_sub = remote_dir.join(&sub.name);
                        keep.push((sub.path, remote_sub));
                    }
                    Answer::No => info!(name = %sub.name, "Skipping directory"),
                    Answer::Abort => return Ok(Flow::Abort),
                }
            }
            // Reversed so the first kept directory is visited next.
            stack.extend(keep.into_iter().rev());
        }

        Ok(Flow::Continue)
    }

    async fn upload_file(
        &self,
        file: &LocalFileEntry,
        listing: &RemoteListing,
        remote_dir: &RemotePath,
        tally: &mut SyncCounters,
    ) -> anyhow::Result<Flow> {
        let path = file.path.display().to_string();

        let decision = match self.reconciler.decide_upload(file, listing, remote_dir).await {
            Ok(decision) => decision,
            Err(e) => return self.recover(Direction::Upload, path, e),
        };
        debug!(path = %path, decision = ?decision, "Reconciled");

        match decision {
            Decision::Upload { mode } => {
                let target = remote_dir.join(&file.name);
                match self.transfer.upload(file, &target, mode).await {
                    Ok(meta) => {
                        info!(path = %target, name = %meta.name, mode = %mode, "Uploaded");
                        tally.record_upload(mode, file.size);
                        self.report(
                            Direction::Upload,
                            path,
                            Outcome::Uploaded {
                                mode,
                                bytes: file.size,
                            },
                        );
                    }
                    Err(e) => return self.recover(Direction::Upload, path, e),
                }
            }
            Decision::Abort => return Ok(Flow::Abort),
            other => self.report_passive(Direction::Upload, path, other),
        }

        Ok(Flow::Continue)
    }

    // ========================================================================
    // Download pass
    // ========================================================================

    async fn download_pass(&self, ctx: &mut RunContext) -> anyhow::Result<Flow> {
        info!(
            remote = %ctx.remote_root(),
            local = %ctx.local_root().display(),
            "Starting download pass"
        );
        let mut tally = SyncCounters::default();
        let result = self.drain_remote_worklist(ctx, &mut tally).await;
        ctx.counters += tally;
        result
    }

    /// Processes remote directories from a FIFO worklist
    async fn drain_remote_worklist(
        &self,
        ctx: &RunContext,
        tally: &mut SyncCounters,
    ) -> anyhow::Result<Flow> {
        let mut liveness = LivenessMonitor::for_download(&self.liveness);
        let mut worklist: VecDeque<(RemotePath, PathBuf)> =
            VecDeque::from([(ctx.remote_root().clone(), ctx.local_root().to_path_buf())]);

        while let Some((remote_dir, local_dir)) = worklist.pop_front() {
            liveness.tick(tally.transfers(), ctx.elapsed());

            for entry in self.lister.list_or_empty(&remote_dir).await {
                if let Err(e) = validate_entry_name(entry.name()) {
                    let shown = format!("{}/{}", remote_dir.as_str(), entry.name());
                    let err = SyncError::encoding(&shown, e);
                    self.recover(Direction::Download, shown, err)?;
                    continue;
                }

                match entry {
                    RemoteEntry::Folder { name } => {
                        let remote_sub = remote_dir.join(&name);
                        let local_sub = local_dir.join(&name);
                        debug!(path = %remote_sub, "Remote folder");
                        if self.ensure_local_directory(&local_sub, &remote_sub).await? {
                            worklist.push_back((remote_sub, local_sub));
                        }
                    }
                    RemoteEntry::File(meta) => {
                        let source = remote_dir.join(&meta.name);
                        let target = local_dir.join(&meta.name);
                        if self.download_file(&meta, &source, &target, tally).await? == Flow::Abort
                        {
                            return Ok(Flow::Abort);
                        }
                    }
                }
            }
        }

        Ok(Flow::Continue)
    }

    /// Creates `local` if it is missing; `false` means skip the subtree
    async fn ensure_local_directory(
        &self,
        local: &Path,
        remote: &RemotePath,
    ) -> anyhow::Result<bool> {
        let exists = self
            .local_filesystem
            .get_state(local)
            .await
            .map(|state| state.is_directory())
            .unwrap_or(false);
        if exists {
            return Ok(true);
        }

        match self.local_filesystem.create_directory(local).await {
            Ok(()) => {
                debug!(path = %local.display(), "Created local directory");
                Ok(true)
            }
            Err(e) => {
                let err = SyncError::transfer(local.display(), &e);
                self.recover(Direction::Download, remote.to_string(), err)?;
                Ok(false)
            }
        }
    }

    async fn download_file(
        &self,
        meta: &FileMetadata,
        source: &RemotePath,
        target: &Path,
        tally: &mut SyncCounters,
    ) -> anyhow::Result<Flow> {
        let path = source.to_string();

        let decision = match self.reconciler.decide_download(meta, source, target).await {
            Ok(decision) => decision,
            Err(e) => return self.recover(Direction::Download, path, e),
        };
        debug!(path = %path, decision = ?decision, "Reconciled");

        match decision {
            Decision::Download { overwrite } => {
                match self.transfer.download_to(source, target).await {
                    Ok((_, bytes)) => {
                        info!(path = %path, bytes, overwrite, "Downloaded");
                        tally.record_download(overwrite, bytes);
                        self.report(
                            Direction::Download,
                            path,
                            Outcome::Downloaded { overwrite, bytes },
                        );
                    }
                    Err(e) => return self.recover(Direction::Download, path, e),
                }
            }
            Decision::Abort => return Ok(Flow::Abort),
            other => self.report_passive(Direction::Download, path, other),
        }

        Ok(Flow::Continue)
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    fn report(&self, direction: Direction, path: String, outcome: Outcome) {
        self.reporter.report(&SyncEvent {
            direction,
            path,
            outcome,
        });
    }

    /// Reports a decision that moved no bytes
    fn report_passive(&self, direction: Direction, path: String, decision: Decision) {
        match decision {
            Decision::Skip { reason } => {
                debug!(path = %path, reason = %reason, "Skipped");
                self.report(direction, path, Outcome::Skipped { reason });
            }
            Decision::Conflict { conflict } => {
                warn!(path = %path, conflict = %conflict, "Conflict, leaving both sides unchanged");
                self.report(direction, path, Outcome::Conflict { conflict });
            }
            other => debug!(path = %path, decision = ?other, "Nothing to report"),
        }
    }

    /// Reports a recoverable error and continues, or propagates the rest
    fn recover(&self, direction: Direction, path: String, err: SyncError) -> anyhow::Result<Flow> {
        if !err.is_recoverable() {
            return Err(err.into());
        }
        warn!(path = %path, error = %err, "Entry failed, continuing");
        self.report(
            direction,
            path,
            Outcome::Failed {
                error: err.to_string(),
            },
        );
        Ok(Flow::Continue)
    }
}
