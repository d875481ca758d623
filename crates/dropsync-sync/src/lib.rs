//! dropsync Sync - Reconciliation and transfer engine
//!
//! Provides:
//! - Local tree walking with file/directory admission rules
//! - Paginated remote listing with per-directory failure isolation
//! - The upload and download decision tables
//! - Single-shot and chunked session transfers
//! - The run orchestrator, liveness logging and the per-root process lock
//!
//! ## Modules
//!
//! - [`engine`] - Sync orchestrator driving the upload and download passes
//! - [`filesystem`] - Local filesystem adapter (atomic writes, mtime preservation)
//! - [`walker`] - Local tree walker and admission predicates
//! - [`lister`] - Remote lister and name-keyed listing maps
//! - [`reconciler`] - Decision tables for both directions
//! - [`transfer`] - Transfer engine (single upload, session protocol, download-and-save)
//! - [`context`] - Per-run context: counters and runtime
//! - [`liveness`] - Periodic runtime log lines
//! - [`lock`] - Exclusive, non-blocking per-root lock file

pub mod context;
pub mod engine;
pub mod filesystem;
pub mod liveness;
pub mod lister;
pub mod lock;
pub mod reconciler;
pub mod transfer;
pub mod walker;

use std::fmt::Display;

use thiserror::Error;

/// Errors that can occur during a sync run
///
/// `Listing`, `Transfer` and `Encoding` are recovered by the orchestrator:
/// the affected directory or entry is skipped and the run continues.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The access token was rejected by the account probe
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A remote listing call failed
    #[error("Listing failed for {path}: {reason}")]
    Listing { path: String, reason: String },

    /// A single upload, download or session call failed
    #[error("Transfer failed for {path}: {reason}")]
    Transfer { path: String, reason: String },

    /// A path cannot be represented safely on one of the two sides
    #[error("Unsupported name {path:?}: {reason}")]
    Encoding { path: String, reason: String },

    /// An I/O error outside a single-file transfer
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A domain-level error propagated from dropsync-core
    #[error("Domain error: {0}")]
    DomainError(#[from] dropsync_core::domain::errors::DomainError),
}

impl SyncError {
    pub(crate) fn listing(path: impl Display, err: &anyhow::Error) -> Self {
        SyncError::Listing {
            path: path.to_string(),
            reason: format!("{err:#}"),
        }
    }

    pub(crate) fn transfer(path: impl Display, err: &anyhow::Error) -> Self {
        SyncError::Transfer {
            path: path.to_string(),
            reason: format!("{err:#}"),
        }
    }

    pub(crate) fn encoding(path: impl Display, reason: impl Display) -> Self {
        SyncError::Encoding {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the run may continue past this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SyncError::Listing { .. } | SyncError::Transfer { .. } | SyncError::Encoding { .. }
        )
    }
}
