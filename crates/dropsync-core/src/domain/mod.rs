//! Domain entities and business rules
//!
//! This module contains the core domain types for dropsync:
//! - Canonical remote paths and filename normalization
//! - Local and remote entry snapshots
//! - Reconciliation decisions and their reasons
//! - Run counters
//! - Domain-specific error types

pub mod counters;
pub mod decision;
pub mod entry;
pub mod errors;
pub mod newtypes;

// Re-export commonly used types
pub use counters::SyncCounters;
pub use decision::{ConflictKind, Decision, SkipReason};
pub use entry::{
    AccountInfo, FileMetadata, ListingPage, LocalFileEntry, RemoteEntry, TransferSession,
    WriteMode,
};
pub use errors::DomainError;
pub use newtypes::*;
