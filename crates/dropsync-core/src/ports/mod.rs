//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the sync engine
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStore`] - Remote object store operations (listing, transfers, account probe)
//! - [`ILocalFileSystem`] - Local filesystem operations
//! - [`IConfirmationPolicy`] - Yes/no/abort answers for proposed actions
//! - [`IProgressReporter`] - Per-file outcome reporting

pub mod confirmation;
pub mod local_filesystem;
pub mod remote_store;
pub mod reporter;

pub use confirmation::{Answer, AnswerMode, FixedAnswerPolicy, IConfirmationPolicy};
pub use local_filesystem::{DirectoryEntry, EntryKind, FileSystemState, ILocalFileSystem};
pub use remote_store::IRemoteStore;
pub use reporter::{Direction, IProgressReporter, Outcome, SilentReporter, SyncEvent};
