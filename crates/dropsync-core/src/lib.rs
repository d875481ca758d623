//! dropsync Core - Domain logic and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `RemotePath`, `LocalFileEntry`, `RemoteEntry`, `ListingPage`,
//!   `TransferSession`, `Decision`, `SyncCounters`
//! - **Path normalization** - canonical remote paths and NFC filename comparison
//! - **Port definitions** - Traits for adapters: `IRemoteStore`, `ILocalFileSystem`,
//!   `IConfirmationPolicy`, `IProgressReporter`
//! - **Configuration** - YAML configuration with defaults and validation
//!
//! # Architecture
//!
//! The domain module contains pure data and rules with no I/O.
//! Ports define trait interfaces that adapter crates implement; the sync
//! engine only ever talks to the outside world through them.

pub mod config;
pub mod domain;
pub mod ports;
