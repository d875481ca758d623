//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! such as malformed remote paths and names that cannot be stored safely.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote path format
    #[error("Invalid remote path: {0}")]
    InvalidRemotePath(String),

    /// A single entry name that cannot be represented on one side
    #[error("Unsafe entry name: {0:?}")]
    UnsafeName(String),

    /// A timestamp that cannot be represented
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
