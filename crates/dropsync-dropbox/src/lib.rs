//! dropsync Dropbox - Dropbox API v2 client
//!
//! Provides an async client for:
//! - Token liveness probing via the current-account endpoint
//! - Paginated folder listings
//! - Single-call downloads and uploads
//! - Upload sessions for large files (start / append / finish)
//!
//! ## Modules
//!
//! - [`client`] - HTTP client, endpoint construction and status mapping
//! - [`listing`] - `list_folder` and `list_folder/continue`
//! - [`transfer`] - Download, upload and upload-session calls
//! - [`provider`] - [`IRemoteStore`](dropsync_core::ports::IRemoteStore) implementation

pub mod client;
pub mod listing;
pub mod provider;
pub mod transfer;

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when communicating with the Dropbox API
#[derive(Debug, Error)]
pub enum DropboxError {
    /// The request was malformed (bad argument header, bad JSON)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The access token is invalid, expired or revoked
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The token lacks the scope for this call
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Endpoint-specific failure (path not found, conflict, malformed path...)
    #[error("API error: {0}")]
    ApiError(String),

    /// Rate limit exceeded; retry after the specified duration
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Duration to wait before retrying
        retry_after: Duration,
    },

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// A network-level error occurred, including timeouts
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl DropboxError {
    /// Whether the error was caused by the credentials rather than the request
    pub fn is_auth(&self) -> bool {
        matches!(self, DropboxError::Unauthorized(_))
    }
}
