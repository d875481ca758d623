//! Dropbox API client
//!
//! Provides a typed HTTP client for the Dropbox v2 API.
//! Handles authentication headers, the two endpoint families, argument
//! header encoding and status-code mapping.
//!
//! ## Endpoint families
//!
//! - **RPC** (`api.dropboxapi.com`): JSON request body, JSON response.
//! - **Content** (`content.dropboxapi.com`): JSON argument in the
//!   `Dropbox-API-Arg` header, raw bytes in the body (upload) or in the
//!   response (download).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dropsync_dropbox::client::DropboxClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = DropboxClient::new("access-token-here");
//! let account = client.get_current_account().await?;
//! println!("Hello, {}", account.display_name);
//! # Ok(())
//! # }
//! ```

use std::fmt::Write as _;
use std::time::Duration;

use anyhow::{Context, Result};
use dropsync_core::domain::AccountInfo;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::DropboxError;

/// Base URL for RPC endpoints
const API_BASE_URL: &str = "https://api.dropboxapi.com/2";

/// Base URL for content endpoints
const CONTENT_BASE_URL: &str = "https://content.dropboxapi.com/2";

/// Header carrying the JSON argument of content endpoints
pub const API_ARG_HEADER: &str = "Dropbox-API-Arg";

/// Header carrying the JSON result of the download endpoint
pub const API_RESULT_HEADER: &str = "Dropbox-API-Result";

/// Default retry-after duration when the header is missing
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

// ============================================================================
// Dropbox API response types
// ============================================================================

/// Response from /users/get_current_account
#[derive(Debug, Deserialize)]
struct AccountResponse {
    account_id: String,
    name: AccountName,
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
struct AccountName {
    display_name: String,
}

/// Error body returned with HTTP 409
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error_summary: String,
}

// ============================================================================
// DropboxClient
// ============================================================================

/// HTTP client for Dropbox API calls
///
/// Wraps `reqwest::Client` with the bearer token and base URLs for both
/// endpoint families.
pub struct DropboxClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for RPC requests
    api_url: String,
    /// Base URL for content requests
    content_url: String,
    /// OAuth2 access token
    access_token: String,
}

impl DropboxClient {
    /// Creates a new DropboxClient with the given access token
    ///
    /// # Arguments
    /// * `access_token` - A Dropbox OAuth2 access token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: API_BASE_URL.to_string(),
            content_url: CONTENT_BASE_URL.to_string(),
            access_token: access_token.into(),
        }
    }

    /// Creates a new DropboxClient whose requests time out after `timeout`
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed
    pub fn with_timeout(access_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            ..Self::new(access_token)
        })
    }

    /// Creates a new DropboxClient with a single base URL for both endpoint
    /// families (useful for testing)
    ///
    /// # Arguments
    /// * `access_token` - A Dropbox OAuth2 access token
    /// * `base_url` - Custom base URL for API requests
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            api_url: base_url.clone(),
            content_url: base_url,
            access_token: access_token.into(),
        }
    }

    /// Returns a reference to the access token
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Creates an authenticated RPC request builder
    ///
    /// # Arguments
    /// * `endpoint` - API path relative to the base URL (e.g., "/files/list_folder")
    pub fn rpc(&self, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}", self.api_url, endpoint);
        self.client.post(&url).bearer_auth(&self.access_token)
    }

    /// Creates an authenticated content request builder with its argument header
    ///
    /// # Arguments
    /// * `endpoint` - API path relative to the base URL (e.g., "/files/upload")
    /// * `arg` - Value serialized into the `Dropbox-API-Arg` header
    ///
    /// # Errors
    /// Returns an error if `arg` cannot be serialized
    pub fn content<T: Serialize>(&self, endpoint: &str, arg: &T) -> Result<RequestBuilder> {
        let url = format!("{}{}", self.content_url, endpoint);
        let header = header_safe_json(arg)?;
        Ok(self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .header(API_ARG_HEADER, header))
    }

    /// Probes the token by fetching the current account
    ///
    /// # Returns
    /// The account id, display name and email
    ///
    /// # Errors
    /// Returns [`DropboxError::Unauthorized`] (wrapped) if the token is rejected
    pub async fn get_current_account(&self) -> Result<AccountInfo> {
        debug!("Fetching current account");

        let response = self
            .rpc("/users/get_current_account")
            .send()
            .await
            .context("Failed to send get_current_account request")?;

        let account: AccountResponse = check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse get_current_account response")?;

        Ok(AccountInfo {
            account_id: account.account_id,
            display_name: account.name.display_name,
            email: account.email,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Maps a non-success HTTP status to a [`DropboxError`]
///
/// Successful responses are passed through untouched.
pub async fn check_status(response: Response) -> std::result::Result<Response, DropboxError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER);

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read error body".to_string());

    debug!(status = %status, body = %body, "Dropbox request failed");

    let err = match status {
        StatusCode::BAD_REQUEST => DropboxError::BadRequest(body),
        StatusCode::UNAUTHORIZED => DropboxError::Unauthorized(body),
        StatusCode::FORBIDDEN => DropboxError::Forbidden(body),
        StatusCode::CONFLICT => {
            let summary = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error_summary)
                .unwrap_or(body);
            DropboxError::ApiError(summary)
        }
        StatusCode::TOO_MANY_REQUESTS => DropboxError::TooManyRequests { retry_after },
        s if s.is_server_error() => DropboxError::ServerError(format!("{}: {}", s, body)),
        s => DropboxError::InvalidResponse(format!("unexpected status {}: {}", s, body)),
    };
    Err(err)
}

/// Serializes `value` as JSON that is safe to place in an HTTP header
///
/// Every non-ASCII character (and DEL) is written as a `\uXXXX` escape,
/// using surrogate pairs outside the basic multilingual plane.
///
/// # Errors
/// Returns an error if `value` cannot be serialized
pub fn header_safe_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).context("Failed to serialize API argument")?;
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        if ch.is_ascii() && ch != '\u{7f}' {
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{:04x}", unit);
            }
        }
    }
    Ok(out)
}
