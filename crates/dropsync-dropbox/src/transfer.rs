//! Transfer operations for the Dropbox API
//!
//! Provides functions for moving file content:
//! - [`download`] - Fetch a file and its metadata in one call
//! - [`upload`] - Single-request upload for files at or below the session threshold
//! - [`upload_session_start`] - Open an upload session with the first chunk
//! - [`upload_session_append`] - Append a chunk at a caller-tracked offset
//! - [`upload_session_finish`] - Send the last chunk and commit the file
//!
//! Chunking decisions live in the sync engine; these functions only speak
//! the wire protocol.
//!
//! ## Dropbox API References
//!
//! - [download](https://www.dropbox.com/developers/documentation/http/documentation#files-download)
//! - [upload](https://www.dropbox.com/developers/documentation/http/documentation#files-upload)
//! - [upload_session](https://www.dropbox.com/developers/documentation/http/documentation#files-upload_session-start)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dropsync_core::domain::{FileMetadata, RemotePath, TransferSession, WriteMode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{check_status, DropboxClient, API_RESULT_HEADER};
use crate::listing::DbxFileMetadata;
use crate::DropboxError;

// ============================================================================
// Dropbox API argument types
// ============================================================================

#[derive(Debug, Serialize)]
struct PathArg<'a> {
    path: &'a str,
}

/// Commit information shared by `upload` and `upload_session/finish`
#[derive(Debug, Serialize)]
struct CommitInfo<'a> {
    path: &'a str,
    mode: WriteMode,
    autorename: bool,
    client_modified: String,
    mute: bool,
}

impl<'a> CommitInfo<'a> {
    fn new(path: &'a RemotePath, mode: WriteMode, client_modified: DateTime<Utc>) -> Self {
        Self {
            path: path.as_str(),
            mode,
            autorename: false,
            client_modified: format_timestamp(client_modified),
            mute: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionStartArg {
    close: bool,
}

#[derive(Debug, Serialize)]
struct SessionCursor<'a> {
    session_id: &'a str,
    offset: u64,
}

#[derive(Debug, Serialize)]
struct SessionAppendArg<'a> {
    cursor: SessionCursor<'a>,
    close: bool,
}

#[derive(Debug, Serialize)]
struct SessionFinishArg<'a> {
    cursor: SessionCursor<'a>,
    commit: CommitInfo<'a>,
}

/// Response from upload_session/start
#[derive(Debug, Deserialize)]
struct SessionStartResult {
    session_id: String,
}

/// Formats a timestamp the way the API expects it (whole seconds, `Z` suffix)
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ============================================================================
// download
// ============================================================================

/// Downloads a file
///
/// Uses `POST /files/download`; the metadata comes back in the
/// `Dropbox-API-Result` response header.
///
/// # Arguments
/// * `client` - The authenticated DropboxClient
/// * `path` - File to download
///
/// # Returns
/// The file metadata and its full content
///
/// # Errors
/// Returns an error if the request fails or the result header is missing or malformed
pub async fn download(client: &DropboxClient, path: &RemotePath) -> Result<(FileMetadata, Vec<u8>)> {
    debug!(path = %path, "Downloading file");

    let response = client
        .content("/files/download", &PathArg {
            path: path.as_str(),
        })?
        .send()
        .await
        .context("Failed to send download request")?;

    let response = check_status(response)
        .await
        .with_context(|| format!("Download failed for {}", path))?;

    let header = response
        .headers()
        .get(API_RESULT_HEADER)
        .ok_or_else(|| DropboxError::InvalidResponse("missing Dropbox-API-Result header".into()))?
        .to_str()
        .map_err(|e| DropboxError::InvalidResponse(e.to_string()))?;
    let meta: DbxFileMetadata =
        serde_json::from_str(header).context("Failed to parse Dropbox-API-Result header")?;

    let data = response
        .bytes()
        .await
        .context("Failed to read download body")?
        .to_vec();

    debug!(path = %path, bytes = data.len(), "Download completed");
    Ok((meta.into(), data))
}

// ============================================================================
// upload
// ============================================================================

/// Uploads a file in a single request
///
/// Uses `POST /files/upload` with the file bytes as the request body.
///
/// # Arguments
/// * `client` - The authenticated DropboxClient
/// * `path` - Destination path
/// * `data` - File contents
/// * `mode` - `add` fails if the file exists, `overwrite` replaces it
/// * `client_modified` - Timestamp to record on the remote file
///
/// # Returns
/// The metadata of the stored file
///
/// # Errors
/// Returns an error if the upload request fails or the response cannot be parsed
pub async fn upload(
    client: &DropboxClient,
    path: &RemotePath,
    data: Vec<u8>,
    mode: WriteMode,
    client_modified: DateTime<Utc>,
) -> Result<FileMetadata> {
    debug!(path = %path, bytes = data.len(), mode = %mode, "Uploading file");

    let response = client
        .content("/files/upload", &CommitInfo::new(path, mode, client_modified))?
        .header("Content-Type", "application/octet-stream")
        .body(data)
        .send()
        .await
        .context("Failed to send upload request")?;

    let meta: DbxFileMetadata = check_status(response)
        .await
        .with_context(|| format!("Upload failed for {}", path))?
        .json()
        .await
        .context("Failed to parse upload response")?;

    debug!(name = %meta.name, "Upload completed");
    Ok(meta.into())
}

// ============================================================================
// upload sessions
// ============================================================================

/// Opens an upload session carrying the first chunk
///
/// Uses `POST /files/upload_session/start`.
///
/// # Returns
/// The session identifier
pub async fn upload_session_start(client: &DropboxClient, first_chunk: Vec<u8>) -> Result<String> {
    debug!(bytes = first_chunk.len(), "Starting upload session");

    let response = client
        .content("/files/upload_session/start", &SessionStartArg { close: false })?
        .header("Content-Type", "application/octet-stream")
        .body(first_chunk)
        .send()
        .await
        .context("Failed to send upload_session/start request")?;

    let result: SessionStartResult = check_status(response)
        .await
        .context("upload_session/start failed")?
        .json()
        .await
        .context("Failed to parse upload_session/start response")?;

    debug!(session_id = %result.session_id, "Upload session started");
    Ok(result.session_id)
}

/// Appends a chunk to an open session
///
/// Uses `POST /files/upload_session/append_v2`. `offset` must equal the
/// number of bytes the session has received so far.
pub async fn upload_session_append(
    client: &DropboxClient,
    chunk: Vec<u8>,
    session_id: &str,
    offset: u64,
) -> Result<()> {
    debug!(session_id, offset, bytes = chunk.len(), "Appending to upload session");

    let arg = SessionAppendArg {
        cursor: SessionCursor { session_id, offset },
        close: false,
    };

    let response = client
        .content("/files/upload_session/append_v2", &arg)?
        .header("Content-Type", "application/octet-stream")
        .body(chunk)
        .send()
        .await
        .context("Failed to send upload_session/append_v2 request")?;

    check_status(response)
        .await
        .with_context(|| format!("upload_session/append_v2 failed at offset {}", offset))?;
    Ok(())
}

/// Sends the last chunk and commits the session as a file
///
/// Uses `POST /files/upload_session/finish`.
///
/// # Arguments
/// * `client` - The authenticated DropboxClient
/// * `last_chunk` - Remaining bytes of the file (may be empty)
/// * `session` - Session id, bytes sent so far and commit parameters
pub async fn upload_session_finish(
    client: &DropboxClient,
    last_chunk: Vec<u8>,
    session: &TransferSession,
) -> Result<FileMetadata> {
    debug!(
        session_id = %session.session_id,
        offset = session.offset,
        bytes = last_chunk.len(),
        path = %session.target,
        "Finishing upload session"
    );

    let arg = SessionFinishArg {
        cursor: SessionCursor {
            session_id: &session.session_id,
            offset: session.offset,
        },
        commit: CommitInfo::new(&session.target, session.mode, session.client_modified),
    };

    let response = client
        .content("/files/upload_session/finish", &arg)?
        .header("Content-Type", "application/octet-stream")
        .body(last_chunk)
        .send()
        .await
        .context("Failed to send upload_session/finish request")?;

    let meta: DbxFileMetadata = check_status(response)
        .await
        .with_context(|| format!("upload_session/finish failed for {}", session.target))?
        .json()
        .await
        .context("Failed to parse upload_session/finish response")?;

    Ok(meta.into())
}
