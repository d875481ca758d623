//! Folder listing for the Dropbox API
//!
//! Provides the two paginated listing calls:
//! - [`list_folder`] - First page of a directory
//! - [`list_folder_continue`] - Next page for a cursor
//!
//! Following the cursor until `has_more` is false is left to the caller so
//! that listing failures can be handled per directory.
//!
//! ## Dropbox API References
//!
//! - [list_folder](https://www.dropbox.com/developers/documentation/http/documentation#files-list_folder)
//! - [list_folder/continue](https://www.dropbox.com/developers/documentation/http/documentation#files-list_folder-continue)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dropsync_core::domain::entry::whole_seconds;
use dropsync_core::domain::{FileMetadata, ListingPage, RemoteEntry, RemotePath};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{check_status, DropboxClient};

// ============================================================================
// Dropbox API request/response types
// ============================================================================

#[derive(Debug, Serialize)]
struct ListFolderArg<'a> {
    path: &'a str,
    recursive: bool,
    include_deleted: bool,
}

#[derive(Debug, Serialize)]
struct ListFolderContinueArg<'a> {
    cursor: &'a str,
}

/// Response body of both listing endpoints
#[derive(Debug, Deserialize)]
struct ListFolderResult {
    entries: Vec<DbxEntry>,
    cursor: String,
    has_more: bool,
}

/// File metadata as returned by the API
#[derive(Debug, Deserialize)]
pub(crate) struct DbxFileMetadata {
    pub(crate) name: String,
    pub(crate) size: u64,
    pub(crate) client_modified: DateTime<Utc>,
}

/// A listing entry, tagged by `.tag`
#[derive(Debug, Deserialize)]
#[serde(tag = ".tag", rename_all = "lowercase")]
enum DbxEntry {
    File(DbxFileMetadata),
    Folder { name: String },
    Deleted,
}

// ============================================================================
// Conversion to port types
// ============================================================================

impl From<DbxFileMetadata> for FileMetadata {
    fn from(meta: DbxFileMetadata) -> Self {
        FileMetadata {
            name: meta.name,
            size: meta.size,
            client_modified: whole_seconds(meta.client_modified),
        }
    }
}

/// Converts one raw listing result into a [`ListingPage`]
///
/// Deleted entries are dropped; order is preserved otherwise.
fn into_page(result: ListFolderResult) -> ListingPage {
    let entries = result
        .entries
        .into_iter()
        .filter_map(|entry| match entry {
            DbxEntry::File(meta) => Some(RemoteEntry::File(meta.into())),
            DbxEntry::Folder { name } => Some(RemoteEntry::Folder { name }),
            DbxEntry::Deleted => None,
        })
        .collect();

    ListingPage {
        entries,
        cursor: result.cursor,
        has_more: result.has_more,
    }
}

// ============================================================================
// list_folder
// ============================================================================

/// Lists the first page of a folder
///
/// Uses `POST /files/list_folder` with a non-recursive listing.
///
/// # Arguments
/// * `client` - The authenticated DropboxClient
/// * `path` - Folder to list (`""` for the root)
///
/// # Errors
/// Returns an error if the request fails or the response cannot be parsed
pub async fn list_folder(client: &DropboxClient, path: &RemotePath) -> Result<ListingPage> {
    debug!(path = %path, "Listing folder");

    let arg = ListFolderArg {
        path: path.as_str(),
        recursive: false,
        include_deleted: false,
    };

    let response = client
        .rpc("/files/list_folder")
        .json(&arg)
        .send()
        .await
        .context("Failed to send list_folder request")?;

    let result: ListFolderResult = check_status(response)
        .await
        .with_context(|| format!("list_folder failed for {}", path))?
        .json()
        .await
        .context("Failed to parse list_folder response")?;

    let page = into_page(result);
    debug!(
        path = %path,
        entries = page.entries.len(),
        has_more = page.has_more,
        "Received first listing page"
    );
    Ok(page)
}

// ============================================================================
// list_folder_continue
// ============================================================================

/// Fetches the next page of a listing
///
/// Uses `POST /files/list_folder/continue`.
///
/// # Arguments
/// * `client` - The authenticated DropboxClient
/// * `cursor` - Cursor returned by the previous page
///
/// # Errors
/// Returns an error if the request fails or the response cannot be parsed
pub async fn list_folder_continue(client: &DropboxClient, cursor: &str) -> Result<ListingPage> {
    let response = client
        .rpc("/files/list_folder/continue")
        .json(&ListFolderContinueArg { cursor })
        .send()
        .await
        .context("Failed to send list_folder/continue request")?;

    let result: ListFolderResult = check_status(response)
        .await
        .context("list_folder/continue failed")?
        .json()
        .await
        .context("Failed to parse list_folder/continue response")?;

    let page = into_page(result);
    debug!(
        entries = page.entries.len(),
        has_more = page.has_more,
        "Received listing page"
    );
    Ok(page)
}
