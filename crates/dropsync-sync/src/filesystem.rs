//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`ILocalFileSystem`] using `tokio::fs` for async file operations.
//!
//! ## Design Decisions
//!
//! - **Atomic writes**: Uses write-to-temp + rename so an interrupted download
//!   never leaves a truncated file behind under the real name.
//! - **Chunked reads**: Large uploads read one chunk at a time instead of
//!   loading the whole file.
//! - **Timestamps**: Modification times are reported as whole-second UTC and
//!   set through `File::set_modified` on a blocking thread.

use std::io::{ErrorKind, SeekFrom};
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use dropsync_core::{
    domain::entry::from_system_time,
    ports::local_filesystem::{DirectoryEntry, EntryKind, FileSystemState, ILocalFileSystem},
};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, instrument};

// ============================================================================
// LocalFileSystemAdapter struct
// ============================================================================

/// Adapter that bridges the [`ILocalFileSystem`] port to the real filesystem.
///
/// This is a zero-sized struct because all operations derive their context
/// from the path arguments. Configuration (e.g. the local root) lives
/// at a higher layer.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystemAdapter;

impl LocalFileSystemAdapter {
    /// Create a new `LocalFileSystemAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn modified_of(metadata: &std::fs::Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(from_system_time)
        .unwrap_or_else(|_| from_system_time(SystemTime::UNIX_EPOCH))
}

// ============================================================================
// ILocalFileSystem implementation
// ============================================================================

#[async_trait::async_trait]
impl ILocalFileSystem for LocalFileSystemAdapter {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn read_directory(&self, path: &Path) -> anyhow::Result<Vec<DirectoryEntry>> {
        let mut reader = tokio::fs::read_dir(path).await?;
        let mut entries = Vec::new();

        while let Some(entry) = reader.next_entry().await? {
            let entry_path = entry.path();
            // metadata() follows symlinks; a dangling link becomes `Other`.
            let (kind, size, modified) = match tokio::fs::metadata(&entry_path).await {
                Ok(m) if m.is_file() => (EntryKind::File, m.len(), modified_of(&m)),
                Ok(m) if m.is_dir() => (EntryKind::Directory, 0, modified_of(&m)),
                Ok(m) => (EntryKind::Other, 0, modified_of(&m)),
                Err(_) => (EntryKind::Other, 0, from_system_time(SystemTime::UNIX_EPOCH)),
            };

            entries.push(DirectoryEntry {
                path: entry_path,
                file_name: entry.file_name(),
                kind,
                size,
                modified,
            });
        }

        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        debug!(entries = entries.len(), "directory read complete");
        Ok(entries)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn read_file(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
        let data = tokio::fs::read(path).await?;
        debug!(bytes = data.len(), "file read complete");
        Ok(data)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn read_chunk(&self, path: &Path, offset: u64, len: usize) -> anyhow::Result<Vec<u8>> {
        let mut file = tokio::fs::File::open(path).await?;
        file.seek(SeekFrom::Start(offset)).await?;

        let mut buf = Vec::with_capacity(len);
        file.take(len as u64).read_to_end(&mut buf).await?;
        Ok(buf)
    }

    #[instrument(skip(self, data), fields(path = %path.display(), bytes = data.len()))]
    async fn write_file(&self, path: &Path, data: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Same directory as the target so the rename stays on one filesystem.
        let tmp_path = {
            let mut p = path.as_os_str().to_owned();
            p.push(".dropsync-tmp");
            std::path::PathBuf::from(p)
        };

        tokio::fs::write(&tmp_path, data).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!("write complete");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn set_modified(&self, path: &Path, modified: DateTime<Utc>) -> anyhow::Result<()> {
        let owned = path.to_path_buf();
        let when = SystemTime::from(modified);
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let file = std::fs::OpenOptions::new().write(true).open(&owned)?;
            file.set_modified(when)
        })
        .await??;
        debug!(modified = %modified, "modification time set");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn get_state(&self, path: &Path) -> anyhow::Result<FileSystemState> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("path not found");
                return Ok(FileSystemState::not_found());
            }
            Err(e) => return Err(e.into()),
        };

        let is_file = metadata.is_file();
        Ok(FileSystemState {
            exists: true,
            is_file,
            size: if is_file { metadata.len() } else { 0 },
            modified: Some(modified_of(&metadata)),
        })
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn create_directory(&self, path: &Path) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(path).await?;
        debug!("directory created");
        Ok(())
    }
}

// ============================================================================
// Unit tests
// ============================================================================
