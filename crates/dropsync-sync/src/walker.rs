//! Local Tree Walker
//!
//! Reads one local directory at a time and splits it into the files worth
//! reconciling and the subdirectories worth descending into. Recursion is
//! left to the caller, which may prune the returned subdirectories further.
//!
//! ## Admission rules
//!
//! Files are rejected when they are hidden (unless allowed), on the store's
//! denylist, editor/office temporaries, or compiled artifacts. Directories
//! are rejected when hidden, temporary, or a bytecode cache; a rejected
//! directory's subtree is never visited.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dropsync_core::domain::LocalFileEntry;
use dropsync_core::ports::local_filesystem::{EntryKind, ILocalFileSystem};
use tracing::{debug, warn};

/// Names the store refuses, compared case-insensitively
const BANNED_FILENAMES: &[&str] = &[
    "desktop.ini",
    "thumbs.db",
    ".ds_store",
    "icon\r",
    ".dropbox",
    ".dropbox.attr",
];

const GENERATED_SUFFIXES: &[&str] = &[".pyc", ".pyo"];

const CACHE_DIRECTORIES: &[&str] = &["__pycache__"];

// ============================================================================
// Admission predicates
// ============================================================================

/// Result of checking one name against the admission rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionVerdict {
    Admit,
    RejectHidden,
    RejectBanned,
    RejectTemp,
    RejectGenerated,
}

impl AdmissionVerdict {
    pub fn is_admitted(self) -> bool {
        self == AdmissionVerdict::Admit
    }
}

impl fmt::Display for AdmissionVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdmissionVerdict::Admit => "admitted",
            AdmissionVerdict::RejectHidden => "hidden",
            AdmissionVerdict::RejectBanned => "banned",
            AdmissionVerdict::RejectTemp => "temporary",
            AdmissionVerdict::RejectGenerated => "generated",
        };
        write!(f, "{}", s)
    }
}

fn is_hidden(name: &str, allow_hidden: bool) -> bool {
    !allow_hidden && name.starts_with('.')
}

fn is_temp_file(name: &str) -> bool {
    name.starts_with('@')
        || name.starts_with("~$")
        || name.starts_with(".~")
        || name.ends_with('~')
        || (name.starts_with('~') && name.ends_with(".tmp"))
}

/// Classifies a file name
///
/// Rules are checked in a fixed order (hidden, banned, temporary,
/// generated), so every name maps to exactly one verdict.
pub fn admit_file(name: &str, allow_hidden: bool) -> AdmissionVerdict {
    let lower = name.to_lowercase();
    if is_hidden(name, allow_hidden) {
        AdmissionVerdict::RejectHidden
    } else if BANNED_FILENAMES.contains(&lower.as_str()) {
        AdmissionVerdict::RejectBanned
    } else if is_temp_file(name) {
        AdmissionVerdict::RejectTemp
    } else if GENERATED_SUFFIXES.iter().any(|s| name.ends_with(s)) {
        AdmissionVerdict::RejectGenerated
    } else {
        AdmissionVerdict::Admit
    }
}

/// Classifies a directory name
pub fn admit_directory(name: &str, allow_hidden: bool) -> AdmissionVerdict {
    if is_hidden(name, allow_hidden) {
        AdmissionVerdict::RejectHidden
    } else if name.starts_with('@') || name.ends_with('~') {
        AdmissionVerdict::RejectTemp
    } else if CACHE_DIRECTORIES.contains(&name) {
        AdmissionVerdict::RejectGenerated
    } else {
        AdmissionVerdict::Admit
    }
}

// ============================================================================
// LocalTreeWalker
// ============================================================================

/// A subdirectory kept for descent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDirectory {
    pub name: String,
    pub path: PathBuf,
}

/// Filtered contents of one local directory
#[derive(Debug, Default)]
pub struct DirectoryBatch {
    /// Admitted files, sorted by name
    pub files: Vec<LocalFileEntry>,
    /// Admitted subdirectories, sorted by name
    pub subdirs: Vec<LocalDirectory>,
    /// Entries skipped because their names are not valid UTF-8
    pub unsupported: Vec<PathBuf>,
}

/// Walks the local tree one directory at a time
pub struct LocalTreeWalker {
    local_filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
    include_hidden: bool,
}

impl LocalTreeWalker {
    pub fn new(local_filesystem: Arc<dyn ILocalFileSystem + Send + Sync>, include_hidden: bool) -> Self {
        Self {
            local_filesystem,
            include_hidden,
        }
    }

    /// Reads `dir` and applies the admission rules to its entries
    ///
    /// # Errors
    /// Returns an error if the directory itself cannot be read
    pub async fn scan(&self, dir: &Path) -> anyhow::Result<DirectoryBatch> {
        let entries = self.local_filesystem.read_directory(dir).await?;
        let mut batch = DirectoryBatch::default();

        for entry in entries {
            let Some(name) = entry.file_name.to_str() else {
                warn!(path = %entry.path.display(), "Skipping entry with undecodable name");
                batch.unsupported.push(entry.path.clone());
                continue;
            };

            match entry.kind {
                EntryKind::File => {
                    let verdict = admit_file(name, self.include_hidden);
                    if !verdict.is_admitted() {
                        debug!(name, verdict = %verdict, "Skipping file");
                        continue;
                    }
                    batch.files.push(LocalFileEntry::new(
                        entry.path.clone(),
                        name,
                        entry.size,
                        entry.modified,
                    ));
                }
                EntryKind::Directory => {
                    let verdict = admit_directory(name, self.include_hidden);
                    if !verdict.is_admitted() {
                        debug!(name, verdict = %verdict, "Skipping directory");
                        continue;
                    }
                    batch.subdirs.push(LocalDirectory {
                        name: name.to_string(),
                        path: entry.path.clone(),
                    });
                }
                EntryKind::Other => {
                    debug!(name, "Skipping special file");
                }
            }
        }

        Ok(batch)
    }
}
