//! Per-root process lock
//!
//! Two runs against the same local root must not overlap. Each root maps to
//! one lock file in the lock directory; the lock is an exclusive,
//! non-blocking `flock(2)` held for the life of the [`ProcessLock`] value.
//! A second acquisition fails immediately with [`LockError::AlreadyHeld`]
//! instead of waiting. Runs against different roots never contend.

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LockError {
    /// Another process (or handle) holds the lock for this root
    #[error("Lock already held: {0}")]
    AlreadyHeld(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Deterministic lock file name for a local root
///
/// `/` becomes `.`, `~` is dropped and `.lock` is appended, so
/// `/home/ana/Downloads` maps to `.home.ana.Downloads.lock`. Trailing
/// separators and `.` components do not change the name.
pub fn lock_file_name(root: &Path) -> String {
    let root: PathBuf = root.components().collect();
    let mut name = root.to_string_lossy().replace('/', ".").replace('~', "");
    name.push_str(".lock");
    name
}

/// An acquired lock; released when dropped
#[derive(Debug)]
pub struct ProcessLock {
    file: File,
    path: PathBuf,
}

impl ProcessLock {
    /// Acquires the lock for `root`, creating `lock_dir` if needed
    ///
    /// # Errors
    /// Returns [`LockError::AlreadyHeld`] if the lock is taken, or
    /// [`LockError::IoError`] if the lock file cannot be created
    pub fn acquire(lock_dir: &Path, root: &Path) -> Result<Self, LockError> {
        std::fs::create_dir_all(lock_dir)?;
        let path = lock_dir.join(lock_file_name(root));

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        // SAFETY: the descriptor belongs to `file`, which outlives the call.
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EWOULDBLOCK) {
                return Err(LockError::AlreadyHeld(path));
            }
            return Err(err.into());
        }

        debug!(path = %path.display(), "Process lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        // SAFETY: the descriptor is still owned by `self.file`.
        let rc = unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
        if rc != 0 {
            warn!(path = %self.path.display(), "Lock release failure");
        } else {
            debug!(path = %self.path.display(), "Process lock released");
        }
    }
}
