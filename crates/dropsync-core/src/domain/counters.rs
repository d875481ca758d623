//! Run counters
//!
//! Four independent monotonic counts plus two byte totals. Each pass builds
//! its own [`SyncCounters`] and hands it back to the run, which adds it to
//! the run total with `+=`.

use std::ops::AddAssign;

use serde::Serialize;

use super::entry::WriteMode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncCounters {
    pub uploaded_new: u64,
    pub uploaded_updated: u64,
    pub downloaded_new: u64,
    pub downloaded_updated: u64,
    pub bytes_uploaded: u64,
    pub bytes_downloaded: u64,
}

impl SyncCounters {
    pub fn record_upload(&mut self, mode: WriteMode, bytes: u64) {
        match mode {
            WriteMode::Add => self.uploaded_new += 1,
            WriteMode::Overwrite => self.uploaded_updated += 1,
        }
        self.bytes_uploaded += bytes;
    }

    pub fn record_download(&mut self, overwrite: bool, bytes: u64) {
        if overwrite {
            self.downloaded_updated += 1;
        } else {
            self.downloaded_new += 1;
        }
        self.bytes_downloaded += bytes;
    }

    /// Number of successful transfers in either direction
    pub fn transfers(&self) -> u64 {
        self.uploaded_new + self.uploaded_updated + self.downloaded_new + self.downloaded_updated
    }
}

impl AddAssign for SyncCounters {
    fn add_assign(&mut self, other: Self) {
        self.uploaded_new += other.uploaded_new;
        self.uploaded_updated += other.uploaded_updated;
        self.downloaded_new += other.downloaded_new;
        self.downloaded_updated += other.downloaded_updated;
        self.bytes_uploaded += other.bytes_uploaded;
        self.bytes_downloaded += other.bytes_downloaded;
    }
}
