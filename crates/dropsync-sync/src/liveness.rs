//! Liveness logging
//!
//! Long runs print nothing for minutes at a time while they skip
//! already-synced files. A [`LivenessMonitor`] emits a `Runtime:` line every
//! `loop_interval` iterations, and again each time the pass's successful
//! transfer count reaches another multiple of `transfer_interval`. Hitting
//! the transfer mark restarts the iteration count.

use std::time::Duration;

use dropsync_core::config::LivenessConfig;
use tracing::info;

use crate::context::format_runtime;

#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    loop_interval: u64,
    transfer_interval: u64,
    loop_count: u64,
    last_transfer_mark: u64,
}

impl LivenessMonitor {
    pub fn new(loop_interval: u64, transfer_interval: u64) -> Self {
        Self {
            loop_interval: loop_interval.max(1),
            transfer_interval: transfer_interval.max(1),
            loop_count: 0,
            last_transfer_mark: 0,
        }
    }

    /// Monitor for the upload pass (one tick per local file)
    pub fn for_upload(config: &LivenessConfig) -> Self {
        Self::new(config.upload_loop_interval, config.transfer_interval)
    }

    /// Monitor for the download pass (one tick per remote directory)
    pub fn for_download(config: &LivenessConfig) -> Self {
        Self::new(config.download_loop_interval, config.transfer_interval)
    }

    /// Records one iteration; logs and returns `true` when a line is due
    ///
    /// `transfers` is the number of successful transfers so far in this pass.
    pub fn tick(&mut self, transfers: u64, elapsed: Duration) -> bool {
        self.loop_count += 1;

        let mark = transfers / self.transfer_interval;
        let transfer_due = transfers > 0 && mark > self.last_transfer_mark;
        let loop_due = self.loop_count % self.loop_interval == 0;

        if transfer_due {
            self.last_transfer_mark = mark;
            self.loop_count = 1;
        }
        if transfer_due || loop_due {
            info!("Runtime: {}", format_runtime(elapsed));
            return true;
        }
        false
    }
}
