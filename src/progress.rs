//! Progress reporting.
//!
//! Implement [`ProgressCallback`] and attach it with
//! [`ExtractOptions::with_progress`](crate::ExtractOptions::with_progress) to
//! observe an extraction run. The callback fires once per requested
//! timestamp, whether that timestamp produced a file or was skipped.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stillshot::{ExtractOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}/{} (at {}s)", info.current, info.total, info.seconds);
//!     }
//! }
//!
//! let options = ExtractOptions::new("input.mp4", "%d.jpg")
//!     .with_timestamps([1, 2, 3])
//!     .with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// A snapshot of extraction progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// How many timestamps have been processed so far.
    pub current: u64,
    /// Number of requested timestamps.
    pub total: u64,
    /// The timestamp (seconds) that was just processed.
    pub seconds: u64,
    /// Whether that timestamp produced an output file.
    pub written: bool,
    /// Wall-clock time elapsed since the run started.
    pub elapsed: Duration,
}

/// Trait for receiving progress updates during extraction.
///
/// Callbacks observe but cannot halt the run.
pub trait ProgressCallback: Send + Sync {
    /// Called after each timestamp is processed.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Internal helper that counts processed timestamps and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: u64,
    current: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: u64) -> Self {
        Self {
            callback,
            total,
            current: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one processed timestamp and fire the callback.
    pub(crate) fn advance(&mut self, seconds: u64, written: bool) {
        self.current += 1;
        let info = ProgressInfo {
            current: self.current,
            total: self.total,
            seconds,
            written,
            elapsed: self.start_time.elapsed(),
        };
        self.callback.on_progress(&info);
    }
}
