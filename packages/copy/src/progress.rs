//! Progress tracking and throttled reporting for copy operations.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::cancel::CancelToken;

/// Callback receiving single-file progress samples.
pub type ProgressCallback = Arc<dyn Fn(&ProgressSample) + Send + Sync>;

/// Callback receiving tree-level progress samples.
pub type TreeProgressCallback = Arc<dyn Fn(&TreeProgressSample) + Send + Sync>;

/// Progress of a single copy operation at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    /// Total bytes of the operation (the source size).
    pub total: u64,
    /// Bytes copied before this operation started (the resume offset).
    pub previous: u64,
    /// Bytes copied by this operation so far.
    pub current: u64,
    /// `100 * (previous + current) / total`, clamped to `[0, 100]`.
    pub percent: f32,
}

impl ProgressSample {
    /// Create a sample, computing the percentage.
    #[must_use]
    pub fn new(total: u64, previous: u64, current: u64) -> Self {
        Self {
            total,
            previous,
            current,
            percent: percent_of(previous.saturating_add(current), total),
        }
    }

    /// Create the terminal sample of a successful copy, pinned at 100%.
    #[must_use]
    pub fn completed(total: u64, previous: u64, current: u64) -> Self {
        Self {
            total: total.max(previous.saturating_add(current)),
            previous,
            current,
            percent: 100.0,
        }
    }

    /// Bytes copied including the resumed prefix.
    #[must_use]
    pub const fn copied(&self) -> u64 {
        self.previous.saturating_add(self.current)
    }
}

/// Progress of a tree copy: tree totals plus the file currently being copied.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeProgressSample {
    /// Number of matched files in the tree.
    pub files_total: u64,
    /// Number of files fully copied so far.
    pub files_copied: u64,
    /// Total bytes of matched files.
    pub bytes_total: u64,
    /// Bytes copied across the tree so far.
    pub bytes_copied: u64,
    /// `100 * bytes_copied / bytes_total`, 0 when the tree is empty.
    pub percent: f32,
    /// Source path of the file currently being copied.
    pub current_file: PathBuf,
    /// Progress of `current_file` itself.
    pub file: ProgressSample,
}

/// Compute `100 * part / total` clamped to `[0, 100]`, 0 when `total` is 0.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn percent_of(part: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    let ratio = part as f64 / total as f64 * 100.0;
    ratio.clamp(0.0, 100.0) as f32
}

/// Thread-safe byte counter shared between a copy loop and its reporter.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    written: AtomicU64,
}

impl ProgressTracker {
    /// Create a tracker seeded with `initial` bytes (the resume offset).
    #[must_use]
    pub fn new(initial: u64) -> Arc<Self> {
        Arc::new(Self {
            written: AtomicU64::new(initial),
        })
    }

    /// Record `bytes` more written bytes.
    pub fn add(&self, bytes: u64) {
        self.written.fetch_add(bytes, Ordering::Release);
    }

    /// Bytes recorded so far, including the seed.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy)]
enum Stop {
    Completed,
    Aborted,
}

/// Background sampler turning a [`ProgressTracker`] into periodic callbacks.
///
/// The reporter thread wakes every `interval`, reads the tracker and calls the
/// callback; the copy loop never waits on it. Dropping the reporter stops it
/// without a final sample, [`ProgressReporter::finish`] stops it after a final
/// 100% sample. Either way the thread has exited before control returns.
pub struct ProgressReporter {
    stop: mpsc::Sender<Stop>,
    handle: Option<JoinHandle<bool>>,
    total: u64,
    previous: u64,
    tracker: Arc<ProgressTracker>,
    on_progress: ProgressCallback,
}

impl ProgressReporter {
    /// Spawn the reporter thread.
    ///
    /// `previous` is the resume offset the tracker was seeded with.
    ///
    /// # Errors
    ///
    /// * If the reporter thread cannot be spawned
    pub fn start(
        total: u64,
        previous: u64,
        tracker: Arc<ProgressTracker>,
        interval: Duration,
        cancel: CancelToken,
        on_progress: ProgressCallback,
    ) -> io::Result<Self> {
        let (stop, signals) = mpsc::channel();
        let thread_tracker = Arc::clone(&tracker);
        let thread_callback = Arc::clone(&on_progress);

        // Returns whether the final sample was delivered.
        let handle = thread::Builder::new()
            .name("progcp-progress".to_string())
            .spawn(move || {
                log::trace!("Progress reporter started (interval {interval:?})");
                let delivered = loop {
                    match signals.recv_timeout(interval) {
                        Ok(Stop::Completed) => {
                            let current = thread_tracker.written().saturating_sub(previous);
                            thread_callback(&ProgressSample::completed(total, previous, current));
                            break true;
                        }
                        Ok(Stop::Aborted) | Err(RecvTimeoutError::Disconnected) => break false,
                        Err(RecvTimeoutError::Timeout) => {
                            if cancel.is_cancelled() {
                                break false;
                            }
                            let current = thread_tracker.written().saturating_sub(previous);
                            thread_callback(&ProgressSample::new(total, previous, current));
                        }
                    }
                };
                log::trace!("Progress reporter stopped");
                delivered
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
            total,
            previous,
            tracker,
            on_progress,
        })
    }

    /// Stop the reporter after delivering the final 100% sample.
    pub fn finish(mut self) {
        let delivered = self.shutdown(Stop::Completed);
        if !delivered {
            // Cancellation raced completion and the thread exited first.
            let current = self.tracker.written().saturating_sub(self.previous);
            (self.on_progress)(&ProgressSample::completed(self.total, self.previous, current));
        }
    }

    fn shutdown(&mut self, signal: Stop) -> bool {
        let Some(handle) = self.handle.take() else {
            return false;
        };
        // The thread may already have exited on cancellation.
        let _ = self.stop.send(signal);
        handle.join().unwrap_or_else(|_| {
            log::warn!("Progress callback panicked");
            true
        })
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.shutdown(Stop::Aborted);
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("running", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}
