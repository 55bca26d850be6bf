//! Options for single-file and tree copies.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::progress::{ProgressCallback, ProgressSample, TreeProgressCallback, TreeProgressSample};

/// Buffer size used when none is configured.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Progress report interval used when none (or zero) is configured.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_millis(500);

fn effective_buffer_size(buffer_size: Option<usize>) -> usize {
    buffer_size.filter(|&n| n > 0).unwrap_or(DEFAULT_BUFFER_SIZE)
}

fn effective_interval(interval: Option<Duration>) -> Duration {
    interval
        .filter(|d| !d.is_zero())
        .unwrap_or(DEFAULT_REPORT_INTERVAL)
}

/// Options for copying a single file.
#[derive(Clone, Default)]
pub struct FileCopyOptions {
    /// Copy buffer size; `None` or 0 means [`DEFAULT_BUFFER_SIZE`].
    pub buffer_size: Option<usize>,
    /// Interval between progress samples; `None` or zero means [`DEFAULT_REPORT_INTERVAL`].
    pub report_interval: Option<Duration>,
    /// Progress callback. No reporter thread is started without one.
    pub on_progress: Option<ProgressCallback>,
    /// Bytes already copied by an earlier, interrupted run.
    pub resume_offset: u64,
    /// Cancellation signal.
    pub cancel: CancelToken,
}

impl FileCopyOptions {
    /// Create default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the copy buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size);
        self
    }

    /// Set the progress report interval.
    #[must_use]
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = Some(interval);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress<F>(mut self, on_progress: F) -> Self
    where
        F: Fn(&ProgressSample) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    /// Resume a previous copy from `offset`.
    #[must_use]
    pub fn with_resume_offset(mut self, offset: u64) -> Self {
        self.resume_offset = offset;
        self
    }

    /// Set the cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Buffer size after applying the default.
    #[must_use]
    pub fn effective_buffer_size(&self) -> usize {
        effective_buffer_size(self.buffer_size)
    }

    /// Report interval after applying the default.
    #[must_use]
    pub fn effective_interval(&self) -> Duration {
        effective_interval(self.report_interval)
    }
}

impl std::fmt::Debug for FileCopyOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCopyOptions")
            .field("buffer_size", &self.buffer_size)
            .field("report_interval", &self.report_interval)
            .field("on_progress", &self.on_progress.is_some())
            .field("resume_offset", &self.resume_offset)
            .field("cancel", &self.cancel)
            .finish()
    }
}

/// Options for copying a directory tree.
#[derive(Clone, Default)]
pub struct TreeCopyOptions {
    /// Copy buffer size; `None` or 0 means [`DEFAULT_BUFFER_SIZE`].
    pub buffer_size: Option<usize>,
    /// Interval between progress samples; `None` or zero means [`DEFAULT_REPORT_INTERVAL`].
    pub report_interval: Option<Duration>,
    /// Which files take part in the copy.
    pub extensions: ExtensionFilter,
    /// Tree progress callback.
    pub on_progress: Option<TreeProgressCallback>,
    /// Cancellation signal.
    pub cancel: CancelToken,
}

impl TreeCopyOptions {
    /// Create default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the copy buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size);
        self
    }

    /// Set the progress report interval.
    #[must_use]
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = Some(interval);
        self
    }

    /// Only copy files with these extensions.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = ExtensionFilter::new(extensions);
        self
    }

    /// Set the tree progress callback.
    #[must_use]
    pub fn with_progress<F>(mut self, on_progress: F) -> Self
    where
        F: Fn(&TreeProgressSample) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    /// Set the cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Buffer size after applying the default.
    #[must_use]
    pub fn effective_buffer_size(&self) -> usize {
        effective_buffer_size(self.buffer_size)
    }

    /// Report interval after applying the default.
    #[must_use]
    pub fn effective_interval(&self) -> Duration {
        effective_interval(self.report_interval)
    }
}

impl std::fmt::Debug for TreeCopyOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeCopyOptions")
            .field("buffer_size", &self.buffer_size)
            .field("report_interval", &self.report_interval)
            .field("extensions", &self.extensions)
            .field("on_progress", &self.on_progress.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}

/// Set of lowercase, dot-prefixed file extensions. Empty matches every file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: BTreeSet<String>,
}

impl ExtensionFilter {
    /// Build a filter, lowercasing entries and adding a missing leading dot.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().to_lowercase())
            .filter(|ext| !ext.is_empty() && ext != ".")
            .map(|ext| {
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        Self { extensions }
    }

    /// Whether the filter accepts every file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// The normalized extensions.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// Whether the file at `path` passes the filter.
    ///
    /// The extension is everything from the last `.` of the file name, so a
    /// dotfile such as `.gitignore` has the extension `.gitignore`.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        extension_of(path).is_some_and(|ext| self.extensions.contains(&ext))
    }
}

/// Lowercased suffix of the file name starting at its last `.`.
fn extension_of(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let dot = name.rfind('.')?;
    Some(name[dot..].to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_unset_and_zero() {
        let options = FileCopyOptions::new();
        assert_eq!(options.effective_buffer_size(), DEFAULT_BUFFER_SIZE);
        assert_eq!(options.effective_interval(), DEFAULT_REPORT_INTERVAL);

        let options = FileCopyOptions::new()
            .with_buffer_size(0)
            .with_report_interval(Duration::ZERO);
        assert_eq!(options.effective_buffer_size(), DEFAULT_BUFFER_SIZE);
        assert_eq!(options.effective_interval(), DEFAULT_REPORT_INTERVAL);
    }

    #[test]
    fn test_explicit_values_are_kept() {
        let options = TreeCopyOptions::new()
            .with_buffer_size(4096)
            .with_report_interval(Duration::from_millis(50));
        assert_eq!(options.effective_buffer_size(), 4096);
        assert_eq!(options.effective_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_extension_filter_normalizes() {
        let filter = ExtensionFilter::new([".TXT", "md", "", "."]);
        let normalized: Vec<&str> = filter.iter().collect();
        assert_eq!(normalized, vec![".md", ".txt"]);
    }

    #[test]
    fn test_extension_filter_matches() {
        let filter = ExtensionFilter::new([".txt"]);
        assert!(filter.matches(Path::new("a.txt")));
        assert!(filter.matches(Path::new("dir/NOTES.TXT")));
        assert!(!filter.matches(Path::new("b/c.bin")));
        assert!(!filter.matches(Path::new("Makefile")));
    }

    #[test]
    fn test_extension_filter_matches_dotfiles() {
        let filter = ExtensionFilter::new([".gitignore", "bashrc"]);
        assert!(filter.matches(Path::new(".gitignore")));
        assert!(filter.matches(Path::new("home/.BASHRC")));
        assert!(!filter.matches(Path::new("gitignore")));

        let filter = ExtensionFilter::new([".gz"]);
        assert!(filter.matches(Path::new("archive.tar.gz")));
        assert!(!filter.matches(Path::new("trailing.")));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = ExtensionFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(Path::new("anything")));
    }
}
