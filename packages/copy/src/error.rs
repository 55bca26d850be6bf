//! Error types for copy operations.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

/// Errors that can occur during copy operations.
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    /// Source is not a plain file (directory, symlink, device, ...).
    #[error("Not a regular file: {}", path.display())]
    NotRegularFile {
        /// The offending source path.
        path: PathBuf,
    },

    /// Resume offset does not fit the source or the existing destination.
    #[error(
        "Invalid resume offset {offset} for {}: source is {source_len} bytes, destination is {destination_len} bytes",
        path.display()
    )]
    InvalidResumeOffset {
        /// The source file path.
        path: PathBuf,
        /// The requested resume offset.
        offset: u64,
        /// Current length of the source.
        source_len: u64,
        /// Current length of the destination (0 if missing).
        destination_len: u64,
    },

    /// Open, read, write, seek or stat failure.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// Path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The cancellation token fired or its deadline elapsed.
    #[error("Copy cancelled")]
    Cancelled,

    /// Directory traversal failed.
    #[error("Failed to walk directory {}: {message}", path.display())]
    Walk {
        /// The path being visited.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

impl CopyError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether this error came from cancellation rather than a failure.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A failed copy together with the bytes written before it stopped.
///
/// The byte count is what makes resumption possible: a single-file copy can be
/// restarted with `resume_offset = previous offset + written`.
#[derive(Debug, thiserror::Error)]
#[error("{error} ({written} bytes written)")]
pub struct CopyFailure {
    /// Bytes written by the failed invocation.
    pub written: u64,
    /// What stopped the copy.
    #[source]
    pub error: CopyError,
}

impl CopyFailure {
    /// Create a failure record.
    #[must_use]
    pub const fn new(written: u64, error: CopyError) -> Self {
        Self { written, error }
    }

    /// Whether the copy was stopped by cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.error.is_cancelled()
    }
}

impl From<CopyError> for CopyFailure {
    fn from(error: CopyError) -> Self {
        Self::new(0, error)
    }
}
