//! Resumable, cancellable file and directory copying with progress reporting.
//!
//! This crate provides:
//!
//! * A cancellation-aware buffered stream copy
//! * A background progress reporter sampling a shared byte counter on a fixed
//!   interval, so slow callbacks never slow the copy down
//! * Single-file copies that can resume from a byte offset
//! * Directory tree copies with extension filtering and tree-level progress
//! * Copying out of an in-memory tree as well as the host file system
//!
//! # Example
//!
//! ```rust,ignore
//! use progcp_copy::{CancelToken, FileCopyOptions, copy_file};
//!
//! let cancel = CancelToken::new();
//! let options = FileCopyOptions::new()
//!     .with_cancel(cancel.clone())
//!     .with_progress(|p| println!("{:.1}%", p.percent));
//!
//! match copy_file(source, target, &options) {
//!     Ok(n) => println!("{n} bytes copied"),
//!     Err(e) if e.is_cancelled() => {
//!         // Later: copy_file(source, target, &options.with_resume_offset(e.written))
//!     }
//!     Err(e) => return Err(e.into()),
//! }
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod cancel;
mod copy;
mod error;
mod options;
mod progress;
mod scan;
mod source;
mod stream;
mod tree;

pub use cancel::CancelToken;
pub use copy::{copy_file, copy_file_from};
pub use error::{CopyError, CopyFailure};
pub use options::{
    DEFAULT_BUFFER_SIZE, DEFAULT_REPORT_INTERVAL, ExtensionFilter, FileCopyOptions,
    TreeCopyOptions,
};
pub use progress::{
    ProgressCallback, ProgressReporter, ProgressSample, ProgressTracker, TreeProgressCallback,
    TreeProgressSample, percent_of,
};
pub use scan::{TreeInfo, scan_tree, scan_tree_from};
pub use source::{EntryKind, EntryMetadata, HostFs, MemFs, SourceFs, WalkEntry};
pub use stream::{StreamError, StreamFailure, TeeWriter, copy, copy_buffer};
pub use tree::{copy_tree, copy_tree_from};
