//! Sequential directory-tree copy with two-level progress.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::copy::{copy_file_from, create_dir};
use crate::error::{CopyError, CopyFailure};
use crate::options::{FileCopyOptions, TreeCopyOptions};
use crate::progress::{
    ProgressCallback, ProgressSample, TreeProgressCallback, TreeProgressSample, percent_of,
};
use crate::scan::{TreeInfo, scan_tree_from};
use crate::source::{EntryKind, HostFs, SourceFs, WalkEntry};

/// Copy a directory tree on the host file system.
///
/// See [`copy_tree_from`].
///
/// # Errors
///
/// * See [`copy_tree_from`]
pub fn copy_tree(
    source: &Path,
    target: &Path,
    options: &TreeCopyOptions,
) -> Result<u64, CopyFailure> {
    copy_tree_from(&HostFs, source, target, options)
}

/// Copy the directory `source` from `source_fs` into `target` on the host.
///
/// The tree is scanned once up front; its total size is the denominator of
/// every tree percentage for the rest of the call. The tree is then walked
/// again in the same order: every directory is recreated (empty ones too) and
/// every file passing the extension filter is copied from offset 0, one at a
/// time. Files are not resumed mid-way; callers wanting that skip completed
/// files themselves and use [`crate::copy_file`] with an offset.
///
/// The tree may change between the scan and the copy. Nothing guards against
/// that: added, removed or resized files make the percentages inaccurate.
///
/// Returns the bytes copied across the tree.
///
/// # Errors
///
/// * [`CopyError::Walk`] if the tree cannot be traversed or `source` is not a directory
/// * Any error from copying a file; the walk stops at the first one
/// * [`CopyError::Cancelled`] if the token fires
///
/// On error `written` holds the bytes copied so far. Files already copied stay
/// on disk.
pub fn copy_tree_from<S>(
    source_fs: &S,
    source: &Path,
    target: &Path,
    options: &TreeCopyOptions,
) -> Result<u64, CopyFailure>
where
    S: SourceFs + ?Sized,
{
    log::debug!(
        "Copying directory: {} -> {}",
        source.display(),
        target.display()
    );

    let root = source_fs.metadata(source).map_err(|e| CopyError::Walk {
        path: source.to_path_buf(),
        message: e.to_string(),
    })?;
    if root.kind != EntryKind::Dir {
        return Err(CopyError::Walk {
            path: source.to_path_buf(),
            message: "not a directory".to_string(),
        }
        .into());
    }

    // Phase 1: scan for totals
    let info = scan_tree_from(source_fs, source, &options.extensions)?;

    // Phase 2: walk again and copy
    let mut copier = TreeCopier {
        source,
        target,
        options,
        info: &info,
        bytes_copied: 0,
        files_copied: 0,
    };
    let result = source_fs.walk(source, &mut |entry| copier.visit(source_fs, entry));

    log::debug!(
        "Copied {}/{} files ({}/{} bytes) from {}",
        copier.files_copied,
        info.file_count,
        copier.bytes_copied,
        info.total_size,
        source.display()
    );

    match result {
        Ok(()) => Ok(copier.bytes_copied),
        Err(error) => Err(CopyFailure::new(copier.bytes_copied, error)),
    }
}

/// Running state of one tree copy.
struct TreeCopier<'a> {
    source: &'a Path,
    target: &'a Path,
    options: &'a TreeCopyOptions,
    info: &'a TreeInfo,
    bytes_copied: u64,
    files_copied: u64,
}

impl TreeCopier<'_> {
    fn visit<S>(&mut self, source_fs: &S, entry: WalkEntry) -> Result<(), CopyError>
    where
        S: SourceFs + ?Sized,
    {
        if self.options.cancel.is_cancelled() {
            return Err(CopyError::Cancelled);
        }

        let destination = self.destination_for(&entry.path)?;

        match entry.kind {
            EntryKind::Dir => {
                // Create the dir even if the source dir is empty.
                create_dir(&destination)
            }
            EntryKind::File => {
                if !self.options.extensions.matches(&entry.path) {
                    return Ok(());
                }
                self.copy_one(source_fs, &entry.path, &destination)
            }
            EntryKind::Other => {
                log::debug!("Skipping non-regular entry {}", entry.path.display());
                Ok(())
            }
        }
    }

    fn copy_one<S>(&mut self, source_fs: &S, path: &Path, destination: &Path) -> Result<(), CopyError>
    where
        S: SourceFs + ?Sized,
    {
        log::trace!("Copying {} -> {}", path.display(), destination.display());

        let file_options = FileCopyOptions {
            buffer_size: self.options.buffer_size,
            report_interval: self.options.report_interval,
            on_progress: self
                .options
                .on_progress
                .as_ref()
                .map(|on_progress| self.file_progress(on_progress, path)),
            resume_offset: 0,
            cancel: self.options.cancel.clone(),
        };

        match copy_file_from(source_fs, path, destination, &file_options) {
            Ok(written) => {
                self.bytes_copied += written;
                self.files_copied += 1;
                if let Some(on_progress) = &self.options.on_progress {
                    on_progress(&self.sample(
                        path,
                        self.bytes_copied,
                        ProgressSample::completed(written, 0, written),
                    ));
                }
                Ok(())
            }
            Err(failure) => {
                self.bytes_copied += failure.written;
                Err(failure.error)
            }
        }
    }

    /// Per-file callback lifting file samples to tree samples.
    fn file_progress(&self, on_progress: &TreeProgressCallback, path: &Path) -> ProgressCallback {
        let on_progress = Arc::clone(on_progress);
        let current_file = path.to_path_buf();
        let files_total = self.info.file_count;
        let files_copied = self.files_copied;
        let bytes_total = self.info.total_size;
        let bytes_before = self.bytes_copied;

        Arc::new(move |file: &ProgressSample| {
            let bytes_copied = bytes_before + file.copied();
            on_progress(&TreeProgressSample {
                files_total,
                files_copied,
                bytes_total,
                bytes_copied,
                percent: percent_of(bytes_copied, bytes_total),
                current_file: current_file.clone(),
                file: *file,
            });
        })
    }

    fn sample(&self, path: &Path, bytes_copied: u64, file: ProgressSample) -> TreeProgressSample {
        TreeProgressSample {
            files_total: self.info.file_count,
            files_copied: self.files_copied,
            bytes_total: self.info.total_size,
            bytes_copied,
            percent: percent_of(bytes_copied, self.info.total_size),
            current_file: path.to_path_buf(),
            file,
        }
    }

    fn destination_for(&self, path: &Path) -> Result<PathBuf, CopyError> {
        let relative = path
            .strip_prefix(self.source)
            .map_err(|_| CopyError::Walk {
                path: path.to_path_buf(),
                message: "entry is outside the walk root".to_string(),
            })?;
        if relative.as_os_str().is_empty() {
            Ok(self.target.to_path_buf())
        } else {
            Ok(self.target.join(relative))
        }
    }
}
