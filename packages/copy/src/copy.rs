//! Resumable single-file copy.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::path::Path;

use crate::error::{CopyError, CopyFailure};
use crate::options::FileCopyOptions;
use crate::progress::{ProgressReporter, ProgressTracker};
use crate::source::{EntryKind, HostFs, SourceFs};
use crate::stream::{TeeWriter, copy_buffer};

/// Copy a regular file on the host file system.
///
/// See [`copy_file_from`].
///
/// # Errors
///
/// * See [`copy_file_from`]
pub fn copy_file(
    source: &Path,
    target: &Path,
    options: &FileCopyOptions,
) -> Result<u64, CopyFailure> {
    copy_file_from(&HostFs, source, target, options)
}

/// Copy the regular file `source` from `source_fs` to `target` on the host.
///
/// With `options.resume_offset == 0` the target is created or truncated.
/// With a positive offset the first `offset` bytes of the target are trusted,
/// anything past them is discarded, and copying continues from `offset` in
/// both files. The target's parent directory is created if missing, and the
/// source's permissions are applied to the target after a successful copy.
///
/// Returns the bytes written by this call, not counting the resumed prefix.
///
/// # Errors
///
/// * [`CopyError::NotRegularFile`] if `source` is not a plain file
/// * [`CopyError::InvalidResumeOffset`] if the offset exceeds the source or the existing target
/// * [`CopyError::Io`] on open, read, write, seek or stat failure
/// * [`CopyError::Cancelled`] if the token fires; `written` holds the bytes copied so far
pub fn copy_file_from<S>(
    source_fs: &S,
    source: &Path,
    target: &Path,
    options: &FileCopyOptions,
) -> Result<u64, CopyFailure>
where
    S: SourceFs + ?Sized,
{
    let offset = options.resume_offset;

    log::debug!(
        "Copying file: {} -> {} (offset {offset})",
        source.display(),
        target.display()
    );

    let metadata = source_fs.metadata(source).map_err(|e| CopyError::io(source, e))?;
    if metadata.kind != EntryKind::File {
        return Err(CopyError::NotRegularFile {
            path: source.to_path_buf(),
        }
        .into());
    }
    let size = metadata.len;

    // Ensure parent directory exists
    if let Some(parent) = target.parent() {
        create_dir(parent)?;
    }

    let mut reader = source_fs.open(source).map_err(|e| CopyError::io(source, e))?;
    let mut writer = open_target(source, target, offset, size)?;
    if offset > 0 {
        reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| CopyError::io(source, e))?;
    }

    let tracker = ProgressTracker::new(offset);
    let reporter = options
        .on_progress
        .as_ref()
        .map(|on_progress| {
            ProgressReporter::start(
                size,
                offset,
                tracker.clone(),
                options.effective_interval(),
                options.cancel.clone(),
                on_progress.clone(),
            )
        })
        .transpose()
        .map_err(|e| CopyError::io(source, e))?;

    let result = if size == offset {
        Ok(0)
    } else {
        let mut buf = vec![0u8; options.effective_buffer_size()];
        if reporter.is_some() {
            let mut tee = TeeWriter::new(&mut writer, tracker);
            copy_buffer(&mut reader, &mut tee, &mut buf, &options.cancel)
        } else {
            copy_buffer(&mut reader, &mut writer, &mut buf, &options.cancel)
        }
    };

    let written = result.map_err(|failure| {
        log::debug!("Copy of {} stopped: {failure}", source.display());
        failure.with_paths(source, target)
    })?;

    if let Some(permissions) = metadata.permissions {
        fs::set_permissions(target, permissions)
            .map_err(|e| CopyFailure::new(written, CopyError::io(target, e)))?;
    }

    if let Some(reporter) = reporter {
        reporter.finish();
    }

    log::trace!(
        "Copied {} -> {} ({written} bytes)",
        source.display(),
        target.display()
    );

    Ok(written)
}

/// Create `path` and any missing parents with mode `0755`.
pub(crate) fn create_dir(path: &Path) -> Result<(), CopyError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(path).map_err(|e| CopyError::io(path, e))
}

/// Open the target for a fresh copy (`offset == 0`) or positioned at `offset`
/// for a resumed one, validating the offset first.
fn open_target(
    source: &Path,
    target: &Path,
    offset: u64,
    source_len: u64,
) -> Result<File, CopyError> {
    if offset == 0 {
        return File::create(target).map_err(|e| CopyError::io(target, e));
    }

    let destination_len = fs::metadata(target).map_or(0, |m| m.len());
    if offset > source_len || offset > destination_len {
        return Err(CopyError::InvalidResumeOffset {
            path: source.to_path_buf(),
            offset,
            source_len,
            destination_len,
        });
    }

    let mut file = OpenOptions::new()
        .write(true)
        .open(target)
        .map_err(|e| CopyError::io(target, e))?;
    if destination_len > offset {
        file.set_len(offset).map_err(|e| CopyError::io(target, e))?;
    }
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| CopyError::io(target, e))?;

    Ok(file)
}
