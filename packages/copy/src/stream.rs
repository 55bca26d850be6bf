//! Cancellation-aware buffered copy between two byte streams.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::error::{CopyError, CopyFailure};
use crate::options::DEFAULT_BUFFER_SIZE;
use crate::progress::ProgressTracker;

/// Why a stream copy stopped early.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Reading from the source failed.
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    /// Writing to the destination failed.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
    /// The cancellation token fired.
    #[error("cancelled")]
    Cancelled,
}

/// A stream copy that stopped early, with the bytes written before it did.
#[derive(Debug, thiserror::Error)]
#[error("{error} ({written} bytes written)")]
pub struct StreamFailure {
    /// Bytes fully handed to the writer before the failure.
    pub written: u64,
    /// What stopped the copy.
    #[source]
    pub error: StreamError,
}

impl StreamFailure {
    const fn new(written: u64, error: StreamError) -> Self {
        Self { written, error }
    }

    /// Attach file paths, turning this into a [`CopyFailure`].
    #[must_use]
    pub fn with_paths(self, source: &Path, target: &Path) -> CopyFailure {
        let error = match self.error {
            StreamError::Read(e) => CopyError::io(source, e),
            StreamError::Write(e) => CopyError::io(target, e),
            StreamError::Cancelled => CopyError::Cancelled,
        };
        CopyFailure::new(self.written, error)
    }
}

/// Copy `reader` into `writer` with a buffer of [`DEFAULT_BUFFER_SIZE`].
///
/// # Errors
///
/// * See [`copy_buffer`]
pub fn copy<R, W>(reader: &mut R, writer: &mut W, cancel: &CancelToken) -> Result<u64, StreamFailure>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    copy_buffer(reader, writer, &mut [], cancel)
}

/// Size of the stack buffer used for the first chunk when the caller supplies
/// no buffer. The default buffer is only allocated once that chunk is not EOF.
const FIRST_CHUNK_SIZE: usize = 512;

/// Copy `reader` into `writer` until EOF, an error, or cancellation.
///
/// An empty `buf` is replaced with a buffer of [`DEFAULT_BUFFER_SIZE`],
/// allocated after the first read returns data; an empty source allocates
/// nothing. The token is checked before every chunk, so cancellation takes
/// effect within one chunk's read and write. Bytes accepted by a partial write
/// are counted even when the rest of the chunk fails.
///
/// # Errors
///
/// * [`StreamError::Read`] / [`StreamError::Write`] on IO failure
/// * [`StreamError::Cancelled`] when the token fires
pub fn copy_buffer<R, W>(
    reader: &mut R,
    writer: &mut W,
    buf: &mut [u8],
    cancel: &CancelToken,
) -> Result<u64, StreamFailure>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    if !buf.is_empty() {
        return copy_chunks(reader, writer, buf, cancel, 0, false).map(|(written, _)| written);
    }

    let mut first = [0u8; FIRST_CHUNK_SIZE];
    let (written, eof) = copy_chunks(reader, writer, &mut first, cancel, 0, true)?;
    if eof {
        return Ok(written);
    }

    let mut owned = vec![0u8; DEFAULT_BUFFER_SIZE];
    copy_chunks(reader, writer, &mut owned, cancel, written, false).map(|(written, _)| written)
}

/// Copy chunks through `buf`, starting the count at `written`. With `single`
/// set, stops after one chunk. Returns the running count and whether EOF was
/// reached; the writer is flushed at EOF.
fn copy_chunks<R, W>(
    reader: &mut R,
    writer: &mut W,
    buf: &mut [u8],
    cancel: &CancelToken,
    mut written: u64,
    single: bool,
) -> Result<(u64, bool), StreamFailure>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    loop {
        if cancel.is_cancelled() {
            return Err(StreamFailure::new(written, StreamError::Cancelled));
        }

        let n = match reader.read(buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(StreamFailure::new(written, StreamError::Read(e))),
        };

        let mut chunk = &buf[..n];
        while !chunk.is_empty() {
            match writer.write(chunk) {
                Ok(0) => {
                    return Err(StreamFailure::new(
                        written,
                        StreamError::Write(io::ErrorKind::WriteZero.into()),
                    ));
                }
                Ok(m) => {
                    written += m as u64;
                    chunk = &chunk[m..];
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(StreamFailure::new(written, StreamError::Write(e))),
            }
        }

        if single {
            return Ok((written, false));
        }
    }

    writer
        .flush()
        .map_err(|e| StreamFailure::new(written, StreamError::Write(e)))?;

    Ok((written, true))
}

/// Writer that advances a [`ProgressTracker`] by every byte it accepts.
#[derive(Debug)]
pub struct TeeWriter<W> {
    inner: W,
    tracker: Arc<ProgressTracker>,
}

impl<W: Write> TeeWriter<W> {
    /// Wrap `inner`, counting accepted bytes into `tracker`.
    pub const fn new(inner: W, tracker: Arc<ProgressTracker>) -> Self {
        Self { inner, tracker }
    }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for TeeWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.tracker.add(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Accepts at most `limit` bytes, then fails.
    struct LimitedWriter {
        data: Vec<u8>,
        limit: usize,
    }

    impl Write for LimitedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.limit - self.data.len();
            if room == 0 {
                return Err(io::Error::other("disk full"));
            }
            let n = room.min(buf.len());
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Records the length of every buffer it is asked to fill.
    struct RecordingReader {
        inner: Cursor<Vec<u8>>,
        buf_lens: Vec<usize>,
    }

    impl Read for RecordingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.buf_lens.push(buf.len());
            self.inner.read(buf)
        }
    }

    /// Cancels `token` once `after` bytes have been read.
    struct CancellingReader {
        inner: Cursor<Vec<u8>>,
        token: CancelToken,
        after: u64,
    }

    impl Read for CancellingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.inner.read(buf)?;
            if self.inner.position() >= self.after {
                self.token.cancel();
            }
            Ok(n)
        }
    }

    #[test]
    fn test_copy_full_stream() {
        let data: Vec<u8> = (0..=255).cycle().take(10_000).collect();
        let mut out = Vec::new();

        let n = copy_buffer(
            &mut Cursor::new(data.clone()),
            &mut out,
            &mut [0u8; 512],
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(n, 10_000);
        assert_eq!(out, data);
    }

    #[test]
    fn test_copy_uses_default_buffer() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let mut reader = RecordingReader {
            inner: Cursor::new(data.clone()),
            buf_lens: Vec::new(),
        };
        let mut out = Vec::new();

        let n = copy(&mut reader, &mut out, &CancelToken::new()).unwrap();

        assert_eq!(n, 200_000);
        assert_eq!(out, data);
        assert_eq!(reader.buf_lens[0], FIRST_CHUNK_SIZE);
        assert!(reader.buf_lens[1..].iter().all(|&len| len == DEFAULT_BUFFER_SIZE));
    }

    #[test]
    fn test_empty_source() {
        let mut reader = RecordingReader {
            inner: Cursor::new(Vec::new()),
            buf_lens: Vec::new(),
        };
        let mut out = Vec::new();

        let n = copy(&mut reader, &mut out, &CancelToken::new()).unwrap();

        assert_eq!(n, 0);
        assert!(out.is_empty());
        // Only the small first-chunk buffer was ever offered to the reader.
        assert_eq!(reader.buf_lens, vec![FIRST_CHUNK_SIZE]);
    }

    #[test]
    fn test_source_smaller_than_first_chunk() {
        let mut out = Vec::new();
        let n = copy(&mut Cursor::new(vec![7u8; 100]), &mut out, &CancelToken::new()).unwrap();
        assert_eq!(n, 100);
        assert_eq!(out, vec![7u8; 100]);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let mut out = Vec::new();

        let err = copy(&mut Cursor::new(vec![1u8; 10]), &mut out, &token).unwrap_err();

        assert_eq!(err.written, 0);
        assert!(matches!(err.error, StreamError::Cancelled));
    }

    #[test]
    fn test_cancellation_observed_between_chunks() {
        let token = CancelToken::new();
        let mut reader = CancellingReader {
            inner: Cursor::new(vec![3u8; 1000]),
            token: token.clone(),
            after: 400,
        };
        let mut out = Vec::new();

        let err = copy_buffer(&mut reader, &mut out, &mut [0u8; 100], &token).unwrap_err();

        assert_eq!(err.written, 400);
        assert_eq!(out.len(), 400);
        assert!(matches!(err.error, StreamError::Cancelled));
    }

    #[test]
    fn test_partial_write_is_counted() {
        let mut writer = LimitedWriter {
            data: Vec::new(),
            limit: 150,
        };

        let err = copy_buffer(
            &mut Cursor::new(vec![9u8; 1000]),
            &mut writer,
            &mut [0u8; 100],
            &CancelToken::new(),
        )
        .unwrap_err();

        assert_eq!(err.written, 150);
        assert!(matches!(err.error, StreamError::Write(_)));
    }

    #[test]
    fn test_tee_writer_counts_bytes() {
        let tracker = ProgressTracker::new(10);
        let mut tee = TeeWriter::new(Vec::new(), Arc::clone(&tracker));

        copy(&mut Cursor::new(vec![1u8; 90]), &mut tee, &CancelToken::new()).unwrap();

        assert_eq!(tracker.written(), 100);
        assert_eq!(tee.into_inner().len(), 90);
    }
}
