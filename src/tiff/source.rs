//! Random-access byte sources for the TIFF codec.
//!
//! TIFF parsing is inherently non-sequential: IFD tables, out-of-line
//! values, and sub-IFDs live at arbitrary offsets, so the reader consumes a
//! positional-read seam instead of a forward-only stream. [`RangeSource`]
//! is that seam, with implementations for in-memory buffers and files.
//!
//! Sources report their total size when they know it; the reader uses it to
//! validate offsets up front. A source of unknown size returns `None` and
//! the reader falls back to probing reachability with an actual read.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

use bytes::Bytes;

/// A byte source supporting exact positional reads.
pub trait RangeSource {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Fails with `UnexpectedEof` if the range extends past the end of the
    /// source.
    fn read_at(&self, offset: u64, len: usize) -> io::Result<Bytes>;

    /// Total size in bytes, if known.
    fn size(&self) -> Option<u64>;
}

impl RangeSource for [u8] {
    fn read_at(&self, offset: u64, len: usize) -> io::Result<Bytes> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::UnexpectedEof, "offset beyond buffer"))?;
        let end = start.checked_add(len).filter(|&end| end <= self.len());
        match end {
            Some(end) => Ok(Bytes::copy_from_slice(&self[start..end])),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "range beyond buffer",
            )),
        }
    }

    fn size(&self) -> Option<u64> {
        Some(self.len() as u64)
    }
}

impl RangeSource for Bytes {
    fn read_at(&self, offset: u64, len: usize) -> io::Result<Bytes> {
        self[..].read_at(offset, len)
    }

    fn size(&self) -> Option<u64> {
        Some(self.len() as u64)
    }
}

impl RangeSource for Vec<u8> {
    fn read_at(&self, offset: u64, len: usize) -> io::Result<Bytes> {
        self[..].read_at(offset, len)
    }

    fn size(&self) -> Option<u64> {
        Some(self.len() as u64)
    }
}

/// Positional reads over a file.
///
/// Seeks the shared handle, so a single `read` invocation must own the file
/// for its duration; the codec is single-threaded per call by design.
impl RangeSource for File {
    fn read_at(&self, offset: u64, len: usize) -> io::Result<Bytes> {
        let mut handle = self;
        handle.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        handle.read_exact(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    fn size(&self) -> Option<u64> {
        self.metadata().ok().map(|m| m.len())
    }
}

// =============================================================================
// Tests
// =============================================================================
