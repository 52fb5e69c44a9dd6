use thiserror::Error;

use crate::tiff::TiffType;

/// Errors that can occur when reading or writing TIFF streams.
///
/// Reader errors follow a two-tier severity model: a malformed header means
/// the stream is not a TIFF at all and parsing fails immediately, while
/// content-level anomalies (bad offsets, truncated values, unknown types,
/// IFD cycles) are contained to the smallest scope and never surface here.
/// Writer errors indicate an unencodable directory, not recoverable data.
#[derive(Debug, Error)]
pub enum TiffError {
    /// I/O error while reading from or writing to the underlying source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid byte order mark (not II or MM)
    #[error("invalid byte order mark: expected 0x4949 (II) or 0x4D4D (MM), got {0:#06x}")]
    InvalidByteOrder(u16),

    /// Invalid magic number (not 42 or 43)
    #[error("invalid magic: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidMagic(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("invalid BigTIFF offset size: expected 8, got {0}")]
    InvalidOffsetSize(u16),

    /// Non-zero BigTIFF header padding
    #[error("invalid BigTIFF header padding: expected 0, got {0}")]
    InvalidPadding(u16),

    /// Stream is too short to contain a TIFF header
    #[error("stream too short: need at least {required} bytes, got {actual}")]
    ShortHeader { required: u64, actual: u64 },

    /// A computed offset does not fit the offset width of the output format.
    ///
    /// Overflowing a classic TIFF stream is a hard failure, never a silent
    /// BigTIFF upgrade.
    #[error("offset {offset} does not fit in {width} bytes")]
    OffsetOverflow { offset: u64, width: usize },

    /// A BigTIFF-only type cannot be written to a classic TIFF stream
    #[error("type {0:?} requires a BigTIFF stream")]
    BigTiffOnlyType(TiffType),

    /// The entry value shape does not match the declared entry type
    #[error("tag {tag}: value does not match type {ty:?}")]
    TypeMismatch { tag: u16, ty: TiffType },

    /// The entry value has no TIFF encoding (unknown or unreadable markers)
    #[error("tag {tag}: value cannot be encoded")]
    UnencodableValue { tag: u16 },
}

/// Errors that can occur in the HTTP cache.
///
/// Disk-tier I/O failures are deliberately absent from most code paths:
/// they degrade to cache-miss behavior (logged, not thrown) so a cache
/// failure never blocks the underlying resource from being served. What
/// remains here are resolver failures and cache construction problems,
/// which genuinely belong to the caller.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error while setting up the cache directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The resolver failed to produce a response
    #[error("resolver error: {0}")]
    Resolver(String),
}
