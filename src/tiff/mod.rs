//! TIFF and BigTIFF metadata codec.
//!
//! This module reads and writes the *directory structure* of TIFF streams:
//! IFDs, entries, and their typed values. It does not decode pixel data;
//! image decoding is a separate concern handled elsewhere.
//!
//! # Key Concepts
//!
//! - **Byte order**: streams declare their endianness (II = little-endian,
//!   MM = big-endian) in the header; all multi-byte values respect it.
//!
//! - **Classic TIFF vs BigTIFF**: classic streams use 32-bit offsets and
//!   2-byte entry counts, BigTIFF uses 64-bit offsets and 8-byte counts.
//!   Reader and writer handle both.
//!
//! - **Inline vs offset values**: values no larger than the offset field
//!   are stored inline in the entry, larger values at an offset.
//!
//! - **Lenient reading**: header errors are fatal, everything else degrades
//!   to skip-and-continue so corrupt streams yield partial metadata.
//!
//! # Concurrency
//!
//! Reading and writing are synchronous and single-threaded per call. All
//! per-parse state lives in an internal context, so readers and writers may
//! be shared and reused freely.

mod half;
mod ifd;
mod rational;
mod reader;
mod source;
mod types;
mod value;
mod writer;

pub use half::{f32_to_half_bits, half_bits_to_f32, Half};
pub use ifd::{Directory, Ifd};
pub use rational::{Rational, RationalError};
pub use reader::TiffReader;
pub use source::RangeSource;
pub use types::{tag, tag_name, ByteOrder, TiffType};
pub use value::{Entry, Value};
pub use writer::TiffWriter;
