//! TIFF and BigTIFF metadata reading.
//!
//! The reader parses a byte source into a [`Directory`] of linked IFDs in a
//! single pass, resolving sub-IFD pointers and guarding against malformed
//! offsets.
//!
//! # Failure model
//!
//! Two tiers of severity:
//!
//! - **Structural header errors** (bad byte order mark, bad magic, bad
//!   BigTIFF offset size or padding) are fatal: the stream is not a TIFF.
//! - **Content anomalies** (bad offsets, truncated values, unknown types,
//!   cyclic IFD links, oversized counts) are contained to the smallest
//!   possible scope — entry, then IFD, then chain — so a partially corrupt
//!   stream yields as much valid metadata as possible instead of an
//!   all-or-nothing failure. Skips are logged, never thrown.
//!
//! # Cycle and bounds guards
//!
//! All offsets are validated against the source size before following them;
//! for sources of unknown size, reachability is probed with a single read.
//! A visited-offset set carried in the per-call parse context breaks IFD
//! cycles. Because all mutable state lives in that context, a reader can be
//! reused and shared freely.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::ifd::{Directory, Ifd};
use super::rational::Rational;
use super::source::RangeSource;
use super::types::{tag, ByteOrder, TiffType};
use super::value::{Entry, Value};
use crate::error::TiffError;

/// Byte order mark for little-endian streams ("II")
const BOM_LITTLE_ENDIAN: u16 = 0x4949;

/// Byte order mark for big-endian streams ("MM")
const BOM_BIG_ENDIAN: u16 = 0x4D4D;

/// Magic number for classic TIFF
const MAGIC_TIFF: u16 = 42;

/// Magic number for BigTIFF
const MAGIC_BIGTIFF: u16 = 43;

/// Classic TIFF header length in bytes
const HEADER_LEN: usize = 8;

/// BigTIFF header length in bytes
const BIGTIFF_HEADER_LEN: usize = 16;

// =============================================================================
// TiffReader
// =============================================================================

/// Reads TIFF and BigTIFF metadata from a [`RangeSource`].
///
/// The reader itself holds no mutable state; each [`read`](TiffReader::read)
/// call builds its own parse context, so one reader may serve any number of
/// calls.
pub struct TiffReader<'a, S: RangeSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: RangeSource + ?Sized> TiffReader<'a, S> {
    /// Create a reader over the given source.
    pub fn new(source: &'a S) -> Self {
        TiffReader { source }
    }

    /// Parse the complete directory structure.
    ///
    /// Fails only on structural header errors; see the module docs for the
    /// treatment of content-level anomalies.
    pub fn read(&self) -> Result<Directory, TiffError> {
        let head = match self.source.read_at(0, HEADER_LEN) {
            Ok(bytes) => bytes,
            Err(_) => {
                return Err(TiffError::ShortHeader {
                    required: HEADER_LEN as u64,
                    actual: self.source.size().unwrap_or(0),
                })
            }
        };

        let bom = u16::from_le_bytes([head[0], head[1]]);
        let byte_order = match bom {
            BOM_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BOM_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(TiffError::InvalidByteOrder(bom)),
        };

        let magic = byte_order.read_u16(&head[2..]);
        let (bigtiff, first_offset) = match magic {
            MAGIC_TIFF => (false, byte_order.read_u32(&head[4..]) as u64),
            MAGIC_BIGTIFF => {
                let offset_size = byte_order.read_u16(&head[4..]);
                if offset_size != 8 {
                    return Err(TiffError::InvalidOffsetSize(offset_size));
                }
                let padding = byte_order.read_u16(&head[6..]);
                if padding != 0 {
                    return Err(TiffError::InvalidPadding(padding));
                }
                let offset_bytes = match self.source.read_at(HEADER_LEN as u64, 8) {
                    Ok(bytes) => bytes,
                    Err(_) => {
                        return Err(TiffError::ShortHeader {
                            required: BIGTIFF_HEADER_LEN as u64,
                            actual: self.source.size().unwrap_or(HEADER_LEN as u64),
                        })
                    }
                };
                (true, byte_order.read_u64(&offset_bytes))
            }
            _ => return Err(TiffError::InvalidMagic(magic)),
        };

        let mut ctx = ParseContext {
            source: self.source,
            byte_order,
            bigtiff,
            size: self.source.size(),
            visited: HashSet::new(),
        };

        let mut ifds = Vec::new();
        let mut offset = first_offset;
        while offset != 0 {
            if !ctx.visited.insert(offset) {
                warn!(offset, "cyclic IFD link, stopping chain");
                break;
            }
            if !ctx.check_range(offset, ctx.count_field_len() as u64) {
                warn!(offset, "IFD offset out of bounds, stopping chain");
                break;
            }
            match ctx.parse_ifd(offset, Nesting::Top) {
                Ok((ifd, next)) => {
                    ifds.push(ifd);
                    offset = next;
                }
                Err(error) => {
                    warn!(%error, offset, "unreadable IFD, stopping chain");
                    break;
                }
            }
        }

        Ok(Directory::new(ifds))
    }
}

// =============================================================================
// Parse context
// =============================================================================

/// Which pointer tags may be followed at a given nesting level.
///
/// Interop IFDs only appear under the EXIF IFD; SubIFD, GPS and Interop
/// directories do not recurse further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nesting {
    Top,
    Exif,
    Leaf,
}

impl Nesting {
    fn pointer_tags(self) -> &'static [u16] {
        match self {
            Nesting::Top => &[tag::SUB_IFD, tag::EXIF_IFD, tag::GPS_IFD],
            Nesting::Exif => &[tag::INTEROP_IFD],
            Nesting::Leaf => &[],
        }
    }

    fn child(self, pointer_tag: u16) -> Nesting {
        if pointer_tag == tag::EXIF_IFD {
            Nesting::Exif
        } else {
            Nesting::Leaf
        }
    }
}

/// All mutable parse state, scoped to one `read` call and threaded through
/// the recursive IFD walk.
struct ParseContext<'a, S: RangeSource + ?Sized> {
    source: &'a S,
    byte_order: ByteOrder,
    bigtiff: bool,
    size: Option<u64>,
    visited: HashSet<u64>,
}

impl<S: RangeSource + ?Sized> ParseContext<'_, S> {
    fn count_field_len(&self) -> usize {
        if self.bigtiff {
            8
        } else {
            2
        }
    }

    fn entry_len(&self) -> usize {
        if self.bigtiff {
            20
        } else {
            12
        }
    }

    fn offset_field_len(&self) -> usize {
        if self.bigtiff {
            8
        } else {
            4
        }
    }

    /// Validate that `[offset, offset + len)` lies within the source.
    ///
    /// When the source size is unknown, reachability is probed by reading
    /// the last byte of the range.
    fn check_range(&self, offset: u64, len: u64) -> bool {
        match self.size {
            Some(size) => offset
                .checked_add(len)
                .map(|end| end <= size)
                .unwrap_or(false),
            None => {
                if len == 0 {
                    return true;
                }
                self.source.read_at(offset + len - 1, 1).is_ok()
            }
        }
    }

    /// Parse the IFD at `offset`, returning it and the next-IFD offset that
    /// follows the entry table (0 for sub-IFDs and terminal links).
    fn parse_ifd(&mut self, offset: u64, nesting: Nesting) -> Result<(Ifd, u64), TiffError> {
        let order = self.byte_order;

        let count_bytes = self.source.read_at(offset, self.count_field_len())?;
        let entry_count = if self.bigtiff {
            order.read_u64(&count_bytes)
        } else {
            order.read_u16(&count_bytes) as u64
        };

        let mut entries: Vec<Entry> = Vec::new();
        let mut pos = offset + self.count_field_len() as u64;
        let mut table_intact = true;

        for index in 0..entry_count {
            let record = match self.source.read_at(pos, self.entry_len()) {
                Ok(bytes) => bytes,
                Err(_) => {
                    warn!(
                        offset,
                        index, "entry table truncated, keeping entries parsed so far"
                    );
                    table_intact = false;
                    break;
                }
            };
            pos += self.entry_len() as u64;

            let entry_tag = order.read_u16(&record[0..]);
            let type_code = order.read_u16(&record[2..]);
            let (value_count, value_field) = if self.bigtiff {
                (order.read_u64(&record[4..]), &record[12..20])
            } else {
                (order.read_u32(&record[4..]) as u64, &record[8..12])
            };

            if value_count > u32::MAX as u64 {
                warn!(
                    tag = entry_tag,
                    count = value_count,
                    "entry count exceeds the 32-bit limit, stopping IFD parse"
                );
                table_intact = false;
                break;
            }

            let Some(ty) = TiffType::from_u16(type_code) else {
                // Unknown types are skipped silently per the TIFF spec; the
                // inline value region was consumed with the record
                debug!(tag = entry_tag, type_code, "skipping entry of unknown type");
                continue;
            };

            if ty.is_bigtiff_only() && !self.bigtiff {
                let hint = order.read_u32(value_field) as u64;
                entries.push(Entry::raw(
                    entry_tag,
                    ty,
                    Value::Unknown {
                        type_code,
                        count: value_count,
                        offset: hint,
                    },
                ));
                continue;
            }

            let value_len = ty.size_in_bytes() as u64 * value_count;
            let value = if value_len <= self.offset_field_len() as u64 {
                // Inline; any remainder of the value field is padding
                decode_value(ty, value_count, &value_field[..value_len as usize], order)
            } else {
                let value_offset = if self.bigtiff {
                    order.read_u64(value_field)
                } else {
                    order.read_u32(value_field) as u64
                };
                self.read_offset_value(entry_tag, ty, type_code, value_count, value_len, value_offset)
            };

            entries.push(Entry::raw(entry_tag, ty, value));
        }

        let next = if table_intact && nesting == Nesting::Top {
            match self.source.read_at(pos, self.offset_field_len()) {
                Ok(bytes) => {
                    if self.bigtiff {
                        order.read_u64(&bytes)
                    } else {
                        order.read_u32(&bytes) as u64
                    }
                }
                Err(_) => {
                    debug!(offset, "missing next-IFD offset, ending chain");
                    0
                }
            }
        } else {
            0
        };

        self.resolve_sub_ifds(&mut entries, nesting);

        Ok((Ifd::new(entries), next))
    }

    /// Fetch and decode an out-of-line value, degrading to an unreadable
    /// marker when the target range is invalid or truncated.
    fn read_offset_value(
        &self,
        entry_tag: u16,
        ty: TiffType,
        type_code: u16,
        count: u64,
        value_len: u64,
        value_offset: u64,
    ) -> Value {
        if !self.check_range(value_offset, value_len) {
            warn!(
                tag = entry_tag,
                offset = value_offset,
                len = value_len,
                "value offset out of bounds"
            );
            return Value::Unreadable {
                type_code,
                count,
                offset: value_offset,
            };
        }
        match self.source.read_at(value_offset, value_len as usize) {
            Ok(bytes) => decode_value(ty, count, &bytes, self.byte_order),
            Err(error) => {
                warn!(tag = entry_tag, offset = value_offset, %error, "value truncated");
                Value::Unreadable {
                    type_code,
                    count,
                    offset: value_offset,
                }
            }
        }
    }

    /// Replace pointer entries with their parsed sub-directories.
    ///
    /// Runs after the main entry loop so the IFD is built bottom-up; a
    /// pointer that cannot be followed keeps its raw numeric value.
    fn resolve_sub_ifds(&mut self, entries: &mut [Entry], nesting: Nesting) {
        for entry in entries.iter_mut() {
            if !nesting.pointer_tags().contains(&entry.tag()) {
                continue;
            }

            let offsets: Vec<u64> = match entry.value() {
                Value::Long(v) => vec![*v as u64],
                Value::LongList(v) => v.iter().map(|&o| o as u64).collect(),
                Value::Long8(v) => vec![*v],
                Value::Long8List(v) => v.clone(),
                _ => continue,
            };
            if offsets.is_empty() {
                continue;
            }

            let child = nesting.child(entry.tag());
            let mut parsed = Vec::with_capacity(offsets.len());
            let mut complete = true;
            for &sub_offset in &offsets {
                if sub_offset == 0 || !self.visited.insert(sub_offset) {
                    warn!(
                        tag = entry.tag(),
                        offset = sub_offset,
                        "invalid or cyclic sub-IFD pointer"
                    );
                    complete = false;
                    break;
                }
                if !self.check_range(sub_offset, self.count_field_len() as u64) {
                    warn!(
                        tag = entry.tag(),
                        offset = sub_offset,
                        "sub-IFD offset out of bounds"
                    );
                    complete = false;
                    break;
                }
                match self.parse_ifd(sub_offset, child) {
                    Ok((ifd, _)) => parsed.push(ifd),
                    Err(error) => {
                        warn!(tag = entry.tag(), offset = sub_offset, %error, "unreadable sub-IFD");
                        complete = false;
                        break;
                    }
                }
            }

            if complete {
                let value = if offsets.len() == 1 {
                    Value::Directory(parsed.into_iter().next().unwrap_or_default())
                } else {
                    Value::DirectoryList(parsed)
                };
                entry.replace_value(value);
            }
        }
    }
}

// =============================================================================
// Value decoding
// =============================================================================

/// Decode a raw value of `count` elements.
///
/// Count-1 numeric values decode to scalars, larger counts to lists. BYTE,
/// SBYTE and UNDEFINED arrays stay byte arrays. ASCII splits on embedded
/// NULs after trimming a single trailing NUL. A zero rational denominator
/// becomes the NaN sentinel rather than an error.
fn decode_value(ty: TiffType, count: u64, bytes: &[u8], order: ByteOrder) -> Value {
    let count = count as usize;
    match ty {
        TiffType::Byte => {
            if count == 1 {
                Value::Byte(bytes[0])
            } else {
                Value::ByteList(bytes.to_vec())
            }
        }
        TiffType::SByte => {
            if count == 1 {
                Value::SByte(bytes[0] as i8)
            } else {
                Value::SByteList(bytes.iter().map(|&b| b as i8).collect())
            }
        }
        TiffType::Undefined => {
            if count == 1 {
                Value::Undefined(bytes[0])
            } else {
                Value::UndefinedList(bytes.to_vec())
            }
        }
        TiffType::Ascii => Value::Ascii(decode_ascii(bytes)),
        TiffType::Short => {
            if count == 1 {
                Value::Short(order.read_u16(bytes))
            } else {
                Value::ShortList((0..count).map(|i| order.read_u16(&bytes[i * 2..])).collect())
            }
        }
        TiffType::SShort => {
            if count == 1 {
                Value::SShort(order.read_u16(bytes) as i16)
            } else {
                Value::SShortList(
                    (0..count)
                        .map(|i| order.read_u16(&bytes[i * 2..]) as i16)
                        .collect(),
                )
            }
        }
        TiffType::Long | TiffType::Ifd => {
            if count == 1 {
                Value::Long(order.read_u32(bytes))
            } else {
                Value::LongList((0..count).map(|i| order.read_u32(&bytes[i * 4..])).collect())
            }
        }
        TiffType::SLong => {
            if count == 1 {
                Value::SLong(order.read_u32(bytes) as i32)
            } else {
                Value::SLongList(
                    (0..count)
                        .map(|i| order.read_u32(&bytes[i * 4..]) as i32)
                        .collect(),
                )
            }
        }
        TiffType::Float => {
            if count == 1 {
                Value::Float(order.read_f32(bytes))
            } else {
                Value::FloatList((0..count).map(|i| order.read_f32(&bytes[i * 4..])).collect())
            }
        }
        TiffType::Double => {
            if count == 1 {
                Value::Double(order.read_f64(bytes))
            } else {
                Value::DoubleList((0..count).map(|i| order.read_f64(&bytes[i * 8..])).collect())
            }
        }
        TiffType::Rational => {
            let read = |i: usize| {
                let numerator = order.read_u32(&bytes[i * 8..]);
                let denominator = order.read_u32(&bytes[i * 8 + 4..]);
                lenient_rational(numerator as i64, denominator as i64)
            };
            if count == 1 {
                Value::Rational(read(0))
            } else {
                Value::RationalList((0..count).map(read).collect())
            }
        }
        TiffType::SRational => {
            let read = |i: usize| {
                let numerator = order.read_u32(&bytes[i * 8..]) as i32;
                let denominator = order.read_u32(&bytes[i * 8 + 4..]) as i32;
                lenient_rational(numerator as i64, denominator as i64)
            };
            if count == 1 {
                Value::SRational(read(0))
            } else {
                Value::SRationalList((0..count).map(read).collect())
            }
        }
        TiffType::Long8 | TiffType::Ifd8 => {
            if count == 1 {
                Value::Long8(order.read_u64(bytes))
            } else {
                Value::Long8List((0..count).map(|i| order.read_u64(&bytes[i * 8..])).collect())
            }
        }
        TiffType::SLong8 => {
            if count == 1 {
                Value::SLong8(order.read_u64(bytes) as i64)
            } else {
                Value::SLong8List(
                    (0..count)
                        .map(|i| order.read_u64(&bytes[i * 8..]) as i64)
                        .collect(),
                )
            }
        }
    }
}

/// Decode a rational pair, mapping a zero denominator to the NaN sentinel.
fn lenient_rational(numerator: i64, denominator: i64) -> Rational {
    if denominator == 0 {
        Rational::NAN
    } else {
        Rational::new(numerator, denominator).unwrap_or(Rational::NAN)
    }
}

/// Split NUL-separated ASCII data into strings, trimming a single trailing
/// NUL first.
fn decode_ascii(bytes: &[u8]) -> Vec<String> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let trimmed = if bytes.last() == Some(&0) {
        &bytes[..bytes.len() - 1]
    } else {
        bytes
    };
    trimmed
        .split(|&b| b == 0)
        .map(|part| String::from_utf8_lossy(part).into_owned())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal hand-rolled classic TIFF builder for malformed-input tests.
    /// Well-formed streams are covered by the writer round-trip tests.
    struct RawTiff {
        bytes: Vec<u8>,
    }

    impl RawTiff {
        fn little_endian() -> Self {
            RawTiff {
                bytes: vec![0x49, 0x49, 0x2A, 0x00, 0x00, 0x00, 0x00, 0x00],
            }
        }

        fn set_first_ifd(&mut self, offset: u32) -> &mut Self {
            self.bytes[4..8].copy_from_slice(&offset.to_le_bytes());
            self
        }

        fn push_u16(&mut self, v: u16) -> &mut Self {
            self.bytes.extend_from_slice(&v.to_le_bytes());
            self
        }

        fn push_u32(&mut self, v: u32) -> &mut Self {
            self.bytes.extend_from_slice(&v.to_le_bytes());
            self
        }

        /// Append a classic IFD entry record.
        fn push_entry(&mut self, tag: u16, type_code: u16, count: u32, field: [u8; 4]) -> &mut Self {
            self.push_u16(tag);
            self.push_u16(type_code);
            self.push_u32(count);
            self.bytes.extend_from_slice(&field);
            self
        }
    }

    // -------------------------------------------------------------------------
    // Header errors are fatal
    // -------------------------------------------------------------------------

    #[test]
    fn test_bad_byte_order_mark() {
        let bytes = [0x00u8, 0x00, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        let result = TiffReader::new(&bytes[..]).read();
        assert!(matches!(result, Err(TiffError::InvalidByteOrder(0))));
    }

    #[test]
    fn test_bad_magic() {
        let bytes = [0x49u8, 0x49, 0x2C, 0x00, 0x08, 0x00, 0x00, 0x00];
        let result = TiffReader::new(&bytes[..]).read();
        assert!(matches!(result, Err(TiffError::InvalidMagic(44))));
    }

    #[test]
    fn test_bigtiff_bad_offset_size() {
        let bytes = [
            0x49u8, 0x49, 0x2B, 0x00, 0x04, 0x00, 0x00, 0x00, 0x10, 0, 0, 0, 0, 0, 0, 0,
        ];
        let result = TiffReader::new(&bytes[..]).read();
        assert!(matches!(result, Err(TiffError::InvalidOffsetSize(4))));
    }

    #[test]
    fn test_bigtiff_bad_padding() {
        let bytes = [
            0x49u8, 0x49, 0x2B, 0x00, 0x08, 0x00, 0x01, 0x00, 0x10, 0, 0, 0, 0, 0, 0, 0,
        ];
        let result = TiffReader::new(&bytes[..]).read();
        assert!(matches!(result, Err(TiffError::InvalidPadding(1))));
    }

    #[test]
    fn test_short_stream() {
        let bytes = [0x49u8, 0x49, 0x2A, 0x00];
        let result = TiffReader::new(&bytes[..]).read();
        assert!(matches!(result, Err(TiffError::ShortHeader { .. })));
    }

    // -------------------------------------------------------------------------
    // Content anomalies degrade gracefully
    // -------------------------------------------------------------------------

    #[test]
    fn test_first_ifd_offset_out_of_bounds() {
        let mut raw = RawTiff::little_endian();
        raw.set_first_ifd(0xFFFF);
        let directory = TiffReader::new(&raw.bytes[..]).read().unwrap();
        assert!(directory.is_empty());
    }

    #[test]
    fn test_simple_ifd_with_inline_values() {
        let mut raw = RawTiff::little_endian();
        raw.set_first_ifd(8);
        raw.push_u16(2); // entry count
        raw.push_entry(256, 3, 1, [0x20, 0x03, 0, 0]); // ImageWidth SHORT 800
        raw.push_entry(257, 3, 1, [0x58, 0x02, 0, 0]); // ImageLength SHORT 600
        raw.push_u32(0); // terminal next-IFD

        let directory = TiffReader::new(&raw.bytes[..]).read().unwrap();
        assert_eq!(directory.len(), 1);
        let ifd = directory.first().unwrap();
        assert_eq!(ifd.len(), 2);
        assert_eq!(ifd.entry(256).unwrap().value(), &Value::Short(800));
        assert_eq!(ifd.entry(257).unwrap().value(), &Value::Short(600));
    }

    #[test]
    fn test_unknown_type_skipped() {
        let mut raw = RawTiff::little_endian();
        raw.set_first_ifd(8);
        raw.push_u16(2);
        raw.push_entry(256, 3, 1, [0x20, 0x03, 0, 0]); // valid SHORT
        raw.push_entry(999, 99, 1, [0, 0, 0, 0]); // unknown type code
        raw.push_u32(0);

        let directory = TiffReader::new(&raw.bytes[..]).read().unwrap();
        let ifd = directory.first().unwrap();
        assert_eq!(ifd.len(), 1);
        assert!(ifd.entry(999).is_none());
    }

    #[test]
    fn test_bigtiff_only_type_in_classic_becomes_unknown() {
        let mut raw = RawTiff::little_endian();
        raw.set_first_ifd(8);
        raw.push_u16(1);
        raw.push_entry(800, 16, 1, [0x40, 0, 0, 0]); // LONG8 in a classic stream
        raw.push_u32(0);

        let directory = TiffReader::new(&raw.bytes[..]).read().unwrap();
        let entry = directory.first().unwrap().entry(800).unwrap();
        assert_eq!(entry.tiff_type(), TiffType::Long8);
        assert_eq!(
            entry.value(),
            &Value::Unknown {
                type_code: 16,
                count: 1,
                offset: 0x40,
            }
        );
    }

    #[test]
    fn test_truncated_value_becomes_unreadable() {
        let mut raw = RawTiff::little_endian();
        raw.set_first_ifd(8);
        raw.push_u16(1);
        // 4 SHORTs at offset 200, far past the end of the stream
        raw.push_entry(258, 3, 4, [0xC8, 0, 0, 0]);
        raw.push_u32(0);

        let directory = TiffReader::new(&raw.bytes[..]).read().unwrap();
        let entry = directory.first().unwrap().entry(258).unwrap();
        assert!(matches!(entry.value(), Value::Unreadable { offset: 200, .. }));
    }

    #[test]
    fn test_truncated_entry_table_keeps_parsed_entries() {
        let mut raw = RawTiff::little_endian();
        raw.set_first_ifd(8);
        raw.push_u16(5); // claims five entries
        raw.push_entry(256, 3, 1, [0x20, 0x03, 0, 0]);
        raw.push_entry(257, 3, 1, [0x58, 0x02, 0, 0]);
        // Stream ends mid-table

        let directory = TiffReader::new(&raw.bytes[..]).read().unwrap();
        let ifd = directory.first().unwrap();
        assert_eq!(ifd.len(), 2);
        assert_eq!(ifd.entry(256).unwrap().value(), &Value::Short(800));
    }

    #[test]
    fn test_cyclic_ifd_chain_stops() {
        let mut raw = RawTiff::little_endian();
        raw.set_first_ifd(8);
        raw.push_u16(1);
        raw.push_entry(256, 3, 1, [0x20, 0x03, 0, 0]);
        raw.push_u32(8); // next-IFD points back at itself

        let directory = TiffReader::new(&raw.bytes[..]).read().unwrap();
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_out_of_line_value() {
        let mut raw = RawTiff::little_endian();
        raw.set_first_ifd(8);
        raw.push_u16(1);
        raw.push_entry(258, 3, 4, [0x1A, 0, 0, 0]); // 4 SHORTs at offset 26
        raw.push_u32(0);
        // Value data at offset 26
        for v in [8u16, 8, 8, 8] {
            raw.push_u16(v);
        }

        let directory = TiffReader::new(&raw.bytes[..]).read().unwrap();
        let entry = directory.first().unwrap().entry(258).unwrap();
        assert_eq!(entry.value(), &Value::ShortList(vec![8, 8, 8, 8]));
    }

    #[test]
    fn test_ascii_value_with_embedded_nul() {
        let mut raw = RawTiff::little_endian();
        raw.set_first_ifd(8);
        raw.push_u16(1);
        raw.push_entry(270, 2, 8, [0x1A, 0, 0, 0]); // 8 ASCII bytes at offset 26
        raw.push_u32(0);
        raw.bytes.extend_from_slice(b"ab\0cde\0\0");

        let directory = TiffReader::new(&raw.bytes[..]).read().unwrap();
        let entry = directory.first().unwrap().entry(270).unwrap();
        assert_eq!(
            entry.value(),
            &Value::Ascii(vec!["ab".to_string(), "cde".to_string(), String::new()])
        );
    }

    #[test]
    fn test_rational_zero_denominator_is_nan() {
        let mut raw = RawTiff::little_endian();
        raw.set_first_ifd(8);
        raw.push_u16(1);
        raw.push_entry(282, 5, 1, [0x1A, 0, 0, 0]); // RATIONAL at offset 26
        raw.push_u32(0);
        raw.push_u32(72); // numerator
        raw.push_u32(0); // zero denominator

        let directory = TiffReader::new(&raw.bytes[..]).read().unwrap();
        let entry = directory.first().unwrap().entry(282).unwrap();
        match entry.value() {
            Value::Rational(r) => assert!(r.is_nan()),
            other => panic!("expected rational, got {other:?}"),
        }
    }

    #[test]
    fn test_sub_ifd_resolution() {
        // Main IFD at 8 with a SubIFD pointer entry; child IFD at 26
        let mut raw = RawTiff::little_endian();
        raw.set_first_ifd(8);
        raw.push_u16(1);
        raw.push_entry(tag::SUB_IFD, 4, 1, [0x1A, 0, 0, 0]); // LONG pointer to 26
        raw.push_u32(0);
        // Child IFD
        raw.push_u16(1);
        raw.push_entry(256, 3, 1, [0x64, 0, 0, 0]); // width 100
        raw.push_u32(0);

        let directory = TiffReader::new(&raw.bytes[..]).read().unwrap();
        let entry = directory.first().unwrap().entry(tag::SUB_IFD).unwrap();
        match entry.value() {
            Value::Directory(child) => {
                assert_eq!(child.entry(256).unwrap().value(), &Value::Short(100));
            }
            other => panic!("expected resolved sub-IFD, got {other:?}"),
        }
    }

    #[test]
    fn test_sub_ifd_cycle_keeps_pointer() {
        // SubIFD pointer back at the main IFD offset
        let mut raw = RawTiff::little_endian();
        raw.set_first_ifd(8);
        raw.push_u16(1);
        raw.push_entry(tag::SUB_IFD, 4, 1, [0x08, 0, 0, 0]);
        raw.push_u32(0);

        let directory = TiffReader::new(&raw.bytes[..]).read().unwrap();
        let entry = directory.first().unwrap().entry(tag::SUB_IFD).unwrap();
        // Pointer not replaced; raw value preserved
        assert_eq!(entry.value(), &Value::Long(8));
    }

    #[test]
    fn test_multiple_linked_ifds() {
        let mut raw = RawTiff::little_endian();
        raw.set_first_ifd(8);
        // First IFD at 8
        raw.push_u16(1);
        raw.push_entry(256, 3, 1, [0x64, 0, 0, 0]);
        raw.push_u32(26); // next IFD at 26
        // Second IFD at 26
        raw.push_u16(1);
        raw.push_entry(256, 3, 1, [0x32, 0, 0, 0]);
        raw.push_u32(0);

        let directory = TiffReader::new(&raw.bytes[..]).read().unwrap();
        assert_eq!(directory.len(), 2);
        assert_eq!(
            directory.ifds()[0].entry(256).unwrap().value(),
            &Value::Short(100)
        );
        assert_eq!(
            directory.ifds()[1].entry(256).unwrap().value(),
            &Value::Short(50)
        );
    }

    // -------------------------------------------------------------------------
    // Ascii decoding
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_ascii_trailing_nul() {
        assert_eq!(decode_ascii(b"abc\0"), vec!["abc".to_string()]);
        assert_eq!(decode_ascii(b"abc"), vec!["abc".to_string()]);
        assert_eq!(decode_ascii(b""), Vec::<String>::new());
        assert_eq!(decode_ascii(b"\0"), vec![String::new()]);
    }
}
