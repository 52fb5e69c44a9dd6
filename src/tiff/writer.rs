//! TIFF and BigTIFF metadata writing.
//!
//! The writer serializes a [`Directory`] to a spec-compliant byte stream.
//! Layout is computed in two passes per IFD: the total overflow data size is
//! known before the entry table is placed, because each IFD's data blocks
//! precede its table in the stream. The offset stored in the header (or in
//! the previous IFD's next-offset slot) therefore points past the data
//! region to the table itself.
//!
//! Entries are written in ascending tag order as the TIFF specification
//! requires; an unsorted input is re-sorted into a copy, never mutated.
//! Sub-IFDs serialize recursively into the parent's data region with the
//! same data-before-table shape, a trailing zero next-offset field, and no
//! chain slot of their own (the parent entry references them directly).
//!
//! Offsets are range-checked against the chosen offset width. Overflowing a
//! classic TIFF stream is a hard failure, never a silent BigTIFF upgrade.

use super::ifd::{Directory, Ifd};
use super::types::{ByteOrder, TiffType};
use super::value::{Entry, Value};
use crate::error::TiffError;

/// Magic number for classic TIFF
const MAGIC_TIFF: u16 = 42;

/// Magic number for BigTIFF
const MAGIC_BIGTIFF: u16 = 43;

// =============================================================================
// TiffWriter
// =============================================================================

/// Serializes directory structures to TIFF or BigTIFF bytes.
///
/// The writer is a pure transformer: it never mutates its input and holds
/// no state between calls.
#[derive(Debug, Clone, Copy)]
pub struct TiffWriter {
    bigtiff: bool,
    byte_order: ByteOrder,
}

impl TiffWriter {
    /// A classic TIFF writer (4-byte offsets, little-endian).
    pub fn classic() -> Self {
        TiffWriter {
            bigtiff: false,
            byte_order: ByteOrder::LittleEndian,
        }
    }

    /// A BigTIFF writer (8-byte offsets, little-endian).
    pub fn bigtiff() -> Self {
        TiffWriter {
            bigtiff: true,
            byte_order: ByteOrder::LittleEndian,
        }
    }

    /// Use the given byte order for all multi-byte values.
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Serialize a directory to bytes.
    pub fn write(&self, directory: &Directory) -> Result<Vec<u8>, TiffError> {
        let mut out = Vec::new();

        // Header
        match self.byte_order {
            ByteOrder::LittleEndian => out.extend_from_slice(b"II"),
            ByteOrder::BigEndian => out.extend_from_slice(b"MM"),
        }
        if self.bigtiff {
            self.byte_order.put_u16(&mut out, MAGIC_BIGTIFF);
            self.byte_order.put_u16(&mut out, 8);
            self.byte_order.put_u16(&mut out, 0);
        } else {
            self.byte_order.put_u16(&mut out, MAGIC_TIFF);
        }

        let ifds = directory.ifds();
        if ifds.is_empty() {
            self.put_offset(&mut out, 0)?;
            return Ok(out);
        }

        // The first IFD's data region starts right after the header, so the
        // header offset field can be computed up front
        let header_len = out.len() as u64 + self.offset_len() as u64;
        let mut planned = self.plan_ifd(&ifds[0], header_len)?;
        self.put_offset(&mut out, planned.table_pos)?;

        for index in 0..ifds.len() {
            out.extend_from_slice(&planned.data);
            out.extend_from_slice(&planned.table);

            if index + 1 < ifds.len() {
                // The next IFD's data region begins after this trailing slot
                let next_start = out.len() as u64 + self.offset_len() as u64;
                let next = self.plan_ifd(&ifds[index + 1], next_start)?;
                self.put_offset(&mut out, next.table_pos)?;
                planned = next;
            } else {
                self.put_offset(&mut out, 0)?;
            }
        }

        Ok(out)
    }

    /// Serialize a flat entry collection as a single-IFD directory.
    pub fn write_entries(&self, entries: &[Entry]) -> Result<Vec<u8>, TiffError> {
        self.write(&Directory::from_entries(entries.to_vec()))
    }

    // -------------------------------------------------------------------------
    // Layout
    // -------------------------------------------------------------------------

    fn offset_len(&self) -> usize {
        if self.bigtiff {
            8
        } else {
            4
        }
    }

    /// Range-check an absolute offset against the offset field width.
    fn check_offset(&self, offset: u64) -> Result<u64, TiffError> {
        if !self.bigtiff && offset > u32::MAX as u64 {
            return Err(TiffError::OffsetOverflow { offset, width: 4 });
        }
        Ok(offset)
    }

    /// Append an offset field of the configured width.
    fn put_offset(&self, out: &mut Vec<u8>, offset: u64) -> Result<(), TiffError> {
        self.check_offset(offset)?;
        if self.bigtiff {
            self.byte_order.put_u64(out, offset);
        } else {
            self.byte_order.put_u32(out, offset as u32);
        }
        Ok(())
    }

    /// Lay out one IFD whose overflow data region begins at `data_start`.
    ///
    /// Returns the materialized data region and entry table; the table
    /// lands at `data_start + data.len()`, which is the position callers
    /// must reference. The trailing next-offset slot is the caller's to
    /// write (chained for top-level IFDs, zero for sub-IFDs).
    fn plan_ifd(&self, ifd: &Ifd, data_start: u64) -> Result<PlannedIfd, TiffError> {
        // The TIFF specification requires ascending tag order; sort a copy
        let mut sorted: Vec<&Entry> = ifd.entries().iter().collect();
        sorted.sort_by_key(|entry| entry.tag());

        let mut data: Vec<u8> = Vec::new();
        let mut records: Vec<EntryRecord> = Vec::new();

        for entry in sorted {
            let ty = entry.tiff_type();
            if !self.bigtiff && ty.is_bigtiff_only() {
                return Err(TiffError::BigTiffOnlyType(ty));
            }

            let value_bytes = match entry.value() {
                Value::Directory(sub) => {
                    self.encode_sub_ifds(entry, std::slice::from_ref(sub), data_start, &mut data)?
                }
                Value::DirectoryList(subs) => {
                    self.encode_sub_ifds(entry, subs, data_start, &mut data)?
                }
                _ => self.encode_value(entry)?,
            };

            let field = if value_bytes.len() <= self.offset_len() {
                // Inline, padded to the field width
                let mut field = value_bytes;
                field.resize(self.offset_len(), 0);
                field
            } else {
                let value_offset = self.check_offset(data_start + data.len() as u64)?;
                data.extend_from_slice(&value_bytes);
                let mut field = Vec::with_capacity(self.offset_len());
                if self.bigtiff {
                    self.byte_order.put_u64(&mut field, value_offset);
                } else {
                    self.byte_order.put_u32(&mut field, value_offset as u32);
                }
                field
            };

            records.push(EntryRecord {
                tag: entry.tag(),
                type_code: ty.as_u16(),
                count: entry.count(),
                field,
            });
        }

        // Entry table: count field, then fixed-size records
        let mut table = Vec::new();
        if self.bigtiff {
            self.byte_order.put_u64(&mut table, records.len() as u64);
        } else {
            self.byte_order.put_u16(&mut table, records.len() as u16);
        }
        for record in &records {
            self.byte_order.put_u16(&mut table, record.tag);
            self.byte_order.put_u16(&mut table, record.type_code);
            if self.bigtiff {
                self.byte_order.put_u64(&mut table, record.count);
            } else {
                self.byte_order.put_u32(&mut table, record.count as u32);
            }
            table.extend_from_slice(&record.field);
        }

        let table_pos = self.check_offset(data_start + data.len() as u64)?;
        Ok(PlannedIfd {
            data,
            table,
            table_pos,
        })
    }

    /// Serialize sub-IFDs into the parent data region and return the encoded
    /// pointer value (one offset per sub-directory, at the entry's width).
    fn encode_sub_ifds(
        &self,
        entry: &Entry,
        subs: &[Ifd],
        data_start: u64,
        data: &mut Vec<u8>,
    ) -> Result<Vec<u8>, TiffError> {
        let ty = entry.tiff_type();
        let mut pointers = Vec::with_capacity(subs.len());

        for sub in subs {
            let sub_start = data_start + data.len() as u64;
            let planned = self.plan_ifd(sub, sub_start)?;
            pointers.push(planned.table_pos);
            data.extend_from_slice(&planned.data);
            data.extend_from_slice(&planned.table);
            // Sub-IFDs are not chained
            self.put_offset(data, 0)?;
        }

        let mut bytes = Vec::new();
        for pointer in pointers {
            match ty {
                TiffType::Ifd | TiffType::Long => {
                    let pointer = self.check_offset(pointer)?;
                    self.byte_order.put_u32(&mut bytes, pointer as u32);
                }
                TiffType::Ifd8 | TiffType::Long8 => self.byte_order.put_u64(&mut bytes, pointer),
                _ => {
                    return Err(TiffError::TypeMismatch {
                        tag: entry.tag(),
                        ty,
                    })
                }
            }
        }
        Ok(bytes)
    }

    // -------------------------------------------------------------------------
    // Value encoding
    // -------------------------------------------------------------------------

    /// Encode an entry value according to its declared type.
    ///
    /// Accepts the narrowed scalar combinations produced by type inference
    /// (a `Short` under BYTE and so on). ASCII strings each contribute their
    /// bytes plus a NUL terminator, matching [`Value::count`] exactly.
    fn encode_value(&self, entry: &Entry) -> Result<Vec<u8>, TiffError> {
        let order = self.byte_order;
        let mismatch = || TiffError::TypeMismatch {
            tag: entry.tag(),
            ty: entry.tiff_type(),
        };

        let mut out = Vec::new();
        match (entry.tiff_type(), entry.value()) {
            (TiffType::Byte, Value::Byte(v)) => out.push(*v),
            (TiffType::Byte, Value::ByteList(v)) => out.extend_from_slice(v),
            (TiffType::Byte, Value::Short(v)) if *v <= u8::MAX as u16 => out.push(*v as u8),

            (TiffType::Ascii, Value::Ascii(strings)) => {
                for s in strings {
                    out.extend_from_slice(s.as_bytes());
                    out.push(0);
                }
            }

            (TiffType::Short, Value::Short(v)) => order.put_u16(&mut out, *v),
            (TiffType::Short, Value::ShortList(v)) => {
                for item in v {
                    order.put_u16(&mut out, *item);
                }
            }
            (TiffType::Short, Value::Long(v)) if *v <= u16::MAX as u32 => {
                order.put_u16(&mut out, *v as u16)
            }

            (TiffType::Long, Value::Long(v)) => order.put_u32(&mut out, *v),
            (TiffType::Long, Value::LongList(v)) => {
                for item in v {
                    order.put_u32(&mut out, *item);
                }
            }
            (TiffType::Long, Value::Long8(v)) if *v <= u32::MAX as u64 => {
                order.put_u32(&mut out, *v as u32)
            }
            (TiffType::Ifd, Value::Long(v)) => order.put_u32(&mut out, *v),
            (TiffType::Ifd, Value::LongList(v)) => {
                for item in v {
                    order.put_u32(&mut out, *item);
                }
            }

            (TiffType::Rational, Value::Rational(r)) => {
                order.put_u32(&mut out, r.numerator() as u32);
                order.put_u32(&mut out, r.denominator() as u32);
            }
            (TiffType::Rational, Value::RationalList(list)) => {
                for r in list {
                    order.put_u32(&mut out, r.numerator() as u32);
                    order.put_u32(&mut out, r.denominator() as u32);
                }
            }
            (TiffType::SRational, Value::SRational(r)) => {
                order.put_u32(&mut out, r.numerator() as i32 as u32);
                order.put_u32(&mut out, r.denominator() as i32 as u32);
            }
            (TiffType::SRational, Value::SRationalList(list)) => {
                for r in list {
                    order.put_u32(&mut out, r.numerator() as i32 as u32);
                    order.put_u32(&mut out, r.denominator() as i32 as u32);
                }
            }

            (TiffType::SByte, Value::SByte(v)) => out.push(*v as u8),
            (TiffType::SByte, Value::SByteList(v)) => {
                out.extend(v.iter().map(|&item| item as u8))
            }
            (TiffType::Undefined, Value::Undefined(v)) => out.push(*v),
            (TiffType::Undefined, Value::UndefinedList(v)) => out.extend_from_slice(v),

            (TiffType::SShort, Value::SShort(v)) => order.put_u16(&mut out, *v as u16),
            (TiffType::SShort, Value::SShortList(v)) => {
                for item in v {
                    order.put_u16(&mut out, *item as u16);
                }
            }
            (TiffType::SLong, Value::SLong(v)) => order.put_u32(&mut out, *v as u32),
            (TiffType::SLong, Value::SLongList(v)) => {
                for item in v {
                    order.put_u32(&mut out, *item as u32);
                }
            }

            (TiffType::Float, Value::Float(v)) => order.put_f32(&mut out, *v),
            (TiffType::Float, Value::FloatList(v)) => {
                for item in v {
                    order.put_f32(&mut out, *item);
                }
            }
            (TiffType::Double, Value::Double(v)) => order.put_f64(&mut out, *v),
            (TiffType::Double, Value::DoubleList(v)) => {
                for item in v {
                    order.put_f64(&mut out, *item);
                }
            }

            (TiffType::Long8, Value::Long8(v)) => order.put_u64(&mut out, *v),
            (TiffType::Long8, Value::Long8List(v)) => {
                for item in v {
                    order.put_u64(&mut out, *item);
                }
            }
            (TiffType::Long8, Value::Long(v)) => order.put_u64(&mut out, *v as u64),
            (TiffType::Long8, Value::LongList(v)) => {
                for item in v {
                    order.put_u64(&mut out, *item as u64);
                }
            }
            (TiffType::Ifd8, Value::Long8(v)) => order.put_u64(&mut out, *v),
            (TiffType::Ifd8, Value::Long8List(v)) => {
                for item in v {
                    order.put_u64(&mut out, *item);
                }
            }
            (TiffType::SLong8, Value::SLong8(v)) => order.put_u64(&mut out, *v as u64),
            (TiffType::SLong8, Value::SLong8List(v)) => {
                for item in v {
                    order.put_u64(&mut out, *item as u64);
                }
            }

            (_, Value::Unknown { .. } | Value::Unreadable { .. }) => {
                return Err(TiffError::UnencodableValue { tag: entry.tag() })
            }
            _ => return Err(mismatch()),
        }
        Ok(out)
    }
}

/// One laid-out IFD: overflow data, entry table, and the table's absolute
/// position.
struct PlannedIfd {
    data: Vec<u8>,
    table: Vec<u8>,
    table_pos: u64,
}

/// A fixed-size entry record ready for the table.
struct EntryRecord {
    tag: u16,
    type_code: u16,
    count: u64,
    field: Vec<u8>,
}

// =============================================================================
// Tests
// =============================================================================
