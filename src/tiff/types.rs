//! TIFF type and tag vocabulary.
//!
//! This module defines the building blocks shared by the reader and writer:
//! - Field types and the fixed type-length table
//! - Byte order helpers for reading and writing multi-byte values
//! - Well-known tag ids and a swappable tag-name lookup
//!
//! Tag ids deliberately stay an open integer space (`u16`) rather than a
//! closed enum: the TIFF/EXIF tag space is large and extensible with vendor
//! private tags, and new tags must not require changes to the codec.

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a TIFF stream.
///
/// TIFF streams declare their byte order in the first two bytes of the
/// header. All multi-byte values must be read and written respecting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 from the start of a byte slice using this byte order.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes([bytes[0], bytes[1]]),
            ByteOrder::BigEndian => u16::from_be_bytes([bytes[0], bytes[1]]),
        }
    }

    /// Read a u32 from the start of a byte slice using this byte order.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        let b = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(b),
            ByteOrder::BigEndian => u32::from_be_bytes(b),
        }
    }

    /// Read a u64 from the start of a byte slice using this byte order.
    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        let b = [
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ];
        match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(b),
            ByteOrder::BigEndian => u64::from_be_bytes(b),
        }
    }

    /// Read an f32 from the start of a byte slice using this byte order.
    #[inline]
    pub fn read_f32(self, bytes: &[u8]) -> f32 {
        f32::from_bits(self.read_u32(bytes))
    }

    /// Read an f64 from the start of a byte slice using this byte order.
    #[inline]
    pub fn read_f64(self, bytes: &[u8]) -> f64 {
        f64::from_bits(self.read_u64(bytes))
    }

    /// Append a u16 to a byte buffer using this byte order.
    #[inline]
    pub fn put_u16(self, out: &mut Vec<u8>, value: u16) {
        match self {
            ByteOrder::LittleEndian => out.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::BigEndian => out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    /// Append a u32 to a byte buffer using this byte order.
    #[inline]
    pub fn put_u32(self, out: &mut Vec<u8>, value: u32) {
        match self {
            ByteOrder::LittleEndian => out.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::BigEndian => out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    /// Append a u64 to a byte buffer using this byte order.
    #[inline]
    pub fn put_u64(self, out: &mut Vec<u8>, value: u64) {
        match self {
            ByteOrder::LittleEndian => out.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::BigEndian => out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    /// Append an f32 to a byte buffer using this byte order.
    #[inline]
    pub fn put_f32(self, out: &mut Vec<u8>, value: f32) {
        self.put_u32(out, value.to_bits());
    }

    /// Append an f64 to a byte buffer using this byte order.
    #[inline]
    pub fn put_f64(self, out: &mut Vec<u8>, value: f64) {
        self.put_u64(out, value.to_bits());
    }
}

// =============================================================================
// TiffType
// =============================================================================

/// TIFF field types and their encoding widths.
///
/// The length table is fixed by the TIFF 6.0 and BigTIFF specifications and
/// is public: it determines whether a value fits inline in an IFD entry and
/// how arrays are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TiffType {
    /// Unsigned 8-bit integer
    Byte = 1,
    /// NUL-terminated 7-bit ASCII text
    Ascii = 2,
    /// Unsigned 16-bit integer
    Short = 3,
    /// Unsigned 32-bit integer
    Long = 4,
    /// Two LONGs: unsigned numerator, denominator
    Rational = 5,
    /// Signed 8-bit integer
    SByte = 6,
    /// Opaque byte data
    Undefined = 7,
    /// Signed 16-bit integer
    SShort = 8,
    /// Signed 32-bit integer
    SLong = 9,
    /// Two SLONGs: signed numerator, denominator
    SRational = 10,
    /// IEEE-754 single precision
    Float = 11,
    /// IEEE-754 double precision
    Double = 12,
    /// 32-bit offset to a nested IFD
    Ifd = 13,
    /// Unsigned 64-bit integer (BigTIFF only)
    Long8 = 16,
    /// Signed 64-bit integer (BigTIFF only)
    SLong8 = 17,
    /// 64-bit offset to a nested IFD (BigTIFF only)
    Ifd8 = 18,
}

impl TiffType {
    /// Size of a single value of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            TiffType::Byte | TiffType::Ascii | TiffType::SByte | TiffType::Undefined => 1,
            TiffType::Short | TiffType::SShort => 2,
            TiffType::Long | TiffType::SLong | TiffType::Float | TiffType::Ifd => 4,
            TiffType::Rational
            | TiffType::SRational
            | TiffType::Double
            | TiffType::Long8
            | TiffType::SLong8
            | TiffType::Ifd8 => 8,
        }
    }

    /// Create a TiffType from its numeric type code.
    ///
    /// Returns `None` for unrecognized codes. Per the TIFF specification an
    /// unknown type is not an error; the entry is silently skipped.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(TiffType::Byte),
            2 => Some(TiffType::Ascii),
            3 => Some(TiffType::Short),
            4 => Some(TiffType::Long),
            5 => Some(TiffType::Rational),
            6 => Some(TiffType::SByte),
            7 => Some(TiffType::Undefined),
            8 => Some(TiffType::SShort),
            9 => Some(TiffType::SLong),
            10 => Some(TiffType::SRational),
            11 => Some(TiffType::Float),
            12 => Some(TiffType::Double),
            13 => Some(TiffType::Ifd),
            16 => Some(TiffType::Long8),
            17 => Some(TiffType::SLong8),
            18 => Some(TiffType::Ifd8),
            _ => None,
        }
    }

    /// Get the numeric type code.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Whether this type only exists in BigTIFF streams.
    ///
    /// These types decode to opaque placeholders in classic streams and are
    /// rejected by the classic writer.
    #[inline]
    pub const fn is_bigtiff_only(self) -> bool {
        matches!(self, TiffType::Long8 | TiffType::SLong8 | TiffType::Ifd8)
    }

    /// Whether entries of this type point to nested IFDs.
    #[inline]
    pub const fn is_ifd_pointer(self) -> bool {
        matches!(self, TiffType::Ifd | TiffType::Ifd8)
    }

    /// Check if a value of this type and count fits inline in an IFD entry.
    ///
    /// The inline threshold equals the offset-field width: 4 bytes for
    /// classic TIFF, 8 bytes for BigTIFF.
    #[inline]
    pub fn fits_inline(self, count: u64, bigtiff: bool) -> bool {
        let threshold = if bigtiff { 8 } else { 4 };
        (self.size_in_bytes() as u64).saturating_mul(count) <= threshold
    }
}

// =============================================================================
// Well-known tags
// =============================================================================

/// Tags whose values are offsets to nested IFDs at the top level.
pub mod tag {
    /// Image width in pixels
    pub const IMAGE_WIDTH: u16 = 256;
    /// Image height in pixels
    pub const IMAGE_LENGTH: u16 = 257;
    /// Bits per sample
    pub const BITS_PER_SAMPLE: u16 = 258;
    /// Compression scheme
    pub const COMPRESSION: u16 = 259;
    /// Photometric interpretation
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;
    /// Description string
    pub const IMAGE_DESCRIPTION: u16 = 270;
    /// Scanner manufacturer
    pub const MAKE: u16 = 271;
    /// Scanner model
    pub const MODEL: u16 = 272;
    /// Strip byte offsets
    pub const STRIP_OFFSETS: u16 = 273;
    /// Samples per pixel
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    /// Rows per strip
    pub const ROWS_PER_STRIP: u16 = 278;
    /// Strip byte counts
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    /// Pixels per resolution unit, X
    pub const X_RESOLUTION: u16 = 282;
    /// Pixels per resolution unit, Y
    pub const Y_RESOLUTION: u16 = 283;
    /// Software name
    pub const SOFTWARE: u16 = 305;
    /// Creation date/time
    pub const DATE_TIME: u16 = 306;
    /// Offsets to child IFDs (reduced resolution images, etc.)
    pub const SUB_IFD: u16 = 330;
    /// Tile width in pixels
    pub const TILE_WIDTH: u16 = 322;
    /// Tile height in pixels
    pub const TILE_LENGTH: u16 = 323;
    /// Tile byte offsets
    pub const TILE_OFFSETS: u16 = 324;
    /// Tile byte counts
    pub const TILE_BYTE_COUNTS: u16 = 325;
    /// Offset to the EXIF IFD
    pub const EXIF_IFD: u16 = 34665;
    /// Offset to the GPS IFD
    pub const GPS_IFD: u16 = 34853;
    /// Offset to the EXIF interoperability IFD (nested under the EXIF IFD)
    pub const INTEROP_IFD: u16 = 40965;
}

/// Human-readable name for a tag id, if known.
///
/// This is a lookup aid for diagnostics and metadata rendering only; the
/// codec itself never depends on it. Unknown tags simply have no name.
pub fn tag_name(id: u16) -> Option<&'static str> {
    let name = match id {
        tag::IMAGE_WIDTH => "ImageWidth",
        tag::IMAGE_LENGTH => "ImageLength",
        tag::BITS_PER_SAMPLE => "BitsPerSample",
        tag::COMPRESSION => "Compression",
        tag::PHOTOMETRIC_INTERPRETATION => "PhotometricInterpretation",
        tag::IMAGE_DESCRIPTION => "ImageDescription",
        tag::MAKE => "Make",
        tag::MODEL => "Model",
        tag::STRIP_OFFSETS => "StripOffsets",
        tag::SAMPLES_PER_PIXEL => "SamplesPerPixel",
        tag::ROWS_PER_STRIP => "RowsPerStrip",
        tag::STRIP_BYTE_COUNTS => "StripByteCounts",
        tag::X_RESOLUTION => "XResolution",
        tag::Y_RESOLUTION => "YResolution",
        tag::SOFTWARE => "Software",
        tag::DATE_TIME => "DateTime",
        tag::SUB_IFD => "SubIFDs",
        tag::TILE_WIDTH => "TileWidth",
        tag::TILE_LENGTH => "TileLength",
        tag::TILE_OFFSETS => "TileOffsets",
        tag::TILE_BYTE_COUNTS => "TileByteCounts",
        tag::EXIF_IFD => "ExifIFD",
        tag::GPS_IFD => "GPSIFD",
        tag::INTEROP_IFD => "InteropIFD",
        _ => return None,
    };
    Some(name)
}

// =============================================================================
// Tests
// =============================================================================
