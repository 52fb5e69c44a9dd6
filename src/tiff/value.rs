//! Entry values and type inference.
//!
//! An IFD entry value is one of several shapes: a scalar numeric, a numeric
//! array, one or more strings, a nested directory, an opaque byte array, or
//! a structured marker for data that could not be decoded. [`Value`] models
//! this as a tagged union validated against the entry's TIFF type code at
//! construction, rather than an untyped "any" value.
//!
//! # Scalar narrowing
//!
//! When no explicit type is given, [`Entry::new`] guesses the smallest TIFF
//! type able to represent the value. Scalars narrow (a `Short(200)` becomes
//! BYTE, a `Long(1000)` becomes SHORT) but arrays never do: array-valued
//! entries usually carry binary payloads whose declared width is
//! significant, so a `ShortList` stays SHORT no matter how small its
//! elements. This asymmetry is intentional and load-bearing for round-trip
//! stability; do not generalize it.

use super::ifd::Ifd;
use super::rational::Rational;
use super::types::{tag_name, TiffType};
use crate::error::TiffError;

// =============================================================================
// Value
// =============================================================================

/// The value of an IFD entry.
///
/// Scalar and list shapes are distinct variants: a count-1 entry decodes to
/// the scalar form, anything larger to the list form. BYTE, SBYTE and
/// UNDEFINED arrays stay byte arrays (they usually carry binary payloads and
/// are never widened).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Single unsigned byte
    Byte(u8),
    /// Unsigned byte array
    ByteList(Vec<u8>),
    /// One or more NUL-separated strings
    Ascii(Vec<String>),
    /// Single unsigned 16-bit integer
    Short(u16),
    /// Unsigned 16-bit array
    ShortList(Vec<u16>),
    /// Single unsigned 32-bit integer
    Long(u32),
    /// Unsigned 32-bit array
    LongList(Vec<u32>),
    /// Single rational
    Rational(Rational),
    /// Rational array
    RationalList(Vec<Rational>),
    /// Single signed byte
    SByte(i8),
    /// Signed byte array
    SByteList(Vec<i8>),
    /// Single opaque byte
    Undefined(u8),
    /// Opaque byte array
    UndefinedList(Vec<u8>),
    /// Single signed 16-bit integer
    SShort(i16),
    /// Signed 16-bit array
    SShortList(Vec<i16>),
    /// Single signed 32-bit integer
    SLong(i32),
    /// Signed 32-bit array
    SLongList(Vec<i32>),
    /// Single signed rational
    SRational(Rational),
    /// Signed rational array
    SRationalList(Vec<Rational>),
    /// Single precision float
    Float(f32),
    /// Single precision array
    FloatList(Vec<f32>),
    /// Double precision float
    Double(f64),
    /// Double precision array
    DoubleList(Vec<f64>),
    /// Single unsigned 64-bit integer (BigTIFF)
    Long8(u64),
    /// Unsigned 64-bit array (BigTIFF)
    Long8List(Vec<u64>),
    /// Single signed 64-bit integer (BigTIFF)
    SLong8(i64),
    /// Signed 64-bit array (BigTIFF)
    SLong8List(Vec<i64>),
    /// A resolved nested directory
    Directory(Ifd),
    /// Multiple resolved nested directories
    DirectoryList(Vec<Ifd>),
    /// A value that is structurally valid but not decodable in this stream
    /// mode (for example a LONG8 in a classic stream)
    Unknown {
        /// Raw type code from the entry
        type_code: u16,
        /// Declared element count
        count: u64,
        /// Stream offset of the value, or 0 if it was inline
        offset: u64,
    },
    /// A value whose bytes could not be read (truncated or out of bounds)
    Unreadable {
        /// Raw type code from the entry
        type_code: u16,
        /// Declared element count
        count: u64,
        /// Stream offset the value pointed to
        offset: u64,
    },
}

impl Value {
    /// The element count this value occupies in an entry.
    ///
    /// ASCII values count bytes: each string contributes its encoded length
    /// plus one NUL terminator. This rule must match the writer's size
    /// computation exactly for offset math to stay consistent.
    pub fn count(&self) -> u64 {
        match self {
            Value::Byte(_)
            | Value::Short(_)
            | Value::Long(_)
            | Value::Rational(_)
            | Value::SByte(_)
            | Value::Undefined(_)
            | Value::SShort(_)
            | Value::SLong(_)
            | Value::SRational(_)
            | Value::Float(_)
            | Value::Double(_)
            | Value::Long8(_)
            | Value::SLong8(_)
            | Value::Directory(_) => 1,
            Value::ByteList(v) => v.len() as u64,
            Value::UndefinedList(v) => v.len() as u64,
            Value::SByteList(v) => v.len() as u64,
            Value::ShortList(v) => v.len() as u64,
            Value::SShortList(v) => v.len() as u64,
            Value::LongList(v) => v.len() as u64,
            Value::SLongList(v) => v.len() as u64,
            Value::Long8List(v) => v.len() as u64,
            Value::SLong8List(v) => v.len() as u64,
            Value::RationalList(v) => v.len() as u64,
            Value::SRationalList(v) => v.len() as u64,
            Value::FloatList(v) => v.len() as u64,
            Value::DoubleList(v) => v.len() as u64,
            Value::DirectoryList(v) => v.len() as u64,
            Value::Ascii(strings) => strings.iter().map(|s| s.len() as u64 + 1).sum(),
            Value::Unknown { count, .. } | Value::Unreadable { count, .. } => *count,
        }
    }

    /// Infer the smallest TIFF type able to represent this value.
    ///
    /// Scalars narrow down the unsigned chain; lists keep their declared
    /// width. Returns `None` for marker values, which have no inferable
    /// encoding.
    pub fn infer_type(&self) -> Option<TiffType> {
        let ty = match self {
            Value::Byte(_) | Value::ByteList(_) => TiffType::Byte,
            Value::Ascii(_) => TiffType::Ascii,
            Value::Short(v) if *v <= u8::MAX as u16 => TiffType::Byte,
            Value::Short(_) | Value::ShortList(_) => TiffType::Short,
            Value::Long(v) if *v <= u16::MAX as u32 => TiffType::Short,
            Value::Long(_) | Value::LongList(_) => TiffType::Long,
            Value::Long8(v) if *v <= u32::MAX as u64 => TiffType::Long,
            Value::Long8(_) | Value::Long8List(_) => TiffType::Long8,
            Value::Rational(_) | Value::RationalList(_) => TiffType::Rational,
            Value::SByte(_) | Value::SByteList(_) => TiffType::SByte,
            Value::Undefined(_) | Value::UndefinedList(_) => TiffType::Undefined,
            Value::SShort(_) | Value::SShortList(_) => TiffType::SShort,
            Value::SLong(_) | Value::SLongList(_) => TiffType::SLong,
            Value::SLong8(_) | Value::SLong8List(_) => TiffType::SLong8,
            Value::SRational(_) | Value::SRationalList(_) => TiffType::SRational,
            Value::Float(_) | Value::FloatList(_) => TiffType::Float,
            Value::Double(_) | Value::DoubleList(_) => TiffType::Double,
            Value::Directory(_) | Value::DirectoryList(_) => TiffType::Ifd,
            Value::Unknown { .. } | Value::Unreadable { .. } => return None,
        };
        Some(ty)
    }

    /// Whether this value shape can be encoded as the given type.
    ///
    /// Accepts the narrowing combinations produced by [`Value::infer_type`]
    /// (a `Short` scalar under BYTE, a `Long` under SHORT, and so on) and
    /// unresolved numeric pointers under the IFD types.
    pub fn matches(&self, ty: TiffType) -> bool {
        match ty {
            TiffType::Byte => matches!(self, Value::Byte(_) | Value::ByteList(_))
                || matches!(self, Value::Short(v) if *v <= u8::MAX as u16),
            TiffType::Ascii => matches!(self, Value::Ascii(_)),
            TiffType::Short => matches!(self, Value::Short(_) | Value::ShortList(_))
                || matches!(self, Value::Long(v) if *v <= u16::MAX as u32),
            TiffType::Long => matches!(self, Value::Long(_) | Value::LongList(_))
                || matches!(self, Value::Long8(v) if *v <= u32::MAX as u64),
            TiffType::Rational => matches!(self, Value::Rational(_) | Value::RationalList(_)),
            TiffType::SByte => matches!(self, Value::SByte(_) | Value::SByteList(_)),
            TiffType::Undefined => matches!(self, Value::Undefined(_) | Value::UndefinedList(_)),
            TiffType::SShort => matches!(self, Value::SShort(_) | Value::SShortList(_)),
            TiffType::SLong => matches!(self, Value::SLong(_) | Value::SLongList(_)),
            TiffType::SRational => matches!(self, Value::SRational(_) | Value::SRationalList(_)),
            TiffType::Float => matches!(self, Value::Float(_) | Value::FloatList(_)),
            TiffType::Double => matches!(self, Value::Double(_) | Value::DoubleList(_)),
            TiffType::Ifd => matches!(
                self,
                Value::Directory(_) | Value::DirectoryList(_) | Value::Long(_) | Value::LongList(_)
            ),
            TiffType::Long8 => matches!(
                self,
                Value::Long8(_) | Value::Long8List(_) | Value::Long(_) | Value::LongList(_)
            ),
            TiffType::SLong8 => matches!(self, Value::SLong8(_) | Value::SLong8List(_)),
            TiffType::Ifd8 => matches!(
                self,
                Value::Directory(_)
                    | Value::DirectoryList(_)
                    | Value::Long8(_)
                    | Value::Long8List(_)
            ),
        }
    }
}

// =============================================================================
// Entry
// =============================================================================

/// A single IFD entry: tag id, type code, and value.
///
/// Tag ids are plain integers, not an enum; the tag space is open and
/// vendor-extensible. Use [`Entry::name`] for a best-effort human-readable
/// name.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    tag: u16,
    ty: TiffType,
    value: Value,
}

impl Entry {
    /// Create an entry, inferring the TIFF type from the value shape.
    ///
    /// See the module docs for the scalar-only narrowing rules. Fails for
    /// marker values, which cannot be re-encoded.
    pub fn new(tag: u16, value: Value) -> Result<Self, TiffError> {
        let ty = value
            .infer_type()
            .ok_or(TiffError::UnencodableValue { tag })?;
        Ok(Entry { tag, ty, value })
    }

    /// Create an entry with an explicit TIFF type.
    ///
    /// The value shape is validated against the type; a mismatch is a
    /// construction error, not a deferred write error.
    pub fn with_type(tag: u16, ty: TiffType, value: Value) -> Result<Self, TiffError> {
        if matches!(value, Value::Unknown { .. } | Value::Unreadable { .. }) {
            return Err(TiffError::UnencodableValue { tag });
        }
        if !value.matches(ty) {
            return Err(TiffError::TypeMismatch { tag, ty });
        }
        Ok(Entry { tag, ty, value })
    }

    /// Create an entry without validation. Reader internal: marker values
    /// and mode-dependent combinations come through here.
    pub(crate) fn raw(tag: u16, ty: TiffType, value: Value) -> Self {
        Entry { tag, ty, value }
    }

    /// The tag id.
    #[inline]
    pub fn tag(&self) -> u16 {
        self.tag
    }

    /// The TIFF type code.
    #[inline]
    pub fn tiff_type(&self) -> TiffType {
        self.ty
    }

    /// The value.
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consume the entry, returning its value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// The element count, derived from the value.
    #[inline]
    pub fn count(&self) -> u64 {
        self.value.count()
    }

    /// Human-readable tag name, if this is a well-known tag.
    pub fn name(&self) -> Option<&'static str> {
        tag_name(self.tag)
    }

    /// Replace the value, keeping tag and type. Reader internal, used when
    /// substituting parsed sub-directories for pointer entries.
    pub(crate) fn replace_value(&mut self, value: Value) {
        self.value = value;
    }
}

// =============================================================================
// Tests
// =============================================================================
