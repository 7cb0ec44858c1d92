//! Element datatypes of container variables and attributes.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The element datatype of a variable or attribute.
///
/// Numeric values are stored little-endian in attribute buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
#[rustfmt::skip]
pub enum Datatype {
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    Int8,
    /// `uint8` Integer in `[0, 2^8-1]`.
    #[serde(rename = "uint8")]
    UInt8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    Int16,
    /// `uint16` Integer in `[0, 2^16-1]`.
    #[serde(rename = "uint16")]
    UInt16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    Int32,
    /// `uint32` Integer in `[0, 2^32-1]`.
    #[serde(rename = "uint32")]
    UInt32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    Int64,
    /// `uint64` Integer in `[0, 2^64-1]`.
    #[serde(rename = "uint64")]
    UInt64,
    /// `float32` IEEE 754 single-precision floating point.
    Float32,
    /// `float64` IEEE 754 double-precision floating point.
    Float64,
    /// A fixed-length string.
    FixedString,
    /// A variable-length string.
    VariableString,
    /// A compound (record) type.
    Compound,
    /// An object or region reference.
    Reference,
    /// A fixed-size array type.
    Array,
    /// An enumeration.
    Enum,
    /// An opaque byte sequence.
    Opaque,
    /// A bitfield.
    Bitfield,
    /// A time type.
    Time,
    /// A variable-length sequence of a base type.
    VariableLength,
    /// Any other type.
    Unsupported,
}

/// An unsupported datatype error.
#[derive(Debug, Error, From)]
#[error("datatype {_0} is unsupported")]
pub struct UnsupportedDatatypeError(Datatype);

/// The character set of a string datatype.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterSet {
    /// ASCII.
    #[default]
    Ascii,
    /// UTF-8.
    Utf8,
}

impl Datatype {
    /// The size in bytes of one element of a numeric datatype, [`None`] for strings and unsupported types.
    #[must_use]
    pub const fn element_size(&self) -> Option<usize> {
        match self {
            Self::Int8 | Self::UInt8 => Some(1),
            Self::Int16 | Self::UInt16 => Some(2),
            Self::Int32 | Self::UInt32 | Self::Float32 => Some(4),
            Self::Int64 | Self::UInt64 | Self::Float64 => Some(8),
            _ => None,
        }
    }

    /// Returns true if this is a fixed or variable-length string.
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::FixedString | Self::VariableString)
    }

    /// Returns true if this is a 64-bit integer.
    #[must_use]
    pub const fn is_int64(&self) -> bool {
        matches!(self, Self::Int64 | Self::UInt64)
    }

    /// Returns true if the datatype can be represented in the flat CF model.
    ///
    /// 64-bit integers are only representable if `support_int64` is true.
    #[must_use]
    pub const fn is_supported(&self, support_int64: bool) -> bool {
        match self {
            Self::Int8
            | Self::UInt8
            | Self::Int16
            | Self::UInt16
            | Self::Int32
            | Self::UInt32
            | Self::Float32
            | Self::Float64
            | Self::FixedString
            | Self::VariableString => true,
            Self::Int64 | Self::UInt64 => support_int64,
            _ => false,
        }
    }

    /// Check that the datatype is supported.
    ///
    /// # Errors
    /// Returns [`UnsupportedDatatypeError`] if the datatype is not [supported](Datatype::is_supported).
    pub fn check_supported(self, support_int64: bool) -> Result<Self, UnsupportedDatatypeError> {
        if self.is_supported(support_int64) {
            Ok(self)
        } else {
            Err(self.into())
        }
    }

    /// Decode the little-endian element `bytes` as [`f64`].
    ///
    /// Returns [`None`] if the datatype is not numeric or `bytes` has the wrong length.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn decode_f64(&self, bytes: &[u8]) -> Option<f64> {
        if Some(bytes.len()) != self.element_size() {
            return None;
        }
        Some(match self {
            Self::Int8 => f64::from(i8::from_le_bytes(bytes.try_into().ok()?)),
            Self::UInt8 => f64::from(bytes[0]),
            Self::Int16 => f64::from(i16::from_le_bytes(bytes.try_into().ok()?)),
            Self::UInt16 => f64::from(u16::from_le_bytes(bytes.try_into().ok()?)),
            Self::Int32 => f64::from(i32::from_le_bytes(bytes.try_into().ok()?)),
            Self::UInt32 => f64::from(u32::from_le_bytes(bytes.try_into().ok()?)),
            Self::Int64 => i64::from_le_bytes(bytes.try_into().ok()?) as f64,
            Self::UInt64 => u64::from_le_bytes(bytes.try_into().ok()?) as f64,
            Self::Float32 => f64::from(f32::from_le_bytes(bytes.try_into().ok()?)),
            Self::Float64 => f64::from_le_bytes(bytes.try_into().ok()?),
            _ => return None,
        })
    }
}
