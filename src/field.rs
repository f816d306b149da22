//! # Typed fields
//!
//! Maps logical values to bytes through a [`ByteWriter`] and back through a
//! [`ByteCursor`].
//!
//! | Field type              | Encoding                                                |
//! | ---                     | ---                                                     |
//! | `FixedInt{width,signed}`| `width` bytes, two's complement when signed             |
//! | `Float{width}`          | IEEE-754 binary16/32/64 bits                            |
//! | `VarBlob{prefix}`       | unsigned length of `prefix` bytes, then the raw bytes   |
//! | `FixedText{width}`      | UTF-8, left aligned, zero padded to exactly `width`     |
//!
//! Multi-byte values follow the byte order of the cursor or writer.
//!
//! # Example
//!
//! ```
//! use binframe::prelude::*;
//!
//! let mut w = ByteWriter::new(Endian::Little);
//! encode_fixed_int(&mut w, -2, Width::Two, true).unwrap();
//! encode_var_blob(&mut w, b"hi", Width::One).unwrap();
//! let fit = encode_fixed_text(&mut w, "abc", 4).unwrap();
//! assert_eq!(fit, TextFit::Fits { padding: 1 });
//!
//! let out = w.finish();
//! assert_eq!(out, [0xFE, 0xFF, 2, b'h', b'i', b'a', b'b', b'c', 0]);
//!
//! let mut c = ByteCursor::new(&out, Endian::Little);
//! assert_eq!(decode_fixed_int(&mut c, Width::Two, true).unwrap(), -2);
//! assert_eq!(&decode_var_blob(&mut c, Width::One).unwrap()[..], b"hi");
//! assert_eq!(decode_fixed_text(&mut c, 4).unwrap(), "abc");
//! ```

use crate::{
    cursor::{ByteCursor, ByteWriter, WriteBuf},
    errors::{CodecError, Result},
    float::Float,
    from_fn,
};
use bytes::Bytes;
use half::f16;
use num_traits::ToPrimitive;
use std::{convert::TryFrom, fmt::Display};

/// Width of an integer field or a length prefix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Width {
    One,
    Two,
    Four,
    Eight,
}

impl Width {
    pub fn bytes(self) -> usize {
        match self {
            Width::One => 1,
            Width::Two => 2,
            Width::Four => 4,
            Width::Eight => 8,
        }
    }

    pub fn bits(self) -> u32 { self.bytes() as u32 * 8 }

    /// Largest unsigned value the width holds.
    pub fn max_unsigned(self) -> u64 {
        match self {
            Width::One => u64::from(u8::max_value()),
            Width::Two => u64::from(u16::max_value()),
            Width::Four => u64::from(u32::max_value()),
            Width::Eight => u64::max_value(),
        }
    }
}

impl TryFrom<usize> for Width {
    type Error = CodecError;

    fn try_from(n: usize) -> Result<Self> {
        match n {
            1 => Ok(Width::One),
            2 => Ok(Width::Two),
            4 => Ok(Width::Four),
            8 => Ok(Width::Eight),
            other => Err(CodecError::InvalidWidth(other)),
        }
    }
}

/// Width of a float field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    /// binary16
    Half,
    /// binary32
    Single,
    /// binary64
    Double,
}

impl FloatWidth {
    pub fn bytes(self) -> usize {
        match self {
            FloatWidth::Half => 2,
            FloatWidth::Single => 4,
            FloatWidth::Double => 8,
        }
    }
}

impl TryFrom<usize> for FloatWidth {
    type Error = CodecError;

    fn try_from(n: usize) -> Result<Self> {
        match n {
            2 => Ok(FloatWidth::Half),
            4 => Ok(FloatWidth::Single),
            8 => Ok(FloatWidth::Double),
            other => Err(CodecError::InvalidWidth(other)),
        }
    }
}

/// The type of a field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    FixedInt { width: Width, signed: bool },
    Float { width: FloatWidth },
    VarBlob { prefix: Width },
    FixedText { width: usize },
}

impl FieldType {
    pub fn int(width: Width) -> Self {
        FieldType::FixedInt {
            width,
            signed: true,
        }
    }

    pub fn uint(width: Width) -> Self {
        FieldType::FixedInt {
            width,
            signed: false,
        }
    }

    pub fn float(width: FloatWidth) -> Self { FieldType::Float { width } }

    pub fn blob(prefix: Width) -> Self { FieldType::VarBlob { prefix } }

    pub fn text(width: usize) -> Self { FieldType::FixedText { width } }

    /// Encoded size in bytes, or `None` for variable-length fields.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            FieldType::FixedInt { width, .. } => Some(width.bytes()),
            FieldType::Float { width } => Some(width.bytes()),
            FieldType::VarBlob { .. } => None,
            FieldType::FixedText { width } => Some(*width),
        }
    }

    /// Whether `value` has the shape this type encodes. Range is not checked.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::FixedInt { .. }, Value::Int(_)) => true,
            (FieldType::Float { width }, Value::Float(f)) => f.width() == *width,
            (FieldType::VarBlob { .. }, Value::Blob(_)) => true,
            (FieldType::FixedText { .. }, Value::Text(_)) => true,
            _ => false,
        }
    }
}

/// A decoded field value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    /// Any fixed-width integer, signed or not.
    Int(i128),
    Float(Float),
    Blob(Bytes),
    Text(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<Float> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Bytes> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }
}

from_fn!(Value, u8, |i: u8| Value::Int(i128::from(i)));
from_fn!(Value, u16, |i: u16| Value::Int(i128::from(i)));
from_fn!(Value, u32, |i: u32| Value::Int(i128::from(i)));
from_fn!(Value, u64, |i: u64| Value::Int(i128::from(i)));
from_fn!(Value, i8, |i: i8| Value::Int(i128::from(i)));
from_fn!(Value, i16, |i: i16| Value::Int(i128::from(i)));
from_fn!(Value, i32, |i: i32| Value::Int(i128::from(i)));
from_fn!(Value, i64, |i: i64| Value::Int(i128::from(i)));
from_fn!(Value, Float, Value::Float);
from_fn!(Value, f16, |f: f16| Value::Float(Float::from(f)));
from_fn!(Value, f32, |f: f32| Value::Float(Float::from(f)));
from_fn!(Value, f64, |f: f64| Value::Float(Float::from(f)));
from_fn!(Value, Bytes, Value::Blob);
from_fn!(Value, Vec<u8>, |v: Vec<u8>| Value::Blob(Bytes::from(v)));
from_fn!(Value, String, Value::Text);
from_fn!(Value, &str, |s: &str| Value::Text(s.to_owned()));

/// How a string fit into a fixed-width text field.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextFit {
    /// The whole string was written, followed by `padding` zero bytes.
    Fits { padding: usize },
    /// The string was cut and `dropped` bytes of it were not written.
    Truncated { dropped: usize },
}

impl TextFit {
    pub fn is_truncated(self) -> bool {
        match self {
            TextFit::Truncated { .. } => true,
            TextFit::Fits { .. } => false,
        }
    }
}

/// Writes `value` as a `width`-byte integer.
///
/// # Errors
///
/// [`CodecError::ValueOutOfRange`] if `value` is not representable in `width` bytes
/// with the given signedness. Nothing is written in that case.
pub fn encode_fixed_int<B, N>(w: &mut ByteWriter<B>, value: N, width: Width, signed: bool) -> Result<()>
where
    B: WriteBuf,
    N: ToPrimitive + Display,
{
    let out_of_range = || CodecError::ValueOutOfRange {
        value: value.to_string(),
        bits: width.bits(),
        signed,
    };
    match (width, signed) {
        (Width::One, false) => w.write_u8(value.to_u8().ok_or_else(out_of_range)?),
        (Width::One, true) => w.write_i8(value.to_i8().ok_or_else(out_of_range)?),
        (Width::Two, false) => w.write_u16(value.to_u16().ok_or_else(out_of_range)?),
        (Width::Two, true) => w.write_i16(value.to_i16().ok_or_else(out_of_range)?),
        (Width::Four, false) => w.write_u32(value.to_u32().ok_or_else(out_of_range)?),
        (Width::Four, true) => w.write_i32(value.to_i32().ok_or_else(out_of_range)?),
        (Width::Eight, false) => w.write_u64(value.to_u64().ok_or_else(out_of_range)?),
        (Width::Eight, true) => w.write_i64(value.to_i64().ok_or_else(out_of_range)?),
    }
}

/// Reads a `width`-byte integer, sign-extending it when `signed`.
pub fn decode_fixed_int(c: &mut ByteCursor<'_>, width: Width, signed: bool) -> Result<i128> {
    Ok(match (width, signed) {
        (Width::One, false) => i128::from(c.read_u8()?),
        (Width::One, true) => i128::from(c.read_i8()?),
        (Width::Two, false) => i128::from(c.read_u16()?),
        (Width::Two, true) => i128::from(c.read_i16()?),
        (Width::Four, false) => i128::from(c.read_u32()?),
        (Width::Four, true) => i128::from(c.read_i32()?),
        (Width::Eight, false) => i128::from(c.read_u64()?),
        (Width::Eight, true) => i128::from(c.read_i64()?),
    })
}

/// Writes the raw bits of `f`; the width comes from the variant.
pub fn encode_float<B: WriteBuf>(w: &mut ByteWriter<B>, f: Float) -> Result<()> {
    match f {
        Float::Half(n) => w.write_u16(n),
        Float::Single(n) => w.write_u32(n),
        Float::Double(n) => w.write_u64(n),
    }
}

pub fn decode_float(c: &mut ByteCursor<'_>, width: FloatWidth) -> Result<Float> {
    match width {
        FloatWidth::Half => c.read_u16().map(Float::Half),
        FloatWidth::Single => c.read_u32().map(Float::Single),
        FloatWidth::Double => c.read_u64().map(Float::Double),
    }
}

/// Writes a length prefix of `prefix` bytes followed by `bytes`.
///
/// # Errors
///
/// [`CodecError::ValueOutOfRange`] if the length does not fit the prefix.
pub fn encode_var_blob<B: WriteBuf>(w: &mut ByteWriter<B>, bytes: &[u8], prefix: Width) -> Result<()> {
    if bytes.len() as u64 > prefix.max_unsigned() {
        return Err(CodecError::ValueOutOfRange {
            value: bytes.len().to_string(),
            bits: prefix.bits(),
            signed: false,
        });
    }
    encode_fixed_int(w, bytes.len(), prefix, false)?;
    w.write_bytes(bytes)
}

/// Reads a length prefix, then that many bytes.
///
/// # Errors
///
/// [`CodecError::Truncated`] if the prefix or the declared bytes run past the end of the
/// buffer. The cursor is left where it was.
pub fn decode_var_blob(c: &mut ByteCursor<'_>, prefix: Width) -> Result<Bytes> {
    c.atomically(|c| {
        let len = decode_fixed_int(c, prefix, false).map_err(CodecError::into_truncated)?;
        let offset = c.position();
        let available = c.remaining();
        match usize::try_from(len) {
            Ok(len) if len <= available => c.read_bytes(len),
            _ => Err(CodecError::Truncated {
                offset,
                expected: usize::try_from(len).unwrap_or(usize::max_value()),
                available,
            }),
        }
    })
}

/// Writes `text` left aligned into exactly `width` bytes, zero padded.
///
/// Text longer than `width` is cut at the last character boundary that fits and the
/// result says so; the field is still exactly `width` bytes.
pub fn encode_fixed_text<B: WriteBuf>(w: &mut ByteWriter<B>, text: &str, width: usize) -> Result<TextFit> {
    let bytes = text.as_bytes();
    if bytes.len() <= width {
        w.write_bytes(bytes)?;
        let padding = width - bytes.len();
        w.write_zeros(padding)?;
        return Ok(TextFit::Fits { padding });
    }

    let mut cut = width;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    w.write_bytes(&bytes[..cut])?;
    w.write_zeros(width - cut)?;
    Ok(TextFit::Truncated {
        dropped: bytes.len() - cut,
    })
}

/// Like [`encode_fixed_text`], but refuses text that does not fit.
///
/// # Errors
///
/// [`CodecError::TextTooLong`] if `text` is longer than `width`. Nothing is written.
pub fn encode_fixed_text_strict<B: WriteBuf>(w: &mut ByteWriter<B>, text: &str, width: usize) -> Result<()> {
    if text.len() > width {
        return Err(CodecError::TextTooLong {
            len: text.len(),
            width,
        });
    }
    encode_fixed_text(w, text, width).map(|_| ())
}

/// Reads `width` bytes and decodes them up to the first zero byte as UTF-8.
pub fn decode_fixed_text(c: &mut ByteCursor<'_>, width: usize) -> Result<String> {
    c.atomically(|c| {
        let offset = c.position();
        let bs = c.take(width)?;
        let end = bs.iter().position(|&b| b == 0).unwrap_or(width);
        std::str::from_utf8(&bs[..end])
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidText { offset })
    })
}

/// Encodes any value according to its field type.
///
/// Text must fit its field; a record never silently loses text.
///
/// # Errors
///
/// [`CodecError::FieldMismatch`] if `value` is not of the kind `ty` describes, plus
/// whatever the per-type encoder reports.
pub fn encode_value<B: WriteBuf>(w: &mut ByteWriter<B>, ty: &FieldType, value: &Value) -> Result<()> {
    match (ty, value) {
        (FieldType::FixedInt { width, signed }, Value::Int(i)) => encode_fixed_int(w, *i, *width, *signed),
        (FieldType::Float { width }, Value::Float(f)) if f.width() == *width => encode_float(w, *f),
        (FieldType::VarBlob { prefix }, Value::Blob(b)) => encode_var_blob(w, b, *prefix),
        (FieldType::FixedText { width }, Value::Text(t)) => encode_fixed_text_strict(w, t, *width),
        _ => Err(CodecError::FieldMismatch {
            field: String::from("<value>"),
            expected: ty.clone(),
        }),
    }
}

/// Decodes one value of type `ty`.
pub fn decode_value(c: &mut ByteCursor<'_>, ty: &FieldType) -> Result<Value> {
    match ty {
        FieldType::FixedInt { width, signed } => decode_fixed_int(c, *width, *signed).map(Value::Int),
        FieldType::Float { width } => decode_float(c, *width).map(Value::Float),
        FieldType::VarBlob { prefix } => decode_var_blob(c, *prefix).map(Value::Blob),
        FieldType::FixedText { width } => decode_fixed_text(c, *width).map(Value::Text),
    }
}
