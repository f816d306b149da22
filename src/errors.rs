use crate::field::FieldType;
use failure::Fail;

/// Everything that can go wrong while encoding or decoding.
///
/// Each variant carries the offset it was raised at along with the expected and actual
/// values, so a caller can report the failure without re-parsing the input.
#[derive(Debug, Clone, PartialEq, Eq, Fail)]
pub enum CodecError {
    /// A read or seek went past the end of the buffer.
    #[fail(
        display = "needed {} bytes at offset {}, but only {} remain",
        needed, offset, remaining
    )]
    OutOfBounds {
        /// Position of the cursor when the access was attempted.
        offset: usize,
        /// Bytes the access required.
        needed: usize,
        /// Bytes actually left after `offset`.
        remaining: usize,
    },

    /// A fixed-size write target cannot hold the write.
    #[fail(
        display = "writing {} bytes at offset {} overflows a buffer of {} bytes",
        needed, offset, capacity
    )]
    BufferTooSmall {
        /// Position the write started at.
        offset: usize,
        /// Bytes the write required.
        needed: usize,
        /// Total size of the target buffer.
        capacity: usize,
    },

    /// An integer or a length does not fit the requested width or length prefix.
    #[fail(
        display = "value {} does not fit in {} bits (signed: {})",
        value, bits, signed
    )]
    ValueOutOfRange {
        /// The rejected value or length, rendered in decimal.
        value: String,
        /// Width of the target field or prefix in bits.
        bits: u32,
        /// Whether the target field is signed.
        signed: bool,
    },

    /// Text is longer than the fixed field it must be stored in.
    #[fail(display = "text of {} bytes does not fit a {}-byte field", len, width)]
    TextTooLong {
        /// Length of the text in bytes.
        len: usize,
        /// Width of the field.
        width: usize,
    },

    /// A declared length or count needs more bytes than the buffer has.
    #[fail(
        display = "truncated input at offset {}: expected {} bytes, {} available",
        offset, expected, available
    )]
    Truncated {
        /// Where the missing data should have started.
        offset: usize,
        /// Bytes that were declared.
        expected: usize,
        /// Bytes that were actually present.
        available: usize,
    },

    /// Undeclared bytes remain after the declared number of items.
    #[fail(
        display = "expected exactly {} items, but {} undeclared bytes remain at offset {}",
        expected, trailing, offset
    )]
    CountMismatch {
        /// Item count the header declared.
        expected: usize,
        /// Offset of the first undeclared byte.
        offset: usize,
        /// Number of undeclared bytes.
        trailing: usize,
    },

    /// The declared item count is above the configured limit.
    #[fail(display = "declared count {} exceeds the limit of {}", count, max)]
    CountTooLarge {
        /// Count found in the header.
        count: u32,
        /// Configured maximum.
        max: u32,
    },

    /// The header magic is not the one this codec was set up for.
    #[fail(display = "bad magic: expected {:#010x}, found {:#010x}", expected, found)]
    BadMagic {
        /// The registered magic.
        expected: u32,
        /// The magic read from the input.
        found: u32,
    },

    /// The checksum trailer does not match the recomputed value.
    #[fail(
        display = "checksum mismatch: trailer holds {:#06x}, computed {:#06x}",
        stored, computed
    )]
    ChecksumMismatch {
        /// Value read from the trailer.
        stored: u16,
        /// Value computed over the preceding bytes.
        computed: u16,
    },

    /// A width that no fixed-width field supports.
    #[fail(display = "unsupported field width: {} bytes", _0)]
    InvalidWidth(usize),

    /// Fixed text that is not valid UTF-8.
    #[fail(display = "fixed text at offset {} is not valid UTF-8", offset)]
    InvalidText {
        /// Start of the text field.
        offset: usize,
    },

    /// A record value does not have the type its schema declares.
    #[fail(display = "field `{}` does not match schema type {:?}", field, expected)]
    FieldMismatch {
        /// Name of the offending field.
        field: String,
        /// Type the schema declares.
        expected: FieldType,
    },

    /// A record has a different number of values than its schema has fields.
    #[fail(display = "record has {} values, schema has {} fields", found, expected)]
    ArityMismatch {
        /// Number of fields in the schema.
        expected: usize,
        /// Number of values in the record.
        found: usize,
    },

    /// A record schema field without a fixed encoded size.
    #[fail(display = "field `{}` has no fixed width", _0)]
    VariableField(String),

    /// A record schema whose records take no bytes on the wire.
    #[fail(display = "record schema encodes to zero bytes")]
    EmptyRecord,

    /// Two record schema fields share a name.
    #[fail(display = "field `{}` appears more than once", _0)]
    DuplicateField(String),

    /// The message body does not have the shape the codec is configured for.
    #[fail(display = "body does not match the configured style: expected {}", expected)]
    BodyMismatch {
        /// The configured body style.
        expected: &'static str,
    },
}

impl CodecError {
    /// Whether the error means "the input ended before the declared data did".
    pub fn is_truncation(&self) -> bool {
        match self {
            CodecError::Truncated { .. } | CodecError::OutOfBounds { .. } => true,
            _ => false,
        }
    }

    /// Re-labels a cursor bounds failure as truncation of declared data.
    ///
    /// Framing layers read lengths and counts out of the input itself, so running out of
    /// bytes there means the input lied about its size rather than that the caller misused
    /// the cursor.
    pub(crate) fn into_truncated(self) -> Self {
        match self {
            CodecError::OutOfBounds {
                offset,
                needed,
                remaining,
            } => CodecError::Truncated {
                offset,
                expected: needed,
                available: remaining,
            },
            other => other,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CodecError>;
