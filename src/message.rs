//! # Messages
//!
//! A message is a fixed header, a body of `count` items and an optional checksum trailer:
//!
//! | magic | version | flags | count | body                  | trailer           |
//! | ---   | ---     | ---   | ---   | ---                   | ---               |
//! | `u32` | `u16`   | `u16` | `u32` | `count` chunks/records| `u8`/`u16`, opt.  |
//!
//! All multi-byte values use the configured byte order. The trailer is the additive
//! checksum of every byte before it.
//!
//! Decoding is all or nothing: either the whole message is returned or an error is.
//!
//! # Example
//!
//! ```
//! use binframe::prelude::*;
//!
//! let chunks = vec![Chunk::new(1, &b"AB"[..]).unwrap(), Chunk::new(2, vec![0x00, 0x2A]).unwrap()];
//! let buf = encode_message(0xCAFE_BABE, 1, 0, &chunks, Some(ChecksumWidth::U16)).unwrap();
//!
//! let (header, decoded) = decode_message(&buf, 0xCAFE_BABE, Some(ChecksumWidth::U16)).unwrap();
//! assert_eq!(header.count, 2);
//! assert_eq!(decoded, chunks);
//! ```

use crate::{
    checksum::{check_trailer, write_trailer, ChecksumWidth},
    chunk::{decode_all_chunks, write_chunk, Chunk},
    config::{BodyStyle, CodecConfig},
    cursor::{ByteCursor, ByteWriter, Endian, WriteBuf},
    errors::{CodecError, Result},
    record::{decode_all_records, encode_record, Record, RecordSchema},
};
use std::convert::TryFrom;

/// Encoded size of a [`MessageHeader`].
pub const HEADER_LEN: usize = 12;

/// The fixed-size start of every message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageHeader {
    pub magic: u32,
    pub version: u16,
    /// Caller-defined flag bits, carried as is.
    pub flags: u16,
    /// Number of items in the body.
    pub count: u32,
}

impl MessageHeader {
    pub fn write<B: WriteBuf>(&self, w: &mut ByteWriter<B>) -> Result<()> {
        w.write_u32(self.magic)?;
        w.write_u16(self.version)?;
        w.write_u16(self.flags)?;
        w.write_u32(self.count)
    }

    /// Reads a header without validating any of it.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] if fewer than [`HEADER_LEN`] bytes remain.
    pub fn read(c: &mut ByteCursor<'_>) -> Result<Self> {
        if c.remaining() < HEADER_LEN {
            return Err(CodecError::Truncated {
                offset: c.position(),
                expected: HEADER_LEN,
                available: c.remaining(),
            });
        }
        Ok(MessageHeader {
            magic: c.read_u32()?,
            version: c.read_u16()?,
            flags: c.read_u16()?,
            count: c.read_u32()?,
        })
    }
}

/// Reads the header at the start of `buf`, leaving the body alone.
///
/// Nothing is checked, so this works for telling formats apart by their magic.
pub fn peek_header(buf: &[u8], order: Endian) -> Result<MessageHeader> {
    MessageHeader::read(&mut ByteCursor::new(buf, order))
}

/// The items of a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Chunks(Vec<Chunk>),
    Records(Vec<Record>),
}

impl Body {
    pub fn len(&self) -> usize {
        match self {
            Body::Chunks(cs) => cs.len(),
            Body::Records(rs) => rs.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn as_chunks(&self) -> Option<&[Chunk]> {
        match self {
            Body::Chunks(cs) => Some(cs),
            Body::Records(_) => None,
        }
    }

    pub fn as_records(&self) -> Option<&[Record]> {
        match self {
            Body::Records(rs) => Some(rs),
            Body::Chunks(_) => None,
        }
    }

    /// # Errors
    ///
    /// [`CodecError::BodyMismatch`] if the body holds records.
    pub fn into_chunks(self) -> Result<Vec<Chunk>> {
        match self {
            Body::Chunks(cs) => Ok(cs),
            Body::Records(_) => Err(CodecError::BodyMismatch { expected: "chunks" }),
        }
    }

    /// # Errors
    ///
    /// [`CodecError::BodyMismatch`] if the body holds chunks.
    pub fn into_records(self) -> Result<Vec<Record>> {
        match self {
            Body::Records(rs) => Ok(rs),
            Body::Chunks(_) => Err(CodecError::BodyMismatch { expected: "records" }),
        }
    }
}

/// A fully decoded message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub body: Body,
}

#[derive(Clone, Copy)]
enum Items<'a> {
    Chunks(&'a [Chunk]),
    Records(&'a RecordSchema, &'a [Record]),
}

impl<'a> Items<'a> {
    fn len(self) -> usize {
        match self {
            Items::Chunks(cs) => cs.len(),
            Items::Records(_, rs) => rs.len(),
        }
    }

    fn encoded_len(self) -> usize {
        match self {
            Items::Chunks(cs) => cs.iter().map(Chunk::encoded_len).sum(),
            Items::Records(schema, rs) => schema.record_size() * rs.len(),
        }
    }
}

#[derive(Debug)]
enum DecodeState {
    ExpectHeader,
    ExpectBody(MessageHeader),
    /// Header and body are parsed (or failed to parse) and the trailer is still unchecked.
    ExpectChecksum {
        width: ChecksumWidth,
        parsed: Result<Message>,
    },
    Done(Message),
}

impl DecodeState {
    fn name(&self) -> &'static str {
        match self {
            DecodeState::ExpectHeader => "expect_header",
            DecodeState::ExpectBody(_) => "expect_body",
            DecodeState::ExpectChecksum { .. } => "expect_checksum",
            DecodeState::Done(_) => "done",
        }
    }
}

/// Encodes and decodes messages under one [`CodecConfig`].
///
/// Holds no state besides its configuration, so a single codec can be shared between
/// threads.
#[derive(Clone, Debug, Default)]
pub struct MessageCodec {
    config: CodecConfig,
}

impl MessageCodec {
    pub fn new(config: CodecConfig) -> Self { MessageCodec { config } }

    pub fn config(&self) -> &CodecConfig { &self.config }

    /// Encodes `body` into a new buffer.
    ///
    /// # Errors
    ///
    /// * [`CodecError::BodyMismatch`] if `body` is not of the configured style.
    /// * [`CodecError::CountTooLarge`] if `body` has more items than `max_count`.
    /// * Any error from encoding the individual records.
    pub fn encode(&self, flags: u16, body: &Body) -> Result<Vec<u8>> {
        match body {
            Body::Chunks(cs) => self.encode_chunks(flags, cs),
            Body::Records(rs) => self.encode_records(flags, rs),
        }
    }

    pub fn encode_chunks(&self, flags: u16, chunks: &[Chunk]) -> Result<Vec<u8>> {
        let items = self.chunk_items(chunks)?;
        let mut w = ByteWriter::with_capacity(self.encoded_len(items), self.config.order);
        self.write_message(&mut w, flags, items)?;
        Ok(w.finish())
    }

    pub fn encode_records(&self, flags: u16, records: &[Record]) -> Result<Vec<u8>> {
        let items = self.record_items(records)?;
        let mut w = ByteWriter::with_capacity(self.encoded_len(items), self.config.order);
        self.write_message(&mut w, flags, items)?;
        Ok(w.finish())
    }

    /// Encodes `body` into `out`, returning the number of bytes used.
    ///
    /// # Errors
    ///
    /// As [`MessageCodec::encode`], plus [`CodecError::BufferTooSmall`] if the message does
    /// not fit. The contents of `out` are unspecified after an error.
    pub fn encode_into(&self, flags: u16, body: &Body, out: &mut [u8]) -> Result<usize> {
        let items = match body {
            Body::Chunks(cs) => self.chunk_items(cs)?,
            Body::Records(rs) => self.record_items(rs)?,
        };
        let mut w = ByteWriter::fixed(out, self.config.order);
        self.write_message(&mut w, flags, items)?;
        Ok(w.finish())
    }

    /// Decodes a whole message.
    ///
    /// The header is read first and its magic and count checked, then the body, then the
    /// trailer. When a trailer is configured a checksum mismatch is reported in preference
    /// to any header or body error, since corruption explains both.
    ///
    /// # Errors
    ///
    /// * [`CodecError::Truncated`] if the buffer ends early.
    /// * [`CodecError::BadMagic`] if the magic is not the configured one.
    /// * [`CodecError::CountTooLarge`] if the header declares more than `max_count` items.
    /// * [`CodecError::CountMismatch`] if bytes remain after the body and `exact` is set.
    /// * [`CodecError::ChecksumMismatch`] if the trailer does not match.
    pub fn decode(&self, buf: &[u8]) -> Result<Message> {
        let content_len = match self.config.checksum {
            Some(width) => buf.len().checked_sub(width.bytes()).ok_or(CodecError::Truncated {
                offset: 0,
                expected: width.bytes(),
                available: buf.len(),
            })?,
            None => buf.len(),
        };
        let mut c = ByteCursor::new(&buf[..content_len], self.config.order);
        let mut state = DecodeState::ExpectHeader;

        loop {
            tracing::trace!(state = state.name(), offset = c.position(), "decoding message");
            state = match state {
                DecodeState::ExpectHeader => match self.read_header(&mut c) {
                    Ok(header) => DecodeState::ExpectBody(header),
                    Err(e) => self.reject(e)?,
                },
                DecodeState::ExpectBody(header) => match self.decode_body(&mut c, header.count) {
                    Ok(body) => self.accept(Message { header, body }),
                    Err(e) => self.reject(e)?,
                },
                DecodeState::ExpectChecksum { width, parsed } => {
                    if let Err(e) = check_trailer(buf, self.config.order, width) {
                        tracing::debug!(error = %e, len = buf.len(), "rejected message");
                        return Err(e);
                    }
                    match parsed {
                        Ok(message) => DecodeState::Done(message),
                        Err(e) => {
                            tracing::debug!(error = %e, len = buf.len(), "rejected message");
                            return Err(e);
                        }
                    }
                }
                DecodeState::Done(message) => return Ok(message),
            }
        }
    }

    /// Decodes a chunked message into its header and chunks.
    pub fn decode_chunks(&self, buf: &[u8]) -> Result<(MessageHeader, Vec<Chunk>)> {
        if self.config.body != BodyStyle::Chunks {
            return Err(CodecError::BodyMismatch {
                expected: self.config.body.name(),
            });
        }
        let Message { header, body } = self.decode(buf)?;
        Ok((header, body.into_chunks()?))
    }

    fn chunk_items<'a>(&'a self, chunks: &'a [Chunk]) -> Result<Items<'a>> {
        match self.config.body {
            BodyStyle::Chunks => Ok(Items::Chunks(chunks)),
            BodyStyle::Records(_) => Err(CodecError::BodyMismatch { expected: "records" }),
        }
    }

    fn record_items<'a>(&'a self, records: &'a [Record]) -> Result<Items<'a>> {
        match &self.config.body {
            BodyStyle::Records(schema) => Ok(Items::Records(schema, records)),
            BodyStyle::Chunks => Err(CodecError::BodyMismatch { expected: "chunks" }),
        }
    }

    fn encoded_len(&self, items: Items<'_>) -> usize {
        HEADER_LEN + items.encoded_len() + self.config.checksum.map_or(0, ChecksumWidth::bytes)
    }

    fn write_message<B: WriteBuf>(&self, w: &mut ByteWriter<B>, flags: u16, items: Items<'_>) -> Result<()> {
        let count = u32::try_from(items.len())
            .ok()
            .filter(|&n| n <= self.config.max_count)
            .ok_or(CodecError::CountTooLarge {
                count: u32::try_from(items.len()).unwrap_or(u32::max_value()),
                max: self.config.max_count,
            })?;

        let header = MessageHeader {
            magic: self.config.magic,
            version: self.config.version,
            flags,
            count,
        };
        header.write(w)?;
        match items {
            Items::Chunks(cs) => {
                for chunk in cs {
                    write_chunk(w, chunk.tag(), chunk.payload())?;
                }
            }
            Items::Records(schema, rs) => {
                for record in rs {
                    encode_record(w, schema, record)?;
                }
            }
        }
        let checksum = match self.config.checksum {
            Some(width) => Some(write_trailer(w, width)?),
            None => None,
        };
        tracing::trace!(len = w.written(), count, ?checksum, "encoded message");
        Ok(())
    }

    fn read_header(&self, c: &mut ByteCursor<'_>) -> Result<MessageHeader> {
        let header = MessageHeader::read(c)?;
        if header.magic != self.config.magic {
            return Err(CodecError::BadMagic {
                expected: self.config.magic,
                found: header.magic,
            });
        }
        if header.count > self.config.max_count {
            return Err(CodecError::CountTooLarge {
                count: header.count,
                max: self.config.max_count,
            });
        }
        Ok(header)
    }

    fn decode_body(&self, c: &mut ByteCursor<'_>, count: u32) -> Result<Body> {
        let count = count as usize;
        match &self.config.body {
            BodyStyle::Chunks => decode_all_chunks(c, count, self.config.exact).map(Body::Chunks),
            BodyStyle::Records(schema) => {
                decode_all_records(c, schema, count, self.config.exact).map(Body::Records)
            }
        }
    }

    fn accept(&self, message: Message) -> DecodeState {
        match self.config.checksum {
            Some(width) => DecodeState::ExpectChecksum {
                width,
                parsed: Ok(message),
            },
            None => DecodeState::Done(message),
        }
    }

    /// With a trailer configured the error is held until the checksum has been checked.
    fn reject(&self, e: CodecError) -> Result<DecodeState> {
        match self.config.checksum {
            Some(width) => Ok(DecodeState::ExpectChecksum { width, parsed: Err(e) }),
            None => {
                tracing::debug!(error = %e, "rejected message");
                Err(e)
            }
        }
    }
}

/// Encodes a big-endian chunked message.
///
/// # Errors
///
/// [`CodecError::CountTooLarge`] if there are more chunks than a default
/// [`CodecConfig`] accepts.
pub fn encode_message(
    magic: u32,
    version: u16,
    flags: u16,
    chunks: &[Chunk],
    checksum: Option<ChecksumWidth>,
) -> Result<Vec<u8>> {
    let config = CodecConfig {
        magic,
        version,
        checksum,
        ..CodecConfig::default()
    };
    MessageCodec::new(config).encode_chunks(flags, chunks)
}

/// Decodes a big-endian chunked message written by [`encode_message`].
///
/// See [`MessageCodec::decode`] for the errors.
pub fn decode_message(
    buf: &[u8],
    expected_magic: u32,
    checksum: Option<ChecksumWidth>,
) -> Result<(MessageHeader, Vec<Chunk>)> {
    let config = CodecConfig {
        magic: expected_magic,
        checksum,
        ..CodecConfig::default()
    };
    MessageCodec::new(config).decode_chunks(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldType, Value, Width};

    const MAGIC: u32 = 0xCAFE_BABE;

    fn sample_chunks() -> Vec<Chunk> {
        vec![
            Chunk::new(1, &b"AB"[..]).unwrap(),
            Chunk::new(2, vec![0x00, 0x2A]).unwrap(),
        ]
    }

    #[test]
    fn two_chunk_message_bytes() {
        let buf = encode_message(MAGIC, 1, 0, &sample_chunks(), None).unwrap();
        assert_eq!(
            buf,
            [
                0xCA, 0xFE, 0xBA, 0xBE, 0, 1, 0, 0, 0, 0, 0, 2, //
                1, 0, 2, b'A', b'B', //
                2, 0, 2, 0x00, 0x2A,
            ]
        );

        let (header, chunks) = decode_message(&buf, MAGIC, None).unwrap();
        assert_eq!(
            header,
            MessageHeader {
                magic: MAGIC,
                version: 1,
                flags: 0,
                count: 2,
            }
        );
        assert_eq!(chunks, sample_chunks());
    }

    #[test]
    fn little_endian_header() {
        let codec = MessageCodec::new(CodecConfig::new(MAGIC).with_order(Endian::Little).with_version(0x0102));
        let buf = codec.encode_chunks(0x8001, &[]).unwrap();
        assert_eq!(buf, [0xBE, 0xBA, 0xFE, 0xCA, 0x02, 0x01, 0x01, 0x80, 0, 0, 0, 0]);
        assert_eq!(peek_header(&buf, Endian::Little).unwrap().flags, 0x8001);
        assert_eq!(codec.decode(&buf).unwrap().header.version, 0x0102);
    }

    #[test]
    fn empty_message_is_valid() {
        let buf = encode_message(MAGIC, 1, 0, &[], Some(ChecksumWidth::U8)).unwrap();
        assert_eq!(buf.len(), HEADER_LEN + 1);
        let (header, chunks) = decode_message(&buf, MAGIC, Some(ChecksumWidth::U8)).unwrap();
        assert_eq!(header.count, 0);
        assert!(chunks.is_empty());
    }

    #[test]
    fn declared_items_with_empty_body_is_truncated() {
        let mut w = ByteWriter::new(Endian::Big);
        MessageHeader {
            magic: MAGIC,
            version: 1,
            flags: 0,
            count: 2,
        }
        .write(&mut w)
        .unwrap();
        let buf = w.finish();
        assert_eq!(
            decode_message(&buf, MAGIC, None),
            Err(CodecError::Truncated {
                offset: 12,
                expected: 3,
                available: 0,
            })
        );
    }

    #[test]
    fn short_header() {
        assert_eq!(
            decode_message(&[0xCA, 0xFE], MAGIC, None),
            Err(CodecError::Truncated {
                offset: 0,
                expected: HEADER_LEN,
                available: 2,
            })
        );
        assert!(decode_message(&[], MAGIC, Some(ChecksumWidth::U16))
            .unwrap_err()
            .is_truncation());
    }

    #[test]
    fn wrong_magic() {
        let buf = encode_message(0xDEAD_BEEF, 1, 0, &sample_chunks(), None).unwrap();
        assert_eq!(
            decode_message(&buf, MAGIC, None),
            Err(CodecError::BadMagic {
                expected: MAGIC,
                found: 0xDEAD_BEEF,
            })
        );
    }

    #[test]
    fn held_error_surfaces_once_checksum_passes() {
        let buf = encode_message(0xDEAD_BEEF, 1, 0, &sample_chunks(), Some(ChecksumWidth::U16)).unwrap();
        assert_eq!(
            decode_message(&buf, MAGIC, Some(ChecksumWidth::U16)),
            Err(CodecError::BadMagic {
                expected: MAGIC,
                found: 0xDEAD_BEEF,
            })
        );
    }

    #[test]
    fn every_bit_flip_is_a_checksum_mismatch() {
        for width in &[ChecksumWidth::U8, ChecksumWidth::U16] {
            let buf = encode_message(MAGIC, 1, 0, &sample_chunks(), Some(*width)).unwrap();
            for bit in 0..buf.len() * 8 {
                let mut bad = buf.clone();
                bad[bit / 8] ^= 1 << (bit % 8);
                match decode_message(&bad, MAGIC, Some(*width)) {
                    Err(CodecError::ChecksumMismatch { .. }) => {}
                    other => panic!("bit {} with {:?}: {:?}", bit, width, other),
                }
            }
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = encode_message(MAGIC, 3, 7, &sample_chunks(), Some(ChecksumWidth::U16)).unwrap();
        let b = encode_message(MAGIC, 3, 7, &sample_chunks(), Some(ChecksumWidth::U16)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn trailing_bytes() {
        let mut buf = encode_message(MAGIC, 1, 0, &sample_chunks(), None).unwrap();
        buf.extend_from_slice(&[0xEE, 0xEE]);
        assert_eq!(
            decode_message(&buf, MAGIC, None),
            Err(CodecError::CountMismatch {
                expected: 2,
                offset: 22,
                trailing: 2,
            })
        );

        let lenient = MessageCodec::new(CodecConfig::new(MAGIC).with_exact(false));
        assert_eq!(lenient.decode(&buf).unwrap().body.len(), 2);
    }

    #[test]
    fn hostile_count_is_refused() {
        let mut w = ByteWriter::new(Endian::Big);
        MessageHeader {
            magic: MAGIC,
            version: 1,
            flags: 0,
            count: u32::max_value(),
        }
        .write(&mut w)
        .unwrap();
        let buf = w.finish();
        assert_eq!(
            decode_message(&buf, MAGIC, None),
            Err(CodecError::CountTooLarge {
                count: u32::max_value(),
                max: crate::config::DEFAULT_MAX_COUNT,
            })
        );
    }

    #[test]
    fn encode_respects_max_count() {
        let codec = MessageCodec::new(CodecConfig::default().with_max_count(1));
        assert_eq!(
            codec.encode_chunks(0, &sample_chunks()),
            Err(CodecError::CountTooLarge { count: 2, max: 1 })
        );
    }

    #[test]
    fn record_body() {
        let schema = RecordSchema::new(vec![
            ("id", FieldType::uint(Width::Two)),
            ("tag", FieldType::text(3)),
        ])
        .unwrap();
        let codec = MessageCodec::new(
            CodecConfig::new(MAGIC)
                .with_records(schema)
                .with_checksum(ChecksumWidth::U16),
        );
        let records = vec![
            Record::new(vec![Value::from(1u16), Value::from("abc")]),
            Record::new(vec![Value::from(2u16), Value::from("d")]),
        ];
        let body = Body::Records(records.clone());
        let buf = codec.encode(0, &body).unwrap();
        assert_eq!(buf.len(), HEADER_LEN + 2 * 5 + 2);

        let message = codec.decode(&buf).unwrap();
        assert_eq!(message.body, body);
        assert_eq!(message.body.into_records().unwrap(), records);

        assert_eq!(
            codec.encode(0, &Body::Chunks(sample_chunks())),
            Err(CodecError::BodyMismatch { expected: "records" })
        );
        assert_eq!(
            codec.decode_chunks(&buf),
            Err(CodecError::BodyMismatch { expected: "records" })
        );
    }

    #[test]
    fn encode_into_fixed_buffer() {
        let codec = MessageCodec::default();
        let body = Body::Chunks(sample_chunks());

        let mut out = [0u8; 64];
        let n = codec.encode_into(0, &body, &mut out).unwrap();
        assert_eq!(&out[..n], &codec.encode(0, &body).unwrap()[..]);

        let mut small = [0u8; 16];
        match codec.encode_into(0, &body, &mut small) {
            Err(CodecError::BufferTooSmall { capacity: 16, .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn codec_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MessageCodec>();
    }
}
