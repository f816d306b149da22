//! # Chunks
//!
//! A chunk is a self-describing unit of payload:
//!
//! | tag  | length                      | payload        |
//! | ---  | ---                         | ---            |
//! | `u8` | `u16`, writer's byte order  | `length` bytes |
//!
//! The framer only delimits chunks. What a tag means is up to the caller, and a reader
//! that does not know a tag can step over the chunk with [`skip_chunk`].
//!
//! # Example
//!
//! ```
//! use binframe::prelude::*;
//!
//! let enc = encode_chunk(7, b"abc", Endian::Big).unwrap();
//! assert_eq!(enc, [7, 0, 3, b'a', b'b', b'c']);
//!
//! let mut c = ByteCursor::new(&enc, Endian::Big);
//! let chunk = decode_chunk(&mut c).unwrap();
//! assert_eq!(chunk.tag(), 7);
//! assert_eq!(&chunk.payload()[..], b"abc");
//! ```

use crate::{
    cursor::{ByteCursor, ByteWriter, Endian, WriteBuf},
    errors::{CodecError, Result},
};
use bytes::Bytes;

/// Bytes taken by a chunk's tag and length.
pub const CHUNK_HEADER_LEN: usize = 3;

/// Largest payload a chunk can carry.
pub const MAX_CHUNK_PAYLOAD: usize = u16::max_value() as usize;

/// A tagged payload.
///
/// The length is derived from the payload, so the two can never disagree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Chunk {
    tag: u8,
    payload: Bytes,
}

impl Chunk {
    /// Creates a chunk.
    ///
    /// # Errors
    ///
    /// [`CodecError::ValueOutOfRange`] if the payload is longer than
    /// [`MAX_CHUNK_PAYLOAD`].
    pub fn new<P: Into<Bytes>>(tag: u8, payload: P) -> Result<Self> {
        let payload = payload.into();
        check_payload_len(payload.len())?;
        Ok(Chunk { tag, payload })
    }

    pub fn tag(&self) -> u8 { self.tag }

    pub fn payload(&self) -> &Bytes { &self.payload }

    /// Payload length as stored on the wire.
    pub fn len(&self) -> u16 { self.payload.len() as u16 }

    pub fn is_empty(&self) -> bool { self.payload.is_empty() }

    /// Bytes this chunk takes when encoded.
    pub fn encoded_len(&self) -> usize { CHUNK_HEADER_LEN + self.payload.len() }

    pub fn into_parts(self) -> (u8, Bytes) { (self.tag, self.payload) }
}

#[inline]
fn check_payload_len(len: usize) -> Result<()> {
    if len > MAX_CHUNK_PAYLOAD {
        Err(CodecError::ValueOutOfRange {
            value: len.to_string(),
            bits: 16,
            signed: false,
        })
    } else {
        Ok(())
    }
}

/// Writes one chunk.
pub fn write_chunk<B: WriteBuf>(w: &mut ByteWriter<B>, tag: u8, payload: &[u8]) -> Result<()> {
    check_payload_len(payload.len())?;
    w.write_u8(tag)?;
    w.write_u16(payload.len() as u16)?;
    w.write_bytes(payload)
}

/// Encodes a single chunk into a new buffer.
///
/// # Errors
///
/// [`CodecError::ValueOutOfRange`] if `payload` is longer than [`MAX_CHUNK_PAYLOAD`].
pub fn encode_chunk(tag: u8, payload: &[u8], order: Endian) -> Result<Vec<u8>> {
    let mut w = ByteWriter::with_capacity(CHUNK_HEADER_LEN + payload.len(), order);
    write_chunk(&mut w, tag, payload)?;
    Ok(w.finish())
}

/// Reads a chunk's tag and length, leaving the cursor at its payload.
fn read_chunk_header(c: &mut ByteCursor<'_>) -> Result<(u8, usize)> {
    let offset = c.position();
    if c.remaining() < CHUNK_HEADER_LEN {
        return Err(CodecError::Truncated {
            offset,
            expected: CHUNK_HEADER_LEN,
            available: c.remaining(),
        });
    }
    let tag = c.read_u8()?;
    let len = c.read_u16()? as usize;
    if len > c.remaining() {
        return Err(CodecError::Truncated {
            offset: c.position(),
            expected: len,
            available: c.remaining(),
        });
    }
    Ok((tag, len))
}

/// Reads one chunk.
///
/// # Errors
///
/// [`CodecError::Truncated`] if the header or the declared payload runs past the end of
/// the buffer. The cursor does not move in that case.
pub fn decode_chunk(c: &mut ByteCursor<'_>) -> Result<Chunk> {
    c.atomically(|c| {
        let (tag, len) = read_chunk_header(c)?;
        let payload = c.read_bytes(len)?;
        Ok(Chunk { tag, payload })
    })
}

/// Steps over one chunk without copying its payload, returning its tag.
pub fn skip_chunk(c: &mut ByteCursor<'_>) -> Result<u8> {
    c.atomically(|c| {
        let (tag, len) = read_chunk_header(c)?;
        c.take(len)?;
        Ok(tag)
    })
}

/// Reads exactly `count` chunks.
///
/// With `exact`, the chunks must also use up the rest of the buffer.
///
/// # Errors
///
/// * [`CodecError::Truncated`] if the buffer ends before `count` chunks were read.
/// * [`CodecError::CountMismatch`] if `exact` and bytes remain after the last chunk.
///
/// On error the cursor is left where it was.
pub fn decode_all_chunks(c: &mut ByteCursor<'_>, count: usize, exact: bool) -> Result<Vec<Chunk>> {
    c.atomically(|c| {
        // every chunk takes at least its header, which bounds a hostile count
        let mut out = Vec::with_capacity(count.min(c.remaining() / CHUNK_HEADER_LEN));
        for _ in 0..count {
            out.push(decode_chunk(c)?);
        }
        if exact && c.remaining() > 0 {
            return Err(CodecError::CountMismatch {
                expected: count,
                offset: c.position(),
                trailing: c.remaining(),
            });
        }
        Ok(out)
    })
}

/// Lazily decodes chunks until the cursor runs out.
///
/// Yields at most one error, after which it is exhausted.
#[derive(Debug)]
pub struct ChunkIter<'a, 'c> {
    cursor: &'c mut ByteCursor<'a>,
    failed: bool,
}

impl<'a, 'c> ChunkIter<'a, 'c> {
    pub fn new(cursor: &'c mut ByteCursor<'a>) -> Self {
        ChunkIter {
            cursor,
            failed: false,
        }
    }
}

impl<'a, 'c> Iterator for ChunkIter<'a, 'c> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Result<Chunk>> {
        if self.failed || self.cursor.remaining() == 0 {
            return None;
        }
        let res = decode_chunk(self.cursor);
        self.failed = res.is_err();
        Some(res)
    }
}

impl<'a, 'c> std::iter::FusedIterator for ChunkIter<'a, 'c> {}
