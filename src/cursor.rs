//! # Byte cursors
//!
//! Bounds-checked access to byte buffers in an explicit byte order.
//!
//! Reading and writing are split: a [`ByteCursor`] borrows an input buffer and walks it,
//! while a [`ByteWriter`] owns (or mutably borrows) its output through a [`WriteBuf`].
//!
//! # Example
//!
//! ```
//! use binframe::prelude::*;
//!
//! let mut w = ByteWriter::new(Endian::Big);
//! w.write_u32(0x1234_5678).unwrap();
//! let out = w.finish();
//! assert_eq!(out, [0x12, 0x34, 0x56, 0x78]);
//!
//! let mut c = ByteCursor::new(&out, Endian::Little);
//! assert_eq!(c.read_u32().unwrap(), 0x7856_3412);
//! assert_eq!(c.remaining(), 0);
//! ```

use crate::errors::{CodecError, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use bytes::Bytes;

/// Byte order for multi-byte values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Endian {
    /// Most significant byte first, a.k.a. network order.
    Big,
    /// Least significant byte first.
    Little,
}

impl Default for Endian {
    fn default() -> Self { Endian::Big }
}

macro_rules! read_prim {
    ($name:ident, $ty:ty, $width:expr) => {
        #[doc = concat!("Reads a `", stringify!($ty), "` in the cursor's byte order.")]
        #[inline]
        pub fn $name(&mut self) -> Result<$ty> {
            let order = self.order;
            let bs = self.take($width)?;
            Ok(match order {
                Endian::Big => BigEndian::$name(bs),
                Endian::Little => LittleEndian::$name(bs),
            })
        }
    };
}

/// A read position over a borrowed buffer.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
    order: Endian,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor at the start of `buf`.
    pub fn new(buf: &'a [u8], order: Endian) -> Self { ByteCursor { buf, pos: 0, order } }

    pub fn position(&self) -> usize { self.pos }

    pub fn remaining(&self) -> usize { self.buf.len() - self.pos }

    /// Length of the whole underlying buffer.
    pub fn len(&self) -> usize { self.buf.len() }

    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    pub fn order(&self) -> Endian { self.order }

    /// Switches the byte order used for subsequent reads.
    pub fn set_order(&mut self, order: Endian) { self.order = order }

    /// Moves to an absolute position. `pos == len()` is allowed and leaves nothing to read.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.buf.len() {
            return Err(CodecError::OutOfBounds {
                offset: self.pos,
                needed: pos - self.pos,
                remaining: self.remaining(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// The unread part of the buffer.
    pub fn rest(&self) -> &'a [u8] { &self.buf[self.pos..] }

    /// Borrows the next `n` bytes and advances past them.
    #[inline]
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(CodecError::OutOfBounds {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let bs = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bs)
    }

    /// Copies the next `n` bytes out of the buffer.
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        self.take(n).map(Bytes::copy_from_slice)
    }

    #[inline]
    pub fn peek_u8(&self) -> Result<u8> {
        self.buf.get(self.pos).copied().ok_or(CodecError::OutOfBounds {
            offset: self.pos,
            needed: 1,
            remaining: 0,
        })
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = self.peek_u8()?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> { self.read_u8().map(|b| b as i8) }

    read_prim!(read_u16, u16, 2);
    read_prim!(read_u32, u32, 4);
    read_prim!(read_u64, u64, 8);
    read_prim!(read_i16, i16, 2);
    read_prim!(read_i32, i32, 4);
    read_prim!(read_i64, i64, 8);
    read_prim!(read_f32, f32, 4);
    read_prim!(read_f64, f64, 8);

    /// Runs `f`, putting the cursor back where it was if `f` fails.
    pub(crate) fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let start = self.pos;
        let res = f(self);
        if res.is_err() {
            self.pos = start;
        }
        res
    }
}

/// Storage behind a [`ByteWriter`].
pub trait WriteBuf {
    /// What [`ByteWriter::finish`] hands back.
    type Out;

    /// Writes `bytes` starting at `at`. `at` is never past the bytes written so far.
    ///
    /// Must either write all of `bytes` or nothing.
    fn put_at(&mut self, at: usize, bytes: &[u8]) -> Result<()>;

    /// The bytes held so far, possibly followed by unwritten space.
    fn as_bytes(&self) -> &[u8];

    /// Hint that `additional` more bytes are coming.
    fn reserve(&mut self, _additional: usize) {}

    /// Converts into the output, given the number of bytes written.
    fn finalize(self, written: usize) -> Self::Out;
}

impl WriteBuf for Vec<u8> {
    type Out = Vec<u8>;

    fn put_at(&mut self, at: usize, bytes: &[u8]) -> Result<()> {
        let end = at + bytes.len();
        if at == self.len() {
            self.extend_from_slice(bytes);
        } else {
            if end > self.len() {
                self.resize(end, 0);
            }
            self[at..end].copy_from_slice(bytes);
        }
        Ok(())
    }

    fn as_bytes(&self) -> &[u8] { self }

    fn reserve(&mut self, additional: usize) { Vec::reserve(self, additional) }

    fn finalize(mut self, written: usize) -> Vec<u8> {
        self.truncate(written);
        self.shrink_to_fit();
        self
    }
}

/// A caller-provided buffer that never grows.
#[derive(Debug)]
pub struct FixedBuf<'a>(&'a mut [u8]);

impl<'a> FixedBuf<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self { FixedBuf(buf) }

    pub fn capacity(&self) -> usize { self.0.len() }
}

impl<'a> WriteBuf for FixedBuf<'a> {
    /// Number of bytes written into the caller's buffer.
    type Out = usize;

    fn put_at(&mut self, at: usize, bytes: &[u8]) -> Result<()> {
        let end = at + bytes.len();
        if end > self.0.len() {
            return Err(CodecError::BufferTooSmall {
                offset: at,
                needed: bytes.len(),
                capacity: self.0.len(),
            });
        }
        self.0[at..end].copy_from_slice(bytes);
        Ok(())
    }

    fn as_bytes(&self) -> &[u8] { &self.0[..] }

    fn finalize(self, written: usize) -> usize { written }
}

macro_rules! write_prim {
    ($name:ident, $ty:ty, $width:expr) => {
        #[doc = concat!("Writes a `", stringify!($ty), "` in the writer's byte order.")]
        #[inline]
        pub fn $name(&mut self, v: $ty) -> Result<()> {
            let mut scratch = [0u8; $width];
            match self.order {
                Endian::Big => BigEndian::$name(&mut scratch, v),
                Endian::Little => LittleEndian::$name(&mut scratch, v),
            }
            self.write_bytes(&scratch)
        }
    };
}

/// A write position over a [`WriteBuf`].
///
/// `position` may be moved back with [`ByteWriter::seek`] to patch bytes already written;
/// the writer remembers the furthest byte written and [`ByteWriter::finish`] keeps
/// everything up to it.
#[derive(Debug)]
pub struct ByteWriter<B: WriteBuf = Vec<u8>> {
    buf: B,
    pos: usize,
    end: usize,
    order: Endian,
}

impl ByteWriter<Vec<u8>> {
    /// A growable writer.
    pub fn new(order: Endian) -> Self { Self::from_buf(Vec::new(), order) }

    pub fn with_capacity(capacity: usize, order: Endian) -> Self {
        Self::from_buf(Vec::with_capacity(capacity), order)
    }
}

impl<'a> ByteWriter<FixedBuf<'a>> {
    /// A writer into `buf` that fails with `BufferTooSmall` instead of growing.
    pub fn fixed(buf: &'a mut [u8], order: Endian) -> Self {
        Self::from_buf(FixedBuf::new(buf), order)
    }
}

impl<B: WriteBuf> ByteWriter<B> {
    pub fn from_buf(buf: B, order: Endian) -> Self {
        ByteWriter {
            buf,
            pos: 0,
            end: 0,
            order,
        }
    }

    pub fn position(&self) -> usize { self.pos }

    /// Number of bytes written so far (the high-water mark, not the position).
    pub fn written(&self) -> usize { self.end }

    pub fn order(&self) -> Endian { self.order }

    pub fn set_order(&mut self, order: Endian) { self.order = order }

    /// Moves to `pos`, which must not be past the bytes written so far.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.end {
            return Err(CodecError::OutOfBounds {
                offset: self.pos,
                needed: pos - self.pos,
                remaining: self.end - self.pos,
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Everything written so far.
    pub fn as_slice(&self) -> &[u8] { &self.buf.as_bytes()[..self.end] }

    pub fn reserve(&mut self, additional: usize) { self.buf.reserve(additional) }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.put_at(self.pos, bytes)?;
        self.pos += bytes.len();
        if self.pos > self.end {
            self.end = self.pos;
        }
        Ok(())
    }

    /// Writes `n` zero bytes.
    pub fn write_zeros(&mut self, n: usize) -> Result<()> {
        const ZEROS: [u8; 64] = [0; 64];
        let mut left = n;
        while left > 0 {
            let step = left.min(ZEROS.len());
            self.write_bytes(&ZEROS[..step])?;
            left -= step;
        }
        Ok(())
    }

    #[inline]
    pub fn write_u8(&mut self, v: u8) -> Result<()> { self.write_bytes(&[v]) }

    #[inline]
    pub fn write_i8(&mut self, v: i8) -> Result<()> { self.write_bytes(&[v as u8]) }

    write_prim!(write_u16, u16, 2);
    write_prim!(write_u32, u32, 4);
    write_prim!(write_u64, u64, 8);
    write_prim!(write_i16, i16, 2);
    write_prim!(write_i32, i32, 4);
    write_prim!(write_i64, i64, 8);
    write_prim!(write_f32, f32, 4);
    write_prim!(write_f64, f64, 8);

    /// Consumes the writer, returning its output.
    ///
    /// For a growable writer this trims the spare capacity.
    pub fn finish(self) -> B::Out { self.buf.finalize(self.end) }
}
