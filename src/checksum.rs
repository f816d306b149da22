//! # Additive checksums
//!
//! Byte sums truncated to 8 or 16 bits. They catch accidental corruption (any single
//! flipped bit changes the sum) and nothing more: they are trivially forgeable.
//!
//! A sub-range can be excluded from the sum, which is how a checksum field stored inside
//! the covered bytes avoids summing itself.
//!
//! # Example
//!
//! ```
//! use binframe::checksum::*;
//!
//! let data = [0x01, 0x02, 0xFF, 0x00, 0x10];
//! assert_eq!(compute8(&data, None), 0x12);
//! assert_eq!(compute16(&data, None), 0x0112);
//!
//! // pretend bytes 3..5 hold the checksum itself
//! let sum = compute16(&data, Some(3..5));
//! assert!(verify(&data, u16::from(sum), Some(3..5), ChecksumWidth::U16));
//! ```

use crate::{
    cursor::{ByteCursor, ByteWriter, Endian, WriteBuf},
    errors::{CodecError, Result},
    util::wrapping_sum,
};
use std::ops::Range;

/// Width of a checksum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChecksumWidth {
    U8,
    U16,
}

impl ChecksumWidth {
    /// Encoded size of the checksum.
    pub fn bytes(self) -> usize {
        match self {
            ChecksumWidth::U8 => 1,
            ChecksumWidth::U16 => 2,
        }
    }

    fn mask(self) -> u32 {
        match self {
            ChecksumWidth::U8 => 0xFF,
            ChecksumWidth::U16 => 0xFFFF,
        }
    }
}

fn sum_excluding(bytes: &[u8], exclude: Option<Range<usize>>) -> u32 {
    match exclude {
        None => wrapping_sum(bytes),
        Some(r) => {
            let start = r.start.min(bytes.len());
            let end = r.end.max(start).min(bytes.len());
            wrapping_sum(&bytes[..start]).wrapping_add(wrapping_sum(&bytes[end..]))
        }
    }
}

/// Checksum of the given width, widened to `u16`.
pub fn compute(bytes: &[u8], exclude: Option<Range<usize>>, width: ChecksumWidth) -> u16 {
    (sum_excluding(bytes, exclude) & width.mask()) as u16
}

/// Sum of all bytes modulo 256, skipping `exclude`.
pub fn compute8(bytes: &[u8], exclude: Option<Range<usize>>) -> u8 {
    compute(bytes, exclude, ChecksumWidth::U8) as u8
}

/// Sum of all bytes modulo 65536, skipping `exclude`.
pub fn compute16(bytes: &[u8], exclude: Option<Range<usize>>) -> u16 {
    compute(bytes, exclude, ChecksumWidth::U16)
}

/// Recomputes the checksum and compares it with `stored`.
///
/// For [`ChecksumWidth::U8`] a `stored` value above 255 never verifies.
pub fn verify(bytes: &[u8], stored: u16, exclude: Option<Range<usize>>, width: ChecksumWidth) -> bool {
    compute(bytes, exclude, width) == stored
}

/// Appends the checksum of everything written so far.
pub fn write_trailer<B: WriteBuf>(w: &mut ByteWriter<B>, width: ChecksumWidth) -> Result<u16> {
    let sum = compute(w.as_slice(), None, width);
    match width {
        ChecksumWidth::U8 => w.write_u8(sum as u8)?,
        ChecksumWidth::U16 => w.write_u16(sum)?,
    }
    Ok(sum)
}

/// Reads a stored checksum of the given width.
pub fn read_trailer(c: &mut ByteCursor<'_>, width: ChecksumWidth) -> Result<u16> {
    match width {
        ChecksumWidth::U8 => c.read_u8().map(u16::from),
        ChecksumWidth::U16 => c.read_u16(),
    }
}

/// Checks that the last `width.bytes()` bytes of `buf` hold the checksum of the rest.
///
/// # Errors
///
/// [`CodecError::Truncated`] if `buf` is too short to hold a trailer,
/// [`CodecError::ChecksumMismatch`] if the sums differ.
pub fn check_trailer(buf: &[u8], order: Endian, width: ChecksumWidth) -> Result<()> {
    let body_len = buf.len().checked_sub(width.bytes()).ok_or(CodecError::Truncated {
        offset: 0,
        expected: width.bytes(),
        available: buf.len(),
    })?;
    let mut c = ByteCursor::new(buf, order);
    c.seek(body_len)?;
    let stored = read_trailer(&mut c, width)?;
    let computed = compute(&buf[..body_len], None, width);
    if stored == computed {
        Ok(())
    } else {
        Err(CodecError::ChecksumMismatch { stored, computed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_wrap_at_width() {
        let data = [0xFFu8; 3];
        assert_eq!(compute8(&data, None), 0xFD);
        assert_eq!(compute16(&data, None), 0x02FD);
        assert_eq!(compute8(&[], None), 0);
    }

    #[test]
    fn excluded_range_is_skipped() {
        let data = [1u8, 2, 3, 4, 5];
        assert_eq!(compute8(&data, Some(1..3)), 1 + 4 + 5);
        // out of range bounds are clamped
        assert_eq!(compute8(&data, Some(4..100)), 1 + 2 + 3 + 4);
        assert_eq!(compute8(&data, Some(10..20)), 15);
        #[allow(clippy::reversed_empty_ranges)]
        let backwards = 3..1;
        assert_eq!(compute8(&data, Some(backwards)), 15);
    }

    #[test]
    fn deterministic() {
        let data: Vec<u8> = (0..=255).collect();
        assert_eq!(compute16(&data, None), compute16(&data.clone(), None));
        assert_eq!(compute16(&data, None), (0..=255u32).sum::<u32>() as u16);
    }

    #[test]
    fn verify_rejects_changes() {
        let mut data = vec![10u8, 20, 30, 0];
        let sum = compute8(&data, Some(3..4));
        data[3] = sum;
        assert!(verify(&data, u16::from(sum), Some(3..4), ChecksumWidth::U8));
        data[0] ^= 0x01;
        assert!(!verify(&data, u16::from(sum), Some(3..4), ChecksumWidth::U8));
        assert!(!verify(&data, 0x100, None, ChecksumWidth::U8));
    }

    #[test]
    fn every_single_bit_flip_is_caught() {
        let data = b"some body bytes".to_vec();
        for width in &[ChecksumWidth::U8, ChecksumWidth::U16] {
            let sum = compute(&data, None, *width);
            for i in 0..data.len() * 8 {
                let mut flipped = data.clone();
                flipped[i / 8] ^= 1 << (i % 8);
                assert!(!verify(&flipped, sum, None, *width), "bit {} undetected", i);
            }
        }
    }

    #[test]
    fn trailer_round_trip() {
        for order in &[Endian::Big, Endian::Little] {
            let mut w = ByteWriter::new(*order);
            w.write_bytes(&[0x80, 0x90, 0xA0]).unwrap();
            let sum = write_trailer(&mut w, ChecksumWidth::U16).unwrap();
            assert_eq!(sum, 0x80 + 0x90 + 0xA0);
            let out = w.finish();
            assert_eq!(out.len(), 5);
            assert!(check_trailer(&out, *order, ChecksumWidth::U16).is_ok());
        }
    }

    #[test]
    fn trailer_mismatch() {
        let buf = [1u8, 2, 3, 7];
        assert_eq!(
            check_trailer(&buf, Endian::Big, ChecksumWidth::U8),
            Err(CodecError::ChecksumMismatch {
                stored: 7,
                computed: 6,
            })
        );
        assert!(check_trailer(&[1u8], Endian::Big, ChecksumWidth::U16)
            .unwrap_err()
            .is_truncation());
    }
}
