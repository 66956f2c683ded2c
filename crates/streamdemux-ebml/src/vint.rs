//! EBML variable-length integers.
//!
//! The number of leading zero bits in the first byte gives the total width:
//! - `1xxxxxxx`: 1 byte, 7 data bits
//! - `01xxxxxx xxxxxxxx`: 2 bytes, 14 data bits
//! - ... up to 8 bytes and 56 data bits
//!
//! Sizes whose data bits are all ones mean "unknown size". Element IDs keep
//! their marker bits and are never re-minimized.

use crate::error::{EbmlError, Result};

/// Maximum VINT width in bytes.
pub const MAX_VINT_LENGTH: usize = 8;

/// Maximum element ID width in bytes.
pub const MAX_ID_LENGTH: usize = 4;

/// Declared payload size of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementSize {
    Known(u64),
    /// Streaming element whose end is found by scanning.
    Unknown,
}

impl ElementSize {
    pub fn known(&self) -> Option<u64> {
        match self {
            Self::Known(n) => Some(*n),
            Self::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

/// Width of the VINT starting with `first`, or `None` for a zero byte.
pub fn vint_width(first: u8) -> Option<usize> {
    if first == 0 {
        None
    } else {
        Some(first.leading_zeros() as usize + 1)
    }
}

/// Largest data value of a `width`-byte VINT (the unknown-size pattern).
fn all_ones(width: usize) -> u64 {
    (1u64 << (7 * width)) - 1
}

/// Decode a VINT at `offset`, returning the value with marker bits removed
/// and the number of bytes read.
pub fn decode_vint(bytes: &[u8], offset: usize) -> Result<(u64, usize)> {
    let first = *bytes.get(offset).ok_or(EbmlError::InsufficientData)?;
    let width = vint_width(first).ok_or(EbmlError::InvalidVint { offset })?;
    let end = offset + width;
    if end > bytes.len() {
        return Err(EbmlError::InsufficientData);
    }

    let mask = (1u64 << (8 - width)) - 1;
    let value = bytes[offset + 1..end]
        .iter()
        .fold(first as u64 & mask, |acc, b| (acc << 8) | *b as u64);

    Ok((value, width))
}

/// Decode an element size, mapping the all-ones pattern to [`ElementSize::Unknown`].
pub fn decode_size(bytes: &[u8], offset: usize) -> Result<(ElementSize, usize)> {
    let (value, width) = decode_vint(bytes, offset)?;
    if value == all_ones(width) {
        Ok((ElementSize::Unknown, width))
    } else {
        Ok((ElementSize::Known(value), width))
    }
}

/// Decode an element ID, keeping its marker bits.
pub fn decode_id(bytes: &[u8], offset: usize) -> Result<(u32, usize)> {
    let first = *bytes.get(offset).ok_or(EbmlError::InsufficientData)?;
    let width = vint_width(first).ok_or(EbmlError::InvalidVint { offset })?;
    if width > MAX_ID_LENGTH {
        return Err(EbmlError::IdTooLong { offset, width });
    }
    let end = offset + width;
    if end > bytes.len() {
        return Err(EbmlError::InsufficientData);
    }

    let id = bytes[offset..end]
        .iter()
        .fold(0u32, |acc, b| (acc << 8) | *b as u32);
    Ok((id, width))
}

/// Decode a signed VINT as used by EBML lacing deltas.
///
/// The raw value is biased by `2^(7*width - 1) - 1`.
pub fn decode_signed_vint(bytes: &[u8], offset: usize) -> Result<(i64, usize)> {
    let (raw, width) = decode_vint(bytes, offset)?;
    let bias = (1i64 << (7 * width - 1)) - 1;
    Ok((raw as i64 - bias, width))
}

/// Minimal width able to hold `value` without colliding with the
/// unknown-size pattern.
pub fn vint_len(value: u64) -> Option<usize> {
    (1..=MAX_VINT_LENGTH).find(|w| value < all_ones(*w))
}

/// Encode `value` as a VINT, using the minimal width unless one is forced.
pub fn encode_vint(value: u64, forced_width: Option<usize>) -> Result<Vec<u8>> {
    let width = match forced_width {
        Some(w) if (1..=MAX_VINT_LENGTH).contains(&w) && value < all_ones(w) => w,
        Some(w) => return Err(EbmlError::ValueTooLarge { value, width: w }),
        None => vint_len(value).ok_or(EbmlError::ValueTooLarge {
            value,
            width: MAX_VINT_LENGTH,
        })?,
    };

    let mut out = Vec::with_capacity(width);
    write_vint(&mut out, value, width);
    Ok(out)
}

/// Append `value` as a `width`-byte VINT. The caller guarantees it fits.
pub(crate) fn write_vint(out: &mut Vec<u8>, value: u64, width: usize) {
    let marked = value | (1u64 << (7 * width));
    out.extend_from_slice(&marked.to_be_bytes()[8 - width..]);
}

/// Encode a signed lacing delta with the minimal width.
pub fn encode_signed_vint(value: i64) -> Result<Vec<u8>> {
    for width in 1..=MAX_VINT_LENGTH {
        let bias = (1i64 << (7 * width - 1)) - 1;
        let raw = value + bias;
        if raw >= 0 && (raw as u64) < all_ones(width) {
            let mut out = Vec::with_capacity(width);
            write_vint(&mut out, raw as u64, width);
            return Ok(out);
        }
    }
    Err(EbmlError::ValueTooLarge {
        value: value.unsigned_abs(),
        width: MAX_VINT_LENGTH,
    })
}

/// The reserved unknown-size pattern of the given width.
pub fn encode_unknown_size(width: usize) -> Vec<u8> {
    let width = width.clamp(1, MAX_VINT_LENGTH);
    let mut out = Vec::with_capacity(width);
    let marked = all_ones(width) | (1u64 << (7 * width));
    out.extend_from_slice(&marked.to_be_bytes()[8 - width..]);
    out
}
