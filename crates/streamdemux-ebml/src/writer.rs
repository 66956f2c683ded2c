//! EBML element encoding for the WebM remux path.
//!
//! [`encode`] dispatches on the declared type of the named element.
//! Masters take their children as an ordered list (order is kept) or as a
//! name-keyed map (normalized into ascending ID order, with CRC-32 always
//! first). Scalars use the
//! minimal big-endian width, floats are always written as 8 bytes.

use crate::block::{FLAG_KEYFRAME, Lacing};
use crate::error::{EbmlError, Result};
use crate::spec::{ids, lookup_by_id, lookup_by_name, ElementId, ElementType};
use crate::vint::{decode_vint, encode_unknown_size, encode_vint, vint_len, write_vint, MAX_VINT_LENGTH};
use bytes::Bytes;
use std::collections::HashMap;

/// How the size field of an encoded element is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodedLength {
    /// Minimal width for the actual payload size.
    #[default]
    Auto,
    /// The 8-byte unknown-size pattern, for elements written before their
    /// size is known (a live `Segment`).
    Unknown,
    /// Actual payload size in a fixed-width field.
    Width(usize),
}

/// Content handed to the encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum EbmlValue {
    /// Ordered children of a master element.
    Children(Vec<Child>),
    /// Unordered children of a master element.
    Fields(HashMap<String, EbmlValue>),
    Uint(u64),
    Int(i64),
    Float(f64),
    String(String),
    /// Nanoseconds since 2001-01-01T00:00:00 UTC.
    Date(i64),
    Id(ElementId),
    /// Payload bytes written verbatim, whatever the element type.
    Payload(Bytes),
    /// Total size of a `Void` element, header included.
    Padding(usize),
}

/// A named child of a master element.
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub name: String,
    pub value: EbmlValue,
    pub length: EncodedLength,
}

impl Child {
    pub fn new(name: impl Into<String>, value: EbmlValue) -> Self {
        Self {
            name: name.into(),
            value,
            length: EncodedLength::Auto,
        }
    }

    pub fn with_length(mut self, length: EncodedLength) -> Self {
        self.length = length;
        self
    }
}

/// Encode the element called `name`.
pub fn encode(name: &str, value: &EbmlValue, length: EncodedLength) -> Result<Vec<u8>> {
    let def = lookup_by_name(name).ok_or_else(|| EbmlError::UnknownElement(name.to_string()))?;
    encode_by_id(def.id, value, length)
}

/// Encode an element identified by ID.
pub fn encode_by_id(id: ElementId, value: &EbmlValue, length: EncodedLength) -> Result<Vec<u8>> {
    let def = lookup_by_id(id);
    if let EbmlValue::Padding(total) = value {
        if id != ids::VOID {
            return Err(EbmlError::TypeMismatch {
                name: def.name,
                content: "padding",
            });
        }
        return encode_void(*total);
    }

    let payload = encode_payload(def.name, def.kind, value)?;
    wrap(id, &payload, length)
}

/// Prepend an ID and size field to an encoded payload.
pub fn wrap(id: ElementId, payload: &[u8], length: EncodedLength) -> Result<Vec<u8>> {
    let len = payload.len() as u64;
    let size = match length {
        EncodedLength::Auto => encode_vint(len, None)?,
        EncodedLength::Width(w) => encode_vint(len, Some(w))?,
        EncodedLength::Unknown => encode_unknown_size(MAX_VINT_LENGTH),
    };

    let mut out = id.to_bytes();
    out.reserve(size.len() + payload.len());
    out.extend(size);
    out.extend_from_slice(payload);
    Ok(out)
}

fn encode_payload(name: &'static str, kind: ElementType, value: &EbmlValue) -> Result<Vec<u8>> {
    let mismatch = |content: &'static str| EbmlError::TypeMismatch { name, content };

    match (kind, value) {
        (_, EbmlValue::Payload(bytes)) => Ok(bytes.to_vec()),
        (ElementType::Master, EbmlValue::Children(children)) => {
            let mut out = Vec::new();
            for child in children {
                out.extend(encode(&child.name, &child.value, child.length)?);
            }
            Ok(out)
        }
        (ElementType::Master, EbmlValue::Fields(fields)) => {
            let mut resolved = fields
                .iter()
                .map(|(name, value)| {
                    lookup_by_name(name)
                        .map(|def| (def.id, value))
                        .ok_or_else(|| EbmlError::UnknownElement(name.clone()))
                })
                .collect::<Result<Vec<_>>>()?;
            // CRC-32 must be the first child of its master
            resolved.sort_by_key(|(id, _)| (*id != ids::CRC32, *id));

            let mut out = Vec::new();
            for (id, value) in resolved {
                out.extend(encode_by_id(id, value, EncodedLength::Auto)?);
            }
            Ok(out)
        }
        (ElementType::UnsignedInteger, EbmlValue::Uint(v)) => Ok(uint_bytes(*v)),
        (ElementType::EbmlId, EbmlValue::Id(id)) => Ok(id.to_bytes()),
        (ElementType::EbmlId, EbmlValue::Uint(v)) => Ok(uint_bytes(*v)),
        (ElementType::SignedInteger, EbmlValue::Int(v)) => Ok(int_bytes(*v)),
        (ElementType::Date, EbmlValue::Date(v)) => Ok(v.to_be_bytes().to_vec()),
        (ElementType::Float, EbmlValue::Float(v)) => Ok(v.to_be_bytes().to_vec()),
        (ElementType::String | ElementType::Utf8, EbmlValue::String(s)) => Ok(s.as_bytes().to_vec()),
        (_, EbmlValue::Children(_) | EbmlValue::Fields(_)) => Err(mismatch("master")),
        (_, EbmlValue::Uint(_)) => Err(mismatch("uinteger")),
        (_, EbmlValue::Int(_)) => Err(mismatch("integer")),
        (_, EbmlValue::Float(_)) => Err(mismatch("float")),
        (_, EbmlValue::String(_)) => Err(mismatch("string")),
        (_, EbmlValue::Date(_)) => Err(mismatch("date")),
        (_, EbmlValue::Id(_)) => Err(mismatch("ebmlid")),
        (_, EbmlValue::Padding(_)) => Err(mismatch("padding")),
    }
}

/// Minimal big-endian bytes of an unsigned value; zero is one byte.
fn uint_bytes(v: u64) -> Vec<u8> {
    let width = (8 - v.leading_zeros() as usize / 8).max(1);
    v.to_be_bytes()[8 - width..].to_vec()
}

/// Minimal big-endian two's-complement bytes of a signed value.
fn int_bytes(v: i64) -> Vec<u8> {
    let width = (1..=8)
        .find(|w| {
            let bits = 8 * w - 1;
            bits == 63 || (-(1i64 << bits)..(1i64 << bits)).contains(&v)
        })
        .unwrap_or(8);
    v.to_be_bytes()[8 - width..].to_vec()
}

/// A `Void` element occupying exactly `total` bytes.
pub fn encode_void(total: usize) -> Result<Vec<u8>> {
    for width in 1..=MAX_VINT_LENGTH {
        let Some(payload) = total.checked_sub(1 + width) else {
            break;
        };
        if vint_len(payload as u64).is_some_and(|w| w <= width) {
            let mut out = Vec::with_capacity(total);
            out.push(ids::VOID.0 as u8);
            write_vint(&mut out, payload as u64, width);
            out.resize(total, 0);
            return Ok(out);
        }
    }
    Err(EbmlError::ValueTooLarge {
        value: total as u64,
        width: MAX_VINT_LENGTH,
    })
}

/// Encode a complete `SimpleBlock` element holding one unlaced frame.
pub fn encode_simple_block(track_number: u64, timecode: i16, keyframe: bool, frame: &[u8]) -> Result<Vec<u8>> {
    let flags = if keyframe { FLAG_KEYFRAME } else { 0 };
    let body = crate::block::encode_block(track_number, timecode, flags, Lacing::None, &[frame])?;
    wrap(ids::SIMPLE_BLOCK, &body, EncodedLength::Auto)
}

/// Patch the track number, timecode and keyframe flag of an encoded block body.
///
/// Fields passed as `None` are kept. The result is a new buffer of the old
/// length plus the change in track-number width; every byte after the flags
/// is copied unchanged, as are the flag bits other than the keyframe bit.
pub fn modify_block_info(
    body: &[u8],
    track_number: Option<u64>,
    timecode: Option<i16>,
    keyframe: Option<bool>,
) -> Result<Vec<u8>> {
    let (old_track, old_width) = decode_vint(body, 0).map_err(|e| match e {
        EbmlError::InsufficientData => EbmlError::invalid_block("missing track number"),
        other => other,
    })?;
    let header_end = old_width + 3;
    if body.len() < header_end {
        return Err(EbmlError::invalid_block("block shorter than its header"));
    }

    let track = encode_vint(track_number.unwrap_or(old_track), None)?;
    let delta = track.len() as isize - old_width as isize;
    let mut out = Vec::with_capacity((body.len() as isize + delta) as usize);

    out.extend_from_slice(&track);
    match timecode {
        Some(tc) => out.extend_from_slice(&tc.to_be_bytes()),
        None => out.extend_from_slice(&body[old_width..old_width + 2]),
    }
    let mut flags = body[old_width + 2];
    match keyframe {
        Some(true) => flags |= FLAG_KEYFRAME,
        Some(false) => flags &= !FLAG_KEYFRAME,
        None => {}
    }
    out.push(flags);
    out.extend_from_slice(&body[header_end..]);
    Ok(out)
}
