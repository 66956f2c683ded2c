//! Matroska block bodies and frame lacing.
//!
//! A `SimpleBlock` or `Block` payload starts with the track number (VINT),
//! a signed 16-bit timecode relative to the cluster, and a flags byte:
//!
//! | bit  | SimpleBlock   | Block      |
//! |------|---------------|------------|
//! | 0x80 | keyframe      | reserved   |
//! | 0x08 | invisible     | invisible  |
//! | 0x06 | lacing        | lacing     |
//! | 0x01 | discardable   | reserved   |

use crate::error::{EbmlError, Result};
use crate::vint::{decode_signed_vint, decode_vint, encode_signed_vint, encode_vint};
use bytes::Bytes;
use std::ops::Range;
use tracing::warn;

pub const FLAG_KEYFRAME: u8 = 0x80;
pub const FLAG_INVISIBLE: u8 = 0x08;
pub const FLAG_DISCARDABLE: u8 = 0x01;
const LACING_MASK: u8 = 0x06;

/// How multiple frames are packed into one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lacing {
    None,
    Xiph,
    Fixed,
    Ebml,
}

impl Lacing {
    pub fn from_flags(flags: u8) -> Self {
        match flags & LACING_MASK {
            0x00 => Self::None,
            0x02 => Self::Xiph,
            0x04 => Self::Fixed,
            _ => Self::Ebml,
        }
    }

    pub fn flag_bits(&self) -> u8 {
        match self {
            Self::None => 0x00,
            Self::Xiph => 0x02,
            Self::Fixed => 0x04,
            Self::Ebml => 0x06,
        }
    }
}

/// A parsed block body.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub track_number: u64,
    /// Timecode relative to the enclosing cluster.
    pub timecode: i16,
    pub flags: u8,
    pub lacing: Lacing,
    /// Byte ranges of each frame within [`Block::body`].
    pub frames: Vec<Range<usize>>,
    body: Bytes,
}

impl Block {
    /// Parse a block body (the payload of a `SimpleBlock` or `Block` element).
    pub fn parse(body: Bytes) -> Result<Self> {
        let (track_number, track_len) = decode_vint(&body, 0).map_err(|e| match e {
            EbmlError::InsufficientData => EbmlError::invalid_block("missing track number"),
            other => other,
        })?;
        let header_end = track_len + 3;
        if body.len() < header_end {
            return Err(EbmlError::invalid_block(format!(
                "block of {} bytes is shorter than its header",
                body.len()
            )));
        }
        let timecode = i16::from_be_bytes([body[track_len], body[track_len + 1]]);
        let flags = body[track_len + 2];
        let lacing = Lacing::from_flags(flags);
        let frames = parse_lacing(&body, header_end, lacing)?;

        Ok(Self {
            track_number,
            timecode,
            flags,
            lacing,
            frames,
            body,
        })
    }

    /// SimpleBlock keyframe flag.
    pub fn is_keyframe(&self) -> bool {
        self.flags & FLAG_KEYFRAME != 0
    }

    pub fn is_invisible(&self) -> bool {
        self.flags & FLAG_INVISIBLE != 0
    }

    pub fn is_discardable(&self) -> bool {
        self.flags & FLAG_DISCARDABLE != 0
    }

    /// The full encoded block body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frame payloads as zero-copy slices of the body.
    pub fn frame_data(&self) -> impl Iterator<Item = Bytes> + '_ {
        self.frames.iter().map(|r| self.body.slice(r.clone()))
    }

    /// Offset of the first frame within the body.
    pub fn frames_offset(&self) -> usize {
        self.frames.first().map_or(self.body.len(), |r| r.start)
    }

    /// Total bytes of frame data.
    pub fn frames_data_len(&self) -> usize {
        self.frames.iter().map(|r| r.len()).sum()
    }
}

/// Split the data following the block header into frame ranges.
///
/// The last frame is never sized explicitly; it takes the remaining bytes.
pub fn parse_lacing(body: &[u8], header_end: usize, lacing: Lacing) -> Result<Vec<Range<usize>>> {
    if lacing == Lacing::None {
        return Ok(vec![header_end..body.len()]);
    }

    let count = *body
        .get(header_end)
        .ok_or_else(|| EbmlError::invalid_block("missing lace count"))? as usize
        + 1;
    let mut pos = header_end + 1;
    let mut sizes = Vec::with_capacity(count);

    match lacing {
        Lacing::None => {}
        Lacing::Xiph => {
            for _ in 0..count - 1 {
                let mut size = 0usize;
                loop {
                    let b = *body
                        .get(pos)
                        .ok_or_else(|| EbmlError::invalid_block("truncated Xiph lace size"))?;
                    pos += 1;
                    size += b as usize;
                    if b != 0xFF {
                        break;
                    }
                }
                sizes.push(size);
            }
        }
        Lacing::Fixed => {
            let remaining = body.len() - pos;
            if remaining % count != 0 {
                warn!(remaining, count, "Fixed lacing does not divide evenly");
                return Err(EbmlError::invalid_block(format!(
                    "{remaining} bytes cannot be split into {count} equal frames"
                )));
            }
            sizes.resize(count - 1, remaining / count);
        }
        Lacing::Ebml => {
            if count > 1 {
                let (first, len) = decode_vint(body, pos).map_err(lace_error)?;
                pos += len;
                let mut size = first as i64;
                sizes.push(first as usize);
                for _ in 1..count - 1 {
                    let (delta, len) = decode_signed_vint(body, pos).map_err(lace_error)?;
                    pos += len;
                    size += delta;
                    if size < 0 {
                        warn!(size, "EBML lace size delta goes negative");
                        return Err(EbmlError::invalid_block("negative EBML lace size"));
                    }
                    sizes.push(size as usize);
                }
            }
        }
    }

    let explicit: usize = sizes.iter().sum();
    let remaining = body.len().saturating_sub(pos);
    if explicit > remaining {
        warn!(explicit, remaining, ?lacing, "Lace sizes exceed block data");
        return Err(EbmlError::invalid_block(format!(
            "lace sizes total {explicit} bytes but only {remaining} remain"
        )));
    }
    sizes.push(remaining - explicit);

    let mut frames = Vec::with_capacity(count);
    for size in sizes {
        frames.push(pos..pos + size);
        pos += size;
    }
    Ok(frames)
}

fn lace_error(e: EbmlError) -> EbmlError {
    match e {
        EbmlError::InsufficientData => EbmlError::invalid_block("truncated EBML lace size"),
        other => other,
    }
}

/// Encode a block body holding `frames`, laced as requested.
///
/// A single frame is always written unlaced.
pub fn encode_block(
    track_number: u64,
    timecode: i16,
    flags: u8,
    lacing: Lacing,
    frames: &[&[u8]],
) -> Result<Vec<u8>> {
    let lacing = if frames.len() <= 1 { Lacing::None } else { lacing };
    if frames.len() > 256 {
        return Err(EbmlError::invalid_block("at most 256 frames fit in one block"));
    }

    let mut out = encode_vint(track_number, None)?;
    out.extend_from_slice(&timecode.to_be_bytes());
    out.push((flags & !LACING_MASK) | lacing.flag_bits());

    if lacing != Lacing::None {
        out.push((frames.len() - 1) as u8);
        let head = &frames[..frames.len() - 1];
        match lacing {
            Lacing::None => {}
            Lacing::Xiph => {
                for frame in head {
                    let mut size = frame.len();
                    while size >= 0xFF {
                        out.push(0xFF);
                        size -= 0xFF;
                    }
                    out.push(size as u8);
                }
            }
            Lacing::Fixed => {
                if frames.iter().any(|f| f.len() != frames[0].len()) {
                    return Err(EbmlError::invalid_block("fixed lacing needs equal frame sizes"));
                }
            }
            Lacing::Ebml => {
                out.extend(encode_vint(head[0].len() as u64, None)?);
                for pair in head.windows(2) {
                    let delta = pair[1].len() as i64 - pair[0].len() as i64;
                    out.extend(encode_signed_vint(delta)?);
                }
            }
        }
    }

    for frame in frames {
        out.extend_from_slice(frame);
    }
    Ok(out)
}
