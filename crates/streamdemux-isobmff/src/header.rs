//! Box type codes and box headers.

use crate::error::{IsoError, Result};
use std::fmt;

/// Four-character box type code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const FTYP: Self = Self(*b"ftyp");
    pub const MOOV: Self = Self(*b"moov");
    pub const MDAT: Self = Self(*b"mdat");
    pub const FREE: Self = Self(*b"free");
    pub const MVHD: Self = Self(*b"mvhd");
    pub const TRAK: Self = Self(*b"trak");
    pub const TKHD: Self = Self(*b"tkhd");
    pub const MDIA: Self = Self(*b"mdia");
    pub const MDHD: Self = Self(*b"mdhd");
    pub const HDLR: Self = Self(*b"hdlr");
    pub const MINF: Self = Self(*b"minf");
    pub const STBL: Self = Self(*b"stbl");
    pub const STSD: Self = Self(*b"stsd");
    pub const AVC1: Self = Self(*b"avc1");
    pub const AVCC: Self = Self(*b"avcC");
    pub const MP4A: Self = Self(*b"mp4a");
    pub const ESDS: Self = Self(*b"esds");
    pub const STTS: Self = Self(*b"stts");
    pub const CTTS: Self = Self(*b"ctts");
    pub const STSS: Self = Self(*b"stss");
    pub const STSC: Self = Self(*b"stsc");
    pub const STSZ: Self = Self(*b"stsz");
    pub const STCO: Self = Self(*b"stco");
    pub const CO64: Self = Self(*b"co64");

    /// Handler types carried by `hdlr`.
    pub const VIDE: Self = Self(*b"vide");
    pub const SOUN: Self = Self(*b"soun");

    /// The 4-char code as a string, `????` when not ASCII.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }

    /// Boxes whose payload is a plain sequence of child boxes.
    pub fn is_container(&self) -> bool {
        matches!(*self, Self::MOOV | Self::TRAK | Self::MDIA | Self::MINF | Self::STBL)
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({})", self.as_str())
    }
}

/// Parsed box header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    pub kind: FourCC,
    /// Total size including the header. `None` for a size field of zero,
    /// which extends the box to the end of the enclosing data.
    pub size: Option<u64>,
    /// 8, or 16 with a 64-bit size.
    pub header_len: usize,
}

impl BoxHeader {
    /// Total size, resolving "to the end" against the bytes left after the
    /// box start.
    pub fn total_len(&self, remaining: u64) -> u64 {
        self.size.unwrap_or(remaining)
    }

    /// Whether the whole box lies within `remaining` bytes.
    pub fn is_complete(&self, remaining: u64) -> bool {
        self.size.map_or(true, |size| size <= remaining)
    }
}

/// Read a box header at `offset`.
///
/// `Ok(None)` when the eight header bytes (or the sixteen of a 64-bit size)
/// are not yet buffered.
pub fn read_box_header(bytes: &[u8], offset: usize) -> Result<Option<BoxHeader>> {
    let Some(head) = bytes.get(offset..offset + 8) else {
        return Ok(None);
    };
    let size32 = u32::from_be_bytes([head[0], head[1], head[2], head[3]]) as u64;
    let kind = FourCC([head[4], head[5], head[6], head[7]]);

    let (size, header_len) = match size32 {
        0 => (None, 8),
        1 => {
            let Some(ext) = bytes.get(offset + 8..offset + 16) else {
                return Ok(None);
            };
            let mut raw = [0u8; 8];
            raw.copy_from_slice(ext);
            (Some(u64::from_be_bytes(raw)), 16)
        }
        n => (Some(n), 8),
    };

    if let Some(size) = size {
        if size < header_len as u64 {
            return Err(IsoError::InvalidSize {
                kind,
                offset: offset as u64,
                size,
            });
        }
    }

    Ok(Some(BoxHeader { kind, size, header_len }))
}
