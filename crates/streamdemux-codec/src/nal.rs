//! H.264 NAL unit helpers.

use bytes::Bytes;
use streamdemux_common::NalUnit;
use tracing::warn;

pub const NAL_SLICE: u8 = 1;
pub const NAL_IDR: u8 = 5;
pub const NAL_SEI: u8 = 6;
pub const NAL_SPS: u8 = 7;
pub const NAL_PPS: u8 = 8;
pub const NAL_AUD: u8 = 9;

/// NAL unit type from the first header byte.
pub fn nal_type(header: u8) -> u8 {
    header & 0x1F
}

/// Remove emulation prevention bytes (`00 00 03` → `00 00`).
pub fn remove_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut zeros = 0usize;

    for &byte in data {
        if zeros >= 2 && byte == 0x03 {
            zeros = 0;
            continue;
        }
        zeros = if byte == 0 { zeros + 1 } else { 0 };
        result.push(byte);
    }

    result
}

/// NAL units of one length-prefixed access unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NalSplit {
    /// Each unit's data keeps its length prefix.
    pub units: Vec<NalUnit>,
    /// An IDR slice was present.
    pub has_idr: bool,
    /// A length prefix was truncated or overran the sample; the bytes after
    /// it were dropped.
    pub malformed: bool,
}

impl NalSplit {
    /// Total bytes of the kept units.
    pub fn len(&self) -> usize {
        self.units.iter().map(|u| u.data.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Split an AVC sample into NAL units with `length_size`-byte prefixes.
pub fn split_length_prefixed(data: &Bytes, length_size: u8) -> NalSplit {
    let prefix = length_size as usize;
    let mut split = NalSplit::default();
    let mut offset = 0usize;

    while offset < data.len() {
        let remaining = data.len() - offset;
        if remaining < prefix + 1 {
            warn!(offset, remaining, "Malformed NAL unit: length prefix truncated");
            split.malformed = true;
            break;
        }

        let size = data[offset..offset + prefix]
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize);
        if size > remaining - prefix {
            warn!(offset, size, remaining, "Malformed NAL unit: size exceeds sample");
            split.malformed = true;
            break;
        }
        if size == 0 {
            offset += prefix;
            continue;
        }

        let unit_type = nal_type(data[offset + prefix]);
        split.has_idr |= unit_type == NAL_IDR;
        split.units.push(NalUnit {
            nal_type: unit_type,
            data: data.slice(offset..offset + prefix + size),
        });
        offset += prefix + size;
    }

    split
}
