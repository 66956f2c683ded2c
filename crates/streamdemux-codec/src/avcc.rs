//! AVCDecoderConfigurationRecord (`avcC`) parsing.

use crate::error::{CodecError, Result};
use crate::sps::{parse_sps, SpsInfo};
use bytes::Bytes;
use tracing::warn;

/// A parsed `avcC` record.
#[derive(Debug, Clone, PartialEq)]
pub struct AvcConfig {
    pub version: u8,
    pub profile_indication: u8,
    pub profile_compatibility: u8,
    pub level_indication: u8,
    /// Width of the NAL length prefix in samples (3 or 4).
    pub nal_length_size: u8,
    /// SPS NAL units, without length prefixes.
    pub sps: Vec<Bytes>,
    /// PPS NAL units, without length prefixes.
    pub pps: Vec<Bytes>,
    /// The first SPS, parsed.
    pub sps_info: SpsInfo,
    /// The record as read.
    pub raw: Bytes,
}

impl AvcConfig {
    /// `avc1.` followed by the hex of the first SPS's profile, constraint
    /// and level bytes.
    pub fn codec_string(&self) -> String {
        match self.sps.first() {
            Some(sps) if sps.len() >= 4 => {
                format!("avc1.{:02x}{:02x}{:02x}", sps[1], sps[2], sps[3])
            }
            _ => format!(
                "avc1.{:02x}{:02x}{:02x}",
                self.profile_indication, self.profile_compatibility, self.level_indication
            ),
        }
    }
}

/// Parse an `avcC` box payload or a Matroska `V_MPEG4/ISO/AVC` CodecPrivate.
pub fn parse_avcc(data: &Bytes) -> Result<AvcConfig> {
    if data.len() < 7 {
        return Err(CodecError::truncated("avcC"));
    }

    let version = data[0];
    if version != 1 {
        return Err(CodecError::Unsupported {
            what: "avcC configurationVersion",
            value: version as u32,
        });
    }

    let nal_length_size = (data[4] & 0x03) + 1;
    if nal_length_size != 3 && nal_length_size != 4 {
        return Err(CodecError::Unsupported {
            what: "avcC NAL length size",
            value: nal_length_size as u32,
        });
    }

    let sps_count = (data[5] & 0x1F) as usize;
    if sps_count == 0 {
        return Err(CodecError::invalid("avcC", "no SPS"));
    }

    let mut offset = 6;
    let sps = read_parameter_sets(data, &mut offset, sps_count, "avcC SPS")?;

    let pps = if offset < data.len() {
        let pps_count = data[offset] as usize;
        offset += 1;
        read_parameter_sets(data, &mut offset, pps_count, "avcC PPS")?
    } else {
        warn!("avcC has no PPS section");
        Vec::new()
    };

    let sps_info = parse_sps(&sps[0])?;

    Ok(AvcConfig {
        version,
        profile_indication: data[1],
        profile_compatibility: data[2],
        level_indication: data[3],
        nal_length_size,
        sps,
        pps,
        sps_info,
        raw: data.clone(),
    })
}

fn read_parameter_sets(
    data: &Bytes,
    offset: &mut usize,
    count: usize,
    what: &'static str,
) -> Result<Vec<Bytes>> {
    let mut sets = Vec::with_capacity(count);
    for _ in 0..count {
        if *offset + 2 > data.len() {
            return Err(CodecError::truncated(what));
        }
        let len = u16::from_be_bytes([data[*offset], data[*offset + 1]]) as usize;
        *offset += 2;
        if *offset + len > data.len() {
            return Err(CodecError::truncated(what));
        }
        if len == 0 {
            return Err(CodecError::invalid(what, "zero-length parameter set"));
        }
        sets.push(data.slice(*offset..*offset + len));
        *offset += len;
    }
    Ok(sets)
}
