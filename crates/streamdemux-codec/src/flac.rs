//! FLAC stream header parsing.
//!
//! Matroska stores the FLAC stream marker and metadata blocks in the
//! track's CodecPrivate. Only STREAMINFO is interpreted.

use crate::error::{CodecError, Result};
use bytes::Bytes;

const FLAC_MAGIC: &[u8; 4] = b"fLaC";
const BLOCK_STREAMINFO: u8 = 0;
const STREAMINFO_LEN: usize = 34;

/// Fields of the STREAMINFO metadata block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlacStreamInfo {
    pub min_block_size: u16,
    pub max_block_size: u16,
    pub min_frame_size: u32,
    pub max_frame_size: u32,
    pub sample_rate: u32,
    pub channels: u8,
    pub bit_depth: u8,
    /// Total samples per channel, zero when unknown.
    pub total_samples: u64,
    /// Metadata blocks without the stream marker.
    pub config: Bytes,
}

/// Parse a FLAC CodecPrivate: `fLaC` followed by metadata blocks.
pub fn parse_flac_header(data: &Bytes) -> Result<FlacStreamInfo> {
    if data.len() < 4 {
        return Err(CodecError::truncated("FLAC header"));
    }
    if &data[..4] != FLAC_MAGIC {
        return Err(CodecError::invalid("FLAC header", "missing fLaC stream marker"));
    }

    let mut offset = 4;
    loop {
        if offset + 4 > data.len() {
            return Err(CodecError::invalid("FLAC header", "no STREAMINFO block"));
        }
        let header = data[offset];
        let block_type = header & 0x7F;
        let last = header & 0x80 != 0;
        let len = ((data[offset + 1] as usize) << 16)
            | ((data[offset + 2] as usize) << 8)
            | data[offset + 3] as usize;
        offset += 4;

        if block_type == BLOCK_STREAMINFO {
            if len < STREAMINFO_LEN || offset + STREAMINFO_LEN > data.len() {
                return Err(CodecError::truncated("FLAC STREAMINFO"));
            }
            let info = parse_streaminfo(&data[offset..offset + STREAMINFO_LEN]);
            return Ok(FlacStreamInfo {
                config: data.slice(4..),
                ..info
            });
        }
        if last {
            return Err(CodecError::invalid("FLAC header", "no STREAMINFO block"));
        }
        offset += len;
    }
}

fn parse_streaminfo(block: &[u8]) -> FlacStreamInfo {
    let u24 = |at: usize| ((block[at] as u32) << 16) | ((block[at + 1] as u32) << 8) | block[at + 2] as u32;

    // 20 bits sample rate, 3 bits channels - 1, 5 bits bits per sample - 1,
    // 36 bits total samples
    let (s1, s2, s3, s4) = (block[10] as u32, block[11] as u32, block[12] as u32, block[13] as u32);
    let sample_rate = (s1 << 12) | (s2 << 4) | (s3 >> 4);
    let channels = (((s3 >> 1) & 0x07) + 1) as u8;
    let bit_depth = ((((s3 & 0x01) << 4) | (s4 >> 4)) + 1) as u8;
    let total_samples = ((s4 as u64 & 0x0F) << 32)
        | u32::from_be_bytes([block[14], block[15], block[16], block[17]]) as u64;

    FlacStreamInfo {
        min_block_size: u16::from_be_bytes([block[0], block[1]]),
        max_block_size: u16::from_be_bytes([block[2], block[3]]),
        min_frame_size: u24(4),
        max_frame_size: u24(7),
        sample_rate,
        channels,
        bit_depth,
        total_samples,
        config: Bytes::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    /// 44.1 kHz, stereo, 16 bit, 441000 samples.
    fn streaminfo() -> Vec<u8> {
        let mut block = vec![0x10, 0x00, 0x10, 0x00, 0x00, 0x00, 0x0E, 0x00, 0x30, 0x00];
        // 44100 = 0x0AC44: s1 = 0x0A, s2 = 0xC4, s3 high nibble = 4
        // channels - 1 = 1, bits - 1 = 15
        block.extend_from_slice(&[0x0A, 0xC4, 0x42, 0xF0]);
        block.extend_from_slice(&441000u32.to_be_bytes());
        block.extend_from_slice(&[0u8; 16]);
        block
    }

    fn header(blocks: &[(u8, Vec<u8>)]) -> Bytes {
        let mut out = b"fLaC".to_vec();
        for (i, (kind, body)) in blocks.iter().enumerate() {
            let last = if i + 1 == blocks.len() { 0x80 } else { 0 };
            out.push(kind | last);
            out.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
            out.extend_from_slice(body);
        }
        Bytes::from(out)
    }

    #[test]
    fn test_parse_streaminfo() {
        let data = header(&[(0, streaminfo())]);
        let info = parse_flac_header(&data).unwrap();
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.channels, 2);
        assert_eq!(info.bit_depth, 16);
        assert_eq!(info.total_samples, 441000);
        assert_eq!(info.min_block_size, 4096);
        assert_eq!(info.max_frame_size, 0x3000);
        assert_eq!(info.config, data.slice(4..));
    }

    #[test]
    fn test_skips_blocks_before_streaminfo() {
        let data = header(&[(4, vec![0; 12]), (0, streaminfo())]);
        assert_eq!(parse_flac_header(&data).unwrap().sample_rate, 44100);
    }

    #[test]
    fn test_rejects_bad_headers() {
        assert_matches!(
            parse_flac_header(&Bytes::from_static(b"OggS\0\0\0\0")),
            Err(CodecError::InvalidConfig { .. })
        );
        assert_matches!(
            parse_flac_header(&header(&[(4, vec![0; 4])])),
            Err(CodecError::InvalidConfig { .. })
        );

        let mut short = header(&[(0, streaminfo())]).to_vec();
        short.truncate(20);
        assert_matches!(parse_flac_header(&Bytes::from(short)), Err(CodecError::Truncated { .. }));
    }
}
