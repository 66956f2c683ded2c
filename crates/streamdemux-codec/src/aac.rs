//! AAC AudioSpecificConfig parsing.

use crate::error::{CodecError, Result};
use bytes::Bytes;

/// Sampling frequencies indexed by `samplingFrequencyIndex`.
pub const SAMPLING_FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// Samples per AAC frame.
pub const AAC_FRAME_SAMPLES: u32 = 1024;

/// The leading fields of an AudioSpecificConfig.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    pub object_type: u8,
    pub sampling_index: u8,
    pub sample_rate: u32,
    pub channel_config: u8,
    /// The config as read.
    pub raw: Bytes,
}

impl AudioSpecificConfig {
    /// `mp4a.40.<object type>`
    pub fn codec_string(&self) -> String {
        format!("mp4a.40.{}", self.object_type)
    }
}

/// Parse the first two bytes of an AudioSpecificConfig.
pub fn parse_audio_specific_config(data: &Bytes) -> Result<AudioSpecificConfig> {
    if data.len() < 2 {
        return Err(CodecError::truncated("AudioSpecificConfig"));
    }

    let object_type = data[0] >> 3;
    let sampling_index = ((data[0] & 0x07) << 1) | (data[1] >> 7);
    let channel_config = (data[1] & 0x78) >> 3;

    let sample_rate = sample_rate_for_index(sampling_index).ok_or(CodecError::Unsupported {
        what: "AAC sampling frequency index",
        value: sampling_index as u32,
    })?;

    Ok(AudioSpecificConfig {
        object_type,
        sampling_index,
        sample_rate,
        channel_config,
        raw: data.clone(),
    })
}

pub fn sample_rate_for_index(index: u8) -> Option<u32> {
    SAMPLING_FREQUENCIES.get(index as usize).copied()
}
