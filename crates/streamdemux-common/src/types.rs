//! Track metadata and loader control-flow types.
//!
//! Timestamps and durations carried by these types are expressed in the
//! track's `timescale` (ticks per second) unless the field name says
//! otherwise.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Video track.
    Video,
    /// Audio track.
    Audio,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// What a demuxer did with a delivered chunk.
///
/// The loader drops `n` bytes from the front of its buffer after
/// `Consumed(n)`, keeps everything after `NeedMoreData`, and restarts
/// delivery at the absolute position carried by `SeekTo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkResult {
    /// `n` bytes (always > 0) from the start of the chunk were used.
    Consumed(usize),
    /// Nothing could be used yet; re-deliver the same bytes with more appended.
    NeedMoreData,
    /// Discard the buffer and continue delivery from this absolute offset.
    SeekTo(u64),
}

impl ChunkResult {
    /// Build a result from a consumed byte count.
    pub fn from_consumed(n: usize) -> Self {
        if n == 0 {
            Self::NeedMoreData
        } else {
            Self::Consumed(n)
        }
    }

    /// Number of bytes consumed, zero for the other variants.
    pub fn consumed(&self) -> usize {
        match self {
            Self::Consumed(n) => *n,
            _ => 0,
        }
    }
}

/// Frame rate as reported by the bitstream or derived from the container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRate {
    /// Whether the stream signals a fixed frame rate.
    pub fixed: bool,
    /// Frames per second.
    pub fps: f64,
    /// Numerator of `fps`.
    pub fps_num: u32,
    /// Denominator of `fps`.
    pub fps_den: u32,
}

impl FrameRate {
    /// Build a frame rate from a rational value.
    pub fn from_ratio(fps_num: u32, fps_den: u32, fixed: bool) -> Self {
        let fps = if fps_den == 0 {
            0.0
        } else {
            fps_num as f64 / fps_den as f64
        };
        Self {
            fixed,
            fps,
            fps_num,
            fps_den,
        }
    }

    /// Approximate a floating frame rate with a millihertz denominator.
    pub fn from_fps(fps: f64) -> Self {
        Self::from_ratio((fps * 1000.0).round() as u32, 1000, true)
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::from_ratio(23976, 1000, true)
    }
}

/// Sample aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sar {
    pub width: u32,
    pub height: u32,
}

impl Default for Sar {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }
}

/// Codec metadata for the active video track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub track_id: u32,
    /// Ticks per second of every timestamp on this track.
    pub timescale: u32,
    /// Duration in `timescale` ticks.
    pub duration: u64,
    /// RFC 6381 codec string (`avc1.64001f`, `vp8`, ...).
    pub codec: String,
    /// Decoded picture size.
    pub codec_width: u32,
    pub codec_height: u32,
    /// Display size after cropping and SAR scaling.
    pub present_width: u32,
    pub present_height: u32,
    pub profile: Option<String>,
    pub level: Option<String>,
    pub bit_depth: u8,
    pub chroma_format: Option<u8>,
    pub ref_frames: Option<u32>,
    pub sar: Sar,
    pub frame_rate: FrameRate,
    /// Nominal sample duration in `timescale` ticks.
    pub ref_sample_duration: f64,
    /// NAL length prefix width for AVC payloads.
    pub nal_length_size: Option<u8>,
    /// Codec configuration record (avcC or CodecPrivate).
    #[serde(skip)]
    pub config: Bytes,
}

/// Codec metadata for the active audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub track_id: u32,
    /// Ticks per second of every timestamp on this track.
    pub timescale: u32,
    /// Duration in `timescale` ticks.
    pub duration: u64,
    /// RFC 6381 codec string (`mp4a.40.2`, `flac`, `opus`, ...).
    pub codec: String,
    pub sample_rate: u32,
    pub channel_count: u8,
    pub bit_depth: Option<u8>,
    /// AAC audio object type, when the stream is AAC.
    pub object_type: Option<u8>,
    /// Nominal sample duration in `timescale` ticks.
    pub ref_sample_duration: f64,
    /// Decoder configuration (AudioSpecificConfig, FLAC metadata, ...).
    #[serde(skip)]
    pub config: Bytes,
}

/// Metadata announced once per active track, before any of its samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrackMetadata {
    Video(VideoMetadata),
    Audio(AudioMetadata),
}

impl TrackMetadata {
    /// The track kind this metadata describes.
    pub fn kind(&self) -> TrackKind {
        match self {
            Self::Video(_) => TrackKind::Video,
            Self::Audio(_) => TrackKind::Audio,
        }
    }

    /// Codec string of the track.
    pub fn codec(&self) -> &str {
        match self {
            Self::Video(v) => &v.codec,
            Self::Audio(a) => &a.codec,
        }
    }

    /// Ticks per second of the track's timestamps.
    pub fn timescale(&self) -> u32 {
        match self {
            Self::Video(v) => v.timescale,
            Self::Audio(a) => a.timescale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_result_from_consumed() {
        assert_eq!(ChunkResult::from_consumed(0), ChunkResult::NeedMoreData);
        assert_eq!(ChunkResult::from_consumed(7), ChunkResult::Consumed(7));
        assert_eq!(ChunkResult::SeekTo(100).consumed(), 0);
    }

    #[test]
    fn test_frame_rate_from_ratio() {
        let rate = FrameRate::from_ratio(30000, 1001, true);
        assert!((rate.fps - 29.97).abs() < 0.01);

        let zero = FrameRate::from_ratio(25, 0, false);
        assert_eq!(zero.fps, 0.0);
    }

    #[test]
    fn test_track_kind_serialization() {
        let json = serde_json::to_string(&TrackKind::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
        assert_eq!(TrackKind::Video.to_string(), "video");
    }
}
