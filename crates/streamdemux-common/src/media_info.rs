//! Aggregated media information for a demuxing session.

use serde::{Deserialize, Serialize};

/// Random access points, parallel arrays sorted by time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframesIndex {
    /// Presentation time of each keyframe, in milliseconds.
    pub times: Vec<f64>,
    /// Absolute file position of the data holding each keyframe.
    pub file_positions: Vec<u64>,
}

impl KeyframesIndex {
    pub fn push(&mut self, time_ms: f64, file_position: u64) {
        self.times.push(time_ms);
        self.file_positions.push(file_position);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Index of the last keyframe at or before `time_ms`.
    pub fn nearest_at_or_before(&self, time_ms: f64) -> Option<usize> {
        let idx = self.times.partition_point(|t| *t <= time_ms);
        idx.checked_sub(1)
    }
}

/// Session-level summary dispatched once both expected tracks are resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// `video/webm; codecs="vp8,opus"` style MIME type.
    pub mime_type: Option<String>,
    /// Duration in milliseconds.
    pub duration: Option<f64>,
    pub has_audio: Option<bool>,
    pub has_video: Option<bool>,
    pub audio_codec: Option<String>,
    pub video_codec: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub profile: Option<String>,
    pub level: Option<String>,
    pub ref_frames: Option<u32>,
    pub chroma_format: Option<String>,
    pub sar_num: Option<u32>,
    pub sar_den: Option<u32>,
    pub audio_sample_rate: Option<u32>,
    pub audio_channel_count: Option<u8>,
    pub has_keyframes_index: bool,
    pub keyframes_index: Option<KeyframesIndex>,
    /// Container-declared duration in milliseconds, before any override.
    pub accurate_duration: Option<f64>,
    /// Kilobits observed per second of media time.
    pub bitrate_map: Vec<f64>,
}

impl MediaInfo {
    /// Whether every field required for the announced tracks is present.
    pub fn is_complete(&self) -> bool {
        let audio_complete = match self.has_audio {
            Some(false) => true,
            Some(true) => {
                self.audio_codec.is_some()
                    && self.audio_sample_rate.is_some()
                    && self.audio_channel_count.is_some()
            }
            None => false,
        };
        let video_complete = match self.has_video {
            Some(false) => true,
            Some(true) => {
                self.video_codec.is_some()
                    && self.width.is_some()
                    && self.height.is_some()
                    && self.fps.is_some()
            }
            None => false,
        };
        self.mime_type.is_some() && audio_complete && video_complete
    }

    /// Build the MIME type from a container type and its codec strings.
    pub fn set_mime_type(&mut self, container: &str, codecs: &[String]) {
        let mime = if codecs.is_empty() {
            container.to_string()
        } else {
            format!("{}; codecs=\"{}\"", container, codecs.join(","))
        };
        self.mime_type = Some(mime);
    }

    /// Add `bytes` to the bitrate bucket covering `seconds` of media time.
    pub fn record_bitrate(&mut self, seconds: f64, bytes: usize) {
        let bucket = if seconds < 1.0 {
            0
        } else {
            seconds.ceil() as usize - 1
        };
        if self.bitrate_map.len() <= bucket {
            self.bitrate_map.resize(bucket + 1, 0.0);
        }
        self.bitrate_map[bucket] += bytes as f64 * 8.0 / 1000.0;
    }
}
