use crate::demux::DemuxOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub demux: DemuxConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DemuxConfig {
    /// Added to every sample timestamp, in milliseconds
    #[serde(default)]
    pub timestamp_base_ms: i64,

    /// Replaces the duration declared by the container, in milliseconds
    #[serde(default)]
    pub duration_override_ms: Option<f64>,

    /// Accept FLAC audio in Matroska files
    #[serde(default = "default_allow_flac")]
    pub allow_flac: bool,

    /// Frame rate assumed when neither the SPS nor the container declares one
    #[serde(default = "default_fallback_frame_rate")]
    pub fallback_frame_rate: f64,

    /// Maintain the per-second bitrate map while demuxing
    #[serde(default = "default_record_bitrate")]
    pub record_bitrate: bool,
}

fn default_allow_flac() -> bool {
    true
}
fn default_fallback_frame_rate() -> f64 {
    24.0
}
fn default_record_bitrate() -> bool {
    true
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            timestamp_base_ms: 0,
            duration_override_ms: None,
            allow_flac: default_allow_flac(),
            fallback_frame_rate: default_fallback_frame_rate(),
            record_bitrate: default_record_bitrate(),
        }
    }
}

impl From<&DemuxConfig> for DemuxOptions {
    fn from(config: &DemuxConfig) -> Self {
        Self {
            timestamp_base_ms: config.timestamp_base_ms,
            duration_override_ms: config.duration_override_ms,
            allow_flac: config.allow_flac,
            fallback_frame_rate: config.fallback_frame_rate,
            record_bitrate: config.record_bitrate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
