//! Incremental container demuxing.
//!
//! A loader hands the demuxer whatever bytes it has, together with their
//! absolute file offset, and acts on the returned [`ChunkResult`]. Parsed
//! samples, track metadata and media info flow out through a [`DemuxSink`].
//!
//! ```no_run
//! use streamdemux::demux::{feed_all, CollectingSink, DemuxSession};
//!
//! let data = std::fs::read("movie.webm").unwrap();
//! let mut session = DemuxSession::new(CollectingSink::default());
//! feed_all(&mut session, &data, 64 * 1024).unwrap();
//! println!("{} video samples", session.sink().video.len());
//! ```

pub mod error;
pub mod matroska;
pub mod mp4;
mod output;
mod probe;
mod session;

pub use error::{DemuxError, ErrorKind, Result};
pub use matroska::{MatroskaDemuxer, Profile};
pub use mp4::Mp4Demuxer;
pub use probe::{probe_container, Container, ProbeResult};
pub use session::{feed_all, DemuxSession, FeedSummary};

use streamdemux_common::{ChunkResult, MediaInfo, Sample, TrackMetadata, TrackQueue};

/// Receives everything a demuxer produces.
pub trait DemuxSink {
    /// A track was identified. Called once per track before any of its samples.
    fn on_track_metadata(&mut self, metadata: &TrackMetadata);

    /// Media info is complete. Called at most once per demuxer lifetime.
    fn on_media_info(&mut self, info: &MediaInfo);

    /// Samples are queued. Drain the queues; anything left stays queued.
    fn on_data_available(&mut self, audio: &mut TrackQueue, video: &mut TrackQueue);

    /// The demuxer failed permanently.
    fn on_error(&mut self, error: &DemuxError);
}

/// A sink that keeps everything it receives.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub tracks: Vec<TrackMetadata>,
    pub media_info: Option<MediaInfo>,
    /// Number of `on_media_info` calls.
    pub media_info_calls: usize,
    pub audio: Vec<Sample>,
    pub video: Vec<Sample>,
    pub errors: Vec<String>,
}

impl DemuxSink for CollectingSink {
    fn on_track_metadata(&mut self, metadata: &TrackMetadata) {
        self.tracks.push(metadata.clone());
    }

    fn on_media_info(&mut self, info: &MediaInfo) {
        self.media_info = Some(info.clone());
        self.media_info_calls += 1;
    }

    fn on_data_available(&mut self, audio: &mut TrackQueue, video: &mut TrackQueue) {
        self.audio.extend(audio.take());
        self.video.extend(video.take());
    }

    fn on_error(&mut self, error: &DemuxError) {
        self.errors.push(error.to_string());
    }
}

/// Tunables shared by both demuxers.
#[derive(Debug, Clone, PartialEq)]
pub struct DemuxOptions {
    /// Added to every sample timestamp, in milliseconds.
    pub timestamp_base_ms: i64,
    /// Replaces the container's duration when set, in milliseconds.
    pub duration_override_ms: Option<f64>,
    /// Accept FLAC audio in Matroska.
    pub allow_flac: bool,
    /// Used when neither the bitstream nor the container gives a frame rate.
    pub fallback_frame_rate: f64,
    /// Maintain [`MediaInfo::bitrate_map`] while streaming.
    pub record_bitrate: bool,
}

impl Default for DemuxOptions {
    fn default() -> Self {
        Self {
            timestamp_base_ms: 0,
            duration_override_ms: None,
            allow_flac: true,
            fallback_frame_rate: 24.0,
            record_bitrate: true,
        }
    }
}

/// A demuxer for one detected container.
#[derive(Debug)]
pub enum Demuxer {
    Matroska(MatroskaDemuxer),
    Mp4(Mp4Demuxer),
}

impl Demuxer {
    /// Create the demuxer for a probed container.
    pub fn new(container: Container, options: DemuxOptions) -> Self {
        match container {
            Container::Matroska => Self::Matroska(MatroskaDemuxer::new(Profile::Matroska, options)),
            Container::WebM => Self::Matroska(MatroskaDemuxer::new(Profile::WebM, options)),
            Container::Mp4 => Self::Mp4(Mp4Demuxer::new(options)),
        }
    }

    pub fn push(&mut self, chunk: &[u8], byte_start: u64, sink: &mut dyn DemuxSink) -> Result<ChunkResult> {
        match self {
            Self::Matroska(d) => d.push(chunk, byte_start, sink),
            Self::Mp4(d) => d.push(chunk, byte_start, sink),
        }
    }

    pub fn media_info(&self) -> &MediaInfo {
        match self {
            Self::Matroska(d) => d.media_info(),
            Self::Mp4(d) => d.media_info(),
        }
    }

    pub fn set_timestamp_base(&mut self, ms: i64) {
        match self {
            Self::Matroska(d) => d.set_timestamp_base(ms),
            Self::Mp4(d) => d.set_timestamp_base(ms),
        }
    }

    pub fn set_duration_override(&mut self, ms: Option<f64>) {
        match self {
            Self::Matroska(d) => d.set_duration_override(ms),
            Self::Mp4(d) => d.set_duration_override(ms),
        }
    }

    pub fn reset_media_info(&mut self) {
        match self {
            Self::Matroska(d) => d.reset_media_info(),
            Self::Mp4(d) => d.reset_media_info(),
        }
    }
}
