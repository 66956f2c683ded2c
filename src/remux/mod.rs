//! WebM re-muxing of demuxed samples.
//!
//! - Init segment: the source EBML header, then a Segment of unknown size
//!   holding `Info` and the selected `TrackEntry` elements
//! - Media segments: `Cluster`s of `SimpleBlock`s, opened at every video
//!   keyframe

mod webm;

pub use webm::{InitSegment, WebmRemuxer};

use streamdemux_ebml::EbmlError;
use thiserror::Error;

/// Result type for remux operations.
pub type Result<T> = std::result::Result<T, RemuxError>;

/// Error type for remux operations.
#[derive(Debug, Error)]
pub enum RemuxError {
    /// The demuxer has not read everything an init segment needs.
    #[error("Missing {0}")]
    Missing(&'static str),

    /// Only Matroska and WebM input can be re-muxed.
    #[error("Unsupported source: {0}")]
    Unsupported(String),

    #[error("EBML encoding failed: {0}")]
    Ebml(#[from] EbmlError),
}

impl RemuxError {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}
