//! Streamdemux-Common: types shared by the demuxers and their consumers.
//!
//! - **Samples**: timestamped access units and the per-track queues they are
//!   delivered in
//! - **Metadata**: per-track codec information and the aggregated media info
//! - **Control flow**: [`ChunkResult`], the answer a demuxer gives the loader
//!   after every delivered chunk
//!
//! # Examples
//!
//! ```
//! use streamdemux_common::{ChunkResult, TrackKind, TrackQueue};
//!
//! let queue = TrackQueue::new(TrackKind::Video, 1);
//! assert!(queue.is_empty());
//!
//! assert_eq!(ChunkResult::from_consumed(0), ChunkResult::NeedMoreData);
//! assert_eq!(ChunkResult::from_consumed(12).consumed(), 12);
//! ```

pub mod media_info;
pub mod sample;
pub mod types;

pub use media_info::{KeyframesIndex, MediaInfo};
pub use sample::{NalUnit, Sample, TrackQueue};
pub use types::*;
