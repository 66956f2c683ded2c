//! Streamdemux-Codec: decoder configuration parsing for the demuxers.
//!
//! - **H.264**: SPS fields (profile, level, picture size, SAR, frame rate),
//!   the `avcC` record, and splitting length-prefixed samples into NAL units
//! - **AAC**: AudioSpecificConfig object type, sample rate and channels
//! - **FLAC**: STREAMINFO from a Matroska CodecPrivate
//!
//! # Examples
//!
//! ```
//! use bytes::Bytes;
//! use streamdemux_codec::parse_audio_specific_config;
//!
//! let asc = parse_audio_specific_config(&Bytes::from_static(&[0x12, 0x10])).unwrap();
//! assert_eq!(asc.sample_rate, 44100);
//! assert_eq!(asc.codec_string(), "mp4a.40.2");
//! ```

pub mod aac;
pub mod avcc;
pub mod error;
pub mod flac;
pub mod nal;
pub mod sps;

pub use aac::{parse_audio_specific_config, AudioSpecificConfig, AAC_FRAME_SAMPLES};
pub use avcc::{parse_avcc, AvcConfig};
pub use error::{CodecError, Result};
pub use flac::{parse_flac_header, FlacStreamInfo};
pub use nal::{split_length_prefixed, NalSplit};
pub use sps::{parse_sps, SpsInfo};
