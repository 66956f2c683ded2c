//! Error types for the container demuxers.

use streamdemux_codec::CodecError;
use streamdemux_common::TrackKind;
use streamdemux_ebml::EbmlError;
use streamdemux_isobmff::IsoError;

/// Broad classification of a [`DemuxError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes are not the container this demuxer handles.
    FormatMismatch,
    /// A mandatory track uses a codec this demuxer cannot deliver.
    UnsupportedCodec,
    /// The container is malformed or internally inconsistent.
    StructuralViolation,
    /// The demuxer was driven outside its protocol.
    InvalidState,
}

/// Permanent demuxing failure. Running out of bytes is never one of these.
#[derive(Debug, thiserror::Error)]
pub enum DemuxError {
    #[error("Format mismatch: {0}")]
    FormatMismatch(String),

    #[error("Unsupported {kind} codec: {codec}")]
    UnsupportedCodec { kind: TrackKind, codec: String },

    #[error("Structural violation: {0}")]
    StructuralViolation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Corrupt EBML structure.
    #[error("EBML error: {0}")]
    Ebml(#[from] EbmlError),

    /// Corrupt MP4 box structure.
    #[error("MP4 box error: {0}")]
    Iso(#[from] IsoError),

    /// Unreadable decoder configuration.
    #[error("Codec configuration error: {0}")]
    Codec(#[from] CodecError),
}

impl DemuxError {
    pub fn format_mismatch<S: Into<String>>(msg: S) -> Self {
        Self::FormatMismatch(msg.into())
    }

    pub fn unsupported_codec<S: Into<String>>(kind: TrackKind, codec: S) -> Self {
        Self::UnsupportedCodec {
            kind,
            codec: codec.into(),
        }
    }

    pub fn structural<S: Into<String>>(msg: S) -> Self {
        Self::StructuralViolation(msg.into())
    }

    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FormatMismatch(_) => ErrorKind::FormatMismatch,
            Self::UnsupportedCodec { .. } => ErrorKind::UnsupportedCodec,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::StructuralViolation(_) | Self::Ebml(_) | Self::Iso(_) | Self::Codec(_) => {
                ErrorKind::StructuralViolation
            }
        }
    }
}

/// Result type alias for demuxing.
pub type Result<T> = std::result::Result<T, DemuxError>;
