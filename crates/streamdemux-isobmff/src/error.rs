//! Error types for streamdemux-isobmff.

use crate::header::FourCC;
use thiserror::Error;

/// Result type for box decoding.
pub type Result<T> = std::result::Result<T, IsoError>;

/// Errors raised while decoding ISOBMFF boxes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IsoError {
    /// The buffer ends before the box header is complete.
    #[error("Insufficient data")]
    InsufficientData,

    /// A box whose declared size is smaller than its own header.
    #[error("Box {kind} at offset {offset} declares size {size}")]
    InvalidSize { kind: FourCC, offset: u64, size: u64 },

    /// A box extending past its parent or the buffer.
    #[error("Box {kind} at offset {offset} overruns its parent")]
    Overrun { kind: FourCC, offset: u64 },

    /// A fixed-layout field lies outside the box payload.
    #[error("Box {kind} is truncated: {reason}")]
    Truncated { kind: FourCC, reason: &'static str },

    /// A box required to describe a track is absent.
    #[error("Missing {0} box")]
    MissingBox(FourCC),

    /// `stsz` declares more samples than another table can account for.
    #[error("stsz declares {declared} samples but {table} accounts for {available}")]
    SampleCount { declared: u32, table: FourCC, available: u64 },
}

impl IsoError {
    /// Create a truncation error.
    pub fn truncated(kind: FourCC, reason: &'static str) -> Self {
        Self::Truncated { kind, reason }
    }
}
