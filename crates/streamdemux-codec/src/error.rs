//! Error types for streamdemux-codec.

use thiserror::Error;

/// Result type for codec configuration parsing.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised while parsing codec configuration data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The structure ends before a required field.
    #[error("{what} is truncated")]
    Truncated { what: &'static str },

    /// A configuration record with an unexpected marker or version.
    #[error("Invalid {what}: {reason}")]
    InvalidConfig { what: &'static str, reason: String },

    /// A field value outside the range the parser supports.
    #[error("Unsupported {what}: {value}")]
    Unsupported { what: &'static str, value: u32 },
}

impl CodecError {
    /// Create a truncation error.
    pub fn truncated(what: &'static str) -> Self {
        Self::Truncated { what }
    }

    /// Create an invalid configuration error.
    pub fn invalid(what: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            what,
            reason: reason.into(),
        }
    }
}
