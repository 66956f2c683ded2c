//! Error types for streamdemux-ebml.

use thiserror::Error;

/// Result type for EBML operations.
pub type Result<T> = std::result::Result<T, EbmlError>;

/// Errors raised while decoding or encoding EBML.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EbmlError {
    /// The buffer ends before the value is complete.
    #[error("Insufficient data")]
    InsufficientData,

    /// A VINT whose first byte is zero.
    #[error("Invalid VINT at offset {offset}")]
    InvalidVint { offset: usize },

    /// An element ID wider than four bytes.
    #[error("Element ID at offset {offset} is {width} bytes wide")]
    IdTooLong { offset: usize, width: usize },

    /// A value that does not fit the requested VINT width.
    #[error("Value {value} does not fit in a {width}-byte VINT")]
    ValueTooLarge { value: u64, width: usize },

    /// A child element extends past the end of its parent.
    #[error("Element {id} at offset {offset} overruns its parent")]
    Overrun { id: String, offset: usize },

    /// Only master elements may have an unknown size.
    #[error("Element {id} has unknown size but is not a master element")]
    UnknownSizeLeaf { id: String },

    /// A scalar wider than its type allows.
    #[error("Element {id} holds a {width}-byte {kind}")]
    InvalidScalar {
        id: String,
        kind: &'static str,
        width: usize,
    },

    /// No element with this name exists in the element table.
    #[error("Unknown element name: {0}")]
    UnknownElement(String),

    /// Content does not match the element's semantic type.
    #[error("Element {name} cannot hold {content} content")]
    TypeMismatch {
        name: &'static str,
        content: &'static str,
    },

    /// Block header or lacing data is inconsistent with the block length.
    #[error("Invalid block: {0}")]
    InvalidBlock(String),
}

impl EbmlError {
    /// Create an invalid block error.
    pub fn invalid_block(msg: impl Into<String>) -> Self {
        Self::InvalidBlock(msg.into())
    }
}
