//! Streamdemux-EBML: incremental decoding and encoding of EBML documents.
//!
//! - **VINT**: variable-length integers for IDs, sizes and lacing deltas
//! - **Element table**: the Matroska/WebM element definitions, by ID and name
//! - **Elements**: a tree decoder that tolerates truncated input and
//!   unknown-size masters
//! - **Blocks**: `SimpleBlock`/`Block` headers and the three lacing schemes
//! - **Writer**: element encoding, `Void` padding and in-place block edits
//!
//! # Examples
//!
//! ```
//! use streamdemux_ebml::{decode_element, ids, ElementRead};
//!
//! // EBML header holding DocType "webm"
//! let data = [0x1A, 0x45, 0xDF, 0xA3, 0x87, 0x42, 0x82, 0x84, b'w', b'e', b'b', b'm'];
//!
//! let ElementRead::Complete(header) = decode_element(&data, 0, None, false).unwrap() else {
//!     panic!("header is complete");
//! };
//! assert_eq!(header.child_str(ids::DOC_TYPE), Some("webm"));
//!
//! // One byte short: the decoder asks for more
//! let partial = decode_element(&data[..11], 0, None, false).unwrap();
//! assert!(matches!(partial, ElementRead::Header(_)));
//! ```

pub mod block;
pub mod element;
pub mod error;
pub mod spec;
pub mod utf8;
pub mod vint;
pub mod writer;

pub use block::{encode_block, Block, Lacing};
pub use element::{decode_element, read_header, Content, Element, ElementHeader, ElementRead, Value};
pub use error::{EbmlError, Result};
pub use spec::{ids, lookup_by_id, lookup_by_name, ElementDef, ElementId, ElementType};
pub use vint::{decode_vint, encode_vint, ElementSize};
pub use writer::{
    encode, encode_by_id, encode_simple_block, encode_void, modify_block_info, wrap, Child, EbmlValue, EncodedLength,
};
