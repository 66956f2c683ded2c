//! Streamdemux-ISOBMFF: box decoding for progressive MP4 streams.
//!
//! - **Headers**: 32-bit sizes, the 64-bit escape and "to the end" boxes
//! - **Box tree**: container recursion plus fixed-offset readers for the
//!   boxes a demuxer needs (`mvhd`, `tkhd`, `mdhd`, `hdlr`, sample entries
//!   and sample tables)
//! - **Probe**: `ftyp` followed by a fully buffered `moov`
//! - **Chunk map**: every chunk of the selected tracks, sorted by offset
//!
//! # Examples
//!
//! ```
//! use streamdemux_isobmff::{parse_boxes, probe, FourCC};
//!
//! let mut data = vec![0, 0, 0, 16];
//! data.extend_from_slice(b"ftypisom");
//! data.extend_from_slice(&[0, 0, 0, 0]);
//! data.extend_from_slice(&[0, 0, 0, 8]);
//! data.extend_from_slice(b"moov");
//!
//! let result = probe(&data);
//! assert!(result.matched && result.enough_data);
//! assert_eq!(result.data_offset, 16);
//!
//! let boxes = parse_boxes(&data, 0, data.len()).unwrap();
//! assert_eq!(boxes[1].kind, FourCC::MOOV);
//! ```

pub mod boxes;
pub mod error;
pub mod header;
pub mod probe;
pub mod sample_table;

pub use boxes::{find_box, parse_boxes, BoxFields, BoxNode, EsDescriptor};
pub use error::{IsoError, Result};
pub use header::{read_box_header, BoxHeader, FourCC};
pub use probe::{probe, Mp4Probe};
pub use sample_table::{Chunk, ChunkMap, ChunkSample, SampleAt, SampleTables};
