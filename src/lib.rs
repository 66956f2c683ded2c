//! Streamdemux - incremental Matroska, WebM and MP4 demuxing
//!
//! The library crate exposes the demuxers, the WebM remuxer and the
//! configuration used by the `streamdemux` binary.

pub mod config;
pub mod demux;
pub mod remux;
