//! Container detection from the first bytes of a stream.

use streamdemux_ebml::{decode_element, ids, ElementRead};
use streamdemux_isobmff::probe as probe_mp4;
use tracing::debug;

const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Matroska,
    WebM,
    Mp4,
}

impl Container {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matroska => "matroska",
            Self::WebM => "webm",
            Self::Mp4 => "mp4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    Detected(Container),
    /// More bytes are needed to decide.
    NeedMoreData,
    Unknown,
}

/// Detect the container of a stream starting at file offset zero.
///
/// Matroska and WebM are told apart by the EBML header's DocType. MP4 must
/// start with `ftyp` and have its `moov` before any `mdat`.
pub fn probe_container(buf: &[u8]) -> ProbeResult {
    if buf.is_empty() {
        return ProbeResult::NeedMoreData;
    }

    let magic_len = buf.len().min(EBML_MAGIC.len());
    if buf[..magic_len] == EBML_MAGIC[..magic_len] {
        return probe_ebml(buf);
    }

    let mp4 = probe_mp4(buf);
    match (mp4.matched, mp4.enough_data) {
        (true, true) => ProbeResult::Detected(Container::Mp4),
        (_, false) => ProbeResult::NeedMoreData,
        (false, true) => ProbeResult::Unknown,
    }
}

fn probe_ebml(buf: &[u8]) -> ProbeResult {
    let header = match decode_element(buf, 0, None, false) {
        Ok(ElementRead::Complete(el)) => el,
        Ok(_) => return ProbeResult::NeedMoreData,
        Err(e) => {
            debug!("EBML header rejected: {}", e);
            return ProbeResult::Unknown;
        }
    };

    match header.child_str_or_default(ids::DOC_TYPE) {
        Some("webm") => ProbeResult::Detected(Container::WebM),
        Some("matroska") => ProbeResult::Detected(Container::Matroska),
        other => {
            debug!("Unsupported EBML DocType: {:?}", other);
            ProbeResult::Unknown
        }
    }
}
