//! Progressive MP4 detection.

use crate::header::{read_box_header, FourCC};
use tracing::warn;

/// Result of [`probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mp4Probe {
    /// The buffer starts with an `ftyp` box and no `mdat` precedes `moov`.
    pub matched: bool,
    /// The `moov` box is fully buffered. With `matched == false` this tells
    /// whether more bytes could change the answer.
    pub enough_data: bool,
    /// Offset of the `moov` box.
    pub data_offset: usize,
}

impl Mp4Probe {
    fn mismatch() -> Self {
        Self {
            matched: false,
            enough_data: true,
            data_offset: 0,
        }
    }

    fn waiting(matched: bool, data_offset: usize) -> Self {
        Self {
            matched,
            enough_data: false,
            data_offset,
        }
    }
}

/// Check whether `buf` starts a progressive MP4 stream.
///
/// `ftyp` must come first, followed by any number of complete boxes and
/// then `moov`. A truncated header or a partial box before `moov` asks for
/// more data; an `mdat` before `moov` is not streamable and does not match.
pub fn probe(buf: &[u8]) -> Mp4Probe {
    let ftyp = match read_box_header(buf, 0) {
        Ok(Some(h)) => h,
        Ok(None) => return Mp4Probe::waiting(false, 0),
        Err(_) => return Mp4Probe::mismatch(),
    };
    if ftyp.kind != FourCC::FTYP {
        return Mp4Probe::mismatch();
    }
    let Some(ftyp_size) = ftyp.size.filter(|size| *size <= buf.len() as u64) else {
        return Mp4Probe::waiting(true, 0);
    };

    let mut offset = ftyp_size as usize;
    loop {
        let header = match read_box_header(buf, offset) {
            Ok(Some(h)) => h,
            Ok(None) => return Mp4Probe::waiting(true, offset),
            Err(_) => return Mp4Probe::mismatch(),
        };
        let remaining = (buf.len() - offset) as u64;

        match header.kind {
            FourCC::MOOV => {
                return Mp4Probe {
                    matched: true,
                    enough_data: header.size.is_some() && header.is_complete(remaining),
                    data_offset: offset,
                };
            }
            FourCC::MDAT => {
                warn!(offset, "mdat precedes moov, stream is not progressive");
                return Mp4Probe::mismatch();
            }
            _ => match header.size {
                Some(size) if size <= remaining => offset += size as usize,
                _ => return Mp4Probe::waiting(true, offset),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(kind: &[u8; 4], payload_len: usize) -> Vec<u8> {
        let mut out = ((payload_len + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.resize(payload_len + 8, 0);
        out
    }

    #[test]
    fn test_probe_complete_header() {
        let mut data = boxed(b"ftyp", 12);
        data.extend(boxed(b"free", 4));
        data.extend(boxed(b"moov", 32));
        data.extend(boxed(b"mdat", 16));

        let result = probe(&data);
        assert!(result.matched);
        assert!(result.enough_data);
        assert_eq!(result.data_offset, 20 + 12);
    }

    #[test]
    fn test_probe_partial_moov() {
        let mut data = boxed(b"ftyp", 12);
        data.extend(boxed(b"moov", 32));
        data.truncate(30);

        let result = probe(&data);
        assert!(result.matched);
        assert!(!result.enough_data);
        assert_eq!(result.data_offset, 20);
    }

    #[test]
    fn test_probe_truncated_box_header() {
        let mut data = boxed(b"ftyp", 12);
        data.extend_from_slice(&[0, 0, 0]);
        let result = probe(&data);
        assert!(result.matched);
        assert!(!result.enough_data);
    }

    #[test]
    fn test_probe_mismatches() {
        // Not ftyp
        assert!(!probe(&boxed(b"moov", 8)).matched);
        // EBML magic
        assert!(!probe(&[0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x86, 0x81]).matched);

        // mdat before moov
        let mut data = boxed(b"ftyp", 12);
        data.extend(boxed(b"mdat", 4));
        data.extend(boxed(b"moov", 4));
        let result = probe(&data);
        assert!(!result.matched);
        assert!(result.enough_data);
    }

    #[test]
    fn test_probe_too_short_to_decide() {
        let result = probe(&[0, 0, 0]);
        assert!(!result.matched);
        assert!(!result.enough_data);
    }
}
