//! UTF-8 decoding for `utf-8` elements.
//!
//! [`decode_utf8_fallback`] walks the byte sequences by hand and is usable
//! wherever no platform decoder exists. Invalid or truncated sequences become
//! U+FFFD, one replacement per offending lead byte.

/// Decode `bytes` with the standard library, falling back to the manual decoder.
pub fn decode_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => decode_utf8_fallback(bytes),
    }
}

/// Decode UTF-8 without relying on a platform decoder.
pub fn decode_utf8_fallback(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let lead = bytes[i];
        let (width, init, min) = match lead {
            0x00..=0x7F => {
                out.push(lead as char);
                i += 1;
                continue;
            }
            0xC0..=0xDF => (2, (lead & 0x1F) as u32, 0x80),
            0xE0..=0xEF => (3, (lead & 0x0F) as u32, 0x800),
            0xF0..=0xF7 => (4, (lead & 0x07) as u32, 0x1_0000),
            _ => {
                out.push(char::REPLACEMENT_CHARACTER);
                i += 1;
                continue;
            }
        };

        let continuation = bytes
            .get(i + 1..i + width)
            .filter(|tail| tail.iter().all(|b| b & 0xC0 == 0x80));

        match continuation {
            Some(tail) => {
                let code = tail
                    .iter()
                    .fold(init, |acc, b| (acc << 6) | (b & 0x3F) as u32);
                // Overlong forms and surrogates are rejected by `from_u32`
                // or the minimum check.
                match char::from_u32(code).filter(|_| code >= min) {
                    Some(c) => out.push(c),
                    None => out.push(char::REPLACEMENT_CHARACTER),
                }
                i += width;
            }
            None => {
                out.push(char::REPLACEMENT_CHARACTER);
                i += 1;
            }
        }
    }

    out
}
