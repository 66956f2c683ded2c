//! EBML element tree decoding.
//!
//! [`decode_element`] reads one element from a byte window without assuming
//! the window holds all of it. A complete element is copied once into an
//! owned [`Bytes`]; its children and binary values are zero-copy slices of
//! that copy, so nothing borrows from the caller's buffer after the call.

use crate::error::{EbmlError, Result};
use crate::spec::{lookup_by_id, DefaultValue, ElementDef, ElementId, ElementType};
use crate::utf8::decode_utf8;
use crate::vint::{decode_id, decode_size, ElementSize};
use bytes::Bytes;
use tracing::debug;

/// Identifier and size of an element, read without touching its payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementHeader {
    pub id: ElementId,
    pub def: &'static ElementDef,
    pub size: ElementSize,
    /// Width of the ID plus the size field.
    pub header_len: usize,
}

impl ElementHeader {
    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn kind(&self) -> ElementType {
        self.def.kind
    }

    /// Header plus declared payload, `None` for unknown-size elements.
    pub fn total_len(&self) -> Option<u64> {
        self.size.known().map(|n| n + self.header_len as u64)
    }
}

/// A decoded scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uint(u64),
    Int(i64),
    Float(f64),
    String(String),
    Utf8(String),
    Binary(Bytes),
    /// Nanoseconds since 2001-01-01T00:00:00 UTC.
    Date(i64),
    Id(ElementId),
}

/// Payload of a decoded element.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Master(Vec<Element>),
    Value(Value),
}

/// A fully decoded element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: ElementId,
    pub name: &'static str,
    pub kind: ElementType,
    /// Declared size; unknown-size masters record `Unknown` here while
    /// `inner_len` holds the measured extent.
    pub size: ElementSize,
    pub header_len: usize,
    pub inner_len: u64,
    pub total_len: u64,
    /// Offset of the element within the buffer passed to [`decode_element`].
    pub offset: usize,
    pub content: Content,
    /// Header of the element immediately following this one, if buffered.
    pub next_sibling: Option<ElementHeader>,
    raw: Bytes,
}

/// Outcome of [`decode_element`].
#[derive(Debug, Clone, PartialEq)]
pub enum ElementRead {
    /// Not even the header is available.
    NeedMoreData,
    /// Header only: either requested with `top_only`, or the payload is not
    /// fully buffered yet.
    Header(ElementHeader),
    Complete(Element),
}

impl ElementRead {
    /// The header, whether or not the element is complete.
    pub fn header(&self) -> Option<ElementHeader> {
        match self {
            Self::NeedMoreData => None,
            Self::Header(h) => Some(*h),
            Self::Complete(e) => Some(e.header()),
        }
    }
}

/// Read an element header at `offset`. `Ok(None)` means more bytes are needed.
pub fn read_header(bytes: &[u8], offset: usize) -> Result<Option<ElementHeader>> {
    let (raw_id, id_len) = match decode_id(bytes, offset) {
        Ok(v) => v,
        Err(EbmlError::InsufficientData) => return Ok(None),
        Err(e) => return Err(e),
    };
    let (size, size_len) = match decode_size(bytes, offset + id_len) {
        Ok(v) => v,
        Err(EbmlError::InsufficientData) => return Ok(None),
        Err(e) => return Err(e),
    };
    let id = ElementId(raw_id);
    Ok(Some(ElementHeader {
        id,
        def: lookup_by_id(id),
        size,
        header_len: id_len + size_len,
    }))
}

/// Decode the element at `offset`, looking at no more than `max_len` bytes.
///
/// With `top_only` set only the header is read. Structural corruption (a zero
/// VINT byte, a child overrunning its parent) is an error; running out of
/// bytes never is.
pub fn decode_element(
    bytes: &[u8],
    offset: usize,
    max_len: Option<usize>,
    top_only: bool,
) -> Result<ElementRead> {
    let end = max_len.map_or(bytes.len(), |m| offset.saturating_add(m).min(bytes.len()));
    let window = &bytes[..end.max(offset).min(bytes.len())];

    let Some(header) = read_header(window, offset)? else {
        return Ok(ElementRead::NeedMoreData);
    };
    if top_only {
        return Ok(ElementRead::Header(header));
    }

    let inner_len = match header.size {
        ElementSize::Known(n) => n,
        ElementSize::Unknown => match measure_unknown(window, offset, &header)? {
            Some(n) => n,
            None => return Ok(ElementRead::Header(header)),
        },
    };

    let total = header.header_len as u64 + inner_len;
    let available = (window.len() - offset) as u64;
    if total > available {
        return Ok(ElementRead::Header(header));
    }

    let total = total as usize;
    let raw = Bytes::copy_from_slice(&window[offset..offset + total]);
    let mut element = build(raw, header, inner_len, offset)?;
    element.next_sibling = read_header(window, offset + total).ok().flatten();
    Ok(ElementRead::Complete(element))
}

/// Payload length of an unknown-size master: the distance to the first
/// following element whose level is the same or lower. `None` when no such
/// element is buffered yet.
fn measure_unknown(window: &[u8], offset: usize, header: &ElementHeader) -> Result<Option<u64>> {
    if header.kind() != ElementType::Master {
        return Err(EbmlError::UnknownSizeLeaf {
            id: header.id.to_string(),
        });
    }
    let level = header.def.level;
    let start = offset + header.header_len;
    let mut pos = start;

    loop {
        let Some(child) = read_header(window, pos)? else {
            return Ok(None);
        };
        if !child.def.is_global() && child.def.level <= level {
            return Ok(Some((pos - start) as u64));
        }
        if child.kind() == ElementType::Unknown {
            debug!(id = %child.id, offset = pos, "Skipping unknown element inside unknown-size master");
        }
        let child_len = match child.size {
            ElementSize::Known(n) => n,
            ElementSize::Unknown => match measure_unknown(window, pos, &child)? {
                Some(n) => n,
                None => return Ok(None),
            },
        };
        pos = match usize::try_from(child.header_len as u64 + child_len) {
            Ok(len) => pos + len,
            Err(_) => return Ok(None),
        };
        if pos > window.len() {
            return Ok(None);
        }
    }
}

/// Build an element from its owned span.
fn build(raw: Bytes, header: ElementHeader, inner_len: u64, offset: usize) -> Result<Element> {
    let payload = raw.slice(header.header_len..);
    let content = match header.kind() {
        ElementType::Master => Content::Master(decode_children(&payload, offset + header.header_len)?),
        kind => Content::Value(decode_value(&header, kind, payload)?),
    };

    Ok(Element {
        id: header.id,
        name: header.def.name,
        kind: header.kind(),
        size: header.size,
        header_len: header.header_len,
        inner_len,
        total_len: raw.len() as u64,
        offset,
        content,
        next_sibling: None,
        raw,
    })
}

/// Decode every child in a master payload. `base` is the payload's offset in
/// the caller's buffer.
fn decode_children(payload: &Bytes, base: usize) -> Result<Vec<Element>> {
    let mut children = Vec::new();
    let mut pos = 0usize;

    while pos < payload.len() {
        let Some(header) = read_header(payload, pos)? else {
            return Err(EbmlError::Overrun {
                id: "header".to_string(),
                offset: base + pos,
            });
        };
        let inner_len = match header.size {
            ElementSize::Known(n) => n,
            ElementSize::Unknown => (payload.len() - pos - header.header_len) as u64,
        };
        let total = header.header_len as u64 + inner_len;
        if total > (payload.len() - pos) as u64 {
            return Err(EbmlError::Overrun {
                id: header.id.to_string(),
                offset: base + pos,
            });
        }
        if header.kind() == ElementType::Unknown {
            debug!(id = %header.id, offset = base + pos, "Unknown element kept as binary");
        }
        let end = pos + total as usize;
        let mut child = build(payload.slice(pos..end), header, inner_len, base + pos)?;
        child.next_sibling = read_header(payload, end).ok().flatten();
        children.push(child);
        pos = end;
    }

    Ok(children)
}

fn decode_value(header: &ElementHeader, kind: ElementType, payload: Bytes) -> Result<Value> {
    let width = payload.len();
    let too_wide = |kind: &'static str| EbmlError::InvalidScalar {
        id: header.id.to_string(),
        kind,
        width,
    };

    Ok(match kind {
        ElementType::UnsignedInteger => Value::Uint(read_uint(&payload).ok_or_else(|| too_wide("uinteger"))?),
        ElementType::SignedInteger => Value::Int(read_int(&payload).ok_or_else(|| too_wide("integer"))?),
        ElementType::Date => Value::Date(read_int(&payload).ok_or_else(|| too_wide("date"))?),
        ElementType::EbmlId => {
            let id = read_uint(&payload)
                .filter(|v| *v <= u32::MAX as u64)
                .ok_or_else(|| too_wide("ebmlid"))?;
            Value::Id(ElementId(id as u32))
        }
        ElementType::Float => Value::Float(read_float(&payload)),
        ElementType::String => Value::String(read_ascii(&payload)),
        ElementType::Utf8 => Value::Utf8(decode_utf8(trim_nul(&payload))),
        ElementType::Binary | ElementType::Unknown | ElementType::Master => Value::Binary(payload),
    })
}

/// Big-endian unsigned integer of up to eight bytes.
pub fn read_uint(bytes: &[u8]) -> Option<u64> {
    if bytes.len() > 8 {
        return None;
    }
    Some(bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64))
}

/// Big-endian two's-complement integer of up to eight bytes.
pub fn read_int(bytes: &[u8]) -> Option<i64> {
    if bytes.is_empty() {
        return Some(0);
    }
    let value = read_uint(bytes)?;
    let shift = 64 - 8 * bytes.len() as u32;
    Some(((value << shift) as i64) >> shift)
}

/// IEEE-754 float of four or eight bytes; NaN for any other non-zero width.
pub fn read_float(bytes: &[u8]) -> f64 {
    match bytes.len() {
        0 => 0.0,
        4 => f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
        8 => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bytes);
            f64::from_be_bytes(buf)
        }
        _ => f64::NAN,
    }
}

fn trim_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

fn read_ascii(bytes: &[u8]) -> String {
    trim_nul(bytes).iter().map(|b| *b as char).collect()
}

impl Element {
    /// The header this element was decoded from.
    pub fn header(&self) -> ElementHeader {
        ElementHeader {
            id: self.id,
            def: lookup_by_id(self.id),
            size: self.size,
            header_len: self.header_len,
        }
    }

    /// The exact encoded bytes of this element.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// The payload bytes, without the header.
    pub fn payload(&self) -> Bytes {
        self.raw.slice(self.header_len..)
    }

    pub fn children(&self) -> &[Element] {
        match &self.content {
            Content::Master(children) => children,
            Content::Value(_) => &[],
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.content {
            Content::Value(v) => Some(v),
            Content::Master(_) => None,
        }
    }

    /// First child with the given ID.
    pub fn child(&self, id: ElementId) -> Option<&Element> {
        self.children().iter().find(|c| c.id == id)
    }

    /// All children with the given ID, in stream order.
    pub fn children_with(&self, id: ElementId) -> impl Iterator<Item = &Element> {
        self.children().iter().filter(move |c| c.id == id)
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self.value()? {
            Value::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value()? {
            Value::Int(v) | Value::Date(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.value()? {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.value()? {
            Value::String(s) | Value::Utf8(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self.value()? {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<ElementId> {
        match self.value()? {
            Value::Id(id) => Some(*id),
            _ => None,
        }
    }

    pub fn child_uint(&self, id: ElementId) -> Option<u64> {
        self.child(id)?.as_uint()
    }

    pub fn child_int(&self, id: ElementId) -> Option<i64> {
        self.child(id)?.as_int()
    }

    pub fn child_float(&self, id: ElementId) -> Option<f64> {
        self.child(id)?.as_float()
    }

    pub fn child_str(&self, id: ElementId) -> Option<&str> {
        self.child(id)?.as_str()
    }

    pub fn child_bytes(&self, id: ElementId) -> Option<&Bytes> {
        self.child(id)?.as_bytes()
    }

    /// Child value, or the table default when the child is absent.
    pub fn child_uint_or_default(&self, id: ElementId) -> Option<u64> {
        self.child_uint(id).or(match lookup_by_id(id).default {
            Some(DefaultValue::Uint(v)) => Some(v),
            _ => None,
        })
    }

    /// Child value, or the table default when the child is absent.
    pub fn child_float_or_default(&self, id: ElementId) -> Option<f64> {
        self.child_float(id).or(match lookup_by_id(id).default {
            Some(DefaultValue::Float(v)) => Some(v),
            _ => None,
        })
    }

    /// Child value, or the table default when the child is absent.
    pub fn child_str_or_default(&self, id: ElementId) -> Option<&str> {
        self.child_str(id).or(match lookup_by_id(id).default {
            Some(DefaultValue::Str(s)) => Some(s),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ids;
    use assert_matches::assert_matches;

    /// `EBML { DocType "webm", DocTypeVersion 4 }`
    fn ebml_header() -> Vec<u8> {
        vec![
            0x1A, 0x45, 0xDF, 0xA3, 0x8B, // EBML, size 11
            0x42, 0x82, 0x84, b'w', b'e', b'b', b'm', // DocType
            0x42, 0x87, 0x81, 0x04, // DocTypeVersion
        ]
    }

    #[test]
    fn test_decode_complete_master() {
        let data = ebml_header();
        let read = decode_element(&data, 0, None, false).unwrap();
        let ElementRead::Complete(el) = read else {
            panic!("expected complete element");
        };
        assert_eq!(el.id, ids::EBML);
        assert_eq!(el.name, "EBML");
        assert_eq!(el.header_len, 5);
        assert_eq!(el.inner_len, 11);
        assert_eq!(el.total_len, 16);
        assert_eq!(el.children().len(), 2);
        assert_eq!(el.child_str(ids::DOC_TYPE), Some("webm"));
        assert_eq!(el.child_uint(ElementId(0x4287)), Some(4));
        assert_eq!(el.raw().as_ref(), data.as_slice());
        assert_eq!(el.children()[1].offset, 12);
    }

    #[test]
    fn test_top_only_reads_header() {
        let data = ebml_header();
        let read = decode_element(&data, 0, None, true).unwrap();
        assert_matches!(read, ElementRead::Header(h) if h.id == ids::EBML && h.total_len() == Some(16));
    }

    #[test]
    fn test_truncation_never_panics() {
        let data = ebml_header();
        for cut in 0..data.len() {
            let read = decode_element(&data[..cut], 0, None, false).unwrap();
            assert!(
                !matches!(read, ElementRead::Complete(_)),
                "cut at {cut} produced a complete element"
            );
        }
        // max_len limits the window the same way
        let read = decode_element(&data, 0, Some(10), false).unwrap();
        assert_matches!(read, ElementRead::Header(_));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let data = ebml_header();
        let a = decode_element(&data, 0, None, false).unwrap();
        let b = decode_element(&data, 0, None, false).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_next_sibling_peek() {
        let mut data = ebml_header();
        data.extend_from_slice(&[0x18, 0x53, 0x80, 0x67, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        let ElementRead::Complete(el) = decode_element(&data, 0, None, false).unwrap() else {
            panic!("expected complete element");
        };
        let sibling = el.next_sibling.unwrap();
        assert_eq!(sibling.id, ids::SEGMENT);
        assert!(sibling.size.is_unknown());
    }

    #[test]
    fn test_unknown_size_cluster_ends_at_next_cluster() {
        let data = [
            0x1F, 0x43, 0xB6, 0x75, 0xFF, // Cluster, unknown size
            0xE7, 0x81, 0x00, // Timecode 0
            0x1F, 0x43, 0xB6, 0x75, 0x83, // next Cluster, size 3
            0xE7, 0x81, 0x21,
        ];
        let ElementRead::Complete(el) = decode_element(&data, 0, None, false).unwrap() else {
            panic!("expected complete element");
        };
        assert!(el.size.is_unknown());
        assert_eq!(el.inner_len, 3);
        assert_eq!(el.total_len, 8);
        assert_eq!(el.child_uint(ids::TIMECODE), Some(0));

        // Without the following cluster the end is not known yet.
        let read = decode_element(&data[..8], 0, None, false).unwrap();
        assert_matches!(read, ElementRead::Header(_));
    }

    #[test]
    fn test_child_overrun_is_error() {
        let data = [0x1A, 0x45, 0xDF, 0xA3, 0x83, 0x42, 0x82, 0x85, b'w'];
        let err = decode_element(&data, 0, None, false).unwrap_err();
        assert_matches!(err, EbmlError::Overrun { .. });
    }

    #[test]
    fn test_scalar_readers() {
        assert_eq!(read_uint(&[0x01, 0x00]), Some(256));
        assert_eq!(read_uint(&[]), Some(0));
        assert_eq!(read_uint(&[0; 9]), None);
        assert_eq!(read_int(&[0xFF]), Some(-1));
        assert_eq!(read_int(&[0xFF, 0x38]), Some(-200));
        assert_eq!(read_int(&[0x7F]), Some(127));
        assert_eq!(read_float(&1.5f32.to_be_bytes()), 1.5);
        assert_eq!(read_float(&2.25f64.to_be_bytes()), 2.25);
        assert!(read_float(&[0, 0, 0]).is_nan());
        assert_eq!(read_ascii(b"webm\0\0"), "webm");
    }

    #[test]
    fn test_unknown_element_is_skippable() {
        let data = [0x4F, 0x00, 0x82, 0xAA, 0xBB, 0xEC, 0x80];
        let ElementRead::Complete(el) = decode_element(&data, 0, None, false).unwrap() else {
            panic!("expected complete element");
        };
        assert_eq!(el.kind, ElementType::Unknown);
        assert_eq!(el.total_len, 5);
        assert_eq!(el.as_bytes().map(|b| b.as_ref()), Some(&[0xAA, 0xBB][..]));
        assert_eq!(el.next_sibling.map(|h| h.id), Some(ids::VOID));
    }

    #[test]
    fn test_unknown_child_inside_master_is_kept() {
        let data = [0x16, 0x54, 0xAE, 0x6B, 0x85, 0x4F, 0x00, 0x82, 0xAA, 0xBB];
        let ElementRead::Complete(el) = decode_element(&data, 0, None, false).unwrap() else {
            panic!("expected complete element");
        };
        assert_eq!(el.id, ids::TRACKS);
        assert_eq!(el.children().len(), 1);
        assert_eq!(el.children()[0].kind, ElementType::Unknown);
        assert_eq!(el.children()[0].offset, 5);
    }

    #[test]
    fn test_defaults_from_table() {
        let data = [0x15, 0x49, 0xA9, 0x66, 0x80]; // empty Info
        let ElementRead::Complete(info) = decode_element(&data, 0, None, false).unwrap() else {
            panic!("expected complete element");
        };
        assert_eq!(info.child_uint_or_default(ids::TIMECODE_SCALE), Some(1_000_000));
        assert_eq!(info.child_float(ids::DURATION), None);
    }
}
