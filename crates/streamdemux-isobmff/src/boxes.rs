//! Box tree decoding.
//!
//! Container boxes (`moov trak mdia minf stbl`) recurse. A fixed whitelist of
//! leaf boxes is decoded by direct field-table readers at documented byte
//! offsets; everything else stays opaque and is skipped by its size.
//!
//! Sample entries carry children after their fixed fields: `stsd` entries
//! start after version, flags and entry count, `avc1` extensions after the 78
//! bytes of a visual sample entry, `mp4a` extensions after the 28 bytes of an
//! audio sample entry.

use crate::error::{IsoError, Result};
use crate::header::{read_box_header, FourCC};
use bytes::Bytes;
use tracing::debug;

/// A decoded box and its children.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxNode {
    pub kind: FourCC,
    /// Offset of the box start within the parsed buffer.
    pub offset: usize,
    /// Total size including the header.
    pub size: u64,
    pub header_len: usize,
    pub fields: BoxFields,
    pub children: Vec<BoxNode>,
}

/// Per-kind decoded fields.
#[derive(Debug, Clone, PartialEq)]
pub enum BoxFields {
    Container,
    Mvhd(MovieHeader),
    Tkhd(TrackHeader),
    Mdhd(MediaHeader),
    Hdlr { handler: FourCC },
    Stsd { entry_count: u32 },
    Avc1(VisualSampleEntry),
    /// AVCDecoderConfigurationRecord bytes.
    AvcC(Bytes),
    Mp4a(AudioSampleEntry),
    Esds(EsDescriptor),
    Stts(Vec<TimeToSample>),
    Ctts(Vec<CompositionOffset>),
    /// 1-based sync sample numbers.
    Stss(Vec<u32>),
    Stsc(Vec<SampleToChunk>),
    Stsz { uniform_size: u32, sample_count: u32, sizes: Vec<u32> },
    /// From either `stco` or `co64`.
    ChunkOffsets(Vec<u64>),
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovieHeader {
    pub version: u8,
    pub timescale: u32,
    pub duration: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackHeader {
    pub version: u8,
    pub flags: u32,
    pub track_id: u32,
    pub duration: u64,
    /// 16.16 fixed point, converted.
    pub width: f64,
    pub height: f64,
}

impl TrackHeader {
    pub fn is_enabled(&self) -> bool {
        self.flags & 1 != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaHeader {
    pub version: u8,
    pub timescale: u32,
    pub duration: u64,
    /// Packed ISO-639-2/T code.
    pub language: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualSampleEntry {
    pub data_reference_index: u16,
    pub width: u16,
    pub height: u16,
    pub horizontal_resolution: f64,
    pub vertical_resolution: f64,
    pub frame_count: u16,
    pub compressor_name: String,
    pub depth: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSampleEntry {
    pub data_reference_index: u16,
    /// QuickTime sound description version; 1 and 2 add fields before the
    /// extension boxes.
    pub version: u16,
    pub channel_count: u16,
    pub sample_size: u16,
    /// Integer part of the 16.16 rate.
    pub sample_rate: u32,
}

/// The ES_Descriptor → DecoderConfigDescriptor → DecoderSpecificInfo chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EsDescriptor {
    pub es_id: u16,
    pub object_type_indication: u8,
    pub stream_type: u8,
    pub buffer_size: u32,
    pub max_bitrate: u32,
    pub avg_bitrate: u32,
    /// AudioSpecificConfig for AAC.
    pub decoder_specific_info: Option<Bytes>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeToSample {
    pub sample_count: u32,
    pub sample_delta: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositionOffset {
    pub sample_count: u32,
    pub offset: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleToChunk {
    /// 1-based.
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
    pub description_index: u32,
}

impl BoxNode {
    /// First direct child of the given kind.
    pub fn child(&self, kind: FourCC) -> Option<&BoxNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// All direct children of the given kind.
    pub fn children_of(&self, kind: FourCC) -> impl Iterator<Item = &BoxNode> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// Descend through first matches, e.g. `[MDIA, MINF, STBL]`.
    pub fn find(&self, path: &[FourCC]) -> Option<&BoxNode> {
        path.iter().try_fold(self, |node, kind| node.child(*kind))
    }

    /// Payload start within the parsed buffer.
    pub fn payload_offset(&self) -> usize {
        self.offset + self.header_len
    }
}

/// Find the first top-level box of a kind.
pub fn find_box(nodes: &[BoxNode], kind: FourCC) -> Option<&BoxNode> {
    nodes.iter().find(|n| n.kind == kind)
}

/// Decode the boxes in `bytes[offset..offset + len]`.
pub fn parse_boxes(bytes: &[u8], offset: usize, len: usize) -> Result<Vec<BoxNode>> {
    let end = offset
        .checked_add(len)
        .filter(|end| *end <= bytes.len())
        .ok_or(IsoError::InsufficientData)?;
    let window = &bytes[..end];

    let mut nodes = Vec::new();
    let mut pos = offset;
    while pos < end {
        let Some(header) = read_box_header(window, pos)? else {
            debug!(offset = pos, trailing = end - pos, "Ignoring trailing bytes after last box");
            break;
        };
        let size = header.total_len((end - pos) as u64);
        if size > (end - pos) as u64 {
            return Err(IsoError::Overrun {
                kind: header.kind,
                offset: pos as u64,
            });
        }
        let size_usize = size as usize;

        let body = &window[pos + header.header_len..pos + size_usize];
        let reader = FieldReader::new(header.kind, body);
        let fields = decode_fields(&reader)?;

        let children = match child_offset(header.kind, &fields) {
            Some(skip) if skip <= body.len() => {
                let start = pos + header.header_len + skip;
                parse_boxes(window, start, body.len() - skip)?
            }
            Some(_) => return Err(IsoError::truncated(header.kind, "sample entry fields")),
            None => Vec::new(),
        };

        nodes.push(BoxNode {
            kind: header.kind,
            offset: pos,
            size,
            header_len: header.header_len,
            fields,
            children,
        });
        pos += size_usize;
    }

    Ok(nodes)
}

/// Where children begin inside the payload, for boxes that have any.
fn child_offset(kind: FourCC, fields: &BoxFields) -> Option<usize> {
    match fields {
        _ if kind.is_container() => Some(0),
        BoxFields::Stsd { .. } => Some(8),
        BoxFields::Avc1(_) => Some(78),
        BoxFields::Mp4a(entry) => Some(match entry.version {
            1 => 28 + 16,
            2 => 28 + 36,
            _ => 28,
        }),
        _ => None,
    }
}

fn decode_fields(r: &FieldReader<'_>) -> Result<BoxFields> {
    let fields = match r.kind {
        kind if kind.is_container() => BoxFields::Container,
        FourCC::MVHD => {
            let version = r.u8(0)?;
            let (timescale, duration) = if version == 1 {
                (r.u32(20)?, r.u64(24)?)
            } else {
                (r.u32(12)?, r.u32(16)? as u64)
            };
            BoxFields::Mvhd(MovieHeader {
                version,
                timescale,
                duration,
            })
        }
        FourCC::TKHD => {
            let version = r.u8(0)?;
            let flags = r.u32(0)? & 0x00FF_FFFF;
            let (track_id, duration, dims) = if version == 1 {
                (r.u32(20)?, r.u64(28)?, 88)
            } else {
                (r.u32(12)?, r.u32(20)? as u64, 76)
            };
            BoxFields::Tkhd(TrackHeader {
                version,
                flags,
                track_id,
                duration,
                width: fixed_16_16(r.u32(dims)?),
                height: fixed_16_16(r.u32(dims + 4)?),
            })
        }
        FourCC::MDHD => {
            let version = r.u8(0)?;
            let (timescale, duration, language) = if version == 1 {
                (r.u32(20)?, r.u64(24)?, r.u16(32)?)
            } else {
                (r.u32(12)?, r.u32(16)? as u64, r.u16(20)?)
            };
            BoxFields::Mdhd(MediaHeader {
                version,
                timescale,
                duration,
                language,
            })
        }
        FourCC::HDLR => BoxFields::Hdlr {
            handler: FourCC(r.array(8)?),
        },
        FourCC::STSD => BoxFields::Stsd {
            entry_count: r.u32(4)?,
        },
        FourCC::AVC1 => {
            let name = r.slice(42, 32)?;
            let name_len = (name[0] as usize).min(31);
            BoxFields::Avc1(VisualSampleEntry {
                data_reference_index: r.u16(6)?,
                width: r.u16(24)?,
                height: r.u16(26)?,
                horizontal_resolution: fixed_16_16(r.u32(28)?),
                vertical_resolution: fixed_16_16(r.u32(32)?),
                frame_count: r.u16(40)?,
                compressor_name: String::from_utf8_lossy(&name[1..1 + name_len]).into_owned(),
                depth: r.u16(74)?,
            })
        }
        FourCC::AVCC => BoxFields::AvcC(Bytes::copy_from_slice(r.data)),
        FourCC::MP4A => BoxFields::Mp4a(AudioSampleEntry {
            data_reference_index: r.u16(6)?,
            version: r.u16(8)?,
            channel_count: r.u16(16)?,
            sample_size: r.u16(18)?,
            sample_rate: r.u32(24)? >> 16,
        }),
        FourCC::ESDS => BoxFields::Esds(parse_esds(r)?),
        FourCC::STTS => BoxFields::Stts(r.table(8, |at| {
            Ok(TimeToSample {
                sample_count: r.u32(at)?,
                sample_delta: r.u32(at + 4)?,
            })
        })?),
        // Read as signed in both versions: version 0 declares the field
        // unsigned but encoders still write negative offsets there.
        FourCC::CTTS => BoxFields::Ctts(r.table(8, |at| {
            Ok(CompositionOffset {
                sample_count: r.u32(at)?,
                offset: r.u32(at + 4)? as i32,
            })
        })?),
        FourCC::STSS => BoxFields::Stss(r.table(4, |at| r.u32(at))?),
        FourCC::STSC => BoxFields::Stsc(r.table(12, |at| {
            Ok(SampleToChunk {
                first_chunk: r.u32(at)?,
                samples_per_chunk: r.u32(at + 4)?,
                description_index: r.u32(at + 8)?,
            })
        })?),
        FourCC::STSZ => {
            let uniform_size = r.u32(4)?;
            let sample_count = r.u32(8)?;
            let sizes = if uniform_size == 0 {
                (0..sample_count as usize)
                    .map(|i| r.u32(12 + i * 4))
                    .collect::<Result<Vec<_>>>()?
            } else {
                Vec::new()
            };
            BoxFields::Stsz {
                uniform_size,
                sample_count,
                sizes,
            }
        }
        FourCC::STCO => BoxFields::ChunkOffsets(r.table(4, |at| Ok(r.u32(at)? as u64))?),
        FourCC::CO64 => BoxFields::ChunkOffsets(r.table(8, |at| r.u64(at))?),
        _ => BoxFields::Opaque,
    };
    Ok(fields)
}

fn fixed_16_16(raw: u32) -> f64 {
    raw as f64 / 65536.0
}

/// Walk the descriptors of an `esds` payload (after version and flags).
fn parse_esds(r: &FieldReader<'_>) -> Result<EsDescriptor> {
    let mut es = EsDescriptor::default();
    let mut pos = 4;

    while pos < r.data.len() {
        let tag = r.u8(pos)?;
        let (size, size_len) = descriptor_size(r, pos + 1)?;
        let body = pos + 1 + size_len;
        match tag {
            // ES_Descriptor: nested descriptors follow its own fields
            0x03 => {
                es.es_id = r.u16(body)?;
                let flags = r.u8(body + 2)?;
                let mut next = body + 3;
                if flags & 0x80 != 0 {
                    next += 2;
                }
                if flags & 0x40 != 0 {
                    next += 1 + r.u8(next)? as usize;
                }
                if flags & 0x20 != 0 {
                    next += 2;
                }
                pos = next;
            }
            // DecoderConfigDescriptor
            0x04 => {
                es.object_type_indication = r.u8(body)?;
                es.stream_type = r.u8(body + 1)? >> 2;
                es.buffer_size = r.u32(body + 1)? & 0x00FF_FFFF;
                es.max_bitrate = r.u32(body + 5)?;
                es.avg_bitrate = r.u32(body + 9)?;
                pos = body + 13;
            }
            // DecoderSpecificInfo
            0x05 => {
                es.decoder_specific_info = Some(Bytes::copy_from_slice(r.slice(body, size)?));
                break;
            }
            _ => pos = body + size,
        }
    }

    Ok(es)
}

/// Expandable descriptor size: up to four bytes, 7 bits each.
fn descriptor_size(r: &FieldReader<'_>, at: usize) -> Result<(usize, usize)> {
    let mut size = 0usize;
    for i in 0..4 {
        let b = r.u8(at + i)?;
        size = (size << 7) | (b & 0x7F) as usize;
        if b & 0x80 == 0 {
            return Ok((size, i + 1));
        }
    }
    Err(IsoError::truncated(r.kind, "descriptor size"))
}

/// Bounds-checked big-endian reads from a box payload.
struct FieldReader<'a> {
    kind: FourCC,
    data: &'a [u8],
}

impl<'a> FieldReader<'a> {
    fn new(kind: FourCC, data: &'a [u8]) -> Self {
        Self { kind, data }
    }

    fn slice(&self, at: usize, len: usize) -> Result<&'a [u8]> {
        at.checked_add(len)
            .and_then(|end| self.data.get(at..end))
            .ok_or_else(|| IsoError::truncated(self.kind, "field past end of box"))
    }

    fn array<const N: usize>(&self, at: usize) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(at, N)?);
        Ok(out)
    }

    fn u8(&self, at: usize) -> Result<u8> {
        Ok(self.array::<1>(at)?[0])
    }

    fn u16(&self, at: usize) -> Result<u16> {
        Ok(u16::from_be_bytes(self.array(at)?))
    }

    fn u32(&self, at: usize) -> Result<u32> {
        Ok(u32::from_be_bytes(self.array(at)?))
    }

    fn u64(&self, at: usize) -> Result<u64> {
        Ok(u64::from_be_bytes(self.array(at)?))
    }

    /// A full-box table: entry count at 4, `entry_size`-byte entries from 8.
    fn table<T>(&self, entry_size: usize, read: impl Fn(usize) -> Result<T>) -> Result<Vec<T>> {
        let count = self.u32(4)? as usize;
        if count.saturating_mul(entry_size) > self.data.len().saturating_sub(8) {
            return Err(IsoError::truncated(self.kind, "entry count exceeds box size"));
        }
        (0..count).map(|i| read(8 + i * entry_size)).collect()
    }
}
