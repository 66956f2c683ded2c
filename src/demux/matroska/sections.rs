//! Typed views of the Segment's top-level metadata elements.

use crate::demux::error::{DemuxError, Result};
use bytes::Bytes;
use streamdemux_ebml::{ids, Element, ElementId};

/// `SeekHead` entries: element ID to position relative to the Segment payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeekHead {
    pub entries: Vec<(ElementId, u64)>,
}

impl SeekHead {
    pub fn parse(el: &Element) -> Self {
        let entries = el
            .children_with(ids::SEEK)
            .filter_map(|seek| Some((seek.child(ids::SEEK_ID)?.as_id()?, seek.child_uint(ids::SEEK_POSITION)?)))
            .collect();
        Self { entries }
    }

    /// Position of the first entry for `id`.
    pub fn position(&self, id: ElementId) -> Option<u64> {
        self.entries.iter().find(|(e, _)| *e == id).map(|(_, pos)| *pos)
    }
}

/// The `Info` element.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentInfo {
    /// Nanoseconds per timecode tick.
    pub timecode_scale: u64,
    /// In ticks.
    pub duration: Option<f64>,
    pub title: Option<String>,
    pub muxing_app: Option<String>,
    pub writing_app: Option<String>,
    /// Nanoseconds since 2001-01-01.
    pub date_utc: Option<i64>,
}

impl SegmentInfo {
    pub fn parse(el: &Element) -> Result<Self> {
        let timecode_scale = el.child_uint_or_default(ids::TIMECODE_SCALE).unwrap_or(1_000_000);
        if timecode_scale == 0 {
            return Err(DemuxError::structural("TimecodeScale is zero"));
        }
        Ok(Self {
            timecode_scale,
            duration: el.child_float(ids::DURATION),
            title: el.child_str(ids::TITLE).map(str::to_string),
            muxing_app: el.child_str(ids::MUXING_APP).map(str::to_string),
            writing_app: el.child_str(ids::WRITING_APP).map(str::to_string),
            date_utc: el.child_int(ids::DATE_UTC),
        })
    }

    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> Option<f64> {
        self.duration.map(|d| d * self.timecode_scale as f64 / 1e6)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Video,
    Audio,
    Other(u64),
}

impl From<u64> for TrackType {
    fn from(value: u64) -> Self {
        match value {
            1 => Self::Video,
            2 => Self::Audio,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSettings {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub display_width: Option<u32>,
    pub display_height: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSettings {
    pub sampling_frequency: f64,
    pub channels: u8,
    pub bit_depth: Option<u8>,
}

/// One `TrackEntry`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEntry {
    pub number: u64,
    pub uid: Option<u64>,
    pub track_type: TrackType,
    pub codec_id: String,
    pub codec_private: Option<Bytes>,
    /// Nanoseconds per frame.
    pub default_duration: Option<u64>,
    pub video: Option<VideoSettings>,
    pub audio: Option<AudioSettings>,
    /// Compressed or encrypted tracks carry `ContentEncodings`.
    pub has_content_encodings: bool,
    /// The encoded `TrackEntry` element.
    pub raw: Bytes,
}

impl TrackEntry {
    pub fn parse(el: &Element) -> Result<Self> {
        let number = el
            .child_uint(ids::TRACK_NUMBER)
            .ok_or_else(|| DemuxError::structural("TrackEntry without TrackNumber"))?;
        let track_type = el
            .child_uint(ids::TRACK_TYPE)
            .map(TrackType::from)
            .ok_or_else(|| DemuxError::structural(format!("track {} has no TrackType", number)))?;

        let video = el.child(ids::VIDEO).map(|v| VideoSettings {
            pixel_width: v.child_uint(ids::PIXEL_WIDTH).unwrap_or(0) as u32,
            pixel_height: v.child_uint(ids::PIXEL_HEIGHT).unwrap_or(0) as u32,
            display_width: v.child_uint(ids::DISPLAY_WIDTH).map(|w| w as u32),
            display_height: v.child_uint(ids::DISPLAY_HEIGHT).map(|h| h as u32),
        });
        let audio = el.child(ids::AUDIO).map(|a| AudioSettings {
            sampling_frequency: a.child_float_or_default(ids::SAMPLING_FREQUENCY).unwrap_or(8000.0),
            channels: a.child_uint_or_default(ids::CHANNELS).unwrap_or(1) as u8,
            bit_depth: a.child_uint(ids::BIT_DEPTH).map(|b| b as u8),
        });

        Ok(Self {
            number,
            uid: el.child_uint(ids::TRACK_UID),
            track_type,
            codec_id: el.child_str(ids::CODEC_ID).unwrap_or_default().to_string(),
            codec_private: el.child_bytes(ids::CODEC_PRIVATE).cloned(),
            default_duration: el.child_uint(ids::DEFAULT_DURATION).filter(|d| *d > 0),
            video,
            audio,
            has_content_encodings: el.child(ids::CONTENT_ENCODINGS).is_some(),
            raw: el.raw().clone(),
        })
    }
}

/// Parse every `TrackEntry` of a `Tracks` element.
pub fn parse_tracks(el: &Element) -> Result<Vec<TrackEntry>> {
    el.children_with(ids::TRACK_ENTRY).map(TrackEntry::parse).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueTrackPosition {
    pub track: u64,
    /// Relative to the Segment payload.
    pub cluster_position: u64,
    pub relative_position: Option<u64>,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuePoint {
    /// In timecode ticks.
    pub time: u64,
    pub positions: Vec<CueTrackPosition>,
}

/// Parse the `CuePoint`s of a `Cues` element. Points without a time or a
/// cluster position are skipped.
pub fn parse_cues(el: &Element) -> Vec<CuePoint> {
    el.children_with(ids::CUE_POINT)
        .filter_map(|point| {
            let time = point.child_uint(ids::CUE_TIME)?;
            let positions: Vec<_> = point
                .children_with(ids::CUE_TRACK_POSITIONS)
                .filter_map(|pos| {
                    Some(CueTrackPosition {
                        track: pos.child_uint(ids::CUE_TRACK)?,
                        cluster_position: pos.child_uint(ids::CUE_CLUSTER_POSITION)?,
                        relative_position: pos.child_uint(ids::CUE_RELATIVE_POSITION),
                        block_number: pos.child_uint(ids::CUE_BLOCK_NUMBER),
                    })
                })
                .collect();
            (!positions.is_empty()).then_some(CuePoint { time, positions })
        })
        .collect()
}
