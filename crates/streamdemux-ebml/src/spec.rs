//! Matroska element definition table.
//!
//! Maps element IDs to names, semantic types, nesting levels and defaults.
//! The table is immutable; lookups go through lazily built hash indexes.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// An EBML element ID including its VINT marker bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

impl ElementId {
    /// Encoded width in bytes, derived from the marker bit.
    pub fn width(&self) -> usize {
        match self.0 {
            0..=0xFF => 1,
            0x100..=0xFFFF => 2,
            0x1_0000..=0xFF_FFFF => 3,
            _ => 4,
        }
    }

    /// The ID bytes exactly as they appear in the stream.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_be_bytes()[4 - self.width()..].to_vec()
    }

    /// Name from the element table, `"Unknown"` otherwise.
    pub fn name(&self) -> &'static str {
        lookup_by_id(*self).name
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// Semantic type of an element's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Master,
    UnsignedInteger,
    SignedInteger,
    Float,
    String,
    Utf8,
    Binary,
    Date,
    EbmlId,
    Unknown,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::UnsignedInteger => "uinteger",
            Self::SignedInteger => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Utf8 => "utf-8",
            Self::Binary => "binary",
            Self::Date => "date",
            Self::EbmlId => "ebmlid",
            Self::Unknown => "unknown",
        }
    }
}

/// Default value declared for an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Uint(u64),
    Int(i64),
    Float(f64),
    Str(&'static str),
}

/// One row of the element table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementDef {
    pub name: &'static str,
    pub id: ElementId,
    pub kind: ElementType,
    /// Nesting level; `-1` marks global elements allowed anywhere.
    pub level: i8,
    pub mandatory: bool,
    pub multiple: bool,
    pub default: Option<DefaultValue>,
}

impl ElementDef {
    const fn new(name: &'static str, id: u32, kind: ElementType, level: i8) -> Self {
        Self {
            name,
            id: ElementId(id),
            kind,
            level,
            mandatory: false,
            multiple: false,
            default: None,
        }
    }

    const fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    const fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    const fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Whether this element is allowed at any level.
    pub fn is_global(&self) -> bool {
        self.level < 0
    }
}

/// Returned by [`lookup_by_id`] for IDs missing from the table.
pub static UNKNOWN: ElementDef = ElementDef::new("Unknown", 0, ElementType::Unknown, -1);

/// Well-known element IDs.
pub mod ids {
    use super::ElementId;

    pub const EBML: ElementId = ElementId(0x1A45_DFA3);
    pub const DOC_TYPE: ElementId = ElementId(0x4282);
    pub const VOID: ElementId = ElementId(0xEC);
    pub const CRC32: ElementId = ElementId(0xBF);
    pub const SEGMENT: ElementId = ElementId(0x1853_8067);
    pub const SEEK_HEAD: ElementId = ElementId(0x114D_9B74);
    pub const SEEK: ElementId = ElementId(0x4DBB);
    pub const SEEK_ID: ElementId = ElementId(0x53AB);
    pub const SEEK_POSITION: ElementId = ElementId(0x53AC);
    pub const INFO: ElementId = ElementId(0x1549_A966);
    pub const TIMECODE_SCALE: ElementId = ElementId(0x2A_D7B1);
    pub const DURATION: ElementId = ElementId(0x4489);
    pub const DATE_UTC: ElementId = ElementId(0x4461);
    pub const TITLE: ElementId = ElementId(0x7BA9);
    pub const MUXING_APP: ElementId = ElementId(0x4D80);
    pub const WRITING_APP: ElementId = ElementId(0x5741);
    pub const CLUSTER: ElementId = ElementId(0x1F43_B675);
    pub const TIMECODE: ElementId = ElementId(0xE7);
    pub const SIMPLE_BLOCK: ElementId = ElementId(0xA3);
    pub const BLOCK_GROUP: ElementId = ElementId(0xA0);
    pub const BLOCK: ElementId = ElementId(0xA1);
    pub const BLOCK_DURATION: ElementId = ElementId(0x9B);
    pub const REFERENCE_BLOCK: ElementId = ElementId(0xFB);
    pub const DISCARD_PADDING: ElementId = ElementId(0x75A2);
    pub const TRACKS: ElementId = ElementId(0x1654_AE6B);
    pub const TRACK_ENTRY: ElementId = ElementId(0xAE);
    pub const TRACK_NUMBER: ElementId = ElementId(0xD7);
    pub const TRACK_UID: ElementId = ElementId(0x73C5);
    pub const TRACK_TYPE: ElementId = ElementId(0x83);
    pub const FLAG_ENABLED: ElementId = ElementId(0xB9);
    pub const FLAG_DEFAULT: ElementId = ElementId(0x88);
    pub const FLAG_LACING: ElementId = ElementId(0x9C);
    pub const DEFAULT_DURATION: ElementId = ElementId(0x23_E383);
    pub const TRACK_TIMECODE_SCALE: ElementId = ElementId(0x23_314F);
    pub const NAME: ElementId = ElementId(0x536E);
    pub const LANGUAGE: ElementId = ElementId(0x22_B59C);
    pub const CODEC_ID: ElementId = ElementId(0x86);
    pub const CODEC_PRIVATE: ElementId = ElementId(0x63A2);
    pub const CODEC_NAME: ElementId = ElementId(0x25_8688);
    pub const CODEC_DELAY: ElementId = ElementId(0x56AA);
    pub const SEEK_PRE_ROLL: ElementId = ElementId(0x56BB);
    pub const VIDEO: ElementId = ElementId(0xE0);
    pub const PIXEL_WIDTH: ElementId = ElementId(0xB0);
    pub const PIXEL_HEIGHT: ElementId = ElementId(0xBA);
    pub const DISPLAY_WIDTH: ElementId = ElementId(0x54B0);
    pub const DISPLAY_HEIGHT: ElementId = ElementId(0x54BA);
    pub const FLAG_INTERLACED: ElementId = ElementId(0x9A);
    pub const FRAME_RATE: ElementId = ElementId(0x23_83E3);
    pub const AUDIO: ElementId = ElementId(0xE1);
    pub const SAMPLING_FREQUENCY: ElementId = ElementId(0xB5);
    pub const OUTPUT_SAMPLING_FREQUENCY: ElementId = ElementId(0x78B5);
    pub const CHANNELS: ElementId = ElementId(0x9F);
    pub const BIT_DEPTH: ElementId = ElementId(0x6264);
    pub const CONTENT_ENCODINGS: ElementId = ElementId(0x6D80);
    pub const CUES: ElementId = ElementId(0x1C53_BB6B);
    pub const CUE_POINT: ElementId = ElementId(0xBB);
    pub const CUE_TIME: ElementId = ElementId(0xB3);
    pub const CUE_TRACK_POSITIONS: ElementId = ElementId(0xB7);
    pub const CUE_TRACK: ElementId = ElementId(0xF7);
    pub const CUE_CLUSTER_POSITION: ElementId = ElementId(0xF1);
    pub const CUE_RELATIVE_POSITION: ElementId = ElementId(0xF0);
    pub const CUE_BLOCK_NUMBER: ElementId = ElementId(0x5378);
    pub const ATTACHMENTS: ElementId = ElementId(0x1941_A469);
    pub const CHAPTERS: ElementId = ElementId(0x1043_A770);
    pub const TAGS: ElementId = ElementId(0x1254_C367);
}

use DefaultValue::{Float as F, Int as I, Str as S, Uint as U};
use ElementType::*;

const fn el(name: &'static str, id: u32, kind: ElementType, level: i8) -> ElementDef {
    ElementDef::new(name, id, kind, level)
}

static TABLE: &[ElementDef] = &[
    // EBML header
    el("EBML", 0x1A45_DFA3, Master, 0).mandatory().multiple(),
    el("EBMLVersion", 0x4286, UnsignedInteger, 1).mandatory().default(U(1)),
    el("EBMLReadVersion", 0x42F7, UnsignedInteger, 1).mandatory().default(U(1)),
    el("EBMLMaxIDLength", 0x42F2, UnsignedInteger, 1).mandatory().default(U(4)),
    el("EBMLMaxSizeLength", 0x42F3, UnsignedInteger, 1).mandatory().default(U(8)),
    el("DocType", 0x4282, String, 1).mandatory().default(S("matroska")),
    el("DocTypeVersion", 0x4287, UnsignedInteger, 1).mandatory().default(U(1)),
    el("DocTypeReadVersion", 0x4285, UnsignedInteger, 1).mandatory().default(U(1)),
    // Global
    el("Void", 0xEC, Binary, -1),
    el("CRC-32", 0xBF, Binary, -1),
    el("SignatureSlot", 0x1B53_8667, Master, -1).multiple(),
    el("SignatureAlgo", 0x7E8A, UnsignedInteger, 1),
    el("SignatureHash", 0x7E9A, UnsignedInteger, 1),
    el("SignaturePublicKey", 0x7EA5, Binary, 1),
    el("Signature", 0x7EB5, Binary, 1),
    el("SignatureElements", 0x7E5B, Master, 1),
    el("SignatureElementList", 0x7E7B, Master, 2).multiple(),
    el("SignedElement", 0x6532, Binary, 3).multiple(),
    // Segment
    el("Segment", 0x1853_8067, Master, 0).mandatory().multiple(),
    el("SeekHead", 0x114D_9B74, Master, 1).multiple(),
    el("Seek", 0x4DBB, Master, 2).mandatory().multiple(),
    el("SeekID", 0x53AB, EbmlId, 3).mandatory(),
    el("SeekPosition", 0x53AC, UnsignedInteger, 3).mandatory(),
    // Segment information
    el("Info", 0x1549_A966, Master, 1).mandatory().multiple(),
    el("SegmentUID", 0x73A4, Binary, 2),
    el("SegmentFilename", 0x7384, Utf8, 2),
    el("PrevUID", 0x3C_B923, Binary, 2),
    el("PrevFilename", 0x3C_83AB, Utf8, 2),
    el("NextUID", 0x3E_B923, Binary, 2),
    el("NextFilename", 0x3E_83BB, Utf8, 2),
    el("SegmentFamily", 0x4444, Binary, 2).multiple(),
    el("ChapterTranslate", 0x6924, Master, 2).multiple(),
    el("ChapterTranslateEditionUID", 0x69FC, UnsignedInteger, 3).multiple(),
    el("ChapterTranslateCodec", 0x69BF, UnsignedInteger, 3).mandatory(),
    el("ChapterTranslateID", 0x69A5, Binary, 3).mandatory(),
    el("TimecodeScale", 0x2A_D7B1, UnsignedInteger, 2).mandatory().default(U(1_000_000)),
    el("Duration", 0x4489, Float, 2),
    el("DateUTC", 0x4461, Date, 2),
    el("Title", 0x7BA9, Utf8, 2),
    el("MuxingApp", 0x4D80, Utf8, 2).mandatory(),
    el("WritingApp", 0x5741, Utf8, 2).mandatory(),
    // Cluster
    el("Cluster", 0x1F43_B675, Master, 1).multiple(),
    el("Timecode", 0xE7, UnsignedInteger, 2).mandatory(),
    el("SilentTracks", 0x5854, Master, 2),
    el("SilentTrackNumber", 0x58D7, UnsignedInteger, 3).multiple(),
    el("Position", 0xA7, UnsignedInteger, 2),
    el("PrevSize", 0xAB, UnsignedInteger, 2),
    el("SimpleBlock", 0xA3, Binary, 2).multiple(),
    el("BlockGroup", 0xA0, Master, 2).multiple(),
    el("Block", 0xA1, Binary, 3).mandatory(),
    el("BlockVirtual", 0xA2, Binary, 3),
    el("BlockAdditions", 0x75A1, Master, 3),
    el("BlockMore", 0xA6, Master, 4).mandatory().multiple(),
    el("BlockAddID", 0xEE, UnsignedInteger, 5).mandatory().default(U(1)),
    el("BlockAdditional", 0xA5, Binary, 5).mandatory(),
    el("BlockDuration", 0x9B, UnsignedInteger, 3),
    el("ReferencePriority", 0xFA, UnsignedInteger, 3).mandatory().default(U(0)),
    el("ReferenceBlock", 0xFB, SignedInteger, 3).multiple(),
    el("ReferenceVirtual", 0xFD, SignedInteger, 3),
    el("CodecState", 0xA4, Binary, 3),
    el("DiscardPadding", 0x75A2, SignedInteger, 3),
    el("Slices", 0x8E, Master, 3),
    el("TimeSlice", 0xE8, Master, 4).multiple(),
    el("LaceNumber", 0xCC, UnsignedInteger, 5).default(U(0)),
    el("FrameNumber", 0xCD, UnsignedInteger, 5).default(U(0)),
    el("BlockAdditionID", 0xCB, UnsignedInteger, 5).default(U(0)),
    el("Delay", 0xCE, UnsignedInteger, 5).default(U(0)),
    el("SliceDuration", 0xCF, UnsignedInteger, 5).default(U(0)),
    el("ReferenceFrame", 0xC8, Master, 3),
    el("ReferenceOffset", 0xC9, UnsignedInteger, 4).mandatory(),
    el("ReferenceTimeCode", 0xCA, UnsignedInteger, 4).mandatory(),
    el("EncryptedBlock", 0xAF, Binary, 2).multiple(),
    // Tracks
    el("Tracks", 0x1654_AE6B, Master, 1).multiple(),
    el("TrackEntry", 0xAE, Master, 2).mandatory().multiple(),
    el("TrackNumber", 0xD7, UnsignedInteger, 3).mandatory(),
    el("TrackUID", 0x73C5, UnsignedInteger, 3).mandatory(),
    el("TrackType", 0x83, UnsignedInteger, 3).mandatory(),
    el("FlagEnabled", 0xB9, UnsignedInteger, 3).mandatory().default(U(1)),
    el("FlagDefault", 0x88, UnsignedInteger, 3).mandatory().default(U(1)),
    el("FlagForced", 0x55AA, UnsignedInteger, 3).mandatory().default(U(0)),
    el("FlagLacing", 0x9C, UnsignedInteger, 3).mandatory().default(U(1)),
    el("MinCache", 0x6DE7, UnsignedInteger, 3).mandatory().default(U(0)),
    el("MaxCache", 0x6DF8, UnsignedInteger, 3),
    el("DefaultDuration", 0x23_E383, UnsignedInteger, 3),
    el("DefaultDecodedFieldDuration", 0x23_4E7A, UnsignedInteger, 3),
    el("TrackTimecodeScale", 0x23_314F, Float, 3).mandatory().default(F(1.0)),
    el("TrackOffset", 0x537F, SignedInteger, 3).default(I(0)),
    el("MaxBlockAdditionID", 0x55EE, UnsignedInteger, 3).mandatory().default(U(0)),
    el("Name", 0x536E, Utf8, 3),
    el("Language", 0x22_B59C, String, 3).default(S("eng")),
    el("CodecID", 0x86, String, 3).mandatory(),
    el("CodecPrivate", 0x63A2, Binary, 3),
    el("CodecName", 0x25_8688, Utf8, 3),
    el("AttachmentLink", 0x7446, UnsignedInteger, 3),
    el("CodecSettings", 0x3A_9697, Utf8, 3),
    el("CodecInfoURL", 0x3B_4040, String, 3).multiple(),
    el("CodecDownloadURL", 0x26_B240, String, 3).multiple(),
    el("CodecDecodeAll", 0xAA, UnsignedInteger, 3).mandatory().default(U(1)),
    el("TrackOverlay", 0x6FAB, UnsignedInteger, 3).multiple(),
    el("CodecDelay", 0x56AA, UnsignedInteger, 3).default(U(0)),
    el("SeekPreRoll", 0x56BB, UnsignedInteger, 3).mandatory().default(U(0)),
    el("TrackTranslate", 0x6624, Master, 3).multiple(),
    el("TrackTranslateEditionUID", 0x66FC, UnsignedInteger, 4).multiple(),
    el("TrackTranslateCodec", 0x66BF, UnsignedInteger, 4).mandatory(),
    el("TrackTranslateTrackID", 0x66A5, Binary, 4).mandatory(),
    el("Video", 0xE0, Master, 3),
    el("FlagInterlaced", 0x9A, UnsignedInteger, 4).mandatory().default(U(0)),
    el("StereoMode", 0x53B8, UnsignedInteger, 4).default(U(0)),
    el("AlphaMode", 0x53C0, UnsignedInteger, 4).default(U(0)),
    el("OldStereoMode", 0x53B9, UnsignedInteger, 4),
    el("PixelWidth", 0xB0, UnsignedInteger, 4).mandatory(),
    el("PixelHeight", 0xBA, UnsignedInteger, 4).mandatory(),
    el("PixelCropBottom", 0x54AA, UnsignedInteger, 4).default(U(0)),
    el("PixelCropTop", 0x54BB, UnsignedInteger, 4).default(U(0)),
    el("PixelCropLeft", 0x54CC, UnsignedInteger, 4).default(U(0)),
    el("PixelCropRight", 0x54DD, UnsignedInteger, 4).default(U(0)),
    el("DisplayWidth", 0x54B0, UnsignedInteger, 4),
    el("DisplayHeight", 0x54BA, UnsignedInteger, 4),
    el("DisplayUnit", 0x54B2, UnsignedInteger, 4).default(U(0)),
    el("AspectRatioType", 0x54B3, UnsignedInteger, 4).default(U(0)),
    el("ColourSpace", 0x2E_B524, Binary, 4),
    el("GammaValue", 0x2F_B523, Float, 4),
    el("FrameRate", 0x23_83E3, Float, 4),
    el("Colour", 0x55B0, Master, 4),
    el("MatrixCoefficients", 0x55B1, UnsignedInteger, 5).default(U(2)),
    el("BitsPerChannel", 0x55B2, UnsignedInteger, 5).default(U(0)),
    el("Range", 0x55B9, UnsignedInteger, 5).default(U(0)),
    el("TransferCharacteristics", 0x55BA, UnsignedInteger, 5).default(U(2)),
    el("Primaries", 0x55BB, UnsignedInteger, 5).default(U(2)),
    el("Audio", 0xE1, Master, 3),
    el("SamplingFrequency", 0xB5, Float, 4).mandatory().default(F(8000.0)),
    el("OutputSamplingFrequency", 0x78B5, Float, 4),
    el("Channels", 0x9F, UnsignedInteger, 4).mandatory().default(U(1)),
    el("ChannelPositions", 0x7D7B, Binary, 4),
    el("BitDepth", 0x6264, UnsignedInteger, 4),
    el("TrackOperation", 0xE2, Master, 3),
    el("TrackCombinePlanes", 0xE3, Master, 4),
    el("TrackPlane", 0xE4, Master, 5).mandatory().multiple(),
    el("TrackPlaneUID", 0xE5, UnsignedInteger, 6).mandatory(),
    el("TrackPlaneType", 0xE6, UnsignedInteger, 6).mandatory(),
    el("TrackJoinBlocks", 0xE9, Master, 4),
    el("TrackJoinUID", 0xED, UnsignedInteger, 5).mandatory().multiple(),
    el("TrickTrackUID", 0xC0, UnsignedInteger, 3),
    el("TrickTrackSegmentUID", 0xC1, Binary, 3),
    el("TrickTrackFlag", 0xC6, UnsignedInteger, 3).default(U(0)),
    el("TrickMasterTrackUID", 0xC7, UnsignedInteger, 3),
    el("TrickMasterTrackSegmentUID", 0xC4, Binary, 3),
    el("ContentEncodings", 0x6D80, Master, 3),
    el("ContentEncoding", 0x6240, Master, 4).mandatory().multiple(),
    el("ContentEncodingOrder", 0x5031, UnsignedInteger, 5).mandatory().default(U(0)),
    el("ContentEncodingScope", 0x5032, UnsignedInteger, 5).mandatory().default(U(1)),
    el("ContentEncodingType", 0x5033, UnsignedInteger, 5).mandatory().default(U(0)),
    el("ContentCompression", 0x5034, Master, 5),
    el("ContentCompAlgo", 0x4254, UnsignedInteger, 6).mandatory().default(U(0)),
    el("ContentCompSettings", 0x4255, Binary, 6),
    el("ContentEncryption", 0x5035, Master, 5),
    el("ContentEncAlgo", 0x47E1, UnsignedInteger, 6).default(U(0)),
    el("ContentEncKeyID", 0x47E2, Binary, 6),
    el("ContentSignature", 0x47E3, Binary, 6),
    el("ContentSigKeyID", 0x47E4, Binary, 6),
    el("ContentSigAlgo", 0x47E5, UnsignedInteger, 6).default(U(0)),
    el("ContentSigHashAlgo", 0x47E6, UnsignedInteger, 6).default(U(0)),
    // Cueing data
    el("Cues", 0x1C53_BB6B, Master, 1),
    el("CuePoint", 0xBB, Master, 2).mandatory().multiple(),
    el("CueTime", 0xB3, UnsignedInteger, 3).mandatory(),
    el("CueTrackPositions", 0xB7, Master, 3).mandatory().multiple(),
    el("CueTrack", 0xF7, UnsignedInteger, 4).mandatory(),
    el("CueClusterPosition", 0xF1, UnsignedInteger, 4).mandatory(),
    el("CueRelativePosition", 0xF0, UnsignedInteger, 4),
    el("CueDuration", 0xB2, UnsignedInteger, 4),
    el("CueBlockNumber", 0x5378, UnsignedInteger, 4).default(U(1)),
    el("CueCodecState", 0xEA, UnsignedInteger, 4).default(U(0)),
    el("CueReference", 0xDB, Master, 4).multiple(),
    el("CueRefTime", 0x96, UnsignedInteger, 5).mandatory(),
    el("CueRefCluster", 0x97, UnsignedInteger, 5).mandatory(),
    el("CueRefNumber", 0x535F, UnsignedInteger, 5).default(U(1)),
    el("CueRefCodecState", 0xEB, UnsignedInteger, 5).default(U(0)),
    // Attachments
    el("Attachments", 0x1941_A469, Master, 1),
    el("AttachedFile", 0x61A7, Master, 2).mandatory().multiple(),
    el("FileDescription", 0x467E, Utf8, 3),
    el("FileName", 0x466E, Utf8, 3).mandatory(),
    el("FileMimeType", 0x4660, String, 3).mandatory(),
    el("FileData", 0x465C, Binary, 3).mandatory(),
    el("FileUID", 0x46AE, UnsignedInteger, 3).mandatory(),
    el("FileReferral", 0x4675, Binary, 3),
    el("FileUsedStartTime", 0x4661, UnsignedInteger, 3),
    el("FileUsedEndTime", 0x4662, UnsignedInteger, 3),
    // Chapters
    el("Chapters", 0x1043_A770, Master, 1),
    el("EditionEntry", 0x45B9, Master, 2).mandatory().multiple(),
    el("EditionUID", 0x45BC, UnsignedInteger, 3),
    el("EditionFlagHidden", 0x45BD, UnsignedInteger, 3).mandatory().default(U(0)),
    el("EditionFlagDefault", 0x45DB, UnsignedInteger, 3).mandatory().default(U(0)),
    el("EditionFlagOrdered", 0x45DD, UnsignedInteger, 3).default(U(0)),
    el("ChapterAtom", 0xB6, Master, 3).mandatory().multiple(),
    el("ChapterUID", 0x73C4, UnsignedInteger, 4).mandatory(),
    el("ChapterStringUID", 0x5654, Utf8, 4),
    el("ChapterTimeStart", 0x91, UnsignedInteger, 4).mandatory(),
    el("ChapterTimeEnd", 0x92, UnsignedInteger, 4),
    el("ChapterFlagHidden", 0x98, UnsignedInteger, 4).mandatory().default(U(0)),
    el("ChapterFlagEnabled", 0x4598, UnsignedInteger, 4).mandatory().default(U(1)),
    el("ChapterSegmentUID", 0x6E67, Binary, 4),
    el("ChapterSegmentEditionUID", 0x6EBC, UnsignedInteger, 4),
    el("ChapterPhysicalEquiv", 0x63C3, UnsignedInteger, 4),
    el("ChapterTrack", 0x8F, Master, 4),
    el("ChapterTrackNumber", 0x89, UnsignedInteger, 5).mandatory().multiple(),
    el("ChapterDisplay", 0x80, Master, 4).multiple(),
    el("ChapString", 0x85, Utf8, 5).mandatory(),
    el("ChapLanguage", 0x437C, String, 5).mandatory().multiple().default(S("eng")),
    el("ChapCountry", 0x437E, String, 5).multiple(),
    el("ChapProcess", 0x6944, Master, 4).multiple(),
    el("ChapProcessCodecID", 0x6955, UnsignedInteger, 5).mandatory().default(U(0)),
    el("ChapProcessPrivate", 0x450D, Binary, 5),
    el("ChapProcessCommand", 0x6911, Master, 5).multiple(),
    el("ChapProcessTime", 0x6922, UnsignedInteger, 6).mandatory(),
    el("ChapProcessData", 0x6933, Binary, 6).mandatory(),
    // Tagging
    el("Tags", 0x1254_C367, Master, 1).multiple(),
    el("Tag", 0x7373, Master, 2).mandatory().multiple(),
    el("Targets", 0x63C0, Master, 3).mandatory(),
    el("TargetTypeValue", 0x68CA, UnsignedInteger, 4).default(U(50)),
    el("TargetType", 0x63CA, String, 4),
    el("TagTrackUID", 0x63C5, UnsignedInteger, 4).multiple().default(U(0)),
    el("TagEditionUID", 0x63C9, UnsignedInteger, 4).multiple().default(U(0)),
    el("TagChapterUID", 0x63C4, UnsignedInteger, 4).multiple().default(U(0)),
    el("TagAttachmentUID", 0x63C6, UnsignedInteger, 4).multiple().default(U(0)),
    el("SimpleTag", 0x67C8, Master, 3).mandatory().multiple(),
    el("TagName", 0x45A3, Utf8, 4).mandatory(),
    el("TagLanguage", 0x447A, String, 4).mandatory().default(S("und")),
    el("TagDefault", 0x4484, UnsignedInteger, 4).mandatory().default(U(1)),
    el("TagString", 0x4487, Utf8, 4),
    el("TagBinary", 0x4485, Binary, 4),
];

fn by_id() -> &'static HashMap<ElementId, &'static ElementDef> {
    static INDEX: OnceLock<HashMap<ElementId, &'static ElementDef>> = OnceLock::new();
    INDEX.get_or_init(|| TABLE.iter().map(|def| (def.id, def)).collect())
}

fn by_name() -> &'static HashMap<&'static str, &'static ElementDef> {
    static INDEX: OnceLock<HashMap<&'static str, &'static ElementDef>> = OnceLock::new();
    INDEX.get_or_init(|| TABLE.iter().map(|def| (def.name, def)).collect())
}

/// Look up an element by ID, falling back to [`UNKNOWN`].
pub fn lookup_by_id(id: ElementId) -> &'static ElementDef {
    by_id().get(&id).copied().unwrap_or(&UNKNOWN)
}

/// Look up an element by its Matroska name.
pub fn lookup_by_name(name: &str) -> Option<&'static ElementDef> {
    by_name().get(name).copied()
}

/// All rows of the table, in definition order.
pub fn definitions() -> &'static [ElementDef] {
    TABLE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id() {
        let def = lookup_by_id(ids::SEGMENT);
        assert_eq!(def.name, "Segment");
        assert_eq!(def.kind, ElementType::Master);
        assert_eq!(def.level, 0);

        let block = lookup_by_id(ids::SIMPLE_BLOCK);
        assert_eq!(block.kind, ElementType::Binary);
    }

    #[test]
    fn test_unknown_id_falls_back() {
        let def = lookup_by_id(ElementId(0x4F00));
        assert_eq!(def.kind, ElementType::Unknown);
        assert_eq!(def.name, "Unknown");
        assert!(def.is_global());
    }

    #[test]
    fn test_lookup_by_name_with_default() {
        let def = lookup_by_name("TimecodeScale").unwrap();
        assert_eq!(def.id, ids::TIMECODE_SCALE);
        assert_eq!(def.default, Some(DefaultValue::Uint(1_000_000)));
        assert!(lookup_by_name("NoSuchElement").is_none());
    }

    #[test]
    fn test_table_ids_and_names_unique() {
        assert_eq!(by_id().len(), TABLE.len());
        assert_eq!(by_name().len(), TABLE.len());
    }

    #[test]
    fn test_id_constants_match_table() {
        for id in [
            ids::EBML,
            ids::SEEK_HEAD,
            ids::CLUSTER,
            ids::CUES,
            ids::DEFAULT_DURATION,
            ids::CODEC_PRIVATE,
            ids::CUE_CLUSTER_POSITION,
        ] {
            assert_ne!(lookup_by_id(id).kind, ElementType::Unknown, "{id}");
        }
    }

    #[test]
    fn test_element_id_bytes() {
        assert_eq!(ids::EBML.to_bytes(), vec![0x1A, 0x45, 0xDF, 0xA3]);
        assert_eq!(ids::TIMECODE_SCALE.to_bytes(), vec![0x2A, 0xD7, 0xB1]);
        assert_eq!(ids::VOID.width(), 1);
        assert_eq!(ids::SEEK.width(), 2);
    }
}
