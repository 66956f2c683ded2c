//! Synthetic stream builders shared by the integration tests.
//!
//! Matroska and WebM files are written with the EBML encoder; MP4 files are
//! assembled box by box with a `ftyp`, `moov`, `mdat` layout.

#![allow(dead_code)]

use bytes::Bytes;
use streamdemux::demux::{feed_all, CollectingSink, DemuxSession, FeedSummary};
use streamdemux_ebml::{
    encode, encode_block, encode_simple_block, ids, wrap, Child, EbmlValue, ElementId, EncodedLength, Lacing,
};

/// Run `data` through a fresh session, `chunk_size` bytes per delivery.
pub fn demux(data: &[u8], chunk_size: usize) -> (DemuxSession<CollectingSink>, FeedSummary) {
    let mut session = DemuxSession::new(CollectingSink::default());
    let summary = feed_all(&mut session, data, chunk_size).expect("demuxing succeeds");
    (session, summary)
}

// Matroska / WebM

pub fn ebml_header(doc_type: &str) -> Vec<u8> {
    encode(
        "EBML",
        &EbmlValue::Children(vec![
            Child::new("EBMLVersion", EbmlValue::Uint(1)),
            Child::new("DocType", EbmlValue::String(doc_type.to_string())),
            Child::new("DocTypeVersion", EbmlValue::Uint(4)),
        ]),
        EncodedLength::Auto,
    )
    .unwrap()
}

/// `Info` with a millisecond TimecodeScale.
pub fn info(duration_ms: f64) -> Vec<u8> {
    encode(
        "Info",
        &EbmlValue::Children(vec![
            Child::new("TimecodeScale", EbmlValue::Uint(1_000_000)),
            Child::new("Duration", EbmlValue::Float(duration_ms)),
            Child::new("MuxingApp", EbmlValue::String("fixture".into())),
        ]),
        EncodedLength::Auto,
    )
    .unwrap()
}

pub fn video_entry(number: u64, codec_id: &str, default_duration_ns: u64) -> Child {
    Child::new(
        "TrackEntry",
        EbmlValue::Children(vec![
            Child::new("TrackNumber", EbmlValue::Uint(number)),
            Child::new("TrackUID", EbmlValue::Uint(number * 1000)),
            Child::new("TrackType", EbmlValue::Uint(1)),
            Child::new("CodecID", EbmlValue::String(codec_id.to_string())),
            Child::new("DefaultDuration", EbmlValue::Uint(default_duration_ns)),
            Child::new(
                "Video",
                EbmlValue::Children(vec![
                    Child::new("PixelWidth", EbmlValue::Uint(320)),
                    Child::new("PixelHeight", EbmlValue::Uint(240)),
                ]),
            ),
        ]),
    )
}

/// Opus at 48 kHz stereo, 20 ms frames.
pub fn opus_entry(number: u64) -> Child {
    Child::new(
        "TrackEntry",
        EbmlValue::Children(vec![
            Child::new("TrackNumber", EbmlValue::Uint(number)),
            Child::new("TrackUID", EbmlValue::Uint(number * 1000)),
            Child::new("TrackType", EbmlValue::Uint(2)),
            Child::new("CodecID", EbmlValue::String("A_OPUS".into())),
            Child::new("CodecPrivate", EbmlValue::Payload(Bytes::from_static(b"OpusHead\x01\x02"))),
            Child::new("DefaultDuration", EbmlValue::Uint(20_000_000)),
            Child::new(
                "Audio",
                EbmlValue::Children(vec![
                    Child::new("SamplingFrequency", EbmlValue::Float(48_000.0)),
                    Child::new("Channels", EbmlValue::Uint(2)),
                ]),
            ),
        ]),
    )
}

pub fn tracks(entries: Vec<Child>) -> Vec<u8> {
    encode("Tracks", &EbmlValue::Children(entries), EncodedLength::Auto).unwrap()
}

pub fn simple_block(track: u64, timecode: i16, keyframe: bool, frame: &[u8]) -> Vec<u8> {
    encode_simple_block(track, timecode, keyframe, frame).unwrap()
}

/// A keyframe SimpleBlock holding `frames` with the given lacing.
pub fn laced_block(track: u64, timecode: i16, lacing: Lacing, frames: &[&[u8]]) -> Vec<u8> {
    let body = encode_block(track, timecode, 0x80, lacing, frames).unwrap();
    wrap(ids::SIMPLE_BLOCK, &body, EncodedLength::Auto).unwrap()
}

pub fn cluster(timecode: u64, blocks: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = encode("Timecode", &EbmlValue::Uint(timecode), EncodedLength::Auto).unwrap();
    for block in blocks {
        payload.extend_from_slice(block);
    }
    wrap(ids::CLUSTER, &payload, EncodedLength::Auto).unwrap()
}

/// A SeekHead with four-byte positions, so its size does not depend on them.
pub fn seek_head(entries: &[(ElementId, u64)]) -> Vec<u8> {
    let seeks = entries
        .iter()
        .map(|(id, position)| {
            Child::new(
                "Seek",
                EbmlValue::Children(vec![
                    Child::new("SeekID", EbmlValue::Id(*id)),
                    Child::new(
                        "SeekPosition",
                        EbmlValue::Payload(Bytes::copy_from_slice(&(*position as u32).to_be_bytes())),
                    ),
                ]),
            )
        })
        .collect();
    encode("SeekHead", &EbmlValue::Children(seeks), EncodedLength::Auto).unwrap()
}

/// Cues from `(time, track, cluster position)` triples.
pub fn cues(points: &[(u64, u64, u64)]) -> Vec<u8> {
    let points = points
        .iter()
        .map(|(time, track, position)| {
            Child::new(
                "CuePoint",
                EbmlValue::Children(vec![
                    Child::new("CueTime", EbmlValue::Uint(*time)),
                    Child::new(
                        "CueTrackPositions",
                        EbmlValue::Children(vec![
                            Child::new("CueTrack", EbmlValue::Uint(*track)),
                            Child::new("CueClusterPosition", EbmlValue::Uint(*position)),
                        ]),
                    ),
                ]),
            )
        })
        .collect();
    encode("Cues", &EbmlValue::Children(points), EncodedLength::Auto).unwrap()
}

/// EBML header plus an unknown-size Segment holding `children` in order.
/// Returns the file and the absolute offset of the Segment payload.
pub fn matroska_file(doc_type: &str, children: &[Vec<u8>]) -> (Vec<u8>, u64) {
    let payload = children.concat();
    let mut file = ebml_header(doc_type);
    file.extend(wrap(ids::SEGMENT, &payload, EncodedLength::Unknown).unwrap());
    let segment_data_start = (file.len() - payload.len()) as u64;
    (file, segment_data_start)
}

/// A 30 fps VP8 WebM with one keyframe Cluster of three frames.
pub fn small_webm() -> Vec<u8> {
    let blocks = [
        simple_block(1, 0, true, b"\x9d\x01\x2a\x00"),
        simple_block(1, 33, false, b"\x31\x00"),
        simple_block(1, 66, false, b"\x32\x00"),
    ];
    let (file, _) = matroska_file(
        "webm",
        &[
            info(100.0),
            tracks(vec![video_entry(1, "V_VP8", 33_333_333)]),
            cluster(0, &blocks),
        ],
    );
    file
}

// MP4

pub fn mp4_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}

/// Prefix version and flags.
pub fn full_box(rest: &[u8]) -> Vec<u8> {
    let mut out = vec![0, 0, 0, 0];
    out.extend_from_slice(rest);
    out
}

/// A full-box table: entry count followed by the entries.
pub fn table(entries: &[&[u32]]) -> Vec<u8> {
    let mut out = (entries.len() as u32).to_be_bytes().to_vec();
    for entry in entries {
        for v in *entry {
            out.extend_from_slice(&v.to_be_bytes());
        }
    }
    full_box(&out)
}

/// `mvhd` or `mdhd`, version 0.
pub fn media_header(kind: &[u8; 4], timescale: u32, duration: u32) -> Vec<u8> {
    let mut body = vec![0u8; 8];
    body.extend_from_slice(&timescale.to_be_bytes());
    body.extend_from_slice(&duration.to_be_bytes());
    body.extend_from_slice(&[0u8; 4]);
    mp4_box(kind, &full_box(&body))
}

fn tkhd(track_id: u32, width: u32, height: u32) -> Vec<u8> {
    let mut body = vec![0u8; 84];
    body[12..16].copy_from_slice(&track_id.to_be_bytes());
    body[76..80].copy_from_slice(&(width << 16).to_be_bytes());
    body[80..84].copy_from_slice(&(height << 16).to_be_bytes());
    mp4_box(b"tkhd", &body)
}

fn hdlr(handler: &[u8; 4]) -> Vec<u8> {
    let mut body = full_box(&[0u8; 4]);
    body.extend_from_slice(handler);
    body.extend_from_slice(&[0u8; 13]);
    mp4_box(b"hdlr", &body)
}

fn stsz(sizes: &[u32]) -> Vec<u8> {
    let mut body = full_box(&[0, 0, 0, 0]);
    body.extend_from_slice(&(sizes.len() as u32).to_be_bytes());
    for size in sizes {
        body.extend_from_slice(&size.to_be_bytes());
    }
    mp4_box(b"stsz", &body)
}

/// Baseline 320x240 SPS without VUI.
pub const SPS: [u8; 8] = [0x67, 0x42, 0xC0, 0x1E, 0xDA, 0x05, 0x07, 0xE4];

/// avcC with four-byte NAL lengths, one SPS and one PPS.
pub fn avcc_record() -> Vec<u8> {
    let mut data = vec![1, 0x42, 0xC0, 0x1E, 0xFF, 0xE1];
    data.extend_from_slice(&(SPS.len() as u16).to_be_bytes());
    data.extend_from_slice(&SPS);
    data.push(1);
    data.extend_from_slice(&[0, 4, 0x68, 0xCE, 0x3C, 0x80]);
    data
}

/// A four-byte length prefixed NAL unit.
pub fn nal(unit: &[u8]) -> Vec<u8> {
    let mut out = (unit.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(unit);
    out
}

/// Video timescale and sample delta: 25 fps.
pub const VIDEO_TIMESCALE: u32 = 12_800;
pub const VIDEO_DELTA: u32 = 512;
/// Every video sample is presented this many ticks after it is decoded.
pub const VIDEO_CTS: u32 = 1024;

fn video_trak(samples: &[Vec<u8>], sync: &[u32], chunk_offset: u32) -> Vec<u8> {
    let mut avc1 = vec![0u8; 78];
    avc1[6..8].copy_from_slice(&1u16.to_be_bytes());
    avc1[24..26].copy_from_slice(&320u16.to_be_bytes());
    avc1[26..28].copy_from_slice(&240u16.to_be_bytes());
    avc1[74..76].copy_from_slice(&24u16.to_be_bytes());
    avc1.extend(mp4_box(b"avcC", &avcc_record()));
    let mut stsd = full_box(&1u32.to_be_bytes());
    stsd.extend(mp4_box(b"avc1", &avc1));

    let count = samples.len() as u32;
    let sizes: Vec<u32> = samples.iter().map(|s| s.len() as u32).collect();
    let sync: Vec<&[u32]> = sync.iter().map(std::slice::from_ref).collect();

    let mut stbl = mp4_box(b"stsd", &stsd);
    stbl.extend(mp4_box(b"stts", &table(&[&[count, VIDEO_DELTA]])));
    stbl.extend(mp4_box(b"ctts", &table(&[&[count, VIDEO_CTS]])));
    stbl.extend(mp4_box(b"stss", &table(&sync)));
    stbl.extend(mp4_box(b"stsc", &table(&[&[1, count, 1]])));
    stbl.extend(stsz(&sizes));
    stbl.extend(mp4_box(b"stco", &table(&[&[chunk_offset]])));

    let mut mdia = media_header(b"mdhd", VIDEO_TIMESCALE, VIDEO_DELTA * count);
    mdia.extend(hdlr(b"vide"));
    mdia.extend(mp4_box(b"minf", &mp4_box(b"stbl", &stbl)));

    let mut trak = tkhd(1, 320, 240);
    trak.extend(mp4_box(b"mdia", &mdia));
    mp4_box(b"trak", &trak)
}

/// AAC-LC 44.1 kHz stereo.
fn audio_trak(samples: &[Vec<u8>], chunk_offset: u32) -> Vec<u8> {
    let asc = [0x12, 0x10];
    let mut dcd = vec![0x40, 0x15, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    dcd.extend_from_slice(&[0x05, 2]);
    dcd.extend_from_slice(&asc);
    let mut esd = vec![0x00, 0x02, 0x00, 0x04, dcd.len() as u8];
    esd.extend_from_slice(&dcd);
    let mut esds = vec![0, 0, 0, 0, 0x03, esd.len() as u8];
    esds.extend_from_slice(&esd);

    let mut mp4a = vec![0u8; 28];
    mp4a[6..8].copy_from_slice(&1u16.to_be_bytes());
    mp4a[16..18].copy_from_slice(&2u16.to_be_bytes());
    mp4a[18..20].copy_from_slice(&16u16.to_be_bytes());
    mp4a[24..28].copy_from_slice(&(44_100u32 << 16).to_be_bytes());
    mp4a.extend(mp4_box(b"esds", &esds));
    let mut stsd = full_box(&1u32.to_be_bytes());
    stsd.extend(mp4_box(b"mp4a", &mp4a));

    let count = samples.len() as u32;
    let sizes: Vec<u32> = samples.iter().map(|s| s.len() as u32).collect();

    let mut stbl = mp4_box(b"stsd", &stsd);
    stbl.extend(mp4_box(b"stts", &table(&[&[count, 1024]])));
    stbl.extend(mp4_box(b"stsc", &table(&[&[1, count, 1]])));
    stbl.extend(stsz(&sizes));
    stbl.extend(mp4_box(b"stco", &table(&[&[chunk_offset]])));

    let mut mdia = media_header(b"mdhd", 44_100, 1024 * count);
    mdia.extend(hdlr(b"soun"));
    mdia.extend(mp4_box(b"minf", &mp4_box(b"stbl", &stbl)));

    let mut trak = tkhd(2, 0, 0);
    trak.extend(mp4_box(b"mdia", &mdia));
    mp4_box(b"trak", &trak)
}

fn moov(video: &[Vec<u8>], sync: &[u32], audio: &[Vec<u8>], video_offset: u32, audio_offset: u32) -> Vec<u8> {
    let mut body = media_header(b"mvhd", 1000, 200);
    if !video.is_empty() {
        body.extend(video_trak(video, sync, video_offset));
    }
    if !audio.is_empty() {
        body.extend(audio_trak(audio, audio_offset));
    }
    mp4_box(b"moov", &body)
}

/// `ftyp`, `moov`, then an `mdat` holding the video chunk followed by the
/// audio chunk. `sync` lists the 1-based video keyframes.
pub fn mp4_file(video: &[Vec<u8>], sync: &[u32], audio: &[Vec<u8>]) -> Vec<u8> {
    let ftyp = mp4_box(b"ftyp", b"isom\0\0\x02\0isomavc1mp41");
    let moov_len = moov(video, sync, audio, 0, 0).len();
    let video_offset = (ftyp.len() + moov_len + 8) as u32;
    let audio_offset = video_offset + video.iter().map(|s| s.len() as u32).sum::<u32>();

    let mut file = ftyp;
    file.extend(moov(video, sync, audio, video_offset, audio_offset));
    let payload: Vec<u8> = video.iter().chain(audio).flatten().copied().collect();
    file.extend(mp4_box(b"mdat", &payload));
    file
}

/// Three AVC frames, an IDR first, plus two AAC frames.
pub fn small_mp4() -> Vec<u8> {
    let video = vec![
        nal(&[0x65, 0x88, 0x84, 0x00]),
        nal(&[0x41, 0x9A, 0x02]),
        nal(&[0x41, 0x9A, 0x04]),
    ];
    let audio = vec![vec![0x21, 0x10, 0x05], vec![0x21, 0x10, 0x06, 0x07]];
    mp4_file(&video, &[1], &audio)
}
