//! Progressive MP4 demuxing.
//!
//! `moov` must precede `mdat`. Its sample tables are flattened into a
//! [`ChunkMap`] up front, so inside `mdat` every absolute position resolves
//! to the sample starting there, or to the gap before the next one.

use super::error::{DemuxError, Result};
use super::output::{avc_sample, TrackOutput};
use super::{DemuxOptions, DemuxSink};
use bytes::Bytes;
use streamdemux_codec::{parse_audio_specific_config, parse_avcc, AAC_FRAME_SAMPLES};
use streamdemux_common::{
    AudioMetadata, ChunkResult, FrameRate, KeyframesIndex, MediaInfo, Sample, TrackKind, TrackMetadata, VideoMetadata,
};
use streamdemux_isobmff::{
    parse_boxes, probe, read_box_header, BoxFields, BoxNode, Chunk, ChunkMap, ChunkSample, FourCC, SampleAt,
    SampleTables,
};
use tracing::{debug, info, warn};

const MP4_MIME: &str = "video/mp4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ProbingHeader,
    ParsingMoov,
    /// Between top-level boxes.
    StreamingBoxes,
    /// Inside `mdat`, which ends at the absolute offset `end`.
    StreamingMdat { end: u64 },
    /// Inside a box that is not needed, ending at `end`.
    Skipping { end: u64 },
    Failed,
}

/// Per-track values needed while streaming.
#[derive(Debug, Clone, Copy)]
struct TrackTiming {
    timescale: u32,
    /// Timestamp base in track ticks.
    base: i64,
}

#[derive(Debug)]
pub struct Mp4Demuxer {
    options: DemuxOptions,
    state: State,
    output: TrackOutput,
    chunk_map: ChunkMap,
    video: Option<TrackTiming>,
    audio: Option<TrackTiming>,
    nal_length_size: u8,
}

impl Mp4Demuxer {
    pub fn new(options: DemuxOptions) -> Self {
        Self {
            options,
            state: State::ProbingHeader,
            output: TrackOutput::new(),
            chunk_map: ChunkMap::default(),
            video: None,
            audio: None,
            nal_length_size: 4,
        }
    }

    pub fn media_info(&self) -> &MediaInfo {
        &self.output.media_info
    }

    pub fn set_timestamp_base(&mut self, ms: i64) {
        self.options.timestamp_base_ms = ms;
        let base_ms = ms as f64;
        for timing in [self.video.as_mut(), self.audio.as_mut()].into_iter().flatten() {
            timing.base = ticks(base_ms, timing.timescale);
        }
    }

    pub fn set_duration_override(&mut self, ms: Option<f64>) {
        self.options.duration_override_ms = ms;
        if ms.is_some() && self.output.metadata_dispatched() {
            self.output.media_info.duration = ms;
        }
    }

    pub fn reset_media_info(&mut self) {
        *self = Self::new(self.options.clone());
    }

    /// Offer bytes starting at absolute offset `byte_start`.
    pub fn push(&mut self, chunk: &[u8], byte_start: u64, sink: &mut dyn DemuxSink) -> Result<ChunkResult> {
        if self.state == State::Failed {
            return Err(DemuxError::invalid_state("MP4 demuxer has failed"));
        }
        let result = self.parse(chunk, byte_start, sink);
        if result.is_err() {
            self.state = State::Failed;
        }
        result
    }

    fn parse(&mut self, chunk: &[u8], byte_start: u64, sink: &mut dyn DemuxSink) -> Result<ChunkResult> {
        let mut offset = 0usize;

        loop {
            let position = byte_start + offset as u64;
            let available = byte_start + chunk.len() as u64;

            match self.state {
                State::ProbingHeader => {
                    if byte_start != 0 {
                        return Err(DemuxError::invalid_state(format!(
                            "MP4 header expected at offset 0, delivery starts at {}",
                            byte_start
                        )));
                    }
                    let result = probe(chunk);
                    if !result.enough_data {
                        return Ok(ChunkResult::NeedMoreData);
                    }
                    if !result.matched {
                        return Err(DemuxError::format_mismatch("no ftyp box followed by moov"));
                    }
                    offset = result.data_offset;
                    self.state = State::ParsingMoov;
                }

                State::ParsingMoov => {
                    let Some(header) = read_box_header(chunk, offset)? else {
                        break;
                    };
                    if header.kind != FourCC::MOOV {
                        return Err(DemuxError::structural(format!("expected moov, found {}", header.kind)));
                    }
                    let size = header
                        .size
                        .ok_or_else(|| DemuxError::structural("moov extends to the end of the file"))?;
                    if offset as u64 + size > chunk.len() as u64 {
                        break;
                    }
                    let nodes = parse_boxes(chunk, offset, size as usize)?;
                    let moov = nodes
                        .first()
                        .ok_or_else(|| DemuxError::structural("empty moov"))?;
                    self.parse_moov(moov, sink)?;
                    offset += size as usize;
                    self.state = State::StreamingBoxes;
                }

                State::StreamingBoxes => {
                    let Some(header) = read_box_header(chunk, offset)? else {
                        break;
                    };
                    // A size of zero extends the box to the end of the file
                    let end = header.size.map_or(u64::MAX, |size| position + size);
                    if header.kind == FourCC::MDAT {
                        debug!("mdat at {}, ends at {}", position, end);
                        offset += header.header_len;
                        self.state = State::StreamingMdat { end };
                    } else {
                        debug!("Skipping {} box at {}", header.kind, position);
                        self.state = State::Skipping { end };
                    }
                }

                State::StreamingMdat { end } => {
                    if position >= end {
                        self.state = State::StreamingBoxes;
                        continue;
                    }
                    if position >= available {
                        break;
                    }
                    match self.chunk_map.sample_at(position) {
                        SampleAt::Sample { kind, sample } => {
                            let size = sample.size as usize;
                            if offset + size > chunk.len() {
                                break;
                            }
                            let data = Bytes::copy_from_slice(&chunk[offset..offset + size]);
                            let sample = *sample;
                            self.queue_sample(kind, data, &sample, position);
                            offset += size;
                        }
                        SampleAt::Gap { next } => {
                            let target = next.unwrap_or(end).min(end);
                            let skip_to = target.min(available);
                            offset += (skip_to - position) as usize;
                            if skip_to < target {
                                break;
                            }
                        }
                    }
                }

                State::Skipping { end } => {
                    if position >= end {
                        self.state = State::StreamingBoxes;
                        continue;
                    }
                    if position >= available {
                        break;
                    }
                    offset += (end.min(available) - position) as usize;
                }

                State::Failed => return Err(DemuxError::invalid_state("MP4 demuxer has failed")),
            }
        }

        self.output.flush(sink);
        Ok(ChunkResult::from_consumed(offset))
    }

    fn queue_sample(&mut self, kind: TrackKind, data: Bytes, sample: &ChunkSample, position: u64) {
        let duration = sample.duration as i64;
        match kind {
            TrackKind::Video => {
                let Some(timing) = self.video else {
                    return;
                };
                let dts = timing.base + sample.ts as i64;
                let Some(mut out) = avc_sample(data, self.nal_length_size, dts, duration, sample.is_keyframe) else {
                    return;
                };
                out.cts = sample.cts as i64;
                out.pts = dts + out.cts;
                out.file_position = Some(position);
                self.output.video.push(out);
            }
            TrackKind::Audio => {
                let Some(timing) = self.audio else {
                    return;
                };
                let mut out = Sample::new(data, timing.base + sample.ts as i64, duration, true);
                out.file_position = Some(position);
                self.output.audio.push(out);
            }
        }
    }

    /// Read tracks, build the chunk map and announce the metadata.
    fn parse_moov(&mut self, moov: &BoxNode, sink: &mut dyn DemuxSink) -> Result<()> {
        let Some(BoxFields::Mvhd(mvhd)) = moov.child(FourCC::MVHD).map(|b| &b.fields) else {
            return Err(DemuxError::structural("moov has no mvhd"));
        };
        let container_duration = (mvhd.timescale > 0).then(|| mvhd.duration as f64 / mvhd.timescale as f64 * 1e3);
        let duration_ms = self.options.duration_override_ms.or(container_duration);
        let base_ms = self.options.timestamp_base_ms as f64;

        let (video_trak, audio_trak) = select_traks(moov);
        if video_trak.is_none() && audio_trak.is_none() {
            return Err(DemuxError::structural("moov has no video or audio track"));
        }

        let mut media_info = MediaInfo {
            duration: duration_ms,
            has_audio: Some(false),
            has_video: Some(false),
            ..MediaInfo::default()
        };
        let mut codecs = Vec::new();
        let mut metadata = Vec::new();
        let mut chunks = Vec::new();
        let mut accurate_duration = 0f64;

        if let Some(trak) = video_trak {
            let track = read_video_track(trak, duration_ms, &self.options)?;
            let info = &track.meta;
            media_info.has_video = Some(true);
            media_info.video_codec = Some(info.codec.clone());
            media_info.width = Some(info.present_width);
            media_info.height = Some(info.present_height);
            media_info.fps = Some(info.frame_rate.fps);
            media_info.profile = info.profile.clone();
            media_info.level = info.level.clone();
            media_info.ref_frames = info.ref_frames;
            media_info.chroma_format = track.chroma_format.clone();
            media_info.sar_num = Some(info.sar.width);
            media_info.sar_den = Some(info.sar.height);

            let timescale = info.timescale;
            let track_chunks = track.tables.build_chunks(TrackKind::Video);
            let index = keyframes_index(&track_chunks, timescale, base_ms);
            media_info.has_keyframes_index = !index.is_empty();
            media_info.keyframes_index = Some(index);
            accurate_duration = accurate_duration.max(end_ms(&track.tables, timescale));

            self.nal_length_size = info.nal_length_size.unwrap_or(4);
            self.video = Some(TrackTiming {
                timescale,
                base: ticks(base_ms, timescale),
            });
            codecs.push(info.codec.clone());
            chunks.extend(track_chunks);
            metadata.push(TrackMetadata::Video(track.meta));
        }

        if let Some(trak) = audio_trak {
            if let Some(track) = read_audio_track(trak, duration_ms)? {
                let info = &track.meta;
                media_info.has_audio = Some(true);
                media_info.audio_codec = Some(info.codec.clone());
                media_info.audio_sample_rate = Some(info.sample_rate);
                media_info.audio_channel_count = Some(info.channel_count);

                let timescale = info.timescale;
                accurate_duration = accurate_duration.max(end_ms(&track.tables, timescale));
                self.audio = Some(TrackTiming {
                    timescale,
                    base: ticks(base_ms, timescale),
                });
                codecs.push(info.codec.clone());
                chunks.extend(track.tables.build_chunks(TrackKind::Audio));
                metadata.push(TrackMetadata::Audio(track.meta));
            }
        }

        if self.video.is_none() && self.audio.is_none() {
            return Err(DemuxError::structural("no playable video or audio track"));
        }

        media_info.accurate_duration = Some(accurate_duration);
        media_info.set_mime_type(MP4_MIME, &codecs);
        if self.options.record_bitrate {
            record_bitrates(&mut media_info, &chunks, self.video, self.audio);
        }

        self.chunk_map = ChunkMap::new(chunks);
        info!(
            "Parsed moov: video {:?}, audio {:?}, {} chunks",
            media_info.video_codec,
            media_info.audio_codec,
            self.chunk_map.chunks().len()
        );

        self.output.media_info = media_info;
        self.output.dispatch_metadata(&metadata, sink);
        Ok(())
    }
}

fn ticks(ms: f64, timescale: u32) -> i64 {
    (ms / 1e3 * timescale as f64).round() as i64
}

fn end_ms(tables: &SampleTables, timescale: u32) -> f64 {
    if timescale == 0 {
        return 0.0;
    }
    (tables.total_duration() as f64 / timescale as f64 * 1e3).ceil()
}

fn handler(trak: &BoxNode) -> Option<FourCC> {
    match trak.find(&[FourCC::MDIA, FourCC::HDLR]).map(|b| &b.fields) {
        Some(BoxFields::Hdlr { handler }) => Some(*handler),
        _ => None,
    }
}

/// First video and first audio `trak`.
fn select_traks(moov: &BoxNode) -> (Option<&BoxNode>, Option<&BoxNode>) {
    let mut video = None;
    let mut audio = None;
    for trak in moov.children_of(FourCC::TRAK) {
        let slot = match handler(trak) {
            Some(FourCC::VIDE) => &mut video,
            Some(FourCC::SOUN) => &mut audio,
            other => {
                debug!("Ignoring track with handler {:?}", other);
                continue;
            }
        };
        if slot.is_some() {
            warn!("Ignoring additional {:?} track", handler(trak));
        } else {
            *slot = Some(trak);
        }
    }
    (video, audio)
}

fn track_id(trak: &BoxNode, fallback: u32) -> u32 {
    match trak.child(FourCC::TKHD).map(|b| &b.fields) {
        Some(BoxFields::Tkhd(tkhd)) => tkhd.track_id,
        _ => fallback,
    }
}

fn media_timescale(trak: &BoxNode) -> Result<u32> {
    match trak.find(&[FourCC::MDIA, FourCC::MDHD]).map(|b| &b.fields) {
        Some(BoxFields::Mdhd(mdhd)) if mdhd.timescale > 0 => Ok(mdhd.timescale),
        Some(BoxFields::Mdhd(_)) => Err(DemuxError::structural("mdhd timescale is zero")),
        _ => Err(DemuxError::structural("trak has no mdhd")),
    }
}

fn sample_tables(trak: &BoxNode) -> Result<(&BoxNode, SampleTables)> {
    let stbl = trak
        .find(&[FourCC::MDIA, FourCC::MINF, FourCC::STBL])
        .ok_or_else(|| DemuxError::structural("trak has no stbl"))?;
    Ok((stbl, SampleTables::from_stbl(stbl)?))
}

struct VideoTrack {
    meta: VideoMetadata,
    chroma_format: Option<String>,
    tables: SampleTables,
}

fn read_video_track(trak: &BoxNode, duration_ms: Option<f64>, options: &DemuxOptions) -> Result<VideoTrack> {
    let timescale = media_timescale(trak)?;
    let (stbl, tables) = sample_tables(trak)?;
    let stsd = stbl
        .child(FourCC::STSD)
        .ok_or_else(|| DemuxError::structural("video stbl has no stsd"))?;
    let Some(avc1) = stsd.child(FourCC::AVC1) else {
        let codec = stsd.children.first().map_or("none".to_string(), |e| e.kind.to_string());
        return Err(DemuxError::unsupported_codec(TrackKind::Video, codec));
    };
    let Some(BoxFields::AvcC(record)) = avc1.child(FourCC::AVCC).map(|b| &b.fields) else {
        return Err(DemuxError::structural("avc1 has no avcC"));
    };

    let avcc = parse_avcc(record)?;
    let sps = &avcc.sps_info;
    let first_delta = tables.timestamps().first().map_or(0, |(_, d)| *d);
    let frame_rate = match sps.frame_rate {
        Some(rate) => rate,
        None if first_delta > 0 => FrameRate::from_ratio(timescale, first_delta, true),
        None => FrameRate::from_fps(options.fallback_frame_rate),
    };
    let ref_sample_duration = if frame_rate.fps_num == 0 {
        timescale as f64 / options.fallback_frame_rate
    } else {
        timescale as f64 * frame_rate.fps_den as f64 / frame_rate.fps_num as f64
    };

    let meta = VideoMetadata {
        track_id: track_id(trak, 1),
        timescale,
        duration: duration_ms.map_or(0, |ms| ticks(ms, timescale).max(0) as u64),
        codec: avcc.codec_string(),
        codec_width: sps.codec_width,
        codec_height: sps.codec_height,
        present_width: sps.present_width,
        present_height: sps.present_height,
        profile: Some(sps.profile_string.clone()),
        level: Some(sps.level_string.clone()),
        bit_depth: sps.bit_depth_luma,
        chroma_format: Some(sps.chroma_format_idc),
        ref_frames: Some(sps.ref_frames),
        sar: sps.sar,
        frame_rate,
        ref_sample_duration,
        nal_length_size: Some(avcc.nal_length_size),
        config: record.clone(),
    };
    Ok(VideoTrack {
        meta,
        chroma_format: Some(sps.chroma_format_string.clone()),
        tables,
    })
}

struct AudioTrack {
    meta: AudioMetadata,
    tables: SampleTables,
}

/// `Ok(None)` disables audio: only AAC in `mp4a` is delivered.
fn read_audio_track(trak: &BoxNode, duration_ms: Option<f64>) -> Result<Option<AudioTrack>> {
    let timescale = media_timescale(trak)?;
    let (stbl, tables) = sample_tables(trak)?;
    let Some(mp4a) = stbl.child(FourCC::STSD).and_then(|stsd| stsd.child(FourCC::MP4A)) else {
        warn!("Audio track is not mp4a, disabling audio");
        return Ok(None);
    };
    let asc = match mp4a.child(FourCC::ESDS).map(|b| &b.fields) {
        Some(BoxFields::Esds(es)) => es.decoder_specific_info.clone(),
        _ => None,
    };
    let Some(asc) = asc else {
        warn!("mp4a has no AudioSpecificConfig, disabling audio");
        return Ok(None);
    };
    let config = parse_audio_specific_config(&asc)?;

    let meta = AudioMetadata {
        track_id: track_id(trak, 2),
        timescale,
        duration: duration_ms.map_or(0, |ms| ticks(ms, timescale).max(0) as u64),
        codec: config.codec_string(),
        sample_rate: config.sample_rate,
        channel_count: config.channel_config,
        bit_depth: None,
        object_type: Some(config.object_type),
        ref_sample_duration: AAC_FRAME_SAMPLES as f64 / config.sample_rate.max(1) as f64 * timescale as f64,
        config: asc,
    };
    Ok(Some(AudioTrack { meta, tables }))
}

/// Keyframe times (ms) and absolute sample positions.
fn keyframes_index(chunks: &[Chunk], timescale: u32, base_ms: f64) -> KeyframesIndex {
    let mut index = KeyframesIndex::default();
    for chunk in chunks {
        let mut position = chunk.offset;
        for sample in &chunk.samples {
            if sample.is_keyframe {
                index.push(base_ms + sample.ts as f64 / timescale as f64 * 1e3, position);
            }
            position += sample.size as u64;
        }
    }
    index
}

/// Fill the bitrate map from the sample tables; MP4 declares every sample up front.
fn record_bitrates(info: &mut MediaInfo, chunks: &[Chunk], video: Option<TrackTiming>, audio: Option<TrackTiming>) {
    for chunk in chunks {
        let timing = match chunk.kind {
            TrackKind::Video => video,
            TrackKind::Audio => audio,
        };
        let Some(timing) = timing else {
            continue;
        };
        for sample in &chunk.samples {
            info.record_bitrate(sample.ts as f64 / timing.timescale as f64, sample.size as usize);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demux::{CollectingSink, ErrorKind};

    fn boxed(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(payload);
        out
    }

    fn full(rest: &[u8]) -> Vec<u8> {
        let mut out = vec![0, 0, 0, 0];
        out.extend_from_slice(rest);
        out
    }

    fn table(entries: &[&[u32]]) -> Vec<u8> {
        let mut out = (entries.len() as u32).to_be_bytes().to_vec();
        for entry in entries {
            for v in *entry {
                out.extend_from_slice(&v.to_be_bytes());
            }
        }
        full(&out)
    }

    fn header_box(kind: &[u8; 4], timescale: u32, duration: u32) -> Vec<u8> {
        let mut body = vec![0u8; 8];
        body.extend_from_slice(&timescale.to_be_bytes());
        body.extend_from_slice(&duration.to_be_bytes());
        body.extend_from_slice(&[0u8; 4]);
        boxed(kind, &full(&body))
    }

    /// AAC-LC 44.1 kHz stereo, one chunk per entry of `chunk_offsets`.
    fn audio_moov(sizes: &[u32], samples_per_chunk: u32, chunk_offsets: &[u32]) -> Vec<u8> {
        let asc = [0x12, 0x10];
        let mut dcd = vec![0x40, 0x15, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        dcd.extend_from_slice(&[0x05, 2]);
        dcd.extend_from_slice(&asc);
        let mut esd = vec![0x00, 0x01, 0x00, 0x04, dcd.len() as u8];
        esd.extend_from_slice(&dcd);
        let mut esds = vec![0, 0, 0, 0, 0x03, esd.len() as u8];
        esds.extend_from_slice(&esd);

        let mut mp4a = vec![0u8; 28];
        mp4a[16..18].copy_from_slice(&2u16.to_be_bytes());
        mp4a[24..28].copy_from_slice(&(44_100u32 << 16).to_be_bytes());
        mp4a.extend(boxed(b"esds", &esds));
        let mut stsd = full(&1u32.to_be_bytes());
        stsd.extend(boxed(b"mp4a", &mp4a));

        let mut stsz = full(&[0, 0, 0, 0]);
        stsz.extend_from_slice(&(sizes.len() as u32).to_be_bytes());
        for size in sizes {
            stsz.extend_from_slice(&size.to_be_bytes());
        }
        let offsets: Vec<&[u32]> = chunk_offsets.iter().map(std::slice::from_ref).collect();

        let mut stbl = boxed(b"stsd", &stsd);
        stbl.extend(boxed(b"stts", &table(&[&[sizes.len() as u32, 1024]])));
        stbl.extend(boxed(b"stsc", &table(&[&[1, samples_per_chunk, 1]])));
        stbl.extend(boxed(b"stsz", &stsz));
        stbl.extend(boxed(b"stco", &table(&offsets)));

        let mut hdlr = full(&[0u8; 4]);
        hdlr.extend_from_slice(b"soun");
        hdlr.extend_from_slice(&[0u8; 13]);

        let mut mdia = header_box(b"mdhd", 44_100, 1024 * sizes.len() as u32);
        mdia.extend(boxed(b"hdlr", &hdlr));
        mdia.extend(boxed(b"minf", &boxed(b"stbl", &stbl)));

        let mut moov = header_box(b"mvhd", 1000, 100);
        moov.extend(boxed(b"trak", &boxed(b"mdia", &mdia)));
        boxed(b"moov", &moov)
    }

    /// ftyp, moov, then an mdat holding `payloads` back to back.
    fn audio_file(payloads: &[&[u8]]) -> Vec<u8> {
        let sizes: Vec<u32> = payloads.iter().map(|p| p.len() as u32).collect();
        let ftyp = boxed(b"ftyp", b"isom\0\0\0\0");
        let placeholder = audio_moov(&sizes, sizes.len() as u32, &[0]);
        let data_start = (ftyp.len() + placeholder.len() + 8) as u32;
        let moov = audio_moov(&sizes, sizes.len() as u32, &[data_start]);

        let mut file = ftyp;
        file.extend(moov);
        file.extend(boxed(b"mdat", &payloads.concat()));
        file
    }

    fn demux(file: &[u8], step: usize) -> CollectingSink {
        let mut demuxer = Mp4Demuxer::new(DemuxOptions::default());
        let mut sink = CollectingSink::default();
        let mut start = 0;
        let mut end = 0;
        while start < file.len() {
            end = (end + step).min(file.len());
            match demuxer.push(&file[start..end], start as u64, &mut sink).unwrap() {
                ChunkResult::Consumed(n) => start += n,
                ChunkResult::NeedMoreData if end == file.len() => break,
                ChunkResult::NeedMoreData => {}
                ChunkResult::SeekTo(pos) => panic!("unexpected seek to {}", pos),
            }
        }
        sink
    }

    #[test]
    fn test_audio_only_file() {
        let file = audio_file(&[b"aaaa", b"bbbbbb", b"cc"]);
        let sink = demux(&file, file.len());

        let info = sink.media_info.as_ref().unwrap();
        assert_eq!(info.mime_type.as_deref(), Some("video/mp4; codecs=\"mp4a.40.2\""));
        assert_eq!(info.has_video, Some(false));
        assert_eq!(info.audio_sample_rate, Some(44_100));
        assert_eq!(info.duration, Some(100.0));
        assert_eq!(info.accurate_duration, Some((3.0 * 1024.0 / 44.1f64).ceil()));

        let dts: Vec<_> = sink.audio.iter().map(|s| s.dts).collect();
        assert_eq!(dts, vec![0, 1024, 2048]);
        assert_eq!(sink.audio[1].payload.as_ref(), b"bbbbbb");
        let mdat_payload = (file.len() - 12) as u64;
        assert_eq!(sink.audio[0].file_position, Some(mdat_payload));
    }

    #[test]
    fn test_byte_at_a_time_matches_whole_buffer() {
        let file = audio_file(&[b"one", b"three", b"fifteen"]);
        let whole = demux(&file, file.len());
        let trickled = demux(&file, 1);
        assert_eq!(whole.audio, trickled.audio);
        assert_eq!(trickled.tracks.len(), 1);
    }

    #[test]
    fn test_boxes_after_mdat_are_skipped() {
        let mut file = audio_file(&[b"xy", b"z"]);
        file.extend(boxed(b"free", &[0u8; 32]));
        let sink = demux(&file, 7);
        assert_eq!(sink.audio.len(), 2);
    }

    #[test]
    fn test_mdat_before_moov_is_rejected() {
        let mut file = boxed(b"ftyp", b"isom\0\0\0\0");
        file.extend(boxed(b"mdat", &[0u8; 4]));
        file.extend(boxed(b"moov", &[]));
        let mut demuxer = Mp4Demuxer::new(DemuxOptions::default());
        let err = demuxer.push(&file, 0, &mut CollectingSink::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatMismatch);
    }

    #[test]
    fn test_oversized_uniform_sample_count_is_rejected() {
        let mut file = audio_file(&[b"a"]);
        let at = file.windows(4).position(|w| w == b"stsz").unwrap();
        file[at + 8..at + 12].copy_from_slice(&1u32.to_be_bytes());
        file[at + 12..at + 16].copy_from_slice(&u32::MAX.to_be_bytes());

        let mut demuxer = Mp4Demuxer::new(DemuxOptions::default());
        let err = demuxer.push(&file, 0, &mut CollectingSink::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralViolation);
    }

    #[test]
    fn test_gap_inside_mdat() {
        let ftyp = boxed(b"ftyp", b"isom\0\0\0\0");
        let placeholder = audio_moov(&[2, 2], 1, &[0, 0]);
        let data_start = (ftyp.len() + placeholder.len() + 8) as u32;
        // Four padding bytes between the two chunks
        let moov = audio_moov(&[2, 2], 1, &[data_start, data_start + 6]);
        let mut file = ftyp;
        file.extend(moov);
        file.extend(boxed(b"mdat", b"AA....BB"));

        let sink = demux(&file, 3);
        let payloads: Vec<_> = sink.audio.iter().map(|s| s.payload.clone()).collect();
        assert_eq!(payloads, vec![Bytes::from_static(b"AA"), Bytes::from_static(b"BB")]);
    }
}
