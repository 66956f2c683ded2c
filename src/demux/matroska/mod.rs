//! Matroska and WebM demuxing.
//!
//! The demuxer walks the stream top-level element by element:
//!
//! 1. the EBML header, whose DocType must match the [`Profile`]
//! 2. the Segment header, which fixes the origin for SeekHead and Cues positions
//! 3. SeekHead, Info, Tracks and Cues, up to the first Cluster
//! 4. Clusters, each parsed once fully buffered
//!
//! When the SeekHead lists Cues that were not seen before the first Cluster,
//! the loader is sent to the Cues with [`ChunkResult::SeekTo`] and then back
//! to the Cluster.

pub mod sections;
mod timing;
mod tracks;

use self::sections::{parse_cues, parse_tracks, CuePoint, SeekHead, SegmentInfo, TrackEntry};
use self::timing::{assign_decode_timestamps, frame_duration, DtsSeed, TimedBlock};
use self::tracks::{build_audio_track, build_video_track, select_tracks, AudioTrack, TrackContext, VideoTrack};
use super::error::{DemuxError, Result};
use super::output::{avc_sample, TrackOutput};
use super::{DemuxOptions, DemuxSink};
use bytes::Bytes;
use streamdemux_common::{ChunkResult, KeyframesIndex, MediaInfo, Sample, TrackKind, TrackMetadata};
use streamdemux_ebml::{decode_element, ids, read_header, Block, Element, ElementRead};
use tracing::{debug, info, warn};

/// Which Matroska dialect a demuxer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// AVC video with AAC or FLAC audio.
    Matroska,
    /// VP8, VP9 or AV1 video with Opus or Vorbis audio.
    WebM,
}

impl Profile {
    pub fn doc_type(&self) -> &'static str {
        match self {
            Self::Matroska => "matroska",
            Self::WebM => "webm",
        }
    }

    /// MIME type reported in the media info. Matroska streams are delivered
    /// as AVC/AAC elementary streams for MP4 consumers.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Matroska => "video/mp4",
            Self::WebM => "video/webm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingEbmlHeader,
    AwaitingSegment,
    AwaitingHeaderElements,
    /// Waiting for a delivery starting at the Cues.
    SeekingCues {
        cues_position: u64,
    },
    StreamingClusters,
    Failed,
}

/// A video block waiting for its cluster's decode timestamps.
struct PendingVideo {
    block: Block,
    keyframe: bool,
    /// Absolute offset of the block body.
    position: u64,
}

#[derive(Debug)]
pub struct MatroskaDemuxer {
    profile: Profile,
    options: DemuxOptions,
    state: State,
    output: TrackOutput,

    ebml_header: Option<Bytes>,
    /// Absolute offset of the Segment payload.
    segment_data_start: u64,
    seek_head: Option<SeekHead>,
    info: Option<SegmentInfo>,
    tracks: Option<Vec<TrackEntry>>,
    cues: Option<Vec<CuePoint>>,
    resume_position: Option<u64>,

    video: Option<VideoTrack>,
    audio: Option<AudioTrack>,
    /// Track ticks per second.
    timescale: f64,
    media_info_processed: bool,
    last_cluster_end: Option<u64>,
    last_video_dts: Option<i64>,
}

impl MatroskaDemuxer {
    pub fn new(profile: Profile, options: DemuxOptions) -> Self {
        Self {
            profile,
            options,
            state: State::AwaitingEbmlHeader,
            output: TrackOutput::new(),
            ebml_header: None,
            segment_data_start: 0,
            seek_head: None,
            info: None,
            tracks: None,
            cues: None,
            resume_position: None,
            video: None,
            audio: None,
            timescale: 1000.0,
            media_info_processed: false,
            last_cluster_end: None,
            last_video_dts: None,
        }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn media_info(&self) -> &MediaInfo {
        &self.output.media_info
    }

    /// The encoded EBML header, once read.
    pub fn ebml_header(&self) -> Option<&Bytes> {
        self.ebml_header.as_ref()
    }

    pub fn segment_info(&self) -> Option<&SegmentInfo> {
        self.info.as_ref()
    }

    /// The entry of the track selected for `kind`, once media info is known.
    pub fn selected_track(&self, kind: TrackKind) -> Option<&TrackEntry> {
        let number = match kind {
            TrackKind::Video => self.video.as_ref()?.number,
            TrackKind::Audio => self.audio.as_ref()?.number,
        };
        self.tracks.as_ref()?.iter().find(|t| t.number == number)
    }

    pub fn set_timestamp_base(&mut self, ms: i64) {
        self.options.timestamp_base_ms = ms;
    }

    pub fn set_duration_override(&mut self, ms: Option<f64>) {
        self.options.duration_override_ms = ms;
        if ms.is_some() && self.media_info_processed {
            self.output.media_info.duration = ms;
        }
    }

    /// Return to the initial state, keeping profile and options.
    pub fn reset_media_info(&mut self) {
        *self = Self::new(self.profile, self.options.clone());
    }

    /// Offer bytes starting at absolute offset `byte_start`.
    pub fn push(&mut self, chunk: &[u8], byte_start: u64, sink: &mut dyn DemuxSink) -> Result<ChunkResult> {
        if self.state == State::Failed {
            return Err(DemuxError::invalid_state("Matroska demuxer has failed"));
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
            match self.state {
                State::AwaitingEbmlHeader => {
                    if byte_start != 0 {
                        return Err(DemuxError::invalid_state(format!(
                            "EBML header expected at offset 0, delivery starts at {}",
                            byte_start
                        )));
                    }
                    let ElementRead::Complete(header) = decode_element(chunk, 0, None, false)? else {
                        return Ok(ChunkResult::NeedMoreData);
                    };
                    self.read_ebml_header(&header)?;
                    offset = header.total_len as usize;
                    self.state = State::AwaitingSegment;
                }

                State::AwaitingSegment => {
                    let Some(header) = read_header(chunk, offset)? else {
                        break;
                    };
                    if header.id == ids::SEGMENT {
                        offset += header.header_len;
                        self.segment_data_start = byte_start + offset as u64;
                        debug!("Segment payload starts at {}", self.segment_data_start);
                        self.state = State::AwaitingHeaderElements;
                        continue;
                    }
                    match header.total_len() {
                        Some(total) if offset as u64 + total <= chunk.len() as u64 => {
                            debug!("Skipping {} before Segment", header.name());
                            offset += total as usize;
                        }
                        Some(_) => break,
                        None => {
                            return Err(DemuxError::structural(format!(
                                "{} of unknown size before Segment",
                                header.name()
                            )))
                        }
                    }
                }

                State::AwaitingHeaderElements => {
                    let Some(header) = read_header(chunk, offset)? else {
                        break;
                    };
                    if header.id == ids::CLUSTER {
                        let cluster_position = byte_start + offset as u64;
                        if let Some(seek) = self.finish_header_elements(cluster_position, sink)? {
                            return Ok(seek);
                        }
                        continue;
                    }
                    let ElementRead::Complete(el) = decode_element(chunk, offset, None, false)? else {
                        break;
                    };
                    self.read_header_element(&el)?;
                    offset += el.total_len as usize;
                }

                State::SeekingCues { cues_position } => {
                    let position = byte_start + offset as u64;
                    if position != cues_position {
                        return Err(DemuxError::invalid_state(format!(
                            "expected delivery at Cues position {}, got {}",
                            cues_position, position
                        )));
                    }
                    let ElementRead::Complete(el) = decode_element(chunk, offset, None, false)? else {
                        break;
                    };
                    if el.id != ids::CUES {
                        return Err(DemuxError::structural(format!(
                            "SeekHead places Cues at {} but {} was found there",
                            cues_position, el.name
                        )));
                    }
                    self.cues = Some(parse_cues(&el));
                    let resume = self
                        .resume_position
                        .take()
                        .ok_or_else(|| DemuxError::invalid_state("no position to resume from after Cues"))?;
                    self.process_media_info(sink)?;
                    self.state = State::StreamingClusters;
                    debug!("Cues read, resuming at {}", resume);
                    return Ok(ChunkResult::SeekTo(resume));
                }

                State::StreamingClusters => {
                    let ElementRead::Complete(el) = decode_element(chunk, offset, None, false)? else {
                        break;
                    };
                    let position = byte_start + offset as u64;
                    if el.id == ids::CLUSTER {
                        self.parse_cluster(&el, byte_start)?;
                        self.last_cluster_end = Some(position + el.total_len);
                    } else {
                        debug!("Skipping {} at {}", el.name, position);
                    }
                    offset += el.total_len as usize;
                }

                State::Failed => return Err(DemuxError::invalid_state("Matroska demuxer has failed")),
            }
        }

        self.output.flush(sink);
        Ok(ChunkResult::from_consumed(offset))
    }

    fn read_ebml_header(&mut self, header: &Element) -> Result<()> {
        if header.id != ids::EBML {
            return Err(DemuxError::format_mismatch(format!(
                "stream starts with {} instead of an EBML header",
                header.name
            )));
        }
        let doc_type = header.child_str_or_default(ids::DOC_TYPE).unwrap_or_default();
        if doc_type != self.profile.doc_type() {
            return Err(DemuxError::format_mismatch(format!(
                "DocType {} is not {}",
                doc_type,
                self.profile.doc_type()
            )));
        }
        self.ebml_header = Some(header.raw().clone());
        Ok(())
    }

    fn read_header_element(&mut self, el: &Element) -> Result<()> {
        if el.id == ids::SEEK_HEAD {
            // Later SeekHeads index the rest of the file; the first one is authoritative
            if self.seek_head.is_none() {
                self.seek_head = Some(SeekHead::parse(el));
            }
        } else if el.id == ids::INFO {
            self.info = Some(SegmentInfo::parse(el)?);
        } else if el.id == ids::TRACKS {
            self.tracks = Some(parse_tracks(el)?);
        } else if el.id == ids::CUES {
            self.cues = Some(parse_cues(el));
        } else {
            debug!("Skipping {} in Segment header", el.name);
        }
        Ok(())
    }

    /// The first Cluster is reached. Redirect to the Cues if the SeekHead
    /// knows where they are, otherwise start streaming.
    fn finish_header_elements(&mut self, cluster_position: u64, sink: &mut dyn DemuxSink) -> Result<Option<ChunkResult>> {
        if self.cues.is_none() {
            if let Some(relative) = self.seek_head.as_ref().and_then(|s| s.position(ids::CUES)) {
                let cues_position = self.segment_data_start + relative;
                debug!("Cues not read yet, seeking to {}", cues_position);
                self.resume_position = Some(cluster_position);
                self.state = State::SeekingCues { cues_position };
                return Ok(Some(ChunkResult::SeekTo(cues_position)));
            }
        }
        self.process_media_info(sink)?;
        self.state = State::StreamingClusters;
        Ok(None)
    }

    /// Select tracks, build their metadata and announce everything once.
    fn process_media_info(&mut self, sink: &mut dyn DemuxSink) -> Result<()> {
        if self.media_info_processed {
            return Ok(());
        }
        let info = self
            .info
            .as_ref()
            .ok_or_else(|| DemuxError::structural("Cluster reached before Info"))?;
        let tracks = self
            .tracks
            .as_ref()
            .ok_or_else(|| DemuxError::structural("Cluster reached before Tracks"))?;

        let timescale = 1e9 / info.timecode_scale as f64;
        let container_duration = info.duration_ms();
        let duration_ms = self.options.duration_override_ms.or(container_duration);
        let ctx = TrackContext {
            profile: self.profile,
            timescale,
            duration_ms,
            options: &self.options,
        };

        let mut media_info = MediaInfo {
            has_audio: Some(false),
            has_video: Some(false),
            duration: duration_ms,
            accurate_duration: container_duration,
            ..MediaInfo::default()
        };

        let (video_entry, audio_entry) = select_tracks(tracks);
        let video = video_entry
            .map(|entry| build_video_track(entry, &ctx, &mut media_info))
            .transpose()?;
        let audio = match audio_entry {
            Some(entry) => build_audio_track(entry, &ctx, &mut media_info)?,
            None => None,
        };
        if video.is_none() && audio.is_none() {
            return Err(DemuxError::structural("no playable video or audio track"));
        }

        if let (Some(video), Some(cues)) = (&video, &self.cues) {
            let index = self.keyframes_index(cues, video.number, timescale);
            media_info.has_keyframes_index = !index.is_empty();
            media_info.keyframes_index = Some(index);
        }

        let mut codecs = Vec::new();
        let mut metadata = Vec::new();
        if let Some(video) = &video {
            codecs.push(video.meta.codec.clone());
            metadata.push(TrackMetadata::Video(video.meta.clone()));
        }
        if let Some(audio) = &audio {
            codecs.push(audio.meta.codec.clone());
            metadata.push(TrackMetadata::Audio(audio.meta.clone()));
        }
        media_info.set_mime_type(self.profile.mime_type(), &codecs);

        info!(
            "Parsed {} media info: video {:?}, audio {:?}, duration {:?} ms",
            self.profile.doc_type(),
            media_info.video_codec,
            media_info.audio_codec,
            media_info.duration
        );

        self.timescale = timescale;
        self.video = video;
        self.audio = audio;
        self.media_info_processed = true;
        self.output.media_info = media_info;
        self.output.dispatch_metadata(&metadata, sink);
        Ok(())
    }

    /// Keyframe times (ms) and absolute Cluster positions from the Cues.
    fn keyframes_index(&self, cues: &[CuePoint], video_track: u64, timescale: f64) -> KeyframesIndex {
        let base = self.options.timestamp_base_ms as f64;
        let mut index = KeyframesIndex::default();
        for cue in cues {
            let position = cue
                .positions
                .iter()
                .find(|p| p.track == video_track)
                .or(cue.positions.first());
            if let Some(position) = position {
                let time = (base + cue.time as f64 * 1e3 / timescale).round();
                index.push(time, self.segment_data_start + position.cluster_position);
            }
        }
        index
    }

    /// Queue the samples of one complete Cluster. `byte_start` is the
    /// absolute offset of the buffer the element was decoded from.
    fn parse_cluster(&mut self, cluster: &Element, byte_start: u64) -> Result<()> {
        let cluster_start = byte_start + cluster.offset as u64;
        let timecode = cluster.child_uint(ids::TIMECODE).unwrap_or(0) as i64;
        let time_base = (self.options.timestamp_base_ms as f64 / 1e3 * self.timescale).round() as i64;
        let video_number = self.video.as_ref().map(|v| v.number);
        let audio_number = self.audio.as_ref().map(|a| a.number);

        let mut timed = Vec::new();
        let mut pending = Vec::new();

        for child in cluster.children() {
            let (block_el, group_keyframe) = if child.id == ids::SIMPLE_BLOCK {
                (child, None)
            } else if child.id == ids::BLOCK_GROUP {
                let Some(block) = child.child(ids::BLOCK) else {
                    warn!("BlockGroup at {} has no Block", byte_start + child.offset as u64);
                    continue;
                };
                (block, Some(child.child(ids::REFERENCE_BLOCK).is_none()))
            } else {
                continue;
            };

            let block = Block::parse(block_el.payload())?;
            let track = Some(block.track_number);
            if track != video_number && track != audio_number {
                continue;
            }

            let ts = timecode + block.timecode as i64;
            let position = byte_start + (block_el.offset + block_el.header_len) as u64;
            if self.options.record_bitrate {
                self.output
                    .media_info
                    .record_bitrate((time_base + ts) as f64 / self.timescale, block.frames_data_len());
            }

            let keyframe = group_keyframe.unwrap_or_else(|| block.is_keyframe());
            if track == video_number {
                timed.push(TimedBlock::new(pending.len(), time_base + ts));
                pending.push(PendingVideo {
                    block,
                    keyframe,
                    position,
                });
            } else {
                self.queue_audio(&block, time_base + ts, position);
            }
        }

        self.queue_video(timed, pending, cluster_start);
        Ok(())
    }

    fn queue_audio(&mut self, block: &Block, pts: i64, position: u64) {
        let Some(audio) = &self.audio else {
            return;
        };
        let duration = audio.default_duration;
        let passthrough = block.frame_count() == 1;

        for (i, (frame, range)) in block.frame_data().zip(&block.frames).enumerate() {
            let mut sample = Sample::new(frame, pts + i as i64 * duration, duration, true);
            sample.file_position = Some(position + range.start as u64);
            if passthrough {
                sample.block = Some(block.body().clone());
            }
            self.output.audio.push(sample);
        }
    }

    fn queue_video(&mut self, mut timed: Vec<TimedBlock>, pending: Vec<PendingVideo>, cluster_start: u64) {
        let Some(video) = &self.video else {
            return;
        };
        if pending.is_empty() {
            return;
        }
        let default_duration = video.default_duration;
        let nal_length_size = video.nal_length_size;

        let seed = match (self.last_cluster_end, self.last_video_dts) {
            (Some(end), Some(last_dts)) if end == cluster_start => DtsSeed::Continue { last_dts },
            _ => DtsSeed::Reseed,
        };
        assign_decode_timestamps(&mut timed, default_duration, seed);

        for (timing, pending) in timed.iter().zip(pending) {
            let PendingVideo {
                block,
                keyframe,
                position,
            } = pending;
            let duration = frame_duration(timing.duration, block.frame_count(), default_duration);
            let passthrough = block.frame_count() == 1;

            for (i, (frame, range)) in block.frame_data().zip(&block.frames).enumerate() {
                let dts = timing.dts + duration * i as i64;
                let pts = timing.pts + duration * i as i64;
                let sample = match nal_length_size {
                    Some(len) => avc_sample(frame, len, dts, duration, keyframe),
                    None => Some(Sample::new(frame, dts, duration, keyframe)),
                };
                self.last_video_dts = Some(dts);

                let Some(mut sample) = sample else {
                    continue;
                };
                sample.pts = pts;
                sample.cts = pts - dts;
                sample.file_position = Some(position + range.start as u64);
                if passthrough {
                    sample.block = Some(block.body().clone());
                }
                self.output.video.push(sample);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demux::{CollectingSink, ErrorKind};
    use streamdemux_ebml::{encode, encode_simple_block, wrap, Child, EbmlValue, EncodedLength};

    fn ebml_header(doc_type: &str) -> Vec<u8> {
        encode(
            "EBML",
            &EbmlValue::Children(vec![Child::new("DocType", EbmlValue::String(doc_type.into()))]),
            EncodedLength::Auto,
        )
        .unwrap()
    }

    fn webm_headers() -> Vec<u8> {
        let info = encode(
            "Info",
            &EbmlValue::Children(vec![
                Child::new("TimecodeScale", EbmlValue::Uint(1_000_000)),
                Child::new("Duration", EbmlValue::Float(100.0)),
            ]),
            EncodedLength::Auto,
        )
        .unwrap();
        let tracks = encode(
            "Tracks",
            &EbmlValue::Children(vec![Child::new(
                "TrackEntry",
                EbmlValue::Children(vec![
                    Child::new("TrackNumber", EbmlValue::Uint(1)),
                    Child::new("TrackType", EbmlValue::Uint(1)),
                    Child::new("CodecID", EbmlValue::String("V_VP8".into())),
                    Child::new("DefaultDuration", EbmlValue::Uint(40_000_000)),
                    Child::new(
                        "Video",
                        EbmlValue::Children(vec![
                            Child::new("PixelWidth", EbmlValue::Uint(160)),
                            Child::new("PixelHeight", EbmlValue::Uint(120)),
                        ]),
                    ),
                ]),
            )]),
            EncodedLength::Auto,
        )
        .unwrap();
        [info, tracks].concat()
    }

    fn cluster(timecode: u64, blocks: &[(i16, bool)]) -> Vec<u8> {
        let mut payload = encode("Timecode", &EbmlValue::Uint(timecode), EncodedLength::Auto).unwrap();
        for (tc, key) in blocks {
            payload.extend(encode_simple_block(1, *tc, *key, &[0x9D, 0x01, 0x2A]).unwrap());
        }
        wrap(ids::CLUSTER, &payload, EncodedLength::Auto).unwrap()
    }

    fn webm_file(clusters: &[Vec<u8>]) -> Vec<u8> {
        let mut segment = webm_headers();
        for c in clusters {
            segment.extend_from_slice(c);
        }
        let mut file = ebml_header("webm");
        file.extend(wrap(ids::SEGMENT, &segment, EncodedLength::Unknown).unwrap());
        file
    }

    #[test]
    fn test_whole_file_in_one_push() {
        let file = webm_file(&[cluster(0, &[(0, true), (40, false)]), cluster(80, &[(0, false)])]);
        let mut demuxer = MatroskaDemuxer::new(Profile::WebM, DemuxOptions::default());
        let mut sink = CollectingSink::default();

        let result = demuxer.push(&file, 0, &mut sink).unwrap();
        assert_eq!(result, ChunkResult::Consumed(file.len()));

        assert_eq!(sink.tracks.len(), 1);
        let info = sink.media_info.as_ref().unwrap();
        assert_eq!(info.mime_type.as_deref(), Some("video/webm; codecs=\"vp8\""));
        assert_eq!(info.duration, Some(100.0));

        let dts: Vec<_> = sink.video.iter().map(|s| s.dts).collect();
        assert_eq!(dts, vec![0, 40, 80]);
        assert!(sink.video[0].is_keyframe);
        assert!(sink.video.iter().all(|s| s.block.is_some()));
    }

    #[test]
    fn test_rejects_wrong_doc_type() {
        let mut file = ebml_header("matroska");
        file.extend_from_slice(&[0x18, 0x53, 0x80, 0x67]);
        let mut demuxer = MatroskaDemuxer::new(Profile::WebM, DemuxOptions::default());
        let mut sink = CollectingSink::default();

        let err = demuxer.push(&file, 0, &mut sink).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatMismatch);

        let err = demuxer.push(&file, 0, &mut sink).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_cluster_before_tracks_is_structural() {
        let mut file = ebml_header("webm");
        file.extend(wrap(ids::SEGMENT, &cluster(0, &[(0, true)]), EncodedLength::Unknown).unwrap());
        let mut demuxer = MatroskaDemuxer::new(Profile::WebM, DemuxOptions::default());

        let err = demuxer.push(&file, 0, &mut CollectingSink::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralViolation);
    }

    #[test]
    fn test_partial_cluster_waits() {
        let file = webm_file(&[cluster(0, &[(0, true)])]);
        let mut demuxer = MatroskaDemuxer::new(Profile::WebM, DemuxOptions::default());
        let mut sink = CollectingSink::default();

        let result = demuxer.push(&file[..file.len() - 2], 0, &mut sink).unwrap();
        let consumed = result.consumed();
        assert!(consumed > 0);
        assert!(sink.video.is_empty());

        let result = demuxer.push(&file[consumed..], consumed as u64, &mut sink).unwrap();
        assert_eq!(result, ChunkResult::Consumed(file.len() - consumed));
        assert_eq!(sink.video.len(), 1);
    }

    #[test]
    fn test_timestamp_base_shifts_samples() {
        let file = webm_file(&[cluster(0, &[(0, true)])]);
        let mut demuxer = MatroskaDemuxer::new(Profile::WebM, DemuxOptions::default());
        demuxer.set_timestamp_base(5000);
        let mut sink = CollectingSink::default();
        demuxer.push(&file, 0, &mut sink).unwrap();
        assert_eq!(sink.video[0].dts, 5000);
        assert_eq!(sink.video[0].pts, 5000);
    }

    #[test]
    fn test_reset_media_info() {
        let file = webm_file(&[cluster(0, &[(0, true)])]);
        let mut demuxer = MatroskaDemuxer::new(Profile::WebM, DemuxOptions::default());
        let mut sink = CollectingSink::default();
        demuxer.push(&file, 0, &mut sink).unwrap();
        assert!(demuxer.ebml_header().is_some());

        demuxer.reset_media_info();
        assert!(demuxer.ebml_header().is_none());
        assert!(demuxer.media_info().mime_type.is_none());
        demuxer.push(&file, 0, &mut sink).unwrap();
        assert_eq!(sink.tracks.len(), 2);
    }
}
