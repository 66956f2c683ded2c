//! WebM init and media segment writer.

use super::{RemuxError, Result};
use crate::demux::Demuxer;
use bytes::Bytes;
use streamdemux_common::{Sample, TrackKind};
use streamdemux_ebml::{
    encode_by_id, encode_simple_block, ids, modify_block_info, wrap, Child, EbmlValue, EncodedLength,
};
use tracing::debug;

const MUXING_APP: &str = concat!("streamdemux ", env!("CARGO_PKG_VERSION"));

/// Serialized init segment.
#[derive(Debug, Clone)]
pub struct InitSegment {
    /// EBML header and the open Segment with `Info` and `Tracks`.
    pub data: Vec<u8>,
    /// Nanoseconds per tick, copied from the source.
    pub timecode_scale: u64,
    /// Duration in ticks.
    pub duration: Option<f64>,
}

/// Re-muxes the samples of one Matroska or WebM source.
#[derive(Debug, Clone)]
pub struct WebmRemuxer {
    ebml_header: Bytes,
    timecode_scale: u64,
    duration: Option<f64>,
    track_entries: Vec<Bytes>,
    video_track: Option<u64>,
    audio_track: Option<u64>,
}

impl WebmRemuxer {
    /// Take headers and track selection from a demuxer that has announced
    /// its tracks.
    pub fn from_demuxer(demuxer: &Demuxer) -> Result<Self> {
        let Demuxer::Matroska(demuxer) = demuxer else {
            return Err(RemuxError::unsupported("MP4 input"));
        };
        let ebml_header = demuxer.ebml_header().cloned().ok_or(RemuxError::Missing("EBML header"))?;
        let info = demuxer.segment_info().ok_or(RemuxError::Missing("segment Info"))?;
        let video = demuxer.selected_track(TrackKind::Video);
        let audio = demuxer.selected_track(TrackKind::Audio);
        if video.is_none() && audio.is_none() {
            return Err(RemuxError::Missing("selected tracks"));
        }

        Ok(Self {
            ebml_header,
            timecode_scale: info.timecode_scale,
            duration: info.duration,
            track_entries: video.iter().chain(audio.iter()).map(|t| t.raw.clone()).collect(),
            video_track: video.map(|t| t.number),
            audio_track: audio.map(|t| t.number),
        })
    }

    /// Build the init segment. Clusters from [`media_segment`](Self::media_segment)
    /// are appended directly after it.
    pub fn init_segment(&self) -> Result<InitSegment> {
        let mut info = vec![
            Child::new("TimecodeScale", EbmlValue::Uint(self.timecode_scale)),
            Child::new("MuxingApp", EbmlValue::String(MUXING_APP.to_string())),
            Child::new("WritingApp", EbmlValue::String(MUXING_APP.to_string())),
        ];
        if let Some(duration) = self.duration {
            info.push(Child::new("Duration", EbmlValue::Float(duration)));
        }
        let mut segment = encode_by_id(ids::INFO, &EbmlValue::Children(info), EncodedLength::Auto)?;
        segment.extend(wrap(ids::TRACKS, &self.track_entries.concat(), EncodedLength::Auto)?);

        let mut data = self.ebml_header.to_vec();
        data.extend(wrap(ids::SEGMENT, &segment, EncodedLength::Unknown)?);
        Ok(InitSegment {
            data,
            timecode_scale: self.timecode_scale,
            duration: self.duration,
        })
    }

    /// Encode samples as Clusters, in decode order. A video keyframe opens a
    /// new Cluster, as does a timestamp too far from the Cluster's timecode.
    pub fn media_segment(&self, audio: &[Sample], video: &[Sample]) -> Result<Vec<u8>> {
        let mut ordered: Vec<(u64, bool, &Sample)> = Vec::with_capacity(audio.len() + video.len());
        if let Some(track) = self.video_track {
            ordered.extend(video.iter().map(|s| (track, true, s)));
        }
        if let Some(track) = self.audio_track {
            ordered.extend(audio.iter().map(|s| (track, false, s)));
        }
        ordered.sort_by_key(|(_, _, s)| s.dts);

        let mut out = Vec::new();
        let mut cluster: Option<ClusterBuilder> = None;
        let mut clusters = 0usize;

        for (track, is_video, sample) in ordered {
            let split = match &cluster {
                None => true,
                Some(c) => !c.fits(sample.pts) || (is_video && sample.is_keyframe && !c.is_empty()),
            };
            if split {
                if let Some(done) = cluster.take() {
                    out.extend(done.finish()?);
                    clusters += 1;
                }
                cluster = Some(ClusterBuilder::new(sample.pts.max(0)));
            }
            if let Some(c) = cluster.as_mut() {
                c.push(track, sample)?;
            }
        }
        if let Some(done) = cluster {
            out.extend(done.finish()?);
            clusters += 1;
        }

        debug!("Wrote {} clusters, {} bytes", clusters, out.len());
        Ok(out)
    }
}

/// One Cluster being filled.
struct ClusterBuilder {
    timecode: i64,
    blocks: Vec<u8>,
    count: usize,
}

impl ClusterBuilder {
    fn new(timecode: i64) -> Self {
        Self {
            timecode,
            blocks: Vec::new(),
            count: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether a block at `pts` can be expressed relative to this Cluster.
    fn fits(&self, pts: i64) -> bool {
        i16::try_from(pts - self.timecode).is_ok()
    }

    fn push(&mut self, track: u64, sample: &Sample) -> Result<()> {
        let relative = i16::try_from(sample.pts - self.timecode)
            .map_err(|_| RemuxError::unsupported(format!("timestamp {} outside cluster", sample.pts)))?;
        let block = match &sample.block {
            Some(body) => {
                let body = modify_block_info(body, Some(track), Some(relative), Some(sample.is_keyframe))?;
                wrap(ids::SIMPLE_BLOCK, &body, EncodedLength::Auto)?
            }
            None => encode_simple_block(track, relative, sample.is_keyframe, &sample.payload)?,
        };
        self.blocks.extend(block);
        self.count += 1;
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        let mut payload = encode_by_id(ids::TIMECODE, &EbmlValue::Uint(self.timecode as u64), EncodedLength::Auto)?;
        payload.extend(self.blocks);
        Ok(wrap(ids::CLUSTER, &payload, EncodedLength::Auto)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demux::{feed_all, CollectingSink, DemuxSession};
    use streamdemux_ebml::encode;

    fn source(frames: &[(i16, bool, &[u8])]) -> Vec<u8> {
        let header = encode(
            "EBML",
            &EbmlValue::Children(vec![Child::new("DocType", EbmlValue::String("webm".into()))]),
            EncodedLength::Auto,
        )
        .unwrap();
        let info = encode(
            "Info",
            &EbmlValue::Children(vec![
                Child::new("TimecodeScale", EbmlValue::Uint(1_000_000)),
                Child::new("Duration", EbmlValue::Float(120.0)),
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
                    Child::new("CodecID", EbmlValue::String("V_VP9".into())),
                    Child::new("DefaultDuration", EbmlValue::Uint(40_000_000)),
                    Child::new(
                        "Video",
                        EbmlValue::Children(vec![
                            Child::new("PixelWidth", EbmlValue::Uint(320)),
                            Child::new("PixelHeight", EbmlValue::Uint(240)),
                        ]),
                    ),
                ]),
            )]),
            EncodedLength::Auto,
        )
        .unwrap();

        let mut cluster = encode("Timecode", &EbmlValue::Uint(0), EncodedLength::Auto).unwrap();
        for (tc, key, data) in frames {
            cluster.extend(encode_simple_block(1, *tc, *key, data).unwrap());
        }
        let mut segment = [info, tracks].concat();
        segment.extend(wrap(ids::CLUSTER, &cluster, EncodedLength::Auto).unwrap());

        let mut file = header;
        file.extend(wrap(ids::SEGMENT, &segment, EncodedLength::Unknown).unwrap());
        file
    }

    fn demux(data: &[u8]) -> DemuxSession<CollectingSink> {
        let mut session = DemuxSession::new(CollectingSink::default());
        feed_all(&mut session, data, 16).unwrap();
        session
    }

    #[test]
    fn test_remux_round_trip() {
        let frames: [(i16, bool, &[u8]); 4] = [(0, true, b"k0"), (40, false, b"p1"), (80, true, b"k2"), (120, false, b"p3")];
        let session = demux(&source(&frames));
        let remuxer = WebmRemuxer::from_demuxer(session.demuxer().unwrap()).unwrap();

        let init = remuxer.init_segment().unwrap();
        assert_eq!(init.timecode_scale, 1_000_000);
        assert_eq!(init.duration, Some(120.0));

        let sink = session.sink();
        let mut output = init.data;
        output.extend(remuxer.media_segment(&sink.audio, &sink.video).unwrap());

        let again = demux(&output);
        let original: Vec<_> = sink.video.iter().map(|s| (s.pts, s.is_keyframe, s.payload.clone())).collect();
        let remuxed: Vec<_> = again.sink().video.iter().map(|s| (s.pts, s.is_keyframe, s.payload.clone())).collect();
        assert_eq!(remuxed, original);
        assert_eq!(again.media_info().unwrap().duration, Some(120.0));
    }

    #[test]
    fn test_keyframes_open_clusters() {
        let frames: [(i16, bool, &[u8]); 3] = [(0, true, b"a"), (40, false, b"b"), (80, true, b"c")];
        let session = demux(&source(&frames));
        let remuxer = WebmRemuxer::from_demuxer(session.demuxer().unwrap()).unwrap();
        let sink = session.sink();
        let clusters = remuxer.media_segment(&sink.audio, &sink.video).unwrap();

        let cluster_id = ids::CLUSTER.to_bytes();
        let count = clusters.windows(cluster_id.len()).filter(|w| *w == cluster_id.as_slice()).count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_requires_matroska_headers() {
        let demuxer = Demuxer::new(crate::demux::Container::WebM, Default::default());
        assert!(matches!(WebmRemuxer::from_demuxer(&demuxer), Err(RemuxError::Missing(_))));

        let mp4 = Demuxer::new(crate::demux::Container::Mp4, Default::default());
        assert!(matches!(WebmRemuxer::from_demuxer(&mp4), Err(RemuxError::Unsupported(_))));
    }
}
