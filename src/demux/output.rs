//! Sample queues and dispatch bookkeeping shared by the demuxers.

use super::DemuxSink;
use bytes::{Bytes, BytesMut};
use streamdemux_codec::split_length_prefixed;
use streamdemux_common::{MediaInfo, Sample, TrackKind, TrackMetadata, TrackQueue};
use tracing::warn;

#[derive(Debug)]
pub(crate) struct TrackOutput {
    pub audio: TrackQueue,
    pub video: TrackQueue,
    pub media_info: MediaInfo,
    metadata_dispatched: bool,
    media_info_dispatched: bool,
}

impl TrackOutput {
    pub fn new() -> Self {
        Self {
            audio: TrackQueue::new(TrackKind::Audio, 0),
            video: TrackQueue::new(TrackKind::Video, 0),
            media_info: MediaInfo::default(),
            metadata_dispatched: false,
            media_info_dispatched: false,
        }
    }

    /// Announce the selected tracks, then the media info when it is complete.
    pub fn dispatch_metadata(&mut self, tracks: &[TrackMetadata], sink: &mut dyn DemuxSink) {
        for track in tracks {
            match track {
                TrackMetadata::Video(v) => self.video.track_id = v.track_id,
                TrackMetadata::Audio(a) => self.audio.track_id = a.track_id,
            }
            sink.on_track_metadata(track);
        }
        self.metadata_dispatched = true;

        if self.media_info.is_complete() && !self.media_info_dispatched {
            self.media_info_dispatched = true;
            sink.on_media_info(&self.media_info);
        }
    }

    pub fn metadata_dispatched(&self) -> bool {
        self.metadata_dispatched
    }

    /// Hand queued samples to the sink once the metadata is out.
    pub fn flush(&mut self, sink: &mut dyn DemuxSink) {
        if self.metadata_dispatched && (!self.audio.is_empty() || !self.video.is_empty()) {
            sink.on_data_available(&mut self.audio, &mut self.video);
        }
    }
}

/// Build an AVC sample, split into its NAL units. An IDR slice marks it as a
/// keyframe. Bytes after a malformed length prefix are dropped; `None` when
/// no unit survives.
pub(crate) fn avc_sample(frame: Bytes, length_size: u8, dts: i64, duration: i64, keyframe: bool) -> Option<Sample> {
    let split = split_length_prefixed(&frame, length_size);
    if split.is_empty() {
        warn!(len = frame.len(), "Dropping AVC sample without NAL units");
        return None;
    }

    let payload = if split.malformed {
        let mut kept = BytesMut::with_capacity(split.len());
        for unit in &split.units {
            kept.extend_from_slice(&unit.data);
        }
        kept.freeze()
    } else {
        frame
    };

    let mut sample = Sample::new(payload, dts, duration, keyframe || split.has_idr);
    sample.units = split.units;
    Some(sample)
}
