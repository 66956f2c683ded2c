//! Timestamped samples and the queues they are delivered in.

use crate::types::TrackKind;
use bytes::Bytes;

/// A NAL unit inside an AVC sample, length prefix included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NalUnit {
    /// `nal_unit_type` (low five bits of the NAL header).
    pub nal_type: u8,
    pub data: Bytes,
}

/// One decodable access unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Sample bytes exactly as stored in the container.
    pub payload: Bytes,
    /// NAL units split out of `payload` (AVC video only).
    pub units: Vec<NalUnit>,
    pub dts: i64,
    pub pts: i64,
    /// Composition offset, `pts - dts`.
    pub cts: i64,
    pub duration: i64,
    pub is_keyframe: bool,
    /// Absolute file offset of the sample data.
    pub file_position: Option<u64>,
    /// Encoded Matroska block body (track number, timecode, flags, data),
    /// kept for passthrough remuxing of unlaced blocks.
    pub block: Option<Bytes>,
}

impl Sample {
    /// Create a sample with equal decode and presentation timestamps.
    pub fn new(payload: Bytes, dts: i64, duration: i64, is_keyframe: bool) -> Self {
        Self {
            payload,
            units: Vec::new(),
            dts,
            pts: dts,
            cts: 0,
            duration,
            is_keyframe,
            file_position: None,
            block: None,
        }
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Pending samples for one track, drained by the consumer after each dispatch.
#[derive(Debug, Clone)]
pub struct TrackQueue {
    pub kind: TrackKind,
    pub track_id: u32,
    /// Incremented every time the queue is drained.
    pub sequence_number: u64,
    pub samples: Vec<Sample>,
    /// Total payload bytes in `samples`.
    pub length: usize,
}

impl TrackQueue {
    pub fn new(kind: TrackKind, track_id: u32) -> Self {
        Self {
            kind,
            track_id,
            sequence_number: 0,
            samples: Vec::new(),
            length: 0,
        }
    }

    /// Append a sample.
    pub fn push(&mut self, sample: Sample) {
        self.length += sample.len();
        self.samples.push(sample);
    }

    /// Remove and return all pending samples.
    pub fn take(&mut self) -> Vec<Sample> {
        self.length = 0;
        self.sequence_number += 1;
        std::mem::take(&mut self.samples)
    }

    /// Drop pending samples and reset counters.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.length = 0;
        self.sequence_number = 0;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_push_and_take() {
        let mut queue = TrackQueue::new(TrackKind::Audio, 2);
        queue.push(Sample::new(Bytes::from_static(&[1, 2, 3]), 0, 23, true));
        queue.push(Sample::new(Bytes::from_static(&[4, 5]), 23, 23, true));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.length, 5);

        let drained = queue.take();
        assert_eq!(drained.len(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.length, 0);
        assert_eq!(queue.sequence_number, 1);
    }

    #[test]
    fn test_sample_new_has_equal_timestamps() {
        let sample = Sample::new(Bytes::new(), 42, 10, false);
        assert_eq!(sample.pts, 42);
        assert_eq!(sample.cts, 0);
        assert!(sample.is_empty());
    }
}
