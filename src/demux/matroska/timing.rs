//! Decode timestamp reconstruction for Matroska video.
//!
//! Matroska stores only presentation times. Within a cluster the blocks are
//! ordered by presentation time to derive each block's duration from its
//! successor, then decode times are a running sum over the blocks in storage
//! order.

/// A video block awaiting decode timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TimedBlock {
    /// Position within the cluster.
    pub arrival: usize,
    pub pts: i64,
    pub duration: i64,
    pub dts: i64,
}

impl TimedBlock {
    pub fn new(arrival: usize, pts: i64) -> Self {
        Self {
            arrival,
            pts,
            duration: 0,
            dts: 0,
        }
    }
}

/// Where the running decode time starts for a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DtsSeed {
    /// The cluster directly follows the previous one: one default duration
    /// after its last decode time.
    Continue { last_dts: i64 },
    /// A discontinuity: start at the cluster's smallest presentation time.
    Reseed,
}

/// Fill in `duration` and `dts` for one cluster's blocks. Zero durations fall
/// back to `default_duration`. The blocks are left in arrival order.
pub(crate) fn assign_decode_timestamps(blocks: &mut [TimedBlock], default_duration: i64, seed: DtsSeed) {
    if blocks.is_empty() {
        return;
    }

    blocks.sort_by_key(|b| (b.pts, b.arrival));
    for i in 1..blocks.len() {
        blocks[i - 1].duration = blocks[i].pts - blocks[i - 1].pts;
    }
    let begin = match seed {
        DtsSeed::Continue { last_dts } => last_dts + default_duration,
        DtsSeed::Reseed => blocks[0].pts,
    };

    blocks.sort_by_key(|b| b.arrival);
    for block in blocks.iter_mut() {
        if block.duration <= 0 {
            block.duration = default_duration;
        }
    }
    blocks[0].dts = begin;
    for i in 1..blocks.len() {
        blocks[i].dts = blocks[i - 1].dts + blocks[i - 1].duration;
    }
}

/// Per-frame duration of a block holding `frame_count` laced frames.
pub(crate) fn frame_duration(block_duration: i64, frame_count: usize, default_duration: i64) -> i64 {
    if block_duration <= 0 || frame_count == 0 {
        return default_duration;
    }
    (block_duration as f64 / frame_count as f64).round() as i64
}
