//! Demux session: container detection, error routing and an in-memory loader.

use super::error::{DemuxError, Result};
use super::probe::{probe_container, ProbeResult};
use super::{DemuxOptions, DemuxSink, Demuxer};
use streamdemux_common::{ChunkResult, MediaInfo};
use tracing::{debug, error};

/// Drives one demuxer on behalf of a loader.
///
/// The first delivery (which must start at offset zero) is probed to pick
/// the demuxer. A permanent error is reported to the sink once and every
/// later push is refused.
pub struct DemuxSession<S: DemuxSink> {
    sink: S,
    options: DemuxOptions,
    demuxer: Option<Demuxer>,
    failed: bool,
}

impl<S: DemuxSink> DemuxSession<S> {
    pub fn new(sink: S) -> Self {
        Self::with_options(sink, DemuxOptions::default())
    }

    pub fn with_options(sink: S, options: DemuxOptions) -> Self {
        Self {
            sink,
            options,
            demuxer: None,
            failed: false,
        }
    }

    /// Offer the loader's buffered bytes, which start at absolute offset
    /// `byte_start`.
    pub fn push(&mut self, chunk: &[u8], byte_start: u64) -> Result<ChunkResult> {
        if self.failed {
            return Err(DemuxError::invalid_state("session has already failed"));
        }

        if self.demuxer.is_none() {
            if byte_start != 0 {
                return self.fail(DemuxError::invalid_state(format!(
                    "first delivery starts at {} instead of 0",
                    byte_start
                )));
            }
            match probe_container(chunk) {
                ProbeResult::NeedMoreData => return Ok(ChunkResult::NeedMoreData),
                ProbeResult::Unknown => {
                    return self.fail(DemuxError::format_mismatch("not a Matroska, WebM or MP4 stream"))
                }
                ProbeResult::Detected(container) => {
                    debug!("Detected {} container", container.as_str());
                    self.demuxer = Some(Demuxer::new(container, self.options.clone()));
                }
            }
        }

        let Some(demuxer) = self.demuxer.as_mut() else {
            return Err(DemuxError::invalid_state("no demuxer"));
        };
        match demuxer.push(chunk, byte_start, &mut self.sink) {
            Ok(result) => Ok(result),
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, err: DemuxError) -> Result<ChunkResult> {
        error!("Demuxing failed: {}", err);
        self.failed = true;
        self.sink.on_error(&err);
        Err(err)
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn demuxer(&self) -> Option<&Demuxer> {
        self.demuxer.as_ref()
    }

    pub fn media_info(&self) -> Option<&MediaInfo> {
        self.demuxer.as_ref().map(Demuxer::media_info)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn set_timestamp_base(&mut self, ms: i64) {
        self.options.timestamp_base_ms = ms;
        if let Some(d) = self.demuxer.as_mut() {
            d.set_timestamp_base(ms);
        }
    }

    pub fn set_duration_override(&mut self, ms: Option<f64>) {
        self.options.duration_override_ms = ms;
        if let Some(d) = self.demuxer.as_mut() {
            d.set_duration_override(ms);
        }
    }

    /// Forget everything learned about the stream. The next push must start
    /// at offset zero again.
    pub fn reset_media_info(&mut self) {
        self.demuxer = None;
        self.failed = false;
    }
}

/// What [`feed_all`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Deliveries made.
    pub pushes: usize,
    /// `SeekTo` requests honored.
    pub seeks: usize,
    /// Bytes at the end of the input the demuxer never consumed.
    pub unconsumed: u64,
}

const MAX_SEEKS: usize = 16;

/// Feed `data` to a session the way a progressive loader would: append
/// `chunk_size` bytes per delivery, drop consumed bytes, restart at `SeekTo`
/// targets.
pub fn feed_all<S: DemuxSink>(session: &mut DemuxSession<S>, data: &[u8], chunk_size: usize) -> Result<FeedSummary> {
    let chunk_size = chunk_size.max(1);
    let len = data.len();
    let mut summary = FeedSummary::default();
    let mut start = 0usize;
    let mut end = 0usize;

    loop {
        end = (end + chunk_size).min(len);
        summary.pushes += 1;

        match session.push(&data[start..end], start as u64)? {
            ChunkResult::Consumed(n) => start += n,
            ChunkResult::NeedMoreData => {
                if end == len {
                    break;
                }
            }
            ChunkResult::SeekTo(pos) => {
                summary.seeks += 1;
                if summary.seeks > MAX_SEEKS {
                    return Err(DemuxError::invalid_state("too many seek requests"));
                }
                let pos = usize::try_from(pos)
                    .ok()
                    .filter(|p| *p <= len)
                    .ok_or_else(|| DemuxError::invalid_state(format!("seek to {} is past the end of the input", pos)))?;
                debug!("Loader seeking to {}", pos);
                start = pos;
                end = pos;
            }
        }

        if start >= len {
            break;
        }
    }

    summary.unconsumed = (len - start.min(len)) as u64;
    Ok(summary)
}
