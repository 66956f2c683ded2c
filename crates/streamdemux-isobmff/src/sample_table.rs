//! Sample tables and the offset-sorted chunk map.
//!
//! Sample tables describe how samples are laid out in `mdat`:
//! - stts: decode durations
//! - ctts: composition offsets
//! - stss: sync samples (absent means every sample is a sync sample)
//! - stsc: sample-to-chunk runs
//! - stsz: sample sizes
//! - stco/co64: chunk offsets
//!
//! Every chunk of every selected track goes into one [`ChunkMap`], sorted by
//! file offset, so the mdat streamer can resolve any absolute position.

use crate::boxes::{BoxFields, BoxNode, CompositionOffset, SampleToChunk, TimeToSample};
use crate::error::{IsoError, Result};
use crate::header::FourCC;
use std::collections::HashSet;
use streamdemux_common::TrackKind;

/// One sample as declared by the tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSample {
    /// Decode timestamp in media timescale.
    pub ts: u64,
    pub duration: u32,
    /// Composition offset.
    pub cts: i32,
    pub size: u32,
    pub is_keyframe: bool,
}

/// A run of consecutive samples of one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Absolute file offset of the first sample.
    pub offset: u64,
    pub kind: TrackKind,
    pub samples: Vec<ChunkSample>,
}

impl Chunk {
    /// Bytes covered by all samples.
    pub fn byte_len(&self) -> u64 {
        self.samples.iter().map(|s| s.size as u64).sum()
    }
}

/// The tables of one `stbl` box.
#[derive(Debug, Clone, Default)]
pub struct SampleTables {
    stts: Vec<TimeToSample>,
    ctts: Vec<CompositionOffset>,
    sync_samples: Option<Vec<u32>>,
    stsc: Vec<SampleToChunk>,
    uniform_size: u32,
    sample_count: u32,
    sizes: Vec<u32>,
    chunk_offsets: Vec<u64>,
}

impl SampleTables {
    /// Collect the tables from an `stbl` box.
    pub fn from_stbl(stbl: &BoxNode) -> Result<Self> {
        let mut tables = Self::default();
        let mut seen = HashSet::new();

        for child in &stbl.children {
            match &child.fields {
                BoxFields::Stts(entries) => tables.stts = entries.clone(),
                BoxFields::Ctts(entries) => tables.ctts = entries.clone(),
                BoxFields::Stss(entries) => tables.sync_samples = Some(entries.clone()),
                BoxFields::Stsc(entries) => tables.stsc = entries.clone(),
                BoxFields::Stsz {
                    uniform_size,
                    sample_count,
                    sizes,
                } => {
                    tables.uniform_size = *uniform_size;
                    tables.sample_count = *sample_count;
                    tables.sizes = sizes.clone();
                }
                BoxFields::ChunkOffsets(offsets) => tables.chunk_offsets = offsets.clone(),
                _ => continue,
            }
            seen.insert(if child.kind == FourCC::CO64 { FourCC::STCO } else { child.kind });
        }

        for required in [FourCC::STTS, FourCC::STSC, FourCC::STSZ, FourCC::STCO] {
            if !seen.contains(&required) {
                return Err(IsoError::MissingBox(required));
            }
        }
        tables.check_sample_count()?;
        Ok(tables)
    }

    /// The per-sample vectors are sized from `stsz`, so its count must be
    /// backed by the chunk layout and, for uniform sizes, by `stts`.
    fn check_sample_count(&self) -> Result<()> {
        let declared = self.sample_count as u64;

        let capacity = self.chunk_capacity();
        if declared > capacity {
            return Err(IsoError::SampleCount {
                declared: self.sample_count,
                table: FourCC::STSC,
                available: capacity,
            });
        }

        if self.uniform_size > 0 {
            let timed: u64 = self.stts.iter().map(|e| e.sample_count as u64).sum();
            if declared > timed {
                return Err(IsoError::SampleCount {
                    declared: self.sample_count,
                    table: FourCC::STTS,
                    available: timed,
                });
            }
        }
        Ok(())
    }

    /// Samples that stsc can place into the chunks listed by stco.
    fn chunk_capacity(&self) -> u64 {
        let end = self.chunk_offsets.len() as u64 + 1;
        self.stsc
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let next = self.stsc.get(i + 1).map_or(end, |n| (n.first_chunk as u64).min(end));
                next.saturating_sub(entry.first_chunk as u64)
                    .saturating_mul(entry.samples_per_chunk as u64)
            })
            .fold(0u64, u64::saturating_add)
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn sample_size(&self, index: usize) -> u32 {
        if self.uniform_size > 0 {
            self.uniform_size
        } else {
            self.sizes.get(index).copied().unwrap_or(0)
        }
    }

    /// `(ts, duration)` of every sample, padded with the last duration when
    /// stts declares fewer samples than stsz.
    pub fn timestamps(&self) -> Vec<(u64, u32)> {
        let count = self.sample_count as usize;
        let mut out = Vec::with_capacity(count);
        let mut ts = 0u64;

        'outer: for entry in &self.stts {
            for _ in 0..entry.sample_count {
                if out.len() >= count {
                    break 'outer;
                }
                out.push((ts, entry.sample_delta));
                ts += entry.sample_delta as u64;
            }
        }

        let last = out.last().map_or(0, |(_, d)| *d);
        while out.len() < count {
            out.push((ts, last));
            ts += last as u64;
        }
        out
    }

    /// Sum of all sample durations.
    pub fn total_duration(&self) -> u64 {
        self.timestamps()
            .last()
            .map_or(0, |(ts, duration)| ts + *duration as u64)
    }

    fn cts_offsets(&self) -> Vec<i32> {
        let count = self.sample_count as usize;
        let mut out: Vec<i32> = self
            .ctts
            .iter()
            .flat_map(|e| std::iter::repeat(e.offset).take(e.sample_count as usize))
            .take(count)
            .collect();
        out.resize(count, 0);
        out
    }

    /// Samples per chunk for a 1-based chunk number.
    fn samples_per_chunk(&self, chunk_number: u32) -> u32 {
        self.stsc
            .iter()
            .take_while(|e| e.first_chunk <= chunk_number)
            .last()
            .map_or(0, |e| e.samples_per_chunk)
    }

    /// Resolve every chunk of this track.
    pub fn build_chunks(&self, kind: TrackKind) -> Vec<Chunk> {
        let timestamps = self.timestamps();
        let cts = self.cts_offsets();
        let sync: Option<HashSet<u32>> = self.sync_samples.as_ref().map(|s| s.iter().copied().collect());
        let count = self.sample_count as usize;

        let mut chunks = Vec::with_capacity(self.chunk_offsets.len());
        let mut sample = 0usize;

        for (i, offset) in self.chunk_offsets.iter().enumerate() {
            let per_chunk = self.samples_per_chunk(i as u32 + 1) as usize;
            let mut samples = Vec::with_capacity(per_chunk);

            for _ in 0..per_chunk {
                if sample >= count {
                    break;
                }
                let (ts, duration) = timestamps[sample];
                samples.push(ChunkSample {
                    ts,
                    duration,
                    cts: cts[sample],
                    size: self.sample_size(sample),
                    // stss numbers samples from 1
                    is_keyframe: sync.as_ref().map_or(true, |s| s.contains(&(sample as u32 + 1))),
                });
                sample += 1;
            }

            chunks.push(Chunk {
                offset: *offset,
                kind,
                samples,
            });
        }

        chunks
    }
}

/// Where an absolute position falls in the chunk map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleAt<'a> {
    /// A sample starts exactly here.
    Sample { kind: TrackKind, sample: &'a ChunkSample },
    /// No sample starts here; the next one starts at the given position,
    /// or nowhere when `None`.
    Gap { next: Option<u64> },
}

/// All chunks of the selected tracks, sorted by offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkMap {
    chunks: Vec<Chunk>,
}

impl ChunkMap {
    pub fn new(mut chunks: Vec<Chunk>) -> Self {
        chunks.sort_by_key(|c| c.offset);
        Self { chunks }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Resolve an absolute file position.
    ///
    /// Uses the chunk with the largest offset not past `position`, then walks
    /// its sample sizes.
    pub fn sample_at(&self, position: u64) -> SampleAt<'_> {
        let idx = self.chunks.partition_point(|c| c.offset <= position);
        let next_chunk = self.chunks.get(idx).map(|c| c.offset);
        let Some(chunk) = idx.checked_sub(1).map(|i| &self.chunks[i]) else {
            return SampleAt::Gap { next: next_chunk };
        };

        let mut start = chunk.offset;
        for sample in &chunk.samples {
            // Empty samples occupy no bytes and are never reported
            if start == position && sample.size > 0 {
                return SampleAt::Sample {
                    kind: chunk.kind,
                    sample,
                };
            }
            if start > position {
                return SampleAt::Gap { next: Some(start) };
            }
            start += sample.size as u64;
        }

        // Past the chunk's samples, or in the middle of its last one
        if start > position {
            return SampleAt::Gap { next: Some(start) };
        }
        SampleAt::Gap { next: next_chunk }
    }
}
