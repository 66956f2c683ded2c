mod cli;

use streamdemux::config::{self, Config};
use streamdemux::demux::{feed_all, CollectingSink, DemuxOptions, DemuxSession, FeedSummary};
use streamdemux::remux::WebmRemuxer;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use std::path::Path;
use streamdemux_common::{MediaInfo, Sample, TrackMetadata};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config_or_default(cli.config.as_deref())?;

    // Respect RUST_LOG env var if set, otherwise use the verbose flag or the config level
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "streamdemux=trace,streamdemux_ebml=debug,streamdemux_isobmff=debug,streamdemux_codec=debug".to_string()
        } else {
            config.logging.level.clone()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let options = DemuxOptions::from(&config.demux);

    match cli.command {
        Commands::Probe { file, json } => probe_file(&file, options, json),
        Commands::Demux {
            file,
            chunk_size,
            json,
        } => demux_file(&file, options, chunk_size, json),
        Commands::Remux {
            input,
            output,
            chunk_size,
        } => remux_file(&input, &output, options, chunk_size),
        Commands::CheckConfig { file } => check_config(&file),
    }
}

/// Read a file and run it through a fresh session.
fn run_session(
    file: &Path,
    options: DemuxOptions,
    chunk_size: usize,
) -> Result<(DemuxSession<CollectingSink>, FeedSummary)> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }
    let data = std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
    tracing::debug!("Read {} bytes from {:?}", data.len(), file);

    let mut session = DemuxSession::with_options(CollectingSink::default(), options);
    let summary = feed_all(&mut session, &data, chunk_size)
        .with_context(|| format!("Failed to demux {:?}", file))?;
    Ok((session, summary))
}

fn probe_file(file: &Path, options: DemuxOptions, json: bool) -> Result<()> {
    let (session, _) = run_session(file, options, 64 * 1024)?;
    let info = session
        .media_info()
        .cloned()
        .context("No container was detected")?;

    if json {
        let json_str = serde_json::to_string_pretty(&info)?;
        println!("{}", json_str);
        return Ok(());
    }

    println!("File: {}", file.display());
    print_media_info(&info);
    for track in &session.sink().tracks {
        print_track(track);
    }
    Ok(())
}

fn print_media_info(info: &MediaInfo) {
    if let Some(mime) = &info.mime_type {
        println!("MIME type: {}", mime);
    }
    if let Some(duration) = info.duration {
        let secs = (duration / 1000.0) as u64;
        println!(
            "Duration: {:02}:{:02}:{:02}.{:03}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60,
            (duration % 1000.0) as u64
        );
    }
    if let (Some(width), Some(height)) = (info.width, info.height) {
        print!("Video: {} {}x{}", info.video_codec.as_deref().unwrap_or("?"), width, height);
        if let Some(fps) = info.fps {
            print!(" @ {:.3} fps", fps);
        }
        if let Some(profile) = &info.profile {
            print!(" ({} {})", profile, info.level.as_deref().unwrap_or(""));
        }
        println!();
    }
    if let (Some(rate), Some(channels)) = (info.audio_sample_rate, info.audio_channel_count) {
        println!(
            "Audio: {} {} Hz, {} channels",
            info.audio_codec.as_deref().unwrap_or("?"),
            rate,
            channels
        );
    }
    match &info.keyframes_index {
        Some(index) => println!("Keyframes index: {} entries", index.times.len()),
        None => println!("Keyframes index: none"),
    }
}

fn print_track(track: &TrackMetadata) {
    match track {
        TrackMetadata::Video(v) => println!(
            "  [{}] video {} {}x{} timescale {}",
            v.track_id, v.codec, v.present_width, v.present_height, v.timescale
        ),
        TrackMetadata::Audio(a) => println!(
            "  [{}] audio {} {} Hz x{} timescale {}",
            a.track_id, a.codec, a.sample_rate, a.channel_count, a.timescale
        ),
    }
}

#[derive(Debug, Serialize)]
struct DemuxReport {
    mime_type: Option<String>,
    pushes: usize,
    seeks: usize,
    unconsumed: u64,
    tracks: Vec<TrackReport>,
}

#[derive(Debug, Serialize)]
struct TrackReport {
    kind: &'static str,
    track_id: u32,
    codec: String,
    samples: usize,
    keyframes: usize,
    bytes: usize,
    first_dts: Option<i64>,
    last_dts: Option<i64>,
}

impl TrackReport {
    fn new(metadata: &TrackMetadata, samples: &[Sample]) -> Self {
        let (kind, track_id) = match metadata {
            TrackMetadata::Video(v) => ("video", v.track_id),
            TrackMetadata::Audio(a) => ("audio", a.track_id),
        };
        Self {
            kind,
            track_id,
            codec: metadata.codec().to_string(),
            samples: samples.len(),
            keyframes: samples.iter().filter(|s| s.is_keyframe).count(),
            bytes: samples.iter().map(|s| s.payload.len()).sum(),
            first_dts: samples.first().map(|s| s.dts),
            last_dts: samples.last().map(|s| s.dts),
        }
    }
}

fn demux_file(file: &Path, options: DemuxOptions, chunk_size: usize, json: bool) -> Result<()> {
    let (session, summary) = run_session(file, options, chunk_size)?;
    let sink = session.sink();

    let tracks = sink
        .tracks
        .iter()
        .map(|track| match track {
            TrackMetadata::Video(_) => TrackReport::new(track, &sink.video),
            TrackMetadata::Audio(_) => TrackReport::new(track, &sink.audio),
        })
        .collect();
    let report = DemuxReport {
        mime_type: session
            .media_info()
            .and_then(|info| info.mime_type.clone()),
        pushes: summary.pushes,
        seeks: summary.seeks,
        unconsumed: summary.unconsumed,
        tracks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    if let Some(mime) = &report.mime_type {
        println!("MIME type: {}", mime);
    }
    println!(
        "Deliveries: {} ({} seeks, {} bytes unconsumed)",
        report.pushes, report.seeks, report.unconsumed
    );
    println!("\nTracks: {}", report.tracks.len());
    for track in &report.tracks {
        print!(
            "  [{}] {} {}: {} samples, {} keyframes, {} bytes",
            track.track_id, track.kind, track.codec, track.samples, track.keyframes, track.bytes
        );
        if let (Some(first), Some(last)) = (track.first_dts, track.last_dts) {
            print!(", dts {}..{}", first, last);
        }
        println!();
    }
    Ok(())
}

fn remux_file(input: &Path, output: &Path, options: DemuxOptions, chunk_size: usize) -> Result<()> {
    let (session, _) = run_session(input, options, chunk_size)?;
    let demuxer = session.demuxer().context("No container was detected")?;
    let remuxer = WebmRemuxer::from_demuxer(demuxer)?;

    let init = remuxer.init_segment()?;
    let sink = session.sink();
    let clusters = remuxer.media_segment(&sink.audio, &sink.video)?;

    let mut data = init.data;
    data.extend(clusters);
    std::fs::write(output, &data).with_context(|| format!("Failed to write {:?}", output))?;

    tracing::info!("Wrote {} bytes to {:?}", data.len(), output);
    println!(
        "Remuxed {} video and {} audio samples into {}",
        sink.video.len(),
        sink.audio.len(),
        output.display()
    );
    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    println!("Validating config: {:?}", path);
    let config: Config = config::load_config(path)?;
    println!("✓ Configuration is valid");
    println!("  Timestamp base: {} ms", config.demux.timestamp_base_ms);
    match config.demux.duration_override_ms {
        Some(ms) => println!("  Duration override: {} ms", ms),
        None => println!("  Duration override: none"),
    }
    println!("  FLAC allowed: {}", config.demux.allow_flac);
    println!("  Fallback frame rate: {}", config.demux.fallback_frame_rate);
    println!("  Record bitrate: {}", config.demux.record_bitrate);
    println!("  Log level: {}", config.logging.level);
    Ok(())
}
