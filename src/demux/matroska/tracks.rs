//! Track selection and codec policy for Matroska and WebM.

use super::sections::{TrackEntry, TrackType};
use super::Profile;
use crate::demux::error::{DemuxError, Result};
use crate::demux::DemuxOptions;
use bytes::Bytes;
use streamdemux_codec::{parse_audio_specific_config, parse_avcc, parse_flac_header, AAC_FRAME_SAMPLES};
use streamdemux_common::{AudioMetadata, FrameRate, MediaInfo, Sar, TrackKind, VideoMetadata};
use tracing::{debug, warn};

/// The video track being demuxed.
#[derive(Debug, Clone)]
pub(crate) struct VideoTrack {
    pub number: u64,
    pub meta: VideoMetadata,
    /// Frame duration in track ticks.
    pub default_duration: i64,
    /// Split samples into NAL units with this prefix width (AVC only).
    pub nal_length_size: Option<u8>,
}

/// The audio track being demuxed.
#[derive(Debug, Clone)]
pub(crate) struct AudioTrack {
    pub number: u64,
    pub meta: AudioMetadata,
    /// Frame duration in track ticks.
    pub default_duration: i64,
}

/// Pick the first video and the first audio track.
pub(crate) fn select_tracks(tracks: &[TrackEntry]) -> (Option<&TrackEntry>, Option<&TrackEntry>) {
    let mut video = None;
    let mut audio = None;
    for track in tracks {
        match track.track_type {
            TrackType::Video if video.is_none() => video = Some(track),
            TrackType::Audio if audio.is_none() => audio = Some(track),
            TrackType::Video | TrackType::Audio => {
                warn!("Ignoring additional {:?} track {}", track.track_type, track.number)
            }
            TrackType::Other(kind) => debug!("Ignoring track {} of type {}", track.number, kind),
        }
    }
    (video, audio)
}

/// Inputs shared by the per-track builders.
pub(crate) struct TrackContext<'a> {
    pub profile: Profile,
    /// Ticks per second.
    pub timescale: f64,
    pub duration_ms: Option<f64>,
    pub options: &'a DemuxOptions,
}

impl TrackContext<'_> {
    fn duration_ticks(&self) -> u64 {
        self.duration_ms.map_or(0, |ms| (ms / 1e3 * self.timescale) as u64)
    }

    /// Nanoseconds to track ticks.
    fn ticks(&self, ns: f64) -> f64 {
        ns / 1e9 * self.timescale
    }
}

pub(crate) fn build_video_track(entry: &TrackEntry, ctx: &TrackContext<'_>, info: &mut MediaInfo) -> Result<VideoTrack> {
    if entry.has_content_encodings {
        return Err(DemuxError::unsupported_codec(
            TrackKind::Video,
            format!("{} with ContentEncodings", entry.codec_id),
        ));
    }

    let mut track = match (ctx.profile, entry.codec_id.as_str()) {
        (Profile::Matroska, "V_MPEG4/ISO/AVC") => avc_track(entry, ctx)?,
        (Profile::WebM, "V_VP8" | "V_VP9" | "V_AV1") => webm_video_track(entry, ctx)?,
        (_, codec) => return Err(DemuxError::unsupported_codec(TrackKind::Video, codec)),
    };

    let default_ns = entry.default_duration.map(|d| d as f64);
    if !(track.meta.ref_sample_duration.is_finite() && track.meta.ref_sample_duration >= 1.0) {
        let fallback_ns = default_ns.unwrap_or(1e9 / ctx.options.fallback_frame_rate);
        warn!(
            "Frame rate of video track {} gives a sample duration below one tick; using {} ns",
            entry.number, fallback_ns
        );
        track.meta.ref_sample_duration = ctx.ticks(fallback_ns).round();
        track.meta.frame_rate = FrameRate::from_fps(1e9 / fallback_ns);
    }
    track.default_duration = default_ns
        .map_or(track.meta.ref_sample_duration, |ns| ctx.ticks(ns))
        .round()
        .max(1.0) as i64;

    let meta = &track.meta;
    info.has_video = Some(true);
    info.video_codec = Some(meta.codec.clone());
    info.width = Some(meta.codec_width);
    info.height = Some(meta.codec_height);
    info.fps = Some(meta.frame_rate.fps);
    info.profile = meta.profile.clone();
    info.level = meta.level.clone();
    info.ref_frames = meta.ref_frames;
    info.sar_num = Some(meta.sar.width);
    info.sar_den = Some(meta.sar.height);
    Ok(track)
}

fn avc_track(entry: &TrackEntry, ctx: &TrackContext<'_>) -> Result<VideoTrack> {
    let private = entry
        .codec_private
        .as_ref()
        .ok_or_else(|| DemuxError::structural(format!("AVC track {} has no CodecPrivate", entry.number)))?;
    let avcc = parse_avcc(private)?;
    let sps = &avcc.sps_info;

    let frame_rate = sps.frame_rate.unwrap_or_else(|| container_frame_rate(entry, ctx.options));
    let ref_sample_duration = if frame_rate.fps_num == 0 {
        0.0
    } else {
        ctx.timescale * frame_rate.fps_den as f64 / frame_rate.fps_num as f64
    };

    Ok(VideoTrack {
        number: entry.number,
        nal_length_size: Some(avcc.nal_length_size),
        default_duration: 0,
        meta: VideoMetadata {
            track_id: entry.number as u32,
            timescale: ctx.timescale.round() as u32,
            duration: ctx.duration_ticks(),
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
            config: private.clone(),
        },
    })
}

fn webm_video_track(entry: &TrackEntry, ctx: &TrackContext<'_>) -> Result<VideoTrack> {
    let settings = entry
        .video
        .ok_or_else(|| DemuxError::structural(format!("video track {} has no Video element", entry.number)))?;
    let codec = match entry.codec_id.as_str() {
        "V_VP8" => "vp8",
        "V_VP9" => "vp9",
        _ => "av01",
    };

    let frame_rate = container_frame_rate(entry, ctx.options);
    let present_width = settings.display_width.unwrap_or(settings.pixel_width);
    let present_height = settings.display_height.unwrap_or(settings.pixel_height);

    Ok(VideoTrack {
        number: entry.number,
        nal_length_size: None,
        default_duration: 0,
        meta: VideoMetadata {
            track_id: entry.number as u32,
            timescale: ctx.timescale.round() as u32,
            duration: ctx.duration_ticks(),
            codec: codec.to_string(),
            codec_width: settings.pixel_width,
            codec_height: settings.pixel_height,
            present_width,
            present_height,
            profile: None,
            level: None,
            bit_depth: 8,
            chroma_format: None,
            ref_frames: Some(1),
            sar: sample_aspect_ratio(settings.pixel_width, settings.pixel_height, present_width, present_height),
            frame_rate,
            ref_sample_duration: ctx.ticks(1e9 / frame_rate.fps).round(),
            nal_length_size: None,
            config: entry.codec_private.clone().unwrap_or_default(),
        },
    })
}

/// Frame rate from the track's DefaultDuration, or the configured fallback.
fn container_frame_rate(entry: &TrackEntry, options: &DemuxOptions) -> FrameRate {
    match entry.default_duration {
        Some(ns) => FrameRate::from_fps(1e9 / ns as f64),
        None => FrameRate::from_fps(options.fallback_frame_rate),
    }
}

/// SAR that stretches the pixel size to the display size, in lowest terms.
fn sample_aspect_ratio(pixel_width: u32, pixel_height: u32, display_width: u32, display_height: u32) -> Sar {
    let width = display_width as u64 * pixel_height as u64;
    let height = display_height as u64 * pixel_width as u64;
    if width == 0 || height == 0 {
        return Sar::default();
    }
    let g = gcd(width, height);
    Sar {
        width: (width / g) as u32,
        height: (height / g) as u32,
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// `Ok(None)` disables audio: the codec is not delivered by this profile.
pub(crate) fn build_audio_track(
    entry: &TrackEntry,
    ctx: &TrackContext<'_>,
    info: &mut MediaInfo,
) -> Result<Option<AudioTrack>> {
    if entry.has_content_encodings {
        warn!("Audio track {} uses ContentEncodings, disabling audio", entry.number);
        return Ok(None);
    }

    let private = entry.codec_private.clone().unwrap_or_default();
    let settings = entry.audio;
    let (codec, sample_rate, channel_count, bit_depth, object_type, config) =
        match (ctx.profile, entry.codec_id.as_str()) {
            (Profile::Matroska, id) if id.starts_with("A_AAC") => {
                let asc = parse_audio_specific_config(&require_private(entry, &private)?)?;
                (asc.codec_string(), asc.sample_rate, asc.channel_config, Some(16), Some(asc.object_type), private)
            }
            (Profile::Matroska, "A_FLAC") if ctx.options.allow_flac => {
                let flac = parse_flac_header(&require_private(entry, &private)?)
                    .map_err(|e| DemuxError::structural(format!("FLAC track {}: {}", entry.number, e)))?;
                ("flac".to_string(), flac.sample_rate, flac.channels, Some(flac.bit_depth), None, flac.config)
            }
            (Profile::WebM, "A_OPUS" | "A_VORBIS") => {
                let codec = if entry.codec_id == "A_OPUS" { "opus" } else { "vorbis" };
                let (rate, channels, depth) = settings.map_or((8000, 1, None), |a| {
                    (a.sampling_frequency.round() as u32, a.channels, a.bit_depth)
                });
                (codec.to_string(), rate, channels, depth, None, private)
            }
            (_, codec) => {
                warn!("Unsupported audio codec {}, disabling audio", codec);
                return Ok(None);
            }
        };

    if sample_rate == 0 {
        return Err(DemuxError::structural(format!("audio track {} has no sample rate", entry.number)));
    }

    let ref_sample_duration = match entry.default_duration {
        Some(ns) => ctx.ticks(ns as f64),
        None => AAC_FRAME_SAMPLES as f64 / sample_rate as f64 * ctx.timescale,
    };

    info.has_audio = Some(true);
    info.audio_codec = Some(codec.clone());
    info.audio_sample_rate = Some(sample_rate);
    info.audio_channel_count = Some(channel_count);

    Ok(Some(AudioTrack {
        number: entry.number,
        default_duration: ref_sample_duration.round().max(1.0) as i64,
        meta: AudioMetadata {
            track_id: entry.number as u32,
            timescale: ctx.timescale.round() as u32,
            duration: ctx.duration_ticks(),
            codec,
            sample_rate,
            channel_count,
            bit_depth,
            object_type,
            ref_sample_duration,
            config,
        },
    }))
}

fn require_private(entry: &TrackEntry, private: &Bytes) -> Result<Bytes> {
    if private.is_empty() {
        return Err(DemuxError::structural(format!(
            "{} track {} has no CodecPrivate",
            entry.codec_id, entry.number
        )));
    }
    Ok(private.clone())
}
