//! Progressive MP4 demuxing over the chunked loader protocol.

mod common;

use assert_matches::assert_matches;
use common::*;
use streamdemux::demux::{feed_all, CollectingSink, DemuxOptions, DemuxSession, ErrorKind};
use streamdemux_common::TrackMetadata;

#[test]
fn test_audio_and_video_media_info() {
    let file = small_mp4();
    let (session, summary) = demux(&file, file.len());
    assert_eq!(summary.seeks, 0);
    assert_eq!(summary.unconsumed, 0);

    let sink = session.sink();
    let info = sink.media_info.as_ref().unwrap();
    assert_eq!(info.mime_type.as_deref(), Some("video/mp4; codecs=\"avc1.42c01e,mp4a.40.2\""));
    assert_eq!(info.duration, Some(200.0));
    assert_eq!((info.width, info.height), (Some(320), Some(240)));
    assert_eq!(info.fps, Some(25.0));
    assert_eq!(info.profile.as_deref(), Some("Baseline"));
    assert_eq!(info.audio_sample_rate, Some(44_100));
    assert_eq!(info.audio_channel_count, Some(2));
    assert_eq!(info.accurate_duration, Some(120.0));

    assert_eq!(sink.tracks.len(), 2);
    assert_matches!(&sink.tracks[0], TrackMetadata::Video(v) if v.track_id == 1 && v.timescale == VIDEO_TIMESCALE);
    assert_matches!(&sink.tracks[1], TrackMetadata::Audio(a) if a.track_id == 2 && a.codec == "mp4a.40.2");
}

#[test]
fn test_video_timestamps_and_keyframes() {
    let file = small_mp4();
    let (session, _) = demux(&file, 64);
    let sink = session.sink();

    let timing: Vec<_> = sink.video.iter().map(|s| (s.dts, s.pts, s.is_keyframe)).collect();
    let delta = VIDEO_DELTA as i64;
    let cts = VIDEO_CTS as i64;
    assert_eq!(
        timing,
        vec![(0, cts, true), (delta, delta + cts, false), (2 * delta, 2 * delta + cts, false)]
    );
    assert_eq!(sink.video[0].units.len(), 1);

    let dts: Vec<_> = sink.audio.iter().map(|s| s.dts).collect();
    assert_eq!(dts, vec![0, 1024]);

    let info = sink.media_info.as_ref().unwrap();
    let index = info.keyframes_index.as_ref().unwrap();
    assert_eq!(index.times, vec![0.0]);
    assert_eq!(index.file_positions, vec![sink.video[0].file_position.unwrap()]);
}

#[test]
fn test_byte_at_a_time_matches_whole_buffer() {
    let file = small_mp4();
    let (whole, _) = demux(&file, file.len());
    let (trickled, summary) = demux(&file, 1);

    assert!(summary.pushes > file.len() / 2);
    assert_eq!(trickled.sink().video, whole.sink().video);
    assert_eq!(trickled.sink().audio, whole.sink().audio);
    assert_eq!(trickled.sink().media_info, whole.sink().media_info);
}

#[test]
fn test_sample_positions_point_into_mdat() {
    let file = small_mp4();
    let (session, _) = demux(&file, 100);
    let sink = session.sink();

    for sample in sink.video.iter().chain(&sink.audio) {
        let start = sample.file_position.unwrap() as usize;
        assert_eq!(&file[start..start + sample.payload.len()], sample.payload.as_ref());
    }
}

#[test]
fn test_timestamp_base_and_duration_override() {
    let file = small_mp4();
    let options = DemuxOptions {
        timestamp_base_ms: 1000,
        duration_override_ms: Some(5000.0),
        ..DemuxOptions::default()
    };
    let mut session = DemuxSession::with_options(CollectingSink::default(), options);
    feed_all(&mut session, &file, 256).unwrap();

    let sink = session.sink();
    assert_eq!(sink.video[0].dts, VIDEO_TIMESCALE as i64);
    assert_eq!(sink.audio[0].dts, 44_100);
    assert_eq!(sink.media_info.as_ref().unwrap().duration, Some(5000.0));
    assert_eq!(sink.media_info.as_ref().unwrap().keyframes_index.as_ref().unwrap().times, vec![1000.0]);
}

#[test]
fn test_unsupported_video_codec() {
    let mut file = small_mp4();
    let at = file.windows(4).rposition(|w| w == b"avc1").unwrap();
    file[at..at + 4].copy_from_slice(b"hev1");

    let mut session = DemuxSession::new(CollectingSink::default());
    let err = feed_all(&mut session, &file, 4096).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedCodec);
    assert_eq!(session.sink().errors.len(), 1);
}

#[test]
fn test_bitrate_map_from_sample_tables() {
    let file = small_mp4();
    let (session, _) = demux(&file, file.len());
    let bytes: usize = session
        .sink()
        .video
        .iter()
        .chain(&session.sink().audio)
        .map(|s| s.payload.len())
        .sum();

    let info = session.media_info().unwrap();
    assert_eq!(info.bitrate_map.len(), 1);
    assert!((info.bitrate_map[0] - bytes as f64 * 8.0 / 1000.0).abs() < 1e-9);
}
