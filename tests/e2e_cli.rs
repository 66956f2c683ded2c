//! CLI end-to-end tests
//!
//! Tests for the streamdemux command-line interface.

mod common;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the streamdemux binary
#[allow(deprecated)]
fn streamdemux_cmd() -> Command {
    Command::cargo_bin("streamdemux").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = streamdemux_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = streamdemux_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("streamdemux"))
        .stdout(predicate::str::contains("probe"))
        .stdout(predicate::str::contains("remux"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = streamdemux_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_probe_nonexistent_file() {
    let mut cmd = streamdemux_cmd();
    cmd.args(["probe", "/nonexistent/file.webm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_probe_webm() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clip.webm");
    fs::write(&path, common::small_webm()).unwrap();

    let mut cmd = streamdemux_cmd();
    cmd.arg("probe")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("video/webm; codecs=\"vp8\""))
        .stdout(predicate::str::contains("vp8 320x240"));
}

#[test]
fn test_cli_probe_mp4_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clip.mp4");
    fs::write(&path, common::small_mp4()).unwrap();

    let mut cmd = streamdemux_cmd();
    let output = cmd.args(["probe", "--json"]).arg(&path).output().unwrap();
    assert!(output.status.success());

    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["video_codec"], "avc1.42c01e");
    assert_eq!(info["audio_codec"], "mp4a.40.2");
    assert_eq!(info["width"], 320);
    assert_eq!(info["has_keyframes_index"], true);
}

#[test]
fn test_cli_probe_rejects_unknown_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "plain text, not media").unwrap();

    let mut cmd = streamdemux_cmd();
    cmd.arg("probe")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to demux"));
}

#[test]
fn test_cli_demux_json_summary() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clip.mp4");
    fs::write(&path, common::small_mp4()).unwrap();

    let mut cmd = streamdemux_cmd();
    let output = cmd
        .args(["demux", "--json", "--chunk-size", "7"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["seeks"], 0);
    assert_eq!(report["unconsumed"], 0);
    let tracks = report["tracks"].as_array().unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0]["kind"], "video");
    assert_eq!(tracks[0]["samples"], 3);
    assert_eq!(tracks[0]["keyframes"], 1);
    assert_eq!(tracks[1]["kind"], "audio");
    assert_eq!(tracks[1]["samples"], 2);
}

#[test]
fn test_cli_demux_text_summary() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clip.webm");
    fs::write(&path, common::small_webm()).unwrap();

    let mut cmd = streamdemux_cmd();
    cmd.arg("demux")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Tracks: 1"))
        .stdout(predicate::str::contains("3 samples, 1 keyframes"))
        .stdout(predicate::str::contains("dts 0..66"));
}

#[test]
fn test_cli_remux_round_trip() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.webm");
    let output = dir.path().join("out.webm");
    fs::write(&input, common::small_webm()).unwrap();

    let mut cmd = streamdemux_cmd();
    cmd.arg("remux")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--chunk-size", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Remuxed 3 video and 0 audio samples"));

    let remuxed = fs::read(&output).unwrap();
    let (original, _) = common::demux(&common::small_webm(), 4096);
    let (again, _) = common::demux(&remuxed, 4096);
    let frames = |s: &[streamdemux_common::Sample]| -> Vec<_> {
        s.iter().map(|s| (s.pts, s.is_keyframe, s.payload.clone())).collect()
    };
    assert_eq!(frames(&again.sink().video), frames(&original.sink().video));
}

#[test]
fn test_cli_remux_rejects_mp4() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.mp4");
    fs::write(&input, common::small_mp4()).unwrap();

    let mut cmd = streamdemux_cmd();
    cmd.arg("remux")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out.webm"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("MP4"));
}

#[test]
fn test_cli_check_config_valid() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("streamdemux.toml");
    fs::write(
        &config_path,
        r#"
[demux]
timestamp_base_ms = 500
fallback_frame_rate = 30.0

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let mut cmd = streamdemux_cmd();
    cmd.arg("check-config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Timestamp base: 500 ms"))
        .stdout(predicate::str::contains("Fallback frame rate: 30"));
}

#[test]
fn test_cli_check_config_invalid() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("bad.toml");
    fs::write(&config_path, "[demux]\nfallback_frame_rate = 0.0\n").unwrap();

    let mut cmd = streamdemux_cmd();
    cmd.arg("check-config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("fallback_frame_rate"));
}

#[test]
fn test_cli_global_config_applies_to_demux() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("streamdemux.toml");
    fs::write(&config_path, "[demux]\ntimestamp_base_ms = 1000\n").unwrap();
    let media = dir.path().join("clip.webm");
    fs::write(&media, common::small_webm()).unwrap();

    let mut cmd = streamdemux_cmd();
    cmd.arg("--config")
        .arg(&config_path)
        .arg("demux")
        .arg(&media)
        .assert()
        .success()
        .stdout(predicate::str::contains("dts 1000..1066"));
}
