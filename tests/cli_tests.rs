//! CLI integration tests

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use wake_capture::domain::audio::{write_wav, AudioFormat};

/// Binary with its config directory pointed into `home`
fn wake_capture(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wake-capture").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path())
        .env("HOME", home.path())
        .env_remove("WAKE_CAPTURE_DEVICE")
        .env_remove("WAKE_CAPTURE_LOG");
    cmd
}

fn write_clip(path: &Path, format: AudioFormat, samples: usize) {
    let clip: Vec<i16> = (0..samples).map(|i| ((i % 200) as i16 - 100) * 50).collect();
    write_wav(path, format, &clip).unwrap();
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    wake_capture(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("wake-word"))
        .stdout(predicate::str::contains("devices"))
        .stdout(predicate::str::contains("listen"))
        .stdout(predicate::str::contains("feed"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    wake_capture(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wake-capture"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn listen_help_lists_options() {
    let home = TempDir::new().unwrap();
    wake_capture(&home)
        .args(["listen", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--duration"))
        .stdout(predicate::str::contains("--device"))
        .stdout(predicate::str::contains("--replay"))
        .stdout(predicate::str::contains("--save"))
        .stdout(predicate::str::contains("--window"));
}

#[test]
fn config_path_command() {
    let home = TempDir::new().unwrap();
    wake_capture(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wake-capture"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();
    wake_capture(&home)
        .args(["config", "set", "keyword_count", "3"])
        .assert()
        .success();

    wake_capture(&home)
        .args(["config", "get", "keyword_count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3"));

    assert!(home.path().join("wake-capture/config.toml").exists());
}

#[test]
fn config_init_twice_fails() {
    let home = TempDir::new().unwrap();
    wake_capture(&home).args(["config", "init"]).assert().success();
    wake_capture(&home)
        .args(["config", "init"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists at"));
}

#[test]
fn config_get_unknown_key() {
    let home = TempDir::new().unwrap();
    wake_capture(&home)
        .args(["config", "get", "api_key"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn config_set_rejects_bad_value() {
    let home = TempDir::new().unwrap();
    wake_capture(&home)
        .args(["config", "set", "stop_timeout", "soon"])
        .assert()
        .code(1);
    assert!(!home.path().join("wake-capture/config.toml").exists());
}

#[test]
fn invalid_duration_is_usage_error() {
    let home = TempDir::new().unwrap();
    wake_capture(&home)
        .args(["listen", "--duration", "invalid"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid duration"));
}

#[test]
fn window_requires_save() {
    let home = TempDir::new().unwrap();
    wake_capture(&home)
        .args(["feed", "clip.wav", "--window", "3s"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--save"));
}

#[test]
fn feed_missing_file_fails() {
    let home = TempDir::new().unwrap();
    wake_capture(&home)
        .args(["feed", "/nonexistent/clip.wav"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot open"));
}

#[test]
fn feed_zero_frame_length_is_usage_error() {
    let home = TempDir::new().unwrap();
    let clip = home.path().join("clip.wav");
    write_clip(&clip, AudioFormat::SPEECH, 1_600);

    wake_capture(&home)
        .arg("feed")
        .arg(&clip)
        .args(["--frame-ms", "0"])
        .assert()
        .code(2);
}

#[test]
fn feed_pushes_every_frame() {
    let home = TempDir::new().unwrap();
    let clip = home.path().join("clip.wav");
    write_clip(&clip, AudioFormat::SPEECH, 16_000);

    // 16000 samples in 1024-sample frames
    wake_capture(&home)
        .arg("feed")
        .arg(&clip)
        .assert()
        .success()
        .stderr(predicate::str::contains("Fed 16 frames"));
}

#[test]
fn feed_saves_trailing_window() {
    let home = TempDir::new().unwrap();
    let clip = home.path().join("clip.wav");
    let out = home.path().join("last.wav");
    write_clip(&clip, AudioFormat::SPEECH, 32_000);

    wake_capture(&home)
        .arg("feed")
        .arg(&clip)
        .arg("--save")
        .arg(&out)
        .args(["--window", "500ms"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved 500 ms"));

    let (format, samples) = wake_capture::domain::audio::read_wav(&out).unwrap();
    assert_eq!(format, AudioFormat::SPEECH);
    assert_eq!(samples.len(), 8_000);
}

#[test]
fn feed_converts_stereo_input() {
    let home = TempDir::new().unwrap();
    let clip = home.path().join("stereo.wav");
    write_clip(&clip, AudioFormat::pcm16(16_000, 2), 32_000);

    wake_capture(&home)
        .arg("feed")
        .arg(&clip)
        .assert()
        .success()
        .stderr(predicate::str::contains("Fed 16 frames"));
}

#[test]
fn listen_replays_a_clip() {
    let home = TempDir::new().unwrap();
    let clip = home.path().join("clip.wav");
    write_clip(&clip, AudioFormat::SPEECH, 8_000);

    wake_capture(&home)
        .arg("listen")
        .arg("--replay")
        .arg(&clip)
        .args(["--duration", "1s"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Listening for wake word"));
}
