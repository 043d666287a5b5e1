//! Integration tests for the chapsnap binary.
//!
//! These only exercise paths that need no external tools.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_chapsnap"))
}

const CHAPTERS: &str = "CHAPTER01=00:00:00.000\nCHAPTER01NAME=Intro\n\
                        CHAPTER02=00:00:10.000\nCHAPTER02NAME=Part A\n\
                        CHAPTER03=00:00:20.000\nCHAPTER03NAME=Part B\n";

const FRAMES: &str = r#"{"frames": [
    {"best_effort_timestamp_time": "0.000000", "pict_type": "I", "tags": {"lavfi.scene_score": "1.00"}},
    {"best_effort_timestamp_time": "9.500000", "pict_type": "P", "tags": {"lavfi.scene_score": "0.51"}},
    {"best_effort_timestamp_time": "10.600000", "pict_type": "I", "tags": {"lavfi.scene_score": "0.62"}},
    {"best_effort_timestamp_time": "19.000000", "pict_type": "I", "tags": {"lavfi.scene_score": "0.77"}}
]}"#;

fn fixtures() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("chapters.txt"), CHAPTERS).unwrap();
    fs::write(dir.path().join("frames.json"), FRAMES).unwrap();
    dir
}

#[test]
fn test_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scene change"))
        .stdout(predicate::str::contains("--keyframes"));
}

#[test]
fn test_requires_video() {
    cli()
        .assert()
        .failure()
        .stderr(predicate::str::contains("VIDEO"));
}

#[test]
fn test_render_prints_retimed_chapters() {
    let dir = fixtures();

    cli()
        .current_dir(dir.path())
        .args(["render", "--chapters", "chapters.txt", "--scenes", "frames.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CHAPTER01=00:00:00.000"))
        .stdout(predicate::str::contains("CHAPTER02=00:00:09.500"))
        .stdout(predicate::str::contains("CHAPTER02NAME=Part A"))
        .stdout(predicate::str::contains("CHAPTER03=00:00:19.000"))
        .stderr(predicate::str::contains("Resync"));
}

#[test]
fn test_render_keyframes_only() {
    let dir = fixtures();

    cli()
        .current_dir(dir.path())
        .args(["render", "--chapters", "chapters.txt", "--scenes", "frames.json", "-k", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CHAPTER02=00:00:10.600"));
}

#[test]
fn test_render_writes_output_file() {
    let dir = fixtures();
    let out = dir.path().join("retimed.txt");

    cli()
        .current_dir(dir.path())
        .args(["render", "--chapters", "chapters.txt", "--scenes", "frames.json", "--output"])
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("CHAPTER01="));
    assert!(!text.ends_with('\n'));
}

#[test]
fn test_render_trim_out_of_range_fails() {
    let dir = fixtures();

    cli()
        .current_dir(dir.path())
        .args(["render", "--chapters", "chapters.txt", "--scenes", "frames.json", "--trim", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("trim"));
}

#[test]
fn test_invalid_threshold_rejected() {
    let dir = fixtures();

    cli()
        .current_dir(dir.path())
        .args(["render", "--chapters", "chapters.txt", "--scenes", "frames.json", "-t", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("threshold"));
}

#[test]
fn test_missing_video_fails_batch() {
    let dir = fixtures();

    cli()
        .current_dir(dir.path())
        .args(["--chapters", "chapters.txt", "--mux", "none", "missing.mkv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 1 videos failed"));
}

#[test]
fn test_config_file_is_created() {
    let dir = fixtures();
    let config = dir.path().join("chapsnap.toml");

    cli()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["render", "--chapters", "chapters.txt", "--scenes", "frames.json", "-q"])
        .assert()
        .success();

    let content = fs::read_to_string(&config).unwrap();
    assert!(content.contains("[resync]"));
    assert!(content.contains("threshold = 0.4"));
}
