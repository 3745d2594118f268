//! Command-line behaviour of the `stillshot` binary.

use std::path::Path;
use std::process::{Command, Output};

fn stillshot(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stillshot"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run stillshot")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn missing_input_and_output_fails_with_hint() {
    let output = stillshot(&["5"]);

    assert!(!output.status.success());
    let stderr = stderr(&output);
    assert!(stderr.contains("input file must be specified"), "{stderr}");
    assert!(stderr.contains("output file must be specified"), "{stderr}");
    assert!(stderr.contains("call for help: stillshot --help"), "{stderr}");
}

#[test]
fn missing_timestamps_fails_without_io() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let template = directory
        .path()
        .join("shot_%d.jpg")
        .to_string_lossy()
        .into_owned();
    let output = stillshot(&[
        "-i",
        "does_not_exist.mp4",
        "-o",
        template.as_str(),
        "nope",
    ]);

    assert!(!output.status.success());
    let stderr = stderr(&output);
    assert!(stderr.contains("Ignoring invalid timestamp 'nope'"), "{stderr}");
    assert!(stderr.contains("call for help"), "{stderr}");
    assert!(!stderr.contains("Failed to open media file"), "{stderr}");
    assert_eq!(std::fs::read_dir(directory.path()).unwrap().count(), 0);
}

#[test]
fn help_exits_successfully() {
    for flag in ["-?", "--help"] {
        let output = stillshot(&[flag]);
        assert!(output.status.success(), "{flag} should exit 0");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("--crop"), "{stdout}");
        assert!(stdout.contains("--deinterlace"), "{stdout}");
    }
}

#[test]
fn unopenable_input_is_fatal() {
    let output = stillshot(&["-i", "does_not_exist.mp4", "-o", "shot_%d.jpg", "1"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to open media file"));
}

#[test]
fn json_report_lists_written_and_skipped() {
    let path = "tests/fixtures/sample_video.mp4";
    if !Path::new(path).exists() {
        return;
    }

    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let template = directory
        .path()
        .join("shot_%d.jpg")
        .to_string_lossy()
        .into_owned();
    let output = stillshot(&[
        "-i",
        path,
        "-o",
        template.as_str(),
        "--crop",
        "480",
        "--width",
        "640",
        "--json",
        "--",
        "2",
        "5",
        "3600",
    ]);

    assert!(output.status.success(), "{}", stderr(&output));
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["encoder"]["width"], 640);
    assert_eq!(report["encoder"]["height"], 360);
    assert_eq!(report["written"].as_array().unwrap().len(), 2);
    assert_eq!(report["skipped"][0]["seconds"], 3600);
    assert!(directory.path().join("shot_2.jpg").exists());
    assert!(directory.path().join("shot_5.jpg").exists());
}
