//! Integration tests for autoping CLI functionality

#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::collections::HashSet;
use std::io::Write;
use tempfile::NamedTempFile;

fn ranges_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_help_output() {
    let mut cmd = Command::cargo_bin("autoping").expect("Failed to find autoping binary");
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Survey IPv4 ranges"))
        .stdout(predicate::str::contains("--log"))
        .stdout(predicate::str::contains("--settle-ms"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_version_output() {
    let mut cmd = Command::cargo_bin("autoping").expect("Failed to find autoping binary");
    cmd.arg("--version");

    let output = cmd.output().expect("Failed to execute command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("autoping "));
    if cfg!(debug_assertions) {
        assert!(stdout.contains("-UNRELEASED"));
    }
}

#[test]
fn test_missing_ranges_argument() {
    let mut cmd = Command::cargo_bin("autoping").expect("Failed to find autoping binary");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("RANGES"));
}

#[test]
fn test_dry_run_prints_every_address_once() {
    let file = ranges_file("# lab networks\n10.0.0.1,10.0.0.3\n\n192.0.2.0/29\n");

    let output = Command::cargo_bin("autoping")
        .unwrap()
        .arg("--dry-run")
        .arg(file.path())
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 11);
    let unique: HashSet<&str> = lines.iter().copied().collect();
    assert_eq!(unique.len(), 11);
    assert!(unique.contains("10.0.0.2"));
    assert!(unique.contains("192.0.2.7"));
}

#[test]
fn test_dry_run_order_is_stable() {
    let file = ranges_file("10.0.0.0,10.0.0.9\n");
    let run = || {
        Command::cargo_bin("autoping")
            .unwrap()
            .arg("--dry-run")
            .arg(file.path())
            .output()
            .unwrap()
            .stdout
    };

    let first = run();
    assert_eq!(first, run());
    // Step 13 over a length of 10 starts at offset 3
    assert!(String::from_utf8_lossy(&first).starts_with("10.0.0.3\n10.0.0.6\n10.0.0.9\n"));
}

#[test]
fn test_unparseable_line_reports_line_number() {
    let file = ranges_file("10.0.0.1,10.0.0.3\nnot-an-address\n");

    Command::cargo_bin("autoping")
        .unwrap()
        .arg("--dry-run")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Line 2"));
}

#[test]
fn test_reversed_range_is_rejected() {
    let file = ranges_file("10.0.0.9,10.0.0.1\n");

    Command::cargo_bin("autoping")
        .unwrap()
        .arg("--dry-run")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("10.0.0.9"));
}

#[test]
fn test_nonexistent_ranges_file() {
    Command::cargo_bin("autoping")
        .unwrap()
        .arg("/nonexistent/autoping-ranges.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn test_zero_poll_interval_is_rejected() {
    let file = ranges_file("10.0.0.1\n");

    Command::cargo_bin("autoping")
        .unwrap()
        .args(["--poll-interval-ms", "0"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("poll-interval-ms"));
}
