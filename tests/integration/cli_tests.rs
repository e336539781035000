//! Integration tests for the CLI binary.
//!
//! Drives the `prep` binary against a temporary data directory.
//!
//! This test is registered as a [[test]] in the pioneer-reputation-cli crate
//! so that CARGO_BIN_EXE_prep is available.

use std::path::Path;
use std::process::{Command, Output};

/// Get a Command pointing to the `prep` binary.
fn prep_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_prep"))
}

fn prep(data_dir: &Path, args: &[&str]) -> Output {
    prep_binary()
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .output()
        .expect("failed to execute prep")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "prep should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn cli_responds_to_help() {
    let output = prep_binary()
        .arg("--help")
        .output()
        .expect("failed to execute prep --help");

    assert!(
        output.status.success(),
        "prep --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("prep") || stdout.contains("Usage"),
        "prep --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = prep_binary()
        .arg("--version")
        .output()
        .expect("failed to execute prep --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("0.3") || stdout.contains("prep"),
        "prep --version should contain version info, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = prep_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute prep");

    assert!(
        !output.status.success(),
        "prep with unknown flag should exit with error"
    );
}

#[test]
fn cli_requires_uid_for_check_in() {
    let dir = tempfile::tempdir().unwrap();
    let output = prep(dir.path(), &["check-in"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--uid"), "got: {stderr}");
}

#[test]
fn cli_check_in_persists_across_runs() {
    let dir = tempfile::tempdir().unwrap();

    let first = stdout_json(&prep(dir.path(), &["--uid", "p1", "--json", "check-in"]));
    assert_eq!(first["success"], true);
    assert_eq!(first["pointsEarned"], 3);
    assert_eq!(first["state"]["streak"], 1);

    let second = stdout_json(&prep(dir.path(), &["--uid", "p1", "--json", "check-in"]));
    assert_eq!(second["success"], false);
    assert_eq!(second["reason"]["code"], "already_checked_in");

    let got = stdout_json(&prep(dir.path(), &["--uid", "p1", "--json", "get"]));
    assert_eq!(got["isNew"], false);
    assert_eq!(got["unified"]["total"], 3);

    let listed = stdout_json(&prep(dir.path(), &["--json", "list"]));
    assert_eq!(listed, serde_json::json!(["p1"]));
}

#[test]
fn cli_merge_more_than_pending_fails() {
    let dir = tempfile::tempdir().unwrap();
    stdout_json(&prep(dir.path(), &["--uid", "p1", "--json", "check-in"]));

    let merged = stdout_json(&prep(
        dir.path(),
        &["--uid", "p1", "--json", "merge", "--points", "20"],
    ));
    assert_eq!(merged["success"], false);
    assert_eq!(merged["reason"]["code"], "insufficient_points");
    assert_eq!(merged["state"]["dailyCheckInPoints"], 3);
}

#[test]
fn cli_sync_from_activity_file() {
    let dir = tempfile::tempdir().unwrap();
    let activity = dir.path().join("activity.json");
    std::fs::write(&activity, r#"{"accountAgeDays": 70, "stakingDays": 30}"#).unwrap();

    let synced = stdout_json(&prep(
        dir.path(),
        &[
            "--uid",
            "p1",
            "--json",
            "sync",
            "--activity",
            activity.to_str().unwrap(),
            "--wallet",
            "GWALLET",
        ],
    ));
    assert_eq!(synced["success"], true);
    assert_eq!(synced["atomic"]["adjustedScore"], 50);
    assert_eq!(synced["state"]["walletAddress"], "GWALLET");
}

#[test]
fn cli_levels_places_score() {
    let output = prep_binary()
        .args(["--json", "levels", "--score", "753"])
        .output()
        .expect("failed to execute prep levels");
    let info = stdout_json(&output);
    assert_eq!(info["level"], 2);
    assert_eq!(info["rank"], "Explorer");
}

#[test]
fn cli_raw_request() {
    let dir = tempfile::tempdir().unwrap();
    let response = stdout_json(&prep(
        dir.path(),
        &["request", r#"{"action":"canCheckIn","uid":"p1"}"#],
    ));
    assert_eq!(response["canCheckIn"], true);
    assert_eq!(response["currentStreak"], 0);
}
