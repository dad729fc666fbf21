//! Integration tests for the bmi binary.
//!
//! These tests verify end-to-end behavior including:
//! - Calculation and session persistence
//! - Consent handling and the local retry queue
//! - Reset and queue maintenance commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("bmi"))
}

/// Write a config file so tests never read the user's own config
fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, contents).expect("Failed to write config");
    path
}

/// Config pointing at a port nothing listens on, with short timeouts
fn unreachable_config(dir: &Path) -> PathBuf {
    write_config(
        dir,
        r#"
[submission]
endpoint = "http://127.0.0.1:9/exec"
pixel_timeout_secs = 1
fetch_timeout_secs = 1
sync_on_start = false
"#,
    )
}

fn pending_queue(data_dir: &Path) -> Vec<serde_json::Value> {
    let path = data_dir.join("local/bmi_pending_submissions.json");
    let contents = fs::read_to_string(path).expect("Failed to read queue");
    serde_json::from_str(&contents).expect("Queue is not valid JSON")
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("BMI calculator"));
}

#[test]
fn test_calc_without_consent_saves_session() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let config = write_config(temp_dir.path(), "");

    cli()
        .args(["calc", "--height", "170", "--weight", "65", "--no-consent"])
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("BMI 22.5"))
        .stdout(predicate::str::contains("Normal Weight"))
        .stdout(predicate::str::contains("Opted out of data collection"));

    let record = fs::read_to_string(data_dir.join("session/bmiData.json"))
        .expect("Session record missing");
    assert!(record.contains("\"consent\":false"));
    assert!(data_dir.join("session/bmiTimestamp.json").exists());
    // Nothing is queued without consent
    assert!(!data_dir.join("local/bmi_pending_submissions.json").exists());
}

#[test]
fn test_calc_json_output() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let config = write_config(temp_dir.path(), "");

    let output = cli()
        .args(["calc", "--height", "170", "--weight", "80", "--no-consent", "--json"])
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config)
        .output()
        .expect("Failed to run bmi");
    assert!(output.status.success());

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output is not JSON");
    assert_eq!(value["record"]["result"]["bmi"], 27.7);
    assert_eq!(value["record"]["result"]["category"], "overweight");
    assert_eq!(value["record"]["time_estimate"]["direction"], "reduce");
    assert_eq!(value["submission"]["success"], false);
}

#[test]
fn test_invalid_height_is_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let config = write_config(temp_dir.path(), "");

    cli()
        .args(["calc", "--height", "300", "--weight", "65", "--no-consent"])
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure();

    assert!(!data_dir.join("session/bmiData.json").exists());
}

#[test]
fn test_show_without_data_fails() {
    let temp_dir = setup_test_dir();
    let config = write_config(temp_dir.path(), "");

    cli()
        .arg("show")
        .arg("--data-dir")
        .arg(temp_dir.path().join("data"))
        .arg("--config")
        .arg(&config)
        .assert()
        .failure();
}

#[test]
fn test_show_after_calc() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let config = write_config(temp_dir.path(), "");

    cli()
        .args(["calc", "--height", "160", "--weight", "45", "--no-consent"])
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    cli()
        .arg("show")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Underweight"))
        .stdout(predicate::str::contains("Weight change needed"));
}

#[test]
fn test_reset_clears_session() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let config = write_config(temp_dir.path(), "");

    cli()
        .args(["calc", "--height", "170", "--weight", "65", "--no-consent"])
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
    assert!(data_dir.join("session/bmiData.json").exists());

    cli()
        .arg("reset")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Data cleared"));

    assert!(!data_dir.join("session/bmiData.json").exists());
    assert!(!data_dir.join("session/bmiTimestamp.json").exists());
}

#[test]
fn test_queue_list_when_empty() {
    let temp_dir = setup_test_dir();
    let config = write_config(temp_dir.path(), "");

    cli()
        .args(["queue", "list"])
        .arg("--data-dir")
        .arg(temp_dir.path().join("data"))
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending submissions"));
}

#[test]
fn test_unconfigured_endpoint_is_reported() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let config = write_config(temp_dir.path(), "");

    cli()
        .args(["calc", "--height", "170", "--weight", "65"])
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Submission endpoint not configured"));

    assert!(!data_dir.join("local/bmi_pending_submissions.json").exists());
}

#[test]
fn test_unreachable_endpoint_queues_then_clear() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let config = unreachable_config(temp_dir.path());

    cli()
        .args(["calc", "--height", "170", "--weight", "65"])
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Data saved locally"));

    let queue = pending_queue(&data_dir);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["bmi"], "22.5");
    assert_eq!(queue[0]["attempts"], 0);

    cli()
        .args(["queue", "list"])
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 submissions pending"));

    let csv_path = temp_dir.path().join("pending.csv");
    cli()
        .args(["queue", "export", "--output"])
        .arg(&csv_path)
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 pending submissions"));
    assert_eq!(fs::read_to_string(&csv_path).unwrap().lines().count(), 2);

    cli()
        .args(["queue", "clear"])
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert!(!data_dir.join("local/bmi_pending_submissions.json").exists());
}

#[test]
fn test_sync_counts_failed_attempts() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let config = unreachable_config(temp_dir.path());

    cli()
        .args(["calc", "--height", "170", "--weight", "65"])
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    cli()
        .arg("sync")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 will be retried later"));

    let queue = pending_queue(&data_dir);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["attempts"], 1);
}

#[test]
fn test_submit_prints_tagged_url() {
    let temp_dir = setup_test_dir();
    let config = unreachable_config(temp_dir.path());

    cli()
        .arg("test-submit")
        .arg("--data-dir")
        .arg(temp_dir.path().join("data"))
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Direct test URL: http://127.0.0.1:9/exec?"))
        .stdout(predicate::str::contains("height=170"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = setup_test_dir();
    let config = write_config(temp_dir.path(), "[goal]\ntarget_bmi = 30.0\n");

    cli()
        .args(["queue", "list"])
        .arg("--data-dir")
        .arg(temp_dir.path().join("data"))
        .arg("--config")
        .arg(&config)
        .assert()
        .failure();
}
