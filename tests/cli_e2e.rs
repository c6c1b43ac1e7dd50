//! End-to-end tests for the binary's startup behavior.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_missing_watch_folder_is_fatal() {
    let mut cmd = Command::cargo_bin("torbox-watch").unwrap();
    cmd.env_remove("TORBOX_WATCH_FOLDER")
        .env_remove("TORBOX_API_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TORBOX_WATCH_FOLDER"));
}

#[test]
fn test_missing_api_key_is_fatal() {
    let mut cmd = Command::cargo_bin("torbox-watch").unwrap();
    cmd.env("TORBOX_WATCH_FOLDER", "/tmp/watch")
        .env_remove("TORBOX_API_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TORBOX_API_KEY"));
}

#[test]
fn test_invalid_api_base_is_fatal() {
    let mut cmd = Command::cargo_bin("torbox-watch").unwrap();
    cmd.env("TORBOX_WATCH_FOLDER", "/tmp/watch")
        .env("TORBOX_API_KEY", "key")
        .env("TORBOX_API_BASE", "not a url")
        .assert()
        .failure()
        .stderr(predicate::str::contains("API base"));
}

#[test]
fn test_help_prints_usage_without_config() {
    let mut cmd = Command::cargo_bin("torbox-watch").unwrap();
    cmd.env_remove("TORBOX_WATCH_FOLDER")
        .env_remove("TORBOX_API_KEY")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--workers"));
}

#[test]
fn test_invalid_worker_flag_rejected_before_startup() {
    let mut cmd = Command::cargo_bin("torbox-watch").unwrap();
    cmd.args(["--workers", "0"]).assert().failure();
}
