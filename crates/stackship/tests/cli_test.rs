#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! migration

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("ship").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("setup"))
        .stdout(predicate::str::contains("monitor"))
        .stdout(predicate::str::contains("cleanup"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("packages"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("ship").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stackship"));
}

#[test]
fn test_setup_help() {
    let mut cmd = Command::cargo_bin("ship").unwrap();
    cmd.arg("setup")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--no-emulator"))
        .stdout(predicate::str::contains("--endpoint"));
}

#[test]
fn test_monitor_help() {
    let mut cmd = Command::cargo_bin("ship").unwrap();
    cmd.arg("monitor")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--once"))
        .stdout(predicate::str::contains("--interval"));
}

#[test]
fn test_cleanup_help() {
    let mut cmd = Command::cargo_bin("ship").unwrap();
    cmd.arg("cleanup")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"))
        .stdout(predicate::str::contains("--keep-emulator"));
}

#[test]
fn test_logs_help() {
    let mut cmd = Command::cargo_bin("ship").unwrap();
    cmd.arg("logs")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--follow"))
        .stdout(predicate::str::contains("--tail"));
}

#[test]
fn test_serve_help() {
    let mut cmd = Command::cargo_bin("ship").unwrap();
    cmd.arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--no-open"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("ship").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

/// serve outside the workshop directory reports the missing demo page
/// instead of binding a port.
#[test]
fn test_serve_without_demo_page() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("ship").unwrap();
    cmd.current_dir(dir.path())
        .arg("serve")
        .arg("--no-open")
        .assert()
        .failure()
        .stderr(predicate::str::contains("demo.html"));
}

/// A sweep that leaves failures behind must exit non-zero. With no aws
/// CLI on PATH every category fails to even list.
#[test]
fn test_cleanup_with_failures_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("ship").unwrap();
    cmd.current_dir(dir.path())
        .env("PATH", "")
        .arg("cleanup")
        .arg("--force")
        .arg("--keep-emulator")
        .assert()
        .failure()
        .stdout(predicate::str::contains("failure"));
}

/// Declining the confirmation aborts the run with a non-zero exit.
#[test]
fn test_cleanup_declined_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("ship").unwrap();
    cmd.current_dir(dir.path())
        .arg("cleanup")
        .arg("--keep-emulator")
        .write_stdin("n\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("cancelled"));
}

/// The first config-touching run writes workshop.json with the defaults.
#[test]
fn test_check_creates_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("ship").unwrap();
    // check exits non-zero in a bare environment; the config write still
    // happens first.
    cmd.current_dir(dir.path())
        .env_remove("CODEPIPELINE_GH_TOKEN")
        .arg("check")
        .assert()
        .stdout(predicate::str::contains("workshop.json"));

    let config = std::fs::read_to_string(dir.path().join("workshop.json")).unwrap();
    assert!(config.contains("demo-pipeline"));
}
