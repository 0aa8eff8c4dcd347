//! End-to-end tests for the `lab` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// An API address nothing listens on.
const DEAD_API: &str = "http://127.0.0.1:9/api";

fn lab(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("lab").unwrap();
    cmd.env_remove("RUNLAB_API_URL")
        .arg("--settings")
        .arg(tmp.path().join("lab-settings.yaml"))
        .arg("--timeout")
        .arg("2");
    cmd
}

#[test]
fn test_settings_show_defaults() {
    let tmp = TempDir::new().unwrap();
    lab(&tmp)
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("compareCap: 5"))
        .stdout(predicate::str::contains("compareMetric: duration_ms"))
        .stdout(predicate::str::contains("logsLimit: 200"));
}

#[test]
fn test_settings_set_persists() {
    let tmp = TempDir::new().unwrap();
    lab(&tmp)
        .args(["settings", "set", "--compare-cap", "3", "--compare-metric", "acc"])
        .assert()
        .success();

    lab(&tmp)
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("compareCap: 3"))
        .stdout(predicate::str::contains("compareMetric: acc"))
        .stdout(predicate::str::contains("logsLimit: 200"));
}

#[test]
fn test_settings_set_requires_a_value() {
    let tmp = TempDir::new().unwrap();
    lab(&tmp)
        .args(["settings", "set"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to set"));
}

#[test]
fn test_run_rejects_malformed_params() {
    let tmp = TempDir::new().unwrap();
    lab(&tmp)
        .args(["run", "1", "--params", "{lr: 0.1", "--api-url", DEAD_API])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parameters must be valid JSON."));
}

#[test]
fn test_runs_degrade_when_api_is_down() {
    let tmp = TempDir::new().unwrap();
    lab(&tmp)
        .args(["runs", "--api-url", DEAD_API])
        .assert()
        .success()
        .stdout(predicate::str::contains("No runs found"))
        .stderr(predicate::str::contains("Failed to load runs"));
}

#[test]
fn test_compare_needs_two_runs() {
    let tmp = TempDir::new().unwrap();
    lab(&tmp)
        .args(["compare", "1", "2", "--api-url", DEAD_API])
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected: 0 (need at least 2 to compare)"));
}

#[test]
fn test_compare_cap_is_saved() {
    let tmp = TempDir::new().unwrap();
    lab(&tmp)
        .args(["compare", "1", "2", "3", "--cap", "2", "--api-url", DEAD_API])
        .assert()
        .success();

    lab(&tmp)
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("compareCap: 2"));
}
