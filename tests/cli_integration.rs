//! CLI integration tests
//!
//! These tests verify the command-line interface behavior, including:
//! - Positional request arguments
//! - JSON report on stdout
//! - Exit codes

use component_detection::error::DetectionError;
use component_detection::{
    DetectionOutcome, DetectionResult, FileResultSink, ResultRecord, ResultSink,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper to get the path to the component-detection binary
fn detector_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_component-detection"))
}

fn run(args: &[&str], scratch: &Path, results: &Path) -> Output {
    Command::new(detector_bin())
        .args(args)
        .env("DETECTOR_SCRATCH_DIR", scratch)
        .env("DETECTOR_RESULT_DIR", results)
        .env_remove("DETECTOR_LOG_LEVEL")
        .env_remove("DETECTOR_DEVFILE_TIMEOUT")
        .env_remove("DETECTOR_REGISTRY_TIMEOUT")
        .output()
        .expect("Failed to execute component-detection")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({}): {}",
            e,
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn test_cli_help() {
    let output = Command::new(detector_bin())
        .arg("--help")
        .output()
        .expect("Failed to execute component-detection");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("detect"));
    assert!(stdout.contains("show"));
}

#[test]
fn test_detect_requires_all_positionals() {
    let dirs = TempDir::new().unwrap();
    let output = run(&["detect", "", "ns", "app"], dirs.path(), dirs.path());

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_detect_invalid_url_reports_and_publishes() {
    let scratch = TempDir::new().unwrap();
    let results = TempDir::new().unwrap();

    let output = run(
        &[
            "-q",
            "detect",
            "\"ghp_cliT0ken\"",
            "ns",
            "app",
            "./",
            "",
            "",
            "ftp://example.com/testorg/app",
            "",
            "",
            "false",
            "false",
        ],
        scratch.path(),
        results.path(),
    );

    assert_eq!(output.status.code(), Some(1));
    let report = stdout_json(&output);
    assert!(report["errorMap"]["InvalidURL"].is_string());
    assert_eq!(report["devfileUrls"], serde_json::json!({}));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("ghp_cliT0ken"));
    assert!(!String::from_utf8_lossy(&output.stderr).contains("ghp_cliT0ken"));

    assert!(results.path().join("ns").join("app.json").is_file());
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn test_detect_without_result_record() {
    let scratch = TempDir::new().unwrap();
    let results = TempDir::new().unwrap();

    let output = run(
        &[
            "-q",
            "detect",
            "",
            "ns",
            "app",
            "",
            "",
            "",
            "not a url",
            "",
            "",
            "false",
            "false",
            "--no-result-record",
        ],
        scratch.path(),
        results.path(),
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout_json(&output)["errorMap"]["InvalidURL"].is_string());
    assert!(!results.path().join("ns").exists());
}

#[test]
fn test_invalid_config_exits_with_2() {
    let dirs = TempDir::new().unwrap();
    let output = Command::new(detector_bin())
        .args(["show", "ns", "app"])
        .env("DETECTOR_RESULT_DIR", dirs.path())
        .env("DETECTOR_DEVFILE_TIMEOUT", "60")
        .output()
        .expect("Failed to execute component-detection");

    assert_eq!(output.status.code(), Some(2));
}

#[tokio::test]
async fn test_show_prints_published_record() {
    let results = TempDir::new().unwrap();

    let mut result = DetectionResult::new("main");
    result
        .devfile_urls
        .insert("./".into(), "https://registry.devfile.io/devfiles/python-basic".into());
    result.devfiles.insert("./".into(), "schemaVersion: 2.2.0\n".into());
    result.ports.insert("./".into(), vec![8081]);
    let outcome = DetectionOutcome {
        result,
        error: Some(DetectionError::no_dockerfile("./")),
    };
    let record = ResultRecord::from_outcome("app", "ns", &outcome).unwrap();
    FileResultSink::new(results.path())
        .publish(&record)
        .await
        .unwrap();

    let output = run(&["show", "ns", "app"], results.path(), results.path());
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["revision"], "main");
    assert_eq!(
        report["devfileUrls"]["./"],
        "https://registry.devfile.io/devfiles/python-basic"
    );
    assert_eq!(report["ports"]["./"], serde_json::json!([8081]));
    assert!(report["errorMap"]["NoDockerfileFound"].is_string());
}

#[test]
fn test_show_missing_record() {
    let results = TempDir::new().unwrap();
    let output = run(&["show", "ns", "absent"], results.path(), results.path());
    assert_eq!(output.status.code(), Some(1));
}
