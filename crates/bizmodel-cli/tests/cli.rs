//! CLI integration tests
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Workbook written / plan or months printed |
//! | 1 | Unreadable or invalid configuration |
//! | 2 | Bad arguments |

use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn bizmodel(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bizmodel"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("BIZMODEL_CURRENCY")
        .output()
        .expect("failed to execute bizmodel")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn generate_writes_xlsx() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("model.xlsx");
    let config = fixture("saas.json");

    let output = bizmodel(&[
        "generate",
        config.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--currency",
        "$",
        "--start-date",
        "2025-01-01",
    ]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let bytes = std::fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"PK"));
    assert!(stdout(&output).contains("model.xlsx"));
}

#[test]
fn generate_handles_empty_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("empty.xlsx");
    let config = fixture("empty.json");

    let output = bizmodel(&["generate", config.to_str().unwrap(), "-o", out.to_str().unwrap()]);

    assert!(output.status.success());
    assert!(out.exists());
}

#[test]
fn invalid_configuration_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("never.xlsx");
    let config = fixture("missing_model.json");

    let output = bizmodel(&["generate", config.to_str().unwrap(), "-o", out.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("salesModel"));
    assert!(!out.exists(), "no partial workbook");
}

#[test]
fn missing_file_exits_1() {
    let output = bizmodel(&["generate", "/nonexistent/config.json"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn months_prints_48_labels() {
    let output = bizmodel(&["months", "--start-date", "2025-01-01"]);
    assert!(output.status.success());

    let text = stdout(&output);
    let labels: Vec<&str> = text.lines().collect();
    assert_eq!(labels.len(), 48);
    assert_eq!(labels[0], "Jan 2025");
    assert_eq!(labels[2], "Mar 2025");
}

#[test]
fn bad_start_date_is_a_usage_error() {
    let output = bizmodel(&["months", "--start-date", "01/02/2025"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn plan_prints_sheet_json() {
    let config = fixture("saas.json");
    let output = bizmodel(&[
        "plan",
        config.to_str().unwrap(),
        "--sheet",
        "Staff",
        "--start-date",
        "2025-01-01",
    ]);
    assert!(output.status.success());

    let sheet: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(sheet["name"], "Staff");
    assert_eq!(sheet["freeze_at"]["row"], 2);
    assert_eq!(sheet["validations"].as_array().unwrap().len(), 4);
}

#[test]
fn plan_rejects_unknown_sheet() {
    let config = fixture("saas.json");
    let output = bizmodel(&["plan", config.to_str().unwrap(), "--sheet", "Cash Flow"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Non-Staff"));
}
