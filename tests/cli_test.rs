//! Binary tests
//!
//! Runs the built `boq-tagger` executable on commands that never reach the
//! AI CLI. HOME points at a scratch dir so the user config is not read.

use rust_xlsxwriter::Workbook;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn boq_tagger(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_boq-tagger"))
        .args(args)
        .env("HOME", home)
        .env_remove("BOQ_TAGGER_PROVIDER")
        .env_remove("BOQ_TAGGER_MODEL")
        .output()
        .expect("failed to run boq-tagger")
}

fn write_tag_map(dir: &Path) -> String {
    let path = dir.join("tags.csv");
    std::fs::write(&path, "raw_tag,suggested_allowed_trade\nCONC-100,Concrete + Formwork\n").unwrap();
    path.display().to_string()
}

#[test]
fn test_extract_prints_work_items() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("boq.xlsx");
    let mut book = Workbook::new();
    let sheet = book.add_worksheet();
    sheet.write_string(0, 1, "CONCRETE WORKS").unwrap();
    sheet.write_string(1, 1, "Columns").unwrap();
    sheet.write_number(1, 2, 12.0).unwrap();
    book.save(&path).unwrap();

    let output = boq_tagger(dir.path(), &["extract", path.to_str().unwrap(), "--strategy", "positional"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(items[0]["description"], "CONCRETE WORKS | Columns");
    assert_eq!(items[0]["row"], 2);
}

#[test]
fn test_score_prints_summary() {
    let dir = tempdir().expect("Failed to create temp dir");
    let tag_map = write_tag_map(dir.path());
    let predictions = dir.path().join("predictions_Tower.json");
    std::fs::write(
        &predictions,
        r#"[
  {"file": "Tower.xlsx", "sheet": "Bill 1", "row": 2, "item": "CONC-100 columns", "predicted_tag": "Concrete + Formwork"},
  {"file": "Tower.xlsx", "sheet": "Bill 1", "row": 3, "item": "Sundries", "predicted_tag": "General / Preliminaries"}
]"#,
    )
    .unwrap();

    let output = boq_tagger(
        dir.path(),
        &["score", predictions.to_str().unwrap(), "--tag-map", &tag_map],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total Trades: 1, Correctly Classified: 1, Accuracy: 100.00%"));
}

#[test]
fn test_run_without_workbooks_exits_with_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let tag_map = write_tag_map(dir.path());
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();

    let output = boq_tagger(
        dir.path(),
        &["run", "--data-dir", data.to_str().unwrap(), "--tag-map", &tag_map],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error: No input workbooks found"));
}

#[test]
fn test_run_with_missing_tag_map_exits_with_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let missing = dir.path().join("missing.csv");

    let output = boq_tagger(dir.path(), &["run", "--tag-map", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("File not found"));
}

#[test]
fn test_config_show_uses_defaults() {
    let dir = tempdir().expect("Failed to create temp dir");

    let output = boq_tagger(dir.path(), &["config", "--show"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Provider: claude"));
    assert!(stdout.contains("Attempts: 3"));
}

#[test]
fn test_cache_info_without_cache_file() {
    let dir = tempdir().expect("Failed to create temp dir");

    let output = boq_tagger(dir.path(), &["cache", "--info", "--folder", dir.path().to_str().unwrap()]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No cache file"));
}
