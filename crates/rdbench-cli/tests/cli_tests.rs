//! Integration tests for the `rdbench` binary.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn fixture_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("suite")
        .join("rdbench.toml")
}

fn rdbench() -> Command {
    Command::cargo_bin("rdbench").expect("failed to find rdbench binary")
}

fn read_workbook(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("read workbook");
    serde_json::from_str(&text).expect("parse workbook")
}

fn sheet<'a>(workbook: &'a Value, name: &str) -> &'a Value {
    workbook["sheets"]
        .as_array()
        .and_then(|sheets| sheets.iter().find(|s| s["name"] == name))
        .unwrap_or_else(|| panic!("no sheet {name}"))
}

fn cell_value<'a>(sheet: &'a Value, row: u64, column: u64) -> Option<&'a Value> {
    sheet["cells"]
        .as_array()?
        .iter()
        .find(|c| c["row"] == row && c["column"] == column)
        .map(|c| &c["value"]["value"])
}

/// Copy the fixture suite somewhere writable.
fn copy_suite(dest: &Path) -> PathBuf {
    let src = fixture_config();
    let src_dir = src.parent().unwrap();
    fs::create_dir_all(dest.join("results")).unwrap();
    for entry in fs::read_dir(src_dir.join("results")).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), dest.join("results").join(entry.file_name())).unwrap();
    }
    let config = dest.join("rdbench.toml");
    fs::copy(&src, &config).unwrap();
    config
}

#[test]
fn test_report_writes_workbook() {
    let temp_dir = tempdir().expect("failed to create temp dir");
    let out = temp_dir.path().join("nested").join("book.json");

    rdbench()
        .arg("report")
        .arg("--config")
        .arg(fixture_config())
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let workbook = read_workbook(&out);
    assert_eq!(workbook["schema"], "rdbench.workbook.v1");
    assert!(workbook["generated_at"].is_string());

    let names: Vec<&str> = workbook["sheets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["x265_slow", "x265_medium", "BDBRMatrix", "Anchor_list", "Curve_chart"]
    );
    assert_eq!(workbook["active"], 4);

    let raw = sheet(&workbook, "x265_slow");
    assert_eq!(
        cell_value(raw, 5, 1),
        Some(&Value::from("BasketballDrive @ scale 1080p"))
    );
    assert_eq!(cell_value(raw, 1, 3), Some(&Value::from("QP 22")));

    let anchor = sheet(&workbook, "Anchor_list");
    assert_eq!(
        cell_value(anchor, 5, 7),
        Some(&Value::from(
            "=AVERAGE('x265_slow'!C5,'x265_slow'!J5,'x265_slow'!Q5,'x265_slow'!X5)/AVERAGE('x265_medium'!C5,'x265_medium'!J5,'x265_medium'!Q5,'x265_medium'!X5)"
        ))
    );
}

#[test]
fn test_report_pretty_output() {
    let temp_dir = tempdir().expect("failed to create temp dir");
    let out = temp_dir.path().join("book.json");

    rdbench()
        .args(["report", "--pretty", "--config"])
        .arg(fixture_config())
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("\n  \"sheets\""));
}

#[test]
fn test_report_default_output_next_to_config() {
    let temp_dir = tempdir().expect("failed to create temp dir");
    let config = copy_suite(temp_dir.path());

    rdbench()
        .arg("report")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert!(temp_dir.path().join("fixture.workbook.json").exists());
}

#[test]
fn test_report_fails_without_output_on_bad_filter() {
    let temp_dir = tempdir().expect("failed to create temp dir");
    let config = copy_suite(temp_dir.path());
    let mut text = fs::read_to_string(&config).unwrap();
    text.push_str("\n[[summary]]\nkind = \"curve_chart\"\nfilter = \"(\"\n");
    fs::write(&config, text).unwrap();
    let out = temp_dir.path().join("book.json");

    rdbench()
        .arg("report")
        .arg("--config")
        .arg(&config)
        .arg("--out")
        .arg(&out)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid series filter"));

    assert!(!out.exists());
}

#[test]
fn test_report_unknown_combination_member() {
    let temp_dir = tempdir().expect("failed to create temp dir");
    let config = copy_suite(temp_dir.path());
    let text = fs::read_to_string(&config).unwrap();
    fs::write(
        &config,
        format!("combi = [[\"x265_slow\", \"x264\"]]\n{text}"),
    )
    .unwrap();

    rdbench()
        .arg("report")
        .arg("--config")
        .arg(&config)
        .arg("--out")
        .arg(temp_dir.path().join("book.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown test \"x264\""));
}

#[test]
fn test_missing_config_reports_path() {
    rdbench()
        .args(["report", "--config", "does/not/exist.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does/not/exist.toml"));
}

#[test]
fn test_export_csv_to_stdout() {
    rdbench()
        .arg("export")
        .arg("--config")
        .arg(fixture_config())
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "test,sequence,quality,layer,bits,bitrate,time,psnr_y,psnr_u,psnr_v,psnr_avg\n",
        ))
        .stdout(predicate::str::contains("x265_medium,Cactus,22,total,12000.000000,"));
}

#[test]
fn test_export_jsonl_to_file() {
    let temp_dir = tempdir().expect("failed to create temp dir");
    let out = temp_dir.path().join("rows.jsonl");

    rdbench()
        .arg("export")
        .arg("--config")
        .arg(fixture_config())
        .args(["--format", "jsonl", "--out"])
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    let rows: Vec<Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    // 2 tests x 2 sequences x 4 quality points.
    assert_eq!(rows.len(), 16);
    assert_eq!(rows[0]["test"], "x265_medium");
}

#[test]
fn test_export_rejects_unknown_format() {
    rdbench()
        .arg("export")
        .arg("--config")
        .arg(fixture_config())
        .args(["--format", "xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown export format"));
}

#[test]
fn test_md_digest_to_stdout() {
    rdbench()
        .arg("md")
        .arg("--config")
        .arg(fixture_config())
        .assert()
        .success()
        .stdout(predicate::str::contains("rdbench: `fixture`"))
        .stdout(predicate::str::contains("| `x265_slow` | x265_slow | 1080p | 2 |"))
        .stdout(predicate::str::contains("**Sequences:** BasketballDrive, Cactus"))
        .stdout(predicate::str::contains("- Anchor_list"));
}
