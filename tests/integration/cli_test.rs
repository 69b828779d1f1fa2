//! CLI binary tests
//!
//! Every run gets its own HOME so the user's config is never touched.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::helpers::{fixtures_dir, load_fixture};

fn kline(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kline").unwrap();
    cmd.env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("KLINE_LOG");
    cmd
}

const IDENTITY: &[&str] = &[
    "--birth-date",
    "1990-05-12",
    "--birth-time",
    "08:30",
    "--gender",
    "male",
];

// ============================================================================
// Help
// ============================================================================

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    kline(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("config"));
}

// ============================================================================
// parse
// ============================================================================

#[test]
fn parse_prints_progress_and_table() {
    let home = TempDir::new().unwrap();
    kline(&home)
        .args(["parse", "--chunk-size", "5"])
        .arg(fixtures_dir().join("year.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("record  #1 1990 庚午"))
        .stdout(predicate::str::contains("Reconciled from authoritative parse: 4 records"))
        .stdout(predicate::str::contains("八字: 庚午 辛巳 甲子 乙亥"));
}

#[test]
fn parse_json_outputs_records() {
    let home = TempDir::new().unwrap();
    let output = kline(&home)
        .args(["parse", "--json"])
        .arg(fixtures_dir().join("month.yaml"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["source"], "authoritative");
    let records = doc["records"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["monthLabel"], "正月");
    assert_eq!(records[0]["ganZhi"], "庚寅");
}

#[test]
fn parse_without_records_fails() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("empty.yaml");
    std::fs::write(&file, "summary: nothing here\n").unwrap();

    kline(&home)
        .arg("parse")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No chart records"));
}

#[test]
fn parse_missing_file_fails() {
    let home = TempDir::new().unwrap();
    kline(&home)
        .args(["parse", "does-not-exist.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read report file"));
}

// ============================================================================
// analyze (offline replay)
// ============================================================================

#[test]
fn analyze_replay_drills_to_days() {
    let home = TempDir::new().unwrap();
    let output = kline(&home)
        .arg("analyze")
        .args(IDENTITY)
        .arg("--replay-dir")
        .arg(fixtures_dir())
        .args(["--drill-year", "1991", "--drill-month", "2", "--json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["level"], "day");
    assert_eq!(doc["drillDepth"], 2);
    assert_eq!(doc["records"].as_array().unwrap().len(), 2);
    assert_eq!(doc["tags"].as_array().unwrap().len(), 4);
}

#[test]
fn analyze_replay_prints_yearly_summary() {
    let home = TempDir::new().unwrap();
    kline(&home)
        .arg("analyze")
        .args(IDENTITY)
        .arg("--replay-dir")
        .arg(fixtures_dir())
        .assert()
        .success()
        .stdout(predicate::str::contains("财富结构 [7.5]: 中上"))
        .stdout(predicate::str::contains("1993"))
        .stderr(predicate::str::contains("+ 1990 庚午"));
}

#[test]
fn analyze_unknown_year_fails() {
    let home = TempDir::new().unwrap();
    kline(&home)
        .arg("analyze")
        .args(IDENTITY)
        .arg("--replay-dir")
        .arg(fixtures_dir())
        .args(["--drill-year", "2050"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Year 2050 is not in the report"));
}

#[test]
fn analyze_rejects_month_out_of_range() {
    let home = TempDir::new().unwrap();
    kline(&home)
        .arg("analyze")
        .args(IDENTITY)
        .args(["--drill-year", "1991", "--drill-month", "13"])
        .assert()
        .failure();
}

#[test]
fn analyze_replay_of_missing_month_report_fails() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("reports");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("year.yaml"), load_fixture("year.yaml")).unwrap();

    kline(&home)
        .arg("analyze")
        .args(IDENTITY)
        .arg("--replay-dir")
        .arg(&dir)
        .args(["--drill-year", "1991"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("404"));
}

// ============================================================================
// config
// ============================================================================

#[test]
fn config_init_then_show() {
    let home = TempDir::new().unwrap();
    kline(&home)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
    assert!(home
        .path()
        .join(".config")
        .join("kline")
        .join("config.toml")
        .exists());

    kline(&home)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    kline(&home)
        .args(["config", "init", "--force"])
        .assert()
        .success();

    kline(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[endpoint]"))
        .stdout(predicate::str::contains("records_section = \"chartPoints\""));
}

#[test]
fn config_path_points_into_home() {
    let home = TempDir::new().unwrap();
    kline(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".config"))
        .stdout(predicate::str::contains("kline"));
}
