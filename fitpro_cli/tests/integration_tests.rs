//! Integration tests for the fitpro binary.
//!
//! These tests verify end-to-end behavior including:
//! - Nutrition output (text and JSON)
//! - Workout logging to the WAL
//! - Meal logging
//! - CSV rollup and history

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI command isolated from the user's config file
fn cli(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fitpro"));
    cmd.env("XDG_CONFIG_HOME", temp_dir.path().join("config"));
    cmd.arg("--data-dir").arg(temp_dir.path().join("data"));
    cmd
}

fn run_workout(temp_dir: &TempDir) {
    cli(temp_dir)
        .args([
            "workout",
            "--exercise",
            "squat:2x5@100",
            "--exercise",
            "pullup:1x8",
            "--rest",
            "3",
            "--auto-complete",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Session logged"));
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("FIT PRO coaching toolkit"));
}

#[test]
fn test_energy_json() {
    let temp_dir = setup_test_dir();
    let output = cli(&temp_dir)
        .args([
            "energy", "--weight", "80", "--height", "180", "--age", "30", "--sex", "male",
            "--body-fat", "20", "--activity", "1.2", "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["method"], "tinsley_lbm");
    let get = value["get"].as_f64().unwrap();
    assert!((get - 1903.2).abs() < 1e-6);
}

#[test]
fn test_energy_rejects_invalid_body_fat() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .args([
            "energy", "--weight", "80", "--height", "180", "--age", "30", "--sex", "female",
            "--body-fat", "100",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidInput"));
}

#[test]
fn test_macros_text_output() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .args([
            "macros",
            "--calories",
            "2500",
            "--weight",
            "80",
            "--goal",
            "hipertrofia",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hypertrophy"))
        .stdout(predicate::str::contains("285.0 g"));
}

#[test]
fn test_macros_flags_infeasible_plan() {
    let temp_dir = setup_test_dir();
    let output = cli(&temp_dir)
        .args([
            "macros",
            "--calories",
            "1200",
            "--weight",
            "100",
            "--goal",
            "emagrecimento",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["feasible"], false);
    assert!(value["carbs"]["grams"].as_f64().unwrap() < 0.0);
}

#[test]
fn test_workout_logged_to_wal() {
    let temp_dir = setup_test_dir();
    run_workout(&temp_dir);

    let wal_path = temp_dir.path().join("data/wal/workout_sessions.wal");
    let content = fs::read_to_string(&wal_path).expect("Failed to read WAL");
    assert_eq!(content.lines().count(), 1);

    let record: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(record["exercises"][0]["exercise_id"], "squat");
    assert_eq!(record["exercises"][1]["sets"][0]["actual_reps"], 8);
    // Two rests of 3s: between the squat sets and before pullups
    assert_eq!(record["elapsed_seconds"], 6);
    assert!(record.get("status").is_none());
}

#[test]
fn test_workout_dry_run_does_not_log() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .args([
            "workout",
            "--exercise",
            "row:1x12@40",
            "--auto-complete",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert!(!temp_dir.path().join("data/wal/workout_sessions.wal").exists());
}

#[test]
fn test_workout_rejects_bad_exercise_format() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .args(["workout", "--exercise", "squat", "--auto-complete"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SETSxREPS"));
}

#[test]
fn test_workout_rejects_zero_rest_before_starting() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .args([
            "workout",
            "--exercise",
            "squat:2x5@60",
            "--rest",
            "0",
            "--auto-complete",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Set 1").not());

    assert!(!temp_dir.path().join("data/wal/workout_sessions.wal").exists());
}

#[test]
fn test_workout_rejects_non_finite_weight() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .args(["workout", "--exercise", "squat:1x5@NaN", "--auto-complete"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-negative"));

    assert!(!temp_dir.path().join("data/wal/workout_sessions.wal").exists());
}

#[test]
fn test_meal_logged() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .args([
            "meal",
            "--student",
            "stu-7",
            "--name",
            "Almoço",
            "--notes",
            "trocou arroz por batata",
            "--photo-ext",
            "JPG",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Photo storage key: stu-7/"))
        .stdout(predicate::str::contains(".jpg"));

    let content =
        fs::read_to_string(temp_dir.path().join("data/wal/meal_logs.wal")).expect("meal WAL");
    let log: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(log["student_id"], "stu-7");
    assert_eq!(log["meal_name"], "Almoço");
    assert!(log["meal_plan_id"].is_null());
}

#[test]
fn test_rollup_creates_csv() {
    let temp_dir = setup_test_dir();
    for _ in 0..2 {
        run_workout(&temp_dir);
    }

    cli(&temp_dir)
        .args(["rollup", "--cleanup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 2 sessions"));

    let csv_content =
        fs::read_to_string(temp_dir.path().join("data/sessions.csv")).expect("Failed to read CSV");
    assert!(csv_content.starts_with("session_id,"));
    // header + 2 sessions x 3 sets
    assert_eq!(csv_content.lines().count(), 7);
    assert!(!temp_dir
        .path()
        .join("data/wal/workout_sessions.wal.processed")
        .exists());
}

#[test]
fn test_rollup_without_wal() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .arg("rollup")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to roll up"));
}

#[test]
fn test_history_lists_recent_sessions() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions"));

    run_workout(&temp_dir);

    cli(&temp_dir)
        .args(["history", "--days", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("squat, pullup"))
        .stdout(predicate::str::contains("1 sessions, 3 sets, 1000.0 kg"));
}
