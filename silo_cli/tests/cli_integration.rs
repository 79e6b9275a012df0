use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[system]
elevator_speed_tph = 180.0
tons_per_foot = 25.0
tons_per_trailer = 30.0
tons_per_wagon = 50.0

[notifications]
enabled = true
threshold_feet = 10.0
cooldown_minutes = 30.0

[[bin]]
id = 1
name = "Bin 1"
grain_type = "Wheat H2"
max_capacity_feet = 130.0

[[bin]]
id = 2
name = "Bin 2"
grain_type = "Wheat APH2"
max_capacity_feet = 130.0

[runner]
tick_ms = 50
flush_ms = 100
"#;
    let path = dir.path().join("silo.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn silo_cmd(dir: &tempfile::TempDir, config: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("silo").unwrap();
    cmd.arg("--config")
        .arg(config)
        .arg("--data-dir")
        .arg(dir.path().join("data"));
    cmd
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("silo")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn status_shows_configured_bins_on_first_run() {
    let dir = tempdir().unwrap();
    let config = write_valid_config(&dir);
    silo_cmd(&dir, &config)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bin 1"))
        .stdout(predicate::str::contains("Bin 2"))
        .stdout(predicate::str::contains("idle"));
}

#[test]
fn missing_config_falls_back_to_builtin_defaults() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("does-not-exist.toml");
    silo_cmd(&dir, &config)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bin 1"));
}

#[test]
fn fill_persists_across_invocations() {
    let dir = tempdir().unwrap();
    let config = write_valid_config(&dir);

    // 100 ft of headspace measured -> 30 ft of fill.
    silo_cmd(&dir, &config)
        .args(["fill", "--bin", "1", "--remaining", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("30.0/130.0 ft"));

    silo_cmd(&dir, &config)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("30.0/130.0 ft"));

    assert!(dir.path().join("data").join("bins.json").exists());
}

#[test]
fn truck_load_updates_count_and_log() {
    let dir = tempdir().unwrap();
    let config = write_valid_config(&dir);

    silo_cmd(&dir, &config)
        .args(["truck", "--bin", "1", "--trailers", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("trailers=2"));

    silo_cmd(&dir, &config)
        .args(["log", "--bin", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 2 trailer load(s)"));
}

#[test]
fn undo_reverts_the_last_operation() {
    let dir = tempdir().unwrap();
    let config = write_valid_config(&dir);

    silo_cmd(&dir, &config)
        .args(["truck", "--bin", "1"])
        .assert()
        .success();
    silo_cmd(&dir, &config)
        .args(["undo", "--bin", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.0/130.0 ft"))
        .stdout(predicate::str::contains("trailers=0"));
}

#[rstest]
#[case(&["inload", "--bin", "1", "--tons", "0"], "positive")]
#[case(&["outload", "--bin", "1", "--tons=-5"], "positive")]
#[case(&["truck", "--bin", "1", "--trailers", "0"], "at least 1")]
#[case(&["grain", "--bin", "1", "--type", "  "], "must not be empty")]
fn invalid_inputs_reject_without_mutating(#[case] args: &[&str], #[case] message: &str) {
    let dir = tempdir().unwrap();
    let config = write_valid_config(&dir);

    silo_cmd(&dir, &config)
        .args(args)
        .assert()
        .failure()
        .stderr(predicate::str::contains(message));

    // The rejected operation never reached the store.
    assert!(!dir.path().join("data").join("bins.json").exists());
}

#[test]
fn unknown_bin_fails_with_an_error() {
    let dir = tempdir().unwrap();
    let config = write_valid_config(&dir);
    silo_cmd(&dir, &config)
        .args(["start", "--bin", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("99"));
}

#[test]
fn grain_change_shows_in_status_and_log() {
    let dir = tempdir().unwrap();
    let config = write_valid_config(&dir);

    silo_cmd(&dir, &config)
        .args(["grain", "--bin", "2", "--type", "Barley"])
        .assert()
        .success()
        .stdout(predicate::str::contains("grain=Barley"));

    silo_cmd(&dir, &config)
        .args(["log", "--bin", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Changed grain type from \"Wheat APH2\" to \"Barley\"",
        ));
}

#[test]
fn json_status_emits_one_object_per_bin() {
    let dir = tempdir().unwrap();
    let config = write_valid_config(&dir);

    let output = silo_cmd(&dir, &config)
        .arg("--json")
        .arg("status")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let objects: Vec<serde_json::Value> = stdout
        .lines()
        .filter(|l| l.starts_with('{'))
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0]["name"], "Bin 1");
    assert_eq!(objects[0]["metrics"]["fill_percentage"], 0.0);
}

#[test]
fn settings_update_persists_and_rescales_fill() {
    let dir = tempdir().unwrap();
    let config = write_valid_config(&dir);

    // 100 ft of headspace measured -> 30 ft / 750 t at 25 t/ft.
    silo_cmd(&dir, &config)
        .args(["fill", "--bin", "1", "--remaining", "100"])
        .assert()
        .success();

    silo_cmd(&dir, &config)
        .args(["settings", "--tons-per-foot", "20", "--elevator-tph", "240"])
        .assert()
        .success()
        .stdout(predicate::str::contains("elevator=240 tph"))
        .stdout(predicate::str::contains("ratio=20 t/ft"));

    // The new ratio outlives the invocation and rescales the stored tons.
    silo_cmd(&dir, &config)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("30.0/130.0 ft (600/2600 t"));
}

#[test]
fn settings_rejects_invalid_values_without_saving() {
    let dir = tempdir().unwrap();
    let config = write_valid_config(&dir);

    silo_cmd(&dir, &config)
        .args(["settings", "--tons-per-foot", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tons_per_foot"));

    assert!(!dir.path().join("data").join("settings.json").exists());
}

#[test]
fn run_with_duration_exits_cleanly_and_flushes() {
    let dir = tempdir().unwrap();
    let config = write_valid_config(&dir);

    // Start a fill first so the run loop has dirty state to flush.
    silo_cmd(&dir, &config)
        .args(["start", "--bin", "1"])
        .assert()
        .success();

    silo_cmd(&dir, &config)
        .args(["run", "--duration", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("filling"));

    let raw = fs::read_to_string(dir.path().join("data").join("bins.json")).unwrap();
    let bins: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    assert_eq!(bins[0]["is_filling"], true);
}

#[test]
fn test_alert_prints_through_the_sink() {
    let dir = tempdir().unwrap();
    let config = write_valid_config(&dir);
    silo_cmd(&dir, &config)
        .arg("test-alert")
        .assert()
        .success()
        .stdout(predicate::str::contains("Test Notification"));
}
