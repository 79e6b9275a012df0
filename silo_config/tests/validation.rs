use rstest::rstest;
use silo_config::{Config, load_toml};

#[test]
fn default_config_passes_validation() {
    let cfg = Config::default();
    cfg.validate().expect("built-in defaults should be valid");
    assert_eq!(cfg.bins.len(), 2);
    assert_eq!(cfg.bins[0].name, "Bin 1");
    assert_eq!(cfg.system.elevator_speed_tph, 180.0);
}

#[test]
fn parses_a_full_config_file() {
    let toml = r#"
[system]
elevator_speed_tph = 200.0
tons_per_foot = 20.0
tons_per_trailer = 28.0
tons_per_wagon = 45.0

[notifications]
enabled = true
threshold_feet = 12.0
cooldown_minutes = 15.0
require_interaction = false
sound_enabled = false

[[bin]]
id = 1
name = "North Silo"
grain_type = "Barley"
max_capacity_feet = 110.0

[[bin]]
id = 2
name = "South Silo"
grain_type = "Canola"
max_capacity_feet = 95.0

[runner]
tick_ms = 500
flush_ms = 2000

[logging]
file = "silo.log"
level = "debug"
rotation = "daily"
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.system.tons_per_foot, 20.0);
    assert_eq!(cfg.notifications.threshold_feet, 12.0);
    assert_eq!(cfg.bins[1].name, "South Silo");
    assert_eq!(cfg.runner.tick_ms, 500);
    assert_eq!(cfg.logging.rotation.as_deref(), Some("daily"));
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let toml = r#"
[[bin]]
id = 7
name = "Lone Bin"
grain_type = "Wheat H2"
max_capacity_feet = 130.0
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.system.tons_per_foot, 25.0);
    assert_eq!(cfg.runner.flush_ms, 5_000);
    assert_eq!(cfg.bins.len(), 1);
}

#[rstest]
#[case("tons_per_foot = 0.0", "tons_per_foot must be > 0")]
#[case("tons_per_foot = -3.0", "tons_per_foot must be > 0")]
#[case("elevator_speed_tph = 0.0", "elevator_speed_tph must be > 0")]
#[case("tons_per_trailer = 0.0", "tons_per_trailer must be > 0")]
#[case("tons_per_wagon = -1.0", "tons_per_wagon must be > 0")]
fn rejects_nonpositive_system_values(#[case] line: &str, #[case] message: &str) {
    let toml = format!(
        r#"
[system]
{line}

[[bin]]
id = 1
name = "Bin 1"
grain_type = "Wheat H2"
max_capacity_feet = 130.0
"#
    );
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject bad system value");
    assert!(format!("{err}").contains(message));
}

#[test]
fn rejects_duplicate_bin_ids() {
    let toml = r#"
[[bin]]
id = 1
name = "Bin 1"
grain_type = "Wheat H2"
max_capacity_feet = 130.0

[[bin]]
id = 1
name = "Bin 1 again"
grain_type = "Wheat H2"
max_capacity_feet = 130.0
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject duplicate ids");
    assert!(format!("{err}").contains("bin ids must be unique"));
}

#[test]
fn rejects_empty_bin_names_and_grain_types() {
    let toml = r#"
[[bin]]
id = 3
name = "  "
grain_type = "Wheat H2"
max_capacity_feet = 130.0
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject blank name");
    assert!(format!("{err}").contains("empty name"));
}

#[test]
fn rejects_negative_notification_threshold() {
    let toml = r#"
[notifications]
threshold_feet = -1.0

[[bin]]
id = 1
name = "Bin 1"
grain_type = "Wheat H2"
max_capacity_feet = 130.0
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject negative threshold");
    assert!(format!("{err}").contains("threshold_feet must be >= 0"));
}

#[test]
fn rejects_zero_runner_periods() {
    let toml = r#"
[[bin]]
id = 1
name = "Bin 1"
grain_type = "Wheat H2"
max_capacity_feet = 130.0

[runner]
tick_ms = 0
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject tick_ms=0");
    assert!(format!("{err}").contains("tick_ms must be >= 1"));
}
