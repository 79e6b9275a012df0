#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for the silo bin tracking system.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `Config::default()` carries the built-in fallback used when the
//!   persistence collaborator has nothing to offer: two 130 ft bins,
//!   180 t/h elevator speed, 25 t/ft, 30 t/trailer, 50 t/wagon.
use serde::Deserialize;

/// Conversion and throughput constants shared by all bins.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SystemCfg {
    /// Elevator fill rate in tons per hour.
    pub elevator_speed_tph: f64,
    /// Conversion ratio between feet of headspace and tons.
    pub tons_per_foot: f64,
    /// Size of one discrete trailer load in tons.
    pub tons_per_trailer: f64,
    /// Size of one discrete wagon load in tons.
    pub tons_per_wagon: f64,
}

impl Default for SystemCfg {
    fn default() -> Self {
        Self {
            elevator_speed_tph: 180.0,
            tons_per_foot: 25.0,
            tons_per_trailer: 30.0,
            tons_per_wagon: 50.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct NotificationsCfg {
    pub enabled: bool,
    /// Alert when remaining headspace falls to or below this many feet.
    pub threshold_feet: f64,
    /// Minimum minutes between threshold alerts for the same bin.
    pub cooldown_minutes: f64,
    /// Keep the alert visible until acknowledged.
    pub require_interaction: bool,
    pub sound_enabled: bool,
}

impl Default for NotificationsCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_feet: 10.0,
            cooldown_minutes: 30.0,
            require_interaction: true,
            sound_enabled: true,
        }
    }
}

/// One configured storage bin.
#[derive(Debug, Deserialize, Clone)]
pub struct BinCfg {
    pub id: u32,
    pub name: String,
    pub grain_type: String,
    pub max_capacity_feet: f64,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Background task cadence.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct RunnerCfg {
    /// Fill accrual tick period in milliseconds.
    pub tick_ms: u64,
    /// Persistence flush period in milliseconds.
    pub flush_ms: u64,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            tick_ms: 1_000,
            flush_ms: 5_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub system: SystemCfg,
    pub notifications: NotificationsCfg,
    #[serde(rename = "bin")]
    pub bins: Vec<BinCfg>,
    pub logging: Logging,
    pub runner: RunnerCfg,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            system: SystemCfg::default(),
            notifications: NotificationsCfg::default(),
            bins: default_bins(),
            logging: Logging::default(),
            runner: RunnerCfg::default(),
        }
    }
}

/// The built-in bin set used when no configuration or persisted state exists.
pub fn default_bins() -> Vec<BinCfg> {
    vec![
        BinCfg {
            id: 1,
            name: "Bin 1".to_string(),
            grain_type: "Wheat H2".to_string(),
            max_capacity_feet: 130.0,
        },
        BinCfg {
            id: 2,
            name: "Bin 2".to_string(),
            grain_type: "Wheat APH2".to_string(),
            max_capacity_feet: 130.0,
        },
    ]
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // System
        if !(self.system.tons_per_foot > 0.0) || !self.system.tons_per_foot.is_finite() {
            eyre::bail!("system.tons_per_foot must be > 0");
        }
        if !(self.system.elevator_speed_tph > 0.0) || !self.system.elevator_speed_tph.is_finite() {
            eyre::bail!("system.elevator_speed_tph must be > 0");
        }
        if !(self.system.tons_per_trailer > 0.0) {
            eyre::bail!("system.tons_per_trailer must be > 0");
        }
        if !(self.system.tons_per_wagon > 0.0) {
            eyre::bail!("system.tons_per_wagon must be > 0");
        }

        // Notifications
        if self.notifications.threshold_feet < 0.0 {
            eyre::bail!("notifications.threshold_feet must be >= 0");
        }
        if self.notifications.cooldown_minutes < 0.0 {
            eyre::bail!("notifications.cooldown_minutes must be >= 0");
        }

        // Bins
        if self.bins.is_empty() {
            eyre::bail!("at least one [[bin]] must be configured");
        }
        for b in &self.bins {
            if b.name.trim().is_empty() {
                eyre::bail!("bin {} has an empty name", b.id);
            }
            if b.grain_type.trim().is_empty() {
                eyre::bail!("bin {} has an empty grain_type", b.id);
            }
            if !(b.max_capacity_feet > 0.0) || !b.max_capacity_feet.is_finite() {
                eyre::bail!("bin {} max_capacity_feet must be > 0", b.id);
            }
        }
        let mut ids: Vec<u32> = self.bins.iter().map(|b| b.id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.bins.len() {
            eyre::bail!("bin ids must be unique");
        }

        // Runner
        if self.runner.tick_ms == 0 {
            eyre::bail!("runner.tick_ms must be >= 1");
        }
        if self.runner.flush_ms == 0 {
            eyre::bail!("runner.flush_ms must be >= 1");
        }

        Ok(())
    }
}
