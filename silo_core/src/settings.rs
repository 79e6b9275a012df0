//! Runtime settings shared by every bin's accrual and metric computation.
//!
//! These are the core-side counterparts of the TOML schemas in
//! `silo_config`; `conversions` bridges the two. A settings value is treated
//! as a single versioned snapshot: an accrual tick copies it once and uses
//! that copy for the whole tick.

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub threshold_feet: f64,
    pub cooldown_minutes: f64,
    pub require_interaction: bool,
    pub sound_enabled: bool,
}

impl Default for NotificationSettings {
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

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemSettings {
    /// Elevator fill rate in tons per hour.
    pub elevator_speed_tph: f64,
    /// Conversion ratio between feet and tons.
    pub tons_per_foot: f64,
    /// Size of one trailer load in tons.
    pub tons_per_trailer: f64,
    /// Size of one wagon load in tons.
    pub tons_per_wagon: f64,
    pub notifications: NotificationSettings,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            elevator_speed_tph: 180.0,
            tons_per_foot: 25.0,
            tons_per_trailer: 30.0,
            tons_per_wagon: 50.0,
            notifications: NotificationSettings::default(),
        }
    }
}

impl SystemSettings {
    /// Reject values that would poison accrual math before they are adopted.
    pub fn validate(&self) -> Result<()> {
        if !self.tons_per_foot.is_finite() || self.tons_per_foot <= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "tons_per_foot must be finite and > 0",
            )));
        }
        if !self.elevator_speed_tph.is_finite() || self.elevator_speed_tph <= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "elevator_speed_tph must be finite and > 0",
            )));
        }
        if !self.tons_per_trailer.is_finite() || self.tons_per_trailer <= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "tons_per_trailer must be finite and > 0",
            )));
        }
        if !self.tons_per_wagon.is_finite() || self.tons_per_wagon <= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "tons_per_wagon must be finite and > 0",
            )));
        }
        if !self.notifications.threshold_feet.is_finite()
            || self.notifications.threshold_feet < 0.0
        {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "notifications.threshold_feet must be >= 0",
            )));
        }
        if !self.notifications.cooldown_minutes.is_finite()
            || self.notifications.cooldown_minutes < 0.0
        {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "notifications.cooldown_minutes must be >= 0",
            )));
        }
        Ok(())
    }

    /// Tons accrued per minute at the configured elevator speed.
    #[inline]
    pub fn tons_per_minute(&self) -> f64 {
        self.elevator_speed_tph / crate::util::MINS_PER_HOUR
    }

    /// Feet accrued per minute at the configured elevator speed and ratio.
    #[inline]
    pub fn feet_per_minute(&self) -> f64 {
        self.tons_per_minute() / self.tons_per_foot
    }
}

/// Partial settings update; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsUpdate {
    pub elevator_speed_tph: Option<f64>,
    pub tons_per_foot: Option<f64>,
    pub tons_per_trailer: Option<f64>,
    pub tons_per_wagon: Option<f64>,
    pub notifications: Option<NotificationSettings>,
}

impl SettingsUpdate {
    /// Merge this update over `current`, returning the candidate settings.
    /// The candidate still has to pass [`SystemSettings::validate`].
    pub fn apply_to(&self, current: &SystemSettings) -> SystemSettings {
        SystemSettings {
            elevator_speed_tph: self
                .elevator_speed_tph
                .unwrap_or(current.elevator_speed_tph),
            tons_per_foot: self.tons_per_foot.unwrap_or(current.tons_per_foot),
            tons_per_trailer: self.tons_per_trailer.unwrap_or(current.tons_per_trailer),
            tons_per_wagon: self.tons_per_wagon.unwrap_or(current.tons_per_wagon),
            notifications: self.notifications.unwrap_or(current.notifications),
        }
    }
}
