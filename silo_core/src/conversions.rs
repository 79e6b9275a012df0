//! Bridges between the TOML config schemas and the core runtime types.

use silo_config::{BinCfg, NotificationsCfg, SystemCfg};

use crate::bin::Bin;
use crate::error::Result;
use crate::settings::{NotificationSettings, SystemSettings};
use crate::units::Converter;

impl From<&NotificationsCfg> for NotificationSettings {
    fn from(cfg: &NotificationsCfg) -> Self {
        Self {
            enabled: cfg.enabled,
            threshold_feet: cfg.threshold_feet,
            cooldown_minutes: cfg.cooldown_minutes,
            require_interaction: cfg.require_interaction,
            sound_enabled: cfg.sound_enabled,
        }
    }
}

/// Merge the system and notification sections into one settings snapshot.
pub fn settings_from_config(system: &SystemCfg, notifications: &NotificationsCfg) -> SystemSettings {
    SystemSettings {
        elevator_speed_tph: system.elevator_speed_tph,
        tons_per_foot: system.tons_per_foot,
        tons_per_trailer: system.tons_per_trailer,
        tons_per_wagon: system.tons_per_wagon,
        notifications: NotificationSettings::from(notifications),
    }
}

/// Materialize empty bins from their config records. Capacity in tons is
/// derived here, under the same ratio the manager will run with.
pub fn bins_from_config(bins: &[BinCfg], conv: &Converter) -> Vec<Bin> {
    bins.iter()
        .map(|b| Bin::new(b.id, b.name.clone(), b.grain_type.clone(), b.max_capacity_feet, conv))
        .collect()
}

/// Build both the settings snapshot and the initial bin set from a full
/// config.
pub fn from_config(cfg: &silo_config::Config) -> Result<(SystemSettings, Vec<Bin>)> {
    let settings = settings_from_config(&cfg.system, &cfg.notifications);
    settings.validate()?;
    let conv = Converter::try_new(settings.tons_per_foot)?;
    Ok((settings, bins_from_config(&cfg.bins, &conv)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_maps_to_default_settings() {
        let cfg = silo_config::Config::default();
        let (settings, bins) = from_config(&cfg).unwrap();
        assert_eq!(settings, SystemSettings::default());
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].name, "Bin 1");
        assert!((bins[0].max_capacity_tons - 3250.0).abs() < 1e-9);
    }
}
