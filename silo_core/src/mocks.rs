//! Test and helper mocks for silo_core

use std::sync::{Arc, Mutex};

use crate::bin::Bin;
use crate::error::{Result, SiloError};
use crate::notify::{AlertSink, Notifier};
use crate::settings::SystemSettings;
use crate::store::BinStore;

/// A notifier that swallows everything; useful when a manager is exercised
/// without caring about alerts.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify_threshold(&mut self, _bin: &Bin, _settings: &SystemSettings) {}
    fn notify_periodic(&mut self, _bin: &Bin, _settings: &SystemSettings) {}
    fn reset_cooldown(&mut self, _bin_id: u32) {}
}

/// An alert sink that records every delivered alert as `(title, body)`.
/// The shared handle survives handing the sink to a notifier.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub alerts: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingSink {
    pub fn alert_count(&self) -> usize {
        self.alerts.lock().map(|a| a.len()).unwrap_or(0)
    }
}

impl AlertSink for RecordingSink {
    fn alert(&mut self, title: &str, body: &str, _require_interaction: bool) {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push((title.to_string(), body.to_string()));
        }
    }
}

/// An in-memory store for scheduler and persistence tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub bins: Arc<Mutex<Vec<Bin>>>,
    pub settings: Arc<Mutex<SystemSettings>>,
    pub save_count: Arc<Mutex<usize>>,
}

impl BinStore for MemoryStore {
    fn load_bins(&mut self) -> Result<Vec<Bin>> {
        Ok(self.bins.lock().map(|b| b.clone()).unwrap_or_default())
    }

    fn save_bins(&mut self, bins: &[Bin]) -> Result<()> {
        if let Ok(mut slot) = self.bins.lock() {
            *slot = bins.to_vec();
        }
        if let Ok(mut n) = self.save_count.lock() {
            *n += 1;
        }
        Ok(())
    }

    fn load_settings(&mut self) -> Result<SystemSettings> {
        Ok(self
            .settings
            .lock()
            .map(|s| *s)
            .unwrap_or_default())
    }

    fn save_settings(&mut self, settings: &SystemSettings) -> Result<()> {
        if let Ok(mut slot) = self.settings.lock() {
            *slot = *settings;
        }
        Ok(())
    }
}

/// A store whose saves always fail; the scheduler must log and carry on.
pub struct FailingStore;

impl BinStore for FailingStore {
    fn load_bins(&mut self) -> Result<Vec<Bin>> {
        Err(eyre::Report::new(SiloError::Store("load failed".into())))
    }

    fn save_bins(&mut self, _bins: &[Bin]) -> Result<()> {
        Err(eyre::Report::new(SiloError::Store("save failed".into())))
    }

    fn load_settings(&mut self) -> Result<SystemSettings> {
        Err(eyre::Report::new(SiloError::Store("load failed".into())))
    }

    fn save_settings(&mut self, _settings: &SystemSettings) -> Result<()> {
        Err(eyre::Report::new(SiloError::Store("save failed".into())))
    }
}
