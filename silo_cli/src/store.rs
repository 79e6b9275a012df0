//! JSON-file implementation of the core persistence boundary.
//!
//! State lives in two files under the data directory: `bins.json` and
//! `settings.json`. Writes go through a temp file and rename so a crash
//! mid-flush never leaves a half-written state file behind.

use std::fs;
use std::path::{Path, PathBuf};

use eyre::WrapErr;
use silo_core::{Bin, BinStore, Result, SystemSettings};

pub const BINS_FILE: &str = "bins.json";
pub const SETTINGS_FILE: &str = "settings.json";

pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn write_atomic(&self, file: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .wrap_err_with(|| format!("creating data dir {}", self.dir.display()))?;
        let tmp = self.path(&format!("{file}.tmp"));
        fs::write(&tmp, contents).wrap_err_with(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, self.path(file))
            .wrap_err_with(|| format!("replacing {}", self.path(file).display()))?;
        Ok(())
    }

    fn read_file(path: &Path) -> Result<String> {
        fs::read_to_string(path).wrap_err_with(|| format!("reading {}", path.display()))
    }
}

impl BinStore for JsonFileStore {
    fn load_bins(&mut self) -> Result<Vec<Bin>> {
        let raw = Self::read_file(&self.path(BINS_FILE))?;
        serde_json::from_str(&raw).wrap_err("parsing bins.json")
    }

    fn save_bins(&mut self, bins: &[Bin]) -> Result<()> {
        let json = serde_json::to_string_pretty(bins).wrap_err("serializing bins")?;
        self.write_atomic(BINS_FILE, &json)
    }

    fn load_settings(&mut self) -> Result<SystemSettings> {
        let raw = Self::read_file(&self.path(SETTINGS_FILE))?;
        serde_json::from_str(&raw).wrap_err("parsing settings.json")
    }

    fn save_settings(&mut self, settings: &SystemSettings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings).wrap_err("serializing settings")?;
        self.write_atomic(SETTINGS_FILE, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silo_core::Converter;

    #[test]
    fn state_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path());

        let conv = Converter::try_new(25.0).unwrap();
        let mut bin = Bin::new(1, "Bin 1", "Wheat H2", 130.0, &conv);
        bin.set_fill_tons(42.0, &conv);

        store.save_bins(std::slice::from_ref(&bin)).unwrap();
        store.save_settings(&SystemSettings::default()).unwrap();

        let bins = store.load_bins().unwrap();
        assert_eq!(bins.len(), 1);
        assert!((bins[0].current_fill_tons - 42.0).abs() < 1e-9);
        // Session timestamps are process-local and never persisted.
        assert_eq!(bins[0].start_ms, None);

        let settings = store.load_settings().unwrap();
        assert_eq!(settings.tons_per_foot, 25.0);
    }

    #[test]
    fn missing_files_surface_as_errors_for_the_caller_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("nope"));
        assert!(store.load_bins().is_err());
        assert!(store.load_settings().is_err());
    }
}
