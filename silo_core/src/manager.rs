//! The bin state machine: owner of all authoritative fill state.
//!
//! Every mutating operation (a) updates fill state through the clamping
//! helpers on [`Bin`], (b) appends exactly one ledger entry with accurate
//! before/after values, and (c) for fill-affecting operations evaluates the
//! threshold notifier against the updated snapshot, whatever the fill state.
//!
//! All mutations and the accrual tick serialize through one `BinManager`
//! (callers share it behind a mutex, see `runner`), so `stop_filling` always
//! observes the most recently accrued value; there is no local/persisted
//! shadow copy anywhere.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use silo_traits::clock::{Clock, MonotonicClock};

use crate::accrual::{self, AccrualOutcome};
use crate::bin::Bin;
use crate::error::{BuildError, Result, SiloError};
use crate::ledger::{self, ActivityAction, ActivityLogEntry};
use crate::metrics::{self, BinMetrics};
use crate::notify::Notifier;
use crate::settings::{SettingsUpdate, SystemSettings};
use crate::units::Converter;

/// Tag attached to a manual in/outload, echoed in the ledger details only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadType {
    Trailer,
    Wagon,
    Custom,
}

impl LoadType {
    fn suffix(self) -> &'static str {
        match self {
            Self::Trailer => " (trailer)",
            Self::Wagon => " (wagon)",
            Self::Custom => "",
        }
    }
}

pub struct BinManager {
    bins: Vec<Bin>,
    settings: SystemSettings,
    conv: Converter,
    notifier: Box<dyn Notifier + Send>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    // Bumped on every observable mutation; the flush task saves when it moves.
    version: u64,
}

impl core::fmt::Debug for BinManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BinManager")
            .field("bins", &self.bins.len())
            .field("version", &self.version)
            .finish()
    }
}

// Type-state markers for the builder
pub struct Missing;
pub struct Set;

/// Builder for `BinManager`; the notifier is mandatory and tracked by
/// type-state, everything else has defaults. Settings are validated on build.
pub struct BinManagerBuilder<N> {
    notifier: Option<Box<dyn Notifier + Send>>,
    settings: Option<SystemSettings>,
    bins: Vec<Bin>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _n: PhantomData<N>,
}

impl Default for BinManagerBuilder<Missing> {
    fn default() -> Self {
        Self {
            notifier: None,
            settings: None,
            bins: Vec::new(),
            clock: None,
            _n: PhantomData,
        }
    }
}

impl BinManager {
    pub fn builder() -> BinManagerBuilder<Missing> {
        BinManagerBuilder::default()
    }
}

impl<N> BinManagerBuilder<N> {
    pub fn with_settings(mut self, settings: SystemSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_bins(mut self, bins: Vec<Bin>) -> Self {
        self.bins = bins;
        self
    }

    /// Provide a custom clock; defaults to MonotonicClock when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Fallible build available in any type-state; returns a typed BuildError
    /// for missing pieces.
    pub fn try_build(self) -> Result<BinManager> {
        let BinManagerBuilder {
            notifier,
            settings,
            mut bins,
            clock,
            _n: _,
        } = self;

        let notifier = notifier.ok_or_else(|| eyre::Report::new(BuildError::MissingNotifier))?;
        let settings = settings.unwrap_or_default();
        settings.validate()?;
        let conv = Converter::try_new(settings.tons_per_foot)?;

        let clock: Arc<dyn Clock + Send + Sync> = match clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };
        let epoch = clock.now();
        let now = clock.ms_since(epoch); // 0

        // Monotonic session timestamps don't survive a restart: any bin that
        // was persisted mid-fill resumes from now, with no retroactive
        // accrual for the downtime.
        for bin in &mut bins {
            bin.reconcile_tons(&conv);
            if bin.is_filling {
                bin.start_ms = Some(now);
                bin.checkpoint_ms = Some(now);
            }
        }

        Ok(BinManager {
            bins,
            settings,
            conv,
            notifier,
            clock,
            epoch,
            version: 0,
        })
    }
}

impl BinManagerBuilder<Missing> {
    pub fn with_notifier(self, notifier: impl Notifier + Send + 'static) -> BinManagerBuilder<Set> {
        let BinManagerBuilder {
            notifier: _,
            settings,
            bins,
            clock,
            _n: _,
        } = self;
        BinManagerBuilder {
            notifier: Some(Box::new(notifier)),
            settings,
            bins,
            clock,
            _n: PhantomData,
        }
    }
}

impl BinManagerBuilder<Set> {
    /// Validate and build the manager. Only available once a notifier is set.
    pub fn build(self) -> Result<BinManager> {
        self.try_build()
    }
}

impl BinManager {
    #[inline]
    fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    #[inline]
    fn touch(&mut self) {
        self.version += 1;
    }

    fn index_of(&self, bin_id: u32) -> Result<usize> {
        self.bins
            .iter()
            .position(|b| b.id == bin_id)
            .ok_or_else(|| eyre::Report::new(SiloError::UnknownBin(bin_id)))
    }

    fn notify_threshold_at(&mut self, idx: usize) {
        let snapshot = self.bins[idx].clone();
        self.notifier.notify_threshold(&snapshot, &self.settings);
    }

    // --- Read surface ------------------------------------------------

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn settings(&self) -> &SystemSettings {
        &self.settings
    }

    /// Mutation counter for change detection by the persistence flush.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn bin_metrics(&self, bin_id: u32) -> Result<BinMetrics> {
        let idx = self.index_of(bin_id)?;
        Ok(metrics::calculate(
            &self.bins[idx],
            &self.settings,
            self.now_ms(),
        ))
    }

    pub fn all_bin_metrics(&self) -> Vec<(Bin, BinMetrics)> {
        let now = self.now_ms();
        self.bins
            .iter()
            .map(|b| (b.clone(), metrics::calculate(b, &self.settings, now)))
            .collect()
    }

    // --- Filling session ---------------------------------------------

    /// Begin continuous accrual for a bin. Starting an already-full bin is
    /// permitted; the next accrual tick immediately re-stops it.
    pub fn start_filling(&mut self, bin_id: u32) -> Result<()> {
        let idx = self.index_of(bin_id)?;
        let now = self.now_ms();
        {
            let bin = &mut self.bins[idx];
            bin.is_filling = true;
            bin.start_ms = Some(now);
            bin.checkpoint_ms = Some(now);
            ledger::append(
                bin,
                ActivityLogEntry::new(ActivityAction::StartFilling, "Started filling bin"),
            );
        }
        tracing::info!(bin = bin_id, "start filling");
        self.touch();
        self.notify_threshold_at(idx);
        Ok(())
    }

    /// End the filling session, first bringing the fill level up to date so
    /// no in-flight accrual progress is lost.
    pub fn stop_filling(&mut self, bin_id: u32) -> Result<()> {
        let idx = self.index_of(bin_id)?;
        let now = self.now_ms();
        let settings = self.settings;
        {
            let bin = &mut self.bins[idx];
            accrual::accrue(bin, &settings, &self.conv, now);
            bin.clear_fill_session();
            ledger::append(
                bin,
                ActivityLogEntry::new(ActivityAction::StopFilling, "Stopped filling bin"),
            );
        }
        tracing::info!(bin = bin_id, "stop filling");
        self.touch();
        self.notify_threshold_at(idx);
        Ok(())
    }

    /// Empty the bin and terminate any filling session.
    pub fn reset(&mut self, bin_id: u32) -> Result<()> {
        let idx = self.index_of(bin_id)?;
        {
            let bin = &mut self.bins[idx];
            bin.current_fill_feet = 0.0;
            bin.current_fill_tons = 0.0;
            bin.clear_fill_session();
            ledger::append(
                bin,
                ActivityLogEntry::new(ActivityAction::Reset, "Reset bin to empty"),
            );
        }
        tracing::info!(bin = bin_id, "reset bin");
        self.touch();
        self.notify_threshold_at(idx);
        Ok(())
    }

    // --- Manual adjustments ------------------------------------------

    /// Set the fill level from a measured remaining headspace. Values beyond
    /// the capacity range clamp: more-than-full measurements land at
    /// remaining = max (fill 0), negative headspace lands at full.
    pub fn update_manual_fill(&mut self, bin_id: u32, remaining_feet: f64) -> Result<()> {
        if !remaining_feet.is_finite() {
            return Err(eyre::Report::new(SiloError::Validation(
                "remaining feet must be a finite number".into(),
            )));
        }
        let idx = self.index_of(bin_id)?;
        {
            let bin = &mut self.bins[idx];
            let old_tons = bin.current_fill_tons;
            let fill_feet = bin.max_capacity_feet - remaining_feet;
            bin.set_fill_feet(fill_feet, &self.conv);
            bin.clear_fill_session();
            let new_tons = bin.current_fill_tons;
            ledger::append(
                bin,
                ActivityLogEntry::new(
                    ActivityAction::ManualFill,
                    format!("Updated remaining capacity to {remaining_feet:.1} ft"),
                )
                .with_values(old_tons, new_tons, "tons"),
            );
        }
        self.touch();
        self.notify_threshold_at(idx);
        Ok(())
    }

    pub fn manual_inload(
        &mut self,
        bin_id: u32,
        tons: f64,
        load_type: Option<LoadType>,
    ) -> Result<()> {
        self.manual_load(bin_id, tons, load_type, true)
    }

    pub fn manual_outload(
        &mut self,
        bin_id: u32,
        tons: f64,
        load_type: Option<LoadType>,
    ) -> Result<()> {
        self.manual_load(bin_id, tons, load_type, false)
    }

    fn manual_load(
        &mut self,
        bin_id: u32,
        tons: f64,
        load_type: Option<LoadType>,
        inbound: bool,
    ) -> Result<()> {
        if !tons.is_finite() || tons <= 0.0 {
            return Err(eyre::Report::new(SiloError::Validation(
                "load tons must be a positive number".into(),
            )));
        }
        let idx = self.index_of(bin_id)?;
        let (action, verb, signed) = if inbound {
            (ActivityAction::ManualInload, "inload", tons)
        } else {
            (ActivityAction::ManualOutload, "outload", -tons)
        };
        {
            let bin = &mut self.bins[idx];
            let old_tons = bin.current_fill_tons;
            bin.apply_delta_tons(signed, &self.conv);
            bin.clear_fill_session();
            let new_tons = bin.current_fill_tons;
            let suffix = load_type.map(LoadType::suffix).unwrap_or("");
            ledger::append(
                bin,
                ActivityLogEntry::new(action, format!("Manual {verb}: {tons} tons{suffix}"))
                    .with_values(old_tons, new_tons, "tons"),
            );
        }
        self.touch();
        self.notify_threshold_at(idx);
        Ok(())
    }

    // --- Discrete loads ----------------------------------------------

    pub fn add_truck_load(&mut self, bin_id: u32, trailers: u32) -> Result<()> {
        let tons_per = self.settings.tons_per_trailer;
        self.discrete_load(bin_id, trailers, tons_per, DiscreteKind::Trailer, true)
    }

    pub fn remove_trailer_load(&mut self, bin_id: u32, trailers: u32) -> Result<()> {
        let tons_per = self.settings.tons_per_trailer;
        self.discrete_load(bin_id, trailers, tons_per, DiscreteKind::Trailer, false)
    }

    pub fn add_wagon_load(&mut self, bin_id: u32, wagons: u32) -> Result<()> {
        let tons_per = self.settings.tons_per_wagon;
        self.discrete_load(bin_id, wagons, tons_per, DiscreteKind::Wagon, true)
    }

    pub fn remove_wagon_load(&mut self, bin_id: u32, wagons: u32) -> Result<()> {
        let tons_per = self.settings.tons_per_wagon;
        self.discrete_load(bin_id, wagons, tons_per, DiscreteKind::Wagon, false)
    }

    fn discrete_load(
        &mut self,
        bin_id: u32,
        units: u32,
        tons_per_unit: f64,
        kind: DiscreteKind,
        inbound: bool,
    ) -> Result<()> {
        if units == 0 {
            return Err(eyre::Report::new(SiloError::Validation(
                "load count must be at least 1".into(),
            )));
        }
        let idx = self.index_of(bin_id)?;
        let total_tons = f64::from(units) * tons_per_unit;
        let (action, details) = match (kind, inbound) {
            (DiscreteKind::Trailer, true) => (
                ActivityAction::TruckLoad,
                format!("Added {units} trailer load(s)"),
            ),
            (DiscreteKind::Trailer, false) => (
                ActivityAction::TruckRemove,
                format!("Removed {units} trailer load(s)"),
            ),
            (DiscreteKind::Wagon, true) => (
                ActivityAction::WagonLoad,
                format!("Added {units} wagon load(s)"),
            ),
            (DiscreteKind::Wagon, false) => (
                ActivityAction::WagonRemove,
                format!("Removed {units} wagon load(s)"),
            ),
        };
        {
            let bin = &mut self.bins[idx];
            let old_tons = bin.current_fill_tons;
            let signed = if inbound { total_tons } else { -total_tons };
            bin.apply_delta_tons(signed, &self.conv);
            // Counts track deliveries, not the clamped fill: removal may
            // exceed recorded additions, so they can go negative.
            let delta = i64::from(units);
            let count = match kind {
                DiscreteKind::Trailer => &mut bin.trailer_count,
                DiscreteKind::Wagon => &mut bin.wagon_count,
            };
            *count += if inbound { delta } else { -delta };
            bin.clear_fill_session();
            let new_tons = bin.current_fill_tons;
            ledger::append(
                bin,
                ActivityLogEntry::new(action, details).with_values(old_tons, new_tons, "tons"),
            );
        }
        self.touch();
        self.notify_threshold_at(idx);
        Ok(())
    }

    pub fn reset_trailer_count(&mut self, bin_id: u32) -> Result<()> {
        let idx = self.index_of(bin_id)?;
        {
            let bin = &mut self.bins[idx];
            let old = bin.trailer_count;
            bin.trailer_count = 0;
            ledger::append(
                bin,
                ActivityLogEntry::new(
                    ActivityAction::TrailerReset,
                    format!("Reset trailer count from {old} to 0"),
                ),
            );
        }
        self.touch();
        Ok(())
    }

    pub fn reset_wagon_count(&mut self, bin_id: u32) -> Result<()> {
        let idx = self.index_of(bin_id)?;
        {
            let bin = &mut self.bins[idx];
            let old = bin.wagon_count;
            bin.wagon_count = 0;
            ledger::append(
                bin,
                ActivityLogEntry::new(
                    ActivityAction::WagonReset,
                    format!("Reset wagon count from {old} to 0"),
                ),
            );
        }
        self.touch();
        Ok(())
    }

    // --- Metadata ----------------------------------------------------

    pub fn update_grain_type(&mut self, bin_id: u32, grain_type: &str) -> Result<()> {
        let new_type = grain_type.trim();
        if new_type.is_empty() {
            return Err(eyre::Report::new(SiloError::Validation(
                "grain type must not be empty".into(),
            )));
        }
        let idx = self.index_of(bin_id)?;
        {
            let bin = &mut self.bins[idx];
            let old_type = bin.grain_type.clone();
            bin.grain_type = new_type.to_string();
            ledger::append(
                bin,
                ActivityLogEntry::new(
                    ActivityAction::GrainChange,
                    format!("Changed grain type from \"{old_type}\" to \"{new_type}\""),
                )
                .with_texts(old_type, new_type),
            );
        }
        self.touch();
        Ok(())
    }

    // --- Ledger delegation -------------------------------------------

    pub fn delete_activity_log(&mut self, bin_id: u32, log_id: &str) -> Result<()> {
        let idx = self.index_of(bin_id)?;
        if ledger::delete(&mut self.bins[idx], log_id) {
            self.touch();
        }
        Ok(())
    }

    /// Undo the most recent ledger entry for a bin; no-op on an empty ledger.
    pub fn undo_last_activity(&mut self, bin_id: u32) -> Result<()> {
        let idx = self.index_of(bin_id)?;
        if let Some(entry) = ledger::undo_last(&mut self.bins[idx], &self.conv) {
            tracing::info!(bin = bin_id, action = ?entry.action, "undid last activity");
            self.touch();
        }
        Ok(())
    }

    // --- Settings ----------------------------------------------------

    /// Apply a partial settings update. The merged value is validated as a
    /// whole before adoption, so an invalid update changes nothing. When the
    /// feet/tons ratio changes, every bin's tons-derived fields are
    /// recomputed from feet (feet are the source of truth).
    pub fn update_settings(&mut self, update: SettingsUpdate) -> Result<()> {
        let candidate = update.apply_to(&self.settings);
        candidate.validate()?;
        let ratio_changed = candidate.tons_per_foot != self.settings.tons_per_foot;
        self.settings = candidate;
        if ratio_changed {
            self.conv = Converter::try_new(candidate.tons_per_foot)?;
            for bin in &mut self.bins {
                bin.reconcile_tons(&self.conv);
            }
            tracing::info!(
                tons_per_foot = candidate.tons_per_foot,
                "conversion ratio changed, tons recomputed from feet"
            );
        }
        self.touch();
        Ok(())
    }

    /// Drop the notification cooldown for a bin.
    pub fn reset_notification_cooldown(&mut self, bin_id: u32) {
        self.notifier.reset_cooldown(bin_id);
    }

    // --- Accrual tick ------------------------------------------------

    /// Advance every filling bin to now under one settings snapshot, then
    /// evaluate threshold and periodic notifications against the updated
    /// snapshots. Auto-stop on full appends no ledger entry.
    pub fn tick(&mut self) {
        let now = self.now_ms();
        let settings = self.settings;
        let conv = self.conv;
        let mut changed = false;
        for idx in 0..self.bins.len() {
            let outcome = accrual::accrue(&mut self.bins[idx], &settings, &conv, now);
            if outcome == AccrualOutcome::Idle {
                continue;
            }
            changed = true;
            let snapshot = self.bins[idx].clone();
            self.notifier.notify_threshold(&snapshot, &settings);
            self.notifier.notify_periodic(&snapshot, &settings);
        }
        if changed {
            self.touch();
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DiscreteKind {
    Trailer,
    Wagon,
}
