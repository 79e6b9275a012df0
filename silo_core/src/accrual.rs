//! Continuous fill accrual: the time-driven projection that advances a
//! filling bin's level.
//!
//! Accrual is computed from wall-clock elapsed milliseconds since the bin's
//! last checkpoint, never from a fixed per-tick increment, so delayed or
//! irregular ticks cannot under- or over-accrue. Each unit advances
//! independently (feet from converted delta, tons from the raw delta) and
//! both clamp at capacity; reaching capacity stops the session silently.

use crate::bin::Bin;
use crate::settings::SystemSettings;
use crate::units::Converter;
use crate::util::ms_to_minutes;

/// Result of one accrual application to one bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualOutcome {
    /// Bin was not filling; nothing changed.
    Idle,
    /// Fill advanced and the bin is still below capacity.
    Advanced,
    /// Bin reached capacity: clamped to max exactly and auto-stopped.
    /// Auto-stop is silent; it appends no ledger entry.
    Filled,
}

/// Advance `bin` to monotonic instant `now_ms` under a consistent settings
/// snapshot, updating the checkpoint.
pub fn accrue(
    bin: &mut Bin,
    settings: &SystemSettings,
    conv: &Converter,
    now_ms: u64,
) -> AccrualOutcome {
    if !bin.is_filling {
        return AccrualOutcome::Idle;
    }
    let Some(checkpoint) = bin.checkpoint_ms else {
        // Session without a checkpoint (e.g. freshly loaded state): anchor it
        // now rather than accruing from an unknown past.
        bin.checkpoint_ms = Some(now_ms);
        return AccrualOutcome::Idle;
    };

    let elapsed_minutes = ms_to_minutes(now_ms.saturating_sub(checkpoint));
    let added_tons = elapsed_minutes * settings.tons_per_minute();
    let added_feet = conv.tons_to_feet(added_tons);

    let target_feet = (bin.current_fill_feet + added_feet).min(bin.max_capacity_feet);
    let target_tons = (bin.current_fill_tons + added_tons).min(bin.max_capacity_tons);
    bin.checkpoint_ms = Some(now_ms);

    if target_feet >= bin.max_capacity_feet {
        bin.current_fill_feet = bin.max_capacity_feet;
        bin.current_fill_tons = bin.max_capacity_tons;
        bin.clear_fill_session();
        tracing::info!(bin = bin.id, "bin reached capacity, auto-stopped");
        return AccrualOutcome::Filled;
    }

    bin.current_fill_feet = target_feet;
    bin.current_fill_tons = target_tons;
    AccrualOutcome::Advanced
}
