//! Presentation metrics derived from a bin snapshot and settings.
//!
//! Pure computation, no mutation, no I/O. Discrete-unit estimates round up:
//! undercounting the trailers or wagons still needed is worse than
//! overcounting.

use serde::Serialize;

use crate::bin::Bin;
use crate::settings::SystemSettings;
use crate::util::ms_to_minutes;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinMetrics {
    /// Percent of capacity filled, capped at 100.
    pub fill_percentage: f64,
    pub tons_per_minute: f64,
    pub feet_per_minute: f64,
    /// Formatted time since the filling session began; "0s" when idle.
    pub elapsed_time: String,
    /// Formatted time until capacity at the configured rate; "Full" at/over.
    pub estimated_time_to_full: String,
    pub remaining_capacity_tons: f64,
    pub remaining_capacity_feet: f64,
    pub estimated_trailers_to_full: u64,
    pub estimated_wagons_to_full: u64,
}

/// Format a fractional-minutes duration as `Hh Mm Ss`, omitting zero-valued
/// leading units.
pub fn format_minutes(minutes: f64) -> String {
    let total_seconds = (minutes * 60.0).round().max(0.0) as u64;
    let hours = total_seconds / 3600;
    let rem = total_seconds % 3600;
    let mins = rem / 60;
    let secs = rem % 60;

    if hours > 0 {
        format!("{hours}h {mins}m {secs}s")
    } else if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

fn fill_percentage(current_feet: f64, max_feet: f64) -> f64 {
    if max_feet == 0.0 {
        return 0.0;
    }
    ((current_feet / max_feet) * 100.0).min(100.0)
}

fn units_to_full(remaining_tons: f64, tons_per_unit: f64) -> u64 {
    if remaining_tons <= 0.0 || tons_per_unit <= 0.0 {
        return 0;
    }
    (remaining_tons / tons_per_unit).ceil() as u64
}

/// Compute all presentation metrics for a bin at monotonic instant `now_ms`.
pub fn calculate(bin: &Bin, settings: &SystemSettings, now_ms: u64) -> BinMetrics {
    let elapsed_time = match (bin.is_filling, bin.start_ms) {
        (true, Some(start)) => format_minutes(ms_to_minutes(now_ms.saturating_sub(start))),
        _ => "0s".to_string(),
    };

    let estimated_time_to_full = if bin.current_fill_feet >= bin.max_capacity_feet {
        "Full".to_string()
    } else {
        let feet_per_minute = settings.feet_per_minute();
        format_minutes(bin.remaining_feet() / feet_per_minute)
    };

    BinMetrics {
        fill_percentage: fill_percentage(bin.current_fill_feet, bin.max_capacity_feet),
        tons_per_minute: settings.tons_per_minute(),
        feet_per_minute: settings.feet_per_minute(),
        elapsed_time,
        estimated_time_to_full,
        remaining_capacity_tons: bin.remaining_tons(),
        remaining_capacity_feet: bin.remaining_feet(),
        estimated_trailers_to_full: units_to_full(bin.remaining_tons(), settings.tons_per_trailer),
        estimated_wagons_to_full: units_to_full(bin.remaining_tons(), settings.tons_per_wagon),
    }
}

#[cfg(test)]
mod format_tests {
    use super::format_minutes;

    #[test]
    fn omits_zero_leading_units() {
        assert_eq!(format_minutes(0.0), "0s");
        assert_eq!(format_minutes(0.5), "30s");
        assert_eq!(format_minutes(2.5), "2m 30s");
        assert_eq!(format_minutes(90.0), "1h 30m 0s");
    }

    #[test]
    fn rounds_to_nearest_second() {
        // 0.4083 min = 24.5 s -> rounds away from zero to 25
        assert_eq!(format_minutes(24.6 / 60.0), "25s");
        assert_eq!(format_minutes(-1.0), "0s");
    }
}
