//! Common time helpers for silo_core.

/// Number of milliseconds in one minute.
pub const MILLIS_PER_MIN: f64 = 60_000.0;
/// Number of minutes in one hour.
pub const MINS_PER_HOUR: f64 = 60.0;

/// Convert elapsed milliseconds to fractional minutes.
#[inline]
pub fn ms_to_minutes(ms: u64) -> f64 {
    (ms as f64) / MILLIS_PER_MIN
}

/// Convert fractional minutes to whole milliseconds, rounding to nearest.
#[inline]
pub fn minutes_to_ms(minutes: f64) -> u64 {
    if !minutes.is_finite() || minutes <= 0.0 {
        return 0;
    }
    (minutes * MILLIS_PER_MIN).round() as u64
}
