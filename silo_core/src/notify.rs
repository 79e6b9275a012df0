//! Notification gating for threshold and periodic alerts.
//!
//! The engine only decides *that* an alert is due; delivery is an abstract
//! [`AlertSink`]. Both notifier entry points are advisory and fire-and-forget:
//! they return nothing and must never propagate an error back into the core.
//! The gate owns the dedup policy: a per-bin threshold cooldown configured in
//! minutes, and a fixed 10-minute spacing for periodic reminders while a bin
//! is actively filling.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use silo_traits::Clock;

use crate::bin::Bin;
use crate::settings::SystemSettings;
use crate::util::minutes_to_ms;

/// Fixed spacing between periodic "still filling" reminders.
pub const PERIODIC_SPACING_MS: u64 = 10 * 60 * 1_000;

/// Delivery endpoint for alerts (desktop notification, log line, test spy).
pub trait AlertSink {
    fn alert(&mut self, title: &str, body: &str, require_interaction: bool);
}

/// The notification capability consumed by the bin state machine.
pub trait Notifier {
    /// Fire a low-headspace alert if due for this bin, in any fill state.
    fn notify_threshold(&mut self, bin: &Bin, settings: &SystemSettings);
    /// Fire a recurring reminder if due; only relevant while filling.
    fn notify_periodic(&mut self, bin: &Bin, settings: &SystemSettings);
    /// Drop any recorded cooldown for a bin so its next alert fires at once.
    fn reset_cooldown(&mut self, bin_id: u32);
}

/// Cooldown-gating notifier over an arbitrary delivery sink.
pub struct CooldownNotifier<A: AlertSink> {
    sink: A,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    last_threshold_ms: HashMap<u32, u64>,
    last_periodic_ms: HashMap<u32, u64>,
}

impl<A: AlertSink> CooldownNotifier<A> {
    pub fn new(sink: A, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let epoch = clock.now();
        Self {
            sink,
            clock,
            epoch,
            last_threshold_ms: HashMap::new(),
            last_periodic_ms: HashMap::new(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    /// Deliver a test alert immediately, bypassing all gating.
    pub fn test_alert(&mut self) {
        self.sink
            .alert("Test Notification", "This is a test notification", false);
    }
}

impl<A: AlertSink> Notifier for CooldownNotifier<A> {
    fn notify_threshold(&mut self, bin: &Bin, settings: &SystemSettings) {
        let n = &settings.notifications;
        if !n.enabled {
            return;
        }
        let remaining = bin.remaining_feet();
        if remaining > n.threshold_feet {
            return;
        }

        let now = self.now_ms();
        let cooldown_ms = minutes_to_ms(n.cooldown_minutes);
        if let Some(&last) = self.last_threshold_ms.get(&bin.id)
            && now.saturating_sub(last) < cooldown_ms
        {
            return;
        }
        self.last_threshold_ms.insert(bin.id, now);

        tracing::info!(bin = bin.id, remaining_feet = remaining, "threshold alert");
        self.sink.alert(
            "Silo Bin Alert - Bin Drop Required",
            &format!(
                "{} requires manual measurement - Remaining: {remaining:.1} ft",
                bin.name
            ),
            n.require_interaction,
        );
    }

    fn notify_periodic(&mut self, bin: &Bin, settings: &SystemSettings) {
        let n = &settings.notifications;
        if !n.enabled || !bin.is_filling {
            return;
        }

        let now = self.now_ms();
        if let Some(&last) = self.last_periodic_ms.get(&bin.id)
            && now.saturating_sub(last) < PERIODIC_SPACING_MS
        {
            return;
        }
        self.last_periodic_ms.insert(bin.id, now);

        tracing::debug!(bin = bin.id, "periodic filling reminder");
        self.sink.alert(
            &format!("Filling Status - {}", bin.name),
            &format!(
                "Still filling... Current level: {:.1} ft ({:.0} tons)",
                bin.current_fill_feet, bin.current_fill_tons
            ),
            false,
        );
    }

    fn reset_cooldown(&mut self, bin_id: u32) {
        self.last_threshold_ms.remove(&bin_id);
        self.last_periodic_ms.remove(&bin_id);
    }
}
