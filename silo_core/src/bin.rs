//! The `Bin` record: one grain storage unit's authoritative fill state.
//!
//! `current_fill_feet` and `current_fill_tons` describe the same physical
//! quantity in two units. Every mutator goes through the helpers here so the
//! two never drift apart and never leave `[0, max]`.

use serde::{Deserialize, Serialize};

use crate::ledger::ActivityLogEntry;
use crate::units::Converter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bin {
    pub id: u32,
    pub name: String,
    pub grain_type: String,
    pub is_filling: bool,
    pub current_fill_feet: f64,
    pub current_fill_tons: f64,
    pub max_capacity_feet: f64,
    pub max_capacity_tons: f64,
    /// Discrete trailer loads added minus removed; removals may exceed
    /// additions, so this is signed and may go negative.
    pub trailer_count: i64,
    /// As `trailer_count`, for rail wagons.
    pub wagon_count: i64,
    /// Monotonic ms at which the current filling session began. Process-local;
    /// never persisted (re-anchored on load).
    #[serde(skip)]
    pub start_ms: Option<u64>,
    /// Monotonic ms of the last accrual application for this session.
    #[serde(skip)]
    pub checkpoint_ms: Option<u64>,
    /// Most-recent-first, capped audit log.
    #[serde(default)]
    pub activity_logs: Vec<ActivityLogEntry>,
}

impl Bin {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        grain_type: impl Into<String>,
        max_capacity_feet: f64,
        conv: &Converter,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            grain_type: grain_type.into(),
            is_filling: false,
            current_fill_feet: 0.0,
            current_fill_tons: 0.0,
            max_capacity_feet,
            max_capacity_tons: conv.feet_to_tons(max_capacity_feet),
            trailer_count: 0,
            wagon_count: 0,
            start_ms: None,
            checkpoint_ms: None,
            activity_logs: Vec::new(),
        }
    }

    #[inline]
    pub fn remaining_feet(&self) -> f64 {
        self.max_capacity_feet - self.current_fill_feet
    }

    #[inline]
    pub fn remaining_tons(&self) -> f64 {
        self.max_capacity_tons - self.current_fill_tons
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.current_fill_feet >= self.max_capacity_feet
    }

    /// Set the fill level from a feet value, clamping into `[0, max]` and
    /// deriving tons from the clamped feet.
    pub fn set_fill_feet(&mut self, feet: f64, conv: &Converter) {
        let feet = feet.clamp(0.0, self.max_capacity_feet);
        self.current_fill_feet = feet;
        self.current_fill_tons = conv
            .feet_to_tons(feet)
            .clamp(0.0, self.max_capacity_tons);
    }

    /// Set the fill level from a tons value, clamping into `[0, max]` and
    /// deriving feet from the clamped tons.
    pub fn set_fill_tons(&mut self, tons: f64, conv: &Converter) {
        let tons = tons.clamp(0.0, self.max_capacity_tons);
        self.current_fill_tons = tons;
        self.current_fill_feet = conv
            .tons_to_feet(tons)
            .clamp(0.0, self.max_capacity_feet);
    }

    /// Add (or with a negative delta, remove) a tons amount, advancing each
    /// unit independently and clamping both into `[0, max]`. Independent
    /// per-unit arithmetic keeps a long run of small deltas from compounding
    /// conversion rounding into one unit only.
    pub fn apply_delta_tons(&mut self, delta_tons: f64, conv: &Converter) {
        let delta_feet = conv.tons_to_feet(delta_tons);
        self.current_fill_feet =
            (self.current_fill_feet + delta_feet).clamp(0.0, self.max_capacity_feet);
        self.current_fill_tons =
            (self.current_fill_tons + delta_tons).clamp(0.0, self.max_capacity_tons);
    }

    /// Terminate any in-progress filling session. Any write that sets an
    /// exact level invalidates the session, so every manual mutation funnels
    /// through here.
    pub fn clear_fill_session(&mut self) {
        self.is_filling = false;
        self.start_ms = None;
        self.checkpoint_ms = None;
    }

    /// Recompute every tons-derived field from feet under a (possibly new)
    /// conversion ratio. Feet are the source of truth when the ratio changes.
    pub fn reconcile_tons(&mut self, conv: &Converter) {
        self.max_capacity_tons = conv.feet_to_tons(self.max_capacity_feet);
        self.current_fill_tons = conv
            .feet_to_tons(self.current_fill_feet)
            .clamp(0.0, self.max_capacity_tons);
    }
}
