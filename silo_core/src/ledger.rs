//! Append-only activity ledger with single-step undo.
//!
//! Entries are immutable once appended, ordered most-recent-first, and capped
//! at [`LOG_CAP`] per bin (oldest evicted). Undo pops the newest entry and
//! applies the inverse mutation for its action kind; actions that don't
//! retain enough information to invert (`stop_filling`, `reset`, counter
//! resets) are a documented no-op that still consumes the entry.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bin::Bin;
use crate::units::Converter;

/// Maximum retained ledger entries per bin.
pub const LOG_CAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    StartFilling,
    StopFilling,
    Reset,
    ManualFill,
    ManualInload,
    ManualOutload,
    TruckLoad,
    TruckRemove,
    TrailerReset,
    WagonLoad,
    WagonRemove,
    WagonReset,
    GrainChange,
}

impl ActivityAction {
    /// Whether undo can restore the prior state for this action kind.
    pub fn is_reversible(self) -> bool {
        !matches!(
            self,
            Self::StopFilling | Self::Reset | Self::TrailerReset | Self::WagonReset
        )
    }
}

/// Immutable audit record of one state-changing operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub action: ActivityAction,
    pub details: String,
    /// Fill/count value before the mutation, when quantifiable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<f64>,
    /// Fill/count value after the mutation, when quantifiable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Structured before-text for text-valued mutations (grain type), so undo
    /// never has to parse `details`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_text: Option<String>,
}

static ENTRY_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_entry_id(now: DateTime<Utc>) -> String {
    // Time-based with a process-local sequence suffix; unique and sortable
    // even when several entries land in the same millisecond.
    let seq = ENTRY_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{seq:04x}", now.timestamp_millis())
}

impl ActivityLogEntry {
    pub fn new(action: ActivityAction, details: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: next_entry_id(now),
            timestamp: now,
            action,
            details: details.into(),
            old_value: None,
            new_value: None,
            unit: None,
            old_text: None,
            new_text: None,
        }
    }

    pub fn with_values(mut self, old_value: f64, new_value: f64, unit: &str) -> Self {
        self.old_value = Some(old_value);
        self.new_value = Some(new_value);
        self.unit = Some(unit.to_string());
        self
    }

    pub fn with_texts(mut self, old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        self.old_text = Some(old_text.into());
        self.new_text = Some(new_text.into());
        self
    }
}

/// Prepend `entry` to the bin's ledger, evicting beyond [`LOG_CAP`].
pub fn append(bin: &mut Bin, entry: ActivityLogEntry) {
    bin.activity_logs.insert(0, entry);
    bin.activity_logs.truncate(LOG_CAP);
}

/// Remove one entry by identity; no-op when absent. Returns whether an entry
/// was removed.
pub fn delete(bin: &mut Bin, log_id: &str) -> bool {
    let before = bin.activity_logs.len();
    bin.activity_logs.retain(|e| e.id != log_id);
    bin.activity_logs.len() != before
}

/// Pop the most recent entry and apply its inverse to the bin. Returns the
/// consumed entry, or `None` when the ledger is empty. Irreversible actions
/// consume their entry without touching state.
pub fn undo_last(bin: &mut Bin, conv: &Converter) -> Option<ActivityLogEntry> {
    if bin.activity_logs.is_empty() {
        return None;
    }
    let entry = bin.activity_logs.remove(0);

    match entry.action {
        ActivityAction::StartFilling => {
            bin.clear_fill_session();
        }
        ActivityAction::ManualFill | ActivityAction::ManualInload | ActivityAction::ManualOutload => {
            if let Some(old_tons) = entry.old_value {
                bin.set_fill_tons(old_tons, conv);
                bin.clear_fill_session();
            }
        }
        ActivityAction::TruckLoad => {
            if let Some(old_tons) = entry.old_value {
                bin.set_fill_tons(old_tons, conv);
                bin.trailer_count = (bin.trailer_count - 1).max(0);
                bin.clear_fill_session();
            }
        }
        ActivityAction::TruckRemove => {
            if let Some(old_tons) = entry.old_value {
                bin.set_fill_tons(old_tons, conv);
                bin.trailer_count += 1;
                bin.clear_fill_session();
            }
        }
        ActivityAction::WagonLoad => {
            if let Some(old_tons) = entry.old_value {
                bin.set_fill_tons(old_tons, conv);
                bin.wagon_count = (bin.wagon_count - 1).max(0);
                bin.clear_fill_session();
            }
        }
        ActivityAction::WagonRemove => {
            if let Some(old_tons) = entry.old_value {
                bin.set_fill_tons(old_tons, conv);
                bin.wagon_count += 1;
                bin.clear_fill_session();
            }
        }
        ActivityAction::GrainChange => {
            if let Some(old_type) = &entry.old_text {
                bin.grain_type = old_type.clone();
            }
        }
        // Insufficient information retained to invert; policy: consume only.
        ActivityAction::StopFilling
        | ActivityAction::Reset
        | ActivityAction::TrailerReset
        | ActivityAction::WagonReset => {
            tracing::debug!(bin = bin.id, action = ?entry.action, "undo is a no-op for this action");
        }
    }

    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_ids_are_unique() {
        let a = ActivityLogEntry::new(ActivityAction::Reset, "x");
        let b = ActivityLogEntry::new(ActivityAction::Reset, "x");
        assert_ne!(a.id, b.id);
    }
}
