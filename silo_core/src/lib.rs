#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Core engine for grain bin fill tracking.
//!
//! One `BinManager` owns the authoritative state of every bin: fill level in
//! feet and tons (kept synchronized and clamped to capacity), discrete
//! trailer/wagon counters, and a capped per-bin activity ledger with
//! single-step undo. Filling is modeled as continuous accrual from elapsed
//! wall-clock time at a configured elevator rate, with silent auto-stop at
//! capacity.
//!
//! Collaborators are traits at the edges: `Clock` (silo_traits) for testable
//! time, [`notify::AlertSink`] for alert delivery, [`store::BinStore`] for
//! persistence. The [`runner::Scheduler`] drives accrual ticks and dirty
//! flushes from background threads over a shared `Arc<Mutex<BinManager>>`.

pub mod accrual;
pub mod bin;
pub mod conversions;
pub mod error;
pub mod ledger;
pub mod manager;
pub mod metrics;
pub mod mocks;
pub mod notify;
pub mod runner;
pub mod settings;
pub mod store;
pub mod units;
pub mod util;

pub use bin::Bin;
pub use error::{BuildError, Report, Result, SiloError};
pub use ledger::{ActivityAction, ActivityLogEntry};
pub use manager::{BinManager, BinManagerBuilder, LoadType};
pub use metrics::BinMetrics;
pub use notify::{AlertSink, CooldownNotifier, Notifier};
pub use runner::Scheduler;
pub use settings::{NotificationSettings, SettingsUpdate, SystemSettings};
pub use store::BinStore;
pub use units::Converter;
