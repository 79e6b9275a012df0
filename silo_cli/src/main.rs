#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions)]
//! `silo` binary: one-shot bin operations plus a long-running accrual mode.
//!
//! Every invocation loads persisted state (falling back to the config's bin
//! definitions), applies the requested operation through the core manager,
//! and writes state back. `run` instead hands the manager to the background
//! scheduler and waits for Ctrl-C.

mod cli;
mod store;

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;
use silo_core::{
    AlertSink, BinManager, BinStore, CooldownNotifier, Scheduler, SettingsUpdate, SystemSettings,
};
use silo_traits::MonotonicClock;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, CountKind, FILE_GUARD, JSON_MODE};
use crate::store::JsonFileStore;

/// Delivers alerts to the terminal and the log stream. A desktop environment
/// is not assumed; the log line is the alert.
struct TerminalAlertSink;

impl AlertSink for TerminalAlertSink {
    fn alert(&mut self, title: &str, body: &str, require_interaction: bool) {
        tracing::warn!(title, require_interaction, "{body}");
        println!("ALERT: {title}: {body}");
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn init_tracing(cli: &Cli, logging: &silo_config::Logging) {
    let level = logging.level.as_deref().unwrap_or(&cli.log_level);

    if let Some(file) = &logging.file {
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(".", file),
            Some("hourly") => tracing_appender::rolling::hourly(".", file),
            _ => tracing_appender::rolling::never(".", file),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter(level))
            .with_writer(writer)
            .init();
        return;
    }

    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter(level))
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter(level))
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(cli: &Cli) -> eyre::Result<silo_config::Config> {
    let cfg = match fs::read_to_string(&cli.config) {
        Ok(raw) => silo_config::load_toml(&raw)
            .wrap_err_with(|| format!("parsing {}", cli.config.display()))?,
        Err(_) => silo_config::Config::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Load persisted state, falling back to the config-derived defaults when the
/// store has nothing (first run) or holds something unreadable.
fn load_state(
    store: &mut JsonFileStore,
    cfg: &silo_config::Config,
) -> eyre::Result<BinManager> {
    let (cfg_settings, cfg_bins) = silo_core::conversions::from_config(cfg)?;

    let settings = store.load_settings().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "no persisted settings, using configured defaults");
        cfg_settings
    });
    let bins = store.load_bins().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "no persisted bins, using configured defaults");
        cfg_bins
    });

    let notifier = CooldownNotifier::new(TerminalAlertSink, Arc::new(MonotonicClock::new()));
    BinManager::builder()
        .with_notifier(notifier)
        .with_settings(settings)
        .with_bins(bins)
        .build()
}

fn print_status(mgr: &BinManager) {
    let json_mode = JSON_MODE.get().copied().unwrap_or(false);
    for (bin, metrics) in mgr.all_bin_metrics() {
        if json_mode {
            let line = serde_json::json!({
                "id": bin.id,
                "name": bin.name,
                "grain_type": bin.grain_type,
                "is_filling": bin.is_filling,
                "current_fill_feet": bin.current_fill_feet,
                "current_fill_tons": bin.current_fill_tons,
                "trailer_count": bin.trailer_count,
                "wagon_count": bin.wagon_count,
                "metrics": metrics,
            });
            println!("{line}");
        } else {
            println!(
                "{} [{}] {}: {:.1}/{:.1} ft ({:.0}/{:.0} t, {:.1}%) trailers={} wagons={}",
                bin.id,
                if bin.is_filling { "filling" } else { "idle" },
                bin.name,
                bin.current_fill_feet,
                bin.max_capacity_feet,
                bin.current_fill_tons,
                bin.max_capacity_tons,
                metrics.fill_percentage,
                bin.trailer_count,
                bin.wagon_count,
            );
            println!(
                "    grain={} elapsed={} to_full={} remaining={:.1} ft / {:.0} t (~{} trailers, ~{} wagons)",
                bin.grain_type,
                metrics.elapsed_time,
                metrics.estimated_time_to_full,
                metrics.remaining_capacity_feet,
                metrics.remaining_capacity_tons,
                metrics.estimated_trailers_to_full,
                metrics.estimated_wagons_to_full,
            );
        }
    }
}

fn print_settings(settings: &SystemSettings) {
    if JSON_MODE.get().copied().unwrap_or(false) {
        println!("{}", serde_json::json!(settings));
    } else {
        let n = &settings.notifications;
        println!(
            "elevator={} tph ratio={} t/ft trailer={} t wagon={} t",
            settings.elevator_speed_tph,
            settings.tons_per_foot,
            settings.tons_per_trailer,
            settings.tons_per_wagon,
        );
        println!(
            "alerts={} threshold={} ft cooldown={} min",
            if n.enabled { "on" } else { "off" },
            n.threshold_feet,
            n.cooldown_minutes,
        );
    }
}

fn print_log(mgr: &BinManager, bin_id: u32) -> eyre::Result<()> {
    let bin = mgr
        .bins()
        .iter()
        .find(|b| b.id == bin_id)
        .ok_or_else(|| eyre::eyre!("unknown bin {bin_id}"))?;
    let json_mode = JSON_MODE.get().copied().unwrap_or(false);
    for entry in &bin.activity_logs {
        if json_mode {
            println!("{}", serde_json::to_string(entry)?);
        } else {
            let values = match (entry.old_value, entry.new_value, &entry.unit) {
                (Some(old), Some(new), Some(unit)) => {
                    format!(" ({old:.1} -> {new:.1} {unit})")
                }
                _ => String::new(),
            };
            println!(
                "{} {} {:?}: {}{}",
                entry.id,
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.action,
                entry.details,
                values
            );
        }
    }
    Ok(())
}

/// Run the accrual/flush loops until Ctrl-C or the optional duration elapses.
fn run_loop(
    mgr: BinManager,
    store: JsonFileStore,
    runner: silo_config::RunnerCfg,
    duration: Option<u64>,
) -> eyre::Result<()> {
    let shared = Arc::new(Mutex::new(mgr));
    let scheduler = Scheduler::spawn(
        Arc::clone(&shared),
        Box::new(store),
        Duration::from_millis(runner.tick_ms),
        Duration::from_millis(runner.flush_ms),
    );

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        stop_handler.store(true, Ordering::SeqCst);
    })
    .wrap_err("installing Ctrl-C handler")?;

    tracing::info!(
        tick_ms = runner.tick_ms,
        flush_ms = runner.flush_ms,
        "scheduler running, Ctrl-C to stop"
    );

    let deadline = duration.map(|secs| std::time::Instant::now() + Duration::from_secs(secs));
    let mut beats: u64 = 0;
    while !stop.load(Ordering::SeqCst) {
        if let Some(deadline) = deadline
            && std::time::Instant::now() >= deadline
        {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
        beats += 1;
        // Status heartbeat every 30 s while running.
        if beats % 300 == 0
            && let Ok(shared) = shared.lock()
        {
            print_status(&shared);
        }
    }

    // Dropping the scheduler joins both threads and performs a final flush.
    drop(scheduler);
    let shared = shared
        .lock()
        .map_err(|_| eyre::eyre!("bin manager state poisoned during shutdown"))?;
    print_status(&shared);
    Ok(())
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let cfg = load_config(&cli)?;
    init_tracing(&cli, &cfg.logging);

    let mut store = JsonFileStore::new(&cli.data_dir);
    let mut mgr = load_state(&mut store, &cfg)?;

    match cli.cmd {
        Commands::Run { duration } => return run_loop(mgr, store, cfg.runner, duration),
        Commands::TestAlert => {
            let mut notifier =
                CooldownNotifier::new(TerminalAlertSink, Arc::new(MonotonicClock::new()));
            notifier.test_alert();
            return Ok(());
        }
        Commands::Status => {
            print_status(&mgr);
            return Ok(());
        }
        Commands::Log { bin } => {
            print_log(&mgr, bin)?;
            return Ok(());
        }
        Commands::Start { bin } => mgr.start_filling(bin)?,
        Commands::Stop { bin } => mgr.stop_filling(bin)?,
        Commands::Reset { bin } => mgr.reset(bin)?,
        Commands::Fill { bin, remaining } => mgr.update_manual_fill(bin, remaining)?,
        Commands::Inload { bin, tons, tag } => {
            mgr.manual_inload(bin, tons, tag.map(Into::into))?;
        }
        Commands::Outload { bin, tons, tag } => {
            mgr.manual_outload(bin, tons, tag.map(Into::into))?;
        }
        Commands::Truck {
            bin,
            trailers,
            remove,
        } => {
            if remove {
                mgr.remove_trailer_load(bin, trailers)?;
            } else {
                mgr.add_truck_load(bin, trailers)?;
            }
        }
        Commands::Wagon { bin, wagons, remove } => {
            if remove {
                mgr.remove_wagon_load(bin, wagons)?;
            } else {
                mgr.add_wagon_load(bin, wagons)?;
            }
        }
        Commands::ResetCount { bin, kind } => match kind {
            CountKind::Trailer => mgr.reset_trailer_count(bin)?,
            CountKind::Wagon => mgr.reset_wagon_count(bin)?,
        },
        Commands::Grain { bin, grain_type } => mgr.update_grain_type(bin, &grain_type)?,
        Commands::Undo { bin } => mgr.undo_last_activity(bin)?,
        Commands::DeleteLog { bin, id } => mgr.delete_activity_log(bin, &id)?,
        Commands::Settings {
            elevator_tph,
            tons_per_foot,
            tons_per_trailer,
            tons_per_wagon,
            threshold,
            cooldown,
            alerts,
            reset_cooldown,
        } => {
            let notifications = if threshold.is_some() || cooldown.is_some() || alerts.is_some() {
                let mut n = mgr.settings().notifications;
                if let Some(feet) = threshold {
                    n.threshold_feet = feet;
                }
                if let Some(minutes) = cooldown {
                    n.cooldown_minutes = minutes;
                }
                if let Some(enabled) = alerts {
                    n.enabled = enabled;
                }
                Some(n)
            } else {
                None
            };
            mgr.update_settings(SettingsUpdate {
                elevator_speed_tph: elevator_tph,
                tons_per_foot,
                tons_per_trailer,
                tons_per_wagon,
                notifications,
            })?;
            if let Some(bin) = reset_cooldown {
                mgr.reset_notification_cooldown(bin);
            }
            print_settings(mgr.settings());
        }
    }

    store.save_bins(mgr.bins())?;
    store.save_settings(mgr.settings())?;
    print_status(&mgr);
    Ok(())
}
