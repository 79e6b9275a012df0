//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls status/report format).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "silo", version, about = "Grain bin fill tracker CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/silo.toml")]
    pub config: PathBuf,

    /// Directory holding the persisted bin/settings state
    #[arg(long, value_name = "DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Log (and print status) as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CountKind {
    Trailer,
    Wagon,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum LoadTag {
    Trailer,
    Wagon,
    Custom,
}

impl From<LoadTag> for silo_core::LoadType {
    fn from(tag: LoadTag) -> Self {
        match tag {
            LoadTag::Trailer => Self::Trailer,
            LoadTag::Wagon => Self::Wagon,
            LoadTag::Custom => Self::Custom,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the accrual and persistence loops until interrupted
    Run {
        /// Exit after this many seconds instead of waiting for Ctrl-C
        #[arg(long, value_name = "SECS")]
        duration: Option<u64>,
    },
    /// Print every bin with its derived metrics
    Status,
    /// Begin a filling session for a bin
    Start {
        #[arg(long)]
        bin: u32,
    },
    /// End the filling session for a bin
    Stop {
        #[arg(long)]
        bin: u32,
    },
    /// Empty a bin and end any filling session
    Reset {
        #[arg(long)]
        bin: u32,
    },
    /// Record a manual drop measurement (remaining headspace in feet)
    Fill {
        #[arg(long)]
        bin: u32,
        /// Remaining headspace in feet
        #[arg(long, value_name = "FEET")]
        remaining: f64,
    },
    /// Add an arbitrary tonnage to a bin
    Inload {
        #[arg(long)]
        bin: u32,
        #[arg(long)]
        tons: f64,
        /// Optional tag recorded in the activity log
        #[arg(long, value_enum)]
        tag: Option<LoadTag>,
    },
    /// Remove an arbitrary tonnage from a bin
    Outload {
        #[arg(long)]
        bin: u32,
        #[arg(long)]
        tons: f64,
        #[arg(long, value_enum)]
        tag: Option<LoadTag>,
    },
    /// Add or remove whole trailer loads
    Truck {
        #[arg(long)]
        bin: u32,
        /// Number of trailer loads
        #[arg(long, default_value_t = 1)]
        trailers: u32,
        /// Remove instead of add
        #[arg(long, action = ArgAction::SetTrue)]
        remove: bool,
    },
    /// Add or remove whole wagon loads
    Wagon {
        #[arg(long)]
        bin: u32,
        /// Number of wagon loads
        #[arg(long, default_value_t = 1)]
        wagons: u32,
        /// Remove instead of add
        #[arg(long, action = ArgAction::SetTrue)]
        remove: bool,
    },
    /// Zero a bin's trailer or wagon counter
    ResetCount {
        #[arg(long)]
        bin: u32,
        #[arg(long, value_enum)]
        kind: CountKind,
    },
    /// Change the grain type stored in a bin
    Grain {
        #[arg(long)]
        bin: u32,
        #[arg(long = "type", value_name = "GRAIN")]
        grain_type: String,
    },
    /// Show a bin's activity log
    Log {
        #[arg(long)]
        bin: u32,
    },
    /// Undo a bin's most recent activity
    Undo {
        #[arg(long)]
        bin: u32,
    },
    /// Delete one activity log entry by id
    DeleteLog {
        #[arg(long)]
        bin: u32,
        #[arg(long)]
        id: String,
    },
    /// Show or change system settings; omitted flags keep their values
    Settings {
        /// Elevator fill rate in tons per hour
        #[arg(long = "elevator-tph", value_name = "TPH")]
        elevator_tph: Option<f64>,
        /// Conversion ratio in tons per foot
        #[arg(long, value_name = "TONS")]
        tons_per_foot: Option<f64>,
        /// Size of one trailer load in tons
        #[arg(long, value_name = "TONS")]
        tons_per_trailer: Option<f64>,
        /// Size of one wagon load in tons
        #[arg(long, value_name = "TONS")]
        tons_per_wagon: Option<f64>,
        /// Alert threshold in feet of remaining headspace
        #[arg(long, value_name = "FEET")]
        threshold: Option<f64>,
        /// Minutes between repeated threshold alerts for one bin
        #[arg(long, value_name = "MINUTES")]
        cooldown: Option<f64>,
        /// Enable or disable alerts (true|false)
        #[arg(long, value_name = "BOOL")]
        alerts: Option<bool>,
        /// Clear the named bin's alert cooldown
        #[arg(long = "reset-cooldown", value_name = "BIN")]
        reset_cooldown: Option<u32>,
    },
    /// Deliver a test alert through the configured notifier
    TestAlert,
}
