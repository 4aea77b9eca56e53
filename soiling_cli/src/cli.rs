//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "soiling", version, about = "Solar panel soiling monitor")]
pub struct Cli {
    /// Path to config TOML (missing file means defaults)
    #[arg(long, value_name = "FILE", default_value = "etc/soiling.toml")]
    pub config: PathBuf,

    /// Calibration JSON file (overrides [calibration] path)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Emit JSON lines (status, results, errors and logs) instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Where readings come from.
#[derive(clap::Args, Debug, Clone)]
pub struct LinkArgs {
    /// Serial port (overrides [serial] port)
    #[arg(long, value_name = "PORT")]
    pub port: Option<String>,

    /// Baud rate; unparseable values fall back to 115200
    #[arg(long, value_name = "BAUD")]
    pub baud: Option<String>,

    /// Use the simulated light sensor (level from SOILING_SIM_LUX)
    #[arg(long, action = ArgAction::SetTrue)]
    pub sim: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream smoothed lux and dirt percentage until Ctrl-C
    Monitor {
        #[command(flatten)]
        link: LinkArgs,
        /// Record a CSV session log to this file
        #[arg(long, value_name = "FILE")]
        log: Option<PathBuf>,
        /// Stop after this many seconds
        #[arg(long = "duration-s", value_name = "SECS")]
        duration_s: Option<u64>,
    },
    /// Take the current smoothed level as the clean-panel baseline
    Calibrate {
        #[command(flatten)]
        link: LinkArgs,
        /// Give up waiting for a full smoothing window after this many seconds
        #[arg(long = "timeout-s", value_name = "SECS", default_value_t = 10)]
        timeout_s: u64,
    },
    /// Print the stored clean-panel baseline
    ShowCalibration,
    /// List serial ports
    Ports,
}
