use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced to the caller of the monitor's commands or from `poll`.
///
/// Unparseable sensor lines are not errors; they never reach this type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MonitorError {
    #[error("connection error on {port}: {reason}")]
    Connection { port: String, reason: String },
    #[error("no readings available for calibration")]
    CalibrationUnavailable,
    #[error("invalid clean-panel baseline: {0} lux (must be > 0)")]
    InvalidBaseline(f64),
    #[error("calibration storage error: {0}")]
    CalibrationStore(String),
    #[error("cannot open log file {path:?}: {reason}")]
    LogOpen { path: PathBuf, reason: String },
    #[error("log write failed, logging disabled: {0}")]
    LogWrite(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
