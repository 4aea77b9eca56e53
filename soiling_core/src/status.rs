//! State published by the coordinator for whatever presents it.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

use crate::calibration::Calibration;
use crate::error::MonitorError;
use crate::metric::DirtLevel;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected { port: String, baud: u32 },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("Disconnected"),
            Self::Connected { port, baud } => write!(f, "Connected ({port} @ {baud})"),
        }
    }
}

/// Latest derived values. `smoothed_lux` is `None` until a reading arrives.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Snapshot {
    pub smoothed_lux: Option<f64>,
    pub dirt_pct: f64,
    pub level: Option<DirtLevel>,
    pub connection: ConnectionState,
    pub calibration: Calibration,
    pub logging: bool,
    pub updated_at: Option<DateTime<Local>>,
}

/// Outcome of one coordinator cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// New readings were folded in; carries the republished state.
    Updated(Snapshot),
    /// An asynchronous failure (link lost, log write failed), reported once.
    Fault(MonitorError),
}
