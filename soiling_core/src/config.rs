//! Runtime settings for the coordinator and its reader thread.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Bound on each blocking read; also the cancellation granularity.
    pub read_timeout: Duration,
    /// Coordinator cadence.
    pub poll_interval: Duration,
    /// Handoff queue size before the oldest reading is shed.
    pub channel_capacity: usize,
    /// How long `disconnect` waits for the reader before detaching it.
    pub disconnect_grace: Duration,
    pub calibration_path: PathBuf,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(200),
            channel_capacity: 256,
            disconnect_grace: Duration::from_millis(1250),
            calibration_path: PathBuf::from("calibration.json"),
        }
    }
}
