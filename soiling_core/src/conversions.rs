//! `From` implementations bridging `soiling_config` types to `soiling_core` types.

use std::time::Duration;

use crate::config::MonitorSettings;

impl From<&soiling_config::Config> for MonitorSettings {
    fn from(c: &soiling_config::Config) -> Self {
        Self {
            read_timeout: Duration::from_millis(c.serial.read_timeout_ms),
            poll_interval: Duration::from_millis(c.monitor.poll_ms),
            channel_capacity: c.monitor.channel_capacity,
            disconnect_grace: Duration::from_millis(c.monitor.disconnect_grace_ms),
            calibration_path: c.calibration.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_agree() {
        let from_cfg = MonitorSettings::from(&soiling_config::Config::default());
        let core = MonitorSettings::default();
        assert_eq!(from_cfg.read_timeout, core.read_timeout);
        assert_eq!(from_cfg.poll_interval, core.poll_interval);
        assert_eq!(from_cfg.channel_capacity, core.channel_capacity);
        assert_eq!(from_cfg.disconnect_grace, core.disconnect_grace);
        assert_eq!(from_cfg.calibration_path, core.calibration_path);
    }
}
