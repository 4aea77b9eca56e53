#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the soiling monitor.
//!
//! Every section is optional; a missing file or section yields the defaults.
//! `Config::validate` enforces the bounds the acquisition loop relies on
//! (a read timeout of at most one second keeps the worker cancellable).
use serde::Deserialize;
use serde::de::Deserializer;
use std::path::{Path, PathBuf};

/// Baud used when none is given or the given value does not parse.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Parse a user-supplied baud rate, falling back to [`DEFAULT_BAUD`].
pub fn parse_baud(s: &str) -> u32 {
    match s.trim().parse::<u32>() {
        Ok(b) if b > 0 => b,
        _ => DEFAULT_BAUD,
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Serial {
    /// Device path, e.g. "/dev/ttyUSB0" or "COM3"
    pub port: Option<String>,
    /// Accepts an integer or a string; anything unparseable becomes 115200.
    #[serde(deserialize_with = "de_baud")]
    pub baud: u32,
    /// Upper bound on a single blocking read (ms). Also the cancellation granularity.
    pub read_timeout_ms: u64,
}

impl Default for Serial {
    fn default() -> Self {
        Self {
            port: None,
            baud: DEFAULT_BAUD,
            read_timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Monitor {
    /// Consumer cadence in milliseconds
    pub poll_ms: u64,
    /// Handoff channel capacity; the oldest reading is dropped on overflow
    pub channel_capacity: usize,
    /// How long `disconnect` waits for the reader thread before releasing it
    pub disconnect_grace_ms: u64,
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            poll_ms: 200,
            channel_capacity: 256,
            disconnect_grace_ms: 1250,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationCfg {
    /// JSON file holding `{ "clean_lux": <number|null> }`
    pub path: PathBuf,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            path: PathBuf::from("calibration.json"),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub serial: Serial,
    pub monitor: Monitor,
    pub calibration: CalibrationCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Load and validate a config file; a missing file yields validated defaults.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(text) => load_toml(&text).map_err(|e| eyre::eyre!("parse config {path:?}: {e}"))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
        Err(e) => eyre::bail!("read config {path:?}: {e}"),
    };
    cfg.validate()?;
    Ok(cfg)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BaudToml {
    Int(i64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn de_baud<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BaudToml> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(BaudToml::Int(n)) => u32::try_from(n).ok().filter(|b| *b > 0).unwrap_or(DEFAULT_BAUD),
        Some(BaudToml::Text(s)) => parse_baud(&s),
        Some(BaudToml::Other(_)) | None => DEFAULT_BAUD,
    })
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Serial
        if self.serial.baud == 0 {
            eyre::bail!("serial.baud must be > 0");
        }
        if !(1..=1000).contains(&self.serial.read_timeout_ms) {
            eyre::bail!("serial.read_timeout_ms must be in [1, 1000]");
        }
        if let Some(port) = &self.serial.port
            && port.trim().is_empty()
        {
            eyre::bail!("serial.port must not be empty when set");
        }

        // Monitor
        if self.monitor.poll_ms == 0 {
            eyre::bail!("monitor.poll_ms must be >= 1");
        }
        if self.monitor.poll_ms > 60 * 1000 {
            eyre::bail!("monitor.poll_ms is unreasonably large (>60s)");
        }
        if self.monitor.channel_capacity == 0 {
            eyre::bail!("monitor.channel_capacity must be >= 1");
        }
        if self.monitor.disconnect_grace_ms < self.serial.read_timeout_ms {
            eyre::bail!("monitor.disconnect_grace_ms must be >= serial.read_timeout_ms");
        }

        // Calibration
        if self.calibration.path.as_os_str().is_empty() {
            eyre::bail!("calibration.path must not be empty");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}
