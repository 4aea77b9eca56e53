//! Command implementations: connector selection, monitor loop, headless calibration.

use eyre::Result;
use soiling_config::Config;
use soiling_core::{
    Calibration, CalibrationStore, Coordinator, MonitorError, MonitorEvent, MonitorSettings,
    Snapshot,
};
use soiling_hardware::SimulatedConnector;
use soiling_traits::{Clock, Connector, MonotonicClock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::cli::LinkArgs;

/// Port label used when `--sim` is given without `--port`.
const SIM_PORT: &str = "sim";
const SIM_DEFAULT_LUX: f64 = 1000.0;
const SIM_PERIOD: Duration = Duration::from_millis(50);

/// Resolved link parameters: CLI flags over config values.
pub struct Link {
    pub port: String,
    pub baud: u32,
    pub sim: bool,
}

impl Link {
    pub fn resolve(args: &LinkArgs, cfg: &Config) -> Result<Self> {
        let baud = args
            .baud
            .as_deref()
            .map_or(cfg.serial.baud, soiling_config::parse_baud);
        let port = args.port.clone().or_else(|| cfg.serial.port.clone());
        let port = match (port, args.sim) {
            (Some(p), _) => p,
            (None, true) => SIM_PORT.to_string(),
            (None, false) => eyre::bail!("no serial port given (use --port or set [serial] port)"),
        };
        Ok(Self {
            port,
            baud,
            sim: args.sim,
        })
    }
}

pub fn settings_for(cfg: &Config, calibration_override: Option<&Path>) -> MonitorSettings {
    let mut settings = MonitorSettings::from(cfg);
    if let Some(p) = calibration_override {
        settings.calibration_path = p.to_path_buf();
    }
    settings
}

fn sim_connector() -> SimulatedConnector {
    let lux = std::env::var("SOILING_SIM_LUX")
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(SIM_DEFAULT_LUX);
    SimulatedConnector::new(lux, SIM_PERIOD)
}

/// Run `f` with a coordinator over the connector the link asks for.
macro_rules! with_coordinator {
    ($link:expr, $settings:expr, |$coord:ident| $body:expr) => {{
        if $link.sim {
            let mut $coord = Coordinator::new(sim_connector(), $settings);
            $body
        } else {
            #[cfg(feature = "hardware")]
            {
                let mut $coord = Coordinator::new(soiling_hardware::SerialConnector, $settings);
                $body
            }
            #[cfg(not(feature = "hardware"))]
            {
                let _ = $settings;
                eyre::bail!("serial support is not compiled in")
            }
        }
    }};
}

pub struct MonitorOpts {
    pub log: Option<PathBuf>,
    pub duration: Option<Duration>,
    pub json: bool,
}

pub fn run_monitor(link: &Link, settings: MonitorSettings, opts: &MonitorOpts) -> Result<()> {
    with_coordinator!(link, settings, |coord| monitor_loop(&mut coord, link, opts))
}

pub fn run_calibrate(
    link: &Link,
    settings: MonitorSettings,
    timeout: Duration,
    json: bool,
) -> Result<()> {
    with_coordinator!(link, settings, |coord| {
        calibrate_headless(&mut coord, link, timeout, json)
    })
}

pub fn show_calibration(path: &Path, json: bool) {
    let cal = CalibrationStore::new(path).load();
    if json {
        println!("{}", serde_json::json!({ "path": path, "clean_lux": cal.clean_lux }));
    } else {
        println!("{}", describe_calibration(&cal));
    }
}

fn describe_calibration(cal: &Calibration) -> String {
    match cal.clean_lux {
        Some(lux) => format!("Clean lux: {lux:.1}"),
        None => "Not calibrated".to_string(),
    }
}

/// One status line, display precision (1 decimal).
pub fn status_line(s: &Snapshot) -> String {
    let lux = s
        .smoothed_lux
        .map_or_else(|| "--".to_string(), |v| format!("{v:.1}"));
    let dirt = if s.calibration.is_calibrated() {
        format!("{:.1}%", s.dirt_pct)
    } else {
        "n/a (not calibrated)".to_string()
    };
    let level = s.level.map_or("-", |l| l.as_str());
    let logging = if s.logging { "on" } else { "off" };
    format!(
        "Lux: {lux} | Dirt: {dirt} [{level}] | {} | Logging: {logging}",
        s.connection
    )
}

fn shutdown_flag() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let s = stop.clone();
    ctrlc::set_handler(move || {
        s.store(true, Ordering::Relaxed);
    })
    .map_err(|e| eyre::eyre!("failed to set Ctrl-C handler: {e}"))?;
    Ok(stop)
}

fn monitor_loop<C: Connector>(
    coord: &mut Coordinator<C>,
    link: &Link,
    opts: &MonitorOpts,
) -> Result<()> {
    let stop = shutdown_flag()?;
    coord.connect(&link.port, link.baud)?;
    if let Some(path) = &opts.log {
        coord.start_logging(path)?;
    }
    tracing::info!(port = %link.port, baud = link.baud, sim = link.sim, "monitoring");
    if !opts.json {
        println!("{}", status_line(coord.snapshot()));
    }

    let mut link_fault: Option<MonitorError> = None;
    let stop_ref: &AtomicBool = &stop;
    coord.run(&MonotonicClock::new(), stop_ref, opts.duration, |event| match event {
        MonitorEvent::Updated(snap) => {
            if opts.json {
                if let Ok(line) = serde_json::to_string(snap) {
                    println!("{line}");
                }
            } else {
                println!("{}", status_line(snap));
            }
        }
        MonitorEvent::Fault(e @ MonitorError::Connection { .. }) => {
            tracing::error!(error = %e, "sensor link lost");
            link_fault = Some(e.clone());
            stop_ref.store(true, Ordering::Relaxed);
        }
        MonitorEvent::Fault(e) => {
            tracing::warn!(error = %e, "monitor fault");
            eprintln!("warning: {e}");
        }
    });

    let shutdown = coord.shutdown();
    match link_fault {
        Some(e) => Err(e.into()),
        None => shutdown.map_err(Into::into),
    }
}

fn calibrate_headless<C: Connector>(
    coord: &mut Coordinator<C>,
    link: &Link,
    timeout: Duration,
    json: bool,
) -> Result<()> {
    let stop = shutdown_flag()?;
    let clock = MonotonicClock::new();
    coord.connect(&link.port, link.baud)?;
    let epoch = clock.now();
    let limit = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    let poll = coord.settings().poll_interval;

    while !coord.window().is_full() && !stop.load(Ordering::Relaxed) {
        for event in coord.poll() {
            if let MonitorEvent::Fault(e @ MonitorError::Connection { .. }) = event {
                return Err(e.into());
            }
        }
        if clock.ms_since(epoch) >= limit {
            break;
        }
        clock.sleep(poll);
    }
    if !coord.window().is_full() && !coord.window().is_empty() {
        tracing::warn!(samples = coord.window().len(), "window not full; calibrating on fewer samples");
    }

    let cal = coord.calibrate();
    let shutdown = coord.shutdown();
    let cal = cal?;
    shutdown?;
    if json {
        println!("{}", serde_json::json!({ "clean_lux": cal.clean_lux }));
    } else {
        println!("Calibrated. {}", describe_calibration(&cal));
    }
    Ok(())
}

#[cfg(feature = "hardware")]
pub fn list_ports(json: bool) -> Result<()> {
    let ports = soiling_hardware::available_ports()?;
    if json {
        let list: Vec<_> = ports
            .iter()
            .map(|p| serde_json::json!({ "name": p.name, "description": p.description }))
            .collect();
        println!("{}", serde_json::Value::from(list));
    } else if ports.is_empty() {
        println!("No serial ports found");
    } else {
        for p in ports {
            println!("{}\t{}", p.name, p.description);
        }
    }
    Ok(())
}

#[cfg(not(feature = "hardware"))]
pub fn list_ports(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::json!({ "ports": [], "hardware": false }));
    } else {
        println!("Serial support not compiled in (build with --features hardware)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use soiling_core::{ConnectionState, DirtLevel};

    #[test]
    fn status_line_uses_one_decimal() {
        let snap = Snapshot {
            smoothed_lux: Some(700.04),
            dirt_pct: 29.996,
            level: Some(DirtLevel::Moderate),
            connection: ConnectionState::Connected {
                port: "/dev/ttyUSB0".into(),
                baud: 115200,
            },
            calibration: Calibration::from_clean_lux(1000.0).unwrap(),
            logging: true,
            updated_at: None,
        };
        assert_eq!(
            status_line(&snap),
            "Lux: 700.0 | Dirt: 30.0% [moderate] | Connected (/dev/ttyUSB0 @ 115200) | Logging: on"
        );
    }

    #[test]
    fn status_line_before_first_reading() {
        let line = status_line(&Snapshot::default());
        assert!(line.starts_with("Lux: -- | Dirt: n/a"));
        assert!(line.contains("Disconnected"));
    }

    #[test]
    fn link_prefers_flags_and_falls_back_on_bad_baud() {
        let mut cfg = Config::default();
        cfg.serial.port = Some("/dev/ttyACM0".into());
        let args = LinkArgs {
            port: None,
            baud: Some("fast".into()),
            sim: false,
        };
        let link = Link::resolve(&args, &cfg).unwrap();
        assert_eq!(link.port, "/dev/ttyACM0");
        assert_eq!(link.baud, 115_200);

        let args = LinkArgs {
            port: Some("COM3".into()),
            baud: Some("9600".into()),
            sim: false,
        };
        let link = Link::resolve(&args, &cfg).unwrap();
        assert_eq!((link.port.as_str(), link.baud), ("COM3", 9600));
    }

    #[test]
    fn missing_port_is_an_error_unless_simulated() {
        let cfg = Config::default();
        let mut args = LinkArgs {
            port: None,
            baud: None,
            sim: false,
        };
        assert!(Link::resolve(&args, &cfg).is_err());
        args.sim = true;
        assert_eq!(Link::resolve(&args, &cfg).unwrap().port, SIM_PORT);
    }
}
