mod cli;
mod error_fmt;
mod monitor;

use clap::Parser;
use eyre::{Result, WrapErr};
use std::time::Duration;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::monitor::{Link, MonitorOpts};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn run(cli: Cli) -> Result<()> {
    let _ = color_eyre::install();
    let cfg = soiling_config::load_file(&cli.config)
        .wrap_err_with(|| format!("invalid config {}", cli.config.display()))?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    let settings = monitor::settings_for(&cfg, cli.calibration.as_deref());
    match cli.cmd {
        Commands::Monitor {
            link,
            log,
            duration_s,
        } => {
            let link = Link::resolve(&link, &cfg)?;
            let opts = MonitorOpts {
                log,
                duration: duration_s.map(Duration::from_secs),
                json: cli.json,
            };
            monitor::run_monitor(&link, settings, &opts)
        }
        Commands::Calibrate { link, timeout_s } => {
            let link = Link::resolve(&link, &cfg)?;
            monitor::run_calibrate(&link, settings, Duration::from_secs(timeout_s), cli.json)
        }
        Commands::ShowCalibration => {
            monitor::show_calibration(&settings.calibration_path, cli.json);
            Ok(())
        }
        Commands::Ports => monitor::list_ports(cli.json),
    }
}

/// Console layer on stderr (RUST_LOG over --log-level), plus an optional
/// non-blocking file layer from `[logging]`.
fn init_tracing(json: bool, level: &str, logging: &soiling_config::Logging) -> Result<()> {
    let console_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level).wrap_err_with(|| format!("invalid --log-level {level:?}"))?,
    };
    let console: Box<dyn Layer<Registry> + Send + Sync> = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };
    let mut layers = vec![console];

    if let Some(file) = logging.file.as_deref() {
        let path = std::path::Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file:?}"))?;
        let rotation = match logging.rotation.as_deref().unwrap_or("never") {
            "daily" => Rotation::DAILY,
            "hourly" => Rotation::HOURLY,
            _ => Rotation::NEVER,
        };
        let appender = RollingFileAppender::builder()
            .rotation(rotation)
            .filename_prefix(name.to_string_lossy().into_owned())
            .build(dir)
            .wrap_err_with(|| format!("cannot open log file {file:?}"))?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_level = logging.level.as_deref().unwrap_or("info");
        let file_filter = EnvFilter::try_new(file_level)
            .wrap_err_with(|| format!("invalid logging.level {file_level:?}"))?;
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .wrap_err("failed to install tracing subscriber")?;
    Ok(())
}
