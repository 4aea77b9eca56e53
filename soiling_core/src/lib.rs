#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Panel soiling monitor core (hardware-agnostic).
//!
//! All sensor I/O goes through `soiling_traits::LineSource`/`Connector`.
//!
//! ## Architecture
//!
//! - **Parsing**: `LUX:<v>` or bare `<v>` lines to lux values (`parser`)
//! - **Smoothing**: six-sample moving average (`window`)
//! - **Metric**: dirt percentage against a clean baseline (`metric`)
//! - **Calibration**: baseline persistence as JSON (`calibration`)
//! - **Session log**: CSV rows with auto-disable on failure (`logger`)
//! - **Acquisition**: cancellable reader thread and drop-oldest handoff (`worker`, `handoff`)
//! - **Coordination**: single-owner poll loop and command surface (`coordinator`)

pub mod atomic;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod coordinator;
pub mod error;
pub mod handoff;
pub mod logger;
pub mod metric;
pub mod mocks;
pub mod parser;
pub mod status;
pub mod window;
pub mod worker;

pub use calibration::{Calibration, CalibrationStore};
pub use config::MonitorSettings;
pub use coordinator::Coordinator;
pub use error::MonitorError;
pub use logger::{LogRecord, SessionLogger};
pub use metric::{DirtLevel, dirt_percent};
pub use parser::parse_line;
pub use status::{ConnectionState, MonitorEvent, Snapshot};
pub use window::{SmoothingWindow, WINDOW_CAPACITY};
pub use worker::{AcquisitionWorker, Reading, StopOutcome, WorkerExit, WorkerState};
