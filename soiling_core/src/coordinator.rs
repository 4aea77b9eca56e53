//! Single owner of all derived state.
//!
//! The coordinator drains the reader's queue on a fixed cadence, folds the
//! readings into the smoothing window, derives the dirt percentage, writes the
//! session log and republishes a [`Snapshot`]. Window, calibration and logger
//! are only ever touched from here, so none of them needs a lock.

use chrono::Local;
use soiling_traits::{Clock, Connector};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::calibration::{Calibration, CalibrationStore};
use crate::config::MonitorSettings;
use crate::error::{MonitorError, Result};
use crate::logger::{LogRecord, SessionLogger};
use crate::metric::{DirtLevel, dirt_percent};
use crate::status::{ConnectionState, MonitorEvent, Snapshot};
use crate::window::SmoothingWindow;
use crate::worker::{AcquisitionWorker, StopOutcome, WorkerExit};

pub struct Coordinator<C: Connector> {
    connector: C,
    settings: MonitorSettings,
    store: CalibrationStore,
    calibration: Calibration,
    window: SmoothingWindow,
    logger: SessionLogger,
    worker: Option<AcquisitionWorker>,
    snapshot: Snapshot,
    /// Faults noticed outside `poll`, delivered by the next `poll`.
    pending: Vec<MonitorEvent>,
}

impl<C: Connector> Coordinator<C> {
    /// Build a disconnected coordinator, loading the stored calibration.
    pub fn new(connector: C, settings: MonitorSettings) -> Self {
        let store = CalibrationStore::new(settings.calibration_path.clone());
        let calibration = store.load();
        tracing::info!(clean_lux = ?calibration.clean_lux, path = ?store.path(), "calibration loaded");
        Self {
            connector,
            settings,
            store,
            calibration,
            window: SmoothingWindow::new(),
            logger: SessionLogger::new(),
            worker: None,
            pending: Vec::new(),
            snapshot: Snapshot {
                calibration,
                ..Snapshot::default()
            },
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.snapshot.connection
    }

    pub fn window(&self) -> &SmoothingWindow {
        &self.window
    }

    pub fn is_logging(&self) -> bool {
        self.logger.is_active()
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Open the link and start the reader. No-op while a reader is running.
    pub fn connect(&mut self, port: &str, baud: u32) -> Result<()> {
        if self.worker.as_ref().is_some_and(AcquisitionWorker::is_alive) {
            tracing::debug!(port, "already connected; ignoring connect");
            return Ok(());
        }
        // A reader that died since the last poll still owes its fault.
        if let Some(stale) = self.worker.take() {
            self.retire(stale);
        }
        let source = self
            .connector
            .open(port, baud, self.settings.read_timeout)
            .map_err(|e| MonitorError::Connection {
                port: port.to_string(),
                reason: e.to_string(),
            })?;
        self.window.clear();
        self.worker = Some(AcquisitionWorker::spawn(
            source,
            port,
            self.settings.channel_capacity,
            self.settings.disconnect_grace,
        ));
        self.snapshot.connection = ConnectionState::Connected {
            port: port.to_string(),
            baud,
        };
        tracing::info!(port, baud, "connected");
        Ok(())
    }

    /// Stop the reader (bounded wait) and release the link. Idempotent.
    pub fn disconnect(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.retire(worker);
        }
        self.snapshot.connection = ConnectionState::Disconnected;
    }

    /// Stop a reader, queueing its fault (if it died of one) for the next `poll`.
    fn retire(&mut self, mut worker: AcquisitionWorker) {
        let exit = worker.take_exit();
        let outcome = worker.stop();
        if worker.dropped() > 0 {
            tracing::warn!(dropped = worker.dropped(), "readings shed during session");
        }
        tracing::info!(port = worker.port(), detached = outcome == StopOutcome::Detached, "disconnected");
        if let Some(WorkerExit::Faulted(reason)) = exit {
            self.pending.push(MonitorEvent::Fault(MonitorError::Connection {
                port: worker.port().to_string(),
                reason,
            }));
        }
    }

    /// Adopt the current smoothed level as the clean-panel baseline and persist it.
    ///
    /// The stored and in-memory values are untouched on any failure.
    pub fn calibrate(&mut self) -> Result<Calibration> {
        let mean = self.window.mean().ok_or(MonitorError::CalibrationUnavailable)?;
        let calibration = Calibration::from_clean_lux(mean)?;
        self.store.save(&calibration)?;
        self.calibration = calibration;
        self.snapshot.calibration = calibration;
        let pct = dirt_percent(mean, &calibration);
        self.snapshot.dirt_pct = pct;
        self.snapshot.level = Some(DirtLevel::classify(pct));
        tracing::info!(clean_lux = mean, "calibrated");
        Ok(calibration)
    }

    /// Begin a new CSV session, ending any current one first.
    pub fn start_logging(&mut self, path: &Path) -> Result<()> {
        let res = self.logger.start(path);
        self.snapshot.logging = self.logger.is_active();
        res
    }

    /// Log to an arbitrary sink instead of a file.
    pub fn start_logging_to(&mut self, sink: Box<dyn Write + Send>, label: &Path) -> Result<()> {
        let res = self.logger.start_with_writer(sink, label);
        self.snapshot.logging = self.logger.is_active();
        res
    }

    pub fn stop_logging(&mut self) -> Result<()> {
        self.snapshot.logging = false;
        self.logger.stop()
    }

    /// Flush the log, persist calibration, disconnect. Every step runs; the
    /// first failure is returned.
    pub fn shutdown(&mut self) -> Result<()> {
        let log = self.stop_logging();
        let persist = self.store.save(&self.calibration);
        self.disconnect();
        tracing::info!("monitor shut down");
        log.and(persist)
    }

    /// One consumption cycle.
    pub fn poll(&mut self) -> Vec<MonitorEvent> {
        let mut events = std::mem::take(&mut self.pending);
        // Read the lifecycle flag before draining so a reader that just
        // exited has nothing left in the queue afterwards.
        let reader_ended = self.worker.as_ref().is_some_and(|w| !w.is_alive());

        let mut drained = 0usize;
        let mut latest = None;
        if let Some(worker) = self.worker.as_ref() {
            for reading in worker.drain() {
                self.window.push(reading.value);
                latest = Some(reading.observed_at);
                drained += 1;
            }
        }

        if drained > 0
            && let Some(mean) = self.window.mean()
        {
            let pct = dirt_percent(mean, &self.calibration);
            let at = latest.unwrap_or_else(Local::now);
            self.snapshot.smoothed_lux = Some(mean);
            self.snapshot.dirt_pct = pct;
            self.snapshot.level = Some(DirtLevel::classify(pct));
            self.snapshot.updated_at = Some(at);
            if let Err(e) = self.logger.append(&LogRecord {
                timestamp: at,
                lux: mean,
                dirt_pct: pct,
            }) {
                self.snapshot.logging = false;
                events.push(MonitorEvent::Fault(e));
            }
            tracing::trace!(drained, mean, pct, "cycle");
            events.insert(0, MonitorEvent::Updated(self.snapshot.clone()));
        }

        if reader_ended && let Some(worker) = self.worker.take() {
            self.retire(worker);
            self.snapshot.connection = ConnectionState::Disconnected;
            events.append(&mut self.pending);
        }
        events
    }

    /// Poll on the configured cadence until `stop` is set or `max_runtime` elapses.
    pub fn run<K: Clock>(
        &mut self,
        clock: &K,
        stop: &AtomicBool,
        max_runtime: Option<Duration>,
        mut on_event: impl FnMut(&MonitorEvent),
    ) {
        let epoch = clock.now();
        let limit_ms = max_runtime.map(|d| d.as_millis() as u64);
        while !stop.load(Ordering::Relaxed) {
            for event in self.poll() {
                on_event(&event);
            }
            if limit_ms.is_some_and(|limit| clock.ms_since(epoch) >= limit) {
                break;
            }
            clock.sleep(self.settings.poll_interval);
        }
    }
}

impl<C: Connector> Drop for Coordinator<C> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
