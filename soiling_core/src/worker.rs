//! Background acquisition thread.
//!
//! Owns the sensor link, parses each line, and hands readings to the
//! coordinator through a drop-oldest channel. Cancellation is cooperative:
//! the stop flag is checked between reads, and every read is bounded by the
//! link's timeout, so `stop` returns within roughly one read timeout.
//!
//! Safety: each `AcquisitionWorker` spawns exactly one thread, stopped (with
//! the same bounded wait) when the worker is dropped.
use chrono::{DateTime, Local};
use crossbeam_channel as xch;
use soiling_traits::LineSource;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::handoff::handoff;
use crate::parser::parse_line;

/// One parsed sensor value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub observed_at: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Stopping,
}

/// Why the read loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// Stop flag observed (including I/O errors raised after the flag was set).
    Stopped,
    /// Hard I/O error while running.
    Faulted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Thread exited within the grace period and was joined.
    Joined,
    /// Grace period elapsed; the thread was detached and releases the link on its own.
    Detached,
}

pub struct AcquisitionWorker {
    rx: xch::Receiver<Reading>,
    exit_rx: xch::Receiver<WorkerExit>,
    /// Lifecycle flag, cleared by the thread itself on exit
    alive: Arc<AtomicBool>,
    /// Shutdown flag for cooperative cancellation (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    grace: Duration,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
    port: String,
}

impl AcquisitionWorker {
    /// Start reading `source` on a new thread.
    ///
    /// `capacity` bounds the handoff queue; `grace` bounds how long `stop`
    /// (and `Drop`) wait for the thread.
    pub fn spawn<S: LineSource + Send + 'static>(
        mut source: S,
        port: &str,
        capacity: usize,
        grace: Duration,
    ) -> Self {
        let (tx, rx) = handoff::<Reading>(capacity);
        let (exit_tx, exit_rx) = xch::bounded(1);
        let alive = Arc::new(AtomicBool::new(true));
        let alive_clone = alive.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let dropped = Arc::new(AtomicU64::new(0));
        let dropped_clone = dropped.clone();
        let port_name = port.to_string();

        let join_handle = std::thread::spawn(move || {
            let exit = loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!(port = %port_name, "reader received shutdown signal");
                    break WorkerExit::Stopped;
                }

                match source.read_line() {
                    Ok(Some(line)) => {
                        if line.is_empty() {
                            continue;
                        }
                        let Some(value) = parse_line(&line) else {
                            tracing::trace!(line = %line, "skipping unparseable line");
                            continue;
                        };
                        let evicted = tx.push(Reading {
                            value,
                            observed_at: Local::now(),
                        });
                        if evicted > 0 {
                            dropped_clone.fetch_add(evicted as u64, Ordering::Relaxed);
                            tracing::debug!(evicted, "handoff full; dropped oldest reading");
                        }
                    }
                    // Timeout: loop back to the shutdown check
                    Ok(None) => {}
                    Err(e) => {
                        if shutdown_clone.load(Ordering::Relaxed) {
                            tracing::debug!(error = %e, "read failed after shutdown; treating as stop");
                            break WorkerExit::Stopped;
                        }
                        tracing::error!(port = %port_name, error = %e, "sensor read failed; reader exiting");
                        break WorkerExit::Faulted(e.to_string());
                    }
                }
            };
            // Release the link before announcing the exit.
            drop(source);
            let _ = exit_tx.send(exit);
            alive_clone.store(false, Ordering::Release);
            tracing::trace!("reader thread exiting cleanly");
        });

        Self {
            rx,
            exit_rx,
            alive,
            shutdown,
            dropped,
            grace,
            join_handle: Some(join_handle),
            port: port.to_string(),
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn state(&self) -> WorkerState {
        if !self.is_alive() {
            WorkerState::Idle
        } else if self.shutdown.load(Ordering::Relaxed) {
            WorkerState::Stopping
        } else {
            WorkerState::Running
        }
    }

    /// Non-blocking drain of everything queued so far.
    pub fn drain(&self) -> xch::TryIter<'_, Reading> {
        self.rx.try_iter()
    }

    /// Readings shed by the drop-oldest policy since spawn.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Exit reason, once the thread has ended. Yields it at most once.
    pub fn take_exit(&self) -> Option<WorkerExit> {
        self.exit_rx.try_recv().ok()
    }

    /// Signal shutdown and wait up to the grace period. Safe to call repeatedly.
    pub fn stop(&mut self) -> StopOutcome {
        self.shutdown.store(true, Ordering::Relaxed);
        let Some(handle) = self.join_handle.take() else {
            return StopOutcome::Joined;
        };
        match self.exit_rx.recv_timeout(self.grace) {
            // Disconnected: the thread already ended and its exit was taken earlier
            Ok(_) | Err(xch::RecvTimeoutError::Disconnected) => {
                match handle.join() {
                    Ok(()) => tracing::trace!("reader thread joined successfully"),
                    Err(e) => tracing::warn!(?e, "reader thread panicked during shutdown"),
                }
                StopOutcome::Joined
            }
            Err(xch::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    port = %self.port,
                    grace_ms = self.grace.as_millis() as u64,
                    "reader did not stop in time; detaching"
                );
                StopOutcome::Detached
            }
        }
    }
}

impl Drop for AcquisitionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
