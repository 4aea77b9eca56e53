//! CSV session log with failure containment.
//!
//! One header per session, one flushed row per update. The first write
//! failure closes the session and is reported once; later appends are no-ops
//! until the next `start`.

use chrono::{DateTime, Local, SecondsFormat};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{MonitorError, Result};

pub const CSV_HEADER: [&str; 3] = ["timestamp", "lux", "dirt_pct"];

/// One persisted row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub lux: f64,
    pub dirt_pct: f64,
}

struct Session {
    writer: csv::Writer<Box<dyn Write + Send>>,
    label: PathBuf,
    last_ts: Option<DateTime<Local>>,
    rows: u64,
}

#[derive(Default)]
pub struct SessionLogger {
    session: Option<Session>,
}

impl SessionLogger {
    pub fn new() -> Self {
        Self { session: None }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Create/truncate `path` and begin a session.
    pub fn start(&mut self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| MonitorError::LogOpen {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.start_with_writer(Box::new(file), path)
    }

    /// Begin a session on an arbitrary sink; `label` names it in logs and errors.
    pub fn start_with_writer(&mut self, sink: Box<dyn Write + Send>, label: &Path) -> Result<()> {
        if self.session.is_some() {
            // A failed flush of the previous session was already logged by stop().
            let _ = self.stop();
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        let open_err = |e: &dyn std::fmt::Display| MonitorError::LogOpen {
            path: label.to_path_buf(),
            reason: e.to_string(),
        };
        writer.write_record(CSV_HEADER).map_err(|e| open_err(&e))?;
        writer.flush().map_err(|e| open_err(&e))?;
        tracing::info!(path = ?label, "session log started");
        self.session = Some(Session {
            writer,
            label: label.to_path_buf(),
            last_ts: None,
            rows: 0,
        });
        Ok(())
    }

    /// Append one row. Inactive logger: `Ok(())` and nothing written.
    pub fn append(&mut self, record: &LogRecord) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let ts = match session.last_ts {
            Some(prev) if prev > record.timestamp => prev,
            _ => record.timestamp,
        };
        let row = [
            ts.to_rfc3339_opts(SecondsFormat::Millis, false),
            format!("{:.3}", record.lux),
            format!("{:.3}", record.dirt_pct),
        ];
        let res = session
            .writer
            .write_record(&row)
            .map_err(|e| e.to_string())
            .and_then(|()| session.writer.flush().map_err(|e| e.to_string()));
        match res {
            Ok(()) => {
                session.last_ts = Some(ts);
                session.rows += 1;
                Ok(())
            }
            Err(reason) => {
                tracing::error!(path = ?session.label, error = %reason, "session log write failed; logging disabled");
                // Drop without a final flush: the sink already failed.
                self.session = None;
                Err(MonitorError::LogWrite(reason))
            }
        }
    }

    /// Flush and close. Idempotent.
    pub fn stop(&mut self) -> Result<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        let res = session.writer.flush();
        tracing::info!(path = ?session.label, rows = session.rows, "session log stopped");
        res.map_err(|e| MonitorError::LogWrite(e.to_string()))
    }
}

impl Drop for SessionLogger {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(error = %e, "session log flush failed on drop");
        }
    }
}
