use chrono::{Duration as ChronoDuration, Local, TimeZone};
use soiling_core::error::MonitorError;
use soiling_core::{LogRecord, SessionLogger};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory sink that can be told to fail, counting every write attempt.
#[derive(Clone, Default)]
struct FlakySink {
    buf: Arc<Mutex<Vec<u8>>>,
    fail: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl Write for FlakySink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(io::Error::other("disk full"));
        }
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl FlakySink {
    fn text(&self) -> String {
        String::from_utf8(self.buf.lock().unwrap().clone()).unwrap()
    }
}

fn record(secs: i64, lux: f64, pct: f64) -> LogRecord {
    LogRecord {
        timestamp: Local.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        lux,
        dirt_pct: pct,
    }
}

#[test]
fn header_written_once_per_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.csv");
    let mut logger = SessionLogger::new();

    logger.start(&path).unwrap();
    logger.append(&record(0, 1000.0, 0.0)).unwrap();
    logger.append(&record(1, 700.0, 30.0)).unwrap();
    logger.stop().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "timestamp,lux,dirt_pct");
    assert!(lines[2].ends_with(",700.000,30.000"), "row: {}", lines[2]);
    assert_eq!(text.matches("timestamp,lux,dirt_pct").count(), 1);

    // Restarting truncates and writes a fresh header
    logger.start(&path).unwrap();
    logger.stop().unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "timestamp,lux,dirt_pct\n");
}

#[test]
fn values_use_three_decimals_and_iso_timestamps() {
    let sink = FlakySink::default();
    let mut logger = SessionLogger::new();
    logger
        .start_with_writer(Box::new(sink.clone()), Path::new("mem"))
        .unwrap();
    logger.append(&record(0, 1234.56789, 12.3456)).unwrap();

    let text = sink.text();
    let row = text.lines().nth(1).unwrap();
    let fields: Vec<&str> = row.split(',').collect();
    assert_eq!(fields[1], "1234.568");
    assert_eq!(fields[2], "12.346");
    let parsed = chrono::DateTime::parse_from_rfc3339(fields[0]).unwrap();
    assert_eq!(parsed.timestamp(), 1_700_000_000);
}

#[test]
fn timestamps_never_go_backwards() {
    let sink = FlakySink::default();
    let mut logger = SessionLogger::new();
    logger
        .start_with_writer(Box::new(sink.clone()), Path::new("mem"))
        .unwrap();
    let later = record(10, 1.0, 0.0);
    let mut earlier = later;
    earlier.timestamp = later.timestamp - ChronoDuration::seconds(5);
    logger.append(&later).unwrap();
    logger.append(&earlier).unwrap();

    let text = sink.text();
    let stamps: Vec<&str> = text
        .lines()
        .skip(1)
        .map(|l| l.split(',').next().unwrap())
        .collect();
    assert_eq!(stamps[0], stamps[1]);
}

#[test]
fn write_failure_disables_and_reports_once() {
    let sink = FlakySink::default();
    let mut logger = SessionLogger::new();
    logger
        .start_with_writer(Box::new(sink.clone()), Path::new("mem"))
        .unwrap();
    logger.append(&record(0, 1.0, 0.0)).unwrap();

    sink.fail.store(true, Ordering::SeqCst);
    let err = logger.append(&record(1, 2.0, 0.0)).unwrap_err();
    assert!(matches!(err, MonitorError::LogWrite(_)));
    assert!(!logger.is_active());

    let attempts = sink.writes.load(Ordering::SeqCst);
    for i in 2..10 {
        assert!(logger.append(&record(i, 3.0, 0.0)).is_ok());
    }
    assert_eq!(sink.writes.load(Ordering::SeqCst), attempts, "no-op appends must not touch the sink");
    assert!(logger.stop().is_ok());
}

#[test]
fn unwritable_path_is_log_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no").join("such").join("dir.csv");
    let mut logger = SessionLogger::new();
    match logger.start(&path) {
        Err(MonitorError::LogOpen { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected LogOpen, got {other:?}"),
    }
    assert!(!logger.is_active());
}

#[test]
fn failing_header_is_log_open_error() {
    let sink = FlakySink::default();
    sink.fail.store(true, Ordering::SeqCst);
    let mut logger = SessionLogger::new();
    let err = logger
        .start_with_writer(Box::new(sink), Path::new("mem"))
        .unwrap_err();
    assert!(matches!(err, MonitorError::LogOpen { .. }));
    assert!(!logger.is_active());
}

#[test]
fn stop_and_append_are_harmless_when_inactive() {
    let mut logger = SessionLogger::new();
    assert!(logger.append(&record(0, 1.0, 0.0)).is_ok());
    assert!(logger.stop().is_ok());
    assert!(logger.stop().is_ok());
    assert!(!logger.is_active());
}
