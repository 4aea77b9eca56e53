//! Human-readable error descriptions and structured JSON error formatting.

use soiling_core::MonitorError;

/// Stable short name for a monitor error, used as the JSON `reason`.
pub fn reason_name(e: &MonitorError) -> &'static str {
    match e {
        MonitorError::Connection { .. } => "Connection",
        MonitorError::CalibrationUnavailable => "CalibrationUnavailable",
        MonitorError::InvalidBaseline(_) => "InvalidBaseline",
        MonitorError::CalibrationStore(_) => "CalibrationStore",
        MonitorError::LogOpen { .. } => "LogOpen",
        MonitorError::LogWrite(_) => "LogWrite",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(me) = err.downcast_ref::<MonitorError>() {
        return match me {
            MonitorError::Connection { port, reason } => format!(
                "What happened: Could not talk to the light sensor on {port} ({reason}).\nLikely causes: Wrong port name, sensor unplugged, or the port is held by another program.\nHow to fix: Run `soiling ports` to list ports, check the cable, then pass --port or set [serial] port."
            ),
            MonitorError::CalibrationUnavailable => {
                "What happened: No readings were available to calibrate from.\nLikely causes: The sensor is silent, sends unparseable lines, or the timeout is too short.\nHow to fix: Check the sensor output and retry, or raise --timeout-s.".to_string()
            }
            MonitorError::InvalidBaseline(v) => format!(
                "What happened: The measured clean-panel level ({v} lux) cannot be used as a baseline.\nLikely causes: The sensor is covered or reporting zero.\nHow to fix: Calibrate in daylight with a freshly cleaned panel."
            ),
            MonitorError::CalibrationStore(msg) => format!(
                "What happened: The calibration file could not be written ({msg}).\nLikely causes: Missing permissions or a read-only filesystem.\nHow to fix: Point --calibration or [calibration] path at a writable location."
            ),
            MonitorError::LogOpen { path, reason } => format!(
                "What happened: Cannot open the session log {} ({reason}).\nLikely causes: The directory does not exist or is not writable.\nHow to fix: Choose another --log path.",
                path.display()
            ),
            MonitorError::LogWrite(msg) => format!(
                "What happened: Writing the session log failed ({msg}); logging was turned off.\nLikely causes: Disk full or the storage device was removed.\nHow to fix: Free space or reattach the device, then start a new log."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.starts_with("invalid config") {
        let root = err.root_cause();
        return format!(
            "What happened: Configuration is invalid ({root}).\nLikely causes: A typo or an out-of-range value in {}.\nHow to fix: Edit the config file (see etc/soiling.toml) and try again.",
            msg.trim_start_matches("invalid config ")
        );
    }

    if lower.contains("serial support") {
        return format!(
            "What happened: {msg}.\nHow to fix: Rebuild with `--features hardware`, or use --sim."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: connection 2, calibration 3, logging 4, anything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<MonitorError>() {
        Some(MonitorError::Connection { .. }) => 2,
        Some(
            MonitorError::CalibrationUnavailable
            | MonitorError::InvalidBaseline(_)
            | MonitorError::CalibrationStore(_),
        ) => 3,
        Some(MonitorError::LogOpen { .. } | MonitorError::LogWrite(_)) => 4,
        None => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let msg = humanize(err);
    match err.downcast_ref::<MonitorError>() {
        Some(me @ MonitorError::Connection { port, .. }) => {
            json!({ "reason": reason_name(me), "details": { "port": port }, "message": msg })
        }
        Some(me @ MonitorError::LogOpen { path, .. }) => {
            json!({ "reason": reason_name(me), "details": { "path": path }, "message": msg })
        }
        Some(me) => json!({ "reason": reason_name(me), "message": msg }),
        None => json!({ "reason": "Error", "message": msg }),
    }
    .to_string()
}
