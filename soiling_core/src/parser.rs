//! Sensor line parsing.
//!
//! Accepts `LUX:123.4` (any label, case-insensitive; the text after the first
//! colon is the value) or a bare `123.4`. Everything else is skipped.

/// Parse one line into a lux value, or `None` when the line carries no reading.
pub fn parse_line(line: &str) -> Option<f64> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let number = match line.split_once(':') {
        Some((label, value)) => {
            if !label.trim().eq_ignore_ascii_case("lux") {
                tracing::trace!(label = label.trim(), "non-LUX label, using value anyway");
            }
            value
        }
        None => line,
    };
    number.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
