pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::time::Duration;

/// A line-oriented sensor link (serial port, simulator, test script).
pub trait LineSource {
    /// Block for at most the source's read timeout waiting for one complete line.
    ///
    /// `Ok(None)` means the timeout elapsed without a complete line; callers
    /// treat it as a chance to check for cancellation, not as a failure.
    /// `Err` is a hard I/O failure and ends the session.
    fn read_line(&mut self) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Opens a [`LineSource`] for a named port.
pub trait Connector {
    type Source: LineSource + Send + 'static;

    fn open(
        &self,
        port: &str,
        baud: u32,
        read_timeout: Duration,
    ) -> Result<Self::Source, Box<dyn std::error::Error + Send + Sync>>;
}
