//! Newline framing over a byte stream with a read timeout.
//!
//! Bytes read before a timeout are kept and completed by the next call, so a
//! line split across two reads is never lost or garbled.

use std::io::{BufRead, BufReader, ErrorKind, Read};

use soiling_traits::LineSource;

use crate::error::{HwError, Result};

/// Upper bound on a buffered partial line before the link is declared broken.
pub const MAX_LINE_BYTES: usize = 4096;

pub struct LineReader<R> {
    inner: BufReader<R>,
    pending: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            pending: Vec::with_capacity(64),
        }
    }

    /// Read one trimmed line. `Ok(None)` on timeout; blank lines come back as `Some("")`.
    ///
    /// A line that grows past [`MAX_LINE_BYTES`] without a terminator is
    /// `LineTooLong`, even when the bytes never stop arriving.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        let room = (MAX_LINE_BYTES + 1).saturating_sub(self.pending.len()) as u64;
        match (&mut self.inner).take(room).read_until(b'\n', &mut self.pending) {
            Ok(0) if self.pending.is_empty() => Err(HwError::Closed),
            Ok(_)
                if self.pending.last() != Some(&b'\n')
                    && self.pending.len() > MAX_LINE_BYTES =>
            {
                Err(self.overflow())
            }
            Ok(_) => Ok(Some(self.take_line())),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                if self.pending.len() > MAX_LINE_BYTES {
                    return Err(self.overflow());
                }
                Ok(None)
            }
            Err(e) => Err(HwError::Io(e)),
        }
    }

    fn overflow(&mut self) -> HwError {
        self.pending.clear();
        HwError::LineTooLong(MAX_LINE_BYTES)
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.pending).trim().to_string();
        self.pending.clear();
        line
    }
}

impl<R: Read> LineSource for LineReader<R> {
    fn read_line(&mut self) -> std::result::Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        self.next_line().map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    }
}
