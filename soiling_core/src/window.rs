//! Fixed-size moving-average window.

use std::collections::VecDeque;

/// Number of readings averaged by the window.
pub const WINDOW_CAPACITY: usize = 6;

/// Strict FIFO of the last [`WINDOW_CAPACITY`] readings.
#[derive(Debug, Clone, Default)]
pub struct SmoothingWindow {
    buf: VecDeque<f64>,
}

impl SmoothingWindow {
    pub fn new() -> Self {
        Self {
            buf: VecDeque::with_capacity(WINDOW_CAPACITY),
        }
    }

    /// Append a reading, evicting the oldest once the window is full.
    pub fn push(&mut self, value: f64) {
        if self.buf.len() == WINDOW_CAPACITY {
            self.buf.pop_front();
        }
        self.buf.push_back(value);
    }

    /// Arithmetic mean of the current contents; `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.buf.is_empty() {
            return None;
        }
        let n = self.buf.len() as f64;
        let sum: f64 = self.buf.iter().sum();
        if sum.is_finite() {
            return Some(sum / n);
        }
        // Huge readings overflow the plain sum; scale first.
        Some(self.buf.iter().map(|v| v / n).sum())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == WINDOW_CAPACITY
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
