//! Time source for the coordinator's poll cadence and run limits.

use std::time::{Duration, Instant};

/// Where "now" comes from and how waiting happens.
///
/// Production code uses [`MonotonicClock`]; tests substitute a clock whose
/// `sleep` only moves time forward.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Time since `epoch`; zero if `epoch` lies in the future.
    fn elapsed_since(&self, epoch: Instant) -> Duration {
        self.now().saturating_duration_since(epoch)
    }

    /// Whole milliseconds since `epoch`, saturating.
    fn ms_since(&self, epoch: Instant) -> u64 {
        u64::try_from(self.elapsed_since(epoch).as_millis()).unwrap_or(u64::MAX)
    }
}

/// Wall-independent clock backed by [`Instant`] and [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_clock {
    use super::{Clock, Duration, Instant};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Inner {
        offset: Duration,
        sleeps: u64,
    }

    /// Manually driven clock: `sleep` advances virtual time and returns at once.
    /// Clones share the same timeline.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        inner: Arc<Mutex<Inner>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                inner: Arc::new(Mutex::new(Inner::default())),
            }
        }

        pub fn advance(&self, d: Duration) {
            if let Ok(mut g) = self.inner.lock() {
                g.offset = g.offset.saturating_add(d);
            }
        }

        /// How many times `sleep` has been called.
        pub fn sleep_count(&self) -> u64 {
            self.inner.lock().map(|g| g.sleeps).unwrap_or(0)
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            let offset = self.inner.lock().map(|g| g.offset).unwrap_or_default();
            self.origin + offset
        }

        fn sleep(&self, d: Duration) {
            if let Ok(mut g) = self.inner.lock() {
                g.sleeps += 1;
                g.offset = g.offset.saturating_add(d);
            }
        }
    }

}
