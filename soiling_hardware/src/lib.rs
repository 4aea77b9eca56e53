//! Sensor link implementations for the soiling monitor.
//!
//! - [`LineReader`] frames any byte stream into trimmed text lines.
//! - [`SimulatedConnector`] produces a noisy light signal without hardware.
//! - `serial` (feature `hardware`) opens real serial ports.
pub mod error;
pub mod line;
#[cfg(feature = "hardware")]
pub mod serial;

pub use line::LineReader;
#[cfg(feature = "hardware")]
pub use serial::{PortInfo, SerialConnector, available_ports};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use soiling_traits::{Connector, LineSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Opens [`SimulatedLightSensor`]s that share an adjustable base level.
#[derive(Clone)]
pub struct SimulatedConnector {
    base_lux: Arc<AtomicU64>,
    period: Duration,
    seed: u64,
}

impl SimulatedConnector {
    pub fn new(base_lux: f64, period: Duration) -> Self {
        Self {
            base_lux: Arc::new(AtomicU64::new(base_lux.to_bits())),
            period,
            seed: 0x5EED,
        }
    }

    /// Change the light level seen by every sensor opened from this connector.
    pub fn set_lux(&self, lux: f64) {
        self.base_lux.store(lux.to_bits(), Ordering::Relaxed);
    }

    pub fn lux(&self) -> f64 {
        f64::from_bits(self.base_lux.load(Ordering::Relaxed))
    }
}

impl Connector for SimulatedConnector {
    type Source = SimulatedLightSensor;

    fn open(
        &self,
        port: &str,
        baud: u32,
        read_timeout: Duration,
    ) -> Result<Self::Source, Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(port, baud, "opening simulated light sensor");
        Ok(SimulatedLightSensor {
            base_lux: self.base_lux.clone(),
            period: self.period,
            read_timeout,
            rng: StdRng::seed_from_u64(self.seed),
            emitted: 0,
        })
    }
}

/// Emits one line per period: alternating `LUX:<v>` and bare `<v>`, with ±2 %
/// jitter and an occasional garbage line the parser has to skip.
pub struct SimulatedLightSensor {
    base_lux: Arc<AtomicU64>,
    period: Duration,
    read_timeout: Duration,
    rng: StdRng,
    emitted: u64,
}

impl LineSource for SimulatedLightSensor {
    fn read_line(&mut self) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        if self.period > self.read_timeout {
            std::thread::sleep(self.read_timeout);
            return Ok(None);
        }
        std::thread::sleep(self.period);
        self.emitted += 1;
        if self.emitted % 16 == 0 {
            return Ok(Some("ERR:sensor busy".to_string()));
        }
        let base = f64::from_bits(self.base_lux.load(Ordering::Relaxed));
        let lux = (base * (1.0 + self.rng.gen_range(-0.02..=0.02))).max(0.0);
        let line = if self.emitted % 2 == 0 {
            format!("LUX:{lux:.2}")
        } else {
            format!("{lux:.2}")
        };
        Ok(Some(line))
    }
}
