//! Soiling percentage relative to a clean-panel baseline.
//!
//! Linear in the light deficit, no dead-band: jitter right at the baseline
//! can flicker between 0 % and a small positive value.

use crate::calibration::Calibration;

/// Percentage of light lost relative to the clean baseline, in `[0, 100]`.
///
/// Uncalibrated (or a non-positive baseline) always reads 0.
pub fn dirt_percent(smoothed_lux: f64, calibration: &Calibration) -> f64 {
    let Some(clean) = calibration.clean_lux.filter(|c| *c > 0.0) else {
        return 0.0;
    };
    if smoothed_lux >= clean {
        return 0.0;
    }
    ((clean - smoothed_lux) / clean * 100.0).clamp(0.0, 100.0)
}

/// Coarse severity band for a dirt percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirtLevel {
    /// below 30 %
    Low,
    /// 30 % up to (not including) 70 %
    Moderate,
    /// 70 % and above
    High,
}

impl DirtLevel {
    pub fn classify(pct: f64) -> Self {
        if pct < 30.0 {
            Self::Low
        } else if pct < 70.0 {
            Self::Moderate
        } else {
            Self::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}
