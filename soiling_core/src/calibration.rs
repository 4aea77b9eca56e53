//! Clean-panel baseline and its JSON persistence.
//!
//! File format: `{ "clean_lux": <number|null> }`. Loading never fails; any
//! problem with the file reads as "uncalibrated".

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::atomic::write_atomic;
use crate::error::{MonitorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Calibration {
    /// Smoothed lux of a clean panel; `None` means uncalibrated. Always > 0 when set.
    #[serde(default)]
    pub clean_lux: Option<f64>,
}

impl Calibration {
    pub fn uncalibrated() -> Self {
        Self { clean_lux: None }
    }

    /// Baseline from a measured clean-panel level; rejects non-positive or non-finite values.
    pub fn from_clean_lux(lux: f64) -> Result<Self> {
        if lux.is_finite() && lux > 0.0 {
            Ok(Self {
                clean_lux: Some(lux),
            })
        } else {
            Err(MonitorError::InvalidBaseline(lux))
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.clean_lux.is_some()
    }
}

/// Durable home of the single [`Calibration`] value.
#[derive(Debug, Clone)]
pub struct CalibrationStore {
    path: PathBuf,
}

impl CalibrationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Calibration {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = ?self.path, "no calibration file; uncalibrated");
                return Calibration::uncalibrated();
            }
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "cannot read calibration; uncalibrated");
                return Calibration::uncalibrated();
            }
        };
        match serde_json::from_str::<Calibration>(&text) {
            Ok(Calibration {
                clean_lux: Some(lux),
            }) => Calibration::from_clean_lux(lux).unwrap_or_else(|e| {
                tracing::warn!(path = ?self.path, error = %e, "ignoring stored calibration");
                Calibration::uncalibrated()
            }),
            Ok(_) => Calibration::uncalibrated(),
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "malformed calibration file; uncalibrated");
                Calibration::uncalibrated()
            }
        }
    }

    pub fn save(&self, calibration: &Calibration) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(calibration)
            .map_err(|e| MonitorError::CalibrationStore(e.to_string()))?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes)
            .map_err(|e| MonitorError::CalibrationStore(format!("write {:?}: {e}", self.path)))?;
        tracing::debug!(path = ?self.path, clean_lux = ?calibration.clean_lux, "calibration saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"clean_lux": 812.5}"#, Some(812.5))]
    #[case(r#"{"clean_lux": 900}"#, Some(900.0))]
    #[case(r#"{"clean_lux": null}"#, None)]
    #[case(r#"{}"#, None)]
    #[case(r#"{"clean_lux": "bright"}"#, None)]
    #[case(r#"{"clean_lux": 0}"#, None)]
    #[case(r#"{"clean_lux": -3.0}"#, None)]
    #[case("not json", None)]
    #[case("", None)]
    fn load_is_tolerant(#[case] body: &str, #[case] expected: Option<f64>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        std::fs::write(&path, body).unwrap();
        assert_eq!(CalibrationStore::new(&path).load().clean_lux, expected);
    }

    #[test]
    fn missing_file_is_uncalibrated() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalibrationStore::new(dir.path().join("absent.json"));
        assert_eq!(store.load(), Calibration::uncalibrated());
    }

    #[test]
    fn saves_expected_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalibrationStore::new(dir.path().join("calibration.json"));
        store.save(&Calibration::uncalibrated()).unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(v, serde_json::json!({ "clean_lux": null }));
    }

    #[test]
    fn baseline_must_be_positive() {
        assert!(Calibration::from_clean_lux(1.0).is_ok());
        assert_eq!(
            Calibration::from_clean_lux(0.0),
            Err(MonitorError::InvalidBaseline(0.0))
        );
        assert!(Calibration::from_clean_lux(f64::NAN).is_err());
    }
}
