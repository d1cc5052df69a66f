//! Analysis constants and runtime configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FingerprintError, Result};

/// Samples advanced per analysis frame.
pub const HOP_SIZE: usize = 256;

/// Samples covered by one analysis window.
pub const WINDOW_SIZE: usize = 512;

/// Mel filters in the filter bank.
pub const FILTER_COUNT: usize = 40;

/// Coefficients stored per fingerprint frame (K).
pub const COEF_COUNT: usize = 13;

/// Matching tolerance used when none is configured.
pub const DEFAULT_TOLERANCE: f64 = 0.001;

const MIB: u64 = 1024 * 1024;

/// Runtime settings for ingestion and matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Default half-width of the per-coefficient acceptance window.
    pub tolerance: f64,

    /// Default number of leading coefficients compared when matching.
    pub coefs: usize,

    /// Base extraction timeout.
    pub extract_timeout_secs: u64,

    /// Extra extraction time granted per started MiB of input.
    pub extract_timeout_secs_per_mib: u64,

    /// Deadline for the per-frame query loop of one match.
    pub match_timeout_secs: u64,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            coefs: 1,
            extract_timeout_secs: 30,
            extract_timeout_secs_per_mib: 10,
            match_timeout_secs: 60,
        }
    }
}

impl FingerprintConfig {
    /// Checks `coefs` and that the default tolerance is usable.
    pub fn validate(&self) -> Result<()> {
        check_coefs(self.coefs)?;
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(FingerprintError::InvalidArgument(format!(
                "default tolerance must be >= 0, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Tolerance to use for a request. Missing or negative values fall
    /// back to the configured default.
    pub fn resolve_tolerance(&self, requested: Option<f64>) -> f64 {
        resolve_tolerance(requested, self.tolerance)
    }

    /// Extraction timeout for a file of `len` bytes.
    pub fn extract_timeout(&self, len: u64) -> Duration {
        let mib = len.div_ceil(MIB);
        Duration::from_secs(
            self.extract_timeout_secs
                .saturating_add(self.extract_timeout_secs_per_mib.saturating_mul(mib)),
        )
    }

    pub fn match_timeout(&self) -> Duration {
        Duration::from_secs(self.match_timeout_secs)
    }
}

pub(crate) fn resolve_tolerance(requested: Option<f64>, default: f64) -> f64 {
    let fallback = if default >= 0.0 { default } else { DEFAULT_TOLERANCE };
    match requested {
        Some(t) if t >= 0.0 => t,
        _ => fallback,
    }
}

pub(crate) fn check_coefs(coefs: usize) -> Result<()> {
    if (1..=COEF_COUNT).contains(&coefs) {
        Ok(())
    } else {
        Err(FingerprintError::InvalidArgument(format!(
            "coefficient count must be in 1..={COEF_COUNT}, got {coefs}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = FingerprintConfig::default();
        assert_eq!(cfg.tolerance, 0.001);
        assert_eq!(cfg.coefs, 1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn negative_or_missing_tolerance_uses_default() {
        let cfg = FingerprintConfig {
            tolerance: 0.5,
            ..Default::default()
        };
        assert_eq!(cfg.resolve_tolerance(None), 0.5);
        assert_eq!(cfg.resolve_tolerance(Some(-1.0)), 0.5);
        assert_eq!(cfg.resolve_tolerance(Some(f64::NAN)), 0.5);
        assert_eq!(cfg.resolve_tolerance(Some(0.0)), 0.0);
        assert_eq!(cfg.resolve_tolerance(Some(2.0)), 2.0);

        assert_eq!(resolve_tolerance(Some(-3.0), -1.0), DEFAULT_TOLERANCE);
    }

    #[test]
    fn coefficient_range() {
        assert!(check_coefs(0).is_err());
        assert!(check_coefs(1).is_ok());
        assert!(check_coefs(13).is_ok());
        assert!(matches!(
            check_coefs(14),
            Err(FingerprintError::InvalidArgument(_))
        ));
    }

    #[test]
    fn extract_timeout_scales_with_size() {
        let cfg = FingerprintConfig::default();
        assert_eq!(cfg.extract_timeout(0), Duration::from_secs(30));
        assert_eq!(cfg.extract_timeout(1), Duration::from_secs(40));
        assert_eq!(cfg.extract_timeout(3 * MIB), Duration::from_secs(60));
        assert_eq!(cfg.extract_timeout(3 * MIB + 1), Duration::from_secs(70));
    }

    #[test]
    fn deserializes_partial_yaml_like_json() {
        let cfg: FingerprintConfig = serde_json::from_str(r#"{"tolerance": 0.25}"#).unwrap();
        assert_eq!(cfg.tolerance, 0.25);
        assert_eq!(cfg.match_timeout_secs, 60);
    }
}
