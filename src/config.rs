//! Run configuration.
//!
//! A [`RunConfig`] tunes the driver without touching per-case state:
//!
//! - `max_passes_per_case` bounds traversal of a body that keeps producing
//!   new leaves, which only happens when the subcase shape is not stable
//!   across passes. The bound converts an infinite loop into a typed
//!   engine error.
//! - `default_precision` overrides the per-type default tolerance for
//!   approximate comparisons in cases that do not set their own.

use core::fmt;

/// Configuration for a test run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunConfig {
    /// Upper bound on passes executed for a single case.
    pub max_passes_per_case: u64,
    /// Run-wide precision override for approximate comparisons.
    ///
    /// `None` keeps the per-type defaults (`1e-6` for `f32`, `1e-12` for
    /// `f64`). A subcase-level override always wins over this value.
    pub default_precision: Option<f64>,
}

impl RunConfig {
    /// Validates the configuration for basic sanity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_passes_per_case == 0 {
            return Err(ConfigError::ZeroPassBudget);
        }
        if let Some(p) = self.default_precision {
            if !p.is_finite() || p <= 0.0 {
                return Err(ConfigError::InvalidPrecision(p));
            }
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_passes_per_case: 4096,
            default_precision: None,
        }
    }
}

/// Validation errors for [`RunConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// `max_passes_per_case` must be at least one.
    ZeroPassBudget,
    /// `default_precision` must be finite and positive.
    InvalidPrecision(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPassBudget => write!(f, "max_passes_per_case must be at least 1"),
            Self::InvalidPrecision(p) => {
                write!(f, "default_precision must be finite and positive, got {p}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::EngineError {
    fn from(err: ConfigError) -> Self {
        Self::new(crate::error::EngineErrorKind::Config, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_pass_budget_rejected() {
        let config = RunConfig {
            max_passes_per_case: 0,
            ..RunConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPassBudget));
    }

    #[test]
    fn precision_must_be_finite_and_positive() {
        for bad in [0.0, -1e-6, f64::NAN, f64::INFINITY] {
            let config = RunConfig {
                default_precision: Some(bad),
                ..RunConfig::default()
            };
            assert!(config.validate().is_err(), "{bad} should be rejected");
        }

        let config = RunConfig {
            default_precision: Some(1e-9),
            ..RunConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_error_converts_to_engine_error() {
        let err: crate::error::EngineError = ConfigError::ZeroPassBudget.into();
        assert_eq!(err.kind(), crate::error::EngineErrorKind::Config);
    }
}
