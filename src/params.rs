//! Tunable detector thresholds
//!
//! Detectors expose their thresholds as public fields. The ones worth
//! sweeping also implement [`ParameterizedDetector`], which publishes the
//! parameter names, defaults and search ranges so callers can:
//! - Build a detector from a name/value map
//! - Enumerate a threshold grid for calibration
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use chartscan::params::ParameterizedDetector;
//! use chartscan::prelude::*;
//!
//! for param in HammerDetector::param_meta() {
//!   println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let mut params = HashMap::new();
//! params.insert("long_shadow_factor", 3.0);
//! let hammer = HammerDetector::with_params(&params).unwrap();
//! assert_eq!(hammer.long_shadow_factor, 3.0);
//! ```

use std::collections::HashMap;

use crate::{AnalysisError, Period, Ratio, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Fraction in 0.0..=1.0
  Ratio,
  /// Positive multiplier or price distance (may exceed 1.0)
  Factor,
  /// Window length (positive integer)
  Period,
}

/// Metadata for a single detector parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name, matching the detector field (e.g., "long_shadow_factor")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Range for calibration: (min, max, step)
  pub range: (f64, f64, f64),
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  pub const fn factor(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Factor, default, range, description }
  }

  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  /// All values from `min` to `max` in `step` increments
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    let mut values = Vec::new();
    if step <= 0.0 {
      return values;
    }
    let mut i = 0usize;
    loop {
      let v = min + step * i as f64;
      if v > max + 1e-9 {
        break;
      }
      values.push(v);
      i += 1;
    }
    values
  }

  /// Check a candidate value against the calibration range and type
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value.is_nan() || value < min || value > max {
      return Err(AnalysisError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Ratio => Ratio::new(value).map(|_| ()),
      ParamType::Factor => Ok(()),
      ParamType::Period => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(AnalysisError::InvalidValue("Period must be a positive integer"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Detectors that can be built from a parameter map
pub trait ParameterizedDetector: Sized {
  /// Metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Build a detector from a parameter map; missing keys use defaults.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

  /// Pattern name this detector reports
  fn pattern_id_str() -> &'static str;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
  let value = params.get(key).copied().unwrap_or(default);
  Ratio::new(value)
}

/// Positive finite multiplier from params with default fallback
pub fn get_factor(params: &HashMap<&str, f64>, key: &'static str, default: f64) -> Result<f64> {
  let value = params.get(key).copied().unwrap_or(default);
  if !value.is_finite() {
    return Err(AnalysisError::InvalidValue("factor must be finite"));
  }
  if value <= 0.0 {
    return Err(AnalysisError::OutOfRange { field: key, value, min: f64::MIN_POSITIVE, max: f64::MAX });
  }
  Ok(value)
}

/// Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
  let value = params.get(key).copied().unwrap_or(default as f64);
  if !value.is_finite() || value < 1.0 || value.fract() != 0.0 {
    return Err(AnalysisError::InvalidValue("Period must be a positive integer"));
  }
  Period::new(value as usize)
}

// ============================================================
// TESTS
// ============================================================
