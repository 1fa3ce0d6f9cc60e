//! Common thresholds and window helpers shared across all detector modules.

use crate::{AnalysisError, Result, OHLCV};

// ============================================================
// THRESHOLDS
// ============================================================

/// Doji: body / range < DOJI_RATIO
pub const DOJI_RATIO: f64 = 0.1;
/// Hammer family: dominant shadow > body * LONG_SHADOW_FACTOR
pub const LONG_SHADOW_FACTOR: f64 = 2.5;
/// Hammer family: opposite shadow < body * SHORT_SHADOW_FACTOR
pub const SHORT_SHADOW_FACTOR: f64 = 0.5;
/// Spinning top: body below this absolute size
pub const SPINNING_TOP_MAX_BODY: f64 = 1.0;
/// Spinning top: both shadows > body * SPINNING_TOP_SHADOW_FACTOR
pub const SPINNING_TOP_SHADOW_FACTOR: f64 = 1.5;
/// Long legged doji: both shadows > range * LONG_LEG_RATIO
pub const LONG_LEG_RATIO: f64 = 0.3;
/// Dragonfly/Gravestone: dominant shadow > range * DOMINANT_SHADOW_RATIO
pub const DOMINANT_SHADOW_RATIO: f64 = 0.5;
/// Dragonfly/Gravestone: opposite shadow < range * MINOR_SHADOW_RATIO
pub const MINOR_SHADOW_RATIO: f64 = 0.1;
/// Double top/bottom and shoulders: extrema within this fraction of each other
pub const EXTREMA_TOLERANCE: f64 = 0.02;
/// Triangle: window high-low span must stay under this bound
pub const TRIANGLE_MAX_SPAN: f64 = 10.0;
/// Triangle: std(highs) > std(lows) * TRIANGLE_VOLATILITY_RATIO
pub const TRIANGLE_VOLATILITY_RATIO: f64 = 0.3;
/// Price near-equality relative to the trailing 5-bar range
pub const NEAR_FACTOR: f64 = 0.2;
/// Price equality relative to the trailing 5-bar range
pub const EQUAL_FACTOR: f64 = 0.05;

// ============================================================
// WINDOW HELPERS
// ============================================================

/// The `len` bars ending at `index` (inclusive), if that many exist.
#[inline]
pub fn window<T>(bars: &[T], index: usize, len: usize) -> Option<&[T]> {
    if len == 0 || index >= bars.len() || index + 1 < len {
        return None;
    }
    Some(&bars[index + 1 - len..=index])
}

/// Arithmetic mean; 0.0 for an empty slice
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// `a` and `b` differ by less than `tolerance * reference`
#[inline]
pub fn within_tolerance(a: f64, b: f64, reference: f64, tolerance: f64) -> bool {
    (a - b).abs() < reference * tolerance
}

/// Compute trailing average range over the bars before `at` (for Near/Equal).
#[inline]
pub fn trailing_avg_range<T: OHLCV>(bars: &[T], at: usize, period: usize) -> f64 {
    if at == 0 {
        return crate::OHLCVExt::range(&bars[0]);
    }
    let s = at.saturating_sub(period);
    let slice = &bars[s..at];
    let sum: f64 = slice.iter().map(|b| crate::OHLCVExt::range(b)).sum();
    sum / slice.len() as f64
}

/// Reject NaN, infinite or non-positive threshold factors
pub fn check_factor(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(AnalysisError::InvalidValue("threshold must be finite"));
    }
    if value <= 0.0 {
        return Err(AnalysisError::OutOfRange {
            field,
            value,
            min: f64::MIN_POSITIVE,
            max: f64::MAX,
        });
    }
    Ok(())
}
