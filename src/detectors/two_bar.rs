//! Two-bar candlestick pattern detectors
//!
//! Bullish/Bearish Engulfing, Piercing Line, Dark Cloud Cover,
//! Bullish/Bearish Harami, Thrusting Line.

use std::collections::HashMap;

use super::ids;
use crate::{
    params::{get_ratio, ParamMeta, ParameterizedDetector},
    Direction, OHLCVExt, PatternDetector, PatternId, PatternMatch, Ratio, Result, OHLCV,
};

impl_with_defaults!(
    BullishEngulfingDetector,
    BearishEngulfingDetector,
    PiercingLineDetector,
    DarkCloudCoverDetector,
    BullishHaramiDetector,
    BearishHaramiDetector,
    ThrustingLineDetector,
);

/// Previous and current bar for a window ending at `index`
#[inline]
fn pair<T>(bars: &[T], index: usize) -> Option<(&T, &T)> {
    if index < 1 {
        return None;
    }
    Some((bars.get(index - 1)?, bars.get(index)?))
}

#[inline]
fn two_bar(id: PatternId, direction: Direction, index: usize) -> PatternMatch {
    PatternMatch {
        pattern_id: id,
        direction,
        start_index: index - 1,
        end_index: index,
    }
}

// ============================================================
// ENGULFING PATTERNS
// ============================================================

/// Bullish Engulfing: a bullish body that swallows the previous bearish body
#[derive(Debug, Clone)]
pub struct BullishEngulfingDetector {
    /// current body must exceed previous body / min_engulf_ratio
    pub min_engulf_ratio: Ratio,
}

impl Default for BullishEngulfingDetector {
    fn default() -> Self {
        Self {
            min_engulf_ratio: Ratio::new_const(1.0),
        }
    }
}

impl PatternDetector for BullishEngulfingDetector {
    fn id(&self) -> PatternId {
        ids::BULLISH_ENGULFING
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (prev, curr) = pair(bars, index)?;

        if !prev.is_bearish() || !curr.is_bullish() {
            return None;
        }
        if curr.close() <= prev.open() || curr.open() >= prev.close() {
            return None;
        }
        if curr.body() * self.min_engulf_ratio.get() <= prev.body() {
            return None;
        }

        Some(two_bar(self.id(), Direction::Bullish, index))
    }

    fn validate_config(&self) -> Result<()> {
        validate_engulf_ratio(self.min_engulf_ratio)
    }
}

/// Bearish Engulfing: a bearish body that swallows the previous bullish body
#[derive(Debug, Clone)]
pub struct BearishEngulfingDetector {
    pub min_engulf_ratio: Ratio,
}

impl Default for BearishEngulfingDetector {
    fn default() -> Self {
        Self {
            min_engulf_ratio: Ratio::new_const(1.0),
        }
    }
}

impl PatternDetector for BearishEngulfingDetector {
    fn id(&self) -> PatternId {
        ids::BEARISH_ENGULFING
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (prev, curr) = pair(bars, index)?;

        if !prev.is_bullish() || !curr.is_bearish() {
            return None;
        }
        if curr.open() <= prev.close() || curr.close() >= prev.open() {
            return None;
        }
        if curr.body() * self.min_engulf_ratio.get() <= prev.body() {
            return None;
        }

        Some(two_bar(self.id(), Direction::Bearish, index))
    }

    fn validate_config(&self) -> Result<()> {
        validate_engulf_ratio(self.min_engulf_ratio)
    }
}

fn validate_engulf_ratio(ratio: Ratio) -> Result<()> {
    if ratio.get() <= 0.0 {
        return Err(crate::AnalysisError::InvalidValue(
            "min_engulf_ratio must be > 0",
        ));
    }
    Ok(())
}

// ============================================================
// PIERCING / DARK CLOUD
// ============================================================

/// Piercing Line: opens below the prior close and recovers past its midpoint
#[derive(Debug, Clone)]
pub struct PiercingLineDetector {
    /// fraction of the previous body the close must recover
    pub min_pierce_ratio: Ratio,
}

impl Default for PiercingLineDetector {
    fn default() -> Self {
        Self {
            min_pierce_ratio: Ratio::new_const(0.5),
        }
    }
}

impl PatternDetector for PiercingLineDetector {
    fn id(&self) -> PatternId {
        ids::PIERCING_LINE
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (prev, curr) = pair(bars, index)?;

        if !prev.is_bearish() || !curr.is_bullish() {
            return None;
        }
        if curr.open() >= prev.close() {
            return None;
        }
        // Recovers past the pierce level without engulfing
        let pierce = prev.close() + prev.body() * self.min_pierce_ratio.get();
        if curr.close() <= pierce || curr.close() >= prev.open() {
            return None;
        }

        Some(two_bar(self.id(), Direction::Bullish, index))
    }
}

/// Dark Cloud Cover: opens above the prior close and falls past its midpoint
#[derive(Debug, Clone)]
pub struct DarkCloudCoverDetector {
    pub min_pierce_ratio: Ratio,
}

impl Default for DarkCloudCoverDetector {
    fn default() -> Self {
        Self {
            min_pierce_ratio: Ratio::new_const(0.5),
        }
    }
}

impl PatternDetector for DarkCloudCoverDetector {
    fn id(&self) -> PatternId {
        ids::DARK_CLOUD_COVER
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (prev, curr) = pair(bars, index)?;

        if !prev.is_bullish() || !curr.is_bearish() {
            return None;
        }
        if curr.open() <= prev.close() {
            return None;
        }
        let pierce = prev.close() - prev.body() * self.min_pierce_ratio.get();
        if curr.close() >= pierce || curr.close() <= prev.open() {
            return None;
        }

        Some(two_bar(self.id(), Direction::Bearish, index))
    }
}

// ============================================================
// HARAMI PATTERNS
// ============================================================

/// Bullish Harami: small bullish body inside the previous bearish body
#[derive(Debug, Clone)]
pub struct BullishHaramiDetector {
    /// current body must stay below previous body * max_body_ratio
    pub max_body_ratio: Ratio,
}

impl Default for BullishHaramiDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(1.0),
        }
    }
}

impl PatternDetector for BullishHaramiDetector {
    fn id(&self) -> PatternId {
        ids::BULLISH_HARAMI
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (prev, curr) = pair(bars, index)?;

        if !prev.is_bearish() || !curr.is_bullish() {
            return None;
        }
        if curr.body() >= prev.body() * self.max_body_ratio.get() {
            return None;
        }
        if curr.open() <= prev.close() || curr.close() >= prev.open() {
            return None;
        }

        Some(two_bar(self.id(), Direction::Bullish, index))
    }
}

/// Bearish Harami: small bearish body inside the previous bullish body
#[derive(Debug, Clone)]
pub struct BearishHaramiDetector {
    pub max_body_ratio: Ratio,
}

impl Default for BearishHaramiDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(1.0),
        }
    }
}

impl PatternDetector for BearishHaramiDetector {
    fn id(&self) -> PatternId {
        ids::BEARISH_HARAMI
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (prev, curr) = pair(bars, index)?;

        if !prev.is_bullish() || !curr.is_bearish() {
            return None;
        }
        if curr.body() >= prev.body() * self.max_body_ratio.get() {
            return None;
        }
        if curr.open() >= prev.close() || curr.close() <= prev.open() {
            return None;
        }

        Some(two_bar(self.id(), Direction::Bearish, index))
    }
}

// ============================================================
// THRUSTING
// ============================================================

/// Thrusting Line: gap below the prior low that recovers no further than its midpoint
#[derive(Debug, Clone)]
pub struct ThrustingLineDetector {
    /// close must not pass prev.close + prev.body * max_recovery_ratio
    pub max_recovery_ratio: Ratio,
}

impl Default for ThrustingLineDetector {
    fn default() -> Self {
        Self {
            max_recovery_ratio: Ratio::new_const(0.5),
        }
    }
}

impl PatternDetector for ThrustingLineDetector {
    fn id(&self) -> PatternId {
        ids::THRUSTING_LINE
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (prev, curr) = pair(bars, index)?;

        if !prev.is_bearish() || !curr.is_bullish() {
            return None;
        }
        if curr.open() >= prev.low() {
            return None;
        }
        let ceiling = prev.close() + prev.body() * self.max_recovery_ratio.get();
        if curr.close() <= prev.close() || curr.close() > ceiling {
            return None;
        }

        // Continuation of the prior decline
        Some(two_bar(self.id(), Direction::Bearish, index))
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static ENGULFING_PARAMS: &[ParamMeta] = &[ParamMeta::ratio(
    "min_engulf_ratio",
    1.0,
    (0.5, 1.0, 0.1),
    "Previous body must be below current body times this ratio",
)];

static PIERCING_PARAMS: &[ParamMeta] = &[ParamMeta::ratio(
    "min_pierce_ratio",
    0.5,
    (0.3, 0.7, 0.1),
    "Fraction of the previous body the close must recover",
)];

impl ParameterizedDetector for BullishEngulfingDetector {
    fn param_meta() -> &'static [ParamMeta] {
        ENGULFING_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let detector = Self {
            min_engulf_ratio: get_ratio(params, "min_engulf_ratio", 1.0)?,
        };
        detector.validate_config()?;
        Ok(detector)
    }

    fn pattern_id_str() -> &'static str {
        ids::BULLISH_ENGULFING.0
    }
}

impl ParameterizedDetector for BearishEngulfingDetector {
    fn param_meta() -> &'static [ParamMeta] {
        ENGULFING_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let detector = Self {
            min_engulf_ratio: get_ratio(params, "min_engulf_ratio", 1.0)?,
        };
        detector.validate_config()?;
        Ok(detector)
    }

    fn pattern_id_str() -> &'static str {
        ids::BEARISH_ENGULFING.0
    }
}

impl ParameterizedDetector for PiercingLineDetector {
    fn param_meta() -> &'static [ParamMeta] {
        PIERCING_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            min_pierce_ratio: get_ratio(params, "min_pierce_ratio", 0.5)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        ids::PIERCING_LINE.0
    }
}

impl ParameterizedDetector for DarkCloudCoverDetector {
    fn param_meta() -> &'static [ParamMeta] {
        PIERCING_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            min_pierce_ratio: get_ratio(params, "min_pierce_ratio", 0.5)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        ids::DARK_CLOUD_COVER.0
    }
}
