//! Chart structure detectors
//!
//! Head & Shoulders, Double Top, Double Bottom, Triangle, Flag.
//!
//! These look at the shape of highs, lows and closes over a short trailing
//! window rather than at candle bodies. They report a bias but carry no
//! catalog entry, so they never move the prediction score.

use std::collections::HashMap;

use super::helpers::{self, check_factor, std_dev, window, within_tolerance};
use super::ids;
use crate::{
    params::{get_factor, get_period, ParamMeta, ParameterizedDetector},
    Direction, PatternCategory, PatternDetector, PatternId, PatternMatch, Period, Result, OHLCV,
};

impl_with_defaults!(
    HeadAndShouldersDetector,
    DoubleTopDetector,
    DoubleBottomDetector,
    TriangleDetector,
    FlagDetector,
);

const EXTREMA_BARS: usize = 5;
const FLAG_BARS: usize = 6;

#[inline]
fn chart_match(id: PatternId, direction: Direction, index: usize, len: usize) -> PatternMatch {
    PatternMatch {
        pattern_id: id,
        direction,
        start_index: index + 1 - len,
        end_index: index,
    }
}

// ============================================================
// EXTREMA PATTERNS
// ============================================================

/// Head & Shoulders: middle high above two matching shoulders
#[derive(Debug, Clone, Copy)]
pub struct HeadAndShouldersDetector {
    pub tolerance: f64,
}

impl Default for HeadAndShouldersDetector {
    fn default() -> Self {
        Self {
            tolerance: helpers::EXTREMA_TOLERANCE,
        }
    }
}

impl PatternDetector for HeadAndShouldersDetector {
    fn id(&self) -> PatternId {
        ids::HEAD_AND_SHOULDERS
    }

    fn min_bars(&self) -> usize {
        EXTREMA_BARS
    }

    fn category(&self) -> PatternCategory {
        PatternCategory::Chart
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let w = window(bars, index, EXTREMA_BARS)?;
        let h: Vec<f64> = w.iter().map(|b| b.high()).collect();

        let head_is_highest = h.iter().enumerate().all(|(i, &v)| i == 2 || v < h[2]);
        if !head_is_highest {
            return None;
        }
        if !within_tolerance(h[1], h[3], h[1], self.tolerance) {
            return None;
        }
        if h[0] >= h[1] || h[4] >= h[3] {
            return None;
        }

        Some(chart_match(self.id(), Direction::Bearish, index, EXTREMA_BARS))
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("tolerance", self.tolerance)
    }
}

/// Double Top: two matching highs around a lower middle high
#[derive(Debug, Clone, Copy)]
pub struct DoubleTopDetector {
    pub tolerance: f64,
}

impl Default for DoubleTopDetector {
    fn default() -> Self {
        Self {
            tolerance: helpers::EXTREMA_TOLERANCE,
        }
    }
}

impl PatternDetector for DoubleTopDetector {
    fn id(&self) -> PatternId {
        ids::DOUBLE_TOP
    }

    fn min_bars(&self) -> usize {
        EXTREMA_BARS
    }

    fn category(&self) -> PatternCategory {
        PatternCategory::Chart
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let w = window(bars, index, EXTREMA_BARS)?;
        let (h1, h2, h3) = (w[1].high(), w[2].high(), w[3].high());

        (within_tolerance(h1, h3, h1, self.tolerance) && h2 < h1)
            .then(|| chart_match(self.id(), Direction::Bearish, index, EXTREMA_BARS))
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("tolerance", self.tolerance)
    }
}

/// Double Bottom: two matching lows around a higher middle low
#[derive(Debug, Clone, Copy)]
pub struct DoubleBottomDetector {
    pub tolerance: f64,
}

impl Default for DoubleBottomDetector {
    fn default() -> Self {
        Self {
            tolerance: helpers::EXTREMA_TOLERANCE,
        }
    }
}

impl PatternDetector for DoubleBottomDetector {
    fn id(&self) -> PatternId {
        ids::DOUBLE_BOTTOM
    }

    fn min_bars(&self) -> usize {
        EXTREMA_BARS
    }

    fn category(&self) -> PatternCategory {
        PatternCategory::Chart
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let w = window(bars, index, EXTREMA_BARS)?;
        let (l1, l2, l3) = (w[1].low(), w[2].low(), w[3].low());

        (within_tolerance(l1, l3, l1, self.tolerance) && l2 > l1)
            .then(|| chart_match(self.id(), Direction::Bullish, index, EXTREMA_BARS))
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("tolerance", self.tolerance)
    }
}

// ============================================================
// CONSOLIDATION PATTERNS
// ============================================================

/// Triangle: compressed range whose highs swing more than its lows
#[derive(Debug, Clone, Copy)]
pub struct TriangleDetector {
    pub window: Period,
    /// max(high) - min(low) must stay below this price distance
    pub max_span: f64,
    pub volatility_ratio: f64,
}

impl Default for TriangleDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(8),
            max_span: helpers::TRIANGLE_MAX_SPAN,
            volatility_ratio: helpers::TRIANGLE_VOLATILITY_RATIO,
        }
    }
}

impl PatternDetector for TriangleDetector {
    fn id(&self) -> PatternId {
        ids::TRIANGLE
    }

    fn min_bars(&self) -> usize {
        self.window.get()
    }

    fn category(&self) -> PatternCategory {
        PatternCategory::Chart
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let len = self.window.get();
        let w = window(bars, index, len)?;
        let highs: Vec<f64> = w.iter().map(|b| b.high()).collect();
        let lows: Vec<f64> = w.iter().map(|b| b.low()).collect();

        let top = highs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let bottom = lows.iter().copied().fold(f64::INFINITY, f64::min);
        if top - bottom >= self.max_span {
            return None;
        }
        if std_dev(&highs) <= std_dev(&lows) * self.volatility_ratio {
            return None;
        }

        Some(chart_match(self.id(), Direction::Neutral, index, len))
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("max_span", self.max_span)?;
        check_factor("volatility_ratio", self.volatility_ratio)
    }
}

/// Flag: the latest four closes are calmer than the two before them
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagDetector;

impl PatternDetector for FlagDetector {
    fn id(&self) -> PatternId {
        ids::FLAG
    }

    fn min_bars(&self) -> usize {
        FLAG_BARS
    }

    fn category(&self) -> PatternCategory {
        PatternCategory::Chart
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let w = window(bars, index, FLAG_BARS)?;
        let closes: Vec<f64> = w.iter().map(|b| b.close()).collect();

        (std_dev(&closes[2..]) < std_dev(&closes[..2]))
            .then(|| chart_match(self.id(), Direction::Neutral, index, FLAG_BARS))
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static TRIANGLE_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("window", 8.0, (5.0, 12.0, 1.0), "Trailing bars inspected"),
    ParamMeta::factor(
        "max_span",
        helpers::TRIANGLE_MAX_SPAN,
        (5.0, 20.0, 2.5),
        "Largest high-low span in price units",
    ),
    ParamMeta::factor(
        "volatility_ratio",
        helpers::TRIANGLE_VOLATILITY_RATIO,
        (0.1, 1.0, 0.1),
        "std(highs) must exceed std(lows) times this ratio",
    ),
];

impl ParameterizedDetector for TriangleDetector {
    fn param_meta() -> &'static [ParamMeta] {
        TRIANGLE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", 8)?,
            max_span: get_factor(params, "max_span", helpers::TRIANGLE_MAX_SPAN)?,
            volatility_ratio: get_factor(
                params,
                "volatility_ratio",
                helpers::TRIANGLE_VOLATILITY_RATIO,
            )?,
        })
    }

    fn pattern_id_str() -> &'static str {
        ids::TRIANGLE.0
    }
}
