//! Single-bar candlestick pattern detectors
//!
//! Hammer, Inverted Hammer, Hanging Man, Doji, Spinning Top, Long Legged Doji,
//! Dragonfly Doji, Gravestone Doji.
//!
//! Shadow rules for the hammer family are relative to the body; the doji family
//! compares the body and shadows against the full range.

use std::collections::HashMap;

use super::helpers::{self, check_factor};
use super::ids;
use crate::{
    params::{get_factor, get_ratio, ParamMeta, ParameterizedDetector},
    Direction, OHLCVExt, PatternDetector, PatternId, PatternMatch, Result, OHLCV,
};

impl_with_defaults!(
    HammerDetector,
    InvertedHammerDetector,
    HangingManDetector,
    DojiDetector,
    SpinningTopDetector,
    LongLeggedDojiDetector,
    DragonflyDojiDetector,
    GravestoneDojiDetector,
);

#[inline]
fn single(id: PatternId, direction: Direction, index: usize) -> PatternMatch {
    PatternMatch {
        pattern_id: id,
        direction,
        start_index: index,
        end_index: index,
    }
}

/// body / range below `doji_ratio`; flat candles never qualify
#[inline]
fn is_doji<T: OHLCV>(bar: &T, doji_ratio: f64) -> bool {
    bar.body_ratio().is_some_and(|r| r < doji_ratio)
}

// ============================================================
// HAMMER FAMILY
// ============================================================

/// Hammer: small body on top of a long lower shadow
#[derive(Debug, Clone, Copy)]
pub struct HammerDetector {
    /// lower shadow must exceed body * long_shadow_factor
    pub long_shadow_factor: f64,
    /// upper shadow must stay below body * short_shadow_factor
    pub short_shadow_factor: f64,
}

impl Default for HammerDetector {
    fn default() -> Self {
        Self {
            long_shadow_factor: helpers::LONG_SHADOW_FACTOR,
            short_shadow_factor: helpers::SHORT_SHADOW_FACTOR,
        }
    }
}

impl HammerDetector {
    /// Shape test shared with [`HangingManDetector`]
    pub fn is_hammer_shape<T: OHLCV>(&self, bar: &T) -> bool {
        let body = bar.body();
        body > 0.0
            && bar.lower_shadow() > body * self.long_shadow_factor
            && bar.upper_shadow() < body * self.short_shadow_factor
    }
}

impl PatternDetector for HammerDetector {
    fn id(&self) -> PatternId {
        ids::HAMMER
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        self.is_hammer_shape(bar)
            .then(|| single(self.id(), Direction::Bullish, index))
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("long_shadow_factor", self.long_shadow_factor)?;
        check_factor("short_shadow_factor", self.short_shadow_factor)
    }
}

/// Inverted Hammer: small body under a long upper shadow
#[derive(Debug, Clone, Copy)]
pub struct InvertedHammerDetector {
    pub long_shadow_factor: f64,
    pub short_shadow_factor: f64,
}

impl Default for InvertedHammerDetector {
    fn default() -> Self {
        Self {
            long_shadow_factor: helpers::LONG_SHADOW_FACTOR,
            short_shadow_factor: helpers::SHORT_SHADOW_FACTOR,
        }
    }
}

impl PatternDetector for InvertedHammerDetector {
    fn id(&self) -> PatternId {
        ids::INVERTED_HAMMER
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        let body = bar.body();
        if body <= 0.0 {
            return None;
        }
        if bar.upper_shadow() <= body * self.long_shadow_factor {
            return None;
        }
        if bar.lower_shadow() >= body * self.short_shadow_factor {
            return None;
        }
        Some(single(self.id(), Direction::Bullish, index))
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("long_shadow_factor", self.long_shadow_factor)?;
        check_factor("short_shadow_factor", self.short_shadow_factor)
    }
}

/// Hanging Man: hammer shape with a bearish body
#[derive(Debug, Clone, Copy, Default)]
pub struct HangingManDetector {
    pub shape: HammerDetector,
}

impl PatternDetector for HangingManDetector {
    fn id(&self) -> PatternId {
        ids::HANGING_MAN
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        (bar.is_bearish() && self.shape.is_hammer_shape(bar))
            .then(|| single(self.id(), Direction::Bearish, index))
    }

    fn validate_config(&self) -> Result<()> {
        self.shape.validate_config()
    }
}

// ============================================================
// DOJI FAMILY
// ============================================================

/// Doji: body is a tiny fraction of the range
#[derive(Debug, Clone, Copy)]
pub struct DojiDetector {
    pub doji_ratio: f64,
}

impl Default for DojiDetector {
    fn default() -> Self {
        Self {
            doji_ratio: helpers::DOJI_RATIO,
        }
    }
}

impl PatternDetector for DojiDetector {
    fn id(&self) -> PatternId {
        ids::DOJI
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        is_doji(bar, self.doji_ratio).then(|| single(self.id(), Direction::Neutral, index))
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("doji_ratio", self.doji_ratio)
    }
}

/// Spinning Top: small absolute body with shadows on both sides
#[derive(Debug, Clone, Copy)]
pub struct SpinningTopDetector {
    /// body must be strictly below this price distance
    pub max_body: f64,
    /// each shadow must exceed body * shadow_factor
    pub shadow_factor: f64,
}

impl Default for SpinningTopDetector {
    fn default() -> Self {
        Self {
            max_body: helpers::SPINNING_TOP_MAX_BODY,
            shadow_factor: helpers::SPINNING_TOP_SHADOW_FACTOR,
        }
    }
}

impl PatternDetector for SpinningTopDetector {
    fn id(&self) -> PatternId {
        ids::SPINNING_TOP
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        let body = bar.body();
        if body <= 0.0 || body >= self.max_body {
            return None;
        }
        let min_shadow = body * self.shadow_factor;
        if bar.upper_shadow() > min_shadow && bar.lower_shadow() > min_shadow {
            Some(single(self.id(), Direction::Neutral, index))
        } else {
            None
        }
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("max_body", self.max_body)?;
        check_factor("shadow_factor", self.shadow_factor)
    }
}

/// Long Legged Doji: doji with long shadows on both sides
#[derive(Debug, Clone, Copy)]
pub struct LongLeggedDojiDetector {
    pub doji_ratio: f64,
    pub leg_ratio: f64,
}

impl Default for LongLeggedDojiDetector {
    fn default() -> Self {
        Self {
            doji_ratio: helpers::DOJI_RATIO,
            leg_ratio: helpers::LONG_LEG_RATIO,
        }
    }
}

impl PatternDetector for LongLeggedDojiDetector {
    fn id(&self) -> PatternId {
        ids::LONG_LEGGED_DOJI
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        if !is_doji(bar, self.doji_ratio) {
            return None;
        }
        let min_leg = bar.range() * self.leg_ratio;
        (bar.upper_shadow() > min_leg && bar.lower_shadow() > min_leg)
            .then(|| single(self.id(), Direction::Neutral, index))
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("doji_ratio", self.doji_ratio)?;
        check_factor("leg_ratio", self.leg_ratio)
    }
}

/// Dragonfly Doji: doji at the top of a long lower shadow
#[derive(Debug, Clone, Copy)]
pub struct DragonflyDojiDetector {
    pub doji_ratio: f64,
    pub dominant_ratio: f64,
    pub minor_ratio: f64,
}

impl Default for DragonflyDojiDetector {
    fn default() -> Self {
        Self {
            doji_ratio: helpers::DOJI_RATIO,
            dominant_ratio: helpers::DOMINANT_SHADOW_RATIO,
            minor_ratio: helpers::MINOR_SHADOW_RATIO,
        }
    }
}

impl PatternDetector for DragonflyDojiDetector {
    fn id(&self) -> PatternId {
        ids::DRAGONFLY_DOJI
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        if !is_doji(bar, self.doji_ratio) {
            return None;
        }
        let range = bar.range();
        (bar.lower_shadow() > range * self.dominant_ratio
            && bar.upper_shadow() < range * self.minor_ratio)
            .then(|| single(self.id(), Direction::Bullish, index))
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("doji_ratio", self.doji_ratio)?;
        check_factor("dominant_ratio", self.dominant_ratio)?;
        check_factor("minor_ratio", self.minor_ratio)
    }
}

/// Gravestone Doji: doji at the bottom of a long upper shadow
#[derive(Debug, Clone, Copy)]
pub struct GravestoneDojiDetector {
    pub doji_ratio: f64,
    pub dominant_ratio: f64,
    pub minor_ratio: f64,
}

impl Default for GravestoneDojiDetector {
    fn default() -> Self {
        Self {
            doji_ratio: helpers::DOJI_RATIO,
            dominant_ratio: helpers::DOMINANT_SHADOW_RATIO,
            minor_ratio: helpers::MINOR_SHADOW_RATIO,
        }
    }
}

impl PatternDetector for GravestoneDojiDetector {
    fn id(&self) -> PatternId {
        ids::GRAVESTONE_DOJI
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        if !is_doji(bar, self.doji_ratio) {
            return None;
        }
        let range = bar.range();
        (bar.upper_shadow() > range * self.dominant_ratio
            && bar.lower_shadow() < range * self.minor_ratio)
            .then(|| single(self.id(), Direction::Bearish, index))
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("doji_ratio", self.doji_ratio)?;
        check_factor("dominant_ratio", self.dominant_ratio)?;
        check_factor("minor_ratio", self.minor_ratio)
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static HAMMER_PARAMS: &[ParamMeta] = &[
    ParamMeta::factor(
        "long_shadow_factor",
        helpers::LONG_SHADOW_FACTOR,
        (1.5, 4.0, 0.5),
        "Lower shadow multiple of the body",
    ),
    ParamMeta::factor(
        "short_shadow_factor",
        helpers::SHORT_SHADOW_FACTOR,
        (0.1, 1.0, 0.1),
        "Upper shadow ceiling as a multiple of the body",
    ),
];

static DOJI_PARAMS: &[ParamMeta] = &[ParamMeta::ratio(
    "doji_ratio",
    helpers::DOJI_RATIO,
    (0.05, 0.2, 0.05),
    "Maximum body to range ratio",
)];

static SPINNING_TOP_PARAMS: &[ParamMeta] = &[
    ParamMeta::factor(
        "max_body",
        helpers::SPINNING_TOP_MAX_BODY,
        (0.5, 3.0, 0.5),
        "Maximum body size in price units",
    ),
    ParamMeta::factor(
        "shadow_factor",
        helpers::SPINNING_TOP_SHADOW_FACTOR,
        (1.0, 3.0, 0.5),
        "Minimum shadow multiple of the body on both sides",
    ),
];

impl ParameterizedDetector for HammerDetector {
    fn param_meta() -> &'static [ParamMeta] {
        HAMMER_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            long_shadow_factor: get_factor(
                params,
                "long_shadow_factor",
                helpers::LONG_SHADOW_FACTOR,
            )?,
            short_shadow_factor: get_factor(
                params,
                "short_shadow_factor",
                helpers::SHORT_SHADOW_FACTOR,
            )?,
        })
    }

    fn pattern_id_str() -> &'static str {
        ids::HAMMER.0
    }
}

impl ParameterizedDetector for DojiDetector {
    fn param_meta() -> &'static [ParamMeta] {
        DOJI_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            doji_ratio: get_ratio(params, "doji_ratio", helpers::DOJI_RATIO)?.get(),
        })
    }

    fn pattern_id_str() -> &'static str {
        ids::DOJI.0
    }
}

impl ParameterizedDetector for SpinningTopDetector {
    fn param_meta() -> &'static [ParamMeta] {
        SPINNING_TOP_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            max_body: get_factor(params, "max_body", helpers::SPINNING_TOP_MAX_BODY)?,
            shadow_factor: get_factor(
                params,
                "shadow_factor",
                helpers::SPINNING_TOP_SHADOW_FACTOR,
            )?,
        })
    }

    fn pattern_id_str() -> &'static str {
        ids::SPINNING_TOP.0
    }
}
