//! Prediction engine
//!
//! Fuses six independent factors into one score around a neutral 50:
//!
//! 1. **Trend**: regime from [`analyze_trend`](crate::trend::analyze_trend)
//! 2. **Patterns**: catalog reliability of each match, signed by bias, capped
//! 3. **Volume**: recent vs. preceding mean volume, signed by the last candle
//! 4. **Momentum**: RSI over the trailing closes
//! 5. **Levels**: proximity to the nearest support or resistance
//! 6. **Body**: strongly bodied recent candles
//!
//! The clamped score maps to a [`Signal`] and a 0-100 confidence.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    catalog::PatternCatalog,
    config::ScoringConfig,
    levels::KeyLevels,
    trend::{Trend, TrendResult},
    AnalysisError, OHLCVExt, PatternMatch, Result, MIN_ANALYSIS_BARS, OHLCV,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Up,
    Down,
    Sideways,
    Unknown,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Up => "UP",
            Signal::Down => "DOWN",
            Signal::Sideways => "SIDEWAYS",
            Signal::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points contributed by each factor before clamping
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub trend: f64,
    pub pattern: f64,
    pub volume: f64,
    pub momentum: f64,
    pub level: f64,
    pub body: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.trend + self.pattern + self.volume + self.momentum + self.level + self.body
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Signal,
    /// Confidence 0-100
    pub strength: u8,
    /// Clamped score 0-100
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

impl Prediction {
    pub fn unknown() -> Self {
        Self {
            label: Signal::Unknown,
            strength: 0,
            score: 50.0,
            breakdown: ScoreBreakdown::default(),
        }
    }
}

// ============================================================
// ENGINE
// ============================================================

#[derive(Debug, Clone)]
pub struct PredictionEngine {
    config: ScoringConfig,
    catalog: Arc<PatternCatalog>,
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self {
            config: ScoringConfig::default(),
            catalog: PatternCatalog::builtin(),
        }
    }
}

impl PredictionEngine {
    pub fn new(config: ScoringConfig, catalog: Arc<PatternCatalog>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, catalog })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Score the sequence and map the score to a prediction.
    pub fn predict<T: OHLCV>(
        &self,
        bars: &[T],
        patterns: &[PatternMatch],
        trend: &TrendResult,
        levels: &KeyLevels,
    ) -> Result<Prediction> {
        if bars.len() < MIN_ANALYSIS_BARS {
            return Err(AnalysisError::InsufficientData {
                need: MIN_ANALYSIS_BARS,
                got: bars.len(),
            });
        }

        let price = bars[bars.len() - 1].close();
        let breakdown = ScoreBreakdown {
            trend: self.trend_points(trend.trend),
            pattern: self.pattern_points(patterns),
            volume: self.volume_points(bars),
            momentum: self.momentum_points(bars),
            level: self.level_points(price, levels),
            body: self.body_points(bars),
        };

        let score = (self.config.base_score + breakdown.total()).clamp(0.0, 100.0);
        let label = if score > self.config.up_threshold {
            Signal::Up
        } else if score < self.config.down_threshold {
            Signal::Down
        } else {
            Signal::Sideways
        };

        let mut strength = ((score - 50.0).abs() * 2.0).trunc().clamp(0.0, 100.0) as u8;
        if label == Signal::Sideways {
            strength = strength.min(self.config.sideways_strength_cap);
        }

        debug!(?breakdown, score, prediction = %label, strength, "scored candles");
        Ok(Prediction {
            label,
            strength,
            score,
            breakdown,
        })
    }

    fn trend_points(&self, trend: Trend) -> f64 {
        let c = &self.config;
        match trend {
            Trend::Uptrend => c.trend_strong_points,
            Trend::WeakUptrend => c.trend_weak_points,
            Trend::WeakDowntrend => -c.trend_weak_points,
            Trend::Downtrend => -c.trend_strong_points,
            Trend::Sideways | Trend::Unknown => 0.0,
        }
    }

    /// Cataloged matches only; chart patterns carry no entry
    fn pattern_points(&self, patterns: &[PatternMatch]) -> f64 {
        let total: f64 = patterns
            .iter()
            .filter_map(|m| self.catalog.get(m.pattern_id.as_str()))
            .map(|entry| entry.weighted(self.config.pattern_weight))
            .sum();
        total.clamp(-self.config.pattern_cap, self.config.pattern_cap)
    }

    fn volume_points<T: OHLCV>(&self, bars: &[T]) -> f64 {
        let c = &self.config;
        let n = c.volume_window.get();
        if bars.len() < n {
            return 0.0;
        }
        let mean_volume = |s: &[T]| s.iter().map(|b| b.volume()).sum::<f64>() / s.len() as f64;

        let len = bars.len();
        let recent = mean_volume(&bars[len - n..]);
        let prev = if len >= 2 * n {
            mean_volume(&bars[len - 2 * n..len - n])
        } else {
            recent
        };
        let ratio = recent / (prev + c.epsilon);

        let sign = if bars[len - 1].is_bullish() { 1.0 } else { -1.0 };
        if ratio > c.volume_high_ratio {
            sign * c.volume_high_points
        } else if ratio > c.volume_mid_ratio {
            sign * c.volume_mid_points
        } else {
            0.0
        }
    }

    fn momentum_points<T: OHLCV>(&self, bars: &[T]) -> f64 {
        let c = &self.config;
        let Some(rsi) = rsi(bars, c.rsi_period.get(), c.epsilon) else {
            return 0.0;
        };

        if rsi > c.rsi_overbought {
            c.rsi_strong_points
        } else if rsi > c.rsi_bullish {
            c.rsi_weak_points
        } else if rsi < c.rsi_oversold {
            -c.rsi_strong_points
        } else if rsi < c.rsi_bearish {
            -c.rsi_weak_points
        } else {
            0.0
        }
    }

    fn level_points(&self, price: f64, levels: &KeyLevels) -> f64 {
        let c = &self.config;
        let band = c.level_band.get();
        let mut points = 0.0;

        if let Some(s) = levels.nearest_support(price) {
            if s <= price && price < s * (1.0 + band) {
                points += c.level_points;
            }
        }
        if let Some(r) = levels.nearest_resistance(price) {
            if r * (1.0 - band) < price && price <= r {
                points -= c.level_points;
            }
        }
        points
    }

    fn body_points<T: OHLCV>(&self, bars: &[T]) -> f64 {
        let c = &self.config;
        let start = bars.len().saturating_sub(c.body_window.get());
        bars[start..]
            .iter()
            .filter(|b| b.body_ratio().is_some_and(|r| r > c.body_dominance.get()))
            .map(|b| if b.is_bullish() { c.body_points } else { -c.body_points })
            .sum()
    }
}

/// RSI over the last `period` close-to-close changes.
///
/// `None` when there are fewer than `period` candles or no price movement.
pub fn rsi<T: OHLCV>(bars: &[T], period: usize, epsilon: f64) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let (mut gains, mut losses) = (0.0, 0.0);
    for i in bars.len() - period..bars.len() {
        let change = if i > 0 {
            bars[i].close() - bars[i - 1].close()
        } else {
            0.0
        };
        if change > 0.0 {
            gains += change;
        } else {
            losses += change.abs();
        }
    }
    if gains + losses <= 0.0 {
        return None;
    }
    let rs = gains / (losses + epsilon);
    Some(100.0 - 100.0 / (1.0 + rs))
}
