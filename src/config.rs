//! Analyzer configuration
//!
//! Every constant used by extraction, synthesis, scoring and trade planning
//! lives here. All sections deserialize with defaults for missing fields, so a
//! partial document only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::{AnalysisError, Period, Ratio, Result, MIN_ANALYSIS_BARS};

/// Top-level configuration for [`crate::analyzer::ChartAnalyzer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub extractor: ExtractorConfig,
    pub synthetic: SyntheticConfig,
    pub scoring: ScoringConfig,
    pub trade: TradeConfig,
    /// Shorter sequences produce the error-shaped result
    pub min_candles: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            synthetic: SyntheticConfig::default(),
            scoring: ScoringConfig::default(),
            trade: TradeConfig::default(),
            min_candles: MIN_ANALYSIS_BARS,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_candles < MIN_ANALYSIS_BARS {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_candles must be at least {MIN_ANALYSIS_BARS}"
            )));
        }
        self.extractor.validate()?;
        self.synthetic.validate()?;
        self.scoring.validate()?;
        self.trade.validate()?;
        Ok(())
    }
}

fn require_finite(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(AnalysisError::InvalidConfig(format!("{name} must be finite")));
    }
    Ok(())
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    require_finite(name, value)?;
    if value <= 0.0 {
        return Err(AnalysisError::InvalidConfig(format!("{name} must be > 0")));
    }
    Ok(())
}

fn require_non_negative(name: &str, value: f64) -> Result<()> {
    require_finite(name, value)?;
    if value < 0.0 {
        return Err(AnalysisError::InvalidConfig(format!("{name} must be >= 0")));
    }
    Ok(())
}

// ============================================================
// EXTRACTION
// ============================================================

/// Image-to-candle extraction constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Pixels at or below this gray level count as foreground
    pub fixed_threshold: u8,
    /// Also OR in an Otsu-derived threshold mask
    pub use_otsu: bool,
    /// Blobs kept after the left-to-right sort, before size filtering
    pub max_blobs: usize,
    pub min_blob_width: usize,
    pub min_blob_height: usize,
    /// Wider blobs (relative to image width) are treated as artifacts
    pub max_width_ratio: Ratio,
    /// Taller blobs (relative to image height) are treated as artifacts
    pub max_height_ratio: Ratio,
    /// Price at pixel row 0; the bottom row maps to 0
    pub price_scale: f64,
    /// Open/close displacement per pixel of blob width
    pub body_width_factor: f64,
    /// Standard deviation of the open/close jitter
    pub jitter_sigma: f64,
    /// Extra distance pushed beyond the body ends for high/low
    pub wick_pad: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            fixed_threshold: 150,
            use_otsu: true,
            max_blobs: 150,
            min_blob_width: 2,
            min_blob_height: 3,
            max_width_ratio: Ratio::new_const(0.2),
            max_height_ratio: Ratio::new_const(0.8),
            price_scale: 100.0,
            body_width_factor: 0.2,
            jitter_sigma: 0.3,
            wick_pad: 0.5,
        }
    }
}

impl ExtractorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_blobs == 0 {
            return Err(AnalysisError::InvalidConfig("max_blobs must be > 0".into()));
        }
        require_positive("price_scale", self.price_scale)?;
        require_non_negative("body_width_factor", self.body_width_factor)?;
        require_non_negative("jitter_sigma", self.jitter_sigma)?;
        require_non_negative("wick_pad", self.wick_pad)?;
        Ok(())
    }
}

// ============================================================
// SYNTHETIC CANDLES
// ============================================================

/// Random-walk fallback constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Candles produced when extraction fails
    pub count: usize,
    pub base_price: f64,
    /// open = previous close + U(-open_noise, open_noise)
    pub open_noise: f64,
    pub change_mean: f64,
    pub change_sigma: f64,
    pub wick_min: f64,
    pub wick_max: f64,
    pub volume_min: f64,
    pub volume_max: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            count: 20,
            base_price: 100.0,
            open_noise: 1.0,
            change_mean: 0.5,
            change_sigma: 1.5,
            wick_min: 0.5,
            wick_max: 2.0,
            volume_min: 1000.0,
            volume_max: 5000.0,
        }
    }
}

impl SyntheticConfig {
    pub fn validate(&self) -> Result<()> {
        if self.count < MIN_ANALYSIS_BARS {
            return Err(AnalysisError::InvalidConfig(format!(
                "synthetic count must be at least {MIN_ANALYSIS_BARS}"
            )));
        }
        require_finite("base_price", self.base_price)?;
        require_positive("open_noise", self.open_noise)?;
        require_finite("change_mean", self.change_mean)?;
        require_non_negative("change_sigma", self.change_sigma)?;
        require_non_negative("wick_min", self.wick_min)?;
        require_non_negative("volume_min", self.volume_min)?;
        if self.wick_max <= self.wick_min || !self.wick_max.is_finite() {
            return Err(AnalysisError::InvalidConfig("wick_max must exceed wick_min".into()));
        }
        if self.volume_max <= self.volume_min || !self.volume_max.is_finite() {
            return Err(AnalysisError::InvalidConfig(
                "volume_max must exceed volume_min".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================
// SCORING
// ============================================================

/// Weights and thresholds of the prediction score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Neutral starting score
    pub base_score: f64,

    pub trend_strong_points: f64,
    pub trend_weak_points: f64,

    /// Each cataloged pattern adds reliability * pattern_weight
    pub pattern_weight: f64,
    /// Pattern subtotal is clamped to +/- pattern_cap
    pub pattern_cap: f64,

    pub volume_window: Period,
    pub volume_high_ratio: f64,
    pub volume_high_points: f64,
    pub volume_mid_ratio: f64,
    pub volume_mid_points: f64,

    pub rsi_period: Period,
    pub rsi_overbought: f64,
    pub rsi_bullish: f64,
    pub rsi_bearish: f64,
    pub rsi_oversold: f64,
    pub rsi_strong_points: f64,
    pub rsi_weak_points: f64,

    /// Price within this fraction of a level counts as near it
    pub level_band: Ratio,
    pub level_points: f64,

    pub body_window: Period,
    pub body_dominance: Ratio,
    pub body_points: f64,

    /// score > up_threshold predicts Up
    pub up_threshold: f64,
    /// score < down_threshold predicts Down
    pub down_threshold: f64,
    pub sideways_strength_cap: u8,

    /// Guards the volume and RSI denominators
    pub epsilon: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_score: 50.0,
            trend_strong_points: 35.0,
            trend_weak_points: 18.0,
            pattern_weight: 25.0,
            pattern_cap: 35.0,
            volume_window: Period::new_const(3),
            volume_high_ratio: 1.3,
            volume_high_points: 10.0,
            volume_mid_ratio: 1.1,
            volume_mid_points: 5.0,
            rsi_period: Period::new_const(14),
            rsi_overbought: 70.0,
            rsi_bullish: 60.0,
            rsi_bearish: 40.0,
            rsi_oversold: 30.0,
            rsi_strong_points: 12.0,
            rsi_weak_points: 6.0,
            level_band: Ratio::new_const(0.02),
            level_points: 8.0,
            body_window: Period::new_const(3),
            body_dominance: Ratio::new_const(0.7),
            body_points: 2.0,
            up_threshold: 60.0,
            down_threshold: 40.0,
            sideways_strength_cap: 40,
            epsilon: 1e-4,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("base_score", self.base_score),
            ("trend_strong_points", self.trend_strong_points),
            ("trend_weak_points", self.trend_weak_points),
            ("pattern_weight", self.pattern_weight),
            ("pattern_cap", self.pattern_cap),
            ("volume_high_points", self.volume_high_points),
            ("volume_mid_points", self.volume_mid_points),
            ("rsi_strong_points", self.rsi_strong_points),
            ("rsi_weak_points", self.rsi_weak_points),
            ("level_points", self.level_points),
            ("body_points", self.body_points),
        ] {
            require_non_negative(name, value)?;
        }
        require_positive("epsilon", self.epsilon)?;
        require_positive("volume_mid_ratio", self.volume_mid_ratio)?;
        if self.volume_high_ratio < self.volume_mid_ratio {
            return Err(AnalysisError::InvalidConfig(
                "volume_high_ratio must be >= volume_mid_ratio".into(),
            ));
        }
        let rsi = [self.rsi_oversold, self.rsi_bearish, self.rsi_bullish, self.rsi_overbought];
        if rsi.iter().any(|v| !(0.0..=100.0).contains(v)) || rsi.windows(2).any(|w| w[0] > w[1]) {
            return Err(AnalysisError::InvalidConfig(
                "rsi thresholds must be ordered within 0..=100".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.base_score)
            || self.down_threshold > self.up_threshold
            || !self.up_threshold.is_finite()
            || !self.down_threshold.is_finite()
        {
            return Err(AnalysisError::InvalidConfig(
                "score thresholds must satisfy down <= up within 0..=100".into(),
            ));
        }
        if self.sideways_strength_cap > 100 {
            return Err(AnalysisError::InvalidConfig(
                "sideways_strength_cap must be <= 100".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================
// TRADE LEVELS
// ============================================================

/// Stop-loss / take-profit construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeConfig {
    /// Recent candles scanned for the protective extreme
    pub lookback: Period,
    /// Distance placed beyond that extreme
    pub stop_pad: f64,
    /// Reward as a multiple of risk
    pub reward_multiple: f64,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            lookback: Period::new_const(5),
            stop_pad: 0.5,
            reward_multiple: 2.0,
        }
    }
}

impl TradeConfig {
    pub fn validate(&self) -> Result<()> {
        require_non_negative("stop_pad", self.stop_pad)?;
        require_positive("reward_multiple", self.reward_multiple)?;
        Ok(())
    }
}
