//! End-to-end chart analysis
//!
//! [`ChartAnalyzer`] wires extraction, pattern detection, trend, levels,
//! scoring and trade planning together. It is built once, never mutated, and
//! can be shared across threads.
//!
//! The public entry points always return a well-formed [`AnalysisResult`]:
//! extraction failures fall back to synthetic candles, and anything else is
//! converted into the error-shaped result.

use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    catalog::PatternCatalog,
    config::AnalyzerConfig,
    extractor::{CandleExtractor, PixelBuffer},
    levels::{find_key_levels, KeyLevels},
    names_or_sentinel,
    prediction::{Prediction, PredictionEngine, Signal},
    report::{analysis_text, trading_setup},
    round_price,
    synthetic::SyntheticGenerator,
    trade::{risk_reward, timeframe_label, TradeLevels, NOT_AVAILABLE},
    trend::analyze_trend,
    validate_candles, AnalysisError, Candle, PatternLibrary, Result,
};

// ============================================================
// RESULT
// ============================================================

/// Complete report for one chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub prediction: Signal,
    /// Confidence 0-100
    pub strength: u8,
    /// 2 dp price or "N/A"
    pub stop_loss: String,
    /// 2 dp price or "N/A"
    pub take_profit: String,
    pub patterns: Vec<String>,
    pub key_levels: KeyLevels,
    pub risk_reward: String,
    pub timeframe: String,
    pub analysis: String,
    pub trading_setup: String,
    pub candle_count: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub current_price: Option<f64>,
    /// Candles came from the synthetic fallback
    #[serde(skip)]
    pub synthetic: bool,
}

impl AnalysisResult {
    /// Low-information result carrying the error description
    pub fn from_error(error: &AnalysisError, candle_count: usize) -> Self {
        Self {
            prediction: Signal::Unknown,
            strength: 0,
            stop_loss: NOT_AVAILABLE.to_string(),
            take_profit: NOT_AVAILABLE.to_string(),
            patterns: Vec::new(),
            key_levels: KeyLevels::default(),
            risk_reward: NOT_AVAILABLE.to_string(),
            timeframe: "Unknown".to_string(),
            analysis: format!("Error: {error}"),
            trading_setup: format!("Unable to analyze: {error}"),
            candle_count,
            current_price: None,
            synthetic: false,
        }
    }

    pub fn is_error(&self) -> bool {
        self.prediction == Signal::Unknown
    }
}

// ============================================================
// BATCH TYPES
// ============================================================

/// One named image of a batch
#[derive(Debug, Clone, Copy)]
pub struct BatchItem<'a> {
    pub name: &'a str,
    pub buffer: PixelBuffer<'a>,
}

/// Result for one batch item, in input order
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub name: String,
    pub result: AnalysisResult,
}

// ============================================================
// ANALYZER
// ============================================================

#[derive(Debug, Clone)]
pub struct ChartAnalyzer {
    config: AnalyzerConfig,
    library: PatternLibrary,
    extractor: CandleExtractor,
    synthetic: SyntheticGenerator,
    engine: PredictionEngine,
}

impl Default for ChartAnalyzer {
    fn default() -> Self {
        Self {
            config: AnalyzerConfig::default(),
            library: PatternLibrary::default(),
            extractor: CandleExtractor::default(),
            synthetic: SyntheticGenerator::default(),
            engine: PredictionEngine::default(),
        }
    }
}

impl ChartAnalyzer {
    /// All builtin detectors and the builtin catalog
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        Self::with_parts(config, PatternLibrary::default(), PatternCatalog::builtin())
    }

    /// Custom detector set and catalog
    pub fn with_parts(
        config: AnalyzerConfig,
        library: PatternLibrary,
        catalog: Arc<PatternCatalog>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractor: CandleExtractor::new(config.extractor.clone())?,
            synthetic: SyntheticGenerator::new(config.synthetic.clone())?,
            engine: PredictionEngine::new(config.scoring.clone(), catalog)?,
            library,
            config,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    pub fn catalog(&self) -> &PatternCatalog {
        self.engine.catalog()
    }

    pub fn extractor(&self) -> &CandleExtractor {
        &self.extractor
    }

    pub fn synthetic(&self) -> &SyntheticGenerator {
        &self.synthetic
    }

    /// Analyze a chart image; `rng` drives jitter and any synthetic fallback.
    pub fn analyze_image_with_rng<R: Rng + ?Sized>(
        &self,
        image: &PixelBuffer<'_>,
        rng: &mut R,
    ) -> AnalysisResult {
        let extraction = self
            .extractor
            .extract_or_synthesize(image, &self.synthetic, rng);
        let mut result = self.analyze_candles(&extraction.candles);
        result.synthetic = extraction.is_synthetic();
        result
    }

    /// Analyze a chart image with the thread-local generator
    pub fn analyze_image(&self, image: &PixelBuffer<'_>) -> AnalysisResult {
        self.analyze_image_with_rng(image, &mut rand::thread_rng())
    }

    /// Analyze an already extracted candle sequence. Deterministic.
    pub fn analyze_candles(&self, candles: &[Candle]) -> AnalysisResult {
        match self.try_analyze(candles) {
            Ok(result) => {
                info!(
                    candles = result.candle_count,
                    prediction = %result.prediction,
                    strength = result.strength,
                    "analysis complete"
                );
                result
            }
            Err(error) => {
                warn!(error = %error, candles = candles.len(), "analysis failed");
                AnalysisResult::from_error(&error, candles.len())
            }
        }
    }

    /// Score a candle sequence without building the report.
    pub fn predict(&self, candles: &[Candle]) -> Result<Prediction> {
        self.check_candles(candles)?;
        let patterns = self.library.identify(candles);
        let trend = analyze_trend(candles);
        let levels = find_key_levels(candles);
        self.engine.predict(candles, &patterns, &trend, &levels)
    }

    /// Analyze many images in parallel.
    ///
    /// With `Some(seed)`, item `i` uses a generator seeded with `seed + i`, so
    /// the batch is reproducible regardless of scheduling.
    pub fn analyze_batch(&self, items: &[BatchItem<'_>], seed: Option<u64>) -> Vec<BatchOutcome> {
        items
            .par_iter()
            .enumerate()
            .map(|(position, item)| {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(position as u64)),
                    None => StdRng::from_entropy(),
                };
                BatchOutcome {
                    name: item.name.to_string(),
                    result: self.analyze_image_with_rng(&item.buffer, &mut rng),
                }
            })
            .collect()
    }

    fn check_candles(&self, candles: &[Candle]) -> Result<()> {
        if candles.len() < self.config.min_candles {
            return Err(AnalysisError::InsufficientData {
                need: self.config.min_candles,
                got: candles.len(),
            });
        }
        validate_candles(candles)
    }

    fn try_analyze(&self, candles: &[Candle]) -> Result<AnalysisResult> {
        self.check_candles(candles)?;

        let matches = self.library.identify(candles);
        let trend = analyze_trend(candles);
        let key_levels = find_key_levels(candles);
        let prediction = self
            .engine
            .predict(candles, &matches, &trend, &key_levels)?;

        let entry = candles[candles.len() - 1].close;
        let levels = TradeLevels::compute(candles, prediction.label, &self.config.trade);
        let patterns = names_or_sentinel(&matches);

        Ok(AnalysisResult {
            prediction: prediction.label,
            strength: prediction.strength,
            stop_loss: levels.stop_loss_label(),
            take_profit: levels.take_profit_label(),
            analysis: analysis_text(&trend, &patterns, &prediction),
            trading_setup: trading_setup(prediction.label, entry, &levels),
            risk_reward: risk_reward(&levels, entry),
            timeframe: timeframe_label(candles.len()).to_string(),
            patterns,
            key_levels,
            candle_count: candles.len(),
            current_price: Some(round_price(entry)),
            synthetic: false,
        })
    }
}
