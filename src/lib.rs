//! # chartscan - candlestick chart image analysis
//!
//! Turns a decoded candlestick chart image into a technical-analysis report:
//! extracted OHLC candles, recognized patterns, trend classification,
//! support/resistance levels, a directional prediction with confidence and a
//! trade plan.
//!
//! ## Quick Start
//!
//! ```rust
//! use chartscan::prelude::*;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let analyzer = ChartAnalyzer::new(AnalyzerConfig::default()).unwrap();
//!
//! // A blank 64x32 grayscale image: nothing to extract, synthetic fallback kicks in
//! let pixels = vec![255u8; 64 * 32];
//! let image = PixelBuffer::new(&pixels, 64, 32, 1);
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let result = analyzer.analyze_image_with_rng(&image, &mut rng);
//! assert_eq!(result.candle_count, 20);
//! assert!(result.strength <= 100);
//! ```
//!
//! Candle sequences can also be analyzed directly:
//!
//! ```rust
//! use chartscan::prelude::*;
//!
//! let candles: Vec<Candle> = (0..30)
//!     .map(|i| {
//!         let base = 100.0 + i as f64;
//!         Candle::new(base, base + 1.5, base - 0.5, base + 1.0, 1000.0, i)
//!     })
//!     .collect();
//!
//! let result = ChartAnalyzer::default().analyze_candles(&candles);
//! assert_eq!(result.prediction, Signal::Up);
//! ```

pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod detectors;
pub mod extractor;
pub mod levels;
pub mod params;
pub mod prediction;
pub mod report;
pub mod synthetic;
pub mod trade;
pub mod trend;

pub mod prelude {
    pub use crate::{
        // Orchestration
        analyzer::{AnalysisResult, BatchItem, BatchOutcome, ChartAnalyzer},
        // Catalog
        catalog::{CatalogEntry, PatternCatalog, PatternKind},
        // Configuration
        config::{AnalyzerConfig, ExtractorConfig, ScoringConfig, SyntheticConfig, TradeConfig},
        // Detectors
        detectors::*,
        // Extraction
        extractor::{CandleExtractor, CandleSource, Extraction, ExtractionFailure, PixelBuffer},
        levels::{find_key_levels, KeyLevels},
        // Parameters
        params::{get_factor, get_ratio, ParamMeta, ParamType, ParameterizedDetector},
        prediction::{Prediction, PredictionEngine, ScoreBreakdown, Signal},
        synthetic::SyntheticGenerator,
        trade::{risk_reward, timeframe_label, TradeLevels},
        trend::{analyze_trend, Trend, TrendResult},
        // Errors
        AnalysisError,
        BuiltinDetector,
        // Types
        Candle,
        Direction,
        LibraryBuilder,
        // Core traits
        OHLCVExt,
        PatternDetector,
        PatternId,
        PatternLibrary,
        PatternCategory,
        PatternMatch,
        Period,
        Ratio,
        Result,
        NO_CLEAR_PATTERN,
        OHLCV,
    };
}

/// Shortest candle sequence any analysis stage accepts.
pub const MIN_ANALYSIS_BARS: usize = 3;

/// Reported when no detector matches.
pub const NO_CLEAR_PATTERN: &str = "No Clear Pattern";

/// Round a price to 2 decimal places
#[inline]
pub fn round_price(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while configuring or running an analysis
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {need} candles, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: &'static str },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(AnalysisError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(AnalysisError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Lookback length (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(AnalysisError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn body_top(&self) -> f64 {
        self.open().max(self.close())
    }

    #[inline]
    fn body_bottom(&self) -> f64 {
        self.open().min(self.close())
    }

    /// Midpoint of the real body
    #[inline]
    fn body_midpoint(&self) -> f64 {
        (self.open() + self.close()) / 2.0
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Body as ratio of range. Returns None if range is zero
    #[inline]
    fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > 0.0).then(|| self.body() / range)
    }

    /// Validate OHLCV data consistency
    fn validate(&self) -> Result<()> {
        let values = [self.open(), self.high(), self.low(), self.close(), self.volume()];
        if values.iter().any(|v| v.is_nan()) {
            return Err(AnalysisError::InvalidCandle {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if values.iter().any(|v| v.is_infinite()) {
            return Err(AnalysisError::InvalidCandle {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if self.low() > self.body_bottom() {
            return Err(AnalysisError::InvalidCandle {
                index: 0,
                reason: "low above body",
            });
        }
        if self.high() < self.body_top() {
            return Err(AnalysisError::InvalidCandle {
                index: 0,
                reason: "high below body",
            });
        }
        if self.volume() < 0.0 {
            return Err(AnalysisError::InvalidCandle {
                index: 0,
                reason: "negative volume",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

/// Validate every bar of a sequence, reporting the offending position
pub fn validate_bars<T: OHLCV>(bars: &[T]) -> Result<()> {
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            AnalysisError::InvalidCandle { reason, .. } => {
                AnalysisError::InvalidCandle { index: i, reason }
            }
            other => other,
        })?;
    }
    Ok(())
}

/// [`validate_bars`] plus strictly increasing candle indices
pub fn validate_candles(candles: &[Candle]) -> Result<()> {
    validate_bars(candles)?;
    match candles.windows(2).position(|w| w[1].index <= w[0].index) {
        Some(i) => Err(AnalysisError::InvalidCandle {
            index: i + 1,
            reason: "index not increasing",
        }),
        None => Ok(()),
    }
}

// ============================================================
// CANDLE
// ============================================================

/// One OHLC record recovered from a chart (or synthesized)
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub index: usize,
}

impl Candle {
    pub fn new(open: f64, high: f64, low: f64, close: f64, volume: f64, index: usize) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
            index,
        }
    }

    /// Build a candle whose wicks always enclose the body.
    ///
    /// `high`/`low` are taken over the hints and both body ends, then pushed
    /// out by `pad`.
    pub fn enclosing(
        open: f64,
        close: f64,
        high_hint: f64,
        low_hint: f64,
        pad: f64,
        volume: f64,
        index: usize,
    ) -> Self {
        let pad = pad.max(0.0);
        Self {
            open,
            high: high_hint.max(open).max(close) + pad,
            low: low_hint.min(open).min(close) - pad,
            close,
            volume: volume.max(0.0),
            index,
        }
    }
}

impl OHLCV for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}

// ============================================================
// PATTERN MATCH - result of detection (Copy, no allocations)
// ============================================================

/// Unique identifier for a pattern type (its display name)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(pub &'static str);

impl PatternId {
    /// Returns the string identifier
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for PatternId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Direction/bias of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Neutral,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }

    /// +1 for bullish, -1 for bearish, 0 for neutral
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Bullish => 1.0,
            Direction::Neutral => 0.0,
            Direction::Bearish => -1.0,
        }
    }
}

/// Result of pattern detection - Copy, no allocations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternMatch {
    pub pattern_id: PatternId,
    pub direction: Direction,
    pub start_index: usize,
    pub end_index: usize,
}

// ============================================================
// PATTERN DETECTOR TRAIT
// ============================================================

/// Category of pattern by window size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternCategory {
    SingleBar,
    TwoBar,
    ThreeBar,
    MultiBar,
    Chart,
}

/// Pattern detector over the window ending at `index`.
///
/// Detectors are pure: the same bars always give the same answer.
pub trait PatternDetector: Send + Sync {
    fn id(&self) -> PatternId;
    fn min_bars(&self) -> usize;
    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }

    fn category(&self) -> PatternCategory {
        match self.min_bars() {
            1 => PatternCategory::SingleBar,
            2 => PatternCategory::TwoBar,
            3 => PatternCategory::ThreeBar,
            _ => PatternCategory::MultiBar,
        }
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

use detectors::*;

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - enum dispatch, no vtable
        #[derive(Debug, Clone)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect(d, bars, index)),*
                }
            }

            #[inline]
            pub fn id(&self) -> PatternId {
                match self {
                    $(Self::$variant(d) => PatternDetector::id(d)),*
                }
            }

            #[inline]
            pub fn min_bars(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternDetector::min_bars(d)),*
                }
            }

            pub fn category(&self) -> PatternCategory {
                match self {
                    $(Self::$variant(d) => PatternDetector::category(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternDetector::validate_config(d)),*
                }
            }
        }
    };
}

define_builtin_detectors! {
    // Single bar (8)
    Hammer(HammerDetector),
    InvertedHammer(InvertedHammerDetector),
    HangingMan(HangingManDetector),
    Doji(DojiDetector),
    SpinningTop(SpinningTopDetector),
    LongLeggedDoji(LongLeggedDojiDetector),
    DragonflyDoji(DragonflyDojiDetector),
    GravestoneDoji(GravestoneDojiDetector),

    // Two bar (7)
    BullishEngulfing(BullishEngulfingDetector),
    BearishEngulfing(BearishEngulfingDetector),
    PiercingLine(PiercingLineDetector),
    DarkCloudCover(DarkCloudCoverDetector),
    BullishHarami(BullishHaramiDetector),
    BearishHarami(BearishHaramiDetector),
    ThrustingLine(ThrustingLineDetector),

    // Three bar (7)
    MorningStar(MorningStarDetector),
    EveningStar(EveningStarDetector),
    ThreeWhiteSoldiers(ThreeWhiteSoldiersDetector),
    ThreeBlackCrows(ThreeBlackCrowsDetector),
    UniqueThreeRiver(UniqueThreeRiverDetector),
    SideBySideWhiteLines(SideBySideWhiteLinesDetector),
    SideBySideDarkLines(SideBySideDarkLinesDetector),

    // Multi-bar (2)
    RisingThreeMethods(RisingThreeMethodsDetector),
    FallingThreeMethods(FallingThreeMethodsDetector),

    // Chart patterns (5)
    HeadAndShoulders(HeadAndShouldersDetector),
    DoubleTop(DoubleTopDetector),
    DoubleBottom(DoubleBottomDetector),
    Triangle(TriangleDetector),
    Flag(FlagDetector),
}

// ============================================================
// PATTERN LIBRARY
// ============================================================

/// Library configuration
#[derive(Debug, Clone, Default)]
pub struct LibraryConfig {
    pub pattern_filter: Option<Vec<PatternId>>,
}

/// Immutable set of detectors evaluated against the tail of a sequence
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    builtin: Vec<BuiltinDetector>,
    config: LibraryConfig,
}

impl Default for PatternLibrary {
    /// Every builtin detector with default thresholds
    fn default() -> Self {
        Self {
            builtin: LibraryBuilder::new().with_all_defaults().builtin,
            config: LibraryConfig::default(),
        }
    }
}

impl PatternLibrary {
    /// Number of registered detectors
    pub fn len(&self) -> usize {
        self.builtin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builtin.is_empty()
    }

    /// Registered detectors in evaluation order
    pub fn detectors(&self) -> &[BuiltinDetector] {
        &self.builtin
    }

    /// Detect every pattern whose window ends at `index`.
    pub fn identify_at<T: OHLCV>(&self, bars: &[T], index: usize) -> Vec<PatternMatch> {
        let mut results = Vec::new();
        if index >= bars.len() {
            return results;
        }

        for detector in &self.builtin {
            if index + 1 >= detector.min_bars() {
                if let Some(m) = detector.detect(bars, index) {
                    if self.should_include(&m) {
                        results.push(m);
                    }
                }
            }
        }

        results
    }

    /// Detect patterns on the most recent candles.
    ///
    /// Sequences shorter than [`MIN_ANALYSIS_BARS`] yield nothing.
    pub fn identify<T: OHLCV>(&self, bars: &[T]) -> Vec<PatternMatch> {
        if bars.len() < MIN_ANALYSIS_BARS {
            return Vec::new();
        }
        self.identify_at(bars, bars.len() - 1)
    }

    /// Names of the matched patterns, or the [`NO_CLEAR_PATTERN`] sentinel.
    pub fn pattern_names<T: OHLCV>(&self, bars: &[T]) -> Vec<String> {
        names_or_sentinel(&self.identify(bars))
    }

    fn should_include(&self, m: &PatternMatch) -> bool {
        if let Some(ref filter) = self.config.pattern_filter {
            if !filter.contains(&m.pattern_id) {
                return false;
            }
        }
        true
    }

    fn validate(&self) -> Result<()> {
        for d in &self.builtin {
            d.validate_config()?;
        }
        Ok(())
    }
}

/// Render matches as names, falling back to the sentinel when empty
pub fn names_or_sentinel(matches: &[PatternMatch]) -> Vec<String> {
    if matches.is_empty() {
        return vec![NO_CLEAR_PATTERN.to_string()];
    }
    matches.iter().map(|m| m.pattern_id.0.to_string()).collect()
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating PatternLibrary instances
#[derive(Debug, Default)]
pub struct LibraryBuilder {
    builtin: Vec<BuiltinDetector>,
    config: LibraryConfig,
}

/// Generate an array of `BuiltinDetector` variants using `Default::default()` for each inner type.
macro_rules! builtin_defaults {
  ($($variant:ident),* $(,)?) => {
    [$(BuiltinDetector::$variant(Default::default())),*]
  };
}

impl LibraryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add all builtin patterns with default configurations
    pub fn with_all_defaults(self) -> Self {
        self.with_single_bar_defaults()
            .with_two_bar_defaults()
            .with_three_bar_defaults()
            .with_multi_bar_defaults()
            .with_chart_defaults()
    }

    /// Add single-bar patterns with defaults (8)
    pub fn with_single_bar_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![
            Hammer,
            InvertedHammer,
            HangingMan,
            Doji,
            SpinningTop,
            LongLeggedDoji,
            DragonflyDoji,
            GravestoneDoji,
        ]);
        self
    }

    /// Add two-bar patterns with defaults (7)
    pub fn with_two_bar_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![
            BullishEngulfing,
            BearishEngulfing,
            PiercingLine,
            DarkCloudCover,
            BullishHarami,
            BearishHarami,
            ThrustingLine,
        ]);
        self
    }

    /// Add three-bar patterns with defaults (7)
    pub fn with_three_bar_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![
            MorningStar,
            EveningStar,
            ThreeWhiteSoldiers,
            ThreeBlackCrows,
            UniqueThreeRiver,
            SideBySideWhiteLines,
            SideBySideDarkLines,
        ]);
        self
    }

    /// Add five-bar continuation patterns with defaults (2)
    pub fn with_multi_bar_defaults(mut self) -> Self {
        self.builtin
            .extend(builtin_defaults![RisingThreeMethods, FallingThreeMethods]);
        self
    }

    /// Add chart (price structure) patterns with defaults (5)
    pub fn with_chart_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![
            HeadAndShoulders,
            DoubleTop,
            DoubleBottom,
            Triangle,
            Flag,
        ]);
        self
    }

    /// Add a builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        self.builtin.push(detector);
        self
    }

    /// Add with config validation
    pub fn add_checked(mut self, detector: BuiltinDetector) -> Result<Self> {
        detector.validate_config()?;
        self.builtin.push(detector);
        Ok(self)
    }

    /// Filter to specific patterns only
    pub fn only_patterns(mut self, ids: impl IntoIterator<Item = PatternId>) -> Self {
        self.config.pattern_filter = Some(ids.into_iter().collect());
        self
    }

    /// Build the library
    pub fn build(self) -> Result<PatternLibrary> {
        let library = PatternLibrary {
            builtin: self.builtin,
            config: self.config,
        };
        library.validate()?;
        Ok(library)
    }
}

// ============================================================
// TESTS
// ============================================================
