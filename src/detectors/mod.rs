//! Candlestick and chart pattern detectors
//!
//! Every detector is a pure predicate over a short window of candles ending at
//! the bar under test. Detectors are independent and may fire together.
//!
//! # Pattern Categories
//!
//! - **Single-bar (8)**: Hammer family, Doji family, Spinning Top
//! - **Two-bar (7)**: Engulfing, Harami, Piercing Line, Dark Cloud Cover, Thrusting Line
//! - **Three-bar (7)**: Morning/Evening Star, Soldiers/Crows, Unique Three River, Side-by-Side Lines
//! - **Multi-bar (2)**: Rising/Falling Three Methods
//! - **Chart (5)**: Head & Shoulders, Double Top/Bottom, Triangle, Flag

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod chart;
pub mod multi_bar;
pub mod single_bar;
pub mod three_bar;
pub mod two_bar;

// Re-export all detectors for convenience
pub use chart::*;
pub use helpers::*;
pub use multi_bar::*;
pub use single_bar::*;
pub use three_bar::*;
pub use two_bar::*;

/// Pattern identifiers as reported in analysis results
pub mod ids {
    use crate::PatternId;

    pub const HAMMER: PatternId = PatternId("Hammer");
    pub const INVERTED_HAMMER: PatternId = PatternId("Inverted Hammer");
    pub const HANGING_MAN: PatternId = PatternId("Hanging Man");
    pub const DOJI: PatternId = PatternId("Doji");
    pub const SPINNING_TOP: PatternId = PatternId("Spinning Top");
    pub const LONG_LEGGED_DOJI: PatternId = PatternId("Long Legged Doji");
    pub const DRAGONFLY_DOJI: PatternId = PatternId("Dragonfly Doji");
    pub const GRAVESTONE_DOJI: PatternId = PatternId("Gravestone Doji");

    pub const BULLISH_ENGULFING: PatternId = PatternId("Bullish Engulfing");
    pub const BEARISH_ENGULFING: PatternId = PatternId("Bearish Engulfing");
    pub const PIERCING_LINE: PatternId = PatternId("Piercing Line");
    pub const DARK_CLOUD_COVER: PatternId = PatternId("Dark Cloud Cover");
    pub const BULLISH_HARAMI: PatternId = PatternId("Bullish Harami");
    pub const BEARISH_HARAMI: PatternId = PatternId("Bearish Harami");
    pub const THRUSTING_LINE: PatternId = PatternId("Thrusting Line");

    pub const MORNING_STAR: PatternId = PatternId("Morning Star");
    pub const EVENING_STAR: PatternId = PatternId("Evening Star");
    pub const THREE_WHITE_SOLDIERS: PatternId = PatternId("Three White Soldiers");
    pub const THREE_BLACK_CROWS: PatternId = PatternId("Three Black Crows");
    pub const UNIQUE_THREE_RIVER: PatternId = PatternId("Unique Three River");
    pub const SIDE_BY_SIDE_WHITE_LINES: PatternId = PatternId("Side-by-Side White Lines");
    pub const SIDE_BY_SIDE_DARK_LINES: PatternId = PatternId("Side-by-Side Dark Lines");

    pub const RISING_THREE_METHODS: PatternId = PatternId("Rising Three Methods");
    pub const FALLING_THREE_METHODS: PatternId = PatternId("Falling Three Methods");

    pub const HEAD_AND_SHOULDERS: PatternId = PatternId("Head & Shoulders");
    pub const DOUBLE_TOP: PatternId = PatternId("Double Top");
    pub const DOUBLE_BOTTOM: PatternId = PatternId("Double Bottom");
    pub const TRIANGLE: PatternId = PatternId("Triangle Pattern");
    pub const FLAG: PatternId = PatternId("Flag Pattern");
}
