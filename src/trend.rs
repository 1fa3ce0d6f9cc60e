//! Trend classification from short and long moving averages of the close.

use serde::{Deserialize, Serialize};

use crate::{round_price, MIN_ANALYSIS_BARS, OHLCV};

/// Closes averaged for the short moving average
pub const SHORT_MA: usize = 20;
/// Closes averaged for the long moving average
pub const LONG_MA: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Uptrend,
    WeakUptrend,
    Sideways,
    WeakDowntrend,
    Downtrend,
    Unknown,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Uptrend => "UPTREND",
            Trend::WeakUptrend => "WEAK_UPTREND",
            Trend::Sideways => "SIDEWAYS",
            Trend::WeakDowntrend => "WEAK_DOWNTREND",
            Trend::Downtrend => "DOWNTREND",
            Trend::Unknown => "UNKNOWN",
        }
    }

    /// Fixed confidence attached to each regime
    pub fn strength(self) -> u8 {
        match self {
            Trend::Uptrend | Trend::Downtrend => 75,
            Trend::WeakUptrend | Trend::WeakDowntrend => 50,
            Trend::Sideways => 30,
            Trend::Unknown => 0,
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub trend: Trend,
    pub strength: u8,
    pub ma20: f64,
    pub ma50: f64,
    pub current_price: f64,
}

impl TrendResult {
    pub fn unknown() -> Self {
        Self {
            trend: Trend::Unknown,
            strength: 0,
            ma20: 0.0,
            ma50: 0.0,
            current_price: 0.0,
        }
    }
}

fn mean_close<T: OHLCV>(bars: &[T]) -> f64 {
    bars.iter().map(|b| b.close()).sum::<f64>() / bars.len() as f64
}

/// Classify the current regime by ordering close, MA20 and MA50.
///
/// MA50 uses every candle when fewer than 50 exist.
pub fn analyze_trend<T: OHLCV>(bars: &[T]) -> TrendResult {
    if bars.len() < MIN_ANALYSIS_BARS {
        return TrendResult::unknown();
    }

    let close = bars[bars.len() - 1].close();
    let ma20 = mean_close(&bars[bars.len().saturating_sub(SHORT_MA)..]);
    let ma50 = mean_close(&bars[bars.len().saturating_sub(LONG_MA)..]);

    let trend = if close > ma20 && ma20 > ma50 {
        Trend::Uptrend
    } else if close < ma20 && ma20 < ma50 {
        Trend::Downtrend
    } else if close > ma20 {
        Trend::WeakUptrend
    } else if close < ma20 {
        Trend::WeakDowntrend
    } else {
        Trend::Sideways
    };

    TrendResult {
        trend,
        strength: trend.strength(),
        ma20: round_price(ma20),
        ma50: round_price(ma50),
        current_price: round_price(close),
    }
}
