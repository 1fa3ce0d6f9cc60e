//! Stop-loss / take-profit placement and the values derived from it

use serde::{Deserialize, Serialize};

use crate::{config::TradeConfig, prediction::Signal, round_price, OHLCV};

/// Placeholder for a level that does not apply
pub const NOT_AVAILABLE: &str = "N/A";
/// Ratio reported when risk cannot be measured
pub const DEFAULT_RISK_REWARD: &str = "1:2.00";

/// Protective and target prices, rounded to 2 dp.
///
/// Both are `None` only without a usable signal or without bars.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TradeLevels {
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl TradeLevels {
    /// Place levels around the last close from the recent extreme.
    ///
    /// Up: stop under the lowest low of the lookback, target at
    /// `reward_multiple` times the risk above entry. Any other call gets the
    /// mirrored short plan off the highest high, so a sideways market is
    /// planned as a fade of the range top.
    pub fn compute<T: OHLCV>(bars: &[T], signal: Signal, config: &TradeConfig) -> Self {
        let Some(last) = bars.last() else {
            return Self::default();
        };
        let entry = last.close();
        let recent = &bars[bars.len().saturating_sub(config.lookback.get())..];

        let (stop, target) = match signal {
            Signal::Up => {
                let low = recent.iter().map(|b| b.low()).fold(f64::INFINITY, f64::min);
                let stop = low - config.stop_pad;
                (stop, entry + config.reward_multiple * (entry - stop))
            }
            Signal::Down | Signal::Sideways => {
                let high = recent.iter().map(|b| b.high()).fold(f64::NEG_INFINITY, f64::max);
                let stop = high + config.stop_pad;
                (stop, entry - config.reward_multiple * (stop - entry))
            }
            Signal::Unknown => return Self::default(),
        };

        Self {
            stop_loss: Some(round_price(stop)),
            take_profit: Some(round_price(target)),
        }
    }

    pub fn stop_loss_label(&self) -> String {
        format_level(self.stop_loss)
    }

    pub fn take_profit_label(&self) -> String {
        format_level(self.take_profit)
    }
}

/// `"{:.2}"` or [`NOT_AVAILABLE`]
pub fn format_level(level: Option<f64>) -> String {
    match level {
        Some(v) => format!("{v:.2}"),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Reward per unit of risk as `"1:x.xx"`.
///
/// Falls back to [`DEFAULT_RISK_REWARD`] when a level is missing or the stop
/// sits at the entry.
pub fn risk_reward(levels: &TradeLevels, entry: f64) -> String {
    let (Some(stop), Some(target)) = (levels.stop_loss, levels.take_profit) else {
        return DEFAULT_RISK_REWARD.to_string();
    };
    let risk = (entry - stop).abs();
    if risk <= 0.0 {
        return DEFAULT_RISK_REWARD.to_string();
    }
    let reward = (target - entry).abs();
    format!("1:{:.2}", reward / risk)
}

/// Coarse timeframe guess from how many candles fit on the chart
pub fn timeframe_label(candle_count: usize) -> &'static str {
    match candle_count {
        0..=9 => "15-min",
        10..=29 => "1-hour",
        30..=99 => "4-hour",
        _ => "Daily",
    }
}
