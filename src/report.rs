//! Narrative text for the analysis result.
//!
//! Pure formatting over values computed elsewhere; nothing here affects the
//! prediction.

use crate::{
    prediction::{Prediction, Signal},
    trade::{risk_reward, TradeLevels},
    trend::TrendResult,
};

struct Wording {
    bias: &'static str,
    reading: &'static str,
    action: &'static str,
}

fn wording(signal: Signal) -> Wording {
    match signal {
        Signal::Up => Wording {
            bias: "bullish",
            reading: "buyers are in control and momentum points higher",
            action: "Look for long entries on pullbacks toward support",
        },
        Signal::Down => Wording {
            bias: "bearish",
            reading: "sellers are in control and momentum points lower",
            action: "Look for short entries on rallies toward resistance",
        },
        Signal::Sideways | Signal::Unknown => Wording {
            bias: "neutral",
            reading: "neither side has a clear edge",
            action: "Stay flat until price breaks out of the current range",
        },
    }
}

/// Risk guidance closing the trade plan
fn guidance(signal: Signal) -> &'static str {
    match signal {
        Signal::Up | Signal::Down => {
            "Size the position so the stop costs at most 1-2% of the account.\n\
             Trail the stop to entry once half the target is reached.\n\
             The setup is void on a close beyond the stop."
        }
        Signal::Sideways => {
            "No directional edge. The levels fade the top of the range; trade \
             half size or wait for a confirmed breakout."
        }
        Signal::Unknown => "No directional edge. Wait for a confirmed breakout before entering.",
    }
}

/// Summary of trend, patterns and the resulting call
pub fn analysis_text(trend: &TrendResult, patterns: &[String], prediction: &Prediction) -> String {
    let words = wording(prediction.label);
    format!(
        "TECHNICAL SUMMARY\n\n\
         Trend: {} ({}%)\n\
         Price: {:.2}\n\
         MA20: {:.2} | MA50: {:.2}\n\n\
         Patterns: {}\n\n\
         Outlook: {} ({}% confidence). The bias is {}; {}.\n\
         Action: {}.",
        trend.trend,
        trend.strength,
        trend.current_price,
        trend.ma20,
        trend.ma50,
        patterns.join(", "),
        prediction.label,
        prediction.strength,
        words.bias,
        words.reading,
        words.action,
    )
}

/// Entry, exits and risk guidance for the call
pub fn trading_setup(signal: Signal, entry: f64, levels: &TradeLevels) -> String {
    let risk = match (levels.stop_loss, levels.take_profit) {
        (Some(_), Some(_)) => format!("Risk/reward: {}\n", risk_reward(levels, entry)),
        _ => String::new(),
    };
    format!(
        "TRADE PLAN\n\n\
         Direction: {signal}\n\
         Entry: {entry:.2}\n\
         Stop loss: {}\n\
         Take profit: {}\n\
         {risk}\n\
         {}",
        levels.stop_loss_label(),
        levels.take_profit_label(),
        guidance(signal),
    )
}
