//! Support and resistance from local extrema of recent candles

use serde::{Deserialize, Serialize};

use crate::{round_price, OHLCV};

/// Recent candles scanned for extrema
pub const LEVEL_WINDOW: usize = 20;
/// Levels kept per side
pub const MAX_LEVELS: usize = 3;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyLevels {
    /// Distinct prices, descending
    pub support: Vec<f64>,
    /// Distinct prices, descending
    pub resistance: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_low: Option<f64>,
}

impl KeyLevels {
    /// Support closest to `price`
    pub fn nearest_support(&self, price: f64) -> Option<f64> {
        nearest(&self.support, price)
    }

    /// Resistance closest to `price`
    pub fn nearest_resistance(&self, price: f64) -> Option<f64> {
        nearest(&self.resistance, price)
    }
}

fn nearest(levels: &[f64], price: f64) -> Option<f64> {
    levels
        .iter()
        .copied()
        .min_by(|a, b| (a - price).abs().total_cmp(&(b - price).abs()))
}

fn top_distinct(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| b.total_cmp(a));
    values.dedup();
    values.truncate(MAX_LEVELS);
    values
}

/// Scan the last [`LEVEL_WINDOW`] candles for pivot highs and lows.
///
/// A high is a pivot when it beats its left neighbour and is not beaten by its
/// right one; lows mirror this. Endpoints are never pivots.
pub fn find_key_levels<T: OHLCV>(bars: &[T]) -> KeyLevels {
    if bars.is_empty() {
        return KeyLevels::default();
    }

    let recent = &bars[bars.len().saturating_sub(LEVEL_WINDOW)..];
    let mut resistance = Vec::new();
    let mut support = Vec::new();

    for w in recent.windows(3) {
        let (prev, curr, next) = (&w[0], &w[1], &w[2]);
        if curr.high() > prev.high() && curr.high() >= next.high() {
            resistance.push(round_price(curr.high()));
        }
        if curr.low() < prev.low() && curr.low() <= next.low() {
            support.push(round_price(curr.low()));
        }
    }

    let last_high = recent.iter().map(|b| b.high()).fold(f64::NEG_INFINITY, f64::max);
    let last_low = recent.iter().map(|b| b.low()).fold(f64::INFINITY, f64::min);

    KeyLevels {
        support: top_distinct(support),
        resistance: top_distinct(resistance),
        last_high: Some(round_price(last_high)),
        last_low: Some(round_price(last_low)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;

    fn hl(pairs: &[(f64, f64)]) -> Vec<Candle> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, &(h, l))| Candle::new(l, h, l, l, 100.0, i))
            .collect()
    }

    #[test]
    fn test_pivots() {
        let bars = hl(&[(10.0, 5.0), (12.0, 4.0), (11.0, 6.0), (13.0, 3.0), (9.0, 7.0)]);
        let levels = find_key_levels(&bars);
        assert_eq!(levels.resistance, vec![13.0, 12.0]);
        assert_eq!(levels.support, vec![4.0, 3.0]);
        assert_eq!(levels.last_high, Some(13.0));
        assert_eq!(levels.last_low, Some(3.0));
    }

    #[test]
    fn test_plateau_counts_once() {
        // equal right neighbour still qualifies, the repeat does not
        let bars = hl(&[(10.0, 5.0), (12.0, 5.0), (12.0, 5.0), (11.0, 5.0)]);
        assert_eq!(find_key_levels(&bars).resistance, vec![12.0]);
    }

    #[test]
    fn test_keeps_three_highest() {
        let mut pairs = Vec::new();
        for i in 0..9 {
            let peak = if i % 2 == 1 { 20.0 + i as f64 } else { 10.0 };
            pairs.push((peak, 1.0));
        }
        let levels = find_key_levels(&hl(&pairs));
        assert_eq!(levels.resistance, vec![27.0, 25.0, 23.0]);
    }

    #[test]
    fn test_only_recent_window_is_used() {
        let mut pairs = vec![(10.0, 5.0), (50.0, 1.0), (10.0, 5.0)];
        pairs.extend(std::iter::repeat((10.0, 5.0)).take(LEVEL_WINDOW));
        let levels = find_key_levels(&hl(&pairs));
        assert!(levels.resistance.is_empty());
        assert_eq!(levels.last_high, Some(10.0));
    }

    #[test]
    fn test_empty_input() {
        let levels = find_key_levels::<Candle>(&[]);
        assert!(levels.support.is_empty() && levels.resistance.is_empty());
        assert_eq!(levels.last_high, None);
    }

    #[test]
    fn test_nearest() {
        let levels = KeyLevels {
            support: vec![99.0, 95.0, 90.0],
            ..Default::default()
        };
        assert_eq!(levels.nearest_support(96.0), Some(95.0));
        assert_eq!(levels.nearest_resistance(96.0), None);
    }
}
