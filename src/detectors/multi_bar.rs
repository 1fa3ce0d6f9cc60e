//! Five-bar continuation pattern detectors
//!
//! Rising Three Methods, Falling Three Methods.

use super::helpers::window;
use super::ids;
use crate::{Direction, OHLCVExt, PatternDetector, PatternId, PatternMatch, OHLCV};

impl_with_defaults!(RisingThreeMethodsDetector, FallingThreeMethodsDetector);

const THREE_METHODS_BARS: usize = 5;

/// Candle lies inside the high/low range of the one before it
#[inline]
fn inside<T: OHLCV>(bar: &T, prior: &T) -> bool {
    bar.high() <= prior.high() && bar.low() >= prior.low()
}

/// Rising Three Methods: bullish bar, three contained pullback bars, bullish breakout
#[derive(Debug, Clone, Copy, Default)]
pub struct RisingThreeMethodsDetector;

impl PatternDetector for RisingThreeMethodsDetector {
    fn id(&self) -> PatternId {
        ids::RISING_THREE_METHODS
    }

    fn min_bars(&self) -> usize {
        THREE_METHODS_BARS
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let w = window(bars, index, THREE_METHODS_BARS)?;

        if !w[0].is_bullish() {
            return None;
        }
        for i in 1..4 {
            if w[i].is_bullish() || !inside(&w[i], &w[i - 1]) {
                return None;
            }
        }
        if !w[4].is_bullish() || w[4].close() <= w[0].close() {
            return None;
        }

        Some(PatternMatch {
            pattern_id: self.id(),
            direction: Direction::Bullish,
            start_index: index + 1 - THREE_METHODS_BARS,
            end_index: index,
        })
    }
}

/// Falling Three Methods: bearish bar, three contained rebound bars, bearish breakdown
#[derive(Debug, Clone, Copy, Default)]
pub struct FallingThreeMethodsDetector;

impl PatternDetector for FallingThreeMethodsDetector {
    fn id(&self) -> PatternId {
        ids::FALLING_THREE_METHODS
    }

    fn min_bars(&self) -> usize {
        THREE_METHODS_BARS
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let w = window(bars, index, THREE_METHODS_BARS)?;

        if !w[0].is_bearish() {
            return None;
        }
        for i in 1..4 {
            if w[i].is_bearish() || !inside(&w[i], &w[i - 1]) {
                return None;
            }
        }
        if !w[4].is_bearish() || w[4].close() >= w[0].close() {
            return None;
        }

        Some(PatternMatch {
            pattern_id: self.id(),
            direction: Direction::Bearish,
            start_index: index + 1 - THREE_METHODS_BARS,
            end_index: index,
        })
    }
}
