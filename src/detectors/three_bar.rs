//! Three-bar candlestick pattern detectors
//!
//! Morning/Evening Star, Three White Soldiers, Three Black Crows,
//! Unique Three River, Side-by-Side White/Dark Lines.

use super::helpers::{self, check_factor};
use super::ids;
use crate::{Direction, OHLCVExt, PatternDetector, PatternId, PatternMatch, Result, OHLCV};

impl_with_defaults!(
    MorningStarDetector,
    EveningStarDetector,
    ThreeWhiteSoldiersDetector,
    ThreeBlackCrowsDetector,
    UniqueThreeRiverDetector,
    SideBySideWhiteLinesDetector,
    SideBySideDarkLinesDetector,
);

/// First, second and third bar of the window ending at `index`
#[inline]
fn triple<T>(bars: &[T], index: usize) -> Option<(&T, &T, &T)> {
    if index < 2 {
        return None;
    }
    Some((bars.get(index - 2)?, bars.get(index - 1)?, bars.get(index)?))
}

/// Compare the first close of the triple ending at `index` with the close
/// before it; true when there is no earlier bar.
#[inline]
fn beyond_prior_close<T: OHLCV>(
    bars: &[T],
    index: usize,
    progressed: impl Fn(f64, f64) -> bool,
) -> bool {
    match index.checked_sub(3).and_then(|i| bars.get(i)) {
        Some(prior) => progressed(prior.close(), bars[index - 2].close()),
        None => true,
    }
}

#[inline]
fn three_bar(id: PatternId, direction: Direction, index: usize) -> PatternMatch {
    PatternMatch {
        pattern_id: id,
        direction,
        start_index: index - 2,
        end_index: index,
    }
}

// ============================================================
// STAR PATTERNS
// ============================================================

/// Morning Star: bearish bar, any middle bar, bullish bar closing above the first close
#[derive(Debug, Clone, Copy, Default)]
pub struct MorningStarDetector;

impl PatternDetector for MorningStarDetector {
    fn id(&self) -> PatternId {
        ids::MORNING_STAR
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (first, _, third) = triple(bars, index)?;
        (first.is_bearish() && third.is_bullish() && third.close() > first.close())
            .then(|| three_bar(self.id(), Direction::Bullish, index))
    }
}

/// Evening Star: bullish bar, any middle bar, bearish bar closing below the first close
#[derive(Debug, Clone, Copy, Default)]
pub struct EveningStarDetector;

impl PatternDetector for EveningStarDetector {
    fn id(&self) -> PatternId {
        ids::EVENING_STAR
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (first, _, third) = triple(bars, index)?;
        (first.is_bullish() && third.is_bearish() && third.close() < first.close())
            .then(|| three_bar(self.id(), Direction::Bearish, index))
    }
}

// ============================================================
// SOLDIERS / CROWS
// ============================================================

/// Three White Soldiers: three bullish bars with strictly rising closes, the
/// first closing above the bar before it
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeWhiteSoldiersDetector;

impl PatternDetector for ThreeWhiteSoldiersDetector {
    fn id(&self) -> PatternId {
        ids::THREE_WHITE_SOLDIERS
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (a, b, c) = triple(bars, index)?;
        if !(a.is_bullish() && b.is_bullish() && c.is_bullish()) {
            return None;
        }
        let advancing = a.close() < b.close() && b.close() < c.close();
        (advancing && beyond_prior_close(bars, index, |prior, first| first > prior))
            .then(|| three_bar(self.id(), Direction::Bullish, index))
    }
}

/// Three Black Crows: three bearish bars with strictly falling closes, the
/// first closing below the bar before it
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeBlackCrowsDetector;

impl PatternDetector for ThreeBlackCrowsDetector {
    fn id(&self) -> PatternId {
        ids::THREE_BLACK_CROWS
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (a, b, c) = triple(bars, index)?;
        if !(a.is_bearish() && b.is_bearish() && c.is_bearish()) {
            return None;
        }
        let declining = a.close() > b.close() && b.close() > c.close();
        (declining && beyond_prior_close(bars, index, |prior, first| first < prior))
            .then(|| three_bar(self.id(), Direction::Bearish, index))
    }
}

// ============================================================
// UNIQUE THREE RIVER
// ============================================================

/// Unique Three River: two falling bearish bars, then a small bullish bar
/// trapped above the second low and below the second close
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueThreeRiverDetector;

impl PatternDetector for UniqueThreeRiverDetector {
    fn id(&self) -> PatternId {
        ids::UNIQUE_THREE_RIVER
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (first, second, third) = triple(bars, index)?;

        if !first.is_bearish() || !second.is_bearish() {
            return None;
        }
        // second closes higher, opens no higher and prints a new low
        if second.close() <= first.close()
            || second.open() > first.open()
            || second.low() >= first.low()
        {
            return None;
        }

        if !third.is_bullish() || third.body() >= second.body() {
            return None;
        }
        if third.open() <= second.low() || third.close() >= second.close() {
            return None;
        }

        Some(three_bar(self.id(), Direction::Bullish, index))
    }
}

// ============================================================
// SIDE-BY-SIDE LINES
// ============================================================

/// Second and third bar are white, similar in size and open at the same level.
///
/// Returns the gap direction against the first body, if any.
fn side_by_side_gap<T: OHLCV>(
    bars: &[T],
    index: usize,
    near_factor: f64,
    equal_factor: f64,
) -> Option<Direction> {
    let (first, second, third) = triple(bars, index)?;

    if second.is_bearish() || third.is_bearish() {
        return None;
    }

    let gap_up = second.body_bottom() > first.body_top() && third.body_bottom() > first.body_top();
    let gap_down =
        second.body_top() < first.body_bottom() && third.body_top() < first.body_bottom();
    let direction = match (gap_up, gap_down) {
        (true, _) => Direction::Bullish,
        (_, true) => Direction::Bearish,
        _ => return None,
    };

    let avg_range = helpers::trailing_avg_range(bars, index - 1, 5);
    let near = avg_range * near_factor;
    if (third.body() - second.body()).abs() > near {
        return None;
    }
    let equal = avg_range * equal_factor;
    if (third.open() - second.open()).abs() > equal {
        return None;
    }

    Some(direction)
}

/// Side-by-Side White Lines: two matching white bars gapping above the first body
#[derive(Debug, Clone, Copy)]
pub struct SideBySideWhiteLinesDetector {
    pub near_factor: f64,
    pub equal_factor: f64,
}

impl Default for SideBySideWhiteLinesDetector {
    fn default() -> Self {
        Self {
            near_factor: helpers::NEAR_FACTOR,
            equal_factor: helpers::EQUAL_FACTOR,
        }
    }
}

impl PatternDetector for SideBySideWhiteLinesDetector {
    fn id(&self) -> PatternId {
        ids::SIDE_BY_SIDE_WHITE_LINES
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        match side_by_side_gap(bars, index, self.near_factor, self.equal_factor)? {
            Direction::Bullish => Some(three_bar(self.id(), Direction::Bullish, index)),
            _ => None,
        }
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("near_factor", self.near_factor)?;
        check_factor("equal_factor", self.equal_factor)
    }
}

/// Side-by-Side Dark Lines: two matching white bars gapping below the first body
#[derive(Debug, Clone, Copy)]
pub struct SideBySideDarkLinesDetector {
    pub near_factor: f64,
    pub equal_factor: f64,
}

impl Default for SideBySideDarkLinesDetector {
    fn default() -> Self {
        Self {
            near_factor: helpers::NEAR_FACTOR,
            equal_factor: helpers::EQUAL_FACTOR,
        }
    }
}

impl PatternDetector for SideBySideDarkLinesDetector {
    fn id(&self) -> PatternId {
        ids::SIDE_BY_SIDE_DARK_LINES
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        match side_by_side_gap(bars, index, self.near_factor, self.equal_factor)? {
            Direction::Bearish => Some(three_bar(self.id(), Direction::Bearish, index)),
            _ => None,
        }
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("near_factor", self.near_factor)?;
        check_factor("equal_factor", self.equal_factor)
    }
}
