//! Integration tests for the chartscan pattern library.
//!
//! Each detector is exercised on its own through the public library API, on a
//! caller-defined bar type.

use std::collections::HashMap;

use chartscan::prelude::*;

/// Simple test bar structure
#[derive(Debug, Clone, Copy)]
struct TestBar {
    o: f64,
    h: f64,
    l: f64,
    c: f64,
}

impl TestBar {
    fn new(o: f64, h: f64, l: f64, c: f64) -> Self {
        Self { o, h, l, c }
    }
}

impl OHLCV for TestBar {
    fn open(&self) -> f64 {
        self.o
    }

    fn high(&self) -> f64 {
        self.h
    }

    fn low(&self) -> f64 {
        self.l
    }

    fn close(&self) -> f64 {
        self.c
    }

    fn volume(&self) -> f64 {
        1000.0
    }
}

/// Generate downtrend bars
fn make_downtrend(n: usize) -> Vec<TestBar> {
    (0..n)
        .map(|i| {
            let base = 100.0 - (i as f64) * 2.0;
            TestBar::new(base + 1.0, base + 2.0, base - 1.0, base - 0.5)
        })
        .collect()
}

/// Generate uptrend bars
fn make_uptrend(n: usize) -> Vec<TestBar> {
    (0..n)
        .map(|i| {
            let base = 100.0 + (i as f64) * 2.0;
            TestBar::new(base - 0.5, base + 1.5, base - 1.5, base + 1.0)
        })
        .collect()
}

/// Library holding a single detector
fn only(detector: BuiltinDetector) -> PatternLibrary {
    LibraryBuilder::new().add(detector).build().unwrap()
}

/// `tail` appended to a neutral lead-in so the sequence is analyzable
fn with_tail(tail: &[TestBar]) -> Vec<TestBar> {
    let mut bars = vec![TestBar::new(50.0, 50.5, 49.5, 50.0); 3];
    bars.extend_from_slice(tail);
    bars
}

fn assert_detects(detector: BuiltinDetector, bars: &[TestBar], expected: Direction) {
    let id = detector.id();
    let matches = only(detector).identify(bars);
    assert_eq!(matches.len(), 1, "{id} should be detected");
    assert_eq!(matches[0].pattern_id, id);
    assert_eq!(matches[0].direction, expected);
    assert_eq!(matches[0].end_index, bars.len() - 1);
}

// ============================================================
// SINGLE BAR PATTERN TESTS
// ============================================================

#[test]
fn test_doji_detection() {
    let mut bars = make_downtrend(10);
    bars.push(TestBar::new(80.0, 85.0, 75.0, 80.0));
    assert_detects(
        BuiltinDetector::Doji(DojiDetector::with_defaults()),
        &bars,
        Direction::Neutral,
    );
}

#[test]
fn test_dragonfly_doji_detection() {
    let mut bars = make_downtrend(10);
    bars.push(TestBar::new(80.0, 80.0, 70.0, 80.0));
    assert_detects(
        BuiltinDetector::DragonflyDoji(DragonflyDojiDetector::with_defaults()),
        &bars,
        Direction::Bullish,
    );
}

#[test]
fn test_gravestone_doji_detection() {
    let mut bars = make_uptrend(10);
    bars.push(TestBar::new(120.0, 130.0, 120.0, 120.0));
    assert_detects(
        BuiltinDetector::GravestoneDoji(GravestoneDojiDetector::with_defaults()),
        &bars,
        Direction::Bearish,
    );
}

#[test]
fn test_long_legged_doji_detection() {
    let bars = with_tail(&[TestBar::new(100.0, 105.0, 95.0, 100.2)]);
    assert_detects(
        BuiltinDetector::LongLeggedDoji(LongLeggedDojiDetector::with_defaults()),
        &bars,
        Direction::Neutral,
    );
}

#[test]
fn test_hammer_detection() {
    let mut bars = make_downtrend(5);
    bars.push(TestBar::new(100.0, 101.2, 96.0, 101.0));
    assert_detects(
        BuiltinDetector::Hammer(HammerDetector::with_defaults()),
        &bars,
        Direction::Bullish,
    );
}

#[test]
fn test_hanging_man_requires_bearish_body() {
    let mut bars = make_uptrend(5);
    bars.push(TestBar::new(101.0, 101.2, 96.0, 100.0));
    assert_detects(
        BuiltinDetector::HangingMan(HangingManDetector::with_defaults()),
        &bars,
        Direction::Bearish,
    );

    // same silhouette with a white body is a hammer, not a hanging man
    let last = bars.len() - 1;
    bars[last] = TestBar::new(100.0, 101.2, 96.0, 101.0);
    let library = only(BuiltinDetector::HangingMan(HangingManDetector::with_defaults()));
    assert!(library.identify(&bars).is_empty());
}

#[test]
fn test_inverted_hammer_detection() {
    let mut bars = make_downtrend(5);
    bars.push(TestBar::new(100.0, 104.0, 99.8, 101.0));
    assert_detects(
        BuiltinDetector::InvertedHammer(InvertedHammerDetector::with_defaults()),
        &bars,
        Direction::Bullish,
    );
}

#[test]
fn test_spinning_top_detection() {
    let bars = with_tail(&[TestBar::new(100.0, 102.0, 98.0, 100.5)]);
    assert_detects(
        BuiltinDetector::SpinningTop(SpinningTopDetector::with_defaults()),
        &bars,
        Direction::Neutral,
    );
}

// ============================================================
// TWO BAR PATTERN TESTS
// ============================================================

#[test]
fn test_bullish_engulfing() {
    let bars = with_tail(&[
        TestBar::new(12.0, 12.5, 9.5, 10.0),
        TestBar::new(9.5, 13.5, 9.0, 13.0),
    ]);
    assert_detects(
        BuiltinDetector::BullishEngulfing(BullishEngulfingDetector::with_defaults()),
        &bars,
        Direction::Bullish,
    );
}

#[test]
fn test_bearish_engulfing() {
    let bars = with_tail(&[
        TestBar::new(10.0, 12.5, 9.5, 12.0),
        TestBar::new(13.0, 13.5, 8.5, 9.0),
    ]);
    assert_detects(
        BuiltinDetector::BearishEngulfing(BearishEngulfingDetector::with_defaults()),
        &bars,
        Direction::Bearish,
    );
}

#[test]
fn test_engulfing_must_open_beyond_prior_close() {
    let bars = with_tail(&[
        TestBar::new(10.0, 12.5, 9.5, 12.0),
        TestBar::new(11.9, 12.2, 9.8, 9.9),
    ]);
    let library = only(BuiltinDetector::BearishEngulfing(BearishEngulfingDetector::with_defaults()));
    assert!(library.identify(&bars).is_empty());
}

#[test]
fn test_piercing_line() {
    let bars = with_tail(&[
        TestBar::new(12.0, 12.2, 9.8, 10.0),
        TestBar::new(9.5, 11.7, 9.3, 11.5),
    ]);
    assert_detects(
        BuiltinDetector::PiercingLine(PiercingLineDetector::with_defaults()),
        &bars,
        Direction::Bullish,
    );
}

#[test]
fn test_dark_cloud_cover() {
    let bars = with_tail(&[
        TestBar::new(10.0, 12.2, 9.8, 12.0),
        TestBar::new(12.5, 12.7, 10.3, 10.5),
    ]);
    assert_detects(
        BuiltinDetector::DarkCloudCover(DarkCloudCoverDetector::with_defaults()),
        &bars,
        Direction::Bearish,
    );
}

#[test]
fn test_bullish_harami() {
    let bars = with_tail(&[
        TestBar::new(12.0, 12.2, 9.8, 10.0),
        TestBar::new(10.5, 11.2, 10.3, 11.0),
    ]);
    assert_detects(
        BuiltinDetector::BullishHarami(BullishHaramiDetector::with_defaults()),
        &bars,
        Direction::Bullish,
    );
}

#[test]
fn test_bearish_harami() {
    let bars = with_tail(&[
        TestBar::new(10.0, 12.2, 9.8, 12.0),
        TestBar::new(11.5, 11.7, 10.8, 11.0),
    ]);
    assert_detects(
        BuiltinDetector::BearishHarami(BearishHaramiDetector::with_defaults()),
        &bars,
        Direction::Bearish,
    );
}

#[test]
fn test_thrusting_line() {
    let bars = with_tail(&[
        TestBar::new(12.0, 12.2, 9.8, 10.0),
        TestBar::new(9.5, 10.7, 9.3, 10.5),
    ]);
    assert_detects(
        BuiltinDetector::ThrustingLine(ThrustingLineDetector::with_defaults()),
        &bars,
        Direction::Bearish,
    );
}

// ============================================================
// THREE BAR PATTERN TESTS
// ============================================================

#[test]
fn test_morning_star() {
    let bars = with_tail(&[
        TestBar::new(12.0, 12.2, 9.8, 10.0),
        TestBar::new(9.8, 10.0, 9.2, 9.5),
        TestBar::new(9.6, 12.7, 9.5, 12.5),
    ]);
    assert_detects(
        BuiltinDetector::MorningStar(MorningStarDetector),
        &bars,
        Direction::Bullish,
    );
}

#[test]
fn test_evening_star() {
    let bars = with_tail(&[
        TestBar::new(10.0, 12.2, 9.8, 12.0),
        TestBar::new(12.2, 12.8, 12.0, 12.5),
        TestBar::new(12.4, 12.5, 9.3, 9.5),
    ]);
    assert_detects(
        BuiltinDetector::EveningStar(EveningStarDetector),
        &bars,
        Direction::Bearish,
    );
}

#[test]
fn test_three_white_soldiers() {
    let bars = with_tail(&[
        TestBar::new(50.0, 51.2, 49.8, 51.0),
        TestBar::new(51.0, 52.2, 50.8, 52.0),
        TestBar::new(52.0, 53.2, 51.8, 53.0),
    ]);
    assert_detects(
        BuiltinDetector::ThreeWhiteSoldiers(ThreeWhiteSoldiersDetector),
        &bars,
        Direction::Bullish,
    );
}

#[test]
fn test_soldiers_must_close_above_prior_bar() {
    let bars = vec![
        TestBar::new(14.0, 15.5, 13.5, 15.0),
        TestBar::new(19.0, 20.5, 18.5, 20.0),
        TestBar::new(10.0, 11.5, 9.5, 11.0),
        TestBar::new(11.0, 12.5, 10.5, 12.0),
        TestBar::new(12.0, 13.5, 11.5, 13.0),
    ];
    let library = only(BuiltinDetector::ThreeWhiteSoldiers(ThreeWhiteSoldiersDetector));
    assert!(library.identify(&bars).is_empty());

    // without a prior bar the triple alone decides
    assert_eq!(library.identify(&bars[2..]).len(), 1);
}

#[test]
fn test_crows_must_close_below_prior_bar() {
    let bars = vec![
        TestBar::new(16.0, 16.5, 14.5, 15.0),
        TestBar::new(11.0, 11.5, 9.5, 10.0),
        TestBar::new(20.0, 20.5, 18.5, 19.0),
        TestBar::new(19.0, 19.5, 17.5, 18.0),
        TestBar::new(18.0, 18.5, 16.5, 17.0),
    ];
    let library = only(BuiltinDetector::ThreeBlackCrows(ThreeBlackCrowsDetector));
    assert!(library.identify(&bars).is_empty());
    assert_eq!(library.identify(&bars[2..]).len(), 1);
}

#[test]
fn test_three_black_crows() {
    let bars = with_tail(&[
        TestBar::new(13.0, 13.2, 11.8, 12.0),
        TestBar::new(12.0, 12.2, 10.8, 11.0),
        TestBar::new(11.0, 11.2, 9.8, 10.0),
    ]);
    assert_detects(
        BuiltinDetector::ThreeBlackCrows(ThreeBlackCrowsDetector),
        &bars,
        Direction::Bearish,
    );
}

#[test]
fn test_unique_three_river() {
    let bars = with_tail(&[
        TestBar::new(12.0, 12.2, 10.8, 11.0),
        TestBar::new(11.8, 12.0, 10.0, 11.2),
        TestBar::new(10.5, 10.9, 10.4, 10.8),
    ]);
    assert_detects(
        BuiltinDetector::UniqueThreeRiver(UniqueThreeRiverDetector),
        &bars,
        Direction::Bullish,
    );
}

#[test]
fn test_side_by_side_white_lines() {
    let bars = vec![
        TestBar::new(10.0, 10.6, 9.4, 10.5),
        TestBar::new(11.0, 12.2, 10.8, 12.0),
        TestBar::new(11.02, 12.2, 10.9, 12.0),
    ];
    assert_detects(
        BuiltinDetector::SideBySideWhiteLines(SideBySideWhiteLinesDetector::with_defaults()),
        &bars,
        Direction::Bullish,
    );
    let dark = only(BuiltinDetector::SideBySideDarkLines(
        SideBySideDarkLinesDetector::with_defaults(),
    ));
    assert!(dark.identify(&bars).is_empty());
}

#[test]
fn test_side_by_side_dark_lines() {
    let bars = vec![
        TestBar::new(12.0, 12.6, 11.4, 11.5),
        TestBar::new(10.0, 11.2, 9.8, 11.0),
        TestBar::new(10.02, 11.2, 9.9, 11.0),
    ];
    assert_detects(
        BuiltinDetector::SideBySideDarkLines(SideBySideDarkLinesDetector::with_defaults()),
        &bars,
        Direction::Bearish,
    );
}

#[test]
fn test_side_by_side_needs_matching_opens() {
    let bars = vec![
        TestBar::new(10.0, 10.6, 9.4, 10.5),
        TestBar::new(11.0, 12.2, 10.8, 12.0),
        TestBar::new(11.5, 12.7, 11.4, 12.5),
    ];
    let library = only(BuiltinDetector::SideBySideWhiteLines(
        SideBySideWhiteLinesDetector::with_defaults(),
    ));
    assert!(library.identify(&bars).is_empty());
}

// ============================================================
// MULTI BAR PATTERN TESTS
// ============================================================

#[test]
fn test_rising_three_methods() {
    let bars = vec![
        TestBar::new(10.0, 15.2, 9.8, 15.0),
        TestBar::new(14.5, 15.0, 13.8, 14.0),
        TestBar::new(14.2, 14.8, 13.9, 14.0),
        TestBar::new(14.1, 14.5, 14.0, 14.0),
        TestBar::new(14.0, 16.2, 13.9, 16.0),
    ];
    assert_detects(
        BuiltinDetector::RisingThreeMethods(RisingThreeMethodsDetector),
        &bars,
        Direction::Bullish,
    );
}

#[test]
fn test_falling_three_methods() {
    let bars = vec![
        TestBar::new(15.0, 15.2, 9.8, 10.0),
        TestBar::new(10.5, 11.2, 10.0, 11.0),
        TestBar::new(10.8, 11.0, 10.2, 11.0),
        TestBar::new(10.9, 10.9, 10.3, 10.9),
        TestBar::new(10.8, 11.0, 8.8, 9.0),
    ];
    assert_detects(
        BuiltinDetector::FallingThreeMethods(FallingThreeMethodsDetector),
        &bars,
        Direction::Bearish,
    );
}

#[test]
fn test_three_methods_needs_five_bars() {
    let bars = vec![
        TestBar::new(14.5, 15.0, 13.8, 14.0),
        TestBar::new(14.2, 14.8, 13.9, 14.0),
        TestBar::new(14.1, 14.5, 14.0, 14.0),
        TestBar::new(14.0, 16.2, 13.9, 16.0),
    ];
    let library = only(BuiltinDetector::RisingThreeMethods(RisingThreeMethodsDetector));
    assert!(library.identify(&bars).is_empty());
}

// ============================================================
// CHART PATTERN TESTS
// ============================================================

fn from_highs(values: &[f64]) -> Vec<TestBar> {
    values
        .iter()
        .map(|&h| TestBar::new(h - 1.0, h, h - 2.0, h - 0.5))
        .collect()
}

#[test]
fn test_head_and_shoulders() {
    let bars = from_highs(&[10.0, 12.0, 14.0, 12.1, 11.0]);
    assert_detects(
        BuiltinDetector::HeadAndShoulders(HeadAndShouldersDetector::with_defaults()),
        &bars,
        Direction::Bearish,
    );
}

#[test]
fn test_double_top() {
    let bars = from_highs(&[10.0, 12.0, 11.0, 12.1, 11.0]);
    assert_detects(
        BuiltinDetector::DoubleTop(DoubleTopDetector::with_defaults()),
        &bars,
        Direction::Bearish,
    );
}

#[test]
fn test_double_bottom() {
    let bars: Vec<TestBar> = [12.0, 10.0, 11.0, 10.1, 11.0]
        .iter()
        .map(|&l| TestBar::new(l + 1.0, l + 2.0, l, l + 0.5))
        .collect();
    assert_detects(
        BuiltinDetector::DoubleBottom(DoubleBottomDetector::with_defaults()),
        &bars,
        Direction::Bullish,
    );
}

#[test]
fn test_triangle() {
    let bars: Vec<TestBar> = [101.0, 105.0, 102.0, 104.0, 101.0, 105.0, 102.0, 104.0]
        .iter()
        .map(|&h| TestBar::new(100.5, h, 100.0, 100.5))
        .collect();
    assert_detects(
        BuiltinDetector::Triangle(TriangleDetector::with_defaults()),
        &bars,
        Direction::Neutral,
    );

    // widening past the span limit breaks the pattern
    let mut wide = bars.clone();
    wide[3].h = 112.0;
    let library = only(BuiltinDetector::Triangle(TriangleDetector::with_defaults()));
    assert!(library.identify(&wide).is_empty());
}

#[test]
fn test_flag() {
    let bars: Vec<TestBar> = [100.0, 110.0, 110.0, 110.2, 110.1, 110.0]
        .iter()
        .map(|&c| TestBar::new(c, c + 0.5, c - 0.5, c))
        .collect();
    assert_detects(
        BuiltinDetector::Flag(FlagDetector),
        &bars,
        Direction::Neutral,
    );
}

#[test]
fn test_chart_detectors_report_chart_category() {
    let library = LibraryBuilder::new().with_chart_defaults().build().unwrap();
    assert!(library
        .detectors()
        .iter()
        .all(|d| d.category() == PatternCategory::Chart));
}

// ============================================================
// LIBRARY TESTS
// ============================================================

#[test]
fn test_library_with_all_defaults_names() {
    let library = PatternLibrary::default();
    let bars = with_tail(&[
        TestBar::new(10.0, 12.5, 9.5, 12.0),
        TestBar::new(13.0, 13.5, 8.5, 9.0),
    ]);
    let names = library.pattern_names(&bars);
    assert!(names.contains(&"Bearish Engulfing".to_string()));
    assert!(!names.contains(&NO_CLEAR_PATTERN.to_string()));
}

#[test]
fn test_no_clear_pattern_sentinel() {
    let library = LibraryBuilder::new()
        .add(BuiltinDetector::Doji(DojiDetector::with_defaults()))
        .build()
        .unwrap();
    let bars = make_uptrend(10);
    assert_eq!(library.pattern_names(&bars), vec![NO_CLEAR_PATTERN.to_string()]);
}

#[test]
fn test_identify_is_idempotent() {
    let library = PatternLibrary::default();
    let mut bars = make_downtrend(12);
    bars.push(TestBar::new(75.0, 80.0, 70.0, 75.0));
    let first = library.identify(&bars);
    let second = library.identify(&bars);
    assert_eq!(first, second);
}

#[test]
fn test_empty_and_short_input() {
    let library = PatternLibrary::default();
    let empty: Vec<TestBar> = Vec::new();
    assert!(library.identify(&empty).is_empty());
    assert!(library.identify(&make_uptrend(2)).is_empty());
    assert!(library.identify_at(&make_uptrend(4), 10).is_empty());
}

#[test]
fn test_identify_at_earlier_index() {
    let mut bars = make_downtrend(6);
    bars.push(TestBar::new(80.0, 85.0, 75.0, 80.0));
    bars.extend(make_uptrend(3));
    let library = only(BuiltinDetector::Doji(DojiDetector::with_defaults()));
    assert!(library.identify(&bars).is_empty());
    assert_eq!(library.identify_at(&bars, 6).len(), 1);
}

#[test]
fn test_add_checked_rejects_bad_threshold() {
    let bad = HammerDetector {
        long_shadow_factor: -1.0,
        ..HammerDetector::default()
    };
    assert!(LibraryBuilder::new()
        .add_checked(BuiltinDetector::Hammer(bad))
        .is_err());

    let nan = DojiDetector { doji_ratio: f64::NAN };
    assert!(LibraryBuilder::new()
        .add(BuiltinDetector::Doji(nan))
        .build()
        .is_err());
}

#[test]
fn test_with_params_tuning() {
    let params = HashMap::from([("doji_ratio", 0.05)]);
    let strict = DojiDetector::with_params(&params).unwrap();
    let library = only(BuiltinDetector::Doji(strict));

    // body ratio 0.08: a doji by default, not under the stricter ratio
    let bars = with_tail(&[TestBar::new(100.0, 105.0, 95.0, 100.8)]);
    assert!(library.identify(&bars).is_empty());
    assert_eq!(
        only(BuiltinDetector::Doji(DojiDetector::default())).identify(&bars).len(),
        1
    );

    let out_of_range = HashMap::from([("doji_ratio", 1.5)]);
    assert!(DojiDetector::with_params(&out_of_range).is_err());
}
