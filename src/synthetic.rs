//! Synthetic candle fallback
//!
//! A drifting random walk used when a chart yields no usable candles, so the
//! downstream stages always have a valid sequence to work on. The random
//! source is supplied by the caller; a seeded `StdRng` gives reproducible
//! output.

use rand::distributions::Uniform;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use tracing::debug;

use crate::{config::SyntheticConfig, Candle, Result};

/// Generates plausible candle sequences
#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    config: SyntheticConfig,
    open_noise: Uniform<f64>,
    wick: Uniform<f64>,
    volume: Uniform<f64>,
}

impl SyntheticGenerator {
    pub fn new(config: SyntheticConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    // Uniform ranges must be non-empty; `validate` guarantees it
    fn build(config: SyntheticConfig) -> Self {
        Self {
            open_noise: Uniform::new(-config.open_noise, config.open_noise),
            wick: Uniform::new(config.wick_min, config.wick_max),
            volume: Uniform::new(config.volume_min, config.volume_max),
            config,
        }
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    /// Configured number of candles
    pub fn generate_default<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Candle> {
        self.generate(self.config.count, rng)
    }

    /// `count` candles, each opening near the previous close.
    pub fn generate<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<Candle> {
        let mut base = self.config.base_price;
        let mut candles = Vec::with_capacity(count);

        for index in 0..count {
            let open = base + self.open_noise.sample(rng);
            let z: f64 = StandardNormal.sample(rng);
            let close = open + self.config.change_mean + self.config.change_sigma * z;
            let high = open.max(close) + self.wick.sample(rng);
            let low = open.min(close) - self.wick.sample(rng);
            let volume = self.volume.sample(rng);

            candles.push(Candle::new(open, high, low, close, volume, index));
            base = close;
        }

        debug!(candles = count, "generated synthetic candles");
        candles
    }
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::build(SyntheticConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{validate_bars, OHLCVExt};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_default_count_and_invariant() {
        let generator = SyntheticGenerator::new(SyntheticConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let candles = generator.generate_default(&mut rng);

        assert_eq!(candles.len(), 20);
        assert!(validate_bars(&candles).is_ok());
        for (i, c) in candles.iter().enumerate() {
            assert_eq!(c.index, i);
            assert!(c.low <= c.body_bottom() && c.high >= c.body_top());
            assert!((1000.0..5000.0).contains(&c.volume));
        }
    }

    #[test]
    fn test_walk_continues_from_previous_close() {
        let generator = SyntheticGenerator::new(SyntheticConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let candles = generator.generate(30, &mut rng);
        for pair in candles.windows(2) {
            assert!((pair[1].open - pair[0].close).abs() <= 1.0);
        }
    }

    #[test]
    fn test_seeded_output_is_reproducible() {
        let generator = SyntheticGenerator::default();
        let a = generator.generate(10, &mut StdRng::seed_from_u64(9));
        let b = generator.generate(10, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SyntheticConfig {
            count: 1,
            ..Default::default()
        };
        assert!(SyntheticGenerator::new(config).is_err());
    }
}
