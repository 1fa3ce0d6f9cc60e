//! Static pattern catalog
//!
//! Maps a pattern name to its historical reliability, bias and strength. The
//! catalog is built once and shared read-only between analyses; the
//! prediction engine only scores patterns it finds here.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::{detectors::ids, AnalysisError, Direction, PatternId, Ratio, Result};

/// Whether a pattern signals a turn or a resumption of the current move
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Reversal,
    Continuation,
}

/// One catalog row
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub reliability: Ratio,
    pub bias: Direction,
    pub strength: f64,
    pub kind: PatternKind,
}

impl CatalogEntry {
    /// Signed score contribution: `reliability * weight`, negative for bearish bias
    #[inline]
    pub fn weighted(&self, weight: f64) -> f64 {
        self.bias.sign() * self.reliability.get() * weight
    }
}

/// Immutable name -> entry table
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    entries: Vec<CatalogEntry>,
    by_name: HashMap<String, usize>,
}

// (id, reliability, bias, strength, kind)
const BUILTIN: &[(PatternId, f64, Direction, f64, PatternKind)] = {
    use Direction::*;
    use PatternKind::*;
    &[
        // Bullish reversal
        (ids::HAMMER, 0.75, Bullish, 0.8, Reversal),
        (ids::INVERTED_HAMMER, 0.68, Bullish, 0.7, Reversal),
        (ids::BULLISH_ENGULFING, 0.78, Bullish, 0.85, Reversal),
        (ids::MORNING_STAR, 0.72, Bullish, 0.8, Reversal),
        (ids::BULLISH_HARAMI, 0.65, Bullish, 0.6, Reversal),
        (ids::THREE_WHITE_SOLDIERS, 0.73, Bullish, 0.85, Reversal),
        (ids::PIERCING_LINE, 0.70, Bullish, 0.75, Reversal),
        (ids::UNIQUE_THREE_RIVER, 0.68, Bullish, 0.72, Reversal),
        // Bearish reversal
        (ids::HANGING_MAN, 0.73, Bearish, 0.8, Reversal),
        (ids::BEARISH_ENGULFING, 0.78, Bearish, 0.85, Reversal),
        (ids::EVENING_STAR, 0.72, Bearish, 0.8, Reversal),
        (ids::THREE_BLACK_CROWS, 0.73, Bearish, 0.85, Reversal),
        (ids::BEARISH_HARAMI, 0.65, Bearish, 0.6, Reversal),
        (ids::DARK_CLOUD_COVER, 0.70, Bearish, 0.75, Reversal),
        (ids::THRUSTING_LINE, 0.68, Bearish, 0.72, Reversal),
        // Doji family
        (ids::DOJI, 0.62, Neutral, 0.55, Continuation),
        (ids::SPINNING_TOP, 0.58, Neutral, 0.5, Continuation),
        (ids::LONG_LEGGED_DOJI, 0.65, Neutral, 0.6, Continuation),
        (ids::DRAGONFLY_DOJI, 0.68, Bullish, 0.75, Reversal),
        (ids::GRAVESTONE_DOJI, 0.68, Bearish, 0.75, Reversal),
        // Continuation
        (ids::RISING_THREE_METHODS, 0.70, Bullish, 0.8, Continuation),
        (ids::FALLING_THREE_METHODS, 0.70, Bearish, 0.8, Continuation),
        (ids::SIDE_BY_SIDE_WHITE_LINES, 0.60, Bullish, 0.65, Continuation),
        (ids::SIDE_BY_SIDE_DARK_LINES, 0.60, Bearish, 0.65, Continuation),
    ]
};

static BUILTIN_CATALOG: LazyLock<Arc<PatternCatalog>> = LazyLock::new(|| {
    let entries = BUILTIN
        .iter()
        .map(|&(id, reliability, bias, strength, kind)| CatalogEntry {
            name: id.as_str().to_string(),
            reliability: Ratio::new_const(reliability),
            bias,
            strength,
            kind,
        })
        .collect::<Vec<_>>();
    let by_name = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.name.clone(), i))
        .collect();
    Arc::new(PatternCatalog { entries, by_name })
});

impl PatternCatalog {
    /// Shared handle to the built-in catalog
    pub fn builtin() -> Arc<PatternCatalog> {
        Arc::clone(&BUILTIN_CATALOG)
    }

    /// Build a custom catalog; names must be unique.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if !entry.strength.is_finite() {
                return Err(AnalysisError::InvalidConfig(format!(
                    "catalog entry {} has non-finite strength",
                    entry.name
                )));
            }
            if by_name.insert(entry.name.clone(), i).is_some() {
                return Err(AnalysisError::InvalidConfig(format!(
                    "duplicate catalog entry {}",
                    entry.name
                )));
            }
        }
        Ok(Self { entries, by_name })
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_values() {
        let catalog = PatternCatalog::builtin();
        assert_eq!(catalog.len(), 24);

        let hammer = catalog.get("Hammer").unwrap();
        assert_eq!(hammer.reliability.get(), 0.75);
        assert_eq!(hammer.bias, Direction::Bullish);
        assert_eq!(hammer.kind, PatternKind::Reversal);

        let doji = catalog.get("Doji").unwrap();
        assert_eq!(doji.bias, Direction::Neutral);
        assert_eq!(doji.weighted(25.0), 0.0);

        let crows = catalog.get("Three Black Crows").unwrap();
        assert!((crows.weighted(25.0) + 18.25).abs() < 1e-9);
    }

    #[test]
    fn test_chart_patterns_not_cataloged() {
        let catalog = PatternCatalog::builtin();
        for id in [ids::DOUBLE_TOP, ids::DOUBLE_BOTTOM, ids::TRIANGLE, ids::FLAG, ids::HEAD_AND_SHOULDERS] {
            assert!(!catalog.contains(id.as_str()));
        }
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = PatternCatalog::builtin();
        let b = PatternCatalog::builtin();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_from_entries_rejects_duplicates() {
        let entry = CatalogEntry {
            name: "Hammer".into(),
            reliability: Ratio::new_const(0.5),
            bias: Direction::Bullish,
            strength: 0.5,
            kind: PatternKind::Reversal,
        };
        assert!(PatternCatalog::from_entries(vec![entry.clone(), entry]).is_err());
    }
}
