//! Project quantity containers: unit typologies and their counts.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unit-size classification of a dwelling, each with its own nominal surface
/// and cleaning throughput.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypologyKey {
    T1,
    T2,
    T3,
    T4,
    T5,
    Other,
}

impl TypologyKey {
    /// Every typology in canonical order.
    pub const ALL: [TypologyKey; 6] = [
        TypologyKey::T1,
        TypologyKey::T2,
        TypologyKey::T3,
        TypologyKey::T4,
        TypologyKey::T5,
        TypologyKey::Other,
    ];

    /// Nominal floor area (m²) used to simulate a surface from unit counts.
    pub fn nominal_surface(self) -> f64 {
        match self {
            TypologyKey::T1 => 28.0,
            TypologyKey::T2 => 45.0,
            TypologyKey::T3 => 65.0,
            TypologyKey::T4 => 82.0,
            TypologyKey::T5 => 105.0,
            TypologyKey::Other => 50.0,
        }
    }

    /// Stable label used in logs and payloads.
    pub fn label(self) -> &'static str {
        match self {
            TypologyKey::T1 => "T1",
            TypologyKey::T2 => "T2",
            TypologyKey::T3 => "T3",
            TypologyKey::T4 => "T4",
            TypologyKey::T5 => "T5",
            TypologyKey::Other => "Other",
        }
    }
}

impl fmt::Display for TypologyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unit counts for every typology. All six keys are always present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<TypologyKey, u32>",
    into = "BTreeMap<TypologyKey, u32>"
)]
pub struct TypologyCount {
    counts: BTreeMap<TypologyKey, u32>,
}

impl TypologyCount {
    /// Starts a builder where unspecified typologies default to zero.
    pub fn builder() -> TypologyCountBuilder {
        TypologyCountBuilder::default()
    }

    /// All counts set to zero.
    pub fn zero() -> Self {
        Self::from(BTreeMap::new())
    }

    /// Count for a single typology.
    pub fn get(&self, key: TypologyKey) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    /// Iterates `(key, count)` pairs in canonical order, zeros included.
    pub fn iter(&self) -> impl Iterator<Item = (TypologyKey, u32)> + '_ {
        self.counts.iter().map(|(key, count)| (*key, *count))
    }

    /// Total number of units across typologies.
    pub fn total_units(&self) -> u64 {
        self.counts.values().map(|&count| u64::from(count)).sum()
    }

    /// Surface implied by the unit mix at nominal typology areas.
    pub fn simulated_surface(&self) -> f64 {
        self.iter()
            .map(|(key, count)| f64::from(count) * key.nominal_surface())
            .sum()
    }

    /// True when no unit has been specified ("global" / lump-sum mode).
    pub fn is_empty(&self) -> bool {
        self.total_units() == 0
    }
}

impl Default for TypologyCount {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<BTreeMap<TypologyKey, u32>> for TypologyCount {
    fn from(mut partial: BTreeMap<TypologyKey, u32>) -> Self {
        for key in TypologyKey::ALL {
            partial.entry(key).or_insert(0);
        }
        Self { counts: partial }
    }
}

impl From<TypologyCount> for BTreeMap<TypologyKey, u32> {
    fn from(value: TypologyCount) -> Self {
        value.counts
    }
}

/// Builder that fills missing typologies with zero before constructing [`TypologyCount`].
#[derive(Debug, Default)]
pub struct TypologyCountBuilder {
    counts: BTreeMap<TypologyKey, u32>,
}

impl TypologyCountBuilder {
    /// Sets the count for one typology.
    pub fn count(mut self, key: TypologyKey, count: u32) -> Self {
        self.counts.insert(key, count);
        self
    }

    pub fn build(self) -> TypologyCount {
        TypologyCount::from(self.counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_every_key() {
        let counts = TypologyCount::builder()
            .count(TypologyKey::T2, 5)
            .count(TypologyKey::T3, 5)
            .build();

        assert_eq!(counts.iter().count(), 6);
        assert_eq!(counts.get(TypologyKey::T1), 0);
        assert_eq!(counts.get(TypologyKey::T3), 5);
        assert_eq!(counts.total_units(), 10);
        assert_eq!(counts.simulated_surface(), 5.0 * 45.0 + 5.0 * 65.0);
        assert!(!counts.is_empty());
    }

    #[test]
    fn zero_counts_are_global_mode() {
        let counts = TypologyCount::zero();
        assert!(counts.is_empty());
        assert_eq!(counts, TypologyCount::default());
    }
}
