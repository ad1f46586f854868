//! Tunable pricing constants, their defaults, and merging of partial overrides.
//!
//! A [`Configuration`] is an immutable snapshot handed to every entry point of
//! the engine. Providers that only know a subset of the keys deserialize a
//! [`ConfigOverrides`] and call [`Configuration::merged`], which walks every
//! recognised key and falls back to the documented default when it is absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::convergence::AxisRange;
use crate::data::TypologyKey;
use crate::error::{QuoteError, Result};

/// Units/day assumed for a typology whose rate is missing or non-positive.
pub const DEFAULT_TYPOLOGY_RATE: f64 = 5.0;

/// €/m² used when neither the requested nor the 3-phase market rate is configured.
pub const DEFAULT_MARKET_RATE: f64 = 7.5;

/// Phase count whose rate serves as fallback for unknown phase counts.
pub const FALLBACK_PHASE_COUNT: u8 = 3;

/// Deviation cutoffs (percent) for the tri-state quality colouring of grid cells.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatrixThresholds {
    /// Highest deviation still rated excellent.
    pub green: f64,
    /// Highest deviation still rated good.
    pub orange: f64,
}

impl Default for MatrixThresholds {
    fn default() -> Self {
        Self {
            green: 10.0,
            orange: 20.0,
        }
    }
}

/// Row and column axes of one convergence-search instantiation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridAxes {
    /// Market-side parameter (price per m² or per unit).
    pub rows: AxisRange,
    /// Production-side parameter (daily throughput).
    pub columns: AxisRange,
}

/// Process-wide pricing constants. Read-only to the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Cost of one labor-day.
    pub daily_rate: f64,
    /// Advisory minimum acceptable daily price. Never enforced.
    pub floor_rate: f64,
    /// Low surface yield (m²/day), drives the pessimistic scenario.
    pub productivity_surface_min: f64,
    /// High surface yield (m²/day), drives the optimistic scenario.
    pub productivity_surface_max: f64,
    /// Units/day producible for each typology.
    pub productivity_typology: BTreeMap<TypologyKey, f64>,
    /// Market price per m², keyed by number of phases.
    pub market_rate: BTreeMap<u8, f64>,
    pub matrix_thresholds: MatrixThresholds,
    /// Axes of the surface-based convergence search.
    pub surface_grid: GridAxes,
    /// Axes of the unit-based convergence search.
    pub unit_grid: GridAxes,
}

impl Default for Configuration {
    fn default() -> Self {
        let productivity_typology = BTreeMap::from([
            (TypologyKey::T1, 8.0),
            (TypologyKey::T2, 7.0),
            (TypologyKey::T3, 6.0),
            (TypologyKey::T4, 5.0),
            (TypologyKey::T5, 4.0),
            (TypologyKey::Other, 5.0),
        ]);
        let market_rate = BTreeMap::from([(1, 4.5), (2, 6.0), (3, 7.5), (4, 9.0)]);

        Self {
            daily_rate: 840.0,
            floor_rate: 650.0,
            productivity_surface_min: 250.0,
            productivity_surface_max: 450.0,
            productivity_typology,
            market_rate,
            matrix_thresholds: MatrixThresholds::default(),
            surface_grid: GridAxes {
                rows: AxisRange::new(4.0, 12.0, 0.5),
                columns: AxisRange::new(250.0, 450.0, 25.0),
            },
            unit_grid: GridAxes {
                rows: AxisRange::new(80.0, 250.0, 10.0),
                columns: AxisRange::new(3.0, 12.0, 1.0),
            },
        }
    }
}

impl Configuration {
    /// Builds a complete configuration from a partial one, key by key.
    pub fn merged(overrides: ConfigOverrides) -> Self {
        let defaults = Self::default();

        let mut productivity_typology = BTreeMap::new();
        for key in TypologyKey::ALL {
            let rate = overrides
                .productivity_typology
                .get(&key)
                .or_else(|| defaults.productivity_typology.get(&key))
                .copied()
                .unwrap_or(DEFAULT_TYPOLOGY_RATE);
            productivity_typology.insert(key, rate);
        }

        let mut market_rate = defaults.market_rate.clone();
        market_rate.extend(overrides.market_rate);

        let thresholds = overrides.matrix_thresholds;
        let matrix_thresholds = MatrixThresholds {
            green: thresholds
                .green
                .unwrap_or(defaults.matrix_thresholds.green),
            orange: thresholds
                .orange
                .unwrap_or(defaults.matrix_thresholds.orange),
        };

        Self {
            daily_rate: overrides.daily_rate.unwrap_or(defaults.daily_rate),
            floor_rate: overrides.floor_rate.unwrap_or(defaults.floor_rate),
            productivity_surface_min: overrides
                .productivity_surface_min
                .unwrap_or(defaults.productivity_surface_min),
            productivity_surface_max: overrides
                .productivity_surface_max
                .unwrap_or(defaults.productivity_surface_max),
            productivity_typology,
            market_rate,
            matrix_thresholds,
            surface_grid: overrides.surface_grid.unwrap_or(defaults.surface_grid),
            unit_grid: overrides.unit_grid.unwrap_or(defaults.unit_grid),
        }
    }

    /// Checks that every numeric field is finite.
    pub fn validate(&self) -> Result<()> {
        let scalars = [
            ("dailyRate", self.daily_rate),
            ("floorRate", self.floor_rate),
            ("productivitySurfaceMin", self.productivity_surface_min),
            ("productivitySurfaceMax", self.productivity_surface_max),
            ("matrixThresholds.green", self.matrix_thresholds.green),
            ("matrixThresholds.orange", self.matrix_thresholds.orange),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(QuoteError::invalid_configuration(field, value));
            }
        }
        for (key, rate) in &self.productivity_typology {
            if !rate.is_finite() {
                return Err(QuoteError::invalid_configuration(
                    format!("productivityTypology.{key}"),
                    *rate,
                ));
            }
        }
        for (phases, rate) in &self.market_rate {
            if !rate.is_finite() {
                return Err(QuoteError::invalid_configuration(
                    format!("marketRate.{phases}"),
                    *rate,
                ));
            }
        }
        for (name, axes) in [("surfaceGrid", &self.surface_grid), ("unitGrid", &self.unit_grid)] {
            for (axis, range) in [("rows", &axes.rows), ("columns", &axes.columns)] {
                for (bound, value) in [("min", range.min), ("max", range.max), ("step", range.step)] {
                    if !value.is_finite() {
                        return Err(QuoteError::invalid_configuration(
                            format!("{name}.{axis}.{bound}"),
                            value,
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Units/day for a typology; non-positive or missing rates use [`DEFAULT_TYPOLOGY_RATE`].
    pub fn typology_rate(&self, key: TypologyKey) -> f64 {
        match self.productivity_typology.get(&key) {
            Some(&rate) if rate > 0.0 => rate,
            _ => DEFAULT_TYPOLOGY_RATE,
        }
    }

    /// Market €/m² for `phase_count`, falling back to the 3-phase rate, then to 7.5.
    pub fn market_rate_for(&self, phase_count: u8) -> f64 {
        self.market_rate
            .get(&phase_count)
            .or_else(|| self.market_rate.get(&FALLBACK_PHASE_COUNT))
            .copied()
            .unwrap_or(DEFAULT_MARKET_RATE)
    }

    /// Overrides the labor-day cost.
    pub fn with_daily_rate(mut self, daily_rate: f64) -> Self {
        self.daily_rate = daily_rate;
        self
    }

    /// Overrides the advisory floor rate.
    pub fn with_floor_rate(mut self, floor_rate: f64) -> Self {
        self.floor_rate = floor_rate;
        self
    }

    /// Overrides both surface yield bounds.
    pub fn with_surface_productivity(mut self, min: f64, max: f64) -> Self {
        self.productivity_surface_min = min;
        self.productivity_surface_max = max;
        self
    }

    /// Overrides the units/day of one typology.
    pub fn with_typology_rate(mut self, key: TypologyKey, rate: f64) -> Self {
        self.productivity_typology.insert(key, rate);
        self
    }

    /// Overrides the market €/m² for one phase count.
    pub fn with_market_rate(mut self, phase_count: u8, rate: f64) -> Self {
        self.market_rate.insert(phase_count, rate);
        self
    }

    /// Overrides both colouring cutoffs.
    pub fn with_thresholds(mut self, green: f64, orange: f64) -> Self {
        self.matrix_thresholds = MatrixThresholds { green, orange };
        self
    }
}

/// Partial configuration as returned by a provider. Every key is optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigOverrides {
    pub daily_rate: Option<f64>,
    pub floor_rate: Option<f64>,
    pub productivity_surface_min: Option<f64>,
    pub productivity_surface_max: Option<f64>,
    pub productivity_typology: BTreeMap<TypologyKey, f64>,
    pub market_rate: BTreeMap<u8, f64>,
    pub matrix_thresholds: ThresholdOverrides,
    pub surface_grid: Option<GridAxes>,
    pub unit_grid: Option<GridAxes>,
}

/// Partial [`MatrixThresholds`].
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ThresholdOverrides {
    pub green: Option<f64>,
    pub orange: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_overrides_yield_defaults() {
        let merged = Configuration::merged(ConfigOverrides::default());
        assert_eq!(merged, Configuration::default());
    }

    #[test]
    fn partial_maps_merge_key_by_key() {
        let mut overrides = ConfigOverrides {
            daily_rate: Some(900.0),
            ..ConfigOverrides::default()
        };
        overrides.productivity_typology.insert(TypologyKey::T2, 9.0);
        overrides.market_rate.insert(2, 6.5);
        overrides.matrix_thresholds.orange = Some(25.0);

        let merged = Configuration::merged(overrides);
        assert_eq!(merged.daily_rate, 900.0);
        assert_eq!(merged.floor_rate, 650.0);
        assert_eq!(merged.typology_rate(TypologyKey::T2), 9.0);
        assert_eq!(merged.typology_rate(TypologyKey::T3), 6.0);
        assert_eq!(merged.market_rate_for(2), 6.5);
        assert_eq!(merged.market_rate_for(4), 9.0);
        assert_eq!(merged.matrix_thresholds.green, 10.0);
        assert_eq!(merged.matrix_thresholds.orange, 25.0);
    }

    #[test]
    fn market_rate_falls_back_to_three_phases_then_constant() {
        let config = Configuration::default();
        assert_eq!(config.market_rate_for(7), 7.5);

        let mut sparse = Configuration::default().with_market_rate(3, 8.0);
        assert_eq!(sparse.market_rate_for(0), 8.0);

        sparse.market_rate.clear();
        assert_eq!(sparse.market_rate_for(3), DEFAULT_MARKET_RATE);
    }

    #[test]
    fn missing_or_zero_typology_rate_defaults_to_five() {
        let mut config = Configuration::default().with_typology_rate(TypologyKey::T4, 0.0);
        config.productivity_typology.remove(&TypologyKey::T1);
        assert_eq!(config.typology_rate(TypologyKey::T1), DEFAULT_TYPOLOGY_RATE);
        assert_eq!(config.typology_rate(TypologyKey::T4), DEFAULT_TYPOLOGY_RATE);
    }

    #[test]
    fn validate_rejects_non_finite_values() {
        assert!(Configuration::default().validate().is_ok());

        let config = Configuration::default().with_daily_rate(f64::NAN);
        assert!(matches!(
            config.validate(),
            Err(QuoteError::InvalidConfiguration { ref field, .. }) if field == "dailyRate"
        ));

        let config = Configuration::default().with_market_rate(2, f64::INFINITY);
        assert!(config.validate().is_err());
    }
}
