//! Complexity surcharge applied uniformly to an estimate batch.

use serde::{Deserialize, Serialize};

use crate::estimation::Solution;

/// Four independent percentage impacts. Each is expected to be non-negative;
/// no clamping is performed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityParams {
    /// Travel distance to the site.
    pub distance: f64,
    /// Required finishing level.
    pub finition: f64,
    /// Site accessibility.
    pub accessibilite: f64,
    /// State of the premises.
    pub etat: f64,
}

impl ComplexityParams {
    /// `1 + (distance + finition + accessibilite + etat) / 100`.
    ///
    /// Returns exactly `1.0` when all four impacts are zero.
    pub fn multiplier(&self) -> f64 {
        let total = self.distance + self.finition + self.accessibilite + self.etat;
        1.0 + total / 100.0
    }
}

/// Scales `price_final`, the range and every method price by `multiplier`.
///
/// `price_raw` is left untouched so that, on a fresh batch,
/// `price_final / price_raw == multiplier`.
pub fn apply_multiplier(solutions: &[Solution], multiplier: f64) -> Vec<Solution> {
    solutions
        .iter()
        .map(|solution| {
            let mut scaled = solution.clone();
            scaled.price_final *= multiplier;
            scaled.range.min *= multiplier;
            scaled.range.max *= multiplier;
            for method in scaled.methods.iter_mut() {
                method.price *= multiplier;
            }
            scaled
        })
        .collect()
}
