//! Phase/typology allocation of a target price.
//!
//! Contract:
//! - Each phase occurrence receives `target * weight / total_weight` where the
//!   weights come from [`phase_weight`]. Repeated phase names are independent
//!   rows.
//! - Inside a phase, unit prices are proportional to the time needed to clean
//!   one unit of each typology (`1 / rate`), so that
//!   `Σ unit_price[t] * count[t] == phase_total`.
//! - With no units at all ("global" mode) the phase total is a lump sum and the
//!   unit prices are informative only.
//! - A phase list whose weights sum to zero produces zero-valued rows.
//!
//! Manual corrections after allocation are applied through
//! [`BreakdownItem::override_unit_price`] and [`BreakdownItem::override_total`];
//! the proportional split is not maintained afterwards.

use std::collections::{BTreeMap, HashMap};

use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::data::{TypologyCount, TypologyKey};

/// Structural pricing weight of a phase. Unknown names weigh 0.
pub fn phase_weight(name: &str) -> f64 {
    match name {
        "Vitrerie" => 1.0,
        "OPR" => 4.0,
        "Pré-livraison" => 3.0,
        "Livraison" => 2.0,
        _ => 0.0,
    }
}

/// One occurrence of a named phase. `occurrence` counts from 1 per name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseOccurrence {
    pub name: String,
    pub occurrence: usize,
}

impl PhaseOccurrence {
    /// Numbers each entry of an ordered, possibly repeating phase list.
    pub fn sequence<S: AsRef<str>>(phases: &[S]) -> Vec<PhaseOccurrence> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        phases
            .iter()
            .map(|phase| {
                let name = phase.as_ref();
                let occurrence = seen.entry(name).or_insert(0);
                *occurrence += 1;
                PhaseOccurrence {
                    name: name.to_string(),
                    occurrence: *occurrence,
                }
            })
            .collect()
    }

    /// Stable identifier such as `Vitrerie#2`.
    pub fn id(&self) -> String {
        format!("{}#{}", self.name, self.occurrence)
    }
}

/// Allocated price of one phase occurrence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownItem {
    pub phase: String,
    pub occurrence: usize,
    pub total_phase: f64,
    /// Unit price per typology, not a subtotal.
    pub typologies: BTreeMap<TypologyKey, f64>,
}

impl BreakdownItem {
    /// Stable identifier of the phase occurrence this row prices.
    pub fn id(&self) -> String {
        format!("{}#{}", self.phase, self.occurrence)
    }

    /// Replaces one unit price. With real unit counts the phase total is
    /// recomputed from the unit prices; in global mode it is left as is.
    pub fn override_unit_price(&mut self, key: TypologyKey, price: f64, counts: &TypologyCount) {
        self.typologies.insert(key, price);
        if !counts.is_empty() {
            self.total_phase = self
                .typologies
                .iter()
                .map(|(key, unit_price)| unit_price * f64::from(counts.get(*key)))
                .sum();
        }
    }

    /// Replaces the phase total with a lump sum.
    pub fn override_total(&mut self, total: f64) {
        self.total_phase = total;
    }
}

/// Sum of the (possibly edited) phase totals.
pub fn grand_total(items: &[BreakdownItem]) -> f64 {
    items.iter().map(|item| item.total_phase).sum()
}

/// Days needed to clean one unit of `key`.
fn time_weight(key: TypologyKey, config: &Configuration) -> f64 {
    1.0 / config.typology_rate(key)
}

/// Distributes `target_total` over the phase occurrences and typologies.
///
/// Never fails: an empty phase list yields no rows, and zero counts, a zero
/// target or a weightless phase list yield zero-valued rows.
pub fn allocate<S: AsRef<str>>(
    target_total: f64,
    counts: &TypologyCount,
    phases: &[S],
    config: &Configuration,
) -> Vec<BreakdownItem> {
    let mut total_weight: f64 = counts
        .iter()
        .map(|(key, count)| f64::from(count) * time_weight(key, config))
        .sum();
    if total_weight == 0.0 {
        total_weight = 1.0;
    }

    let occurrences = PhaseOccurrence::sequence(phases);
    let total_phase_weight: f64 = occurrences
        .iter()
        .map(|occurrence| phase_weight(&occurrence.name))
        .sum();
    if total_phase_weight == 0.0 && !occurrences.is_empty() {
        warn!(
            "phase list {:?} carries no pricing weight; allocating zero",
            occurrences.iter().map(PhaseOccurrence::id).collect::<Vec<_>>()
        );
    }

    occurrences
        .into_iter()
        .map(|occurrence| {
            let phase_total = if total_phase_weight > 0.0 {
                target_total * phase_weight(&occurrence.name) / total_phase_weight
            } else {
                0.0
            };
            let typologies = TypologyKey::ALL
                .iter()
                .map(|&key| (key, phase_total / total_weight * time_weight(key, config)))
                .collect();
            trace!("allocated {phase_total:.2} to {}", occurrence.id());

            BreakdownItem {
                phase: occurrence.name,
                occurrence: occurrence.occurrence,
                total_phase: phase_total,
                typologies,
            }
        })
        .collect()
}
