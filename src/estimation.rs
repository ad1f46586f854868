//! Multi-method price estimator.
//!
//! Four independent models price the same project:
//!
//! - **M1** (technical): labor-days derived from typology throughput, times the
//!   daily rate and the phase coefficient,
//! - **M2** (market): surface times the market €/m² for the phase count,
//! - **M3** / **M4** (pessimistic / optimistic): labor-days derived from the low
//!   and high surface yields, smoothed by [`SCENARIO_SMOOTHING`].
//!
//! The four prices are packaged as ranked [`Solution`]s that share the same
//! method list and min/max range.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::data::TypologyCount;

/// Down-weighting applied to the surface-yield scenarios, which ignore typology mix.
pub const SCENARIO_SMOOTHING: f64 = 0.8;

/// Markup for coordinating `phase_count` phases (mobilization, travel, overhead).
///
/// Calibrated business constants; counts outside `1..=4` use the 3-phase value.
pub fn phase_coefficient(phase_count: u8) -> f64 {
    match phase_count {
        1 => 1.3,
        2 => 2.0,
        3 => 2.75,
        4 => 3.5,
        _ => 2.75,
    }
}

/// Identifies one of the four estimation models.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodKind {
    M1,
    M2,
    M3,
    M4,
}

/// One named estimate plus the raw parameter that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvergenceMethod {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MethodKind,
    pub price: f64,
    pub details: String,
    pub param_value: f64,
    pub param_unit: String,
}

/// Lowest and highest positive method price of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// Identifier of a solution inside a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionId {
    /// Technical estimate (M1).
    Reco,
    /// Optimistic yield (M4).
    Low,
    /// Pessimistic yield (M3).
    High,
    /// Market reference (M2).
    Market,
}

impl SolutionId {
    /// Lowercase identifier, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            SolutionId::Reco => "reco",
            SolutionId::Low => "low",
            SolutionId::High => "high",
            SolutionId::Market => "market",
        }
    }
}

impl fmt::Display for SolutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate price offered to the user.
///
/// `price_raw` is the model price before the complexity multiplier and
/// `price_final` the price after it. Every solution of a batch carries the same
/// `methods` and `range`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub id: SolutionId,
    pub price_raw: f64,
    pub price_final: f64,
    /// Spread of the method prices relative to M1, in percent.
    pub convergence_score: f64,
    pub days: f64,
    pub methods: [ConvergenceMethod; 4],
    pub explanation: String,
    pub range: PriceRange,
}

impl Solution {
    /// Price per labor-day, or 0 when the solution carries no days.
    pub fn daily_price(&self) -> f64 {
        if self.days > 0.0 {
            self.price_final / self.days
        } else {
            0.0
        }
    }

    /// Advisory check against the configured floor rate.
    pub fn below_floor(&self, config: &Configuration) -> bool {
        self.days > 0.0 && self.daily_price() < config.floor_rate
    }
}

/// Intermediate figures shared by the four methods.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Workload {
    production_days: f64,
    simulated_surface: f64,
}

fn workload(counts: &TypologyCount, config: &Configuration) -> Workload {
    let production_days = counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(key, count)| f64::from(count) / config.typology_rate(key))
        .sum();
    Workload {
        production_days,
        simulated_surface: counts.simulated_surface(),
    }
}

fn yield_days(surface: f64, yield_per_day: f64) -> f64 {
    if yield_per_day > 0.0 {
        surface / yield_per_day
    } else {
        0.0
    }
}

/// Prices a project with all four methods and returns the solutions sorted by price.
///
/// Never fails: empty quantities produce zero prices.
pub fn estimate(
    counts: &TypologyCount,
    surface: f64,
    phase_count: u8,
    config: &Configuration,
) -> [Solution; 4] {
    let Workload {
        production_days,
        simulated_surface,
    } = workload(counts, config);
    let k_phase = phase_coefficient(phase_count);
    let surface_to_use = if surface > 0.0 {
        surface
    } else {
        simulated_surface
    };
    let market_rate = config.market_rate_for(phase_count);

    debug!(
        "estimating: {production_days:.4} production days, {simulated_surface} m² simulated, \
         {surface_to_use} m² used, k_phase {k_phase}"
    );

    let m1_price = production_days * config.daily_rate * k_phase;
    let m2_price = surface_to_use * market_rate;
    let pessimistic_days = yield_days(surface_to_use, config.productivity_surface_min);
    let optimistic_days = yield_days(surface_to_use, config.productivity_surface_max);
    let m3_price = pessimistic_days * config.daily_rate * k_phase * SCENARIO_SMOOTHING;
    let m4_price = optimistic_days * config.daily_rate * k_phase * SCENARIO_SMOOTHING;

    let methods = [
        ConvergenceMethod {
            name: "Technical".to_string(),
            kind: MethodKind::M1,
            price: m1_price,
            details: format!(
                "{production_days:.2} days × {} €/day × {k_phase}",
                config.daily_rate
            ),
            param_value: production_days,
            param_unit: "days".to_string(),
        },
        ConvergenceMethod {
            name: "Market".to_string(),
            kind: MethodKind::M2,
            price: m2_price,
            details: format!("{surface_to_use:.0} m² × {market_rate} €/m²"),
            param_value: market_rate,
            param_unit: "€/m²".to_string(),
        },
        ConvergenceMethod {
            name: "Pessimistic".to_string(),
            kind: MethodKind::M3,
            price: m3_price,
            details: format!(
                "{surface_to_use:.0} m² at {} m²/day",
                config.productivity_surface_min
            ),
            param_value: pessimistic_days,
            param_unit: "days".to_string(),
        },
        ConvergenceMethod {
            name: "Optimistic".to_string(),
            kind: MethodKind::M4,
            price: m4_price,
            details: format!(
                "{surface_to_use:.0} m² at {} m²/day",
                config.productivity_surface_max
            ),
            param_value: optimistic_days,
            param_unit: "days".to_string(),
        },
    ];

    let range = price_range(&methods);
    let divisor = if m1_price != 0.0 { m1_price } else { 1.0 };
    let convergence_score = (range.max - range.min).abs() / divisor * 100.0;
    debug!(
        "method prices M1={m1_price:.2} M2={m2_price:.2} M3={m3_price:.2} M4={m4_price:.2}, \
         convergence {convergence_score:.1}%"
    );

    let solution = |id: SolutionId, price: f64, days: f64, explanation: String| Solution {
        id,
        price_raw: price,
        price_final: price,
        convergence_score,
        days,
        methods: methods.clone(),
        explanation,
        range,
    };

    let mut solutions = [
        solution(
            SolutionId::Reco,
            m1_price,
            production_days,
            format!(
                "Production-based estimate: {production_days:.2} labor-days at {} €/day, \
                 coordinated over {phase_count} phase(s).",
                config.daily_rate
            ),
        ),
        solution(
            SolutionId::Low,
            m4_price,
            optimistic_days,
            format!(
                "Optimistic scenario: {} m²/day on {surface_to_use:.0} m².",
                config.productivity_surface_max
            ),
        ),
        solution(
            SolutionId::High,
            m3_price,
            pessimistic_days,
            format!(
                "Pessimistic scenario: {} m²/day on {surface_to_use:.0} m².",
                config.productivity_surface_min
            ),
        ),
        solution(
            SolutionId::Market,
            m2_price,
            production_days,
            format!("Market reference: {market_rate} €/m² on {surface_to_use:.0} m²."),
        ),
    ];
    solutions.sort_by(|a, b| a.price_final.total_cmp(&b.price_final));
    solutions
}

/// Min/max over the positive method prices; `{0, 0}` when none is positive.
fn price_range(methods: &[ConvergenceMethod]) -> PriceRange {
    let mut positive = methods
        .iter()
        .map(|method| method.price)
        .filter(|price| *price > 0.0)
        .peekable();
    if positive.peek().is_none() {
        return PriceRange { min: 0.0, max: 0.0 };
    }
    positive.fold(
        PriceRange {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        },
        |range, price| PriceRange {
            min: range.min.min(price),
            max: range.max.max(price),
        },
    )
}
