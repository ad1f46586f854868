//! Quoting pipeline: estimate, adjust for complexity, select, allocate.
//!
//! This is the only layer that can fail. The pricing functions it wraps are
//! total, but building a breakdown needs a selected solution, and a
//! configuration must hold finite numbers before it is used.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::allocation::{allocate, BreakdownItem};
use crate::complexity::{apply_multiplier, ComplexityParams};
use crate::config::Configuration;
use crate::convergence::{surface_search, unit_search, ConvergenceGrid};
use crate::data::TypologyCount;
use crate::error::{QuoteError, Result};
use crate::estimation::{estimate, Solution, SolutionId};

/// Quantities entered for one project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Units per typology.
    pub counts: TypologyCount,
    /// Measured surface in m². Zero means "derive it from the unit mix".
    pub surface: f64,
    /// Number of phases, `1..=4`; other values price as three.
    pub phase_count: u8,
    /// Percentage impacts feeding the surcharge multiplier.
    pub complexity: ComplexityParams,
    /// Active phases in order; repeats are separate passes.
    pub phases: Vec<String>,
}

impl Default for QuoteRequest {
    fn default() -> Self {
        Self {
            counts: TypologyCount::zero(),
            surface: 0.0,
            phase_count: 3,
            complexity: ComplexityParams::default(),
            phases: Vec::new(),
        }
    }
}

impl QuoteRequest {
    /// Sets the unit counts.
    pub fn with_counts(mut self, counts: TypologyCount) -> Self {
        self.counts = counts;
        self
    }

    /// Sets the measured surface in m².
    pub fn with_surface(mut self, surface: f64) -> Self {
        self.surface = surface;
        self
    }

    /// Sets the number of phases used for coefficients and market rates.
    pub fn with_phase_count(mut self, phase_count: u8) -> Self {
        self.phase_count = phase_count;
        self
    }

    /// Sets the complexity impacts.
    pub fn with_complexity(mut self, complexity: ComplexityParams) -> Self {
        self.complexity = complexity;
        self
    }

    /// Sets the active phase list.
    pub fn with_phases<S: Into<String>>(mut self, phases: impl IntoIterator<Item = S>) -> Self {
        self.phases = phases.into_iter().map(Into::into).collect();
        self
    }

    /// Measured surface when given, otherwise the surface implied by the unit mix.
    pub fn effective_surface(&self) -> f64 {
        if self.surface > 0.0 {
            self.surface
        } else {
            self.counts.simulated_surface()
        }
    }
}

/// Quoting entry point bound to one configuration snapshot.
#[derive(Clone, Debug)]
pub struct Quote {
    config: Configuration,
}

impl Quote {
    /// Validates the configuration and takes ownership of it.
    pub fn new(config: Configuration) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration snapshot this quote prices with.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Estimates the request and applies its complexity multiplier.
    pub fn solutions(&self, request: &QuoteRequest) -> Vec<Solution> {
        let raw = estimate(
            &request.counts,
            request.surface,
            request.phase_count,
            &self.config,
        );
        let multiplier = request.complexity.multiplier();
        let solutions = apply_multiplier(&raw, multiplier);

        for solution in solutions.iter().filter(|s| s.below_floor(&self.config)) {
            warn!(
                "solution `{}` prices {:.2}/day, below the {:.2} floor rate",
                solution.id,
                solution.daily_price(),
                self.config.floor_rate
            );
        }
        solutions
    }

    /// Finds the selected solution in a batch.
    pub fn select(solutions: &[Solution], selected: Option<SolutionId>) -> Result<&Solution> {
        let id = selected.ok_or_else(|| QuoteError::missing_selection("solution"))?;
        solutions
            .iter()
            .find(|solution| solution.id == id)
            .ok_or_else(|| QuoteError::UnknownSolution {
                id: id.to_string(),
            })
    }

    /// Allocates the selected solution's final price over the request's phases.
    pub fn breakdown(
        &self,
        solutions: &[Solution],
        selected: Option<SolutionId>,
        request: &QuoteRequest,
    ) -> Result<Vec<BreakdownItem>> {
        let solution = Self::select(solutions, selected)?;
        info!(
            "allocating {:.2} from `{}` over {} phase(s)",
            solution.price_final,
            solution.id,
            request.phases.len()
        );
        Ok(allocate(
            solution.price_final,
            &request.counts,
            &request.phases,
            &self.config,
        ))
    }

    /// Surface-based convergence grid for the request.
    pub fn surface_convergence(&self, request: &QuoteRequest) -> ConvergenceGrid {
        surface_search(&self.config, request.effective_surface())
    }

    /// Unit-based convergence grid for the request.
    pub fn unit_convergence(&self, request: &QuoteRequest) -> ConvergenceGrid {
        unit_search(&self.config, &request.counts)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::allocation::grand_total;
    use crate::data::TypologyKey;

    fn request() -> QuoteRequest {
        QuoteRequest::default()
            .with_counts(
                TypologyCount::builder()
                    .count(TypologyKey::T2, 5)
                    .count(TypologyKey::T3, 5)
                    .build(),
            )
            .with_complexity(ComplexityParams {
                distance: 10.0,
                ..ComplexityParams::default()
            })
            .with_phases(["Vitrerie", "OPR", "Livraison"])
    }

    #[test]
    fn breakdown_requires_a_selection() {
        let quote = Quote::new(Configuration::default()).unwrap();
        let request = request();
        let solutions = quote.solutions(&request);

        let result = quote.breakdown(&solutions, None, &request);
        assert!(matches!(result, Err(QuoteError::MissingSelection { .. })));

        let result = quote.breakdown(&[], Some(SolutionId::Reco), &request);
        assert!(matches!(result, Err(QuoteError::UnknownSolution { .. })));
    }

    #[test]
    fn breakdown_allocates_the_adjusted_price() {
        let quote = Quote::new(Configuration::default()).unwrap();
        let request = request();
        let solutions = quote.solutions(&request);
        let reco = Quote::select(&solutions, Some(SolutionId::Reco)).unwrap();
        assert_relative_eq!(reco.price_final / reco.price_raw, 1.1, epsilon = 1e-12);

        let items = quote
            .breakdown(&solutions, Some(SolutionId::Reco), &request)
            .unwrap();
        assert_eq!(items.len(), 3);
        assert_relative_eq!(grand_total(&items), reco.price_final, epsilon = 1e-9);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let config = Configuration::default().with_floor_rate(f64::NAN);
        assert!(matches!(
            Quote::new(config),
            Err(QuoteError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn convergence_grids_use_effective_surface() {
        let quote = Quote::new(Configuration::default()).unwrap();
        let request = request();
        let grid = quote.surface_convergence(&request);
        assert_relative_eq!(grid.rows[0][0].prix_marche, 4.0 * 550.0, epsilon = 1e-9);

        let units = quote.unit_convergence(&request);
        assert_relative_eq!(units.rows[0][0].prix_marche, 80.0 * 10.0, epsilon = 1e-9);
    }
}
