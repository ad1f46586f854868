//! Convergence grid search between a production-cost model and a market model.
//!
//! Rows carry the market parameter (a price per unit or per m²) and columns the
//! production parameter (a daily throughput). Every cell compares the two
//! resulting prices and the cell with the smallest relative deviation is the
//! best operating point.
//!
//! Rows are evaluated in parallel; the best-cell scan is a separate row-major
//! pass in which the first cell seen wins ties. A cell whose deviation is not
//! finite never wins.

use log::{debug, warn};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{Configuration, MatrixThresholds};
use crate::data::TypologyCount;

/// Largest number of points generated for one axis before falling back to `[min, max]`.
pub const MAX_AXIS_POINTS: usize = 100;

/// Arithmetic sequence `min, min + step, …` bounded by `max`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl AxisRange {
    /// Range from `min` to `max` (inclusive when reached) by `step`.
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Expands the range into ascending values.
    ///
    /// A non-positive step yields no values, and more than
    /// [`MAX_AXIS_POINTS`] points collapse to `[min, max]`.
    pub fn values(&self) -> Vec<f64> {
        if !(self.step > 0.0) {
            return Vec::new();
        }
        let span = ((self.max - self.min) / self.step).floor();
        if !(span >= 0.0) {
            return Vec::new();
        }
        let count = span + 1.0;
        if count > MAX_AXIS_POINTS as f64 {
            warn!(
                "axis {}..{} step {} would generate {count} points; using bounds only",
                self.min, self.max, self.step
            );
            return vec![self.min, self.max];
        }
        (0..count as usize)
            .map(|index| self.min + index as f64 * self.step)
            .collect()
    }
}

/// Output of a production-cost model for one throughput value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostPoint {
    /// Labor-days needed at this throughput.
    pub days: f64,
    /// Production price.
    pub cost: f64,
}

/// `quantity / throughput` days at `daily_rate` each. A non-positive
/// throughput needs infinitely many days at an infinite cost.
pub fn throughput_cost(quantity: f64, throughput: f64, daily_rate: f64) -> CostPoint {
    if !(throughput > 0.0) {
        return CostPoint {
            days: f64::INFINITY,
            cost: f64::INFINITY,
        };
    }
    let days = quantity / throughput;
    CostPoint {
        days,
        cost: days * daily_rate,
    }
}

/// Relative deviation (percent) of the production price from the market price.
///
/// Infinite when the market price is not positive or either price is NaN.
pub fn deviation(prix_prod: f64, prix_marche: f64) -> f64 {
    if !(prix_marche > 0.0) {
        return f64::INFINITY;
    }
    let ecart = (prix_prod - prix_marche).abs() / prix_marche * 100.0;
    if ecart.is_nan() {
        f64::INFINITY
    } else {
        ecart
    }
}

/// Quality band of a deviation, used for colouring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviationBand {
    Excellent,
    Good,
    Poor,
}

impl DeviationBand {
    /// Buckets `ecart` against the green and orange cutoffs.
    pub fn classify(ecart: f64, thresholds: &MatrixThresholds) -> Self {
        if ecart <= thresholds.green {
            DeviationBand::Excellent
        } else if ecart <= thresholds.orange {
            DeviationBand::Good
        } else {
            DeviationBand::Poor
        }
    }
}

/// Both prices of one (row, column) pair and their deviation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// Market parameter of the row.
    pub row: f64,
    /// Production parameter of the column.
    pub col: f64,
    /// Labor-days behind `prix_prod`.
    pub days: f64,
    /// Production price from the column's throughput.
    pub prix_prod: f64,
    /// Market price from the row's unit price.
    pub prix_marche: f64,
    /// Relative deviation in percent, see [`deviation`].
    pub ecart: f64,
    /// Set on the single best cell of the grid.
    pub best: bool,
}

/// The winning cell. `position` is `None` when no cell has a finite deviation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestCell {
    pub position: Option<(usize, usize)>,
    pub row: f64,
    pub col: f64,
    pub ecart: f64,
    pub prix_prod: f64,
    pub prix_marche: f64,
}

impl BestCell {
    fn none() -> Self {
        Self {
            position: None,
            row: 0.0,
            col: 0.0,
            ecart: f64::INFINITY,
            prix_prod: 0.0,
            prix_marche: 0.0,
        }
    }
}

/// Deviation table produced by [`search`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvergenceGrid {
    pub row_values: Vec<f64>,
    pub col_values: Vec<f64>,
    pub rows: Vec<Vec<Cell>>,
    pub best: BestCell,
}

impl ConvergenceGrid {
    /// True when either axis generated no values.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// Cell at `(row, col)`, `None` when out of bounds.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    /// Quality band of one cell, `None` when out of bounds.
    pub fn band(&self, row: usize, col: usize, thresholds: &MatrixThresholds) -> Option<DeviationBand> {
        self.cell(row, col)
            .map(|cell| DeviationBand::classify(cell.ecart, thresholds))
    }

    /// `ecart` of every cell as a rows × columns matrix.
    pub fn deviation_matrix(&self) -> DMatrix<f64> {
        let ncols = if self.rows.is_empty() {
            0
        } else {
            self.col_values.len()
        };
        DMatrix::from_fn(self.rows.len(), ncols, |i, j| self.rows[i][j].ecart)
    }
}

/// Evaluates `cost_fn` on every column value and `revenue_fn` on every row
/// value, then flags the cell of minimum deviation.
///
/// Each function is called once per axis value. Only a finite deviation can
/// win, so a grid without one has no flagged cell.
pub fn search<C, R>(
    row_range: &AxisRange,
    col_range: &AxisRange,
    cost_fn: C,
    revenue_fn: R,
) -> ConvergenceGrid
where
    C: Fn(f64) -> CostPoint,
    R: Fn(f64) -> f64 + Sync,
{
    let row_values = row_range.values();
    let col_values = col_range.values();
    let costs: Vec<CostPoint> = col_values.iter().map(|&col| cost_fn(col)).collect();

    let mut rows: Vec<Vec<Cell>> = row_values
        .par_iter()
        .map(|&row| {
            let prix_marche = revenue_fn(row);
            col_values
                .iter()
                .zip(&costs)
                .map(|(&col, cost)| Cell {
                    row,
                    col,
                    days: cost.days,
                    prix_prod: cost.cost,
                    prix_marche,
                    ecart: deviation(cost.cost, prix_marche),
                    best: false,
                })
                .collect::<Vec<Cell>>()
        })
        .collect();

    let mut position: Option<(usize, usize)> = None;
    let mut best_ecart = f64::INFINITY;
    for (i, cells) in rows.iter().enumerate() {
        for (j, cell) in cells.iter().enumerate() {
            if cell.ecart < best_ecart {
                position = Some((i, j));
                best_ecart = cell.ecart;
            }
        }
    }

    let best = match position {
        Some((i, j)) => {
            let cell = &mut rows[i][j];
            cell.best = true;
            debug!(
                "best convergence at row {} / col {}: {:.2}% ({:.2} vs {:.2})",
                cell.row, cell.col, cell.ecart, cell.prix_prod, cell.prix_marche
            );
            BestCell {
                position,
                row: cell.row,
                col: cell.col,
                ecart: cell.ecart,
                prix_prod: cell.prix_prod,
                prix_marche: cell.prix_marche,
            }
        }
        None => BestCell::none(),
    };

    ConvergenceGrid {
        row_values,
        col_values,
        rows,
        best,
    }
}

/// Surface-based search: rows are €/m², columns m²/day.
pub fn surface_search(config: &Configuration, surface: f64) -> ConvergenceGrid {
    let axes = &config.surface_grid;
    search(
        &axes.rows,
        &axes.columns,
        |throughput| throughput_cost(surface, throughput, config.daily_rate),
        |price_per_m2| price_per_m2 * surface,
    )
}

/// Unit-based search: rows are € per unit, columns units/day.
pub fn unit_search(config: &Configuration, counts: &TypologyCount) -> ConvergenceGrid {
    let axes = &config.unit_grid;
    let units = counts.total_units() as f64;
    search(
        &axes.rows,
        &axes.columns,
        |throughput| throughput_cost(units, throughput, config.daily_rate),
        |price_per_unit| price_per_unit * units,
    )
}
