//! Linear models fitted through a common [`Trainer`] contract.
//!
//! This module provides:
//! - `OlsTrainer`: ordinary least squares through a QR factorization
//! - `RidgeTrainer`: ridge regression through a singular value decomposition
//! - `GlmTrainer`: generalized linear models through iteratively reweighted
//!   least squares, for any [`Family`]
//!
//! Every trainer consumes a [`Table`] and returns a prediction-only
//! [`Model`] next to a read-only [`Summary`] of the fit.
//!
//! # Examples
//!
//! ## Ordinary least squares
//! ```rust
//! use tabular_lm::{Model, OlsTrainer, Table, Trainer};
//! use ndarray::array;
//!
//! let x = Table::from_rows(&[vec![1.0], vec![2.0], vec![3.0]]).unwrap();
//! let y = array![2.0, 4.0, 6.0];
//!
//! let (model, summary) = OlsTrainer::new().train(x, &y).unwrap();
//! assert!((model.predict(&[4.0]).unwrap() - 8.0).abs() < 1e-10);
//! assert!(summary.r_squared() > 0.999);
//! ```
//!
//! ## Ridge regression
//! ```rust
//! use tabular_lm::{Model, RidgeTrainer, Table, Trainer};
//! use ndarray::array;
//!
//! let x = Table::from_rows(&[vec![1.0, 2.0], vec![2.0, 1.0], vec![3.0, 5.0], vec![4.0, 3.0]]).unwrap();
//! let y = array![3.0, 3.5, 8.0, 7.5];
//!
//! let (model, _summary) = RidgeTrainer::new().lambda(0.5).train(x, &y).unwrap();
//! let prediction = model.predict(&[2.5, 2.5]).unwrap();
//! assert!(prediction.is_finite());
//! ```
//!
//! ## Poisson regression
//! ```rust
//! use tabular_lm::{Family, GlmTrainer, Model, Table, Trainer};
//! use ndarray::array;
//!
//! let x = Table::from_rows(&[vec![0.0], vec![1.0], vec![2.0], vec![3.0], vec![4.0]]).unwrap();
//! let y = array![1.0, 2.0, 3.0, 7.0, 12.0];
//!
//! let trainer = GlmTrainer::new()
//!     .family(Family::Poisson)
//!     .max_iterations(50)
//!     .tolerance(1e-8);
//! let (model, _summary) = trainer.train(x, &y).unwrap();
//! assert!(model.converged());
//! ```

mod glm;
mod ols;
mod ridge;

pub use glm::{Family, GlmConfig, GlmModel, GlmTrainer, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
pub use ols::OlsTrainer;
pub use ridge::RidgeTrainer;

use ndarray::{s, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{RegressionError, Result};
use crate::summary::Summary;
use crate::table::Table;
use crate::Vector;

/// Label given to the column of ones inserted in front of a labelled design.
pub const INTERCEPT_LABEL: &str = "(Intercept)";

/// Fits a model to a table and a response vector.
///
/// The table is taken by value: trainers may insert an intercept column or
/// rescale it in place, and the rewritten table ends up in the [`Summary`].
/// On failure nothing is returned but the error.
pub trait Trainer {
    type Model: Model;

    fn train(&self, table: Table, response: &Vector) -> Result<(Self::Model, Summary)>;
}

/// Prediction surface of a fitted model.
pub trait Model {
    fn coefficients(&self) -> &Vector;

    /// Prediction for one row of predictor values (no intercept entry).
    fn predict(&self, row: &[f64]) -> Result<f64>;

    fn predict_table(&self, table: &Table) -> Result<Vector> {
        table
            .data()
            .rows()
            .into_iter()
            .map(|row| self.predict(&row.to_vec()))
            .collect()
    }
}

/// `β₀ + Σ βⱼxⱼ` when the intercept was fitted, `Σ βⱼxⱼ` otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    betas: Vector,
    intercept: bool,
}

impl LinearModel {
    pub fn new(betas: Vector, intercept: bool) -> Self {
        Self { betas, intercept }
    }

    pub fn intercept(&self) -> Option<f64> {
        if self.intercept {
            self.betas.first().copied()
        } else {
            None
        }
    }

    /// Coefficients of the predictor columns, intercept excluded.
    pub fn slopes(&self) -> ArrayView1<'_, f64> {
        let start = usize::from(self.intercept).min(self.betas.len());
        self.betas.slice(s![start..])
    }
}

impl Model for LinearModel {
    fn coefficients(&self) -> &Vector {
        &self.betas
    }

    fn predict(&self, row: &[f64]) -> Result<f64> {
        let slopes = self.slopes();
        if row.len() != slopes.len() {
            return Err(RegressionError::dimension(format!(
                "row has {} values, model expects {}",
                row.len(),
                slopes.len()
            )));
        }
        let linear: f64 = slopes.iter().zip(row).map(|(b, x)| b * x).sum();
        Ok(self.intercept().unwrap_or(0.0) + linear)
    }
}

pub(crate) fn check_response(table: &Table, response: &Vector) -> Result<()> {
    if response.len() != table.rows() {
        return Err(RegressionError::dimension(format!(
            "response has {} values, table has {} rows",
            response.len(),
            table.rows()
        )));
    }
    Ok(())
}

/// Puts a column of ones in front of the table.
pub(crate) fn add_intercept(mut table: Table) -> Result<Table> {
    let ones = vec![1.0; table.rows()];
    if table.labels().is_some() {
        table.push_col_labeled(INTERCEPT_LABEL, &ones)?;
    } else {
        table.push_col(&ones)?;
    }
    Ok(table)
}

/// Rejects designs that cannot be solved column for column.
pub(crate) fn check_design(design: &Table) -> Result<()> {
    let (n, p) = design.dims();
    if p == 0 {
        return Err(RegressionError::dimension("design has no columns"));
    }
    if n < p {
        return Err(RegressionError::dimension(format!(
            "{} observations cannot identify {} coefficients",
            n, p
        )));
    }
    Ok(())
}
