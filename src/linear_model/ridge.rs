use log::{debug, warn};

use super::{check_response, LinearModel, Trainer};
use crate::decomposition::{Svd, RANK_TOLERANCE};
use crate::error::{RegressionError, Result};
use crate::summary::Summary;
use crate::table::Table;
use crate::Vector;

/// Ridge regression with shrinkage `λ ≥ 0`, solved through the SVD of the
/// standardized design.
///
/// Training standardizes every column of the table and centers the
/// response, and the [`Summary`] describes that rescaled problem (no
/// intercept column, centered response). The returned model is mapped back
/// to the original scale and carries the intercept.
#[derive(Clone, Debug)]
pub struct RidgeTrainer {
    lambda: f64,
}

impl RidgeTrainer {
    pub fn new() -> Self {
        Self { lambda: 1.0 }
    }

    pub fn lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    fn check_lambda(&self) -> Result<()> {
        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(RegressionError::Configuration(format!(
                "lambda must be finite and non-negative, got {}",
                self.lambda
            )));
        }
        Ok(())
    }
}

impl Default for RidgeTrainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Trainer for RidgeTrainer {
    type Model = LinearModel;

    fn train(&self, mut table: Table, response: &Vector) -> Result<(LinearModel, Summary)> {
        self.check_lambda()?;
        check_response(&table, response)?;
        if table.cols() == 0 || table.rows() < 2 {
            return Err(RegressionError::dimension(format!(
                "ridge needs at least two rows and one column, got {} x {}",
                table.rows(),
                table.cols()
            )));
        }

        let moments = table.column_moments();
        for (j, &(_, sd)) in moments.iter().enumerate() {
            if sd == 0.0 {
                warn!("ridge: column {} has zero variance and is only centered", j);
            }
        }
        table.standardize();

        let y_mean = response.mean().unwrap_or(0.0);
        let centered = response - y_mean;

        let svd = Svd::factorize(table.data())?;
        let sigma = svd.singular_values();
        let largest = sigma.first().copied().unwrap_or(0.0);
        let smallest = sigma.last().copied().unwrap_or(0.0);
        if self.lambda == 0.0 && smallest <= RANK_TOLERANCE * largest {
            return Err(RegressionError::singular(
                "standardized design is rank deficient and lambda is zero",
            ));
        }

        // σ / (σ² + λ) is the pseudo-inverse of Σ at λ = 0
        let shrunk = sigma.mapv(|s| if s > 0.0 { s / (s * s + self.lambda) } else { 0.0 });
        let uty = svd.u().t().dot(&centered);
        let betas = svd.v().dot(&(shrunk * uty));

        let fitted = table.data().dot(&betas);
        let residuals = &centered - &fitted;

        let slopes: Vec<f64> = betas
            .iter()
            .zip(&moments)
            .map(|(b, &(_, sd))| if sd > 0.0 { b / sd } else { *b })
            .collect();
        let intercept = y_mean
            - slopes
                .iter()
                .zip(&moments)
                .map(|(b, &(mean, _))| b * mean)
                .sum::<f64>();

        debug!(
            "ridge fit: lambda {}, condition number {:.3e}",
            self.lambda,
            svd.condition_number()
        );

        let mut coefficients = Vec::with_capacity(slopes.len() + 1);
        coefficients.push(intercept);
        coefficients.extend(slopes);
        let model = LinearModel::new(Vector::from(coefficients), true);
        let summary = Summary::new(table, centered, betas, fitted, residuals, false);
        Ok((model, summary))
    }
}
