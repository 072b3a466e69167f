use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diagnostics;
use crate::error::{RegressionError, Result};
use crate::linear_model::INTERCEPT_LABEL;
use crate::metrics;
use crate::table::Table;
use crate::Vector;

/// Read-only state of a successful fit.
///
/// `data` is the design the coefficients were solved against, so it holds
/// the intercept column when one was fitted and the rescaled values for a
/// ridge fit. `p` is always the number of design columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SummaryParts", into = "SummaryParts")]
pub struct Summary {
    data: Table,
    response: Vector,
    betas: Vector,
    fitted: Vector,
    residuals: Vector,
    intercept: bool,
}

/// Persisted form of a [`Summary`]; deserializing goes through
/// [`Summary::from_parts`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryParts {
    pub data: Table,
    pub response: Vec<f64>,
    pub betas: Vec<f64>,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
    pub intercept: bool,
}

impl Summary {
    pub(crate) fn new(
        data: Table,
        response: Vector,
        betas: Vector,
        fitted: Vector,
        residuals: Vector,
        intercept: bool,
    ) -> Self {
        Self {
            data,
            response,
            betas,
            fitted,
            residuals,
            intercept,
        }
    }

    /// Rebuilds a summary from persisted state, checking that every vector
    /// lines up with the design.
    pub fn from_parts(
        data: Table,
        response: Vector,
        betas: Vector,
        fitted: Vector,
        residuals: Vector,
        intercept: bool,
    ) -> Result<Self> {
        let (n, p) = data.dims();
        for (name, len) in [
            ("response", response.len()),
            ("fitted", fitted.len()),
            ("residuals", residuals.len()),
        ] {
            if len != n {
                return Err(RegressionError::dimension(format!(
                    "{} has {} values, design has {} rows",
                    name, len, n
                )));
            }
        }
        if betas.len() != p {
            return Err(RegressionError::dimension(format!(
                "{} coefficients for {} design columns",
                betas.len(),
                p
            )));
        }
        Ok(Self::new(data, response, betas, fitted, residuals, intercept))
    }

    pub fn data(&self) -> &Table {
        &self.data
    }

    pub fn response(&self) -> &Vector {
        &self.response
    }

    pub fn coefficients(&self) -> &Vector {
        &self.betas
    }

    pub fn fitted(&self) -> &Vector {
        &self.fitted
    }

    /// `y − ŷ`.
    pub fn residuals(&self) -> &Vector {
        &self.residuals
    }

    /// Whether the first design column is the intercept.
    pub fn has_intercept(&self) -> bool {
        self.intercept
    }

    pub fn observations(&self) -> usize {
        self.data.rows()
    }

    pub fn parameters(&self) -> usize {
        self.data.cols()
    }

    /// Residual degrees of freedom `n − p`.
    pub fn degrees_of_freedom(&self) -> usize {
        self.observations().saturating_sub(self.parameters())
    }

    pub fn total_sum_of_squares(&self) -> f64 {
        metrics::total_sum_of_squares(&self.response)
    }

    pub fn residual_sum_of_squares(&self) -> f64 {
        metrics::residual_sum_of_squares(&self.residuals)
    }

    /// `1 − RSS/TSS`, or 1 for a constant response.
    pub fn r_squared(&self) -> f64 {
        let tss = self.total_sum_of_squares();
        if tss == 0.0 {
            return 1.0;
        }
        1.0 - self.residual_sum_of_squares() / tss
    }

    /// `1 − RSS·(n−1) / (TSS·(n−p))`. `NaN` when `n == p`.
    pub fn adjusted_r_squared(&self) -> f64 {
        let tss = self.total_sum_of_squares();
        if tss == 0.0 {
            return 1.0;
        }
        let n = self.observations() as f64;
        let df = self.degrees_of_freedom();
        if df == 0 {
            return f64::NAN;
        }
        1.0 - (self.residual_sum_of_squares() * (n - 1.0)) / (tss * df as f64)
    }

    /// `RSS/(n−p)`. `NaN` when there are no residual degrees of freedom.
    pub fn mean_squared_error(&self) -> f64 {
        match self.degrees_of_freedom() {
            0 => f64::NAN,
            df => self.residual_sum_of_squares() / df as f64,
        }
    }

    /// Residual standard error `√MSE`.
    pub fn sigma(&self) -> f64 {
        self.mean_squared_error().sqrt()
    }

    fn coefficient_label(&self, j: usize) -> String {
        match self.data.labels() {
            Some(labels) => labels[j].clone(),
            None if self.intercept && j == 0 => INTERCEPT_LABEL.to_string(),
            None => format!("x{}", j),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let residuals = self.residuals.to_vec();
        writeln!(f, "Residuals:")?;
        writeln!(
            f,
            "{:>12} {:>12} {:>12} {:>12} {:>12}",
            "Min", "1Q", "Median", "3Q", "Max"
        )?;
        writeln!(
            f,
            "{:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
            metrics::quantile(&residuals, 0.0),
            metrics::quantile(&residuals, 0.25),
            metrics::quantile(&residuals, 0.5),
            metrics::quantile(&residuals, 0.75),
            metrics::quantile(&residuals, 1.0),
        )?;

        writeln!(f)?;
        writeln!(f, "Coefficients:")?;
        for (j, beta) in self.betas.iter().enumerate() {
            writeln!(f, "{:<16} {:>14.6}", self.coefficient_label(j), beta)?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "Residual sum of squares: {:.4} on {} degrees of freedom",
            self.residual_sum_of_squares(),
            self.degrees_of_freedom()
        )?;
        writeln!(f, "Mean squared error: {:.4}", self.mean_squared_error())?;
        writeln!(
            f,
            "R-squared: {:.4}, Adjusted R-squared: {:.4}",
            self.r_squared(),
            self.adjusted_r_squared()
        )?;
        match diagnostics::f_statistic(self) {
            Ok(test) => write!(
                f,
                "F-statistic: {:.4} on {} and {} DF, p-value: {:.4e}",
                test.f, test.df_num, test.df_den, test.p_value
            ),
            Err(_) => write!(f, "F-statistic: n/a"),
        }
    }
}

impl TryFrom<SummaryParts> for Summary {
    type Error = RegressionError;

    fn try_from(parts: SummaryParts) -> Result<Self> {
        Summary::from_parts(
            parts.data,
            Vector::from(parts.response),
            Vector::from(parts.betas),
            Vector::from(parts.fitted),
            Vector::from(parts.residuals),
            parts.intercept,
        )
    }
}

impl From<Summary> for SummaryParts {
    fn from(summary: Summary) -> Self {
        SummaryParts {
            data: summary.data,
            response: summary.response.to_vec(),
            betas: summary.betas.to_vec(),
            fitted: summary.fitted.to_vec(),
            residuals: summary.residuals.to_vec(),
            intercept: summary.intercept,
        }
    }
}
