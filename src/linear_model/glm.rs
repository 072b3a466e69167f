use log::{debug, warn};
use ndarray::Axis;
use serde::{Deserialize, Serialize};

use super::{add_intercept, check_design, check_response, LinearModel, Model, Trainer};
use crate::decomposition::solve;
use crate::error::{RegressionError, Result};
use crate::summary::Summary;
use crate::table::Table;
use crate::Vector;

pub const DEFAULT_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_MAX_ITERATIONS: usize = 25;

/// Error distribution of a generalized linear model, each paired with its
/// canonical link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Family {
    /// Identity link, constant variance.
    Gaussian,
    /// Logit link, `Var(μ) = μ(1 − μ)`. Responses are proportions in `[0, 1]`.
    Binomial,
    /// Log link, `Var(μ) = μ`. Responses are non-negative.
    Poisson,
    /// Inverse link `μ = 1/η`, `Var(μ) = μ²`. Responses are positive.
    Gamma,
    /// `μ = 1/√η`, `Var(μ) = μ³`. Responses are positive.
    InverseGaussian,
}

impl Family {
    /// `μ = g⁻¹(η)`.
    pub fn inverse_link(&self, eta: f64) -> f64 {
        match self {
            Family::Gaussian => eta,
            Family::Binomial => 1.0 / (1.0 + (-eta).exp()),
            Family::Poisson => eta.exp(),
            Family::Gamma => 1.0 / eta,
            Family::InverseGaussian => 1.0 / eta.sqrt(),
        }
    }

    /// `η = g(μ)`.
    pub fn link(&self, mu: f64) -> f64 {
        match self {
            Family::Gaussian => mu,
            Family::Binomial => (mu / (1.0 - mu)).ln(),
            Family::Poisson => mu.ln(),
            Family::Gamma => 1.0 / mu,
            Family::InverseGaussian => 1.0 / (mu * mu),
        }
    }

    /// `dμ/dη` evaluated at `η`.
    pub fn derivative(&self, eta: f64) -> f64 {
        match self {
            Family::Gaussian => 1.0,
            Family::Binomial => {
                let mu = self.inverse_link(eta);
                mu * (1.0 - mu)
            }
            Family::Poisson => eta.exp(),
            Family::Gamma => -1.0 / (eta * eta),
            Family::InverseGaussian => -0.5 * eta.powf(-1.5),
        }
    }

    pub fn variance(&self, mu: f64) -> f64 {
        match self {
            Family::Gaussian => 1.0,
            Family::Binomial => mu * (1.0 - mu),
            Family::Poisson => mu,
            Family::Gamma => mu * mu,
            Family::InverseGaussian => mu * mu * mu,
        }
    }

    /// Starting mean for an observation, kept away from the boundary of the
    /// link's domain.
    fn initial_mean(&self, y: f64) -> f64 {
        match self {
            Family::Binomial => (y + 0.5) / 2.0,
            Family::Poisson => y + 0.1,
            _ => y,
        }
    }

    fn check_response(&self, y: f64) -> Result<()> {
        let valid = y.is_finite()
            && match self {
                Family::Gaussian => true,
                Family::Binomial => (0.0..=1.0).contains(&y),
                Family::Poisson => y >= 0.0,
                Family::Gamma | Family::InverseGaussian => y > 0.0,
            };
        if valid {
            Ok(())
        } else {
            Err(RegressionError::Domain(format!(
                "response {} is outside the support of the {:?} family",
                y, self
            )))
        }
    }
}

/// The three settings every GLM fit needs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlmConfig {
    pub family: Family,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl GlmConfig {
    pub fn new(family: Family, max_iterations: usize, tolerance: f64) -> Self {
        Self {
            family,
            max_iterations,
            tolerance,
        }
    }
}

/// Generalized linear models through iteratively reweighted least squares.
///
/// Family, iteration bound and tolerance have no implicit defaults; training
/// without one of them fails with [`RegressionError::Configuration`].
///
/// # Examples
///
/// ```rust
/// use tabular_lm::{Family, GlmConfig, GlmTrainer, Model, Table, Trainer};
/// use tabular_lm::linear_model::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
/// use ndarray::array;
///
/// let x = Table::from_rows(&[vec![0.0], vec![1.0], vec![2.0], vec![3.0]]).unwrap();
/// let y = array![0.2, 0.4, 0.6, 0.8];
///
/// let config = GlmConfig::new(Family::Binomial, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE);
/// let (model, _) = GlmTrainer::with_config(config).train(x, &y).unwrap();
/// let p = model.predict(&[1.5]).unwrap();
/// assert!(p > 0.0 && p < 1.0);
/// ```
#[derive(Clone, Debug)]
pub struct GlmTrainer {
    family: Option<Family>,
    max_iterations: Option<usize>,
    tolerance: Option<f64>,
    fit_intercept: bool,
}

impl GlmTrainer {
    pub fn new() -> Self {
        Self {
            family: None,
            max_iterations: None,
            tolerance: None,
            fit_intercept: true,
        }
    }

    pub fn with_config(config: GlmConfig) -> Self {
        Self::new()
            .family(config.family)
            .max_iterations(config.max_iterations)
            .tolerance(config.tolerance)
    }

    pub fn family(mut self, family: Family) -> Self {
        self.family = Some(family);
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// The complete configuration, or the first missing or invalid setting.
    pub fn config(&self) -> Result<GlmConfig> {
        let family = self
            .family
            .ok_or_else(|| RegressionError::Configuration("family is not set".into()))?;
        let max_iterations = match self.max_iterations {
            None => {
                return Err(RegressionError::Configuration(
                    "max_iterations is not set".into(),
                ));
            }
            Some(0) => {
                return Err(RegressionError::Configuration(
                    "max_iterations must be at least 1".into(),
                ));
            }
            Some(m) => m,
        };
        let tolerance = match self.tolerance {
            None => {
                return Err(RegressionError::Configuration("tolerance is not set".into()));
            }
            Some(t) if !t.is_finite() || t <= 0.0 => {
                return Err(RegressionError::Configuration(format!(
                    "tolerance must be finite and positive, got {}",
                    t
                )));
            }
            Some(t) => t,
        };
        Ok(GlmConfig::new(family, max_iterations, tolerance))
    }
}

impl Default for GlmTrainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Trainer for GlmTrainer {
    type Model = GlmModel;

    fn train(&self, table: Table, response: &Vector) -> Result<(GlmModel, Summary)> {
        let config = self.config()?;
        let family = config.family;
        check_response(&table, response)?;
        for &y in response {
            family.check_response(y)?;
        }

        let design = if self.fit_intercept {
            add_intercept(table)?
        } else {
            table
        };
        check_design(&design)?;
        let x = design.data();

        let mut eta = response.mapv(|y| family.link(family.initial_mean(y)));
        let mut betas: Option<Vector> = None;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < config.max_iterations {
            iterations += 1;

            let mu = eta.mapv(|e| family.inverse_link(e));
            let d = eta.mapv(|e| family.derivative(e));
            let w = ndarray::Zip::from(&d)
                .and(&mu)
                .map_collect(|&d, &m| d * d / family.variance(m));
            let z = ndarray::Zip::from(&eta)
                .and(response)
                .and(&mu)
                .and(&d)
                .map_collect(|&e, &y, &m, &d| e + (y - m) / d);

            if let Some(i) = (0..w.len()).find(|&i| !w[i].is_finite() || !z[i].is_finite()) {
                return Err(RegressionError::Domain(format!(
                    "IRLS weight for observation {} is not finite at iteration {}",
                    i, iterations
                )));
            }

            // XᵗWX and XᵗWz without forming the n x n weight matrix
            let xw = &x * &w.view().insert_axis(Axis(1));
            let xtwx = x.t().dot(&xw);
            let xtwz = xw.t().dot(&z);
            let next = solve(xtwx.view(), xtwz.view())?;

            let step = betas.as_ref().map(|old| {
                let diff = &next - old;
                diff.dot(&diff).sqrt()
            });
            eta = x.dot(&next);
            betas = Some(next);

            debug!(
                "irls iteration {}: step {}",
                iterations,
                step.map_or_else(|| "n/a".to_string(), |s| format!("{:.3e}", s))
            );

            if step.is_some_and(|s| s <= config.tolerance) {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                "irls stopped after {} iterations without reaching tolerance {}",
                iterations, config.tolerance
            );
        }

        let betas = betas.ok_or_else(|| {
            RegressionError::Configuration("max_iterations must be at least 1".into())
        })?;
        let fitted = eta.mapv(|e| family.inverse_link(e));
        let residuals = response - &fitted;

        let model = GlmModel {
            linear: LinearModel::new(betas.clone(), self.fit_intercept),
            family,
            iterations,
            converged,
        };
        let summary = Summary::new(
            design,
            response.clone(),
            betas,
            fitted,
            residuals,
            self.fit_intercept,
        );
        Ok((model, summary))
    }
}

/// A fitted GLM. Predictions are on the response scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlmModel {
    linear: LinearModel,
    family: Family,
    iterations: usize,
    converged: bool,
}

impl GlmModel {
    pub fn family(&self) -> Family {
        self.family
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Linear predictor `η` for a row.
    pub fn predict_link(&self, row: &[f64]) -> Result<f64> {
        self.linear.predict(row)
    }
}

impl Model for GlmModel {
    fn coefficients(&self) -> &Vector {
        self.linear.coefficients()
    }

    fn predict(&self, row: &[f64]) -> Result<f64> {
        Ok(self.family.inverse_link(self.linear.predict(row)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{assert_close, stackloss};
    use crate::linear_model::OlsTrainer;
    use ndarray::array;

    fn line(n: usize) -> Table {
        let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64]).collect();
        Table::from_rows(&rows).unwrap()
    }

    fn trainer(family: Family) -> GlmTrainer {
        GlmTrainer::new()
            .family(family)
            .max_iterations(100)
            .tolerance(1e-10)
    }

    #[test]
    fn test_gaussian_family_matches_ols() {
        let (table, y) = stackloss();
        let (ols, _) = OlsTrainer::new().train(table.clone(), &y).unwrap();
        let (glm, summary) = GlmTrainer::new()
            .family(Family::Gaussian)
            .max_iterations(10)
            .tolerance(1e-6)
            .train(table, &y)
            .unwrap();

        // the first step already lands on the least squares solution
        assert!(glm.converged());
        assert_eq!(glm.iterations(), 2);
        for (a, b) in ols.coefficients().iter().zip(glm.coefficients()) {
            assert_close(*b, *a, 1e-6);
        }
        assert_close(summary.residual_sum_of_squares(), 178.82996, 1e-4);
    }

    #[test]
    fn test_poisson_recovers_coefficients() {
        let table = line(10);
        let y: Vector = (0..10).map(|i| (0.5 + 0.3 * i as f64).exp()).collect();

        let (model, summary) = trainer(Family::Poisson).train(table, &y).unwrap();

        assert!(model.converged());
        assert_close(model.coefficients()[0], 0.5, 1e-6);
        assert_close(model.coefficients()[1], 0.3, 1e-6);
        assert_close(model.predict(&[2.0]).unwrap(), 1.1_f64.exp(), 1e-5);
        assert_close(model.predict_link(&[2.0]).unwrap(), 1.1, 1e-6);
        assert!(summary.residuals().iter().all(|e| e.abs() < 1e-5));
    }

    #[test]
    fn test_binomial_recovers_coefficients() {
        let table = line(8);
        let y: Vector = (0..8)
            .map(|i| 1.0 / (1.0 + (1.0 - 0.8 * i as f64).exp()))
            .collect();

        let (model, _) = trainer(Family::Binomial).train(table, &y).unwrap();

        assert!(model.converged());
        assert_close(model.coefficients()[0], -1.0, 1e-6);
        assert_close(model.coefficients()[1], 0.8, 1e-6);
    }

    #[test]
    fn test_gamma_recovers_coefficients() {
        let table = line(8);
        let y: Vector = (0..8).map(|i| 1.0 / (0.5 + 0.2 * i as f64)).collect();

        let (model, _) = trainer(Family::Gamma).train(table, &y).unwrap();

        assert!(model.converged());
        assert_close(model.coefficients()[0], 0.5, 1e-8);
        assert_close(model.coefficients()[1], 0.2, 1e-8);
    }

    #[test]
    fn test_inverse_gaussian_recovers_coefficients() {
        let table = line(8);
        let y: Vector = (0..8).map(|i| 1.0 / (1.0 + 0.5 * i as f64).sqrt()).collect();

        let (model, _) = trainer(Family::InverseGaussian).train(table, &y).unwrap();

        assert!(model.converged());
        assert_close(model.coefficients()[0], 1.0, 1e-8);
        assert_close(model.coefficients()[1], 0.5, 1e-8);
    }

    #[test]
    fn test_family_derivatives() {
        let h = 1e-6;
        for family in [
            Family::Gaussian,
            Family::Binomial,
            Family::Poisson,
            Family::Gamma,
            Family::InverseGaussian,
        ] {
            let eta = 0.7;
            let numeric =
                (family.inverse_link(eta + h) - family.inverse_link(eta - h)) / (2.0 * h);
            assert_close(family.derivative(eta), numeric, 1e-6);
            assert_close(family.link(family.inverse_link(eta)), eta, 1e-12);
        }
    }

    #[test]
    fn test_missing_configuration() {
        let y = array![1.0, 2.0, 3.0];
        let cases = [
            GlmTrainer::new().max_iterations(10).tolerance(1e-6),
            GlmTrainer::new().family(Family::Poisson).tolerance(1e-6),
            GlmTrainer::new().family(Family::Poisson).max_iterations(10),
            GlmTrainer::new()
                .family(Family::Poisson)
                .max_iterations(0)
                .tolerance(1e-6),
            GlmTrainer::new()
                .family(Family::Poisson)
                .max_iterations(10)
                .tolerance(-1.0),
        ];
        for trainer in cases {
            let result = trainer.train(line(3), &y);
            assert!(matches!(result, Err(RegressionError::Configuration(_))));
        }
    }

    #[test]
    fn test_response_outside_family_support() {
        let poisson = trainer(Family::Poisson).train(line(3), &array![1.0, -1.0, 2.0]);
        assert!(matches!(poisson, Err(RegressionError::Domain(_))));

        let binomial = trainer(Family::Binomial).train(line(3), &array![0.0, 2.0, 1.0]);
        assert!(matches!(binomial, Err(RegressionError::Domain(_))));

        let gamma = trainer(Family::Gamma).train(line(3), &array![1.0, 0.0, 2.0]);
        assert!(matches!(gamma, Err(RegressionError::Domain(_))));
    }

    #[test]
    fn test_iteration_bound_reached() {
        let y = array![1.0, 0.0, 3.0, 2.0, 6.0, 4.0];
        let (model, _) = GlmTrainer::new()
            .family(Family::Poisson)
            .max_iterations(1)
            .tolerance(1e-12)
            .train(line(6), &y)
            .unwrap();
        assert_eq!(model.iterations(), 1);
        assert!(!model.converged());
    }

    #[test]
    fn test_linear_predictor_leaving_link_domain() {
        // the first weighted fit extrapolates η below zero at the last row,
        // where 1/√η is undefined
        let y = array![2.0, 3.0, 10.0, 10.0, 0.5];
        let result = trainer(Family::InverseGaussian).train(line(5), &y);

        match result {
            Err(RegressionError::Domain(msg)) => {
                assert!(msg.contains("observation 4"), "{}", msg);
                assert!(msg.contains("iteration 2"), "{}", msg);
            }
            other => panic!("expected a domain error, got {:?}", other),
        }
    }

    #[test]
    fn test_collinear_design_is_singular() {
        let table = Table::from_rows(&[
            vec![1.0, 2.0],
            vec![2.0, 4.0],
            vec![3.0, 6.0],
            vec![4.0, 8.0],
        ])
        .unwrap();
        let y = array![1.0, 2.0, 2.0, 5.0];
        let result = trainer(Family::Poisson).train(table, &y);
        assert!(matches!(result, Err(RegressionError::SingularMatrix(_))));
    }

    #[test]
    fn test_with_config() {
        let config = GlmConfig::new(Family::Gamma, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE);
        let trainer = GlmTrainer::with_config(config);
        assert_eq!(trainer.config().unwrap(), config);
    }
}
