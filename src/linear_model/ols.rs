use log::debug;

use super::{add_intercept, check_design, check_response, LinearModel, Trainer};
use crate::decomposition::{solve_upper_triangular, Qr};
use crate::error::Result;
use crate::summary::Summary;
use crate::table::Table;
use crate::Vector;

/// Ordinary least squares through a reduced QR factorization of the design.
///
/// With `fit_intercept` (the default) a column of ones is put in front of
/// the table before factoring, so the first coefficient is the intercept.
#[derive(Clone, Debug)]
pub struct OlsTrainer {
    fit_intercept: bool,
}

impl OlsTrainer {
    pub fn new() -> Self {
        Self {
            fit_intercept: true,
        }
    }

    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }
}

impl Default for OlsTrainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Trainer for OlsTrainer {
    type Model = LinearModel;

    fn train(&self, table: Table, response: &Vector) -> Result<(LinearModel, Summary)> {
        check_response(&table, response)?;
        let design = if self.fit_intercept {
            add_intercept(table)?
        } else {
            table
        };
        check_design(&design)?;

        let qr = Qr::factorize(design.data())?;
        qr.check_full_rank()?;
        let qty = qr.qt_dot(response.view())?;
        let betas = solve_upper_triangular(qr.r(), qty.view())?;

        let fitted = qr.q().dot(&qty);
        let residuals = response - &fitted;

        debug!(
            "ols fit: {} observations, {} coefficients",
            design.rows(),
            betas.len()
        );

        let model = LinearModel::new(betas.clone(), self.fit_intercept);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegressionError;
    use crate::fixtures::{assert_close, stackloss};
    use crate::linear_model::Model;
    use ndarray::{array, Array2};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ols_stackloss() {
        let (table, y) = stackloss();
        let (model, summary) = OlsTrainer::new().train(table, &y).unwrap();

        let expected = [-39.919674, 0.715640, 1.295286, -0.152123];
        for (got, want) in model.coefficients().iter().zip(expected) {
            assert_close(*got, want, 1e-5);
        }
        assert_close(summary.residual_sum_of_squares(), 178.82996, 1e-4);
        assert_close(summary.r_squared(), 0.913577, 1e-6);
        assert_close(summary.adjusted_r_squared(), 0.898326, 1e-6);
        assert_close(summary.mean_squared_error(), 10.519410, 1e-5);
        assert_eq!(summary.parameters(), 4);
        assert_eq!(summary.data().labels().unwrap()[0], "(Intercept)");
    }

    #[test]
    fn test_ols_recovers_exact_coefficients() {
        let x = array![[1.0, 2.0], [2.0, 1.0], [3.0, 5.0], [4.0, 3.0], [5.0, 7.0]];
        let y: Vector = x.rows().into_iter().map(|r| 1.5 + 2.0 * r[0] - 0.5 * r[1]).collect();

        let (model, summary) = OlsTrainer::new()
            .train(Table::from_matrix(x), &y)
            .unwrap();

        assert_close(model.intercept().unwrap(), 1.5, 1e-9);
        assert_close(model.slopes()[0], 2.0, 1e-9);
        assert_close(model.slopes()[1], -0.5, 1e-9);
        assert!(summary.residuals().iter().all(|e| e.abs() < 1e-9));
        assert_close(model.predict(&[10.0, 4.0]).unwrap(), 19.5, 1e-9);
    }

    #[test]
    fn test_ols_without_intercept() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];

        let (model, summary) = OlsTrainer::new()
            .fit_intercept(false)
            .train(Table::from_matrix(x), &y)
            .unwrap();

        assert_eq!(model.intercept(), None);
        assert_eq!(model.coefficients().len(), 1);
        assert_close(model.coefficients()[0], 2.0, 1e-12);
        assert_eq!(summary.parameters(), 1);
        assert!(!summary.has_intercept());
    }

    #[test]
    fn test_ols_collinear_design() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0]];
        let y = array![1.0, 2.0, 3.0, 5.0];

        let result = OlsTrainer::new().train(Table::from_matrix(x), &y);
        assert!(matches!(result, Err(RegressionError::SingularMatrix(_))));
    }

    #[test]
    fn test_ols_dimension_mismatch() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0, 3.0];

        let result = OlsTrainer::new().train(Table::from_matrix(x), &y);
        assert!(matches!(result, Err(RegressionError::Dimension(_))));
    }

    #[test]
    fn test_ols_too_few_observations() {
        let x = array![[1.0, 2.0], [2.0, 1.0]];
        let y = array![1.0, 2.0];

        let result = OlsTrainer::new().train(Table::from_matrix(x), &y);
        assert!(matches!(result, Err(RegressionError::Dimension(_))));
    }

    #[test]
    fn test_ols_r_squared_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            let x = Array2::random_using((30, 3), Uniform::new(-1.0, 1.0), &mut rng);
            let noise = Vector::random_using(30, Uniform::new(-0.5, 0.5), &mut rng);
            let y = x.column(0).to_owned() * 3.0 - x.column(2).to_owned() + noise;

            let (_, summary) = OlsTrainer::new().train(Table::from_matrix(x), &y).unwrap();
            let r2 = summary.r_squared();
            assert!((0.0..=1.0).contains(&r2), "r2 out of bounds: {}", r2);
            assert!(summary.residuals().sum().abs() < 1e-9);
        }
    }
}
