//! Regression diagnostics over a fitted [`Summary`].
//!
//! Every function here reads the summary and leaves it untouched. Functions
//! that need the design's QR factorization recompute it from
//! [`Summary::data`], so `p` is always the number of design columns.
//!
//! # Examples
//!
//! ```rust
//! use tabular_lm::{diagnostics, OlsTrainer, Parallelism, Table, Trainer};
//! use ndarray::array;
//!
//! let x = Table::from_rows(&[
//!     vec![1.0], vec![2.0], vec![3.0], vec![4.0], vec![5.0], vec![6.0],
//! ]).unwrap();
//! let y = array![1.1, 1.9, 3.2, 3.9, 5.1, 7.5];
//! let (_, summary) = OlsTrainer::new().train(x, &y).unwrap();
//!
//! let h = diagnostics::leverage_points(&summary).unwrap();
//! assert!((h.sum() - 2.0).abs() < 1e-10);
//!
//! let cooks = diagnostics::cooks_distance(&summary, Parallelism::default()).unwrap();
//! let worst = cooks.iter().cloned().fold(f64::MIN, f64::max);
//! assert_eq!(cooks[5], worst);
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use crate::decomposition::Qr;
use crate::error::{RegressionError, Result};
use crate::linear_model::{OlsTrainer, Trainer};
use crate::parallel::Parallelism;
use crate::summary::Summary;
use crate::{Matrix, Vector};

/// Outcome of an F test between nested models.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FTest {
    pub f: f64,
    pub p_value: f64,
    pub df_num: usize,
    pub df_den: usize,
}

fn design_qr(summary: &Summary) -> Result<Qr> {
    let qr = Qr::factorize(summary.data().data())?;
    qr.check_full_rank()?;
    Ok(qr)
}

fn residual_dof(summary: &Summary) -> Result<usize> {
    match summary.degrees_of_freedom() {
        0 => Err(RegressionError::dimension(format!(
            "{} observations leave no residual degrees of freedom for {} parameters",
            summary.observations(),
            summary.parameters()
        ))),
        df => Ok(df),
    }
}

fn distribution_error(e: impl std::fmt::Display) -> RegressionError {
    RegressionError::Distribution(e.to_string())
}

/// Diagonal of the hat matrix `H = QQᵗ`.
pub fn leverage_points(summary: &Summary) -> Result<Vector> {
    Ok(design_qr(summary)?.hat_diagonal())
}

/// Indices of the observations with `hᵢᵢ > 2p/n`.
pub fn high_leverage_points(summary: &Summary) -> Result<Vec<usize>> {
    let threshold = 2.0 * summary.parameters() as f64 / summary.observations() as f64;
    let h = leverage_points(summary)?;
    Ok(h.iter()
        .enumerate()
        .filter(|&(_, &hi)| hi > threshold)
        .map(|(i, _)| i)
        .collect())
}

/// `Dᵢ = eᵢ²/(p·MSE) · hᵢᵢ/(1 − hᵢᵢ)²`, one observation per task.
pub fn cooks_distance(summary: &Summary, parallelism: Parallelism) -> Result<Vector> {
    residual_dof(summary)?;
    let h = leverage_points(summary)?;
    let e = summary.residuals();
    let scale = summary.parameters() as f64 * summary.mean_squared_error();

    let out = parallelism.map_indexed(e.len(), |i| {
        let hi = h[i];
        e[i] * e[i] / scale * hi / ((1.0 - hi) * (1.0 - hi))
    });
    Ok(Vector::from(out))
}

/// Internally studentized residuals `eᵢ / (σ·√(1 − hᵢᵢ))`.
pub fn studentized_residuals(summary: &Summary) -> Result<Vector> {
    residual_dof(summary)?;
    let h = leverage_points(summary)?;
    let sigma = summary.sigma();
    Ok(ndarray::Zip::from(summary.residuals())
        .and(&h)
        .map_collect(|&e, &hi| e / (sigma * (1.0 - hi).sqrt())))
}

/// Leave-one-out prediction errors `eᵢ / (1 − hᵢᵢ)`.
pub fn press(summary: &Summary) -> Result<Vector> {
    let h = leverage_points(summary)?;
    Ok(ndarray::Zip::from(summary.residuals())
        .and(&h)
        .map_collect(|&e, &hi| e / (1.0 - hi)))
}

/// `1 − Σ PRESSᵢ² / TSS`.
pub fn predicted_r_squared(summary: &Summary) -> Result<f64> {
    let press = press(summary)?;
    let tss = summary.total_sum_of_squares();
    if tss == 0.0 {
        return Err(RegressionError::Domain(
            "predicted R² is undefined for a constant response".into(),
        ));
    }
    Ok(1.0 - press.dot(&press) / tss)
}

/// `MSE · (RᵗR)⁻¹`, with `R` from the design's QR factorization.
pub fn variance_covariance_matrix(summary: &Summary) -> Result<Matrix> {
    residual_dof(summary)?;
    Ok(unscaled_covariance(summary)? * summary.mean_squared_error())
}

/// `(RᵗR)⁻¹ = R⁻¹R⁻ᵗ`.
fn unscaled_covariance(summary: &Summary) -> Result<Matrix> {
    let r_inv = design_qr(summary)?.r_inverse()?;
    Ok(r_inv.dot(&r_inv.t()))
}

/// Square roots of the diagonal of the variance-covariance matrix.
pub fn standard_errors(summary: &Summary) -> Result<Vector> {
    Ok(variance_covariance_matrix(summary)?.diag().mapv(f64::sqrt))
}

/// Two-sided confidence intervals for every coefficient, one `[lower, upper]`
/// row per coefficient.
pub fn confidence_intervals(summary: &Summary, level: f64) -> Result<Matrix> {
    if !(level > 0.0 && level < 1.0) {
        return Err(RegressionError::Domain(format!(
            "confidence level must lie in (0, 1), got {}",
            level
        )));
    }
    let df = residual_dof(summary)?;
    let t = StudentsT::new(0.0, 1.0, df as f64).map_err(distribution_error)?;
    let quantile = t.inverse_cdf(0.5 + level / 2.0);

    let se = standard_errors(summary)?;
    let betas = summary.coefficients();
    let mut out = Matrix::zeros((betas.len(), 2));
    for (j, mut row) in out.rows_mut().into_iter().enumerate() {
        row[0] = betas[j] - quantile * se[j];
        row[1] = betas[j] + quantile * se[j];
    }
    Ok(out)
}

/// `1/(1 − R²ⱼ)` for every predictor column, intercept excluded.
///
/// `R²ⱼ` comes from regressing predictor `j` on the remaining predictors
/// plus an intercept. The auxiliary regressions run on scratch copies.
pub fn variance_inflation_factors(summary: &Summary) -> Result<Vector> {
    let design = summary.data();
    let first = usize::from(summary.has_intercept());
    let predictors: Vec<usize> = (first..design.cols()).collect();

    let mut out = Vec::with_capacity(predictors.len());
    for &j in &predictors {
        let target = design.get_col(j)?.to_owned();
        let others: Vec<usize> = predictors.iter().copied().filter(|&k| k != j).collect();
        let scratch = design.select_cols(&others)?;
        let (_, auxiliary) = OlsTrainer::new().train(scratch, &target)?;
        let vif = 1.0 / (1.0 - auxiliary.r_squared());
        debug!("vif for design column {}: {}", j, vif);
        out.push(vif);
    }
    Ok(Vector::from(out))
}

/// `βⱼ / (σ·√vⱼⱼ)` with `v = (RᵗR)⁻¹`.
pub fn z_scores(summary: &Summary) -> Result<Vector> {
    residual_dof(summary)?;
    let v = unscaled_covariance(summary)?;
    let sigma = summary.sigma();
    Ok(ndarray::Zip::from(summary.coefficients())
        .and(v.diag())
        .map_collect(|&b, &vjj| b / (sigma * vjj.sqrt())))
}

/// Compares the fit against the least squares fit of the design with the
/// listed columns dropped.
///
/// `F = ((RSS_reduced − RSS_full)/d1) / (RSS_full/d2)` with `d1` the number
/// of dropped columns and `d2 = n − p`.
pub fn f_test(summary: &Summary, remove: &[usize]) -> Result<FTest> {
    let p = summary.parameters();
    if remove.is_empty() {
        return Err(RegressionError::dimension("no columns to remove"));
    }
    for (k, &j) in remove.iter().enumerate() {
        if j >= p {
            return Err(RegressionError::dimension(format!(
                "column {} out of range for {} design columns",
                j, p
            )));
        }
        if remove[..k].contains(&j) {
            return Err(RegressionError::dimension(format!(
                "column {} listed twice",
                j
            )));
        }
    }
    if remove.len() >= p {
        return Err(RegressionError::dimension(
            "cannot remove every column of the design",
        ));
    }
    let df_den = residual_dof(summary)?;

    let kept: Vec<usize> = (0..p).filter(|j| !remove.contains(j)).collect();
    let reduced = summary.data().select_cols(&kept)?;
    let (_, reduced) = OlsTrainer::new()
        .fit_intercept(false)
        .train(reduced, summary.response())?;

    let rss_full = summary.residual_sum_of_squares();
    let rss_reduced = reduced.residual_sum_of_squares();
    let df_num = remove.len();
    let f = ((rss_reduced - rss_full) / df_num as f64) / (rss_full / df_den as f64);
    f_result(f, df_num, df_den)
}

/// Overall regression F statistic against the intercept-only model, or
/// against the zero model when the fit has no intercept.
pub fn f_statistic(summary: &Summary) -> Result<FTest> {
    let p = summary.parameters();
    let df_num = if summary.has_intercept() { p.saturating_sub(1) } else { p };
    if df_num == 0 {
        return Err(RegressionError::dimension(
            "the fit has no predictors to test",
        ));
    }
    let df_den = residual_dof(summary)?;

    let baseline = if summary.has_intercept() {
        summary.total_sum_of_squares()
    } else {
        summary.response().dot(summary.response())
    };
    let rss = summary.residual_sum_of_squares();
    let f = ((baseline - rss) / df_num as f64) / (rss / df_den as f64);
    f_result(f, df_num, df_den)
}

fn f_result(f: f64, df_num: usize, df_den: usize) -> Result<FTest> {
    let p_value = if f.is_infinite() {
        0.0
    } else {
        FisherSnedecor::new(df_num as f64, df_den as f64)
            .map_err(distribution_error)?
            .sf(f)
    };
    Ok(FTest {
        f,
        p_value,
        df_num,
        df_den,
    })
}

/// `Σ(eᵢ − eᵢ₋₁)² / Σeᵢ²`. No p-value is computed. `NaN` for a perfect fit.
pub fn durbin_watson(summary: &Summary) -> f64 {
    let e = summary.residuals();
    let rss = summary.residual_sum_of_squares();
    if rss == 0.0 {
        return f64::NAN;
    }
    let num: f64 = e.windows(2).into_iter().map(|w| (w[1] - w[0]).powi(2)).sum();
    num / rss
}

fn log_likelihood_term(summary: &Summary) -> (f64, f64) {
    let n = summary.observations() as f64;
    (n, n * (summary.residual_sum_of_squares() / n).ln())
}

/// `n·ln(RSS/n) + 2(p + 1)`.
pub fn aic(summary: &Summary) -> f64 {
    let (_, fit) = log_likelihood_term(summary);
    fit + 2.0 * (summary.parameters() as f64 + 1.0)
}

/// `n·ln(RSS/n) + ln(n)·(p + 1)`.
pub fn bic(summary: &Summary) -> f64 {
    let (n, fit) = log_likelihood_term(summary);
    fit + n.ln() * (summary.parameters() as f64 + 1.0)
}

/// Scaled change in the fitted value when observation `i` is left out,
/// `tᵢ·√(hᵢᵢ/(1 − hᵢᵢ))` with `tᵢ` the externally studentized residual.
pub fn dffits(summary: &Summary, parallelism: Parallelism) -> Result<Vector> {
    let df = residual_dof(summary)?;
    if df < 2 {
        return Err(RegressionError::dimension(
            "leave-one-out variance needs at least two residual degrees of freedom",
        ));
    }
    let h = leverage_points(summary)?;
    let e = summary.residuals();
    let rss = summary.residual_sum_of_squares();

    let out = parallelism.map_indexed(e.len(), |i| {
        let hi = h[i];
        let s2 = (rss - e[i] * e[i] / (1.0 - hi)) / (df - 1) as f64;
        let t = e[i] / (s2.sqrt() * (1.0 - hi).sqrt());
        t * (hi / (1.0 - hi)).sqrt()
    });
    Ok(Vector::from(out))
}
