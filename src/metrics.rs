use std::cmp::Ordering;

use crate::error::{RegressionError, Result};
use crate::Vector;

pub fn mean_squared_error(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    if y_true.is_empty() {
        return Err(RegressionError::dimension("no values to compare"));
    }
    let diff = y_true - y_pred;
    Ok(diff.dot(&diff) / y_true.len() as f64)
}

pub fn r2_score(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let ss_res = residual_sum_of_squares(&(y_true - y_pred));
    let ss_tot = total_sum_of_squares(y_true);

    if ss_tot == 0.0 {
        return Ok(1.0);
    }

    Ok(1.0 - ss_res / ss_tot)
}

/// `Σ(yᵢ - ȳ)²`.
pub fn total_sum_of_squares(y: &Vector) -> f64 {
    match y.mean() {
        Some(mean) => y.iter().map(|v| (v - mean) * (v - mean)).sum(),
        None => 0.0,
    }
}

/// `eᵗe`.
pub fn residual_sum_of_squares(residuals: &Vector) -> f64 {
    residuals.dot(residuals)
}

/// Sample quantile with linear interpolation between order statistics.
///
/// `q` is clamped to `[0, 1]`; returns `NaN` for an empty input.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn check_lengths(y_true: &Vector, y_pred: &Vector) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(RegressionError::dimension(format!(
            "y_true has {} values, y_pred has {}",
            y_true.len(),
            y_pred.len()
        )));
    }
    Ok(())
}
