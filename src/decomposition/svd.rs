use ndarray::ArrayView2;

use super::faer_ndarray::{array2_to_mat, mat_to_array2};
use crate::error::{RegressionError, Result};
use crate::{Matrix, Vector};

/// Thin singular value decomposition `A = UΣVᵗ`.
///
/// For an `n x p` matrix with `k = min(n, p)`: `U` is `n x k`, `Σ` holds `k`
/// non-negative values sorted in descending order and `V` is `p x k`.
/// Computed by faer.
#[derive(Clone, Debug)]
pub struct Svd {
    u: Matrix,
    s: Vector,
    v: Matrix,
}

impl Svd {
    pub fn factorize(a: ArrayView2<'_, f64>) -> Result<Self> {
        let (n, p) = a.dim();
        if a.iter().any(|x| !x.is_finite()) {
            return Err(RegressionError::Domain(
                "cannot decompose a matrix with non-finite entries".to_string(),
            ));
        }

        let svd = array2_to_mat(a).thin_svd().map_err(|e| {
            RegressionError::singular(format!("singular value decomposition failed: {:?}", e))
        })?;

        let k = n.min(p);
        let sigma = svd.S().column_vector();
        Ok(Self {
            u: mat_to_array2(svd.U(), n, k),
            s: (0..k).map(|i| sigma[i]).collect(),
            v: mat_to_array2(svd.V(), p, k),
        })
    }

    pub fn u(&self) -> ArrayView2<'_, f64> {
        self.u.view()
    }

    pub fn singular_values(&self) -> &Vector {
        &self.s
    }

    pub fn v(&self) -> ArrayView2<'_, f64> {
        self.v.view()
    }

    /// `σ_max / σ_min`, infinite when the smallest singular value is zero.
    pub fn condition_number(&self) -> f64 {
        match (self.s.first(), self.s.last()) {
            (Some(&max), Some(&min)) if min > 0.0 => max / min,
            _ => f64::INFINITY,
        }
    }
}
