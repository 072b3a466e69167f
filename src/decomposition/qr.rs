use faer::linalg::solvers::Qr as FaerQr;
use ndarray::{ArrayView1, ArrayView2};

use super::faer_ndarray::{array2_to_mat, mat_to_array2};
use super::solve::solve_upper_triangular;
use super::RANK_TOLERANCE;
use crate::error::{RegressionError, Result};
use crate::{Matrix, Vector};

/// Reduced QR factorization `A = QR` of an `n x p` matrix with `n >= p`.
///
/// `Q` is `n x p` with orthonormal columns and `R` is `p x p` upper
/// triangular. The Householder factorization itself is faer's.
#[derive(Clone, Debug)]
pub struct Qr {
    q: Matrix,
    r: Matrix,
}

impl Qr {
    pub fn factorize(a: ArrayView2<'_, f64>) -> Result<Self> {
        let (n, p) = a.dim();
        if n < p {
            return Err(RegressionError::dimension(format!(
                "QR needs at least as many rows as columns, got {} x {}",
                n, p
            )));
        }

        let qr = FaerQr::new(array2_to_mat(a).as_ref());
        let q = mat_to_array2(qr.compute_Q().as_ref(), n, p);
        let r_factor = qr.R();
        let r = Matrix::from_shape_fn((p, p), |(i, j)| if j >= i { r_factor[(i, j)] } else { 0.0 });

        Ok(Self { q, r })
    }

    pub fn q(&self) -> ArrayView2<'_, f64> {
        self.q.view()
    }

    pub fn r(&self) -> ArrayView2<'_, f64> {
        self.r.view()
    }

    /// Fails with `SingularMatrix` when a diagonal entry of `R` is negligible
    /// next to the largest one.
    pub fn check_full_rank(&self) -> Result<()> {
        let diag: Vec<f64> = self.r.diag().iter().map(|d| d.abs()).collect();
        let largest = diag.iter().copied().fold(0.0, f64::max);

        if let Some(j) = diag
            .iter()
            .position(|&d| !d.is_finite() || d <= RANK_TOLERANCE * largest)
        {
            return Err(RegressionError::singular(format!(
                "design is rank deficient at column {}",
                j
            )));
        }
        Ok(())
    }

    /// `Qᵗb`.
    pub fn qt_dot(&self, b: ArrayView1<'_, f64>) -> Result<Vector> {
        if b.len() != self.q.nrows() {
            return Err(RegressionError::dimension(format!(
                "right-hand side has {} values, expected {}",
                b.len(),
                self.q.nrows()
            )));
        }
        Ok(self.q.t().dot(&b))
    }

    /// Least-squares solution of `Ax = b` through `Rx = Qᵗb`.
    pub fn solve(&self, b: ArrayView1<'_, f64>) -> Result<Vector> {
        self.check_full_rank()?;
        let qtb = self.qt_dot(b)?;
        solve_upper_triangular(self.r.view(), qtb.view())
    }

    /// `R⁻¹`, column by column through back substitution.
    pub fn r_inverse(&self) -> Result<Matrix> {
        self.check_full_rank()?;
        let p = self.r.ncols();
        let mut inv = Matrix::zeros((p, p));
        let mut e = Vector::zeros(p);
        for j in 0..p {
            e.fill(0.0);
            e[j] = 1.0;
            let col = solve_upper_triangular(self.r.view(), e.view())?;
            inv.column_mut(j).assign(&col);
        }
        Ok(inv)
    }

    /// Diagonal of `QQᵗ`, i.e. the squared norm of every row of `Q`.
    pub fn hat_diagonal(&self) -> Vector {
        self.q.rows().into_iter().map(|row| row.dot(&row)).collect()
    }
}
