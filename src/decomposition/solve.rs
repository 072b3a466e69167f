use faer::linalg::solvers::{PartialPivLu, Solve};
use faer::Mat;
use ndarray::{ArrayView1, ArrayView2};

use super::faer_ndarray::{array1_to_mat, array2_to_mat, mat_to_array2};
use super::qr::Qr;
use super::RANK_TOLERANCE;
use crate::error::{RegressionError, Result};
use crate::{Matrix, Vector};

/// Solves `Ax = b`.
///
/// Square systems go through an LU factorization with partial pivoting,
/// tall systems are solved in the least-squares sense through QR.
pub fn solve(a: ArrayView2<'_, f64>, b: ArrayView1<'_, f64>) -> Result<Vector> {
    let (n, p) = a.dim();
    if b.len() != n {
        return Err(RegressionError::dimension(format!(
            "right-hand side has {} values, system has {} rows",
            b.len(),
            n
        )));
    }

    if n == p {
        let x = factor_square(a)?.solve(array1_to_mat(b).as_ref());
        Ok((0..n).map(|i| x[(i, 0)]).collect())
    } else if n > p {
        Qr::factorize(a)?.solve(b)
    } else {
        Err(RegressionError::dimension(format!(
            "underdetermined system: {} equations, {} unknowns",
            n, p
        )))
    }
}

pub fn inverse(a: ArrayView2<'_, f64>) -> Result<Matrix> {
    let (n, p) = a.dim();
    if n != p {
        return Err(RegressionError::dimension(format!(
            "cannot invert a {} x {} matrix",
            n, p
        )));
    }
    let x = factor_square(a)?.solve(Mat::<f64>::identity(n, n).as_ref());
    Ok(mat_to_array2(x.as_ref(), n, n))
}

/// Back substitution for an upper triangular `r`.
pub fn solve_upper_triangular(r: ArrayView2<'_, f64>, b: ArrayView1<'_, f64>) -> Result<Vector> {
    let n = r.nrows();
    if r.ncols() != n || b.len() != n {
        return Err(RegressionError::dimension(format!(
            "triangular system is {} x {} with {} right-hand values",
            n,
            r.ncols(),
            b.len()
        )));
    }

    let mut x = Vector::zeros(n);
    for i in (0..n).rev() {
        let pivot = r[[i, i]];
        if pivot == 0.0 || !pivot.is_finite() {
            return Err(RegressionError::singular(format!(
                "zero pivot at row {} of triangular factor",
                i
            )));
        }
        let mut acc = b[i];
        for j in (i + 1)..n {
            acc -= r[[i, j]] * x[j];
        }
        x[i] = acc / pivot;
    }
    Ok(x)
}

/// LU with partial pivoting, rejected when a pivot of `U` is negligible next
/// to the largest entry of `a`.
fn factor_square(a: ArrayView2<'_, f64>) -> Result<PartialPivLu<f64>> {
    let n = a.nrows();
    if a.iter().any(|x| !x.is_finite()) {
        return Err(RegressionError::Domain(
            "cannot factor a matrix with non-finite entries".to_string(),
        ));
    }
    let scale = a.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if scale == 0.0 && n > 0 {
        return Err(RegressionError::singular("matrix is all zeros"));
    }

    let lu = array2_to_mat(a).partial_piv_lu();
    let u = lu.U();
    if let Some(i) = (0..n).find(|&i| u[(i, i)].abs() <= RANK_TOLERANCE * scale) {
        return Err(RegressionError::singular(format!(
            "matrix is singular or nearly singular at column {}",
            i
        )));
    }
    Ok(lu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_solve_square_system() {
        let a = array![[2.0, 1.0, -1.0], [-3.0, -1.0, 2.0], [-2.0, 1.0, 2.0]];
        let b = array![8.0, -11.0, -3.0];
        let x = solve(a.view(), b.view()).unwrap();
        for (got, want) in x.iter().zip([2.0, 3.0, -1.0]) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_solve_tall_system_is_least_squares() {
        let a = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let b = array![1.0, 2.0, 2.0, 4.0];
        let x = solve(a.view(), b.view()).unwrap();
        // normal equations: [4 6; 6 14] x = [9; 18]
        assert!((x[0] - 0.9).abs() < 1e-12);
        assert!((x[1] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_solve_rejects_wide_system() {
        let a = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let b = array![1.0, 2.0];
        assert!(matches!(
            solve(a.view(), b.view()),
            Err(RegressionError::Dimension(_))
        ));
    }

    #[test]
    fn test_inverse() {
        let a = array![[4.0, 7.0], [2.0, 6.0]];
        let inv = inverse(a.view()).unwrap();
        let expected = array![[0.6, -0.7], [-0.2, 0.4]];
        for (got, want) in inv.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_inverse_of_singular_matrix() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        assert!(matches!(
            inverse(a.view()),
            Err(RegressionError::SingularMatrix(_))
        ));
    }

    #[test]
    fn test_upper_triangular_zero_pivot() {
        let r = array![[1.0, 2.0], [0.0, 0.0]];
        let b = array![1.0, 1.0];
        assert!(solve_upper_triangular(r.view(), b.view()).is_err());
    }

    #[test]
    fn test_solve_nearly_singular_square_system() {
        let a = array![[1.0, 2.0], [1.0, 2.0 + 1e-14]];
        let b = array![1.0, 1.0];
        assert!(matches!(
            solve(a.view(), b.view()),
            Err(RegressionError::SingularMatrix(_))
        ));
    }

    #[test]
    fn test_solve_rejects_non_finite_matrix() {
        let a = array![[1.0, f64::INFINITY], [0.0, 1.0]];
        let b = array![1.0, 1.0];
        assert!(matches!(
            solve(a.view(), b.view()),
            Err(RegressionError::Domain(_))
        ));
    }
}
