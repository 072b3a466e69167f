//! Copies between ndarray views and faer matrices.

use faer::{Mat, MatRef};
use ndarray::{ArrayView1, ArrayView2};

use crate::Matrix;

pub(super) fn array2_to_mat(a: ArrayView2<'_, f64>) -> Mat<f64> {
    Mat::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

/// Single-column right-hand side.
pub(super) fn array1_to_mat(b: ArrayView1<'_, f64>) -> Mat<f64> {
    Mat::from_fn(b.len(), 1, |i, _| b[i])
}

/// The leading `rows x cols` block of `m`.
pub(super) fn mat_to_array2(m: MatRef<'_, f64>, rows: usize, cols: usize) -> Matrix {
    Matrix::from_shape_fn((rows, cols), |(i, j)| m[(i, j)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_copies_keep_layout() {
        let a = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let m = array2_to_mat(a.view());
        assert_eq!((m.nrows(), m.ncols()), (2, 3));
        assert_eq!(m[(1, 0)], 4.0);

        assert_eq!(mat_to_array2(m.as_ref(), 2, 3), a);
        assert_eq!(mat_to_array2(m.as_ref(), 1, 2), array![[1.0, 2.0]]);

        // transposed views are read through their strides
        let t = array2_to_mat(a.t());
        assert_eq!(t[(2, 1)], 6.0);

        let b = array1_to_mat(array![7.0, 8.0].view());
        assert_eq!((b.nrows(), b.ncols(), b[(1, 0)]), (2, 1, 8.0));
    }
}
