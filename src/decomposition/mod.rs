//! Matrix factorizations and solvers used by the fitting algorithms.
//!
//! The factorizations are computed by `faer`; these wrappers copy results
//! into ndarray and report rank loss as [`RegressionError`] values.
//!
//! [`RegressionError`]: crate::error::RegressionError
//!
//! This module provides:
//! - `Qr`: reduced Householder QR, `A = QR` with `Q` orthonormal
//! - `Svd`: thin singular value decomposition, `A = UΣVᵗ`, `Σ` descending
//! - `solve` / `inverse`: dense solves that report singular systems as errors
//!
//! # Examples
//!
//! ```rust
//! use tabular_lm::decomposition::{Qr, Svd, solve};
//! use ndarray::array;
//!
//! let a = array![[1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
//! let b = array![1.0, 2.0, 3.0];
//!
//! let qr = Qr::factorize(a.view()).unwrap();
//! let x = qr.solve(b.view()).unwrap();
//! assert!((x[1] - 1.0).abs() < 1e-12);
//!
//! let svd = Svd::factorize(a.view()).unwrap();
//! assert!(svd.singular_values()[0] >= svd.singular_values()[1]);
//!
//! let same = solve(a.view(), b.view()).unwrap();
//! assert!((same[0] - x[0]).abs() < 1e-12);
//! ```

mod faer_ndarray;
mod qr;
mod solve;
mod svd;

pub use qr::Qr;
pub use solve::{inverse, solve, solve_upper_triangular};
pub use svd::Svd;

/// Pivots and `R` diagonals at or below this fraction of the largest one
/// are treated as zero.
pub const RANK_TOLERANCE: f64 = 1e-10;
