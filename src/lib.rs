//! Linear-model regression over dense, labelled numeric tables.
//!
//! Fit ordinary least squares, ridge and generalized linear models to a
//! [`Table`], then inspect the fit through the functions in [`diagnostics`].
//!
//! ```rust
//! use tabular_lm::{OlsTrainer, Table, Trainer, Model, diagnostics};
//! use ndarray::array;
//!
//! let table = Table::from_rows(&[
//!     vec![1.0, 3.0],
//!     vec![2.0, 1.0],
//!     vec![3.0, 4.0],
//!     vec![4.0, 2.0],
//!     vec![5.0, 6.0],
//! ]).unwrap();
//! let y = array![3.1, 2.9, 6.2, 5.8, 9.1];
//!
//! let (model, summary) = OlsTrainer::new().train(table, &y).unwrap();
//! let prediction = model.predict(&[6.0, 3.0]).unwrap();
//! let leverage = diagnostics::leverage_points(&summary).unwrap();
//! assert_eq!(leverage.len(), 5);
//! ```

pub use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub mod decomposition;
pub mod diagnostics;
pub mod error;
#[cfg(test)]
mod fixtures;
pub mod linear_model;
pub mod metrics;
pub mod parallel;
pub mod summary;
pub mod table;

pub use error::{RegressionError, Result};
pub use linear_model::{
    Family, GlmConfig, GlmModel, GlmTrainer, LinearModel, Model, OlsTrainer, RidgeTrainer,
    Trainer,
};
pub use parallel::Parallelism;
pub use summary::{Summary, SummaryParts};
pub use table::{Margin, Table, TableParts};

pub type Vector = Array1<f64>;
pub type Matrix = Array2<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_types_work() {
        let vec = Vector::zeros(5);
        let mat = Matrix::zeros((3, 4));
        assert_eq!(vec.len(), 5);
        assert_eq!(mat.shape(), &[3, 4]);
    }
}
