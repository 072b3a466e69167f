use thiserror::Error;

/// Everything that can go wrong while building tables, fitting models or
/// computing diagnostics.
#[derive(Debug, Error)]
pub enum RegressionError {
    /// Length or index does not match the shape it is applied to.
    #[error("dimension error: {0}")]
    Dimension(String),

    /// A column label was never registered, or labels are not unique.
    #[error("label error: {0}")]
    Label(String),

    /// A factor needed for a solve or an inverse is not invertible.
    #[error("singular matrix: {0}")]
    SingularMatrix(String),

    /// A trainer is missing a required setting or has an invalid one.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A value fell outside the domain a computation is defined on.
    #[error("domain error: {0}")]
    Domain(String),

    #[error("distribution error: {0}")]
    Distribution(String),
}

pub type Result<T> = std::result::Result<T, RegressionError>;

impl RegressionError {
    pub(crate) fn dimension(msg: impl Into<String>) -> Self {
        Self::Dimension(msg.into())
    }

    pub(crate) fn singular(msg: impl Into<String>) -> Self {
        Self::SingularMatrix(msg.into())
    }
}
