//! Error type shared by every fallible operation in the crate.

/// Errors raised while evaluating or training a regularized linear model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegressionError {
    #[error("array with shape {got:?} does not align with expected length {expected}")]
    ShapeMismatch { expected: usize, got: Vec<usize> },

    #[error("X has {rows} samples but y has {targets} targets")]
    SampleMismatch { rows: usize, targets: usize },

    #[error("inputs must have the same length ({left} != {right})")]
    LengthMismatch { left: usize, right: usize },

    #[error("input must contain at least one sample and one feature")]
    EmptyInput,

    #[error("lambda must be a non-negative finite number, got {0}")]
    InvalidLambda(f64),

    #[error("model not fitted, call fit() first")]
    NotFitted,

    #[error("optimizer failed: {0}")]
    Optimizer(String),
}

pub type Result<T> = std::result::Result<T, RegressionError>;
