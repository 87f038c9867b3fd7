use crate::error::{RegressionError, Result};
use crate::{Matrix, Vector};
use ndarray::{ArrayBase, ArrayView1, Data, Ix1, Ix2};

/// A weight vector in any of the layouts callers commonly hold it in.
///
/// Implementations normalize to the canonical column form (a `Vector` of
/// length `n_features`) so the numeric code never branches on orientation.
/// Two-dimensional weights must be shaped `m x 1` or `1 x m`.
pub trait Weights {
    fn to_column(&self, n_features: usize) -> Result<Vector>;
}

impl<S> Weights for ArrayBase<S, Ix1>
where
    S: Data<Elem = f64>,
{
    fn to_column(&self, n_features: usize) -> Result<Vector> {
        if self.len() != n_features {
            return Err(RegressionError::ShapeMismatch {
                expected: n_features,
                got: vec![self.len()],
            });
        }
        Ok(self.to_owned())
    }
}

impl<S> Weights for ArrayBase<S, Ix2>
where
    S: Data<Elem = f64>,
{
    fn to_column(&self, n_features: usize) -> Result<Vector> {
        match self.dim() {
            (rows, 1) if rows == n_features => Ok(self.column(0).to_owned()),
            (1, cols) if cols == n_features => Ok(self.row(0).to_owned()),
            _ => Err(RegressionError::ShapeMismatch {
                expected: n_features,
                got: self.shape().to_vec(),
            }),
        }
    }
}

impl Weights for [f64] {
    fn to_column(&self, n_features: usize) -> Result<Vector> {
        ArrayView1::from(self).to_column(n_features)
    }
}

impl Weights for Vec<f64> {
    fn to_column(&self, n_features: usize) -> Result<Vector> {
        self.as_slice().to_column(n_features)
    }
}

/// Evaluates the linear hypothesis `X . theta`.
///
/// `theta` may be a row or a column; both give the same predictions.
pub fn predict<W>(x: &Matrix, theta: &W) -> Result<Vector>
where
    W: Weights + ?Sized,
{
    let theta = theta.to_column(x.ncols())?;
    Ok(hypothesis(x, &theta))
}

pub(crate) fn hypothesis(x: &Matrix, theta: &Vector) -> Vector {
    x.dot(theta)
}
