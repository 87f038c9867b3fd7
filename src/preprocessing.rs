use crate::error::{RegressionError, Result};
use crate::{Matrix, Vector};
use ndarray::{s, Axis};

/// Prepends a column of ones, the bias column the regularizer skips.
pub fn add_bias_column(x: &Matrix) -> Matrix {
    let mut with_bias = Matrix::ones((x.nrows(), x.ncols() + 1));
    with_bias.slice_mut(s![.., 1..]).assign(x);
    with_bias
}

/// Standardizes feature columns to zero mean and unit variance.
///
/// Scaling features before adding the bias column keeps the conjugate
/// gradient problem well conditioned.
pub struct StandardScaler {
    mean: Option<Vector>,
    std: Option<Vector>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
        }
    }

    pub fn fit(&mut self, data: &Matrix) -> Result<()> {
        let mean = data.mean_axis(Axis(0)).ok_or(RegressionError::EmptyInput)?;
        // zero-variance columns are only centered
        let std = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 1e-12 { s } else { 1.0 });

        self.mean = Some(mean);
        self.std = Some(std);
        Ok(())
    }

    pub fn transform(&self, data: &Matrix) -> Result<Matrix> {
        let (mean, std) = match (&self.mean, &self.std) {
            (Some(mean), Some(std)) => (mean, std),
            _ => return Err(RegressionError::NotFitted),
        };

        if data.ncols() != mean.len() {
            return Err(RegressionError::ShapeMismatch {
                expected: mean.len(),
                got: data.shape().to_vec(),
            });
        }

        let mut result = data.clone();
        for mut row in result.axis_iter_mut(Axis(0)) {
            row -= mean;
            row /= std;
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, data: &Matrix) -> Result<Matrix> {
        self.fit(data)?;
        self.transform(data)
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}
