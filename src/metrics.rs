use crate::error::{RegressionError, Result};
use crate::Vector;

fn check_lengths(y_true: &Vector, y_pred: &Vector) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(RegressionError::LengthMismatch {
            left: y_true.len(),
            right: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(RegressionError::EmptyInput);
    }
    Ok(())
}

pub fn mean_squared_error(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let diff = y_true - y_pred;
    Ok(diff.dot(&diff) / diff.len() as f64)
}

pub fn mean_absolute_error(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let diff = y_true - y_pred;
    Ok(diff.mapv(f64::abs).sum() / diff.len() as f64)
}

pub fn r2_score(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let y_mean = y_true.sum() / y_true.len() as f64;
    let ss_res = (y_true - y_pred).mapv(|r| r * r).sum();
    let ss_tot = y_true.mapv(|y| (y - y_mean) * (y - y_mean)).sum();

    if ss_tot == 0.0 {
        // constant target: only an exact fit scores 1
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_res / ss_tot)
}
