//! Regularized linear regression trained with nonlinear conjugate gradient.
//!
//! ```rust
//! use reglin::{fit, predict};
//! use reglin::preprocessing::add_bias_column;
//! use ndarray::array;
//!
//! let x = add_bias_column(&array![[0.0], [1.0], [2.0], [3.0]]);
//! let y = array![3.0, 5.0, 7.0, 9.0];
//!
//! let theta = fit(&x, &y, 0.0).unwrap();
//! assert!((theta[0] - 3.0).abs() < 1e-3);
//! assert!((theta[1] - 2.0).abs() < 1e-3);
//!
//! let predictions = predict(&x, &theta).unwrap();
//! assert_eq!(predictions.len(), 4);
//! ```

pub use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub mod error;
pub mod linear_model;
pub mod metrics;
pub mod preprocessing;

pub use error::{RegressionError, Result};
pub use linear_model::{
    cost, finite_difference_gradient, fit, gradient, predict, FitReport,
    RegularizedLinearRegression, Targets, Termination, Weights,
};

pub type Vector = Array1<f64>;
pub type Matrix = Array2<f64>;
