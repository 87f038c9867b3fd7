//! L2-regularized linear regression.
//!
//! This module provides:
//! - `predict`: the linear hypothesis `X . theta`, accepting row or column weights
//! - `cost` and `gradient`: the regularized squared-error objective and its
//!   analytic derivative (the bias weight `theta[0]` is never penalized)
//! - `fit`: zero-initialized nonlinear conjugate gradient over that objective
//! - `RegularizedLinearRegression`: the same training wrapped in a model type
//!
//! # Examples
//!
//! ## Objective and gradient
//! ```rust
//! use reglin::{cost, gradient};
//! use ndarray::array;
//!
//! let x = array![[1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
//! let y = array![1.0, 2.0, 2.0];
//! let theta = array![0.5, 0.5];
//!
//! let j = cost(&theta, &x, &y, 1.0).unwrap();
//! let grad = gradient(&theta, &x, &y, 1.0).unwrap();
//! assert!(j > 0.0);
//! assert_eq!(grad.len(), 2);
//! ```
//!
//! ## Training
//! ```rust
//! use reglin::RegularizedLinearRegression;
//! use reglin::preprocessing::add_bias_column;
//! use ndarray::array;
//!
//! let x = add_bias_column(&array![[1.0], [2.0], [3.0], [4.0]]);
//! let y = array![2.0, 4.0, 6.0, 8.0];
//!
//! let mut model = RegularizedLinearRegression::new().lambda(0.1).max_iter(200);
//! model.fit(&x, &y).unwrap();
//! let predictions = model.predict(&x).unwrap();
//! println!("{:?}", model.report);
//! ```

mod convergence;
mod hypothesis;
mod objective;
mod regularized;

pub use hypothesis::{predict, Weights};
pub use objective::{cost, finite_difference_gradient, gradient, Targets};
pub use regularized::{fit, FitReport, RegularizedLinearRegression, Termination};
