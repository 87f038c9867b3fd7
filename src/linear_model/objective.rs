use std::cell::RefCell;

use argmin::core::{CostFunction, Error, Gradient};
use ndarray::{s, ArrayBase, ArrayView1, Data, Ix1, Ix2};

use super::hypothesis::{hypothesis, Weights};
use crate::error::{RegressionError, Result};
use crate::{Matrix, Vector};

/// L2-regularized mean squared error.
///
/// `J(theta) = 1/(2n) * |X theta - y|^2 + lambda/(2n) * |theta[1..]|^2`.
/// The bias weight `theta[0]` is never penalized.
pub fn cost<W, T>(theta: &W, x: &Matrix, y: &T, lambda: f64) -> Result<f64>
where
    W: Weights + ?Sized,
    T: Targets + ?Sized,
{
    let y = prepare_inputs(x, y, lambda)?;
    let theta = theta.to_column(x.ncols())?;
    Ok(regularized_cost(&theta, x, &y, lambda))
}

/// Analytic gradient of [`cost`] with respect to `theta`, as a flat vector.
pub fn gradient<W, T>(theta: &W, x: &Matrix, y: &T, lambda: f64) -> Result<Vector>
where
    W: Weights + ?Sized,
    T: Targets + ?Sized,
{
    let y = prepare_inputs(x, y, lambda)?;
    let theta = theta.to_column(x.ncols())?;
    Ok(regularized_gradient(&theta, x, &y, lambda))
}

/// Central-difference approximation of the gradient of [`cost`].
///
/// Each component costs two objective evaluations, so this is meant for
/// checking [`gradient`], not for training. `eps` must be positive.
pub fn finite_difference_gradient<W, T>(
    theta: &W,
    x: &Matrix,
    y: &T,
    lambda: f64,
    eps: f64,
) -> Result<Vector>
where
    W: Weights + ?Sized,
    T: Targets + ?Sized,
{
    debug_assert!(eps > 0.0, "eps must be positive, got {}", eps);
    let y = &prepare_inputs(x, y, lambda)?;
    let theta = theta.to_column(x.ncols())?;

    let mut shifted = theta.clone();
    let estimate = (0..theta.len())
        .map(|j| {
            shifted[j] = theta[j] + eps;
            let forward = regularized_cost(&shifted, x, y, lambda);
            shifted[j] = theta[j] - eps;
            let backward = regularized_cost(&shifted, x, y, lambda);
            shifted[j] = theta[j];
            (forward - backward) / (2.0 * eps)
        })
        .collect();

    Ok(estimate)
}

/// A target vector given either flat (length n) or as an `n x 1` / `1 x n`
/// array. Implementations normalize to a flat `Vector` of length `n_samples`.
pub trait Targets {
    fn to_targets(&self, n_samples: usize) -> Result<Vector>;
}

impl<S> Targets for ArrayBase<S, Ix1>
where
    S: Data<Elem = f64>,
{
    fn to_targets(&self, n_samples: usize) -> Result<Vector> {
        if self.len() != n_samples {
            return Err(RegressionError::SampleMismatch {
                rows: n_samples,
                targets: self.len(),
            });
        }
        Ok(self.to_owned())
    }
}

impl<S> Targets for ArrayBase<S, Ix2>
where
    S: Data<Elem = f64>,
{
    fn to_targets(&self, n_samples: usize) -> Result<Vector> {
        match self.dim() {
            (_, 1) => self.column(0).to_targets(n_samples),
            (1, _) => self.row(0).to_targets(n_samples),
            _ => Err(RegressionError::ShapeMismatch {
                expected: n_samples,
                got: self.shape().to_vec(),
            }),
        }
    }
}

impl Targets for [f64] {
    fn to_targets(&self, n_samples: usize) -> Result<Vector> {
        ArrayView1::from(self).to_targets(n_samples)
    }
}

impl Targets for Vec<f64> {
    fn to_targets(&self, n_samples: usize) -> Result<Vector> {
        self.as_slice().to_targets(n_samples)
    }
}

/// Validates the design matrix and lambda, and flattens the targets.
pub(crate) fn prepare_inputs<T>(x: &Matrix, y: &T, lambda: f64) -> Result<Vector>
where
    T: Targets + ?Sized,
{
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(RegressionError::EmptyInput);
    }

    let y = y.to_targets(x.nrows())?;

    if !(lambda >= 0.0 && lambda.is_finite()) {
        return Err(RegressionError::InvalidLambda(lambda));
    }

    Ok(y)
}

fn regularized_cost(theta: &Vector, x: &Matrix, y: &Vector, lambda: f64) -> f64 {
    let n_samples = x.nrows() as f64;
    let error = hypothesis(x, theta) - y;
    let penalized = theta.slice(s![1..]);

    error.dot(&error) / (2.0 * n_samples) + lambda / (2.0 * n_samples) * penalized.dot(&penalized)
}

fn regularized_gradient(theta: &Vector, x: &Matrix, y: &Vector, lambda: f64) -> Vector {
    let n_samples = x.nrows() as f64;
    let error = hypothesis(x, theta) - y;

    let mut grad = x.t().dot(&error) / n_samples;
    grad.slice_mut(s![1..])
        .scaled_add(lambda / n_samples, &theta.slice(s![1..]));
    grad
}

/// Lowest-cost point seen by the minimizer, plus evaluation counts.
#[derive(Clone, Debug, Default)]
pub(crate) struct IterateTracker {
    pub best: Option<(f64, Vec<f64>)>,
    pub cost_evaluations: u64,
    pub gradient_evaluations: u64,
}

impl IterateTracker {
    fn record(&mut self, value: f64, param: &[f64]) {
        self.cost_evaluations += 1;
        if !value.is_finite() {
            return;
        }
        match &self.best {
            Some((best, _)) if *best <= value => {}
            _ => self.best = Some((value, param.to_vec())),
        }
    }
}

/// Objective and derivative callbacks handed to the conjugate gradient solver.
///
/// Inputs are validated once by the caller; the callbacks only check the
/// parameter length.
pub(crate) struct RegularizedObjective<'a> {
    x: &'a Matrix,
    y: &'a Vector,
    lambda: f64,
    tracker: &'a RefCell<IterateTracker>,
}

impl<'a> RegularizedObjective<'a> {
    pub(crate) fn new(
        x: &'a Matrix,
        y: &'a Vector,
        lambda: f64,
        tracker: &'a RefCell<IterateTracker>,
    ) -> Self {
        Self { x, y, lambda, tracker }
    }
}

impl CostFunction for RegularizedObjective<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<Self::Output, Error> {
        let theta = param.to_column(self.x.ncols())?;
        let value = regularized_cost(&theta, self.x, self.y, self.lambda);
        self.tracker.borrow_mut().record(value, param);
        Ok(value)
    }
}

impl Gradient for RegularizedObjective<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, param: &Self::Param) -> std::result::Result<Self::Gradient, Error> {
        let theta = param.to_column(self.x.ncols())?;
        self.tracker.borrow_mut().gradient_evaluations += 1;
        Ok(regularized_gradient(&theta, self.x, self.y, self.lambda).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::array;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_problem() -> (Matrix, Vector) {
        let x = array![[1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![1.0, 2.0, 2.0];
        (x, y)
    }

    #[test]
    fn test_cost_without_regularization_is_half_mse() {
        let (x, y) = small_problem();
        let theta = array![0.5, 0.5];

        let value = cost(&theta, &x, &y, 0.0).unwrap();

        let residuals = x.dot(&theta) - &y;
        let expected = residuals.mapv(|r| r * r).sum() / (2.0 * 3.0);
        assert_eq!(value, expected);
        assert_abs_diff_eq!(value, 0.25 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cost_penalizes_only_non_bias_weights() {
        let (x, y) = small_problem();
        let theta = array![0.5, 0.5];

        let plain = cost(&theta, &x, &y, 0.0).unwrap();
        let regularized = cost(&theta, &x, &y, 1.0).unwrap();

        assert_abs_diff_eq!(regularized - plain, 1.0 / 6.0 * 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_gradient_hand_computed() {
        let (x, y) = small_problem();
        let theta = array![0.5, 0.5];

        let plain = gradient(&theta, &x, &y, 0.0).unwrap();
        assert_abs_diff_eq!(plain, array![-0.5 / 3.0, -1.0 / 3.0], epsilon = 1e-12);

        let regularized = gradient(&theta, &x, &y, 1.0).unwrap();
        assert_abs_diff_eq!(regularized, array![-0.5 / 3.0, -0.5 / 3.0], epsilon = 1e-12);
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let mut rng = StdRng::seed_from_u64(7);

        for lambda in [0.0, 0.3, 4.0] {
            let x = Matrix::random_using((25, 4), Uniform::new(-2.0, 2.0), &mut rng);
            let y = Vector::random_using(25, Uniform::new(-5.0, 5.0), &mut rng);
            let theta = Vector::random_using(4, Uniform::new(-1.0, 1.0), &mut rng);

            let analytic = gradient(&theta, &x, &y, lambda).unwrap();
            let numeric = finite_difference_gradient(&theta, &x, &y, lambda, 1e-5).unwrap();

            assert_abs_diff_eq!(analytic, numeric, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_bias_gradient_ignores_lambda() {
        let mut rng = StdRng::seed_from_u64(11);
        let x = Matrix::random_using((10, 3), Uniform::new(-1.0, 1.0), &mut rng);
        let y = Vector::random_using(10, Uniform::new(-1.0, 1.0), &mut rng);
        let theta = array![0.7, -1.2, 2.5];

        let plain = gradient(&theta, &x, &y, 0.0).unwrap();
        let heavy = gradient(&theta, &x, &y, 50.0).unwrap();

        assert_eq!(plain[0], heavy[0]);
        assert!((plain[1] - heavy[1]).abs() > 1.0);
    }

    #[test]
    fn test_varying_bias_changes_cost_like_unregularized() {
        let (x, y) = small_problem();
        let base = array![0.2, 0.9];
        let shifted = array![1.4, 0.9];

        let delta = |lambda| {
            cost(&shifted, &x, &y, lambda).unwrap() - cost(&base, &x, &y, lambda).unwrap()
        };
        let plain_delta = delta(0.0);
        let heavy_delta = delta(25.0);

        assert_relative_eq!(plain_delta, heavy_delta, epsilon = 1e-12);
    }

    #[test]
    fn test_cost_accepts_row_weights() {
        let (x, y) = small_problem();
        let row = array![[0.5, 0.5]];
        let column = array![[0.5], [0.5]];

        assert_eq!(
            cost(&row, &x, &y, 2.0).unwrap(),
            cost(&column, &x, &y, 2.0).unwrap()
        );
    }

    #[test]
    fn test_invalid_inputs() {
        let (x, y) = small_problem();
        let theta = array![0.0, 0.0];

        let short_y = array![1.0, 2.0];
        assert_eq!(
            cost(&theta, &x, &short_y, 0.0),
            Err(RegressionError::SampleMismatch { rows: 3, targets: 2 })
        );
        assert_eq!(
            gradient(&theta, &x, &y, -1.0),
            Err(RegressionError::InvalidLambda(-1.0))
        );
        assert!(matches!(
            cost(&theta, &x, &y, f64::NAN),
            Err(RegressionError::InvalidLambda(_))
        ));
        assert_eq!(
            cost(&array![0.0], &x, &y, 0.0),
            Err(RegressionError::ShapeMismatch { expected: 2, got: vec![1] })
        );

        let empty = Matrix::zeros((0, 2));
        assert_eq!(
            cost(&theta, &empty, &Vector::zeros(0), 0.0),
            Err(RegressionError::EmptyInput)
        );
    }

    #[test]
    fn test_column_targets_match_flat_targets() {
        let (x, y) = small_problem();
        let theta = array![0.5, 0.5];
        let column = y.clone().into_shape_with_order((3, 1)).unwrap();
        let row = array![[1.0, 2.0, 2.0]];

        let flat_cost = cost(&theta, &x, &y, 1.0).unwrap();
        assert_eq!(cost(&theta, &x, &column, 1.0).unwrap(), flat_cost);
        assert_eq!(cost(&theta, &x, &row, 1.0).unwrap(), flat_cost);
        assert_eq!(cost(&theta, &x, &vec![1.0, 2.0, 2.0], 1.0).unwrap(), flat_cost);

        assert_eq!(
            gradient(&theta, &x, &column, 1.0).unwrap(),
            gradient(&theta, &x, &y, 1.0).unwrap()
        );
    }

    #[test]
    fn test_targets_shape_errors() {
        let (x, _) = small_problem();
        let theta = array![0.5, 0.5];

        let short_column = array![[1.0], [2.0]];
        assert_eq!(
            cost(&theta, &x, &short_column, 0.0),
            Err(RegressionError::SampleMismatch { rows: 3, targets: 2 })
        );

        let wide = Matrix::zeros((3, 2));
        assert_eq!(
            cost(&theta, &x, &wide, 0.0),
            Err(RegressionError::ShapeMismatch { expected: 3, got: vec![3, 2] })
        );
    }

    #[test]
    fn test_objective_tracks_best_iterate() {
        let (x, y) = small_problem();
        let tracker = RefCell::new(IterateTracker::default());
        let objective = RegularizedObjective::new(&x, &y, 0.0, &tracker);

        let worse = objective.cost(&vec![5.0, 5.0]).unwrap();
        let better = objective.cost(&vec![0.5, 0.5]).unwrap();
        objective.cost(&vec![-3.0, 1.0]).unwrap();
        objective.gradient(&vec![0.5, 0.5]).unwrap();

        assert!(better < worse);
        let tracker = tracker.into_inner();
        assert_eq!(tracker.cost_evaluations, 3);
        assert_eq!(tracker.gradient_evaluations, 1);
        assert_eq!(tracker.best, Some((better, vec![0.5, 0.5])));
    }

    #[test]
    fn test_objective_rejects_wrong_parameter_length() {
        let (x, y) = small_problem();
        let tracker = RefCell::new(IterateTracker::default());
        let objective = RegularizedObjective::new(&x, &y, 0.0, &tracker);

        let err = objective.cost(&vec![1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err.downcast::<RegressionError>().unwrap(),
            RegressionError::ShapeMismatch { expected: 2, got: vec![3] }
        );
    }
}
