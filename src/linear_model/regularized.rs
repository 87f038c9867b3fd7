use std::cell::RefCell;

use argmin::core::{Executor, State, TerminationReason, TerminationStatus};
use argmin::solver::conjugategradient::beta::PolakRibiere;
use argmin::solver::conjugategradient::NonlinearConjugateGradient;
use argmin::solver::linesearch::MoreThuenteLineSearch;

use super::convergence::{gradient_converged, GradientTolerance, DEFAULT_GTOL};
use super::hypothesis::hypothesis;
use super::objective::{self, prepare_inputs, IterateTracker, RegularizedObjective, Targets};
use crate::error::{RegressionError, Result};
use crate::{Matrix, Vector};

const DEFAULT_MAX_ITER: u64 = 200;

/// Fits L2-regularized linear regression weights with nonlinear conjugate
/// gradient, starting from zero weights. Training stops once every gradient
/// component is below 1e-5, or after 200 iterations.
///
/// `x` is expected to carry its bias column (usually ones) in column 0; that
/// weight is not regularized. `y` may be flat or an `n x 1` column. Reaching
/// the iteration cap is not an error: the best iterate found so far is
/// returned.
pub fn fit<T>(x: &Matrix, y: &T, lambda: f64) -> Result<Vector>
where
    T: Targets + ?Sized,
{
    // Assigned directly so an invalid lambda surfaces from `fit` as an error.
    let mut model = RegularizedLinearRegression::new();
    model.lambda = lambda;
    model.fit(x, y)?;

    model.coefficients.ok_or(RegressionError::NotFitted)
}

/// Why the minimizer stopped.
#[derive(Clone, Debug, PartialEq)]
pub enum Termination {
    /// The iteration cap was hit before the gradient tolerance was met.
    MaxIterations,
    /// The gradient fell below the tolerance.
    Converged,
    /// The line search could make no further progress away from a stationary
    /// point; the best evaluated iterate was kept.
    Stalled(String),
    /// The solver stopped for another reason (timeout, interrupt, solver exit).
    Stopped(String),
}

/// Summary of a single training run.
#[derive(Clone, Debug, PartialEq)]
pub struct FitReport {
    /// Iterations reported by the solver; `None` when the line search failed
    /// before the solver could report its state.
    pub iterations: Option<u64>,
    pub cost: f64,
    pub cost_evaluations: u64,
    pub gradient_evaluations: u64,
    pub termination: Termination,
}

/// Linear regression with an L2 penalty on every weight except the bias,
/// trained by minimizing [`cost`](super::cost) with nonlinear conjugate
/// gradient (Polak-Ribiere update, More-Thuente line search).
///
/// ```rust
/// use reglin::RegularizedLinearRegression;
/// use reglin::preprocessing::add_bias_column;
/// use ndarray::array;
///
/// let x = add_bias_column(&array![[1.0], [2.0], [3.0], [4.0]]);
/// let y = array![2.1, 3.9, 6.1, 7.9];
///
/// let mut model = RegularizedLinearRegression::new().lambda(0.5);
/// model.fit(&x, &y).unwrap();
///
/// assert!(model.score(&x, &y).unwrap() > 0.9);
/// ```
#[derive(Clone, Debug)]
pub struct RegularizedLinearRegression {
    pub coefficients: Option<Vector>,
    pub report: Option<FitReport>,
    lambda: f64,
    max_iter: u64,
    restart_iters: u64,
    restart_orthogonality: f64,
    gtol: f64,
    c1: f64,
    c2: f64,
}

impl RegularizedLinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            report: None,
            lambda: 0.0,
            max_iter: DEFAULT_MAX_ITER,
            restart_iters: 10,
            restart_orthogonality: 0.1,
            gtol: DEFAULT_GTOL,
            c1: 1e-4,
            c2: 0.1,
        }
    }

    pub fn lambda(mut self, lambda: f64) -> Self {
        if !(lambda >= 0.0 && lambda.is_finite()) {
            panic!("lambda must be non-negative and finite, got {}", lambda);
        }
        self.lambda = lambda;
        self
    }

    pub fn max_iter(mut self, max_iter: u64) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Resets the search direction to steepest descent every `iters` iterations.
    pub fn restart_iters(mut self, iters: u64) -> Self {
        self.restart_iters = iters;
        self
    }

    /// Resets the search direction when successive gradients lose orthogonality
    /// beyond this ratio.
    pub fn restart_orthogonality(mut self, ratio: f64) -> Self {
        self.restart_orthogonality = ratio;
        self
    }

    /// Stops training once every gradient component is below `gtol` in magnitude.
    pub fn gtol(mut self, gtol: f64) -> Self {
        if !(gtol >= 0.0) {
            panic!("gtol must be non-negative, got {}", gtol);
        }
        self.gtol = gtol;
        self
    }

    /// Strong Wolfe constants for the line search, `0 < c1 < c2 < 1`.
    pub fn line_search_c(mut self, c1: f64, c2: f64) -> Self {
        if !(0.0 < c1 && c1 < c2 && c2 < 1.0) {
            panic!("line search constants must satisfy 0 < c1 < c2 < 1, got {} and {}", c1, c2);
        }
        self.c1 = c1;
        self.c2 = c2;
        self
    }

    pub fn fit<T>(&mut self, x: &Matrix, y: &T) -> Result<()>
    where
        T: Targets + ?Sized,
    {
        let y = prepare_inputs(x, y, self.lambda)?;

        log::debug!(
            "fitting {} samples x {} features, lambda={}, max_iter={}",
            x.nrows(),
            x.ncols(),
            self.lambda,
            self.max_iter
        );

        let (coefficients, report) = self.minimize(x, &y)?;

        log::debug!(
            "fit finished after {:?} iterations, cost={:e}, termination={:?}",
            report.iterations,
            report.cost,
            report.termination
        );

        self.coefficients = Some(coefficients);
        self.report = Some(report);
        Ok(())
    }

    pub fn predict(&self, x: &Matrix) -> Result<Vector> {
        let coeffs = self.coefficients.as_ref().ok_or(RegressionError::NotFitted)?;

        if x.ncols() != coeffs.len() {
            return Err(RegressionError::ShapeMismatch {
                expected: x.ncols(),
                got: vec![coeffs.len()],
            });
        }

        Ok(hypothesis(x, coeffs))
    }

    pub fn score<T>(&self, x: &Matrix, y: &T) -> Result<f64>
    where
        T: Targets + ?Sized,
    {
        let y_pred = self.predict(x)?;
        let y = y.to_targets(x.nrows())?;
        crate::metrics::r2_score(&y, &y_pred)
    }

    /// Regularized cost of the fitted weights on `(x, y)`.
    pub fn cost<T>(&self, x: &Matrix, y: &T) -> Result<f64>
    where
        T: Targets + ?Sized,
    {
        let coeffs = self.coefficients.as_ref().ok_or(RegressionError::NotFitted)?;
        objective::cost(coeffs, x, y, self.lambda)
    }

    fn minimize(&self, x: &Matrix, y: &Vector) -> Result<(Vector, FitReport)> {
        let tracker = RefCell::new(IterateTracker::default());
        let problem = RegularizedObjective::new(x, y, self.lambda, &tracker);
        let initial = vec![0.0; x.ncols()];

        let linesearch = MoreThuenteLineSearch::new()
            .with_c(self.c1, self.c2)
            .map_err(|err| RegressionError::Optimizer(err.to_string()))?;
        let cg = NonlinearConjugateGradient::new(linesearch, PolakRibiere::new())
            .restart_iters(self.restart_iters)
            .restart_orthogonality(self.restart_orthogonality);
        let solver = GradientTolerance::new(cg, self.gtol);

        let outcome = Executor::new(problem, solver)
            .configure(|state| state.param(initial).max_iters(self.max_iter))
            .run();

        let (iterations, termination, failure) = match outcome {
            Ok(result) => {
                let state = result.state();
                let termination = match state.get_termination_status() {
                    TerminationStatus::Terminated(reason) => termination_from(reason),
                    TerminationStatus::NotTerminated => {
                        Termination::Stopped("solver returned without terminating".to_string())
                    }
                };
                (Some(state.get_iter()), termination, None)
            }
            Err(err) => match err.downcast::<RegressionError>() {
                Ok(err) => return Err(err),
                Err(err) => (None, Termination::Stalled(err.to_string()), Some(err)),
            },
        };

        let tracker = tracker.into_inner();
        let (cost, param) = tracker.best.ok_or_else(|| {
            let reason = failure.map_or_else(
                || "no iterate was evaluated".to_string(),
                |err| err.to_string(),
            );
            RegressionError::Optimizer(reason)
        })?;

        // A line search that fails at a stationary point has nothing left to do.
        let termination = match termination {
            Termination::Stalled(reason) => {
                let grad = objective::gradient(&param, x, y, self.lambda)?;
                if gradient_converged(&grad.to_vec(), self.gtol) {
                    Termination::Converged
                } else {
                    log::warn!(
                        "line search stalled ({}), keeping best iterate with cost {:e}",
                        reason,
                        cost
                    );
                    Termination::Stalled(reason)
                }
            }
            other => other,
        };

        let report = FitReport {
            iterations,
            cost,
            cost_evaluations: tracker.cost_evaluations,
            gradient_evaluations: tracker.gradient_evaluations,
            termination,
        };
        Ok((Vector::from(param), report))
    }
}

fn termination_from(reason: &TerminationReason) -> Termination {
    match reason {
        TerminationReason::MaxItersReached => Termination::MaxIterations,
        TerminationReason::SolverConverged | TerminationReason::TargetCostReached => {
            Termination::Converged
        }
        TerminationReason::SolverExit(reason) => Termination::Stopped(reason.clone()),
        other => Termination::Stopped(format!("{:?}", other)),
    }
}

impl Default for RegularizedLinearRegression {
    fn default() -> Self {
        Self::new()
    }
}
