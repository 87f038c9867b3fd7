use argmin::core::{
    Error, IterState, Problem, Solver, TerminationReason, TerminationStatus, KV,
};

/// Solver state used by the conjugate gradient run: flat parameter and
/// gradient vectors, scalar cost.
pub(crate) type CgState = IterState<Vec<f64>, Vec<f64>, (), (), (), f64>;

/// Default stopping threshold on the largest gradient component.
pub(crate) const DEFAULT_GTOL: f64 = 1e-5;

/// Wraps a gradient-based solver and stops it once every gradient component
/// of the current iterate is below `gtol` in magnitude.
pub(crate) struct GradientTolerance<S> {
    inner: S,
    gtol: f64,
}

impl<S> GradientTolerance<S> {
    pub(crate) fn new(inner: S, gtol: f64) -> Self {
        Self { inner, gtol }
    }
}

pub(crate) fn gradient_converged(grad: &[f64], gtol: f64) -> bool {
    grad.iter().all(|g| g.abs() < gtol)
}

impl<O, S> Solver<O, CgState> for GradientTolerance<S>
where
    S: Solver<O, CgState>,
{
    const NAME: &'static str = "Nonlinear Conjugate Gradient with gradient tolerance";

    fn init(
        &mut self,
        problem: &mut Problem<O>,
        state: CgState,
    ) -> Result<(CgState, Option<KV>), Error> {
        self.inner.init(problem, state)
    }

    fn next_iter(
        &mut self,
        problem: &mut Problem<O>,
        state: CgState,
    ) -> Result<(CgState, Option<KV>), Error> {
        self.inner.next_iter(problem, state)
    }

    fn terminate(&mut self, state: &CgState) -> TerminationStatus {
        match state.get_gradient() {
            Some(grad) if gradient_converged(grad, self.gtol) => {
                TerminationStatus::Terminated(TerminationReason::SolverConverged)
            }
            _ => self.inner.terminate(state),
        }
    }
}
