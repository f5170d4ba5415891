use nalgebra::DVector;

use crate::{
    ConvexError, Result, SharedFunction, Solution,
    alg::{
        halting::{HaltingCondition, PointValue},
        kkt::{ConstrainedStep, KktSolver, UnconstrainedStep},
        line_search::BacktrackingLineSearch,
    },
    check_dims,
    constraint::LinearEqualityConstraint,
    observer::{SolverObserver, SolverStep},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewtonParams {
    epsilon: f64,
    alpha: f64,
    beta: f64,
    kkt_solver: KktSolver,
    max_iterations: usize,
}

impl Default for NewtonParams {
    fn default() -> Self {
        Self {
            epsilon: 1e-9,
            alpha: 0.25,
            beta: 0.8,
            kkt_solver: KktSolver::CholeskySchur,
            max_iterations: 10_000,
        }
    }
}

impl NewtonParams {
    /// `epsilon` is the convergence tolerance; `alpha` and `beta` tune the
    /// backtracking line search.
    pub fn new(epsilon: f64, alpha: f64, beta: f64) -> Result<Self> {
        if epsilon.is_nan() || epsilon <= 0.0 {
            return Err(ConvexError::invalid("epsilon must be > 0"));
        }
        // validates alpha and beta
        BacktrackingLineSearch::new(alpha, beta)?;

        Ok(Self {
            epsilon,
            alpha,
            beta,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn with_kkt_solver(mut self, kkt_solver: KktSolver) -> Self {
        self.kkt_solver = kkt_solver;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Result<Self> {
        if max_iterations == 0 {
            return Err(ConvexError::invalid("max_iterations must be >= 1"));
        }
        self.max_iterations = max_iterations;
        Ok(self)
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn kkt_solver(&self) -> KktSolver {
        self.kkt_solver
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    fn line_search(&self) -> Result<BacktrackingLineSearch> {
        BacktrackingLineSearch::new(self.alpha, self.beta)?.with_min_step(self.epsilon)
    }
}

/// Damped Newton's method.
///
/// Without equality constraints this is Algorithm 9.5 of Boyd & Vandenberghe,
/// *Convex Optimization*: stop once `λ²/2 ≤ ε`. With `A·x = b` it is the
/// infeasible-start variant (Algorithm 10.2), so the initial guess does not
/// need to satisfy the equalities; the loop stops once the primal-dual
/// residual drops to `ε`.
///
/// In both modes a line search that cannot find an acceptable step counts as
/// convergence, not as an error.
#[derive(Clone)]
pub struct NewtonOptimizer {
    objective: SharedFunction,
    params: NewtonParams,
    equality: Option<LinearEqualityConstraint>,
    initial_guess: Option<DVector<f64>>,
    halting: Option<HaltingCondition>,
}

impl NewtonOptimizer {
    pub fn new(objective: SharedFunction, params: NewtonParams) -> Self {
        Self {
            objective,
            params,
            equality: None,
            initial_guess: None,
            halting: None,
        }
    }

    pub fn with_equality_constraint(mut self, eq: LinearEqualityConstraint) -> Result<Self> {
        eq.validate_for(self.objective.dims())?;
        self.equality = Some(eq);
        Ok(self)
    }

    /// Defaults to the zero vector.
    pub fn with_initial_guess(mut self, x0: DVector<f64>) -> Result<Self> {
        check_dims(self.objective.dims(), &x0)?;
        self.initial_guess = Some(x0);
        Ok(self)
    }

    #[must_use]
    pub fn with_halting(mut self, halting: HaltingCondition) -> Self {
        self.halting = Some(halting);
        self
    }

    pub fn optimize(&self) -> Result<Solution> {
        self.optimize_observe(&mut ())
    }

    pub fn optimize_observe<O: SolverObserver>(&self, observer: &mut O) -> Result<Solution> {
        let x0 = self
            .initial_guess
            .clone()
            .unwrap_or_else(|| DVector::zeros(self.objective.dims()));
        let line_search = self.params.line_search()?;

        let solution = match &self.equality {
            Some(eq) if eq.num_constraints() > 0 => {
                self.solve_constrained(eq, x0, &line_search, observer)?
            }
            _ => self.solve_unconstrained(x0, &line_search, observer)?,
        };

        log::debug!(
            "newton: stopped after {} iterations at f = {:.6e}",
            solution.iterations,
            solution.cost
        );
        Ok(solution)
    }

    fn solve_unconstrained<O: SolverObserver>(
        &self,
        mut x: DVector<f64>,
        line_search: &BacktrackingLineSearch,
        observer: &mut O,
    ) -> Result<Solution> {
        let f = self.objective.as_ref();
        let eps = self.params.epsilon;

        let mut v = f.value(&x)?;
        let mut iteration = 0;

        loop {
            if iteration == self.params.max_iterations {
                log::warn!("newton: iteration limit ({iteration}) reached at f = {v:.6e}");
                break;
            }
            iteration += 1;

            let grad = f.gradient(&x)?;
            let hess = f.hessian(&x)?;
            let UnconstrainedStep {
                x_delta,
                lambda_squared,
            } = self.params.kkt_solver.solve_unconstrained(&hess, &grad)?;

            log::trace!("newton: iteration {iteration}, f = {v:.6e}, λ² = {lambda_squared:.3e}");

            if lambda_squared <= 2.0 * eps {
                break;
            }
            // a vanishing step direction also means we are at the minimum
            if x_delta.norm() < eps {
                break;
            }

            let slope = grad.dot(&x_delta);
            let Some(step) = line_search.armijo(f, &x, v, &x_delta, slope)? else {
                log::trace!("newton: no acceptable step from f = {v:.6e}");
                break;
            };

            let (x_prev, v_prev) = (std::mem::replace(&mut x, step.x), v);
            v = step.value;

            observer.on_step(SolverStep::NewtonPoint {
                point: &x,
                value: v,
                iteration,
            });
            if self.halted(iteration, &x_prev, v_prev, &x, v) {
                break;
            }
        }

        Ok(Solution {
            arg: x,
            cost: v,
            iterations: iteration,
        })
    }

    fn solve_constrained<O: SolverObserver>(
        &self,
        eq: &LinearEqualityConstraint,
        mut x: DVector<f64>,
        line_search: &BacktrackingLineSearch,
        observer: &mut O,
    ) -> Result<Solution> {
        let f = self.objective.as_ref();
        let eps = self.params.epsilon;
        let mat_a = eq.mat_a();
        let mat_at = mat_a.transpose();

        let mut nu = DVector::zeros(eq.num_constraints());
        let mut v = f.value(&x)?;
        let mut iteration = 0;

        loop {
            if iteration == self.params.max_iterations {
                log::warn!("newton: iteration limit ({iteration}) reached at f = {v:.6e}");
                break;
            }
            iteration += 1;

            let grad = f.gradient(&x)?;
            let r_norm = eq.residual_norm(&x, &nu, &grad);

            log::trace!("newton: iteration {iteration}, f = {v:.6e}, |r| = {r_norm:.3e}");

            if r_norm <= eps {
                break;
            }

            let hess = f.hessian(&x)?;
            let ConstrainedStep { x_delta, nu_plus } = self.params.kkt_solver.solve_constrained(
                &hess,
                mat_a,
                &mat_at,
                &grad,
                &eq.primal_residual(&x),
            )?;
            let nu_delta = nu_plus - &nu;

            if x_delta.norm() + nu_delta.norm() < eps {
                break;
            }

            let Some((step, nu_next)) =
                line_search.residual(f, eq, &x, &nu, &x_delta, &nu_delta, r_norm)?
            else {
                log::trace!("newton: no residual-decreasing step from |r| = {r_norm:.3e}");
                break;
            };

            let (x_prev, v_prev) = (std::mem::replace(&mut x, step.x), v);
            nu = nu_next;
            v = step.value;

            observer.on_step(SolverStep::NewtonPoint {
                point: &x,
                value: v,
                iteration,
            });
            if self.halted(iteration, &x_prev, v_prev, &x, v) {
                break;
            }
        }

        Ok(Solution {
            arg: x,
            cost: v,
            iterations: iteration,
        })
    }

    fn halted(
        &self,
        iteration: usize,
        x_prev: &DVector<f64>,
        v_prev: f64,
        x: &DVector<f64>,
        v: f64,
    ) -> bool {
        self.halting.as_ref().is_some_and(|h| {
            h.check(
                iteration,
                PointValue::new(x_prev, v_prev),
                PointValue::new(x, v),
            )
        })
    }
}
