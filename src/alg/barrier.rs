use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

use crate::{
    ConvexError, Result, SharedFunction, Solution,
    alg::{
        halting::{HaltingCondition, PointValue},
        newton::{NewtonOptimizer, NewtonParams},
    },
    check_dims,
    constraint::{LinearEqualityConstraint, linear_inequality_constraints},
    function::LogBarrierFunction,
    max_constraint,
    observer::{SolverObserver, SolverStep},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarrierParams {
    t0: f64,
    mu: f64,
    epsilon: f64,
    newton: NewtonParams,
}

impl Default for BarrierParams {
    fn default() -> Self {
        Self {
            t0: 1.0,
            mu: 15.0,
            epsilon: 1e-10,
            newton: NewtonParams::default(),
        }
    }
}

impl BarrierParams {
    /// `t0` is the initial barrier weight, `mu` its growth factor per round,
    /// and `epsilon` the target duality gap `m/t`.
    pub fn new(t0: f64, mu: f64, epsilon: f64, newton: NewtonParams) -> Result<Self> {
        if t0.is_nan() || t0 <= 0.0 {
            return Err(ConvexError::invalid("t0 must be > 0"));
        }
        if mu.is_nan() || mu <= 1.0 {
            return Err(ConvexError::invalid("mu must be > 1"));
        }
        if epsilon.is_nan() || epsilon <= 0.0 {
            return Err(ConvexError::invalid("epsilon must be > 0"));
        }

        Ok(Self {
            t0,
            mu,
            epsilon,
            newton,
        })
    }

    pub fn t0(&self) -> f64 {
        self.t0
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn newton(&self) -> &NewtonParams {
        &self.newton
    }
}

/// Log-barrier interior-point method for `min f0(x)` subject to
/// `f_k(x) < 0` and, optionally, `A·x = b`.
///
/// Each round minimizes `t·f0(x) − Σ log(−f_k(x))` with Newton's method,
/// warm-started from the previous round, then multiplies `t` by `mu`. The
/// rounds stop once the duality gap `m/t` is within `epsilon`.
///
/// The initial guess must be strictly feasible for the inequalities; see
/// [`FeasiblePointSolver`](crate::alg::feasible::FeasiblePointSolver).
#[derive(Clone)]
pub struct BarrierOptimizer {
    objective: SharedFunction,
    params: BarrierParams,
    constraints: Vec<SharedFunction>,
    equality: Option<LinearEqualityConstraint>,
    initial_guess: Option<DVector<f64>>,
    halting: Option<HaltingCondition>,
    inner_halting: Option<HaltingCondition>,
}

impl BarrierOptimizer {
    pub fn new(objective: SharedFunction, params: BarrierParams) -> Self {
        Self {
            objective,
            params,
            constraints: Vec::new(),
            equality: None,
            initial_guess: None,
            halting: None,
            inner_halting: None,
        }
    }

    /// Adds convex constraints `f_k(x) < 0`.
    pub fn with_inequality_constraints(
        mut self,
        constraints: impl IntoIterator<Item = SharedFunction>,
    ) -> Result<Self> {
        let n = self.objective.dims();
        for f in constraints {
            if f.dims() != n {
                return Err(ConvexError::DimensionMismatch {
                    expected: n,
                    found: f.dims(),
                });
            }
            self.constraints.push(f);
        }
        Ok(self)
    }

    /// Adds the linear constraints `A·x < b`.
    pub fn with_linear_inequality(self, mat_a: &DMatrix<f64>, vec_b: &DVector<f64>) -> Result<Self> {
        let constraints = linear_inequality_constraints(mat_a, vec_b)?;
        self.with_inequality_constraints(constraints)
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

    /// Checked after every round on consecutive `(x, f0(x))` pairs.
    #[must_use]
    pub fn with_halting(mut self, halting: HaltingCondition) -> Self {
        self.halting = Some(halting);
        self
    }

    /// Passed to every round's Newton solve, which then sees barrier values.
    #[must_use]
    pub fn with_inner_halting(mut self, halting: HaltingCondition) -> Self {
        self.inner_halting = Some(halting);
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

        if self.constraints.is_empty() {
            return self
                .newton(self.objective.clone(), x0)?
                .optimize_observe(observer);
        }

        let start_max = max_constraint(&self.constraints, &x0)?;
        if start_max >= 0.0 {
            log::warn!(
                "barrier: initial guess is not strictly feasible (max constraint {start_max:.3e})"
            );
        }

        let m = self.constraints.len() as f64;
        let mut t = self.params.t0;
        let mut x = x0;
        let mut round = 0;

        while t * self.params.epsilon < m {
            round += 1;
            observer.on_step(SolverStep::BarrierIter(t));

            let barrier =
                LogBarrierFunction::new(t, self.objective.clone(), self.constraints.clone())?;
            let inner = self
                .newton(Arc::new(barrier), x.clone())?
                .optimize_observe(observer)?;
            let x_prev = std::mem::replace(&mut x, inner.arg);

            log::debug!(
                "barrier: round {round}, t = {t:.3e}, gap = {:.3e}, {} newton iterations",
                m / t,
                inner.iterations
            );

            if let Some(halting) = &self.halting {
                let prev = PointValue::new(&x_prev, self.objective.value(&x_prev)?);
                let curr = PointValue::new(&x, self.objective.value(&x)?);
                if halting.check(round, prev, curr) {
                    break;
                }
            }

            t *= self.params.mu;
        }

        let cost = self.objective.value(&x)?;
        Ok(Solution {
            arg: x,
            cost,
            iterations: round,
        })
    }

    fn newton(&self, objective: SharedFunction, x0: DVector<f64>) -> Result<NewtonOptimizer> {
        let mut newton = NewtonOptimizer::new(objective, self.params.newton).with_initial_guess(x0)?;
        if let Some(eq) = &self.equality {
            newton = newton.with_equality_constraint(eq.clone())?;
        }
        // without inequalities the outer halting test applies to the Newton steps directly
        let halting = if self.constraints.is_empty() {
            self.halting.as_ref().or(self.inner_halting.as_ref())
        } else {
            self.inner_halting.as_ref()
        };
        Ok(match halting {
            Some(halting) => newton.with_halting(halting.clone()),
            None => newton,
        })
    }
}
