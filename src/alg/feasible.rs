//! Phase-one search for a strictly feasible point.
//!
//! Each round minimizes a smooth maximum over the constraints plus an n-ball
//! term centered at the current point. The n-ball keeps the Hessian
//! nonsingular even when every constraint is linear, and it pins the
//! minimizer near the current point until the smooth maximum is sharp enough
//! to take over. Since the smooth maximum bounds the true maximum from above,
//! the inner Newton solve can stop as soon as its value goes negative.

use nalgebra::DVector;
use std::sync::Arc;

use crate::{
    ConvexError, ConvexFunction, Result, SharedFunction,
    alg::{
        halting::HaltingCondition,
        newton::{NewtonOptimizer, NewtonParams},
    },
    check_dims,
    constraint::LinearEqualityConstraint,
    function::{QuadraticFunction, SmoothMaxFunction},
    max_constraint,
    observer::{SolverObserver, SolverStep},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeasibilityParams {
    epsilon: f64,
    tolerance: f64,
    min_sigma: f64,
    sigma_factor: f64,
    min_nball_factor: f64,
    alpha_growth: f64,
    max_rounds: usize,
    newton: NewtonParams,
}

impl Default for FeasibilityParams {
    fn default() -> Self {
        Self {
            epsilon: 1e-9,
            tolerance: 0.01,
            min_sigma: 10.0,
            sigma_factor: 1.5,
            min_nball_factor: 1e-3_f64.ln(),
            alpha_growth: 10.0,
            max_rounds: 1_000,
            newton: NewtonParams::default(),
        }
    }
}

fn positive(value: f64, name: &str) -> Result<f64> {
    if value.is_nan() || value <= 0.0 {
        return Err(ConvexError::invalid(format!("{name} must be > 0")));
    }
    Ok(value)
}

impl FeasibilityParams {
    /// Stop once a round moves the point by less than `sqrt(epsilon)`.
    pub fn with_epsilon(mut self, epsilon: f64) -> Result<Self> {
        self.epsilon = positive(epsilon, "epsilon")?;
        Ok(self)
    }

    /// Stop once the largest constraint value drops below `-tolerance`.
    pub fn with_tolerance(mut self, tolerance: f64) -> Result<Self> {
        self.tolerance = positive(tolerance, "tolerance")?;
        Ok(self)
    }

    /// The n-ball scale is `1/σ` with `σ = max(min_sigma, sigma_factor·√s)`
    /// for a positive maximum constraint value `s`.
    pub fn with_sigma(mut self, min_sigma: f64, sigma_factor: f64) -> Result<Self> {
        self.min_sigma = positive(min_sigma, "min_sigma")?;
        self.sigma_factor = positive(sigma_factor, "sigma_factor")?;
        Ok(self)
    }

    /// Log of the smallest relative weight the n-ball may carry inside the
    /// smooth maximum at the start of a round.
    pub fn with_min_nball_factor(mut self, min_nball_factor: f64) -> Result<Self> {
        if min_nball_factor.is_nan() || min_nball_factor >= 0.0 {
            return Err(ConvexError::invalid("min_nball_factor must be < 0"));
        }
        self.min_nball_factor = min_nball_factor;
        Ok(self)
    }

    pub fn with_alpha_growth(mut self, alpha_growth: f64) -> Result<Self> {
        if alpha_growth.is_nan() || alpha_growth <= 1.0 {
            return Err(ConvexError::invalid("alpha_growth must be > 1"));
        }
        self.alpha_growth = alpha_growth;
        Ok(self)
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Result<Self> {
        if max_rounds == 0 {
            return Err(ConvexError::invalid("max_rounds must be >= 1"));
        }
        self.max_rounds = max_rounds;
        Ok(self)
    }

    #[must_use]
    pub fn with_newton(mut self, newton: NewtonParams) -> Self {
        self.newton = newton;
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    pub fn newton(&self) -> &NewtonParams {
        &self.newton
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeasiblePoint {
    pub arg: DVector<f64>,
    /// `max_k f_k(arg)`; negative exactly when `arg` is strictly feasible.
    pub max_constraint: f64,
    /// Smooth-max rounds run. Zero when the initial guess was already feasible.
    pub rounds: usize,
}

impl FeasiblePoint {
    pub fn is_feasible(&self) -> bool {
        self.max_constraint < 0.0
    }
}

/// Searches for `x` with `f_k(x) < 0` for every constraint.
///
/// When no such point exists the result is the best mini-max point found
/// and [`FeasiblePoint::is_feasible`] is `false`. Infeasibility is a result,
/// not an error.
#[derive(Clone)]
pub struct FeasiblePointSolver {
    constraints: Vec<SharedFunction>,
    params: FeasibilityParams,
    equality: Option<LinearEqualityConstraint>,
    initial_guess: Option<DVector<f64>>,
}

impl FeasiblePointSolver {
    pub fn new(constraints: Vec<SharedFunction>, params: FeasibilityParams) -> Result<Self> {
        let Some(first) = constraints.first() else {
            return Err(ConvexError::invalid("set of inequality constraints was empty"));
        };

        let n = first.dims();
        if let Some(f) = constraints.iter().find(|f| f.dims() != n) {
            return Err(ConvexError::DimensionMismatch {
                expected: n,
                found: f.dims(),
            });
        }

        Ok(Self {
            constraints,
            params,
            equality: None,
            initial_guess: None,
        })
    }

    pub fn dims(&self) -> usize {
        self.constraints[0].dims()
    }

    /// Every round's Newton solve also enforces `A·x = b`.
    pub fn with_equality_constraint(mut self, eq: LinearEqualityConstraint) -> Result<Self> {
        eq.validate_for(self.dims())?;
        self.equality = Some(eq);
        Ok(self)
    }

    /// Defaults to the zero vector.
    pub fn with_initial_guess(mut self, x0: DVector<f64>) -> Result<Self> {
        check_dims(self.dims(), &x0)?;
        self.initial_guess = Some(x0);
        Ok(self)
    }

    pub fn solve(&self) -> Result<FeasiblePoint> {
        self.solve_observe(&mut ())
    }

    pub fn solve_observe<O: SolverObserver>(&self, observer: &mut O) -> Result<FeasiblePoint> {
        let params = &self.params;
        let mut x = self
            .initial_guess
            .clone()
            .unwrap_or_else(|| DVector::zeros(self.dims()));
        let mut s = max_constraint(&self.constraints, &x)?;

        // an equality constraint still has to be satisfied by a feasible start
        if s < 0.0 && self.equality.is_none() {
            return Ok(FeasiblePoint {
                arg: x,
                max_constraint: s,
                rounds: 0,
            });
        }

        let mut alpha = 1.0;
        let mut rounds = 0;

        loop {
            if rounds == params.max_rounds {
                log::warn!("feasible point: round limit ({rounds}) reached at max constraint {s:.3e}");
                break;
            }
            rounds += 1;

            // the n-ball is a squared distance, so its scale tracks sqrt(s)
            let sigma = if s > 0.0 {
                params.min_sigma.max(params.sigma_factor * s.sqrt())
            } else {
                params.min_sigma
            };
            let nball = QuadraticFunction::n_ball(&x, 1.0, sigma.recip())?;

            // keep the n-ball from being washed out of the smooth maximum: its
            // weight relative to the largest constraint is exp(α·(v0 − s)),
            // which must stay above exp(min_nball_factor)
            let v0 = nball.value(&x)?;
            if v0 < s {
                let cap = params.min_nball_factor / (v0 - s);
                alpha = if v0 < s + params.min_nball_factor {
                    cap
                } else {
                    alpha.min(cap)
                };
            }

            observer.on_step(SolverStep::FeasibilityRound {
                round: rounds,
                alpha,
                max_constraint: s,
            });

            let mut augmented = self.constraints.clone();
            augmented.push(Arc::new(nball));
            let smooth_max = SmoothMaxFunction::new(alpha, augmented)?;

            let mut newton = NewtonOptimizer::new(Arc::new(smooth_max), params.newton)
                .with_initial_guess(x.clone())?
                .with_halting(HaltingCondition::negative_value());
            if let Some(eq) = &self.equality {
                newton = newton.with_equality_constraint(eq.clone())?;
            }
            let inner = newton.optimize_observe(observer)?;

            let x_prev = std::mem::replace(&mut x, inner.arg);
            s = max_constraint(&self.constraints, &x)?;

            log::debug!(
                "feasible point: round {rounds}, alpha = {alpha:.3e}, max constraint = {s:.6e}, {} newton iterations",
                inner.iterations
            );

            if s < -params.tolerance {
                break;
            }
            // the n-ball no longer moves the point: this is the mini-max point
            if (&x - &x_prev).norm_squared() < params.epsilon {
                break;
            }

            alpha *= params.alpha_growth;
        }

        Ok(FeasiblePoint {
            arg: x,
            max_constraint: s,
            rounds,
        })
    }
}
