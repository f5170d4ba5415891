use nalgebra::DVector;

use crate::{ConvexError, Result};

pub mod backtrack;
pub mod residual;

/// Backtracking line search over the step scales `1, β, β², …`, stopping once
/// the scale drops below `min_step`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BacktrackingLineSearch {
    alpha: f64,
    beta: f64,
    min_step: f64,
}

/// An accepted trial point `x + t·Δx`, together with the objective there.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub t: f64,
    pub x: DVector<f64>,
    pub value: f64,
}

impl BacktrackingLineSearch {
    /// `alpha` must lie in `(0, 0.5)` and `beta` in `(0, 1)`.
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 0.5) {
            return Err(ConvexError::invalid("alpha must be in range (0, 0.5)"));
        }
        if !(beta > 0.0 && beta < 1.0) {
            return Err(ConvexError::invalid("beta must be in range (0, 1)"));
        }

        Ok(Self {
            alpha,
            beta,
            min_step: f64::EPSILON,
        })
    }

    pub fn with_min_step(mut self, min_step: f64) -> Result<Self> {
        if !(min_step > 0.0 && min_step.is_finite()) {
            return Err(ConvexError::invalid("minimum step must be > 0"));
        }
        self.min_step = min_step;
        Ok(self)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn min_step(&self) -> f64 {
        self.min_step
    }

    fn scales(&self) -> impl Iterator<Item = f64> {
        let Self { beta, min_step, .. } = *self;
        std::iter::successors(Some(1.0), move |t| Some(t * beta)).take_while(move |&t| t >= min_step)
    }
}

/// Trial points where the objective is `+∞` (outside a barrier's domain) or
/// NaN are never accepted.
fn rejects(value: f64) -> bool {
    value.is_nan() || value == f64::INFINITY
}
