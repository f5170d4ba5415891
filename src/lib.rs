#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(
    clippy::toplevel_ref_arg,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::cast_precision_loss
)]

//! Convex optimization with interior-point methods.
//!
//! The solver stack is built from three layers:
//!
//! * [`alg::newton::NewtonOptimizer`] minimizes a twice-differentiable convex
//!   function, optionally subject to linear equality constraints `Ax = b`.
//! * [`alg::barrier::BarrierOptimizer`] handles convex inequality constraints
//!   `f_k(x) < 0` by minimizing a sequence of log-barrier objectives.
//! * [`alg::feasible::FeasiblePointSolver`] finds a strictly feasible starting
//!   point for the barrier method by minimizing a smooth approximation of the
//!   maximum constraint violation.
//!
//! All of them consume functions through the [`ConvexFunction`] capability.

use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

pub mod alg;
pub mod constraint;
pub mod error;
pub mod function;
pub mod observer;

pub use error::{ConvexError, Result};

/// A twice-differentiable convex scalar function of an `n`-vector.
///
/// Evaluations take `&self` and return freshly-owned results, so one
/// function can be evaluated from several solvers (and threads) at once.
/// Passing a vector whose length differs from [`ConvexFunction::dims`]
/// fails with [`ConvexError::DimensionMismatch`].
pub trait ConvexFunction: Send + Sync {
    /// Dimension `n` of the function domain.
    fn dims(&self) -> usize;

    fn value(&self, x: &DVector<f64>) -> Result<f64>;

    fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>>;

    fn hessian(&self, x: &DVector<f64>) -> Result<DMatrix<f64>>;
}

/// Shared handle to a convex function, used wherever functions are composed.
pub type SharedFunction = Arc<dyn ConvexFunction>;

/// Fails with [`ConvexError::DimensionMismatch`] unless `x` has `expected` entries.
#[inline]
pub fn check_dims(expected: usize, x: &DVector<f64>) -> Result<()> {
    if x.len() == expected {
        Ok(())
    } else {
        Err(ConvexError::DimensionMismatch {
            expected,
            found: x.len(),
        })
    }
}

/// The point an optimizer stopped at, with the objective value there.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub arg: DVector<f64>,
    pub cost: f64,
    /// Newton iterations for [`alg::newton::NewtonOptimizer`], outer
    /// iterations for [`alg::barrier::BarrierOptimizer`].
    pub iterations: usize,
}

/// Largest value of `f_k(x)` over a set of constraint functions.
pub fn max_constraint(constraints: &[SharedFunction], x: &DVector<f64>) -> Result<f64> {
    constraints
        .iter()
        .try_fold(f64::NEG_INFINITY, |max, f| Ok(max.max(f.value(x)?)))
}
