//! Primitive and composite convex functions.

pub mod feasible_point;
pub mod linear;
pub mod log_barrier;
pub mod quadratic;
pub mod smooth_max;
pub mod transform;

pub use feasible_point::{FeasiblePointConstraintFunction, FeasiblePointObjectiveFunction};
pub use linear::LinearFunction;
pub use log_barrier::LogBarrierFunction;
pub use quadratic::QuadraticFunction;
pub use smooth_max::SmoothMaxFunction;
pub use transform::LinearTransformFunction;
