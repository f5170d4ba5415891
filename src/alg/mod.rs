pub mod barrier;
pub mod feasible;
pub mod halting;
pub mod kkt;
pub mod line_search;
pub mod newton;

pub use barrier::{BarrierOptimizer, BarrierParams};
pub use feasible::{FeasibilityParams, FeasiblePoint, FeasiblePointSolver};
pub use halting::{HaltingCondition, PointValue};
pub use kkt::{ConstrainedStep, KktSolver, UnconstrainedStep};
pub use newton::{NewtonOptimizer, NewtonParams};
