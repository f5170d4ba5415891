use thiserror::Error;

/// Errors raised while configuring or running a convex optimizer.
///
/// Running out of progress (a stalled line search, a vanishing step) and an
/// infeasible constraint set are reported through the returned data instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvexError {
    /// A tuning value or problem description was rejected before iterating.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Two objects that must agree in size do not.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A matrix factorization failed at the current iterate.
    #[error("numerical failure: {0}")]
    NumericalFailure(String),
}

impl ConvexError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ConvexError>;
