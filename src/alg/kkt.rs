//! Newton-step linear systems.
//!
//! Both strategies eliminate the dual block through the Schur complement
//! (Boyd & Vandenberghe, Algorithm 10.3) instead of factoring the full
//! `(n + k) × (n + k)` saddle-point matrix:
//!
//! ```text
//! | H  Aᵀ | |v|   | -g |
//! | A   0 | |w| = | -h |
//! ```

use nalgebra::{DMatrix, DVector, Dyn, linalg::Cholesky, linalg::SVD};

use crate::{ConvexError, Result};

/// Factorization used for `H` and for the Schur complement `A·H⁻¹·Aᵀ`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KktSolver {
    /// Cholesky factorizations. Requires both matrices to be positive
    /// definite and fails with [`ConvexError::NumericalFailure`] otherwise.
    #[default]
    CholeskySchur,
    /// SVD pseudo-inverses. Slower, but tolerates semi-definite or
    /// rank-deficient matrices. Whether the resulting steps are useful
    /// depends heavily on the problem.
    SvdSchur,
}

/// Result of a solve without equality constraints.
#[derive(Clone, Debug, PartialEq)]
pub struct UnconstrainedStep {
    pub x_delta: DVector<f64>,
    /// Newton decrement squared, `gᵀ·H⁻¹·g`.
    pub lambda_squared: f64,
}

/// Result of a solve of the full block system.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstrainedStep {
    pub x_delta: DVector<f64>,
    /// Updated dual variable `w`.
    pub nu_plus: DVector<f64>,
}

/// Smallest Cholesky pivot `L_ii²` accepted. Anything at or below it is
/// treated as singular.
const MIN_PIVOT: f64 = 1e-10;

enum Factor {
    Cholesky(Cholesky<f64, Dyn>),
    Svd { svd: SVD<f64, Dyn, Dyn>, eps: f64 },
}

impl Factor {
    fn new(solver: KktSolver, m: DMatrix<f64>, what: &str) -> Result<Self> {
        match solver {
            KktSolver::CholeskySchur => {
                let not_pd =
                    || ConvexError::NumericalFailure(format!("{what} is not positive definite"));
                let chol = m.cholesky().ok_or_else(not_pd)?;
                // nalgebra only rejects non-positive pivots
                if chol.l_dirty().diagonal().iter().any(|&d| d * d <= MIN_PIVOT) {
                    return Err(not_pd());
                }
                Ok(Factor::Cholesky(chol))
            }
            KktSolver::SvdSchur => {
                let size = m.nrows().max(m.ncols()) as f64;
                let svd = SVD::try_new(m, true, true, f64::EPSILON, 0).ok_or_else(|| {
                    ConvexError::NumericalFailure(format!("SVD of {what} did not converge"))
                })?;
                let eps = size * svd.singular_values.max() * f64::EPSILON;
                Ok(Factor::Svd { svd, eps })
            }
        }
    }

    fn solve_vec(&self, b: &DVector<f64>) -> Result<DVector<f64>> {
        match self {
            Factor::Cholesky(chol) => Ok(chol.solve(b)),
            Factor::Svd { svd, eps } => svd
                .solve(b, *eps)
                .map_err(|e| ConvexError::NumericalFailure(e.to_owned())),
        }
    }

    fn solve_mat(&self, b: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        match self {
            Factor::Cholesky(chol) => Ok(chol.solve(b)),
            Factor::Svd { svd, eps } => svd
                .solve(b, *eps)
                .map_err(|e| ConvexError::NumericalFailure(e.to_owned())),
        }
    }
}

impl KktSolver {
    /// Solves `H·v = −g` and reports `λ² = gᵀ·H⁻¹·g` alongside `v`.
    pub fn solve_unconstrained(
        &self,
        h: &DMatrix<f64>,
        g: &DVector<f64>,
    ) -> Result<UnconstrainedStep> {
        check_square(h, g.len())?;

        let factor = Factor::new(*self, h.clone(), "Hessian")?;
        let v = factor.solve_vec(g)?;
        let lambda_squared = g.dot(&v);

        Ok(UnconstrainedStep {
            x_delta: -v,
            lambda_squared,
        })
    }

    /// Solves the full block system for the primal step `v` and the updated
    /// dual `w`, given `at = Aᵀ` and the primal residual `h_res = A·x − b`.
    pub fn solve_constrained(
        &self,
        h: &DMatrix<f64>,
        a: &DMatrix<f64>,
        at: &DMatrix<f64>,
        g: &DVector<f64>,
        h_res: &DVector<f64>,
    ) -> Result<ConstrainedStep> {
        let n = g.len();
        let k = h_res.len();
        check_square(h, n)?;
        check_shape(a, k, n)?;
        check_shape(at, n, k)?;

        let fh = Factor::new(*self, h.clone(), "Hessian")?;
        let m1 = fh.solve_mat(at)?;
        let v1 = fh.solve_vec(g)?;

        // S = A·H⁻¹·Aᵀ, the negated Schur complement. Negating both sides of
        // S·w = A·H⁻¹·g − h leaves w unchanged.
        let s = a * m1;
        let fs = Factor::new(*self, s, "Schur complement")?;
        let w = fs.solve_vec(&(h_res - a * v1))?;

        let v = fh.solve_vec(&(g + at * &w))?;

        Ok(ConstrainedStep {
            x_delta: -v,
            nu_plus: w,
        })
    }
}

fn check_square(h: &DMatrix<f64>, n: usize) -> Result<()> {
    check_shape(h, n, n)
}

fn check_shape(m: &DMatrix<f64>, rows: usize, cols: usize) -> Result<()> {
    if m.nrows() != rows {
        return Err(ConvexError::DimensionMismatch {
            expected: rows,
            found: m.nrows(),
        });
    }
    if m.ncols() != cols {
        return Err(ConvexError::DimensionMismatch {
            expected: cols,
            found: m.ncols(),
        });
    }
    Ok(())
}
