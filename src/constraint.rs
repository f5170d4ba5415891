use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

use crate::{ConvexError, Result, SharedFunction, function::LinearFunction};

/// Constrains the problem to `A·x = b`.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearEqualityConstraint {
    mat_a: DMatrix<f64>,
    vec_b: DVector<f64>,
}

impl LinearEqualityConstraint {
    pub fn new(mat_a: DMatrix<f64>, vec_b: DVector<f64>) -> Result<Self> {
        if mat_a.nrows() != vec_b.len() {
            return Err(ConvexError::DimensionMismatch {
                expected: mat_a.nrows(),
                found: vec_b.len(),
            });
        }
        Ok(Self { mat_a, vec_b })
    }

    /// Number of equations `k`.
    pub fn num_constraints(&self) -> usize {
        self.vec_b.len()
    }

    pub fn mat_a(&self) -> &DMatrix<f64> {
        &self.mat_a
    }

    pub fn vec_b(&self) -> &DVector<f64> {
        &self.vec_b
    }

    /// Primal residual `A·x − b`.
    pub fn primal_residual(&self, x: &DVector<f64>) -> DVector<f64> {
        &self.mat_a * x - &self.vec_b
    }

    /// Norm of the stacked primal-dual residual
    /// `sqrt(‖A·x − b‖² + ‖∇f(x) + Aᵀ·ν‖²)`.
    pub fn residual_norm(&self, x: &DVector<f64>, nu: &DVector<f64>, grad: &DVector<f64>) -> f64 {
        let r_primal = self.primal_residual(x);
        let r_dual = grad + self.mat_a.tr_mul(nu);
        (r_primal.norm_squared() + r_dual.norm_squared()).sqrt()
    }

    /// Checks the constraint against a domain of dimension `n`: the column
    /// count must match and `k < n` must leave a free degree of freedom.
    pub(crate) fn validate_for(&self, n: usize) -> Result<()> {
        let k = self.num_constraints();
        if k >= n {
            return Err(ConvexError::invalid(format!(
                "rank of equality constraints ({k}) must be < domain dimension ({n})"
            )));
        }
        if k > 0 && self.mat_a.ncols() != n {
            return Err(ConvexError::DimensionMismatch {
                expected: n,
                found: self.mat_a.ncols(),
            });
        }
        Ok(())
    }
}

/// Splits `A·x < b` into one constraint function `A_j·x − b_j` per row.
pub fn linear_inequality_constraints(
    mat_a: &DMatrix<f64>,
    vec_b: &DVector<f64>,
) -> Result<Vec<SharedFunction>> {
    if mat_a.nrows() != vec_b.len() {
        return Err(ConvexError::DimensionMismatch {
            expected: mat_a.nrows(),
            found: vec_b.len(),
        });
    }

    mat_a
        .row_iter()
        .zip(vec_b.iter())
        .map(|(row, &bj)| {
            let f = LinearFunction::new(row.transpose(), -bj)?;
            Ok(Arc::new(f) as SharedFunction)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConvexFunction;
    use approx::assert_abs_diff_eq;
    use nalgebra::{dmatrix, dvector};

    #[test]
    fn residual_norm_stacks_primal_and_dual() {
        let eq = LinearEqualityConstraint::new(dmatrix![1.0, 1.0], dvector![1.0]).unwrap();
        let x = dvector![1.0, 1.0];
        let nu = dvector![2.0];
        let grad = dvector![-1.0, 0.0];

        // primal: [1], dual: [1, 2]
        assert_abs_diff_eq!(eq.residual_norm(&x, &nu, &grad), 6.0_f64.sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn rejects_mismatched_rhs() {
        assert!(matches!(
            LinearEqualityConstraint::new(dmatrix![1.0, 1.0], dvector![1.0, 2.0]),
            Err(ConvexError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn validates_rank_and_columns() {
        let eq = LinearEqualityConstraint::new(dmatrix![1.0, 1.0; 1.0, -1.0], dvector![0.0, 0.0])
            .unwrap();
        assert!(matches!(eq.validate_for(2), Err(ConvexError::InvalidArgument(_))));
        assert!(matches!(
            eq.validate_for(3),
            Err(ConvexError::DimensionMismatch {
                expected: 3,
                found: 2
            })
        ));

        let empty = LinearEqualityConstraint::new(DMatrix::zeros(0, 5), DVector::zeros(0)).unwrap();
        assert!(empty.validate_for(2).is_ok());
    }

    #[test]
    fn inequality_rows_become_linear_functions() {
        let fs = linear_inequality_constraints(&dmatrix![1.0, 0.0; 0.0, -2.0], &dvector![3.0, 4.0])
            .unwrap();
        let x = dvector![1.0, 1.0];

        assert_eq!(fs.len(), 2);
        assert_eq!(fs[0].value(&x).unwrap(), -2.0);
        assert_eq!(fs[1].value(&x).unwrap(), -6.0);
        assert_eq!(fs[1].gradient(&x).unwrap(), dvector![0.0, -2.0]);
    }
}
