//! Slack-augmented functions for phase-one feasibility problems.
//!
//! The domain is extended with one trailing slack coordinate `s`: minimizing
//! `s` subject to `f_k(x) − s < 0` yields a feasible point whenever the
//! optimal `s` is negative.

use nalgebra::{DMatrix, DVector};

use crate::{ConvexError, ConvexFunction, Result, SharedFunction, check_dims};

/// The slack coordinate itself, `x[n]`, over a domain of dimension `n + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeasiblePointObjectiveFunction {
    n: usize,
}

impl FeasiblePointObjectiveFunction {
    /// `n` is the dimension of the original problem.
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(ConvexError::invalid("dimension must be nonzero"));
        }
        Ok(Self { n })
    }
}

impl ConvexFunction for FeasiblePointObjectiveFunction {
    fn dims(&self) -> usize {
        self.n + 1
    }

    fn value(&self, x: &DVector<f64>) -> Result<f64> {
        check_dims(self.dims(), x)?;
        Ok(x[self.n])
    }

    fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        check_dims(self.dims(), x)?;
        let mut g = DVector::zeros(self.dims());
        g[self.n] = 1.0;
        Ok(g)
    }

    fn hessian(&self, x: &DVector<f64>) -> Result<DMatrix<f64>> {
        check_dims(self.dims(), x)?;
        Ok(DMatrix::zeros(self.dims(), self.dims()))
    }
}

/// `f(x[..n]) − x[n]` for a constraint `f` of dimension `n`.
#[derive(Clone)]
pub struct FeasiblePointConstraintFunction {
    f: SharedFunction,
}

impl FeasiblePointConstraintFunction {
    pub fn new(f: SharedFunction) -> Self {
        Self { f }
    }

    fn split(&self, x: &DVector<f64>) -> Result<(DVector<f64>, f64)> {
        let n = self.f.dims();
        check_dims(n + 1, x)?;
        Ok((x.rows(0, n).into_owned(), x[n]))
    }
}

impl ConvexFunction for FeasiblePointConstraintFunction {
    fn dims(&self) -> usize {
        self.f.dims() + 1
    }

    fn value(&self, x: &DVector<f64>) -> Result<f64> {
        let (inner, s) = self.split(x)?;
        Ok(self.f.value(&inner)? - s)
    }

    fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        let (inner, _) = self.split(x)?;
        let n = self.f.dims();

        let mut g = DVector::zeros(n + 1);
        g.rows_mut(0, n).copy_from(&self.f.gradient(&inner)?);
        g[n] = -1.0;
        Ok(g)
    }

    fn hessian(&self, x: &DVector<f64>) -> Result<DMatrix<f64>> {
        let (inner, _) = self.split(x)?;
        let n = self.f.dims();

        let mut h = DMatrix::zeros(n + 1, n + 1);
        h.view_mut((0, 0), (n, n))
            .copy_from(&self.f.hessian(&inner)?);
        Ok(h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::QuadraticFunction;
    use nalgebra::{dmatrix, dvector};
    use std::sync::Arc;

    #[test]
    fn objective_reads_slack_coordinate() {
        let f = FeasiblePointObjectiveFunction::new(2).unwrap();
        let x = dvector![4.0, 5.0, -1.5];

        assert_eq!(f.dims(), 3);
        assert_eq!(f.value(&x).unwrap(), -1.5);
        assert_eq!(f.gradient(&x).unwrap(), dvector![0.0, 0.0, 1.0]);
        assert_eq!(f.hessian(&x).unwrap(), DMatrix::zeros(3, 3));
        assert!(f.value(&dvector![1.0, 2.0]).is_err());
    }

    #[test]
    fn constraint_subtracts_slack_and_pads_derivatives() {
        let q = QuadraticFunction::new(dmatrix![2.0, 1.0; 1.0, 4.0], dvector![1.0, 0.0], -3.0)
            .unwrap();
        let c = FeasiblePointConstraintFunction::new(Arc::new(q.clone()));
        let x = dvector![1.0, -1.0, 0.5];
        let inner = dvector![1.0, -1.0];

        assert_eq!(c.dims(), 3);
        assert_eq!(c.value(&x).unwrap(), q.value(&inner).unwrap() - 0.5);

        let g = c.gradient(&x).unwrap();
        assert_eq!(g.rows(0, 2).into_owned(), q.gradient(&inner).unwrap());
        assert_eq!(g[2], -1.0);

        let h = c.hessian(&x).unwrap();
        assert_eq!(h, dmatrix![2.0, 1.0, 0.0; 1.0, 4.0, 0.0; 0.0, 0.0, 0.0]);
    }

    #[test]
    fn rejects_zero_dimension() {
        assert!(FeasiblePointObjectiveFunction::new(0).is_err());
    }
}
