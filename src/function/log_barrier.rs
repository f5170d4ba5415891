use nalgebra::{DMatrix, DVector};

use crate::{ConvexError, ConvexFunction, Result, SharedFunction};

/// Log-barrier relaxation of `min f0(x)` subject to `f_k(x) < 0`:
///
/// `t·f0(x) − Σ_k log(−f_k(x))`
///
/// The value is `+∞` wherever some `f_k(x) ≥ 0`, which makes the backtracking
/// line search reject candidates that leave the strictly feasible region.
#[derive(Clone)]
pub struct LogBarrierFunction {
    t: f64,
    objective: SharedFunction,
    constraints: Vec<SharedFunction>,
}

impl LogBarrierFunction {
    pub fn new(t: f64, objective: SharedFunction, constraints: Vec<SharedFunction>) -> Result<Self> {
        if t <= 0.0 || !t.is_finite() {
            return Err(ConvexError::invalid("barrier weight t must be > 0"));
        }

        let n = objective.dims();
        if let Some(f) = constraints.iter().find(|f| f.dims() != n) {
            return Err(ConvexError::DimensionMismatch {
                expected: n,
                found: f.dims(),
            });
        }

        Ok(Self {
            t,
            objective,
            constraints,
        })
    }

    pub fn weight(&self) -> f64 {
        self.t
    }
}

impl ConvexFunction for LogBarrierFunction {
    fn dims(&self) -> usize {
        self.objective.dims()
    }

    fn value(&self, x: &DVector<f64>) -> Result<f64> {
        let mut v = self.t * self.objective.value(x)?;

        for f in &self.constraints {
            let fi = f.value(x)?;
            if fi >= 0.0 {
                return Ok(f64::INFINITY);
            }
            v -= (-fi).ln();
        }

        Ok(v)
    }

    fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        let mut out = self.objective.gradient(x)? * self.t;

        for f in &self.constraints {
            let ci = -f.value(x)?.recip(); // -1 / f_i
            out.axpy(ci, &f.gradient(x)?, 1.0);
        }

        Ok(out)
    }

    fn hessian(&self, x: &DVector<f64>) -> Result<DMatrix<f64>> {
        let mut out = self.objective.hessian(x)? * self.t;

        for f in &self.constraints {
            let fi = f.value(x)?;
            let g = f.gradient(x)?;
            let h = f.hessian(x)?;

            // g gᵀ / f_i² − H_i / f_i
            out.ger(fi.powi(2).recip(), &g, &g, 1.0);
            out -= h / fi;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{LinearFunction, QuadraticFunction};
    use approx::assert_relative_eq;
    use nalgebra::dvector;
    use std::sync::Arc;

    fn unit_disk() -> SharedFunction {
        // x·x − 1 < 0
        let q = QuadraticFunction::new(DMatrix::identity(2, 2) * 2.0, dvector![0.0, 0.0], -1.0);
        Arc::new(q.unwrap())
    }

    fn barrier(t: f64) -> LogBarrierFunction {
        let objective: SharedFunction = Arc::new(LinearFunction::from_slice(&[1.0, 2.0], 0.0).unwrap());
        let half_plane: SharedFunction =
            Arc::new(LinearFunction::from_slice(&[-1.0, 0.0], -0.5).unwrap());
        LogBarrierFunction::new(t, objective, vec![unit_disk(), half_plane]).unwrap()
    }

    #[test]
    fn value_matches_definition_inside_domain() {
        let b = barrier(2.0);
        let x = dvector![0.0, 0.25];

        let expected = 2.0 * 0.5 - (1.0_f64 - 0.0625).ln() - 0.5_f64.ln();
        assert_relative_eq!(b.value(&x).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn value_is_infinite_outside_domain() {
        let b = barrier(1.0);
        assert_eq!(b.value(&dvector![2.0, 0.0]).unwrap(), f64::INFINITY);
        assert_eq!(b.value(&dvector![-0.5, 0.0]).unwrap(), f64::INFINITY);
    }

    #[test]
    fn gradient_and_hessian_match_finite_differences() {
        let b = barrier(3.0);
        let x = dvector![-0.1, 0.3];
        let h = 1e-6;

        let g = b.gradient(&x).unwrap();
        let hess = b.hessian(&x).unwrap();
        for i in 0..2 {
            let mut e = DVector::zeros(2);
            e[i] = h;
            let fd = (b.value(&(&x + &e)).unwrap() - b.value(&(&x - &e)).unwrap()) / (2.0 * h);
            assert_relative_eq!(g[i], fd, epsilon = 1e-5);

            let gd = (b.gradient(&(&x + &e)).unwrap() - b.gradient(&(&x - &e)).unwrap()) / (2.0 * h);
            for j in 0..2 {
                assert_relative_eq!(hess[(j, i)], gd[j], epsilon = 1e-4);
            }
        }
        assert_relative_eq!(hess, hess.transpose(), epsilon = 1e-12);
    }

    #[test]
    fn rejects_mismatched_constraint() {
        let objective: SharedFunction = Arc::new(LinearFunction::from_slice(&[1.0, 2.0], 0.0).unwrap());
        let wrong: SharedFunction = Arc::new(LinearFunction::from_slice(&[1.0], 0.0).unwrap());

        assert!(matches!(
            LogBarrierFunction::new(1.0, objective, vec![wrong]),
            Err(ConvexError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn rejects_non_positive_weight() {
        let objective: SharedFunction = Arc::new(LinearFunction::from_slice(&[1.0], 0.0).unwrap());
        assert!(LogBarrierFunction::new(0.0, objective, vec![]).is_err());
    }
}
