use nalgebra::{DMatrix, DVector};

use crate::{ConvexError, ConvexFunction, Result, check_dims};

const SYMMETRY_TOLERANCE: f64 = 1e-6;

/// `0.5·xᵀAx + b·x + c`, with gradient `Ax + b` and constant Hessian `A`.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadraticFunction {
    a: DMatrix<f64>,
    b: DVector<f64>,
    c: f64,
}

impl QuadraticFunction {
    /// `a` must be square, match `b` in size, and be symmetric up to a
    /// relative tolerance of `1e-6`.
    pub fn new(a: DMatrix<f64>, b: DVector<f64>, c: f64) -> Result<Self> {
        let n = b.len();
        if n == 0 {
            return Err(ConvexError::invalid("dimension must be nonzero"));
        }
        if a.nrows() != n {
            return Err(ConvexError::DimensionMismatch {
                expected: n,
                found: a.nrows(),
            });
        }
        if a.ncols() != n {
            return Err(ConvexError::DimensionMismatch {
                expected: n,
                found: a.ncols(),
            });
        }

        for i in 0..n {
            for j in (i + 1)..n {
                let (aij, aji) = (a[(i, j)], a[(j, i)]);
                if (aij - aji).abs() > aij.abs().max(aji.abs()) * SYMMETRY_TOLERANCE {
                    return Err(ConvexError::invalid(format!(
                        "quadratic matrix is not symmetric at ({i}, {j})"
                    )));
                }
            }
        }

        Ok(Self { a, b, c })
    }

    /// The n-ball constraint `0.5·(s·(x−center)·(x−center) − r²)`, negative
    /// exactly inside the ball of radius `r`. The scale `s` sets its curvature.
    pub fn n_ball(center: &DVector<f64>, r: f64, s: f64) -> Result<Self> {
        let n = center.len();
        if n == 0 {
            return Err(ConvexError::invalid("center vector must have dimension > 0"));
        }
        if s <= 0.0 {
            return Err(ConvexError::invalid("scale s must be > 0"));
        }
        if r <= 0.0 {
            return Err(ConvexError::invalid("radius r must be > 0"));
        }

        let a = DMatrix::from_diagonal_element(n, n, s);
        let b = center * -s;
        let c = 0.5 * (s * center.norm_squared() - r * r);

        Ok(Self { a, b, c })
    }
}

impl ConvexFunction for QuadraticFunction {
    fn dims(&self) -> usize {
        self.b.len()
    }

    fn value(&self, x: &DVector<f64>) -> Result<f64> {
        check_dims(self.dims(), x)?;
        Ok(0.5 * (&self.a * x).dot(x) + self.b.dot(x) + self.c)
    }

    fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        check_dims(self.dims(), x)?;
        Ok(&self.a * x + &self.b)
    }

    fn hessian(&self, x: &DVector<f64>) -> Result<DMatrix<f64>> {
        check_dims(self.dims(), x)?;
        Ok(self.a.clone())
    }
}
