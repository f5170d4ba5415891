use nalgebra::{DMatrix, DVector};

use crate::{ConvexFunction, Result, SharedFunction};

/// `a·f(x) + b` for a wrapped function `f`.
#[derive(Clone)]
pub struct LinearTransformFunction {
    a: f64,
    b: f64,
    f: SharedFunction,
}

impl LinearTransformFunction {
    pub fn new(a: f64, b: f64, f: SharedFunction) -> Self {
        Self { a, b, f }
    }
}

impl ConvexFunction for LinearTransformFunction {
    fn dims(&self) -> usize {
        self.f.dims()
    }

    fn value(&self, x: &DVector<f64>) -> Result<f64> {
        Ok(self.b + self.a * self.f.value(x)?)
    }

    #[allow(clippy::float_cmp)]
    fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        let mut g = self.f.gradient(x)?;
        if self.a != 1.0 {
            g *= self.a;
        }
        Ok(g)
    }

    #[allow(clippy::float_cmp)]
    fn hessian(&self, x: &DVector<f64>) -> Result<DMatrix<f64>> {
        let mut h = self.f.hessian(x)?;
        if self.a != 1.0 {
            h *= self.a;
        }
        Ok(h)
    }
}
