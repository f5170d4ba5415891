use nalgebra::{DMatrix, DVector};

use crate::{ConvexError, ConvexFunction, Result, SharedFunction};

/// Smooth approximation of `max_k f_k(x)`:
///
/// `z + (1/α)·log(Σ_k exp(α·(f_k(x) − z)))`, with `z = max_k f_k(x)`.
///
/// Subtracting `z` keeps every exponent `≤ 0` and the largest term at `1`, so
/// the sum lies in `[1, m]` and neither overflows nor underflows to zero. The
/// value is always `≥ max_k f_k(x)` and approaches it as `α → ∞`.
#[derive(Clone)]
pub struct SmoothMaxFunction {
    alpha: f64,
    functions: Vec<SharedFunction>,
}

impl SmoothMaxFunction {
    pub fn new(alpha: f64, functions: Vec<SharedFunction>) -> Result<Self> {
        if !(alpha > 0.0 && alpha.is_finite()) {
            return Err(ConvexError::invalid("smooth-max alpha must be > 0"));
        }
        let Some(first) = functions.first() else {
            return Err(ConvexError::invalid("list of functions must be nonempty"));
        };

        let n = first.dims();
        if let Some(f) = functions.iter().find(|f| f.dims() != n) {
            return Err(ConvexError::DimensionMismatch {
                expected: n,
                found: f.dims(),
            });
        }

        Ok(Self { alpha, functions })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Returns `z = max_k f_k(x)` and the weights `exp(α·(f_k(x) − z))`.
    fn weights(&self, x: &DVector<f64>) -> Result<(f64, Vec<f64>)> {
        let values = self
            .functions
            .iter()
            .map(|f| f.value(x))
            .collect::<Result<Vec<_>>>()?;

        let z = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let weights = values
            .into_iter()
            .map(|fk| (self.alpha * (fk - z)).exp())
            .collect();

        Ok((z, weights))
    }
}

impl ConvexFunction for SmoothMaxFunction {
    fn dims(&self) -> usize {
        self.functions[0].dims()
    }

    fn value(&self, x: &DVector<f64>) -> Result<f64> {
        let (z, weights) = self.weights(x)?;
        let sum: f64 = weights.iter().sum();
        Ok(z + sum.ln() / self.alpha)
    }

    fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        let (_, weights) = self.weights(x)?;
        let mut out = DVector::zeros(self.dims());
        let mut total = 0.0;

        for (f, &w) in self.functions.iter().zip(&weights) {
            out.axpy(w, &f.gradient(x)?, 1.0);
            total += w;
        }

        Ok(out / total)
    }

    fn hessian(&self, x: &DVector<f64>) -> Result<DMatrix<f64>> {
        let (_, weights) = self.weights(x)?;
        let n = self.dims();
        let alpha = self.alpha;

        let mut out = DMatrix::zeros(n, n);
        let mut grad = DVector::zeros(n);
        let mut total = 0.0;

        // Σ w_k (H_k + α g_k g_kᵀ) / Σ w_k − α g gᵀ, with g the weighted gradient
        for (f, &w) in self.functions.iter().zip(&weights) {
            let gk = f.gradient(x)?;
            out += f.hessian(x)? * w;
            out.ger(alpha * w, &gk, &gk, 1.0);
            grad.axpy(w, &gk, 1.0);
            total += w;
        }

        out /= total;
        grad /= total;
        out.ger(-alpha, &grad, &grad, 1.0);

        Ok(out)
    }
}
