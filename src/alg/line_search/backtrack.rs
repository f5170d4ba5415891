use nalgebra::DVector;

use crate::{
    ConvexFunction, Result,
    alg::line_search::{BacktrackingLineSearch, Step, rejects},
};

impl BacktrackingLineSearch {
    /// Objective-decrease (Armijo) search: accepts the first scale `t` with
    /// `f(x + t·Δx) ≤ f(x) + α·t·(∇f·Δx)`.
    ///
    /// `None` means no scale down to the minimum step qualified.
    pub fn armijo(
        &self,
        f: &dyn ConvexFunction,
        x: &DVector<f64>,
        value: f64,
        x_delta: &DVector<f64>,
        slope: f64,
    ) -> Result<Option<Step>> {
        for t in self.scales() {
            let tx = x + x_delta * t;
            let tv = f.value(&tx)?;
            if rejects(tv) {
                continue;
            }
            if tv <= value + t * self.alpha * slope {
                return Ok(Some(Step { t, x: tx, value: tv }));
            }
        }
        Ok(None)
    }
}
