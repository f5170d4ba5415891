use nalgebra::DVector;

use crate::{
    ConvexFunction, Result,
    alg::line_search::{BacktrackingLineSearch, Step, rejects},
    constraint::LinearEqualityConstraint,
};

impl BacktrackingLineSearch {
    /// Residual-decrease search for infeasible-start Newton: accepts the first
    /// scale `t` whose primal-dual residual satisfies `r(t) ≤ (1 − α·t)·r`.
    ///
    /// Returns the accepted step together with the matching dual point.
    #[allow(clippy::too_many_arguments)]
    pub fn residual(
        &self,
        f: &dyn ConvexFunction,
        eq: &LinearEqualityConstraint,
        x: &DVector<f64>,
        nu: &DVector<f64>,
        x_delta: &DVector<f64>,
        nu_delta: &DVector<f64>,
        r_norm: f64,
    ) -> Result<Option<(Step, DVector<f64>)>> {
        for t in self.scales() {
            let tx = x + x_delta * t;
            let tv = f.value(&tx)?;
            if rejects(tv) {
                continue;
            }

            let tnu = nu + nu_delta * t;
            let t_norm = eq.residual_norm(&tx, &tnu, &f.gradient(&tx)?);
            if t_norm <= (1.0 - self.alpha * t) * r_norm {
                return Ok(Some((Step { t, x: tx, value: tv }, tnu)));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::QuadraticFunction;
    use nalgebra::{DMatrix, dmatrix, dvector};

    #[test]
    fn accepts_step_onto_constraint() {
        // minimize |x|²/2 with x + y = 1
        let q = QuadraticFunction::new(DMatrix::identity(2, 2), dvector![0.0, 0.0], 0.0).unwrap();
        let eq = LinearEqualityConstraint::new(dmatrix![1.0, 1.0], dvector![1.0]).unwrap();
        let x = dvector![10.0, 10.0];
        let nu = dvector![0.0];
        let r = eq.residual_norm(&x, &nu, &q.gradient(&x).unwrap());

        // exact KKT step to (0.5, 0.5) with ν = -0.5
        let dx = dvector![-9.5, -9.5];
        let dnu = dvector![-0.5];

        let ls = BacktrackingLineSearch::new(0.25, 0.8).unwrap();
        let (step, tnu) = ls.residual(&q, &eq, &x, &nu, &dx, &dnu, r).unwrap().unwrap();

        assert_eq!(step.t, 1.0);
        assert_eq!(step.x, dvector![0.5, 0.5]);
        assert_eq!(tnu, dvector![-0.5]);
        assert_eq!(step.value, 0.25);
    }

    #[test]
    fn gives_up_when_residual_grows() {
        let q = QuadraticFunction::new(DMatrix::identity(2, 2), dvector![0.0, 0.0], 0.0).unwrap();
        let eq = LinearEqualityConstraint::new(dmatrix![1.0, 1.0], dvector![1.0]).unwrap();
        let x = dvector![0.5, 0.5];
        let nu = dvector![-0.5];
        let r = eq.residual_norm(&x, &nu, &q.gradient(&x).unwrap());

        let ls = BacktrackingLineSearch::new(0.25, 0.5)
            .unwrap()
            .with_min_step(1e-4)
            .unwrap();
        let found = ls
            .residual(&q, &eq, &x, &nu, &dvector![1.0, 0.0], &dvector![0.0], r)
            .unwrap();

        assert!(found.is_none());
    }
}
