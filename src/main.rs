use std::{sync::Arc, time::Instant};

use convex_ipm::{
    ConvexFunction, Result, SharedFunction,
    alg::{BarrierOptimizer, BarrierParams, FeasibilityParams, FeasiblePointSolver},
    check_dims,
    constraint::linear_inequality_constraints,
};
use nalgebra::{DMatrix, DVector, Vector2};

/// Soft-margin linear discrimination between two point sets.
///
/// Variables are `(a, b, u, v)`: the separating line `a·p = b` and one slack
/// per point. Minimizes `0.5·|a|² + γ·(Σu + Σv)`.
struct LinearDiscrimination {
    xs: Vec<Vector2<f64>>,
    ys: Vec<Vector2<f64>>,
    gamma: f64,
}

impl LinearDiscrimination {
    fn constraints(&self) -> Result<Vec<SharedFunction>> {
        let n = self.xs.len();
        let m = self.ys.len();
        let rows = 2 * (n + m);

        let mut mat_a = DMatrix::zeros(rows, self.dims());
        let mut vec_b = DVector::from_element(rows, -1.0);

        // b - a·x_i - u_i + 1 < 0
        for (i, x) in self.xs.iter().enumerate() {
            mat_a[(i, 0)] = -x.x;
            mat_a[(i, 1)] = -x.y;
            mat_a[(i, 2)] = 1.0;
            mat_a[(i, 3 + i)] = -1.0;
        }
        // a·y_i - b - v_i + 1 < 0
        for (i, y) in self.ys.iter().enumerate() {
            mat_a[(n + i, 0)] = y.x;
            mat_a[(n + i, 1)] = y.y;
            mat_a[(n + i, 2)] = -1.0;
            mat_a[(n + i, 3 + n + i)] = -1.0;
        }
        // u, v > 0
        for j in 0..n + m {
            mat_a[(n + m + j, 3 + j)] = -1.0;
            vec_b[n + m + j] = 0.0;
        }

        linear_inequality_constraints(&mat_a, &vec_b)
    }
}

impl ConvexFunction for LinearDiscrimination {
    fn dims(&self) -> usize {
        3 + self.xs.len() + self.ys.len()
    }

    fn value(&self, x: &DVector<f64>) -> Result<f64> {
        check_dims(self.dims(), x)?;
        Ok(0.5 * x.rows(0, 2).norm_squared() + self.gamma * x.rows_range(3..).sum())
    }

    fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        check_dims(self.dims(), x)?;
        let mut g = DVector::from_element(self.dims(), self.gamma);
        g[0] = x[0];
        g[1] = x[1];
        g[2] = 0.0;
        Ok(g)
    }

    fn hessian(&self, x: &DVector<f64>) -> Result<DMatrix<f64>> {
        let d = self.dims();
        check_dims(d, x)?;
        let mut h = DMatrix::zeros(d, d);
        h[(0, 0)] = 1.0;
        h[(1, 1)] = 1.0;
        Ok(h)
    }
}

fn main() -> Result<()> {
    let xs = vec![
        Vector2::new(0.0, 0.0),
        Vector2::new(1.0, 0.0),
        Vector2::new(0.5, 0.5),
        Vector2::new(0.0, 0.5),
        Vector2::new(0.1, 0.5),
        Vector2::new(0.2, 0.5),
        Vector2::new(0.3, 0.5),
        Vector2::new(0.4, 0.5),
    ];
    let ys = vec![
        Vector2::new(0.0, 1.0),
        Vector2::new(1.0, 1.0),
        Vector2::new(0.1, 1.5),
        Vector2::new(0.2, 1.5),
        Vector2::new(0.3, 1.5),
        Vector2::new(0.4, 1.5),
    ];

    let disc = LinearDiscrimination { xs, ys, gamma: 1.0 };

    let start = Instant::now();

    let constraints = disc.constraints()?;
    let feasible =
        FeasiblePointSolver::new(constraints.clone(), FeasibilityParams::default())?.solve()?;

    println!(
        "Feasible start after {} rounds, max constraint {:.3e}",
        feasible.rounds, feasible.max_constraint
    );
    if !feasible.is_feasible() {
        println!("Constraints are infeasible");
        return Ok(());
    }

    let sol = BarrierOptimizer::new(Arc::new(disc), BarrierParams::default())
        .with_inequality_constraints(constraints)?
        .with_initial_guess(feasible.arg)?
        .optimize()?;

    let dur = start.elapsed();

    println!(
        "a = ({:.4}, {:.4}), b = {:.4}, cost = {:.6}",
        sol.arg[0], sol.arg[1], sol.arg[2], sol.cost
    );
    println!("Elapsed: {dur:?}");

    Ok(())
}
