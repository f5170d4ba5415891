use std::sync::Arc;

use approx::assert_abs_diff_eq;
use convex_ipm::{
    ConvexFunction, SharedFunction,
    alg::{
        BarrierOptimizer, BarrierParams, FeasibilityParams, FeasiblePointSolver, KktSolver,
        NewtonOptimizer, NewtonParams,
    },
    constraint::{LinearEqualityConstraint, linear_inequality_constraints},
    function::{LinearFunction, QuadraticFunction},
    max_constraint,
    observer::PathRecorder,
};
use nalgebra::{DMatrix, DVector, dmatrix, dvector};

fn linear(b: &[f64], c: f64) -> SharedFunction {
    Arc::new(LinearFunction::from_slice(b, c).unwrap())
}

/// `0.5·|x - center|²`
fn distance_to(center: DVector<f64>) -> SharedFunction {
    let n = center.len();
    let c = 0.5 * center.norm_squared();
    Arc::new(QuadraticFunction::new(DMatrix::identity(n, n), -center, c).unwrap())
}

/// `lo < x_i < hi` for every coordinate, as `A·x < b`.
fn box_constraints(n: usize, lo: f64, hi: f64) -> Vec<SharedFunction> {
    let mut mat_a = DMatrix::zeros(2 * n, n);
    let mut vec_b = DVector::zeros(2 * n);
    for i in 0..n {
        mat_a[(2 * i, i)] = 1.0;
        vec_b[2 * i] = hi;
        mat_a[(2 * i + 1, i)] = -1.0;
        vec_b[2 * i + 1] = -lo;
    }
    linear_inequality_constraints(&mat_a, &vec_b).unwrap()
}

#[test]
fn newton_minimizes_translated_quadratic() {
    let center = dvector![1.0, -2.0, 3.0];
    let objective = distance_to(center.clone());

    for solver in [KktSolver::CholeskySchur, KktSolver::SvdSchur] {
        let params = NewtonParams::default().with_kkt_solver(solver);
        let sol = NewtonOptimizer::new(objective.clone(), params)
            .optimize()
            .unwrap();

        assert_abs_diff_eq!(sol.arg, center, epsilon = 1e-9);
        assert_abs_diff_eq!(sol.cost, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn newton_respects_equality_constraint() {
    let objective = distance_to(dvector![0.0, 0.0]);
    let eq = LinearEqualityConstraint::new(dmatrix![1.0, 1.0], dvector![1.0]).unwrap();

    let sol = NewtonOptimizer::new(objective, NewtonParams::default())
        .with_equality_constraint(eq.clone())
        .unwrap()
        .with_initial_guess(dvector![3.0, -5.0])
        .unwrap()
        .optimize()
        .unwrap();

    assert_abs_diff_eq!(sol.arg, dvector![0.5, 0.5], epsilon = 1e-9);
    assert_abs_diff_eq!(sol.cost, 0.25, epsilon = 1e-9);
    assert!(eq.primal_residual(&sol.arg).norm() < 1e-9);
}

#[test]
fn barrier_path_stays_strictly_feasible() {
    let objective = distance_to(dvector![0.0, 0.0]);
    // x + y > 1
    let constraints = linear_inequality_constraints(&dmatrix![-1.0, -1.0], &dvector![-1.0]).unwrap();

    let mut recorder = PathRecorder::default();
    let sol = BarrierOptimizer::new(objective, BarrierParams::default())
        .with_inequality_constraints(constraints.clone())
        .unwrap()
        .with_initial_guess(dvector![10.0, 10.0])
        .unwrap()
        .optimize_observe(&mut recorder)
        .unwrap();

    assert_abs_diff_eq!(sol.arg, dvector![0.5, 0.5], epsilon = 1e-6);
    assert_abs_diff_eq!(sol.cost, 0.25, epsilon = 1e-6);

    assert!(!recorder.path.is_empty());
    for p in &recorder.path {
        assert!(max_constraint(&constraints, &p.point).unwrap() < 0.0);
    }
}

#[test]
fn feasible_point_for_single_half_plane() {
    // x > 100
    let constraints = vec![linear(&[-1.0, 0.0], 100.0)];

    let found = FeasiblePointSolver::new(constraints.clone(), FeasibilityParams::default())
        .unwrap()
        .solve()
        .unwrap();

    assert!(found.rounds > 0);
    assert!(found.is_feasible());
    assert!(max_constraint(&constraints, &found.arg).unwrap() < 0.0);
}

#[test]
fn feasible_point_for_boxes() {
    let square = vec![
        linear(&[1.0, 0.0], -5.0),
        linear(&[-1.0, 0.0], 1.0),
        linear(&[0.0, 1.0], -5.0),
        linear(&[0.0, -1.0], 1.0),
    ];
    // 10 < x < 12, -5 < y < -3, -1 < z < 1
    let offset = vec![
        linear(&[1.0, 0.0, 0.0], -12.0),
        linear(&[-1.0, 0.0, 0.0], 10.0),
        linear(&[0.0, 1.0, 0.0], 3.0),
        linear(&[0.0, -1.0, 0.0], -5.0),
        linear(&[0.0, 0.0, 1.0], -1.0),
        linear(&[0.0, 0.0, -1.0], -1.0),
    ];

    for constraints in [square, offset] {
        let found = FeasiblePointSolver::new(constraints.clone(), FeasibilityParams::default())
            .unwrap()
            .solve()
            .unwrap();

        assert!(found.is_feasible());
        assert!(max_constraint(&constraints, &found.arg).unwrap() < 0.0);
    }
}

#[test]
fn feasible_point_inside_disk() {
    // |x - (5, 5)|² < 1
    let disk: SharedFunction = Arc::new(
        QuadraticFunction::new(dmatrix![2.0, 0.0; 0.0, 2.0], dvector![-10.0, -10.0], 49.0)
            .unwrap(),
    );

    let found = FeasiblePointSolver::new(vec![disk], FeasibilityParams::default())
        .unwrap()
        .solve()
        .unwrap();

    assert!(found.is_feasible());
    assert!((&found.arg - dvector![5.0, 5.0]).norm() < 1.0);
}

#[test]
fn disjoint_half_lines_are_infeasible() {
    // x < 1 and x > 5
    let constraints = vec![linear(&[1.0], -1.0), linear(&[-1.0], 5.0)];

    for x0 in [0.0, 100.0] {
        let found = FeasiblePointSolver::new(constraints.clone(), FeasibilityParams::default())
            .unwrap()
            .with_initial_guess(dvector![x0])
            .unwrap()
            .solve()
            .unwrap();

        assert!(!found.is_feasible());
        assert!(found.max_constraint >= 0.0);
    }
}

#[test]
fn feasible_point_then_barrier() {
    let constraints = box_constraints(2, 1.0, 5.0);

    let start = FeasiblePointSolver::new(constraints.clone(), FeasibilityParams::default())
        .unwrap()
        .solve()
        .unwrap();
    assert!(start.is_feasible());

    let sol = BarrierOptimizer::new(distance_to(dvector![10.0, 10.0]), BarrierParams::default())
        .with_inequality_constraints(constraints)
        .unwrap()
        .with_initial_guess(start.arg)
        .unwrap()
        .optimize()
        .unwrap();

    assert_abs_diff_eq!(sol.arg, dvector![5.0, 5.0], epsilon = 1e-6);
    assert_abs_diff_eq!(sol.cost, 25.0, epsilon = 1e-5);
}

#[test]
fn solvers_share_functions_across_threads() {
    let objective = distance_to(dvector![0.0, 0.0]);
    let constraints = linear_inequality_constraints(&dmatrix![-1.0, -1.0], &dvector![-1.0]).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = (1..=4)
            .map(|k| {
                let optimizer = BarrierOptimizer::new(objective.clone(), BarrierParams::default())
                    .with_inequality_constraints(constraints.clone())
                    .unwrap()
                    .with_initial_guess(dvector![k as f64, k as f64])
                    .unwrap();
                s.spawn(move || optimizer.optimize().unwrap())
            })
            .collect();

        for handle in handles {
            let sol = handle.join().unwrap();
            assert_abs_diff_eq!(sol.arg, dvector![0.5, 0.5], epsilon = 1e-6);
        }
    });

    assert_eq!(objective.dims(), 2);
}
