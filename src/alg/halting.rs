use nalgebra::DVector;
use std::{fmt, sync::Arc};

/// A point with the objective value there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointValue<'a> {
    pub point: &'a DVector<f64>,
    pub value: f64,
}

impl<'a> PointValue<'a> {
    pub fn new(point: &'a DVector<f64>, value: f64) -> Self {
        Self { point, value }
    }
}

type Predicate = dyn Fn(usize, PointValue<'_>, PointValue<'_>) -> bool + Send + Sync;

/// User-supplied early-exit test, evaluated after every accepted step with
/// the iteration number and the previous and current points.
///
/// Returning `true` ends the loop; the current point is the result.
#[derive(Clone)]
pub struct HaltingCondition(Arc<Predicate>);

impl HaltingCondition {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(usize, PointValue<'_>, PointValue<'_>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Halts as soon as the current value drops below zero.
    pub fn negative_value() -> Self {
        Self::new(|_, _, curr| curr.value < 0.0)
    }

    pub fn check(&self, iteration: usize, prev: PointValue<'_>, curr: PointValue<'_>) -> bool {
        (self.0)(iteration, prev, curr)
    }
}

impl fmt::Debug for HaltingCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HaltingCondition(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    #[test]
    fn negative_value_looks_at_current_point_only() {
        let halt = HaltingCondition::negative_value();
        let x = dvector![0.0];

        assert!(halt.check(1, PointValue::new(&x, 1.0), PointValue::new(&x, -1e-12)));
        assert!(!halt.check(1, PointValue::new(&x, -1.0), PointValue::new(&x, 0.0)));
    }

    #[test]
    fn closures_see_iteration_and_points() {
        let halt = HaltingCondition::new(|it, prev, curr| {
            it >= 3 || (curr.point - prev.point).norm() < 1e-3
        });
        let a = dvector![0.0, 0.0];
        let b = dvector![1.0, 0.0];

        assert!(!halt.check(1, PointValue::new(&a, 0.0), PointValue::new(&b, 0.0)));
        assert!(halt.check(3, PointValue::new(&a, 0.0), PointValue::new(&b, 0.0)));
        assert!(halt.clone().check(1, PointValue::new(&a, 0.0), PointValue::new(&a, 0.0)));
    }
}
