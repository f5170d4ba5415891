use nalgebra::DVector;

pub enum SolverStep<'a> {
    /// Accepted Newton iterate. For barrier solves `value` is the barrier
    /// objective, not the user objective.
    NewtonPoint {
        point: &'a DVector<f64>,
        value: f64,
        iteration: usize,
    },
    /// Start of a barrier round with weight `t`.
    BarrierIter(f64),
    /// Start of feasibility round `round`, counted from 1, with the
    /// smooth-max sharpness and the largest constraint value at its start.
    FeasibilityRound {
        round: usize,
        alpha: f64,
        max_constraint: f64,
    },
}

pub trait SolverObserver {
    fn on_step(&mut self, step: SolverStep<'_>);
}

impl SolverObserver for () {
    fn on_step(&mut self, _: SolverStep<'_>) {}
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathPoint {
    pub point: DVector<f64>,
    pub value: f64,
    pub iteration: usize,
    /// Barrier weight, or smooth-max sharpness during a feasibility search.
    pub accuracy: f64,
    /// Outer round the point belongs to, counted from 1. Zero for plain Newton.
    pub round: usize,
}

/// Records every Newton iterate, tagged with the outer round it belongs to.
#[derive(Clone, Debug, Default)]
pub struct PathRecorder {
    pub path: Vec<PathPoint>,
    pub max_constraints: Vec<f64>,
    round: usize,
    accuracy: f64,
}

impl SolverObserver for PathRecorder {
    fn on_step(&mut self, step: SolverStep<'_>) {
        match step {
            SolverStep::NewtonPoint {
                point,
                value,
                iteration,
            } => self.path.push(PathPoint {
                point: point.clone(),
                value,
                iteration,
                accuracy: self.accuracy,
                round: self.round,
            }),
            SolverStep::BarrierIter(t) => {
                self.accuracy = t;
                self.round += 1;
            }
            SolverStep::FeasibilityRound {
                round,
                alpha,
                max_constraint,
            } => {
                self.accuracy = alpha;
                self.round = round;
                self.max_constraints.push(max_constraint);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    #[test]
    fn tags_points_with_their_round() {
        let mut rec = PathRecorder::default();
        let x = dvector![1.0, 2.0];

        rec.on_step(SolverStep::NewtonPoint {
            point: &x,
            value: 3.0,
            iteration: 1,
        });
        rec.on_step(SolverStep::BarrierIter(15.0));
        rec.on_step(SolverStep::NewtonPoint {
            point: &x,
            value: 2.0,
            iteration: 1,
        });

        assert_eq!(rec.path.len(), 2);
        assert_eq!((rec.path[0].round, rec.path[0].accuracy), (0, 0.0));
        assert_eq!((rec.path[1].round, rec.path[1].accuracy), (1, 15.0));
    }
}
