use dynamics::{Real, TrainPair};
use ndarray::Array1;

use crate::{OdeErr, Result, VectorField};

/// A finite Euler-integrated path of a vector field.
///
/// Iterating yields, for every step, the current point and the point one step ahead. The
/// trajectory can be iterated any number of times, each time from its start point.
#[derive(Debug, Clone)]
pub struct Trajectory<F> {
    field: F,
    start: Array1<Real>,
    dt: Real,
    steps: usize,
}

impl<F: VectorField> Trajectory<F> {
    /// Creates a new `Trajectory`.
    ///
    /// # Arguments
    /// * `field` - The vector field to follow.
    /// * `start` - The initial point.
    /// * `dt` - The integration step.
    /// * `steps` - The amount of pairs to yield.
    ///
    /// # Returns
    /// An error if `start` doesn't match the field or `dt` isn't positive and finite.
    pub fn new(field: F, start: Array1<Real>, dt: Real, steps: usize) -> Result<Self> {
        if start.len() != field.dim() {
            return Err(OdeErr::DimensionMismatch {
                got: start.len(),
                expected: field.dim(),
            });
        }

        if !dt.is_finite() || dt <= 0.0 {
            return Err(OdeErr::InvalidStep(dt));
        }

        Ok(Self::from_parts(field, start, dt, steps))
    }

    /// Builds a trajectory whose start point and step are already known to be valid.
    pub(crate) fn from_parts(field: F, start: Array1<Real>, dt: Real, steps: usize) -> Self {
        Self {
            field,
            start,
            dt,
            steps,
        }
    }

    pub fn start(&self) -> &Array1<Real> {
        &self.start
    }

    pub fn dt(&self) -> Real {
        self.dt
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Iterates the trajectory from its start point.
    pub fn iter(&self) -> TrajectoryIter<&F> {
        TrajectoryIter {
            field: &self.field,
            x: self.start.clone(),
            dt: self.dt,
            remaining: self.steps,
        }
    }
}

impl<F: VectorField> IntoIterator for Trajectory<F> {
    type Item = TrainPair;
    type IntoIter = TrajectoryIter<F>;

    fn into_iter(self) -> Self::IntoIter {
        TrajectoryIter {
            field: self.field,
            x: self.start,
            dt: self.dt,
            remaining: self.steps,
        }
    }
}

impl<'a, F: VectorField> IntoIterator for &'a Trajectory<F> {
    type Item = TrainPair;
    type IntoIter = TrajectoryIter<&'a F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Walks a `Trajectory`, see `Trajectory::iter`.
#[derive(Debug, Clone)]
pub struct TrajectoryIter<F> {
    field: F,
    x: Array1<Real>,
    dt: Real,
    remaining: usize,
}

impl<F: VectorField> Iterator for TrajectoryIter<F> {
    type Item = TrainPair;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let mut next = self.x.clone();
        next.scaled_add(self.dt, &self.field.derivative(self.x.view()));

        let current = std::mem::replace(&mut self.x, next.clone());
        Some((current, next))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<F: VectorField> ExactSizeIterator for TrajectoryIter<F> {}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::{Lorenz, VanDerPol};

    #[test]
    fn pairs_chain_one_step_apart() {
        let field = VanDerPol::new(1.0);
        let dt = 0.1;
        let trajectory = Trajectory::new(field, array![1.0, 0.0], dt, 4).unwrap();

        let pairs: Vec<_> = trajectory.iter().collect();
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[0].0, array![1.0, 0.0]);
        // f(1, 0) = (0, -1)
        assert_eq!(pairs[0].1, array![1.0, -0.1]);

        for window in pairs.windows(2) {
            assert_eq!(window[0].1, window[1].0);
        }
    }

    #[test]
    fn iterating_twice_replays_the_same_pairs() {
        let start = array![1.0, 1.0, 1.0];
        let trajectory = Trajectory::new(Lorenz::default(), start, 0.001, 50).unwrap();

        let first: Vec<_> = trajectory.iter().collect();
        let second: Vec<_> = (&trajectory).into_iter().collect();
        let owned: Vec<_> = trajectory.into_iter().collect();

        assert_eq!(first, second);
        assert_eq!(first, owned);
    }

    #[test]
    fn rejects_mismatched_start_and_bad_step() {
        let err = Trajectory::new(Lorenz::default(), array![1.0, 2.0], 0.01, 3).unwrap_err();
        assert_eq!(err, OdeErr::DimensionMismatch { got: 2, expected: 3 });

        let err = Trajectory::new(VanDerPol::default(), array![1.0, 2.0], 0.0, 3).unwrap_err();
        assert_eq!(err, OdeErr::InvalidStep(0.0));
    }

    #[test]
    fn zero_steps_yield_nothing() {
        let trajectory = Trajectory::new(VanDerPol::default(), array![1.0, 2.0], 0.1, 0).unwrap();
        assert_eq!(trajectory.iter().len(), 0);
    }
}
