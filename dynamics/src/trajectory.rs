use ndarray::{Array1, ArrayView1};

use crate::Real;

/// One step of a trajectory: the model's input and the output it's expected to produce.
pub type TrainPair = (Array1<Real>, Array1<Real>);

/// A supplier of training episodes.
///
/// Each call to `trajectory` produces a fresh episode, typically a vector field integrated
/// from a random initial condition. An episode must be finite, and iterating it again must
/// replay the same pairs.
pub trait TrajectorySource {
    /// The episode type produced by this source.
    type Trajectory: IntoIterator<Item = TrainPair>;

    /// The size of the inputs this source produces.
    fn input_dim(&self) -> usize;

    /// The size of the expected outputs this source produces.
    fn output_dim(&self) -> usize;

    /// The integration step between consecutive pairs.
    fn dt(&self) -> Real;

    /// Samples a new episode.
    fn trajectory(&mut self) -> Self::Trajectory;

    /// The loss gradient with respect to the prediction, `2·(predicted − expected)·dt`.
    fn gradient(&self, expected: ArrayView1<Real>, predicted: ArrayView1<Real>) -> Array1<Real> {
        (&predicted - &expected) * (2.0 * self.dt())
    }

    /// The squared error between the prediction and the expected output.
    fn error(&self, expected: ArrayView1<Real>, predicted: ArrayView1<Real>) -> Real {
        (&predicted - &expected).mapv(|x| x.powi(2)).sum()
    }

    /// Widens the range initial conditions are sampled from, if the source supports it.
    fn grow_domain(&mut self) {}

    /// The current sampling range for initial conditions, if the source has one.
    fn domain(&self) -> Option<(Real, Real)> {
        None
    }
}

/// A fixed list of pairs replayed on every call, useful for tests and for replaying
/// recorded data.
#[derive(Debug, Clone)]
pub struct Replay {
    pairs: Vec<TrainPair>,
    input_dim: usize,
    output_dim: usize,
    dt: Real,
}

impl Replay {
    /// Creates a new `Replay` source.
    ///
    /// # Arguments
    /// * `pairs` - The pairs every trajectory consists of.
    /// * `input_dim` - The size of every input.
    /// * `output_dim` - The size of every expected output.
    /// * `dt` - The integration step between consecutive pairs.
    ///
    /// # Returns
    /// `None` if any pair doesn't match the given sizes.
    pub fn new(
        pairs: Vec<TrainPair>,
        input_dim: usize,
        output_dim: usize,
        dt: Real,
    ) -> Option<Self> {
        let valid = pairs
            .iter()
            .all(|(x, y)| x.len() == input_dim && y.len() == output_dim);

        valid.then_some(Self {
            pairs,
            input_dim,
            output_dim,
            dt,
        })
    }

    pub fn pairs(&self) -> &[TrainPair] {
        &self.pairs
    }
}

impl TrajectorySource for Replay {
    type Trajectory = Vec<TrainPair>;

    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn output_dim(&self) -> usize {
        self.output_dim
    }

    fn dt(&self) -> Real {
        self.dt
    }

    fn trajectory(&mut self) -> Self::Trajectory {
        self.pairs.clone()
    }
}
