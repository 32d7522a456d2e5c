use dynamics::{Real, TrajectorySource};
use log::{debug, warn};
use ndarray::Array1;
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;

use crate::{OdeErr, Result, Trajectory, VectorField};

/// The range initial conditions are sampled from before any growth.
pub const DEFAULT_DOMAIN: (Real, Real) = (-0.01, 0.01);

/// How much `grow_domain` widens the domain by.
pub const DEFAULT_GROWTH: Real = 1.5;

/// The upper bound `grow_domain` never grows past.
pub const DEFAULT_CEILING: Real = 4.0;

/// Samples trajectories of a vector field from random initial conditions.
///
/// Every coordinate of the start point is drawn uniformly from the current domain, which
/// starts tiny and can be widened step by step as training progresses.
pub struct DataGenerator<F, R> {
    field: F,
    dt: Real,
    steps: usize,
    rng: R,

    domain: (Real, Real),
    distribution: Uniform<Real>,
    growth: Real,
    ceiling: Real,
}

impl<F: VectorField + Clone, R: Rng> DataGenerator<F, R> {
    /// Creates a new `DataGenerator` with the default domain and growth.
    ///
    /// # Arguments
    /// * `field` - The vector field trajectories follow.
    /// * `dt` - The integration step.
    /// * `steps` - The length of every trajectory.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// An error if `dt` isn't positive and finite.
    pub fn new(field: F, dt: Real, steps: usize, rng: R) -> Result<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(OdeErr::InvalidStep(dt));
        }

        let (low, high) = DEFAULT_DOMAIN;
        Ok(Self {
            field,
            dt,
            steps,
            rng,
            domain: DEFAULT_DOMAIN,
            distribution: uniform(low, high)?,
            growth: DEFAULT_GROWTH,
            ceiling: DEFAULT_CEILING,
        })
    }

    /// Replaces the sampling domain.
    ///
    /// # Returns
    /// An error if the range is empty or not finite.
    pub fn with_domain(mut self, low: Real, high: Real) -> Result<Self> {
        self.distribution = uniform(low, high)?;
        self.domain = (low, high);
        Ok(self)
    }

    /// Replaces the growth schedule of the domain.
    ///
    /// # Arguments
    /// * `factor` - What both bounds are multiplied by on every growth, must exceed 1.
    /// * `ceiling` - The bound growth stops at.
    pub fn with_growth(mut self, factor: Real, ceiling: Real) -> Result<Self> {
        let valid = factor.is_finite() && factor > 1.0 && ceiling.is_finite() && ceiling > 0.0;
        if !valid {
            return Err(OdeErr::InvalidGrowth { factor, ceiling });
        }

        self.growth = factor;
        self.ceiling = ceiling;
        Ok(self)
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Samples a start point from the current domain.
    pub fn sample_start(&mut self) -> Array1<Real> {
        Array1::random_using(self.field.dim(), &self.distribution, &mut self.rng)
    }
}

impl<F: VectorField + Clone, R: Rng> TrajectorySource for DataGenerator<F, R> {
    type Trajectory = Trajectory<F>;

    fn input_dim(&self) -> usize {
        self.field.dim()
    }

    fn output_dim(&self) -> usize {
        self.field.dim()
    }

    fn dt(&self) -> Real {
        self.dt
    }

    fn trajectory(&mut self) -> Self::Trajectory {
        let start = self.sample_start();
        Trajectory::from_parts(self.field.clone(), start, self.dt, self.steps)
    }

    fn grow_domain(&mut self) {
        let domain = self.domain;
        let high = (domain.1 * self.growth).min(self.ceiling);
        let low = (domain.0 * self.growth).max(-self.ceiling);

        // Saturated at the ceiling, or a zero bound that scaling can't move.
        if (low, high) == domain {
            return;
        }

        match uniform(low, high) {
            Ok(distribution) => {
                self.distribution = distribution;
                self.domain = (low, high);
                debug!(low = low, high = high; "domain grown");
            }
            Err(e) => warn!("skipped domain growth: {e}"),
        }
    }

    fn domain(&self) -> Option<(Real, Real)> {
        Some(self.domain)
    }
}

fn uniform(low: Real, high: Real) -> Result<Uniform<Real>> {
    Uniform::new_inclusive(low, high).map_err(|_| OdeErr::InvalidDomain { low, high })
}
