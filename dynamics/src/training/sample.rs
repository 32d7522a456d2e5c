use ndarray::Array1;

use crate::Real;

/// What the forward sweep records for each step, consumed by the backward sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// The time the step started at.
    pub t: Real,
    pub input: Array1<Real>,
    /// The loss gradient with respect to the step's output.
    pub gradient: Array1<Real>,
    /// The latent state the step started from.
    pub latent: Array1<Real>,
}
