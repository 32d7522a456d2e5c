//! Training data for the dynamics model: classic vector fields integrated with explicit Euler
//! steps from random initial conditions.

mod error;
mod field;
mod generator;
mod trajectory;

pub use error::{OdeErr, Result};
pub use field::{Field, Lorenz, VanDerPol, VectorField};
pub use generator::{DEFAULT_CEILING, DEFAULT_DOMAIN, DEFAULT_GROWTH, DataGenerator};
pub use trajectory::{Trajectory, TrajectoryIter};
