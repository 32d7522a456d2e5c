//! A continuous-time recurrent model with a quadratic latent vector field, trained with
//! hand-derived backpropagation through time.

pub mod checkpoint;
mod dims;
mod error;
mod model;
pub mod training;
pub mod trajectory;
mod weights;

/// The scalar type every tensor is made of.
pub type Real = f64;

pub use dims::Dims;
pub use error::{DynErr, Result};
pub use model::DynModel;
pub use training::{Curriculum, Sample, Trainer, TrainerConfig};
pub use trajectory::{Replay, TrainPair, TrajectorySource};
pub use weights::{INIT_SCALE, WeightName, Weights};
