mod config;
mod sample;
mod trainer;

pub use config::{Curriculum, TrainerConfig};
pub use sample::Sample;
pub use trainer::Trainer;
