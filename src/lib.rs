//! The `quadratic-dynamics` command line: training, replaying and inspecting dynamics models,
//! and running tape-machine programs.

pub mod commands;
pub mod config;

pub use config::TrainConfig;
