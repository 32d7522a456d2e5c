use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire tape_machine crate.
pub type Result<T> = std::result::Result<T, TapeErr>;

/// The tape_machine crate's error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapeErr {
    UnknownCommand(String),
    MissingJump,
    InvalidJump { target: String },
    HeadOutOfBounds { position: usize, step: usize },
}

impl Display for TapeErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapeErr::UnknownCommand(command) => write!(f, "unknown command '{command}'"),
            TapeErr::MissingJump => write!(f, "c_n must be followed by a jump target"),
            TapeErr::InvalidJump { target } => write!(f, "invalid jump target '{target}'"),
            TapeErr::HeadOutOfBounds { position, step } => write!(
                f,
                "the head moved off the tape from cell {position} at step {step}"
            ),
        }
    }
}

impl Error for TapeErr {}
