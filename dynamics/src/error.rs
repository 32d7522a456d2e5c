use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used in the entire dynamics crate.
pub type Result<T> = std::result::Result<T, DynErr>;

/// The dynamics crate's error type.
#[derive(Debug)]
pub enum DynErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidConfig(String),
    Instability {
        update: usize,
    },
    SectionMismatch {
        expected: &'static str,
        got: String,
    },
    MalformedSection {
        tensor: &'static str,
        reason: String,
    },
    UnexpectedEof {
        expected: &'static str,
    },
    Io(io::Error),
}

impl Display for DynErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch for {what}, got {got} and expected {expected}"
            ),
            DynErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            DynErr::Instability { update } => write!(
                f,
                "the weights diverged to non-finite values at update {update}, \
                 consider lowering the learning rate or dt"
            ),
            DynErr::SectionMismatch { expected, got } => write!(
                f,
                "checkpoint section mismatch: expected header '{expected}', got '{got}'"
            ),
            DynErr::MalformedSection { tensor, reason } => {
                write!(f, "malformed checkpoint section '{tensor}': {reason}")
            }
            DynErr::UnexpectedEof { expected } => write!(
                f,
                "checkpoint ended before section '{expected}' was complete"
            ),
            DynErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for DynErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DynErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DynErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rand_distr::uniform::Error> for DynErr {
    fn from(value: rand_distr::uniform::Error) -> Self {
        Self::InvalidConfig(value.to_string())
    }
}
