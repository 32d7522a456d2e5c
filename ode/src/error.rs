use std::{
    error::Error,
    fmt::{self, Display},
};

use dynamics::Real;

/// The result type used in the entire ode crate.
pub type Result<T> = std::result::Result<T, OdeErr>;

/// The ode crate's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum OdeErr {
    InvalidStep(Real),
    InvalidDomain { low: Real, high: Real },
    InvalidGrowth { factor: Real, ceiling: Real },
    DimensionMismatch { got: usize, expected: usize },
}

impl Display for OdeErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OdeErr::InvalidStep(dt) => {
                write!(
                    f,
                    "the integration step must be positive and finite, got {dt}"
                )
            }
            OdeErr::InvalidDomain { low, high } => {
                write!(f, "invalid sampling domain [{low}, {high}]")
            }
            OdeErr::InvalidGrowth { factor, ceiling } => write!(
                f,
                "invalid domain growth: factor {factor} must be greater than 1 and ceiling \
                 {ceiling} must be positive"
            ),
            OdeErr::DimensionMismatch { got, expected } => write!(
                f,
                "the start point has {got} coordinates but the field has {expected}"
            ),
        }
    }
}

impl Error for OdeErr {}
