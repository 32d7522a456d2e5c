use std::num::NonZeroUsize;

use crate::{DynErr, Real, Result};

/// Periodically widens the source's sampling domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Curriculum {
    /// The amount of updates between two calls to `grow_domain`.
    pub epoch: NonZeroUsize,
}

/// The knobs of a `Trainer`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainerConfig {
    pub learning_rate: Real,
    pub curriculum: Option<Curriculum>,
    /// Scan the weights after every update and fail on non-finite values.
    pub check_finite: bool,
}

impl TrainerConfig {
    /// Creates a new `TrainerConfig` with no curriculum and no finiteness check.
    ///
    /// # Arguments
    /// * `learning_rate` - The length of every gradient descent step.
    pub fn new(learning_rate: Real) -> Self {
        Self {
            learning_rate,
            curriculum: None,
            check_finite: false,
        }
    }

    pub fn with_curriculum(mut self, epoch: NonZeroUsize) -> Self {
        self.curriculum = Some(Curriculum { epoch });
        self
    }

    pub fn with_check_finite(mut self, check_finite: bool) -> Self {
        self.check_finite = check_finite;
        self
    }

    pub(super) fn validate(&self) -> Result<()> {
        let lr = self.learning_rate;
        if !lr.is_finite() || lr <= 0.0 {
            let msg = format!("the learning rate must be positive and finite, got {lr}");
            return Err(DynErr::InvalidConfig(msg));
        }

        Ok(())
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self::new(0.01)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learning_rate_must_be_positive_and_finite() {
        assert!(TrainerConfig::new(0.1).validate().is_ok());

        for lr in [0.0, -1.0, Real::NAN, Real::INFINITY] {
            let err = TrainerConfig::new(lr).validate().unwrap_err();
            assert!(matches!(err, DynErr::InvalidConfig(_)), "{lr}");
        }
    }
}
