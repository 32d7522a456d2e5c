use std::fmt::{self, Display};

/// The sizes every tensor of a model is parameterized by.
///
/// Bound once when a model is built and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dims {
    pub input: usize,
    pub output: usize,
    pub latent: usize,
}

impl Dims {
    /// Creates a new `Dims`.
    ///
    /// # Arguments
    /// * `input` - The size of the environment (input) vector.
    /// * `output` - The size of the prediction (output) vector.
    /// * `latent` - The size of the hidden state carried between steps.
    pub fn new(input: usize, output: usize, latent: usize) -> Self {
        Self {
            input,
            output,
            latent,
        }
    }
}

impl Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "input={} output={} latent={}",
            self.input, self.output, self.latent
        )
    }
}
