use dynamics::Real;
use ndarray::{Array1, ArrayView1, array};

/// An autonomous vector field `dx/dt = f(x)`.
pub trait VectorField {
    /// The amount of coordinates of a point.
    fn dim(&self) -> usize;

    /// Evaluates `f(x)`.
    ///
    /// # Panics
    /// If `x` doesn't have `dim` coordinates.
    fn derivative(&self, x: ArrayView1<Real>) -> Array1<Real>;
}

impl<F: VectorField + ?Sized> VectorField for &F {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn derivative(&self, x: ArrayView1<Real>) -> Array1<Real> {
        (**self).derivative(x)
    }
}

/// The Lorenz system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lorenz {
    pub sigma: Real,
    pub rho: Real,
    pub beta: Real,
}

impl Lorenz {
    pub fn new(sigma: Real, rho: Real, beta: Real) -> Self {
        Self { sigma, rho, beta }
    }
}

impl Default for Lorenz {
    /// The classic chaotic parameters.
    fn default() -> Self {
        Self::new(10.0, 28.0, 8.0 / 3.0)
    }
}

impl VectorField for Lorenz {
    fn dim(&self) -> usize {
        3
    }

    fn derivative(&self, x: ArrayView1<Real>) -> Array1<Real> {
        let Self { sigma, rho, beta } = *self;

        array![
            sigma * (x[1] - x[0]),
            x[0] * (rho - x[2]) - x[1],
            x[0] * x[1] - beta * x[2],
        ]
    }
}

/// The Van der Pol oscillator, in position and velocity coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VanDerPol {
    /// Nonlinearity and damping strength.
    pub mu: Real,
}

impl VanDerPol {
    pub fn new(mu: Real) -> Self {
        Self { mu }
    }
}

impl Default for VanDerPol {
    fn default() -> Self {
        Self::new(1.5)
    }
}

impl VectorField for VanDerPol {
    fn dim(&self) -> usize {
        2
    }

    fn derivative(&self, x: ArrayView1<Real>) -> Array1<Real> {
        let (pos, vel) = (x[0], x[1]);
        array![vel, self.mu * (1.0 - pos * pos) * vel - pos]
    }
}

/// Any of the known vector fields, chosen at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    Lorenz(Lorenz),
    VanDerPol(VanDerPol),
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Lorenz(_) => "lorenz",
            Field::VanDerPol(_) => "van_der_pol",
        }
    }
}

impl VectorField for Field {
    fn dim(&self) -> usize {
        match self {
            Field::Lorenz(f) => f.dim(),
            Field::VanDerPol(f) => f.dim(),
        }
    }

    fn derivative(&self, x: ArrayView1<Real>) -> Array1<Real> {
        match self {
            Field::Lorenz(f) => f.derivative(x),
            Field::VanDerPol(f) => f.derivative(x),
        }
    }
}

impl From<Lorenz> for Field {
    fn from(value: Lorenz) -> Self {
        Self::Lorenz(value)
    }
}

impl From<VanDerPol> for Field {
    fn from(value: VanDerPol) -> Self {
        Self::VanDerPol(value)
    }
}
