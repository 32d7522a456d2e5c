use std::fmt::{self, Display};

use ndarray::{Array1, Array2, ArrayD, ArrayViewD, ArrayViewMutD, Zip};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;

use crate::{Dims, Real, Result};

/// The magnitude of the noise a freshly randomized model starts with.
///
/// Small enough for the explicit Euler steps to stay bounded early in training.
pub const INIT_SCALE: Real = 0.02;

/// Identifies a tensor inside a `Weights` container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightName {
    Out,
    OutBias,
    Through,
    In,
    InBias,
    Latent,
    Latent1,
    Latent2,
}

impl WeightName {
    /// Every tensor name in canonical order.
    pub const ALL: [WeightName; 8] = [
        WeightName::Out,
        WeightName::OutBias,
        WeightName::Through,
        WeightName::In,
        WeightName::InBias,
        WeightName::Latent,
        WeightName::Latent1,
        WeightName::Latent2,
    ];

    /// The literal used as section header in checkpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightName::Out => "m_out",
            WeightName::OutBias => "b_out",
            WeightName::Through => "m_through",
            WeightName::In => "m_in",
            WeightName::InBias => "b_in",
            WeightName::Latent => "m_latent",
            WeightName::Latent1 => "m_latent_1",
            WeightName::Latent2 => "m_latent_2",
        }
    }
}

impl Display for WeightName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Every trainable tensor of the dynamical model.
///
/// The same type doubles as the gradient accumulator, since gradients mirror the weights
/// shape by shape. All whole-container operations go through `visit`, which walks the
/// tensors in the canonical order given by `WeightName::ALL`, so randomization, updates and
/// checkpoints always agree on which tensor is which.
#[derive(Debug, Clone, PartialEq)]
pub struct Weights {
    dims: Dims,

    pub m_out: Array2<Real>,
    pub b_out: Array1<Real>,
    pub m_through: Option<Array2<Real>>,

    pub m_in: Array2<Real>,
    pub b_in: Array1<Real>,

    pub m_latent: Array2<Real>,
    pub m_latent_1: Array2<Real>,
    pub m_latent_2: Array2<Real>,
}

impl Weights {
    /// Creates a new all-zeros `Weights`, including the direct input to output matrix.
    ///
    /// # Arguments
    /// * `dims` - The dimensions every tensor is shaped by.
    pub fn zeros(dims: Dims) -> Self {
        let Dims {
            input,
            output,
            latent,
        } = dims;

        Self {
            dims,
            m_out: Array2::zeros((output, latent)),
            b_out: Array1::zeros(output),
            m_through: Some(Array2::zeros((output, input))),
            m_in: Array2::zeros((latent, input)),
            b_in: Array1::zeros(latent),
            m_latent: Array2::zeros((latent, latent)),
            m_latent_1: Array2::zeros((latent, latent)),
            m_latent_2: Array2::zeros((latent, latent)),
        }
    }

    /// Creates a new `Weights` filled with uniform noise in `[-scale, scale]`.
    ///
    /// # Arguments
    /// * `dims` - The dimensions every tensor is shaped by.
    /// * `scale` - The half width of the sampling range.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// An error if `scale` is negative or not finite.
    pub fn random<R: Rng + ?Sized>(dims: Dims, scale: Real, rng: &mut R) -> Result<Self> {
        let mut weights = Self::zeros(dims);
        weights.randomize(scale, rng)?;
        Ok(weights)
    }

    /// Drops the direct input to output matrix.
    pub fn without_through(mut self) -> Self {
        self.m_through = None;
        self
    }

    /// Returns a zeroed container with the same layout as this one.
    pub fn zeros_like(&self) -> Self {
        let zeros = Self::zeros(self.dims);

        match self.m_through {
            Some(_) => zeros,
            None => zeros.without_through(),
        }
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn has_through(&self) -> bool {
        self.m_through.is_some()
    }

    /// Sets every entry of every tensor to zero.
    pub fn zero(&mut self) -> &mut Self {
        self.visit(|_, mut tensor| tensor.fill(0.0));
        self
    }

    /// Refills every tensor with uniform noise in `[-scale, scale]`.
    ///
    /// # Arguments
    /// * `scale` - The half width of the sampling range.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// An error if `scale` is negative or not finite.
    pub fn randomize<R: Rng + ?Sized>(&mut self, scale: Real, rng: &mut R) -> Result<&mut Self> {
        let distribution = Uniform::new_inclusive(-scale, scale)?;

        self.visit(|_, mut tensor| {
            let noise = ArrayD::random_using(tensor.raw_dim(), &distribution, &mut *rng);
            tensor.assign(&noise);
        });

        Ok(self)
    }

    /// Gives read-only views of every tensor, in canonical order.
    pub fn tensors(&self) -> Vec<(WeightName, ArrayViewD<'_, Real>)> {
        let mut tensors = Vec::with_capacity(WeightName::ALL.len());

        tensors.push((WeightName::Out, self.m_out.view().into_dyn()));
        tensors.push((WeightName::OutBias, self.b_out.view().into_dyn()));
        if let Some(m_through) = &self.m_through {
            tensors.push((WeightName::Through, m_through.view().into_dyn()));
        }

        tensors.push((WeightName::In, self.m_in.view().into_dyn()));
        tensors.push((WeightName::InBias, self.b_in.view().into_dyn()));

        tensors.push((WeightName::Latent, self.m_latent.view().into_dyn()));
        tensors.push((WeightName::Latent1, self.m_latent_1.view().into_dyn()));
        tensors.push((WeightName::Latent2, self.m_latent_2.view().into_dyn()));
        tensors
    }

    /// Gives mutable views of every tensor, in canonical order.
    pub fn tensors_mut(&mut self) -> Vec<(WeightName, ArrayViewMutD<'_, Real>)> {
        let mut tensors = Vec::with_capacity(WeightName::ALL.len());

        tensors.push((WeightName::Out, self.m_out.view_mut().into_dyn()));
        tensors.push((WeightName::OutBias, self.b_out.view_mut().into_dyn()));
        if let Some(m_through) = &mut self.m_through {
            tensors.push((WeightName::Through, m_through.view_mut().into_dyn()));
        }

        tensors.push((WeightName::In, self.m_in.view_mut().into_dyn()));
        tensors.push((WeightName::InBias, self.b_in.view_mut().into_dyn()));

        tensors.push((WeightName::Latent, self.m_latent.view_mut().into_dyn()));
        tensors.push((WeightName::Latent1, self.m_latent_1.view_mut().into_dyn()));
        tensors.push((WeightName::Latent2, self.m_latent_2.view_mut().into_dyn()));
        tensors
    }

    /// Applies `f` to every tensor, in canonical order.
    ///
    /// # Arguments
    /// * `f` - The operation to apply, receives the tensor's name and a mutable view of it.
    pub fn visit<F>(&mut self, mut f: F)
    where
        F: FnMut(WeightName, ArrayViewMutD<'_, Real>),
    {
        for (name, tensor) in self.tensors_mut() {
            f(name, tensor);
        }
    }

    /// Applies `f` to every tensor of this container paired with the matching tensor of
    /// `other`, in canonical order.
    ///
    /// # Arguments
    /// * `other` - A container with the same layout as this one.
    /// * `f` - The operation to apply.
    ///
    /// # Panics
    /// If `other` doesn't have the same layout as `self`.
    pub fn visit_with<F>(&mut self, other: &Weights, mut f: F)
    where
        F: FnMut(WeightName, ArrayViewMutD<'_, Real>, ArrayViewD<'_, Real>),
    {
        assert_eq!(self.dims, other.dims, "weight layouts differ");
        assert_eq!(
            self.has_through(),
            other.has_through(),
            "weight layouts differ"
        );

        let paired = other.tensors();
        for ((name, tensor), (_, other_tensor)) in self.tensors_mut().into_iter().zip(paired) {
            f(name, tensor, other_tensor);
        }
    }

    /// Returns whether every entry of every tensor is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.tensors()
            .iter()
            .all(|(_, tensor)| tensor.iter().all(|&x| x == 0.0))
    }

    /// Returns whether every entry of every tensor is finite.
    pub fn is_finite(&self) -> bool {
        self.tensors()
            .iter()
            .all(|(_, tensor)| tensor.iter().all(|x| x.is_finite()))
    }

    /// Returns the total amount of scalars held.
    pub fn len(&self) -> usize {
        self.tensors().iter().map(|(_, tensor)| tensor.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the largest absolute difference between two containers of the same layout.
    pub fn max_abs_diff(&self, other: &Weights) -> Real {
        self.tensors()
            .iter()
            .zip(other.tensors())
            .map(|((_, a), (_, b))| {
                let mut max: Real = 0.0;
                Zip::from(a)
                    .and(&b)
                    .for_each(|x, y| max = max.max((x - y).abs()));
                max
            })
            .fold(0.0, Real::max)
    }
}
