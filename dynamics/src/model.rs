use ndarray::{Array1, Array2, ArrayView1, Axis, linalg};
use rand::Rng;

use crate::{
    Dims, Real, Result,
    weights::{INIT_SCALE, Weights},
};

/// A continuous-time recurrent model integrated with explicit Euler steps.
///
/// The latent state follows the learned vector field
///
/// ```text
/// dx/dt = m_in·env + b_in + m_latent·x + (m_latent_1·x) ⊙ (m_latent_2·x)
/// ```
///
/// and is read out linearly as `m_through·env + m_out·x + b_out`. The element-wise product is
/// the only nonlinearity of the model.
///
/// The model holds no recurrent state: every call receives the `(env, latent)` pair it operates
/// on and returns the next one. Only the weights, the gradient accumulator and the
/// integration step live here.
///
/// # Panics
/// The per-step methods (`forward`, `time_reverse`, `backward`) panic if the vectors they are
/// given don't match the model's `Dims`. Shapes are validated once, when a trainer is built.
#[derive(Debug, Clone)]
pub struct DynModel {
    w: Weights,
    grad: Weights,
    dt: Real,
}

impl DynModel {
    /// Creates a new `DynModel` with all-zero weights.
    ///
    /// # Arguments
    /// * `dims` - The model's dimensions.
    /// * `dt` - The Euler integration step.
    pub fn new(dims: Dims, dt: Real) -> Self {
        Self::from_weights(Weights::zeros(dims), dt)
    }

    /// Creates a new `DynModel` around existing weights, with a zeroed gradient.
    ///
    /// # Arguments
    /// * `w` - The model's weights.
    /// * `dt` - The Euler integration step.
    pub fn from_weights(w: Weights, dt: Real) -> Self {
        Self {
            grad: w.zeros_like(),
            w,
            dt,
        }
    }

    /// Creates a new `DynModel` with small random weights and a zeroed gradient.
    ///
    /// # Arguments
    /// * `dims` - The model's dimensions.
    /// * `dt` - The Euler integration step.
    /// * `rng` - A random number generator.
    pub fn random<R: Rng + ?Sized>(dims: Dims, dt: Real, rng: &mut R) -> Result<Self> {
        let w = Weights::random(dims, INIT_SCALE, rng)?;
        Ok(Self::from_weights(w, dt))
    }

    pub fn dims(&self) -> Dims {
        self.w.dims()
    }

    pub fn dt(&self) -> Real {
        self.dt
    }

    pub fn set_dt(&mut self, dt: Real) {
        self.dt = dt;
    }

    pub fn weights(&self) -> &Weights {
        &self.w
    }

    /// Gives mutable access to the weights.
    ///
    /// The layout (dims and the presence of the through matrix) must be preserved, the
    /// gradient accumulator mirrors it.
    pub fn weights_mut(&mut self) -> &mut Weights {
        &mut self.w
    }

    pub fn grad(&self) -> &Weights {
        &self.grad
    }

    /// Consumes the model, returning its weights.
    pub fn into_weights(self) -> Weights {
        self.w
    }

    /// The time derivative of the latent state.
    fn dx_dt(&self, env: ArrayView1<Real>, x: ArrayView1<Real>) -> Array1<Real> {
        let w = &self.w;

        let mut dx = w.m_in.dot(&env) + &w.b_in;
        dx += &w.m_latent.dot(&x);
        dx += &(w.m_latent_1.dot(&x) * w.m_latent_2.dot(&x));
        dx
    }

    fn output(&self, env: ArrayView1<Real>, x: ArrayView1<Real>) -> Array1<Real> {
        let w = &self.w;

        let mut out = w.m_out.dot(&x);
        if let Some(m_through) = &w.m_through {
            out = m_through.dot(&env) + out;
        }

        out + &w.b_out
    }

    /// Makes one explicit Euler step forward in time.
    ///
    /// # Arguments
    /// * `env` - The input vector for this step.
    /// * `latent` - The latent state the step starts from.
    ///
    /// # Returns
    /// A tuple with the output for this step and the next latent state.
    pub fn forward(
        &self,
        env: ArrayView1<Real>,
        latent: ArrayView1<Real>,
    ) -> (Array1<Real>, Array1<Real>) {
        let out = self.output(env, latent);
        let mut next = latent.to_owned();
        next.scaled_add(self.dt, &self.dx_dt(env, latent));
        (out, next)
    }

    /// Makes one explicit Euler step backwards in time.
    ///
    /// This is only an approximate inverse of `forward`, the error vanishes as `dt` goes to
    /// zero.
    ///
    /// # Arguments
    /// * `env` - The input vector for this step.
    /// * `latent` - The latent state the step starts from.
    ///
    /// # Returns
    /// A tuple with the output for this step and the previous latent state.
    pub fn time_reverse(
        &self,
        env: ArrayView1<Real>,
        latent: ArrayView1<Real>,
    ) -> (Array1<Real>, Array1<Real>) {
        let out = self.output(env, latent);
        let mut prev = latent.to_owned();
        prev.scaled_add(-self.dt, &self.dx_dt(env, latent));
        (out, prev)
    }

    /// Backpropagates through one `forward` step, **accumulating** the weights' gradient.
    ///
    /// # Arguments
    /// * `env` - The input `forward` was called with.
    /// * `latent` - The latent state `forward` was called with.
    /// * `env_grad` - The loss gradient with respect to the step's output.
    /// * `x_grad` - The loss gradient with respect to the step's next latent state.
    ///
    /// # Returns
    /// A tuple with the loss gradient with respect to `env` and with respect to `latent`.
    pub fn backward(
        &mut self,
        env: ArrayView1<Real>,
        latent: ArrayView1<Real>,
        env_grad: ArrayView1<Real>,
        x_grad: ArrayView1<Real>,
    ) -> (Array1<Real>, Array1<Real>) {
        let dt = self.dt;
        let Self { w, grad, .. } = self;

        let env_row = env.insert_axis(Axis(0));
        let x_row = latent.insert_axis(Axis(0));
        let env_grad_col = env_grad.insert_axis(Axis(1));
        let x_grad_col = x_grad.insert_axis(Axis(1));

        // Readout.
        linalg::general_mat_mul(dt, &env_grad_col, &x_row, 1.0, &mut grad.m_out);
        grad.b_out.scaled_add(dt, &env_grad);
        if let Some(g_through) = &mut grad.m_through {
            linalg::general_mat_mul(dt, &env_grad_col, &env_row, 1.0, g_through);
        }

        // Input and linear recurrence.
        linalg::general_mat_mul(dt, &x_grad_col, &env_row, 1.0, &mut grad.m_in);
        grad.b_in.scaled_add(dt, &x_grad);
        linalg::general_mat_mul(dt, &x_grad_col, &x_row, 1.0, &mut grad.m_latent);

        // Bilinear term, product rule.
        let left = w.m_latent_1.dot(&latent);
        let right = w.m_latent_2.dot(&latent);

        let right_x_grad = (&right * &x_grad).insert_axis(Axis(1));
        let left_x_grad = (&left * &x_grad).insert_axis(Axis(1));
        linalg::general_mat_mul(dt, &right_x_grad, &x_row, 1.0, &mut grad.m_latent_1);
        linalg::general_mat_mul(dt, &left_x_grad, &x_row, 1.0, &mut grad.m_latent_2);

        let jacobian = bilinear_jacobian(&left, &right, &w.m_latent_1, &w.m_latent_2);

        let mut prev_x_grad = &x_grad + &w.m_out.t().dot(&env_grad);
        prev_x_grad.scaled_add(dt, &w.m_latent.t().dot(&x_grad));
        prev_x_grad.scaled_add(dt, &jacobian.t().dot(&x_grad));

        let mut in_grad = w.m_in.t().dot(&x_grad);
        in_grad *= dt;

        (in_grad, prev_x_grad)
    }

    /// Zeroes the gradient accumulator.
    pub fn clear_grad(&mut self) {
        self.grad.zero();
    }

    /// Makes a plain gradient descent step with the accumulated gradient.
    ///
    /// # Arguments
    /// * `learning_rate` - The *length* of the step.
    pub fn step_grad(&mut self, learning_rate: Real) {
        self.w
            .visit_with(&self.grad, |_, mut w, g| w.scaled_add(-learning_rate, &g));
    }
}

/// Jacobian of `(m_1·x) ⊙ (m_2·x)` with respect to `x`, given `left = m_1·x` and
/// `right = m_2·x`: row `i` is `left[i]·m_2[i, ..] + right[i]·m_1[i, ..]`.
fn bilinear_jacobian(
    left: &Array1<Real>,
    right: &Array1<Real>,
    m_1: &Array2<Real>,
    m_2: &Array2<Real>,
) -> Array2<Real> {
    let left = left.view().insert_axis(Axis(1));
    let right = right.view().insert_axis(Axis(1));
    m_2 * &left + m_1 * &right
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn random_model(seed: u64, dt: Real) -> DynModel {
        let mut rng = StdRng::seed_from_u64(seed);
        let w = Weights::random(Dims::new(3, 2, 4), 0.5, &mut rng).unwrap();
        DynModel::from_weights(w, dt)
    }

    #[test]
    fn zero_model_is_a_fixed_point() {
        let model = DynModel::new(Dims::new(2, 2, 3), 0.1);
        let (out, next) = model.forward(array![1.0, -1.0].view(), Array1::zeros(3).view());

        assert_eq!(out, Array1::<Real>::zeros(2));
        assert_eq!(next, Array1::<Real>::zeros(3));
    }

    #[test]
    fn forward_follows_the_euler_update() {
        let mut model = DynModel::new(Dims::new(1, 1, 2), 0.5);
        let w = model.weights_mut();
        w.b_in = array![1.0, 2.0];
        w.m_latent = array![[0.0, 1.0], [0.0, 0.0]];
        w.m_latent_1 = array![[1.0, 0.0], [0.0, 0.0]];
        w.m_latent_2 = array![[1.0, 0.0], [0.0, 0.0]];
        w.m_out = array![[1.0, 1.0]];
        w.b_out = array![0.5];

        let latent = array![2.0, 3.0];
        let (out, next) = model.forward(array![0.0].view(), latent.view());

        // dx = b_in + [3, 0] + [4, 0] = [8, 2]
        assert_eq!(out, array![5.5]);
        assert_eq!(next, array![6.0, 4.0]);
    }

    #[test]
    fn through_matrix_feeds_the_output() {
        let mut model = DynModel::new(Dims::new(2, 1, 1), 0.1);
        model.weights_mut().m_through = Some(array![[2.0, 3.0]]);

        let (out, _) = model.forward(array![1.0, 1.0].view(), array![0.0].view());
        assert_eq!(out, array![5.0]);

        let w = model.into_weights().without_through();
        let model = DynModel::from_weights(w, 0.1);
        let (out, _) = model.forward(array![1.0, 1.0].view(), array![0.0].view());
        assert_eq!(out, array![0.0]);
    }

    #[test]
    fn time_reverse_approximately_undoes_forward() {
        let env = array![0.3, -0.2, 0.1];
        let latent = array![0.5, -0.4, 0.2, 0.1];

        let mut errors = Vec::new();
        for dt in [1e-1, 1e-2, 1e-3] {
            let model = random_model(11, dt);
            let (_, next) = model.forward(env.view(), latent.view());
            let (_, back) = model.time_reverse(env.view(), next.view());
            let err = (&back - &latent).mapv(Real::abs).sum();
            errors.push(err);
        }

        assert!(errors[0] > errors[1] && errors[1] > errors[2], "{errors:?}");
        assert!(errors[2] < 1e-4);
    }

    #[test]
    fn backward_with_zero_downstream_gradient_accumulates_nothing() {
        let mut model = random_model(5, 0.01);
        let env = array![0.3, -0.2, 0.1];
        let latent = array![0.5, -0.4, 0.2, 0.1];

        let (in_grad, x_grad) = model.backward(
            env.view(),
            latent.view(),
            Array1::zeros(2).view(),
            Array1::zeros(4).view(),
        );

        assert!(model.grad().is_zero());
        assert_eq!(in_grad, Array1::<Real>::zeros(3));
        assert_eq!(x_grad, Array1::<Real>::zeros(4));
    }

    #[test]
    fn clear_grad_after_accumulating_leaves_zeros() {
        let mut model = random_model(6, 0.01);
        let env = array![0.3, -0.2, 0.1];
        let latent = array![0.5, -0.4, 0.2, 0.1];

        model.clear_grad();
        for _ in 0..3 {
            model.backward(
                env.view(),
                latent.view(),
                array![1.0, -1.0].view(),
                array![0.1, 0.2, 0.3, 0.4].view(),
            );
        }
        assert!(!model.grad().is_zero());

        model.clear_grad();
        assert!(model.grad().is_zero());
    }

    #[test]
    fn backward_accumulates_instead_of_overwriting() {
        let mut model = random_model(8, 0.01);
        let env = array![0.3, -0.2, 0.1];
        let latent = array![0.5, -0.4, 0.2, 0.1];
        let env_grad = array![1.0, -1.0];
        let x_grad = array![0.1, 0.2, 0.3, 0.4];

        model.backward(env.view(), latent.view(), env_grad.view(), x_grad.view());
        let once = model.grad().clone();
        model.backward(env.view(), latent.view(), env_grad.view(), x_grad.view());

        let mut twice = once.clone();
        twice.visit_with(&once, |_, mut a, b| a += &b);
        assert!(model.grad().max_abs_diff(&twice) < 1e-15);
    }

    #[test]
    fn readout_gradient_is_scaled_by_dt() {
        let dt = 0.25;
        let mut model = DynModel::new(Dims::new(1, 2, 2), dt);
        let latent = array![1.0, 2.0];
        let env_grad = array![3.0, -1.0];

        model.backward(
            array![4.0].view(),
            latent.view(),
            env_grad.view(),
            Array1::zeros(2).view(),
        );

        let expected = array![[3.0, 6.0], [-1.0, -2.0]] * dt;
        assert_eq!(model.grad().m_out, expected);
        assert_eq!(model.grad().b_out, &env_grad * dt);
        assert_eq!(model.grad().m_through, Some(array![[12.0], [-4.0]] * dt));
    }

    #[test]
    fn latent_gradient_propagates_through_the_readout_without_dt() {
        let mut model = DynModel::new(Dims::new(1, 2, 2), 0.1);
        model.weights_mut().m_out = array![[1.0, 2.0], [3.0, 4.0]];

        let (in_grad, prev) = model.backward(
            array![0.0].view(),
            array![0.0, 0.0].view(),
            array![1.0, 1.0].view(),
            array![0.5, 0.5].view(),
        );

        assert_eq!(prev, array![4.5, 6.5]);
        assert_eq!(in_grad, Array1::<Real>::zeros(1));
    }

    #[test]
    fn step_grad_descends_along_the_gradient() {
        let mut model = random_model(9, 0.1);
        let before = model.weights().clone();

        model.backward(
            array![0.3, -0.2, 0.1].view(),
            array![0.5, -0.4, 0.2, 0.1].view(),
            array![1.0, -1.0].view(),
            array![0.1, 0.2, 0.3, 0.4].view(),
        );
        let grad = model.grad().clone();
        model.step_grad(0.5);

        let mut expected = before;
        expected.visit_with(&grad, |_, mut w, g| w.scaled_add(-0.5, &g));
        assert_eq!(model.weights(), &expected);
    }
}
