use log::{debug, info, warn};
use ndarray::Array1;

use super::{Sample, TrainerConfig};
use crate::{DynErr, DynModel, Real, Result, TrajectorySource};

/// Trains a `DynModel` with full backpropagation through time, one trajectory per update.
pub struct Trainer<S: TrajectorySource> {
    model: DynModel,
    source: S,
    config: TrainerConfig,
    history: Vec<Sample>,
    updates: usize,
}

impl<S: TrajectorySource> Trainer<S> {
    /// Creates a new `Trainer`.
    ///
    /// The model's integration step is overwritten with the source's.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained.
    /// * `source` - The supplier of training trajectories.
    /// * `config` - The trainer's configuration.
    ///
    /// # Returns
    /// A new trainer or an error if the model and source sizes disagree or the config is invalid.
    pub fn new(mut model: DynModel, source: S, config: TrainerConfig) -> Result<Self> {
        let dims = model.dims();

        if dims.input != source.input_dim() {
            return Err(DynErr::SizeMismatch {
                what: "input dimension",
                got: source.input_dim(),
                expected: dims.input,
            });
        }

        if dims.output != source.output_dim() {
            return Err(DynErr::SizeMismatch {
                what: "output dimension",
                got: source.output_dim(),
                expected: dims.output,
            });
        }

        config.validate()?;
        model.set_dt(source.dt());

        debug!(dims:% = dims, dt = source.dt(); "built trainer");

        Ok(Self {
            model,
            source,
            config,
            history: Vec::new(),
            updates: 0,
        })
    }

    pub fn model(&self) -> &DynModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut DynModel {
        &mut self.model
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// The amount of samples currently recorded, zero between updates.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// The amount of completed `update_model` calls.
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Consumes the trainer, returning its model.
    pub fn into_model(self) -> DynModel {
        self.model
    }

    /// Trains the model on one fresh trajectory and makes one gradient descent step.
    ///
    /// # Returns
    /// The summed squared error over the trajectory, measured before the step.
    pub fn update_model(&mut self) -> Result<Real> {
        let error = self.accumulate()?;
        self.apply_update();

        self.updates += 1;
        debug!(update = self.updates, error = error; "model updated");

        if let Some(curriculum) = self.config.curriculum {
            if self.updates % curriculum.epoch.get() == 0 {
                self.grow_domain();
            }
        }

        if self.config.check_finite && !self.model.weights().is_finite() {
            warn!(update = self.updates; "weights diverged to non-finite values");
            return Err(DynErr::Instability {
                update: self.updates,
            });
        }

        Ok(error)
    }

    /// Runs one trajectory forward and backward, **accumulating** its gradient in the model.
    ///
    /// The weights are left untouched, so several trajectories may be accumulated before a
    /// single `apply_update`.
    ///
    /// # Returns
    /// The summed squared error over the trajectory.
    pub fn accumulate(&mut self) -> Result<Real> {
        let dims = self.model.dims();
        let dt = self.model.dt();

        let mut latent = Array1::zeros(dims.latent);
        let mut error = 0.0;
        let mut t = 0.0;

        for (input, expected) in self.source.trajectory() {
            if input.len() != dims.input {
                self.history.clear();
                return Err(DynErr::SizeMismatch {
                    what: "trajectory input",
                    got: input.len(),
                    expected: dims.input,
                });
            }

            if expected.len() != dims.output {
                self.history.clear();
                return Err(DynErr::SizeMismatch {
                    what: "trajectory expected output",
                    got: expected.len(),
                    expected: dims.output,
                });
            }

            let (prediction, next) = self.model.forward(input.view(), latent.view());
            let gradient = self.source.gradient(expected.view(), prediction.view());
            error += self.source.error(expected.view(), prediction.view());

            self.history.push(Sample {
                t,
                input,
                gradient,
                latent,
            });

            latent = next;
            t += dt;
        }

        let mut x_grad = Array1::zeros(dims.latent);
        for sample in self.history.iter().rev() {
            let (_, prev_x_grad) = self.model.backward(
                sample.input.view(),
                sample.latent.view(),
                sample.gradient.view(),
                x_grad.view(),
            );
            x_grad = prev_x_grad;
        }

        self.history.clear();
        Ok(error)
    }

    fn grow_domain(&mut self) {
        let before = self.source.domain();
        self.source.grow_domain();

        match self.source.domain() {
            Some((low, high)) if Some((low, high)) != before => {
                info!(update = self.updates; "grew sampling domain to [{low}, {high}]");
            }
            _ => {}
        }
    }

    /// Steps the weights along the accumulated gradient and clears it.
    pub fn apply_update(&mut self) {
        self.model.step_grad(self.config.learning_rate);
        self.model.clear_grad();
        self.history.clear();
    }
}
