use std::fs;

use anyhow::{Context, Result, bail};
use dynamics::{
    Dims, DynModel, Real, Trainer, TrainerConfig, TrajectorySource, Weights, checkpoint,
};
use log::info;
use ode::{DataGenerator, Field, VectorField};
use rand::{SeedableRng, rngs::StdRng};

use crate::config::TrainConfig;

/// What a finished training run reports.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOutcome {
    pub updates: usize,
    /// The mean error over the updates since the last report.
    pub mean_error: Real,
}

/// Trains a model as described by `config`.
///
/// Runs until `config.max_updates` updates have been made, forever if unset, logging the mean
/// error every `report_every` updates and saving a checkpoint every `checkpoint_every`.
pub fn run(config: &TrainConfig) -> Result<TrainOutcome> {
    if config.max_updates == Some(0) {
        bail!("max_updates is 0, nothing to train");
    }

    let mut rng = generate_rng(config.seed);

    let field = Field::from(config.field);
    let dim = field.dim();
    let dims = Dims::new(dim, dim, config.latent_dim);

    let weights = match &config.resume {
        Some(path) => {
            let weights = checkpoint::load(path)
                .with_context(|| format!("cannot resume from '{}'", path.display()))?;

            if weights.dims() != dims || weights.has_through() != config.through {
                bail!(
                    "'{}' holds {} (through: {}), expected {dims} (through: {})",
                    path.display(),
                    weights.dims(),
                    weights.has_through(),
                    config.through
                );
            }
            info!(path:? = path, dims:% = weights.dims(); "resumed from checkpoint");
            weights
        }
        None => {
            let weights = Weights::random(dims, config.init_scale, &mut rng)?;
            if config.through {
                weights
            } else {
                weights.without_through()
            }
        }
    };

    let data_rng = StdRng::from_rng(&mut rng);
    let mut source = DataGenerator::new(field, config.dt, config.steps, data_rng)?
        .with_domain(config.domain.0, config.domain.1)?;

    let mut trainer_config =
        TrainerConfig::new(config.learning_rate).with_check_finite(config.check_finite);

    if let Some(curriculum) = config.curriculum {
        source = source.with_growth(curriculum.growth, curriculum.ceiling)?;
        trainer_config = trainer_config.with_curriculum(curriculum.epoch);
    }

    let model = DynModel::from_weights(weights, config.dt);
    let mut trainer = Trainer::new(model, source, trainer_config)?;

    if let Some(every) = config.checkpoint_every {
        fs::create_dir_all(&config.checkpoint_dir).with_context(|| {
            format!(
                "cannot create checkpoint dir '{}'",
                config.checkpoint_dir.display()
            )
        })?;
        info!(every = every.get(); "checkpointing to {}", config.checkpoint_dir.display());
    }

    info!(
        field = field.name(),
        dims:% = trainer.model().dims(),
        domain:? = trainer.source().domain();
        "training started"
    );

    let report_every = config.report_every.get();
    let mut sum = 0.0;
    let mut since_report = 0;
    let mut mean_error = Real::NAN;

    let mut i = 0;
    while config.max_updates.is_none_or(|max| i < max) {
        sum += trainer.update_model()?;
        since_report += 1;

        if i != 0 && i % report_every == 0 {
            mean_error = sum / since_report as Real;
            info!(update = i; "mean error {mean_error}");
            sum = 0.0;
            since_report = 0;
        }

        if let Some(every) = config.checkpoint_every {
            if i != 0 && i % every.get() == 0 {
                let path = config.checkpoint_dir.join(format!("model_save_{i}.txt"));
                checkpoint::save(trainer.model().weights(), &path)?;
            }
        }

        i += 1;
    }

    if since_report > 0 {
        mean_error = sum / since_report as Real;
    }

    let path = config.checkpoint_dir.join("model_final.txt");
    fs::create_dir_all(&config.checkpoint_dir)?;
    checkpoint::save(trainer.model().weights(), &path)?;
    info!(updates = i; "training finished, mean error {mean_error}");

    Ok(TrainOutcome {
        updates: i,
        mean_error,
    })
}

fn generate_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
