use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use dynamics::{INIT_SCALE, Real};
use ode::{DEFAULT_CEILING, DEFAULT_DOMAIN, DEFAULT_GROWTH, Field, Lorenz, VanDerPol};
use serde::{Deserialize, Serialize};

/// The vector field training trajectories are sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSpec {
    Lorenz {
        #[serde(default = "default_sigma")]
        sigma: Real,
        #[serde(default = "default_rho")]
        rho: Real,
        #[serde(default = "default_beta")]
        beta: Real,
    },
    VanDerPol {
        mu: Real,
    },
}

impl From<FieldSpec> for Field {
    fn from(value: FieldSpec) -> Self {
        match value {
            FieldSpec::Lorenz { sigma, rho, beta } => Lorenz::new(sigma, rho, beta).into(),
            FieldSpec::VanDerPol { mu } => VanDerPol::new(mu).into(),
        }
    }
}

/// Periodic widening of the initial condition domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CurriculumSpec {
    pub epoch: NonZeroUsize,
    #[serde(default = "default_growth")]
    pub growth: Real,
    #[serde(default = "default_ceiling")]
    pub ceiling: Real,
}

/// The configuration of a `train` run, read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TrainConfig {
    pub field: FieldSpec,
    pub dt: Real,
    pub steps: usize,
    pub latent_dim: usize,

    #[serde(default = "default_learning_rate")]
    pub learning_rate: Real,
    #[serde(default = "default_init_scale")]
    pub init_scale: Real,
    #[serde(default = "default_true")]
    pub through: bool,
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_report_every")]
    pub report_every: NonZeroUsize,
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: Option<NonZeroUsize>,
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
    #[serde(default)]
    pub resume: Option<PathBuf>,
    #[serde(default)]
    pub max_updates: Option<usize>,

    #[serde(default = "default_domain")]
    pub domain: (Real, Real),
    #[serde(default)]
    pub curriculum: Option<CurriculumSpec>,
    #[serde(default)]
    pub check_finite: bool,
}

impl TrainConfig {
    /// Reads and validates a configuration file.
    ///
    /// # Arguments
    /// * `path` - The path of the JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read config '{}'", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid config '{}'", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the values serde can't.
    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            bail!("dt must be positive and finite, got {}", self.dt);
        }
        if self.steps == 0 {
            bail!("steps must be at least 1");
        }
        if self.latent_dim == 0 {
            bail!("latent_dim must be at least 1");
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            bail!(
                "learning_rate must be positive and finite, got {}",
                self.learning_rate
            );
        }
        if !self.init_scale.is_finite() || self.init_scale < 0.0 {
            bail!(
                "init_scale must be non-negative and finite, got {}",
                self.init_scale
            );
        }

        let (low, high) = self.domain;
        if !(low.is_finite() && high.is_finite() && low <= high) {
            bail!("invalid domain [{low}, {high}]");
        }

        if let Some(curriculum) = &self.curriculum {
            if !(curriculum.growth.is_finite() && curriculum.growth > 1.0) {
                bail!("curriculum growth must exceed 1, got {}", curriculum.growth);
            }
            if !(curriculum.ceiling.is_finite() && curriculum.ceiling > 0.0) {
                bail!(
                    "curriculum ceiling must be positive, got {}",
                    curriculum.ceiling
                );
            }
        }

        Ok(())
    }
}

fn default_sigma() -> Real {
    10.0
}

fn default_rho() -> Real {
    28.0
}

fn default_beta() -> Real {
    8.0 / 3.0
}

fn default_growth() -> Real {
    DEFAULT_GROWTH
}

fn default_ceiling() -> Real {
    DEFAULT_CEILING
}

fn default_learning_rate() -> Real {
    0.01
}

fn default_init_scale() -> Real {
    INIT_SCALE
}

fn default_true() -> bool {
    true
}

fn default_report_every() -> NonZeroUsize {
    NonZeroUsize::new(100).unwrap_or(NonZeroUsize::MIN)
}

fn default_checkpoint_every() -> Option<NonZeroUsize> {
    NonZeroUsize::new(6000)
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("check_pt")
}

fn default_domain() -> (Real, Real) {
    DEFAULT_DOMAIN
}
