//! Run configuration, validation and the named presets
use crate::distributions::DistributionSpec;
use crate::dnn::OutputActivation;
use crate::error::ConfigError;
use crate::loss::Objective;
use crate::GanFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Layer widths (input, hidden..., output) and the terminal activation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkSpec {
    pub widths: Vec<usize>,
    #[serde(default)]
    pub output: OutputActivation,
}

impl NetworkSpec {
    pub fn new(widths: &[usize], output: OutputActivation) -> Self {
        Self {
            widths: widths.to_vec(),
            output,
        }
    }

    /// # Errors
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.widths.len() < 2 {
            return Err(ConfigError::NetworkTooShallow(self.widths.len()));
        }
        if let Some(idx) = self.widths.iter().position(|&w| w == 0) {
            return Err(ConfigError::ZeroWidth(idx));
        }
        Ok(())
    }

    /// # Panics
    /// On an empty spec
    pub fn input_dim(&self) -> usize {
        self.widths[0]
    }

    /// # Panics
    /// On an empty spec
    pub fn output_dim(&self) -> usize {
        self.widths[self.widths.len() - 1]
    }
}

/// Noise fed to the generator when a diagnostic snapshot is taken.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvalNoise {
    /// Fixed evenly spaced 1D batch
    Linspace {
        low: GanFloat,
        high: GanFloat,
        count: usize,
    },
    /// Fresh draw from the noise distribution at each capture
    Sampled { count: usize },
}

impl EvalNoise {
    pub fn count(&self) -> usize {
        match self {
            Self::Linspace { count, .. } | Self::Sampled { count } => *count,
        }
    }
}

/// What a diagnostic snapshot records.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryKind {
    /// Generated points, rounded to two decimals
    Samples,
    /// Empirical mean and covariance (with principal axes for 2D outputs)
    MeanCovariance,
    /// Normalised 2D histogram over `[-range, range)²` with cell size `quant`
    Histogram { range: GanFloat, quant: GanFloat },
}

fn default_seed() -> u64 {
    0
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TrainingConfig {
    pub source: DistributionSpec,
    pub noise: DistributionSpec,
    pub generator: NetworkSpec,
    pub critic: NetworkSpec,
    pub objective: Objective,
    pub critic_steps: usize,
    /// Critic-only steps run once before the first iteration
    #[serde(default)]
    pub critic_warmup: usize,
    pub num_iters: usize,
    pub batch_size: usize,
    pub learning_rate: GanFloat,
    #[serde(default)]
    pub clip: Option<GanFloat>,
    #[serde(default)]
    pub halve_lr_every: Option<usize>,
    #[serde(default)]
    pub capture_every: Option<usize>,
    pub eval_noise: EvalNoise,
    pub summary: SummaryKind,
    #[serde(default)]
    pub log_every: Option<usize>,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn positive(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::InvalidParameter {
            name,
            reason: "must be positive".to_string(),
        })
    } else {
        Ok(())
    }
}

fn positive_float(name: &'static str, value: GanFloat) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0. {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{} must be finite and positive", value),
        })
    }
}

fn same_dim(what: &'static str, expected: usize, found: usize) -> Result<(), ConfigError> {
    if expected == found {
        Ok(())
    } else {
        Err(ConfigError::DimensionMismatch {
            what,
            expected,
            found,
        })
    }
}

impl TrainingConfig {
    /// # Errors
    /// If the file cannot be read, is not valid JSON, or fails [`TrainingConfig::validate`].
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::InvalidParameter {
            name: "config",
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json_str(&text)
    }

    /// # Errors
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::InvalidParameter {
                name: "config",
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks that do not need to build anything. Distribution
    /// parameters (e.g. covariance definiteness) are checked when the
    /// distributions are built.
    ///
    /// # Errors
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("critic_steps", self.critic_steps)?;
        positive("num_iters", self.num_iters)?;
        positive("batch_size", self.batch_size)?;
        positive_float("learning_rate", self.learning_rate)?;
        if let Some(clip) = self.clip {
            positive_float("clip", clip)?;
        }
        if let Some(every) = self.halve_lr_every {
            positive("halve_lr_every", every)?;
        }
        if let Some(every) = self.capture_every {
            positive("capture_every", every)?;
        }
        if let Some(every) = self.log_every {
            positive("log_every", every)?;
        }
        positive("eval_noise.count", self.eval_noise.count())?;
        match self.summary {
            SummaryKind::Samples => {}
            SummaryKind::MeanCovariance => {
                if self.eval_noise.count() < 2 {
                    return Err(ConfigError::InvalidParameter {
                        name: "eval_noise.count",
                        reason: "a covariance summary needs at least 2 samples".to_string(),
                    });
                }
            }
            SummaryKind::Histogram { range, quant } => {
                positive_float("summary.range", range)?;
                positive_float("summary.quant", quant)?;
                same_dim("histogram samples", 2, self.source.dim())?;
            }
        }

        self.generator.validate()?;
        self.critic.validate()?;
        same_dim(
            "generator input",
            self.noise.dim(),
            self.generator.input_dim(),
        )?;
        same_dim(
            "generator output",
            self.source.dim(),
            self.generator.output_dim(),
        )?;
        same_dim("critic input", self.source.dim(), self.critic.input_dim())?;
        same_dim("critic output", 1, self.critic.output_dim())?;
        self.objective.check_critic(self.critic.output)?;
        if self.objective.clips_critic() && self.clip.is_none() {
            return Err(ConfigError::InvalidParameter {
                name: "clip",
                reason: "the wasserstein objective needs a clip bound".to_string(),
            });
        }
        if let EvalNoise::Linspace { low, high, .. } = self.eval_noise {
            same_dim("linspace noise", 1, self.noise.dim())?;
            if !(low.is_finite() && high.is_finite()) || low > high {
                return Err(ConfigError::InvalidBounds { low, high });
            }
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> String {
        // the config only holds plain data, serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Named configurations of the 2D GAN and WGAN experiments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    /// Classic GAN, 2D Gaussian noise to a correlated 2D Gaussian
    GanGaussian2d,
    /// Classic GAN, 1D noise to a diagonal line
    GanLine,
    /// Classic GAN, 1D noise to the horizontal line `y = 20`
    GanHorizontalLine,
    /// WGAN, 1D noise to a correlated 2D Gaussian
    WganGaussian,
    /// WGAN, 1D noise to a diagonal line, with learning-rate halving
    WganLine,
    /// WGAN, 1D noise to the cubic curve `y = (x - 6)³ + 4`
    WganCurve,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::GanGaussian2d,
        Preset::GanLine,
        Preset::GanHorizontalLine,
        Preset::WganGaussian,
        Preset::WganLine,
        Preset::WganCurve,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::GanGaussian2d => "gan-gaussian-2d",
            Self::GanLine => "gan-line",
            Self::GanHorizontalLine => "gan-horizontal-line",
            Self::WganGaussian => "wgan-gaussian",
            Self::WganLine => "wgan-line",
            Self::WganCurve => "wgan-curve",
        }
    }

    pub fn config(self) -> TrainingConfig {
        let diagonal_line = DistributionSpec::LineGaussian {
            mean: vec![2., 2.],
            spread: 2.,
            direction: vec![1., -1.],
        };
        match self {
            Self::GanGaussian2d => TrainingConfig {
                source: DistributionSpec::Gaussian {
                    mean: vec![4., 4.],
                    covariance: vec![vec![0.5, 0.1], vec![0.1, 0.2]],
                },
                noise: DistributionSpec::standard_normal(2),
                generator: NetworkSpec::new(&[2, 128, 128, 128, 2], OutputActivation::Identity),
                critic: NetworkSpec::new(&[2, 512, 512, 512, 1], OutputActivation::Sigmoid),
                objective: Objective::Classic,
                critic_steps: 20,
                critic_warmup: 0,
                num_iters: 1500,
                batch_size: 64,
                learning_rate: 0.00005,
                clip: None,
                halve_lr_every: None,
                capture_every: Some(2),
                eval_noise: EvalNoise::Sampled { count: 5000 },
                summary: SummaryKind::MeanCovariance,
                log_every: Some(1),
                seed: 0,
            },
            Self::GanLine => TrainingConfig {
                source: diagonal_line,
                noise: DistributionSpec::standard_normal(1),
                generator: NetworkSpec::new(&[1, 32, 32, 32, 2], OutputActivation::Identity),
                critic: NetworkSpec::new(&[2, 32, 32, 32, 1], OutputActivation::Sigmoid),
                objective: Objective::Classic,
                critic_steps: 100,
                critic_warmup: 100,
                num_iters: 10000,
                batch_size: 64,
                learning_rate: 0.00005,
                clip: None,
                halve_lr_every: None,
                capture_every: Some(20),
                eval_noise: EvalNoise::Sampled { count: 50 },
                summary: SummaryKind::Samples,
                log_every: Some(1),
                seed: 0,
            },
            Self::GanHorizontalLine => TrainingConfig {
                source: DistributionSpec::LineGaussian {
                    mean: vec![0., 20.],
                    spread: 1.,
                    direction: vec![1., 0.],
                },
                noise: DistributionSpec::standard_normal(1),
                generator: NetworkSpec::new(&[1, 128, 128, 128, 2], OutputActivation::Identity),
                critic: NetworkSpec::new(&[2, 512, 512, 512, 1], OutputActivation::Sigmoid),
                objective: Objective::Classic,
                critic_steps: 1,
                critic_warmup: 0,
                num_iters: 10000,
                batch_size: 64,
                learning_rate: 0.00005,
                clip: None,
                halve_lr_every: None,
                capture_every: Some(100),
                eval_noise: EvalNoise::Sampled { count: 64 },
                summary: SummaryKind::Samples,
                log_every: Some(1),
                seed: 0,
            },
            Self::WganGaussian => TrainingConfig {
                source: DistributionSpec::Gaussian {
                    mean: vec![0.1, 0.5],
                    covariance: vec![vec![0.7, 0.3], vec![0.3, 0.4]],
                },
                noise: DistributionSpec::standard_normal(1),
                generator: NetworkSpec::new(&[1, 128, 128, 128, 2], OutputActivation::Identity),
                critic: NetworkSpec::new(&[2, 128, 128, 128, 1], OutputActivation::Identity),
                objective: Objective::Wasserstein,
                critic_steps: 5,
                critic_warmup: 0,
                num_iters: 10000,
                batch_size: 64,
                learning_rate: 0.00005,
                clip: Some(0.01),
                halve_lr_every: None,
                capture_every: Some(1),
                eval_noise: EvalNoise::Sampled { count: 10000 },
                summary: SummaryKind::Histogram {
                    range: 0.2,
                    quant: 0.001,
                },
                log_every: Some(1),
                seed: 0,
            },
            Self::WganLine => TrainingConfig {
                source: diagonal_line,
                noise: DistributionSpec::standard_normal(1),
                generator: NetworkSpec::new(&[1, 32, 32, 32, 2], OutputActivation::Identity),
                critic: NetworkSpec::new(&[2, 32, 32, 32, 1], OutputActivation::Identity),
                objective: Objective::Wasserstein,
                critic_steps: 100,
                critic_warmup: 0,
                num_iters: 10000,
                batch_size: 64,
                learning_rate: 0.0005,
                clip: Some(0.01),
                halve_lr_every: Some(20000),
                capture_every: Some(20),
                eval_noise: EvalNoise::Linspace {
                    low: -2.,
                    high: 2.,
                    count: 50,
                },
                summary: SummaryKind::Samples,
                log_every: Some(1),
                seed: 0,
            },
            Self::WganCurve => TrainingConfig {
                source: DistributionSpec::CubicCurve {
                    spread: 1.,
                    shift: 6.,
                    offset: 4.,
                },
                noise: DistributionSpec::standard_normal(1),
                generator: NetworkSpec::new(&[1, 128, 128, 128, 2], OutputActivation::Identity),
                critic: NetworkSpec::new(&[2, 512, 512, 512, 1], OutputActivation::Identity),
                objective: Objective::Wasserstein,
                critic_steps: 5,
                critic_warmup: 0,
                num_iters: 10000,
                batch_size: 64,
                learning_rate: 0.00005,
                clip: Some(0.01),
                halve_lr_every: None,
                capture_every: Some(100),
                eval_noise: EvalNoise::Sampled { count: 64 },
                summary: SummaryKind::Samples,
                log_every: Some(1),
                seed: 0,
            },
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
