//! Adversarial objectives and their gradients with respect to critic outputs
use crate::dnn::OutputActivation;
use crate::error::ConfigError;
use crate::GanFloat;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Critic outputs are clamped into `[LOG_EPS, 1 - LOG_EPS]` before taking logs.
pub const LOG_EPS: GanFloat = 1e-12;

/// A loss value together with its gradient with respect to the critic outputs
/// it was computed from.
#[derive(Clone, Debug)]
pub struct LossGrad {
    pub value: GanFloat,
    pub grad: Array2<GanFloat>,
}

/// Critic loss with separate gradients for the real and the fake batch.
#[derive(Clone, Debug)]
pub struct CriticLoss {
    pub value: GanFloat,
    pub grad_real: Array2<GanFloat>,
    pub grad_fake: Array2<GanFloat>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Minimax log-loss; the critic must end in a sigmoid
    Classic,
    /// Wasserstein estimate; the critic is linear and weight-clipped
    Wasserstein,
}

#[allow(clippy::cast_precision_loss)]
fn batch_len(x: &Array2<GanFloat>) -> GanFloat {
    x.len() as GanFloat
}

impl Objective {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Wasserstein => "wasserstein",
        }
    }

    pub const fn critic_output(self) -> OutputActivation {
        match self {
            Self::Classic => OutputActivation::Sigmoid,
            Self::Wasserstein => OutputActivation::Identity,
        }
    }

    pub const fn clips_critic(self) -> bool {
        matches!(self, Self::Wasserstein)
    }

    /// # Errors
    /// `IncompatibleOutput` if the critic's activation does not suit this objective.
    pub fn check_critic(self, output: OutputActivation) -> Result<(), ConfigError> {
        if output == self.critic_output() {
            Ok(())
        } else {
            Err(ConfigError::IncompatibleOutput {
                objective: self.name(),
                expected: match self.critic_output() {
                    OutputActivation::Identity => "linear",
                    OutputActivation::Sigmoid => "sigmoid",
                },
            })
        }
    }

    /// Classic: `-mean(log D(real) + log(1 - D(fake)))`.
    /// Wasserstein: `mean(D(fake)) - mean(D(real))`.
    pub fn critic_loss(self, real: &Array2<GanFloat>, fake: &Array2<GanFloat>) -> CriticLoss {
        let n_real = batch_len(real);
        let n_fake = batch_len(fake);
        match self {
            Self::Classic => {
                let real_c = real.mapv(clamp_prob);
                let fake_c = fake.mapv(clamp_prob);
                let value = -(real_c.mapv(GanFloat::ln).sum() / n_real
                    + fake_c.mapv(|d| (1. - d).ln()).sum() / n_fake);
                CriticLoss {
                    value,
                    grad_real: real_c.mapv(|d| -1. / (n_real * d)),
                    grad_fake: fake_c.mapv(|d| 1. / (n_fake * (1. - d))),
                }
            }
            Self::Wasserstein => CriticLoss {
                value: fake.sum() / n_fake - real.sum() / n_real,
                grad_real: Array2::from_elem(real.raw_dim(), -1. / n_real),
                grad_fake: Array2::from_elem(fake.raw_dim(), 1. / n_fake),
            },
        }
    }

    /// Classic: `mean(log(1 - D(fake)))`. Wasserstein: `-mean(D(fake))`.
    pub fn generator_loss(self, fake: &Array2<GanFloat>) -> LossGrad {
        let n_fake = batch_len(fake);
        match self {
            Self::Classic => {
                let fake_c = fake.mapv(clamp_prob);
                LossGrad {
                    value: fake_c.mapv(|d| (1. - d).ln()).sum() / n_fake,
                    grad: fake_c.mapv(|d| -1. / (n_fake * (1. - d))),
                }
            }
            Self::Wasserstein => LossGrad {
                value: -fake.sum() / n_fake,
                grad: Array2::from_elem(fake.raw_dim(), -1. / n_fake),
            },
        }
    }
}

fn clamp_prob(d: GanFloat) -> GanFloat {
    d.clamp(LOG_EPS, 1. - LOG_EPS)
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr2;

    #[test]
    fn wasserstein_values() {
        let real = arr2(&[[1.], [3.]]);
        let fake = arr2(&[[0.], [-1.], [1.]]);
        let critic = Objective::Wasserstein.critic_loss(&real, &fake);
        assert_abs_diff_eq!(critic.value, 0. - 2.);
        assert_abs_diff_eq!(critic.grad_real[[0, 0]], -0.5);
        assert_abs_diff_eq!(critic.grad_fake[[2, 0]], 1. / 3.);
        let gen = Objective::Wasserstein.generator_loss(&fake);
        assert_abs_diff_eq!(gen.value, 0.);
        assert_abs_diff_eq!(gen.grad[[1, 0]], -1. / 3.);
    }

    #[test]
    fn classic_values() {
        let real = arr2(&[[0.5], [0.5]]);
        let fake = arr2(&[[0.5]]);
        let critic = Objective::Classic.critic_loss(&real, &fake);
        assert_abs_diff_eq!(critic.value, -2. * 0.5_f64.ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(critic.grad_real[[0, 0]], -1., epsilon = 1e-12);
        assert_abs_diff_eq!(critic.grad_fake[[0, 0]], 2., epsilon = 1e-12);
    }

    #[test]
    fn classic_is_finite_at_saturation() {
        let real = arr2(&[[0.], [1.]]);
        let fake = arr2(&[[1.], [0.]]);
        let critic = Objective::Classic.critic_loss(&real, &fake);
        assert!(critic.value.is_finite());
        assert!(critic.grad_real.iter().all(|g| g.is_finite()));
        assert!(critic.grad_fake.iter().all(|g| g.is_finite()));
        assert!(Objective::Classic.generator_loss(&fake).value.is_finite());
    }

    #[test]
    fn classic_gradients_match_finite_differences() {
        let real = arr2(&[[0.3], [0.8]]);
        let fake = arr2(&[[0.6], [0.2]]);
        let analytic = Objective::Classic.critic_loss(&real, &fake);
        let eps = 1e-7;
        for idx in 0..2 {
            let mut plus = fake.clone();
            let mut minus = fake.clone();
            plus[[idx, 0]] += eps;
            minus[[idx, 0]] -= eps;
            let numeric = (Objective::Classic.critic_loss(&real, &plus).value
                - Objective::Classic.critic_loss(&real, &minus).value)
                / (2. * eps);
            assert_abs_diff_eq!(numeric, analytic.grad_fake[[idx, 0]], epsilon = 1e-5);
        }
        let gen = Objective::Classic.generator_loss(&fake);
        for idx in 0..2 {
            let mut plus = fake.clone();
            let mut minus = fake.clone();
            plus[[idx, 0]] += eps;
            minus[[idx, 0]] -= eps;
            let numeric = (Objective::Classic.generator_loss(&plus).value
                - Objective::Classic.generator_loss(&minus).value)
                / (2. * eps);
            assert_abs_diff_eq!(numeric, gen.grad[[idx, 0]], epsilon = 1e-5);
        }
    }

    #[test]
    fn critic_activation_is_checked() {
        assert!(Objective::Classic
            .check_critic(OutputActivation::Sigmoid)
            .is_ok());
        assert_eq!(
            Objective::Wasserstein.check_critic(OutputActivation::Sigmoid),
            Err(ConfigError::IncompatibleOutput {
                objective: "wasserstein",
                expected: "linear",
            })
        );
    }
}
