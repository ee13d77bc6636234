#![allow(dead_code)]
use gan2d::config::{EvalNoise, NetworkSpec, SummaryKind, TrainingConfig};
use gan2d::distributions::{DistributionSpec, Sample};
use gan2d::{Objective, OutputActivation, DNN};
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_pcg::Pcg64;

/// Small run on the diagonal line target used by the manifold experiments.
pub fn line_config(objective: Objective, seed: u64) -> TrainingConfig {
    TrainingConfig {
        source: DistributionSpec::LineGaussian {
            mean: vec![2., 2.],
            spread: 2.,
            direction: vec![1., -1.],
        },
        noise: DistributionSpec::standard_normal(1),
        generator: NetworkSpec::new(&[1, 16, 16, 2], OutputActivation::Identity),
        critic: NetworkSpec::new(&[2, 16, 16, 1], objective.critic_output()),
        objective,
        critic_steps: 5,
        critic_warmup: 0,
        num_iters: 50,
        batch_size: 8,
        learning_rate: 0.005,
        clip: if objective.clips_critic() { Some(0.05) } else { None },
        halve_lr_every: None,
        capture_every: Some(10),
        eval_noise: EvalNoise::Linspace {
            low: -2.,
            high: 2.,
            count: 50,
        },
        summary: SummaryKind::Samples,
        log_every: Some(10),
        seed,
    }
}

/// Noise batch independent of any session's random stream.
pub fn fixed_noise(n: usize, dim: usize, seed: u64) -> Array2<f64> {
    let mut rng = Pcg64::seed_from_u64(seed);
    DistributionSpec::standard_normal(dim)
        .build()
        .unwrap()
        .sample(n, &mut rng)
}

pub fn output_mean(net: &DNN, noise: &Array2<f64>) -> Array1<f64> {
    net.forward(noise).mean_axis(Axis(0)).unwrap()
}

pub fn distance(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    (a - b).mapv(|x| x * x).sum().sqrt()
}
