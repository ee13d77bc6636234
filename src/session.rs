//! The alternating critic/generator training loop
use crate::capture::Observer;
use crate::config::{EvalNoise, TrainingConfig};
use crate::distributions::{Distribution, Sample};
use crate::dnn::DNN;
use crate::error::TrainError;
use crate::optim::{Optimizer, RmsProp};
use crate::util::linspace_column;
use crate::GanFloat;
use log::{debug, error, info, trace};
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

/// What happened during one outer iteration.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct IterationReport {
    pub iteration: usize,
    /// Loss of the last critic phase
    pub critic_loss: GanFloat,
    pub generator_loss: GanFloat,
    /// Mean of the batch generated during the generator phase
    pub fake_mean: Vec<GanFloat>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TrainingSummary {
    pub iterations: usize,
    pub critic_loss: Option<GanFloat>,
    pub generator_loss: Option<GanFloat>,
    pub learning_rate: GanFloat,
    pub generator_mean: Option<Vec<GanFloat>>,
}

/// Owns both networks, their optimizers, the samplers and the random
/// source. Everything random is drawn from one `Pcg64` seeded from the
/// config, so a config fully determines a run.
pub struct TrainingSession {
    config: TrainingConfig,
    generator: DNN,
    critic: DNN,
    generator_optim: RmsProp,
    critic_optim: RmsProp,
    source: Distribution,
    noise: Distribution,
    rng: Pcg64,
    lr: GanFloat,
    iteration: usize,
    warmed_up: bool,
    /// Fixed evaluation batch for `EvalNoise::Linspace`
    fixed_eval: Option<Array2<GanFloat>>,
}

fn check_finite(phase: &'static str, iteration: usize, value: GanFloat) -> Result<GanFloat, TrainError> {
    if value.is_finite() {
        Ok(value)
    } else {
        error!("{} loss became {} at iteration {}", phase, value, iteration);
        Err(TrainError::NonFiniteLoss {
            phase,
            iteration,
            value,
        })
    }
}

impl TrainingSession {
    /// Validates `config`, builds the samplers and initialises both networks
    /// from the seeded random source (generator first).
    ///
    /// # Errors
    /// Any `ConfigError` from validation or construction.
    pub fn new(config: TrainingConfig) -> Result<Self, TrainError> {
        config.validate()?;
        let source = config.source.build()?;
        let noise = config.noise.build()?;
        let mut rng = Pcg64::seed_from_u64(config.seed);
        let generator = DNN::from_spec(&config.generator, &mut rng)?;
        let critic = DNN::from_spec(&config.critic, &mut rng)?;
        let fixed_eval = match config.eval_noise {
            EvalNoise::Linspace { low, high, count } => Some(linspace_column(low, high, count)),
            EvalNoise::Sampled { .. } => None,
        };
        info!("generator: {}", generator);
        info!("critic: {} ({} objective)", critic, config.objective);
        let lr = config.learning_rate;
        Ok(Self {
            generator,
            critic,
            generator_optim: RmsProp::new(lr),
            critic_optim: RmsProp::new(lr),
            source,
            noise,
            rng,
            lr,
            iteration: 0,
            warmed_up: false,
            fixed_eval,
            config,
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn generator(&self) -> &DNN {
        &self.generator
    }

    pub fn critic(&self) -> &DNN {
        &self.critic
    }

    pub fn generator_optimizer(&self) -> &RmsProp {
        &self.generator_optim
    }

    pub fn critic_optimizer(&self) -> &RmsProp {
        &self.critic_optim
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn learning_rate(&self) -> GanFloat {
        self.lr
    }

    pub fn source(&self) -> &Distribution {
        &self.source
    }

    /// Draws a minibatch from the noise distribution.
    pub fn sample_noise(&mut self, n: usize) -> Array2<GanFloat> {
        self.noise.sample(n, &mut self.rng)
    }

    /// Draws a minibatch from the target distribution.
    pub fn sample_source(&mut self, n: usize) -> Array2<GanFloat> {
        self.source.sample(n, &mut self.rng)
    }

    /// Critic loss on the given batches without updating anything.
    pub fn critic_loss_on(&self, real: &Array2<GanFloat>, noise: &Array2<GanFloat>) -> GanFloat {
        let fake = self.generator.forward(noise);
        self.config
            .objective
            .critic_loss(&self.critic.forward(real), &self.critic.forward(&fake))
            .value
    }

    /// Generator loss on the given noise batch without updating anything.
    pub fn generator_loss_on(&self, noise: &Array2<GanFloat>) -> GanFloat {
        let fake = self.generator.forward(noise);
        self.config
            .objective
            .generator_loss(&self.critic.forward(&fake))
            .value
    }

    /// One critic update on explicit batches. The generator only runs
    /// forward, so nothing flows back into it. Under the Wasserstein
    /// objective the critic weights are clipped after the step.
    ///
    /// # Errors
    /// `NonFiniteLoss` before any parameter is touched.
    pub fn critic_update(
        &mut self,
        real: &Array2<GanFloat>,
        noise: &Array2<GanFloat>,
    ) -> Result<GanFloat, TrainError> {
        let fake = self.generator.forward(noise);
        let real_trace = self.critic.forward_traced(real);
        let fake_trace = self.critic.forward_traced(&fake);
        let loss = self
            .config
            .objective
            .critic_loss(real_trace.output(), fake_trace.output());
        let value = check_finite("critic", self.iteration, loss.value)?;

        let (mut grads, _) = self.critic.backward(&real_trace, &loss.grad_real);
        let (fake_grads, _) = self.critic.backward(&fake_trace, &loss.grad_fake);
        grads += &fake_grads;
        self.critic_optim.step(&mut self.critic, &grads);
        if self.config.objective.clips_critic() {
            if let Some(bound) = self.config.clip {
                self.critic.clip_weights(bound);
            }
        }
        trace!("critic loss {:.6}, |grad| {:.3e}", value, grads.l2_norm());
        Ok(value)
    }

    /// Critic phase on freshly drawn batches.
    ///
    /// # Errors
    /// See [`TrainingSession::critic_update`].
    pub fn critic_step(&mut self) -> Result<GanFloat, TrainError> {
        let batch = self.config.batch_size;
        let real = self.sample_source(batch);
        let noise = self.sample_noise(batch);
        self.critic_update(&real, &noise)
    }

    fn generator_pass(
        &mut self,
        noise: &Array2<GanFloat>,
    ) -> Result<(GanFloat, Array1<GanFloat>), TrainError> {
        let gen_trace = self.generator.forward_traced(noise);
        let critic_trace = self.critic.forward_traced(gen_trace.output());
        let loss = self
            .config
            .objective
            .generator_loss(critic_trace.output());
        let value = check_finite("generator", self.iteration, loss.value)?;

        // critic parameter gradients are discarded, only the input gradient is kept
        let (_, grad_fake) = self.critic.backward(&critic_trace, &loss.grad);
        let (grads, _) = self.generator.backward(&gen_trace, &grad_fake);
        self.generator_optim.step(&mut self.generator, &grads);
        trace!("generator loss {:.6}, |grad| {:.3e}", value, grads.l2_norm());

        let fake_mean = gen_trace
            .output()
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(self.generator.output_dim()));
        Ok((value, fake_mean))
    }

    /// One generator update on an explicit noise batch.
    ///
    /// # Errors
    /// `NonFiniteLoss` before any parameter is touched.
    pub fn generator_update(&mut self, noise: &Array2<GanFloat>) -> Result<GanFloat, TrainError> {
        self.generator_pass(noise).map(|(value, _)| value)
    }

    /// Generator phase on a freshly drawn noise batch.
    ///
    /// # Errors
    /// See [`TrainingSession::generator_update`].
    pub fn generator_step(&mut self) -> Result<GanFloat, TrainError> {
        let noise = self.sample_noise(self.config.batch_size);
        self.generator_update(&noise)
    }

    /// Halves the learning rate of both optimizers, discarding their state.
    pub fn decay_learning_rate(&mut self) {
        self.lr /= 2.;
        self.generator_optim.set_learning_rate(self.lr);
        self.critic_optim.set_learning_rate(self.lr);
        info!(
            "iteration {}: learning rate halved to {:e}",
            self.iteration, self.lr
        );
    }

    /// The evaluation batch handed to observers: the fixed linspace column,
    /// or a fresh draw from the noise distribution.
    pub fn eval_noise(&mut self) -> Array2<GanFloat> {
        if let Some(fixed) = &self.fixed_eval {
            return fixed.clone();
        }
        let count = self.config.eval_noise.count();
        self.sample_noise(count)
    }

    /// Runs `critic_warmup` critic-only steps, once per session. Returns the
    /// last warm-up loss, or `None` when there was nothing to run.
    ///
    /// # Errors
    /// See [`TrainingSession::critic_update`].
    pub fn warm_up(&mut self) -> Result<Option<GanFloat>, TrainError> {
        if self.warmed_up {
            return Ok(None);
        }
        let mut loss = None;
        for _ in 0..self.config.critic_warmup {
            loss = Some(self.critic_step()?);
        }
        self.warmed_up = true;
        if let Some(loss) = loss {
            info!(
                "critic warm-up: {} steps, loss {:.6}",
                self.config.critic_warmup, loss
            );
        }
        Ok(loss)
    }

    /// One outer iteration: critic phases, generator phase, capture, then
    /// learning-rate decay, each on its cadence.
    ///
    /// # Errors
    /// A non-finite loss or a failing observer.
    pub fn step<O: Observer + ?Sized>(
        &mut self,
        observer: &mut O,
    ) -> Result<IterationReport, TrainError> {
        let mut critic_loss = GanFloat::NAN;
        for _ in 0..self.config.critic_steps {
            critic_loss = self.critic_step()?;
        }
        let noise = self.sample_noise(self.config.batch_size);
        let (generator_loss, fake_mean) = self.generator_pass(&noise)?;

        let iteration = self.iteration;
        if let Some(every) = self.config.capture_every {
            if iteration % every == 0 {
                let eval = self.eval_noise();
                observer.observe(iteration, &self.generator, &eval)?;
                debug!("captured iteration {}", iteration);
            }
        }
        if let Some(every) = self.config.halve_lr_every {
            if iteration % every == every - 1 {
                self.decay_learning_rate();
            }
        }

        let report = IterationReport {
            iteration,
            critic_loss,
            generator_loss,
            fake_mean: fake_mean.to_vec(),
        };
        debug!("{:?}", report);
        if let Some(every) = self.config.log_every {
            if iteration % every == 0 {
                info!(
                    "iter {}: mean {:.4}, critic loss {:.6}, generator loss {:.6}",
                    iteration, fake_mean, critic_loss, generator_loss
                );
            }
        }
        self.iteration += 1;
        Ok(report)
    }

    /// Warms the critic up if that has not happened yet, then runs the
    /// remaining iterations up to `num_iters`.
    ///
    /// # Errors
    /// The first error from [`TrainingSession::warm_up`] or
    /// [`TrainingSession::step`] ends the run.
    pub fn run<O: Observer + ?Sized>(
        &mut self,
        observer: &mut O,
    ) -> Result<TrainingSummary, TrainError> {
        self.warm_up()?;
        let mut last = None;
        while self.iteration < self.config.num_iters {
            last = Some(self.step(observer)?);
        }
        info!(
            "finished {} iterations at learning rate {:e}",
            self.iteration, self.lr
        );
        Ok(TrainingSummary {
            iterations: self.iteration,
            critic_loss: last.as_ref().map(|r| r.critic_loss),
            generator_loss: last.as_ref().map(|r| r.generator_loss),
            learning_rate: self.lr,
            generator_mean: last.map(|r| r.fake_mean),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{NetworkSpec, SummaryKind};
    use crate::distributions::DistributionSpec;
    use crate::dnn::OutputActivation;
    use crate::error::CaptureError;
    use crate::loss::Objective;

    fn line_config(objective: Objective) -> TrainingConfig {
        TrainingConfig {
            source: DistributionSpec::LineGaussian {
                mean: vec![2., 2.],
                spread: 2.,
                direction: vec![1., -1.],
            },
            noise: DistributionSpec::standard_normal(1),
            generator: NetworkSpec::new(&[1, 8, 8, 2], OutputActivation::Identity),
            critic: NetworkSpec::new(&[2, 8, 8, 1], objective.critic_output()),
            objective,
            critic_steps: 2,
            critic_warmup: 0,
            num_iters: 6,
            batch_size: 8,
            learning_rate: 0.001,
            clip: if objective.clips_critic() { Some(100.) } else { None },
            halve_lr_every: None,
            capture_every: None,
            eval_noise: EvalNoise::Sampled { count: 16 },
            summary: SummaryKind::Samples,
            log_every: None,
            seed: 11,
        }
    }

    fn ignore() -> impl FnMut(usize, &DNN, &Array2<GanFloat>) -> Result<(), CaptureError> {
        |_, _, _| Ok(())
    }

    fn critic_step_decreases(objective: Objective) {
        let mut config = line_config(objective);
        config.learning_rate = 1e-5;
        let mut session = TrainingSession::new(config).unwrap();
        let real = session.sample_source(32);
        let noise = session.sample_noise(32);
        let before = session.critic_loss_on(&real, &noise);
        let reported = session.critic_update(&real, &noise).unwrap();
        assert_eq!(reported, before);
        let after = session.critic_loss_on(&real, &noise);
        assert!(after < before, "{}: {} -> {}", objective, before, after);
    }

    #[test]
    fn classic_critic_step_decreases_loss() {
        critic_step_decreases(Objective::Classic);
    }

    #[test]
    fn wasserstein_critic_step_decreases_loss() {
        critic_step_decreases(Objective::Wasserstein);
    }

    #[test]
    fn generator_step_leaves_critic_alone() {
        let mut session = TrainingSession::new(line_config(Objective::Classic)).unwrap();
        let critic = session.critic().clone();
        let noise = session.sample_noise(32);
        let before = session.generator_loss_on(&noise);
        session.generator_update(&noise).unwrap();
        assert_eq!(session.critic(), &critic);
        assert!(session.generator_loss_on(&noise) != before);
    }

    #[test]
    fn critic_step_leaves_generator_alone() {
        let mut session = TrainingSession::new(line_config(Objective::Wasserstein)).unwrap();
        let generator = session.generator().clone();
        session.critic_step().unwrap();
        assert_eq!(session.generator(), &generator);
    }

    #[test]
    fn wasserstein_clips_critic() {
        let mut config = line_config(Objective::Wasserstein);
        config.clip = Some(0.01);
        let mut session = TrainingSession::new(config).unwrap();
        session.critic_step().unwrap();
        assert!(session
            .critic()
            .dense_layers()
            .all(|d| d.affine().basis().iter().all(|w| w.abs() <= 0.01)));
        // generator weights are never clipped
        assert!(session
            .generator()
            .dense_layers()
            .any(|d| d.affine().basis().iter().any(|w| w.abs() > 0.01)));
    }

    #[test]
    fn halving_cadence() {
        let mut config = line_config(Objective::Classic);
        config.halve_lr_every = Some(2);
        config.num_iters = 2;
        let mut session = TrainingSession::new(config).unwrap();
        session.step(&mut ignore()).unwrap();
        assert_eq!(session.learning_rate(), 0.001);
        assert!(!session.critic_optimizer().square_avg().is_empty());
        session.step(&mut ignore()).unwrap();
        assert_eq!(session.learning_rate(), 0.0005);
        assert_eq!(session.critic_optimizer().learning_rate(), 0.0005);
        assert_eq!(session.generator_optimizer().learning_rate(), 0.0005);
        assert!(session.critic_optimizer().square_avg().is_empty());
        assert!(session.generator_optimizer().square_avg().is_empty());
    }

    #[test]
    fn observer_cadence() {
        let mut config = line_config(Objective::Classic);
        config.capture_every = Some(3);
        config.num_iters = 7;
        let mut session = TrainingSession::new(config).unwrap();
        let mut seen = Vec::new();
        let mut observer = |iteration: usize, _: &DNN, noise: &Array2<GanFloat>| {
            seen.push((iteration, noise.shape().to_vec()));
            Ok::<(), CaptureError>(())
        };
        let summary = session.run(&mut observer).unwrap();
        assert_eq!(summary.iterations, 7);
        assert_eq!(
            seen,
            vec![(0, vec![16, 1]), (3, vec![16, 1]), (6, vec![16, 1])]
        );
    }

    #[test]
    fn linspace_eval_noise_is_fixed() {
        let mut config = line_config(Objective::Classic);
        config.eval_noise = EvalNoise::Linspace {
            low: -2.,
            high: 2.,
            count: 5,
        };
        let mut session = TrainingSession::new(config).unwrap();
        let first = session.eval_noise();
        assert_eq!(first, session.eval_noise());
        assert_eq!(first[[0, 0]], -2.);
        assert_eq!(first[[4, 0]], 2.);
    }

    #[test]
    fn same_seed_same_run() {
        let mut a = TrainingSession::new(line_config(Objective::Classic)).unwrap();
        let mut b = TrainingSession::new(line_config(Objective::Classic)).unwrap();
        let sa = a.run(&mut ignore()).unwrap();
        let sb = b.run(&mut ignore()).unwrap();
        assert_eq!(sa, sb);
        assert_eq!(a.generator(), b.generator());

        let mut config = line_config(Objective::Classic);
        config.seed = 12;
        let c = TrainingSession::new(config).unwrap();
        let d = TrainingSession::new(line_config(Objective::Classic)).unwrap();
        assert_ne!(d.generator(), c.generator());
    }

    #[test]
    fn failing_observer_aborts() {
        let mut config = line_config(Objective::Classic);
        config.capture_every = Some(1);
        let mut session = TrainingSession::new(config).unwrap();
        let mut observer = |_: usize, _: &DNN, _: &Array2<GanFloat>| {
            Err::<(), _>(CaptureError::TooFewSamples { needed: 2, found: 0 })
        };
        let res = session.run(&mut observer);
        assert!(matches!(res, Err(TrainError::Capture(_))));
        assert_eq!(session.iteration(), 0);
    }

    #[test]
    fn non_finite_loss_aborts() {
        let mut session = TrainingSession::new(line_config(Objective::Wasserstein)).unwrap();
        let real = Array2::from_elem((4, 2), GanFloat::NAN);
        let noise = session.sample_noise(4);
        let critic = session.critic().clone();
        let res = session.critic_update(&real, &noise);
        assert!(matches!(
            res,
            Err(TrainError::NonFiniteLoss { phase: "critic", iteration: 0, .. })
        ));
        assert_eq!(session.critic(), &critic);
    }

    #[test]
    fn warm_up_trains_only_the_critic_once() {
        let mut config = line_config(Objective::Classic);
        config.critic_warmup = 3;
        let mut session = TrainingSession::new(config).unwrap();
        let generator = session.generator().clone();
        let critic = session.critic().clone();
        assert!(session.warm_up().unwrap().is_some());
        assert_eq!(session.generator(), &generator);
        assert_ne!(session.critic(), &critic);
        assert_eq!(session.iteration(), 0);

        let warmed = session.critic().clone();
        assert_eq!(session.warm_up().unwrap(), None);
        assert_eq!(session.critic(), &warmed);
    }

    #[test]
    fn run_starts_with_warm_up() {
        let mut config = line_config(Objective::Classic);
        config.num_iters = 2;
        let mut cold = TrainingSession::new(config.clone()).unwrap();
        config.critic_warmup = 4;
        let mut warm = TrainingSession::new(config.clone()).unwrap();
        cold.run(&mut ignore()).unwrap();
        warm.run(&mut ignore()).unwrap();
        assert_ne!(cold.critic(), warm.critic());

        // the same warm-up steps taken by hand give the same run
        let mut manual = TrainingSession::new(config).unwrap();
        for _ in 0..4 {
            manual.critic_step().unwrap();
        }
        manual.warmed_up = true;
        manual.run(&mut ignore()).unwrap();
        assert_eq!(manual.critic(), warm.critic());
        assert_eq!(manual.generator(), warm.generator());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = line_config(Objective::Classic);
        config.batch_size = 0;
        assert!(matches!(
            TrainingSession::new(config),
            Err(TrainError::Config(_))
        ));
    }
}
