#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]
//! Small generative adversarial networks on 2D toy distributions.
//!
//! A [`TrainingSession`] owns a generator and a critic [`DNN`], one
//! [`RmsProp`] optimizer per network and a seeded random source, and runs the
//! alternating critic/generator schedule described by a [`TrainingConfig`].
//! Diagnostics are collected through the [`Observer`] hook.
#[cfg(feature = "blas_openblas-system")]
extern crate blas_src;
extern crate ndarray;
extern crate ndarray_linalg;
extern crate ndarray_rand;
extern crate ndarray_stats;
extern crate rand;

pub mod affine;
pub mod capture;
pub mod config;
pub mod distributions;
pub mod dnn;
pub mod error;
pub mod loss;
pub mod optim;
pub mod session;
pub mod stats;
pub mod transport;
pub mod util;

#[cfg(test)]
mod test_util;

pub use capture::{DiagnosticLog, Observer, Recorder};
pub use config::{EvalNoise, NetworkSpec, Preset, SummaryKind, TrainingConfig};
pub use distributions::{Distribution, DistributionSpec, Sample};
pub use dnn::{OutputActivation, DNN};
pub use error::{CaptureError, ConfigError, TrainError, TransportError};
pub use loss::Objective;
pub use optim::{Optimizer, RmsProp};
pub use session::{IterationReport, TrainingSession, TrainingSummary};

pub type GanFloat = f64;
