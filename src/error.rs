//! Error types for configuration, training, capture and transport
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("covariance is not positive semi-definite (eigenvalue {index} = {value})")]
    NotPositiveSemidefinite { index: usize, value: f64 },
    #[error("covariance is not symmetric at ({row}, {col})")]
    NotSymmetric { row: usize, col: usize },
    #[error("{what}: expected dimension {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("line direction must be non-zero")]
    ZeroDirection,
    #[error("invalid bounds: low {low}, high {high}")]
    InvalidBounds { low: f64, high: f64 },
    #[error("network needs at least an input and an output width, got {0} widths")]
    NetworkTooShallow(usize),
    #[error("layer {0} has zero width")]
    ZeroWidth(usize),
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("{objective} objective needs a {expected} critic output")]
    IncompatibleOutput {
        objective: &'static str,
        expected: &'static str,
    },
    #[error("unknown preset `{0}`")]
    UnknownPreset(String),
    #[error("linear algebra failure: {0}")]
    Linalg(String),
}

impl From<ndarray_linalg::error::LinalgError> for ConfigError {
    fn from(err: ndarray_linalg::error::LinalgError) -> Self {
        Self::Linalg(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("i/o error while writing diagnostics: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize diagnostics: {0}")]
    Json(#[from] serde_json::Error),
    #[error("linear algebra failure: {0}")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),
    #[error("statistic needs at least {needed} samples, got {found}")]
    TooFewSamples { needed: usize, found: usize },
    #[error("summary needs {expected}-dimensional samples, got {found}")]
    UnsupportedDimension { expected: usize, found: usize },
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("non-finite {phase} loss {value} at iteration {iteration}")]
    NonFiniteLoss {
        phase: &'static str,
        iteration: usize,
        value: f64,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("histograms have different lengths ({0} vs {1})")]
    LengthMismatch(usize, usize),
    #[error("histograms carry different mass ({0} vs {1})")]
    MassMismatch(u64, u64),
}
