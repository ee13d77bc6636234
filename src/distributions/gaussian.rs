use super::Sample;
use crate::error::ConfigError;
use crate::util::psd_factor;
use crate::GanFloat;
use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand::Rng;

/// Multivariate normal with a full (possibly singular) covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct Gaussian {
    loc: Array1<GanFloat>,
    cov: Array2<GanFloat>,
    /// `F` with `F Fᵀ = cov`, from the eigen-decomposition of `cov`
    scale: Array2<GanFloat>,
}

impl Gaussian {
    /// # Errors
    /// The covariance must be square, match `loc` and be positive semi-definite.
    pub fn new(loc: Array1<GanFloat>, cov: Array2<GanFloat>) -> Result<Self, ConfigError> {
        if loc.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "mean",
                reason: "must have at least one dimension".to_string(),
            });
        }
        if cov.nrows() != loc.len() {
            return Err(ConfigError::DimensionMismatch {
                what: "covariance rows",
                expected: loc.len(),
                found: cov.nrows(),
            });
        }
        let scale = psd_factor(&cov.view())?;
        Ok(Self { loc, cov, scale })
    }

    /// Standard normal in `dim` dimensions
    pub fn standard(dim: usize) -> Self {
        Self {
            loc: Array1::zeros(dim),
            cov: Array2::eye(dim),
            scale: Array2::eye(dim),
        }
    }

    pub fn scale(&self) -> &Array2<GanFloat> {
        &self.scale
    }
}

impl Sample for Gaussian {
    fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<GanFloat> {
        let z: Array2<GanFloat> = Array2::random_using((n, self.loc.len()), StandardNormal, rng);
        z.dot(&self.scale.t()) + &self.loc
    }

    fn dim(&self) -> usize {
        self.loc.len()
    }

    fn mean(&self) -> Array1<GanFloat> {
        self.loc.clone()
    }

    fn covariance(&self) -> Array2<GanFloat> {
        self.cov.clone()
    }
}
