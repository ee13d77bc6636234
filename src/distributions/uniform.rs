use super::Sample;
use crate::error::ConfigError;
use crate::GanFloat;
use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

/// Independent draws from the closed interval `[low, high]` in every coordinate.
#[derive(Debug, Clone)]
pub struct UniformBox {
    low: GanFloat,
    high: GanFloat,
    dim: usize,
    coord: Uniform<GanFloat>,
}

impl UniformBox {
    /// # Errors
    /// Bounds must be finite with `low <= high` and a finite width, and `dim`
    /// non-zero.
    pub fn new(low: GanFloat, high: GanFloat, dim: usize) -> Result<Self, ConfigError> {
        // rand panics when `high - low` overflows
        if !(low <= high && (high - low).is_finite()) {
            return Err(ConfigError::InvalidBounds { low, high });
        }
        if dim == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "dim",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            low,
            high,
            dim,
            coord: Uniform::new_inclusive(low, high),
        })
    }

    pub fn bounds(&self) -> (GanFloat, GanFloat) {
        (self.low, self.high)
    }
}

impl Sample for UniformBox {
    fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<GanFloat> {
        Array2::random_using((n, self.dim), self.coord, rng)
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn mean(&self) -> Array1<GanFloat> {
        Array1::from_elem(self.dim, (self.low + self.high) / 2.)
    }

    fn covariance(&self) -> Array2<GanFloat> {
        Array2::eye(self.dim) * (self.high - self.low).powi(2) / 12.
    }
}
