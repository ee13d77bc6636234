use super::Sample;
use crate::error::ConfigError;
use crate::util::l2_norm;
use crate::GanFloat;
use ndarray::{Array1, Array2, Axis};
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand::Rng;

/// A 1D Gaussian laid along a line: `loc + c * direction` with
/// `c ~ N(0, spread²)` and `direction` of unit length.
#[derive(Debug, Clone)]
pub struct LineGaussian {
    loc: Array1<GanFloat>,
    spread: GanFloat,
    direction: Array1<GanFloat>,
    coeff: Normal<GanFloat>,
}

impl LineGaussian {
    /// # Errors
    /// `direction` must be non-zero and match `loc`; `spread` must be finite
    /// and non-negative.
    pub fn new(
        loc: Array1<GanFloat>,
        spread: GanFloat,
        direction: Array1<GanFloat>,
    ) -> Result<Self, ConfigError> {
        if direction.len() != loc.len() {
            return Err(ConfigError::DimensionMismatch {
                what: "line direction",
                expected: loc.len(),
                found: direction.len(),
            });
        }
        let norm = l2_norm(direction.view());
        if norm == 0. || !norm.is_finite() {
            return Err(ConfigError::ZeroDirection);
        }
        // rand_distr only rejects a non-finite standard deviation
        if !(spread.is_finite() && spread >= 0.) {
            return Err(ConfigError::InvalidParameter {
                name: "spread",
                reason: format!("{} must be finite and non-negative", spread),
            });
        }
        let coeff = Normal::new(0., spread).map_err(|e| ConfigError::InvalidParameter {
            name: "spread",
            reason: e.to_string(),
        })?;
        Ok(Self {
            loc,
            spread,
            direction: direction / norm,
            coeff,
        })
    }

    pub fn direction(&self) -> &Array1<GanFloat> {
        &self.direction
    }

    pub fn spread(&self) -> GanFloat {
        self.spread
    }
}

impl Sample for LineGaussian {
    fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<GanFloat> {
        let coeffs: Array2<GanFloat> = Array2::random_using((n, 1), self.coeff, rng);
        coeffs.dot(&self.direction.view().insert_axis(Axis(0))) + &self.loc
    }

    fn dim(&self) -> usize {
        self.loc.len()
    }

    fn mean(&self) -> Array1<GanFloat> {
        self.loc.clone()
    }

    fn covariance(&self) -> Array2<GanFloat> {
        let u = self.direction.view().insert_axis(Axis(1));
        u.dot(&u.t()) * self.spread.powi(2)
    }
}
