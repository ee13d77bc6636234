use super::Sample;
use crate::error::ConfigError;
use crate::GanFloat;
use ndarray::{arr1, arr2, Array1, Array2};
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand::Rng;

/// Points `(x, (x - shift)³ + offset)` with `x ~ N(0, spread²)`: a curved
/// one-dimensional manifold in the plane.
#[derive(Debug, Clone)]
pub struct CubicCurve {
    spread: GanFloat,
    shift: GanFloat,
    offset: GanFloat,
    abscissa: Normal<GanFloat>,
}

impl CubicCurve {
    /// # Errors
    /// `spread` must be finite and non-negative, `shift` and `offset` finite.
    pub fn new(spread: GanFloat, shift: GanFloat, offset: GanFloat) -> Result<Self, ConfigError> {
        if !(spread.is_finite() && spread >= 0.) {
            return Err(ConfigError::InvalidParameter {
                name: "spread",
                reason: format!("{} must be finite and non-negative", spread),
            });
        }
        for (name, value) in [("shift", shift), ("offset", offset)] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("{} is not finite", value),
                });
            }
        }
        let abscissa = Normal::new(0., spread).map_err(|e| ConfigError::InvalidParameter {
            name: "spread",
            reason: e.to_string(),
        })?;
        Ok(Self {
            spread,
            shift,
            offset,
            abscissa,
        })
    }

    pub fn curve(&self, x: GanFloat) -> GanFloat {
        (x - self.shift).powi(3) + self.offset
    }
}

impl Sample for CubicCurve {
    fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<GanFloat> {
        let x: Array1<GanFloat> = Array1::random_using(n, self.abscissa, rng);
        let mut points = Array2::zeros((n, 2));
        points.column_mut(1).assign(&x.mapv(|x| self.curve(x)));
        points.column_mut(0).assign(&x);
        points
    }

    fn dim(&self) -> usize {
        2
    }

    fn mean(&self) -> Array1<GanFloat> {
        // u = x - shift ~ N(m, s²) with m = -shift
        let (m, s2) = (-self.shift, self.spread.powi(2));
        arr1(&[0., m.powi(3) + 3. * m * s2 + self.offset])
    }

    fn covariance(&self) -> Array2<GanFloat> {
        let (m, s2) = (-self.shift, self.spread.powi(2));
        let cov_xy = 3. * m * m * s2 + 3. * s2 * s2;
        let var_y = 9. * m.powi(4) * s2 + 36. * m * m * s2 * s2 + 15. * s2.powi(3);
        arr2(&[[s2, cov_xy], [cov_xy, var_y]])
    }
}
