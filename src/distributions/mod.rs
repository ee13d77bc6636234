//! Target and noise distributions
use crate::error::ConfigError;
use crate::GanFloat;
use enum_dispatch::enum_dispatch;
use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub mod cubic_curve;
pub mod gaussian;
pub mod line_gaussian;
pub mod uniform;

pub use cubic_curve::CubicCurve;
pub use gaussian::Gaussian;
pub use line_gaussian::LineGaussian;
pub use uniform::UniformBox;

/// Draws batches of independent samples, one sample per row.
#[enum_dispatch]
pub trait Sample {
    /// `(n, dim)` array of independent draws. Only `rng` is advanced.
    fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<GanFloat>;

    fn dim(&self) -> usize;

    fn mean(&self) -> Array1<GanFloat>;

    /// Configured covariance, or the one implied by the family's parameters
    fn covariance(&self) -> Array2<GanFloat>;
}

#[enum_dispatch(Sample)]
#[derive(Debug, Clone)]
pub enum Distribution {
    Gaussian,
    LineGaussian,
    UniformBox,
    CubicCurve,
}

/// Serializable description of a [`Distribution`]. Validation happens in
/// [`DistributionSpec::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionSpec {
    Gaussian {
        mean: Vec<GanFloat>,
        covariance: Vec<Vec<GanFloat>>,
    },
    LineGaussian {
        mean: Vec<GanFloat>,
        spread: GanFloat,
        direction: Vec<GanFloat>,
    },
    Uniform {
        low: GanFloat,
        high: GanFloat,
        dim: usize,
    },
    /// `(x, (x - shift)³ + offset)` with `x ~ N(0, spread²)`
    CubicCurve {
        spread: GanFloat,
        shift: GanFloat,
        offset: GanFloat,
    },
}

impl DistributionSpec {
    pub fn standard_normal(dim: usize) -> Self {
        let covariance = (0..dim)
            .map(|i| (0..dim).map(|j| if i == j { 1. } else { 0. }).collect())
            .collect();
        Self::Gaussian {
            mean: vec![0.; dim],
            covariance,
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            Self::Gaussian { mean, .. } | Self::LineGaussian { mean, .. } => mean.len(),
            Self::Uniform { dim, .. } => *dim,
            Self::CubicCurve { .. } => 2,
        }
    }

    /// # Errors
    /// Any parameter the chosen family rejects.
    pub fn build(&self) -> Result<Distribution, ConfigError> {
        Ok(match self {
            Self::Gaussian { mean, covariance } => {
                let rows = covariance.len();
                let mut flat = Vec::with_capacity(rows * rows);
                for row in covariance {
                    if row.len() != rows {
                        return Err(ConfigError::DimensionMismatch {
                            what: "covariance columns",
                            expected: rows,
                            found: row.len(),
                        });
                    }
                    flat.extend_from_slice(row);
                }
                let cov = Array2::from_shape_vec((rows, rows), flat).map_err(|e| {
                    ConfigError::InvalidParameter {
                        name: "covariance",
                        reason: e.to_string(),
                    }
                })?;
                Gaussian::new(Array1::from_vec(mean.clone()), cov)?.into()
            }
            Self::LineGaussian {
                mean,
                spread,
                direction,
            } => LineGaussian::new(
                Array1::from_vec(mean.clone()),
                *spread,
                Array1::from_vec(direction.clone()),
            )?
            .into(),
            Self::Uniform { low, high, dim } => UniformBox::new(*low, *high, *dim)?.into(),
            Self::CubicCurve {
                spread,
                shift,
                offset,
            } => CubicCurve::new(*spread, *shift, *offset)?.into(),
        })
    }
}

impl TryFrom<&DistributionSpec> for Distribution {
    type Error = ConfigError;

    fn try_from(spec: &DistributionSpec) -> Result<Self, Self::Error> {
        spec.build()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::seeded;

    #[test]
    fn spec_round_trips_through_json() {
        let spec = DistributionSpec::LineGaussian {
            mean: vec![2., 2.],
            spread: 2.,
            direction: vec![1., -1.],
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"kind\":\"line_gaussian\""));
        let back: DistributionSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn build_dispatches_to_family() {
        let mut rng = seeded(0);
        let specs = [
            DistributionSpec::standard_normal(1),
            DistributionSpec::LineGaussian {
                mean: vec![0., 20.],
                spread: 1.,
                direction: vec![1., 0.],
            },
            DistributionSpec::Uniform {
                low: -1.,
                high: 1.,
                dim: 2,
            },
            DistributionSpec::CubicCurve {
                spread: 1.,
                shift: 6.,
                offset: 4.,
            },
        ];
        for spec in &specs {
            let dist = Distribution::try_from(spec).unwrap();
            assert_eq!(dist.dim(), spec.dim());
            assert_eq!(dist.sample(5, &mut rng).shape(), &[5, spec.dim()]);
            assert_eq!(dist.sample(0, &mut rng).shape(), &[0, spec.dim()]);
        }
    }

    #[test]
    fn ragged_covariance_is_rejected() {
        let spec = DistributionSpec::Gaussian {
            mean: vec![0., 0.],
            covariance: vec![vec![1., 0.], vec![0.]],
        };
        assert!(matches!(
            spec.build(),
            Err(ConfigError::DimensionMismatch { .. })
        ));
    }
}
