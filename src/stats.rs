//! Summary statistics over sample batches
use crate::error::{CaptureError, ConfigError};
use crate::util::psd_eigh;
use crate::GanFloat;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_linalg::{Eigh, UPLO};
use ndarray_stats::CorrelationExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Eigen-decomposition of a 2x2 covariance: the axes of its contour ellipses.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PrincipalAxes {
    /// Descending
    pub eigenvalues: [GanFloat; 2],
    /// Unit eigenvectors, `eigenvectors[i]` belongs to `eigenvalues[i]`
    pub eigenvectors: [[GanFloat; 2]; 2],
}

/// Sparse normalised 2D histogram. Cells are `(x, y, p)` with `(x, y)` the
/// lower corner of the cell.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Histogram2d {
    pub cells: Vec<(GanFloat, GanFloat, GanFloat)>,
    /// Samples that fell outside the histogram window
    pub dropped: usize,
}

fn require_rows(samples: &ArrayView2<GanFloat>, needed: usize) -> Result<(), CaptureError> {
    if samples.nrows() < needed {
        Err(CaptureError::TooFewSamples {
            needed,
            found: samples.nrows(),
        })
    } else {
        Ok(())
    }
}

fn require_dim(samples: &ArrayView2<GanFloat>, expected: usize) -> Result<(), CaptureError> {
    if samples.ncols() == expected {
        Ok(())
    } else {
        Err(CaptureError::UnsupportedDimension {
            expected,
            found: samples.ncols(),
        })
    }
}

/// Column means of a `(n, d)` batch.
///
/// # Errors
/// `TooFewSamples` for an empty batch
pub fn empirical_mean(samples: &ArrayView2<GanFloat>) -> Result<Array1<GanFloat>, CaptureError> {
    samples
        .mean_axis(Axis(0))
        .ok_or(CaptureError::TooFewSamples {
            needed: 1,
            found: 0,
        })
}

/// Unbiased (ddof = 1) covariance of a `(n, d)` batch.
///
/// # Errors
/// `TooFewSamples` for fewer than two rows
pub fn empirical_covariance(
    samples: &ArrayView2<GanFloat>,
) -> Result<Array2<GanFloat>, CaptureError> {
    require_rows(samples, 2)?;
    // observations are columns for ndarray-stats
    samples.t().cov(1.).map_err(|_| CaptureError::TooFewSamples {
        needed: 2,
        found: samples.nrows(),
    })
}

/// Principal axes of a 2x2 covariance, from the same symmetric
/// eigen-decomposition that factors sampling covariances. Each eigenvector is
/// oriented so its first non-zero component is positive.
///
/// # Errors
/// `UnsupportedDimension` unless `cov` is 2x2, `Linalg` if LAPACK fails
pub fn principal_axes_2d(cov: &ArrayView2<GanFloat>) -> Result<PrincipalAxes, CaptureError> {
    if cov.shape() != [2, 2] {
        return Err(CaptureError::UnsupportedDimension {
            expected: 2,
            found: cov.nrows(),
        });
    }
    // ascending eigenvalues, eigenvectors as columns
    let (eigs, vecs) = cov.eigh(UPLO::Lower)?;
    let axis = |k: usize| -> [GanFloat; 2] {
        let v = vecs.column(k);
        let flip = if v[0] < 0. || (v[0] == 0. && v[1] < 0.) { -1. } else { 1. };
        [flip * v[0], flip * v[1]]
    };
    Ok(PrincipalAxes {
        eigenvalues: [eigs[1], eigs[0]],
        eigenvectors: [axis(1), axis(0)],
    })
}

/// Density of `N(mean, cov)` on the grid `ys × xs`; entry `[i, j]` is the
/// density at `(xs[j], ys[i])`.
///
/// # Errors
/// `DimensionMismatch` unless the Gaussian is 2D, `NotPositiveSemidefinite`
/// when `cov` is singular or indefinite.
pub fn gaussian_pdf_2d(
    mean: &ArrayView1<GanFloat>,
    cov: &ArrayView2<GanFloat>,
    xs: &ArrayView1<GanFloat>,
    ys: &ArrayView1<GanFloat>,
) -> Result<Array2<GanFloat>, ConfigError> {
    if mean.len() != 2 || cov.shape() != [2, 2] {
        return Err(ConfigError::DimensionMismatch {
            what: "density grid",
            expected: 2,
            found: mean.len(),
        });
    }
    let (eigs, _) = psd_eigh(cov)?;
    if !(eigs[0] > 0.) {
        return Err(ConfigError::NotPositiveSemidefinite {
            index: 0,
            value: eigs[0],
        });
    }
    let det = cov[[0, 0]] * cov[[1, 1]] - cov[[0, 1]] * cov[[1, 0]];
    let (ia, ib, ic, id) = (
        cov[[1, 1]] / det,
        -cov[[0, 1]] / det,
        -cov[[1, 0]] / det,
        cov[[0, 0]] / det,
    );
    let norm = 1. / (2. * PI * det.sqrt());
    Ok(Array2::from_shape_fn((ys.len(), xs.len()), |(i, j)| {
        let dx = xs[j] - mean[0];
        let dy = ys[i] - mean[1];
        let quad = dx * (ia * dx + ib * dy) + dy * (ic * dx + id * dy);
        norm * (-0.5 * quad).exp()
    }))
}

/// Bins `samples` into square cells of side `quant` over `[-range, range)²`
/// and normalises the in-window counts to sum to one.
///
/// # Errors
/// `UnsupportedDimension` unless the batch is 2D
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn histogram_2d(
    samples: &ArrayView2<GanFloat>,
    range: GanFloat,
    quant: GanFloat,
) -> Result<Histogram2d, CaptureError> {
    require_dim(samples, 2)?;
    let bins = 2 * (range / quant).round() as i64;
    let to_idx = |v: GanFloat| -> Option<i64> {
        let idx = ((v + range) / quant).floor();
        if idx.is_finite() && idx >= 0. && (idx as i64) < bins {
            Some(idx as i64)
        } else {
            None
        }
    };
    let mut counts: BTreeMap<(i64, i64), usize> = BTreeMap::new();
    let mut dropped = 0;
    for row in samples.rows() {
        match (to_idx(row[0]), to_idx(row[1])) {
            (Some(i), Some(j)) => *counts.entry((i, j)).or_insert(0) += 1,
            _ => dropped += 1,
        }
    }
    let total: usize = counts.values().sum();
    let cells = counts
        .into_iter()
        .map(|((i, j), c)| {
            (
                i as GanFloat * quant - range,
                j as GanFloat * quant - range,
                c as GanFloat / total as GanFloat,
            )
        })
        .collect();
    Ok(Histogram2d { cells, dropped })
}
