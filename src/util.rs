//! Utility functions
#![allow(non_snake_case)]
use crate::error::ConfigError;
use crate::GanFloat;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use ndarray_linalg::{Eigh, UPLO};

const PSD_TOL: GanFloat = 1e-10;

pub fn l2_norm(x: ArrayView1<GanFloat>) -> GanFloat {
    x.dot(&x).sqrt()
}

/// Checks that `A` is square and symmetric up to a relative tolerance.
///
/// # Errors
/// `DimensionMismatch` for non-square input, `NotSymmetric` naming the first
/// offending entry.
pub fn check_symmetric(A: &ArrayView2<GanFloat>) -> Result<(), ConfigError> {
    let n = A.nrows();
    if A.ncols() != n {
        return Err(ConfigError::DimensionMismatch {
            what: "covariance columns",
            expected: n,
            found: A.ncols(),
        });
    }
    let scale = A.iter().fold(1.0_f64, |acc, x| acc.max(x.abs()));
    for row in 0..n {
        for col in (row + 1)..n {
            if (A[[row, col]] - A[[col, row]]).abs() > 1e-9 * scale {
                return Err(ConfigError::NotSymmetric { row, col });
            }
        }
    }
    Ok(())
}

/// Eigen-decomposition of a symmetric positive semi-definite `A`, with
/// eigenvalues ascending and eigenvectors as the columns of `V`.
///
/// Eigenvalues slightly below zero from rounding are snapped to zero, so
/// degenerate covariances such as `[[0.7, 0], [0, 0]]` are accepted. Small
/// positive eigenvalues are kept as they are.
///
/// # Errors
/// `NotPositiveSemidefinite` for an eigenvalue below `-PSD_TOL * max|λ|`.
/// `InvalidParameter` for non-finite entries. Symmetry errors from
/// [`check_symmetric`].
pub fn psd_eigh(
    A: &ArrayView2<GanFloat>,
) -> Result<(Array1<GanFloat>, Array2<GanFloat>), ConfigError> {
    check_symmetric(A)?;
    if !A.iter().all(|x| x.is_finite()) {
        return Err(ConfigError::InvalidParameter {
            name: "covariance",
            reason: "entries must be finite".to_string(),
        });
    }
    let (mut eigs, V) = A.eigh(UPLO::Lower)?;
    let tol = PSD_TOL * eigs.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    let negative = eigs.iter().enumerate().find(|&(_, &l)| l < -tol);
    if let Some((index, &value)) = negative {
        return Err(ConfigError::NotPositiveSemidefinite { index, value });
    }
    eigs.mapv_inplace(|l| l.max(0.));
    Ok((eigs, V))
}

/// Factor `F = V diag(sqrt(λ))` with `F Fᵀ = A` for a symmetric positive
/// semi-definite `A`. Singular `A` gives vanishing columns.
///
/// # Errors
/// See [`psd_eigh`].
pub fn psd_factor(A: &ArrayView2<GanFloat>) -> Result<Array2<GanFloat>, ConfigError> {
    let (eigs, V) = psd_eigh(A)?;
    Ok(V * &eigs.mapv(GanFloat::sqrt))
}

/// Evenly spaced column of `count` values from `low` to `high` inclusive.
pub fn linspace_column(low: GanFloat, high: GanFloat, count: usize) -> Array2<GanFloat> {
    ndarray::Array1::linspace(low, high, count).insert_axis(ndarray::Axis(1))
}
