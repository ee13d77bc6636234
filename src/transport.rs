//! Discrete optimal transport between integer histograms on the same
//! ordered 1D bins, with ground cost `|i - j|`.
use crate::error::TransportError;
use ndarray::Array2;

fn check(a: &[u64], b: &[u64]) -> Result<(), TransportError> {
    if a.len() != b.len() {
        return Err(TransportError::LengthMismatch(a.len(), b.len()));
    }
    let (mass_a, mass_b) = (a.iter().sum::<u64>(), b.iter().sum::<u64>());
    if mass_a != mass_b {
        return Err(TransportError::MassMismatch(mass_a, mass_b));
    }
    Ok(())
}

/// Optimal plan moving histogram `a` onto histogram `b`, and its cost.
///
/// `plan[[i, j]]` is the mass moved from bin `i` of `a` to bin `j` of `b`.
/// For a convex cost on the line the monotone (north-west corner) coupling
/// is optimal, so no solver is needed.
///
/// # Errors
/// If the histograms differ in length or total mass.
pub fn transport_plan_1d(a: &[u64], b: &[u64]) -> Result<(Array2<u64>, u64), TransportError> {
    check(a, b)?;
    let n = a.len();
    let mut plan = Array2::zeros((n, n));
    let mut cost = 0;
    let (mut left_a, mut left_b) = (a.to_vec(), b.to_vec());
    let (mut i, mut j) = (0, 0);
    while i < n && j < n {
        let moved = left_a[i].min(left_b[j]);
        plan[[i, j]] += moved;
        cost += moved * i.abs_diff(j) as u64;
        left_a[i] -= moved;
        left_b[j] -= moved;
        if left_a[i] == 0 {
            i += 1;
        }
        if left_b[j] == 0 {
            j += 1;
        }
    }
    Ok((plan, cost))
}

/// Earth mover's distance between two histograms: the L1 distance between
/// their cumulative sums.
///
/// # Errors
/// If the histograms differ in length or total mass.
pub fn wasserstein1_histograms(a: &[u64], b: &[u64]) -> Result<u64, TransportError> {
    check(a, b)?;
    let mut cdf_a: i128 = 0;
    let mut cdf_b: i128 = 0;
    let mut total: u128 = 0;
    for (&x, &y) in a.iter().zip(b) {
        cdf_a += i128::from(x);
        cdf_b += i128::from(y);
        total += (cdf_a - cdf_b).unsigned_abs();
    }
    Ok(u64::try_from(total).unwrap_or(u64::MAX))
}
