#![cfg(test)]
use crate::affine::Affine2;
use crate::distributions::Sample;
use crate::stats::{empirical_covariance, empirical_mean};
use crate::dnn::{OutputActivation, DNN};
use crate::NetworkSpec;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;
use proptest::arbitrary::functor::ArbitraryF1;
use proptest::prelude::*;
use proptest::sample::SizeRange;
use rand::SeedableRng;
use rand_pcg::Pcg64;

prop_compose! {
    pub fn array1(len: usize)(v in Vec::lift1_with(-10. .. 10., SizeRange::new(len..=len))) -> Array1<f64> {
        Array1::from_vec(v)
    }
}

prop_compose! {
    pub fn array2(rows: usize, cols: usize)(v in Vec::lift1_with(array1(cols), SizeRange::new(rows..=rows))) -> Array2<f64> {
        assert!(rows > 0);
        ndarray::stack(Axis(0), &v.iter().map(|x| x.view()).collect::<Vec<ArrayView1<f64>>>()).unwrap()
    }
}

prop_compose! {
    pub fn affine2(in_dim: usize, out_dim: usize)(basis in array2(out_dim, in_dim), shift in array1(out_dim)) -> Affine2 {
        Affine2::new(basis, shift)
    }
}

prop_compose! {
    /// `A Aᵀ / dim` is positive semi-definite for any square `A`.
    pub fn covariance(dim: usize)(a in array2(dim, dim)) -> Array2<f64> {
        a.dot(&a.t()) / (dim as f64 * 10.)
    }
}

prop_compose! {
    pub fn fc_spec(input_size: usize, output_size: usize, nlayers: usize, max_layer_width: usize)
        (hidden in Vec::lift1_with(1..max_layer_width, SizeRange::new(nlayers..=nlayers)),
         sigmoid in any::<bool>()) -> NetworkSpec {
        let mut widths = vec![input_size];
        widths.extend(hidden);
        widths.push(output_size);
        let output = if sigmoid { OutputActivation::Sigmoid } else { OutputActivation::Identity };
        NetworkSpec { widths, output }
    }
}

prop_compose! {
    pub fn fc_dnn(input_size: usize, output_size: usize, nlayers: usize, max_layer_width: usize)
        (spec in fc_spec(input_size, output_size, nlayers, max_layer_width), seed in any::<u64>()) -> DNN {
        DNN::from_spec(&spec, &mut Pcg64::seed_from_u64(seed)).unwrap()
    }
}

pub fn seeded(seed: u64) -> Pcg64 {
    Pcg64::seed_from_u64(seed)
}

/// Draws `n` samples and checks the empirical mean and covariance against the
/// closed forms, entrywise within `max(5%, 0.01)`.
pub fn assert_moments_match<D: Sample>(dist: &D, n: usize, seed: u64) {
    let samples = dist.sample(n, &mut seeded(seed));
    assert_eq!(samples.shape(), &[n, dist.dim()]);
    let mean = empirical_mean(&samples.view()).unwrap();
    let cov = empirical_covariance(&samples.view()).unwrap();
    let dist_mean = dist.mean();
    let dist_cov = dist.covariance();
    let pairs = mean
        .iter()
        .zip(dist_mean.iter())
        .chain(cov.iter().zip(dist_cov.iter()));
    for (&found, &expected) in pairs {
        let tol = f64::max(0.05 * expected.abs(), 0.01);
        assert!(
            (found - expected).abs() <= tol,
            "found {}, expected {}",
            found,
            expected
        );
    }
}
