use crate::affine::Affine2;
use crate::GanFloat;
use ndarray::{Array1, Array2, ArrayView2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Dense {
    aff: Affine2,
}

impl Dense {
    pub const fn new(aff: Affine2) -> Self {
        Self { aff }
    }

    pub fn from_parts(mul: Array2<GanFloat>, add: Array1<GanFloat>) -> Self {
        Self {
            aff: Affine2::new(mul, add),
        }
    }

    /// Weights and bias drawn from `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`.
    pub fn init<R: Rng + ?Sized>(input_dim: usize, output_dim: usize, rng: &mut R) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let bound = 1. / (input_dim as GanFloat).sqrt();
        let dist = Uniform::new_inclusive(-bound, bound);
        Self::from_parts(
            Array2::random_using((output_dim, input_dim), dist, rng),
            Array1::random_using(output_dim, dist, rng),
        )
    }

    pub fn affine(&self) -> &Affine2 {
        &self.aff
    }

    pub fn affine_mut(&mut self) -> &mut Affine2 {
        &mut self.aff
    }

    pub fn input_dim(&self) -> usize {
        self.aff.input_dim()
    }

    pub fn output_dim(&self) -> usize {
        self.aff.output_dim()
    }

    pub fn forward2(&self, input: &ArrayView2<GanFloat>) -> Array2<GanFloat> {
        self.aff.apply_matrix(input)
    }

    /// Returns `((d weight, d bias), d input)` for a batch.
    pub fn backward2(
        &self,
        input: &ArrayView2<GanFloat>,
        grad_output: &ArrayView2<GanFloat>,
    ) -> ((Array2<GanFloat>, Array1<GanFloat>), Array2<GanFloat>) {
        (
            self.aff.parameter_grads(input, grad_output),
            self.aff.pullback(grad_output),
        )
    }

    pub fn clip_weights(&mut self, bound: GanFloat) {
        self.aff.clamp_basis(bound);
    }
}

impl fmt::Display for Dense {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Dense {}", self.aff.output_dim())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::seeded;

    #[test]
    fn init_respects_fan_in_bound() {
        let dense = Dense::init(16, 8, &mut seeded(11));
        assert_eq!(dense.affine().shape(), &[8, 16]);
        let bound = 0.25;
        assert!(dense.affine().basis().iter().all(|w| w.abs() <= bound));
        assert!(dense.affine().shift().iter().all(|b| b.abs() <= bound));
    }

    #[test]
    fn backward_shapes() {
        let dense = Dense::init(3, 2, &mut seeded(0));
        let input = Array2::ones((5, 3));
        let grad = Array2::ones((5, 2));
        let ((dw, db), dx) = dense.backward2(&input.view(), &grad.view());
        assert_eq!(dw.shape(), &[2, 3]);
        assert_eq!(db.shape(), &[2]);
        assert_eq!(dx.shape(), &[5, 3]);
        assert!(db.iter().all(|&b| b == 5.));
    }
}
