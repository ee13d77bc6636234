use crate::GanFloat;
use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReLU {
    ndims: usize,
}

impl ReLU {
    pub const fn new(ndims: usize) -> Self {
        Self { ndims }
    }

    pub const fn ndims(&self) -> usize {
        self.ndims
    }

    pub fn forward2(&self, input: &ArrayView2<GanFloat>) -> Array2<GanFloat> {
        input.mapv(|x| if x.lt(&0.) { 0. } else { x })
    }

    /// The subgradient at zero is taken to be zero.
    pub fn backward2(
        &self,
        input: &ArrayView2<GanFloat>,
        grad_output: &ArrayView2<GanFloat>,
    ) -> Array2<GanFloat> {
        Zip::from(input)
            .and(grad_output)
            .map_collect(|&x, &g| if x > 0. { g } else { 0. })
    }
}

impl Display for ReLU {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "ReLU")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn relu_masks_negative_inputs() {
        let relu = ReLU::new(3);
        let input = arr2(&[[-1., 0., 2.]]);
        assert_eq!(relu.forward2(&input.view()), arr2(&[[0., 0., 2.]]));
        let grad = arr2(&[[5., 5., 5.]]);
        assert_eq!(
            relu.backward2(&input.view(), &grad.view()),
            arr2(&[[0., 0., 5.]])
        );
    }
}
