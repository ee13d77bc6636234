use crate::GanFloat;
use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal activation applied after the last dense layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputActivation {
    /// Leave the last dense layer linear
    Identity,
    /// Logistic sigmoid, bounding outputs in `(0, 1)`
    Sigmoid,
}

impl Default for OutputActivation {
    fn default() -> Self {
        Self::Identity
    }
}

impl fmt::Display for OutputActivation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::Sigmoid => write!(f, "sigmoid"),
        }
    }
}

pub fn sigmoid(x: GanFloat) -> GanFloat {
    1. / (1. + (-x).exp())
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Sigmoid {
    ndims: usize,
}

impl Sigmoid {
    pub const fn new(ndims: usize) -> Self {
        Self { ndims }
    }

    pub fn forward2(&self, input: &ArrayView2<GanFloat>) -> Array2<GanFloat> {
        input.mapv(sigmoid)
    }

    /// Uses the cached forward output `s`: `ds/dx = s (1 - s)`.
    pub fn backward2(
        &self,
        output: &ArrayView2<GanFloat>,
        grad_output: &ArrayView2<GanFloat>,
    ) -> Array2<GanFloat> {
        Zip::from(output)
            .and(grad_output)
            .map_collect(|&s, &g| g * s * (1. - s))
    }
}

impl fmt::Display for Sigmoid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Sigmoid")
    }
}
