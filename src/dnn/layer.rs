use super::activation::Sigmoid;
use super::dense::Dense;
use super::relu::ReLU;
use crate::GanFloat;
use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ParamGrads = (Array2<GanFloat>, Array1<GanFloat>);

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub enum Layer {
    Dense(Dense),
    ReLU(ReLU),
    Sigmoid(Sigmoid),
}

impl Layer {
    pub fn new_dense(dense: Dense) -> Self {
        Self::Dense(dense)
    }

    pub fn new_relu(num_dims: usize) -> Self {
        Self::ReLU(ReLU::new(num_dims))
    }

    pub fn new_sigmoid(num_dims: usize) -> Self {
        Self::Sigmoid(Sigmoid::new(num_dims))
    }

    pub fn forward2(&self, input: &ArrayView2<GanFloat>) -> Array2<GanFloat> {
        match self {
            Self::Dense(dense) => dense.forward2(input),
            Self::ReLU(relu) => relu.forward2(input),
            Self::Sigmoid(sigmoid) => sigmoid.forward2(input),
        }
    }

    /// Given this layer's cached input and output, maps the gradient of the
    /// output to parameter gradients (dense layers only) and the gradient of
    /// the input.
    pub fn backward2(
        &self,
        input: &ArrayView2<GanFloat>,
        output: &ArrayView2<GanFloat>,
        grad_output: &ArrayView2<GanFloat>,
    ) -> (Option<ParamGrads>, Array2<GanFloat>) {
        match self {
            Self::Dense(dense) => {
                let (param_grads, grad_input) = dense.backward2(input, grad_output);
                (Some(param_grads), grad_input)
            }
            Self::ReLU(relu) => (None, relu.backward2(input, grad_output)),
            Self::Sigmoid(sigmoid) => (None, sigmoid.backward2(output, grad_output)),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Dense(dense) => write!(f, "{}", dense),
            Self::ReLU(relu) => write!(f, "{}", relu),
            Self::Sigmoid(sigmoid) => write!(f, "{}", sigmoid),
        }
    }
}
