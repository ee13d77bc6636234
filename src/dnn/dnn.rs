use super::activation::OutputActivation;
use super::dense::Dense;
use super::layer::{Layer, ParamGrads};
use crate::config::NetworkSpec;
use crate::error::ConfigError;
use crate::GanFloat;
use itertools::Itertools;
use log::trace;
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

/// Feed-forward network: `Dense => ReLU` blocks followed by a final dense
/// layer and the output activation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DNN {
    layers: Vec<Layer>,
    output: OutputActivation,
}

/// Every layer's input for one batch, plus the network output as the last entry.
#[derive(Clone, Debug)]
pub struct Trace {
    activations: Vec<Array2<GanFloat>>,
}

impl Trace {
    pub fn output(&self) -> &Array2<GanFloat> {
        // a trace always holds at least the input
        &self.activations[self.activations.len() - 1]
    }

    pub fn input(&self) -> &Array2<GanFloat> {
        &self.activations[0]
    }
}

/// Parameter gradients, one `(weight, bias)` pair per dense layer in layer order.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradients {
    dense: Vec<ParamGrads>,
}

impl Gradients {
    pub fn iter(&self) -> impl Iterator<Item = &ParamGrads> {
        self.dense.iter()
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn l2_norm(&self) -> GanFloat {
        self.dense
            .iter()
            .map(|(w, b)| w.iter().chain(b.iter()).map(|x| x * x).sum::<GanFloat>())
            .sum::<GanFloat>()
            .sqrt()
    }
}

impl AddAssign<&Gradients> for Gradients {
    /// # Panics
    /// If the two gradients come from differently shaped networks
    fn add_assign(&mut self, rhs: &Gradients) {
        assert_eq!(self.len(), rhs.len());
        for ((w, b), (dw, db)) in self.dense.iter_mut().zip(rhs.iter()) {
            *w += dw;
            *b += db;
        }
    }
}

impl DNN {
    /// # Panics
    /// If `layers` is empty
    pub fn new(layers: Vec<Layer>, output: OutputActivation) -> Self {
        assert!(!layers.is_empty());
        Self { layers, output }
    }

    /// # Errors
    /// When `spec` has fewer than two widths or a zero width.
    pub fn from_spec<R: Rng + ?Sized>(spec: &NetworkSpec, rng: &mut R) -> Result<Self, ConfigError> {
        spec.validate()?;
        let widths = &spec.widths;
        let mut layers = Vec::with_capacity(2 * widths.len());
        let last = widths.len() - 2;
        for (idx, (&in_dim, &out_dim)) in widths.iter().tuple_windows().enumerate() {
            layers.push(Layer::new_dense(Dense::init(in_dim, out_dim, rng)));
            if idx < last {
                layers.push(Layer::new_relu(out_dim));
            }
        }
        if spec.output == OutputActivation::Sigmoid {
            layers.push(Layer::new_sigmoid(spec.output_dim()));
        }
        Ok(Self {
            layers,
            output: spec.output,
        })
    }

    pub const fn output_activation(&self) -> OutputActivation {
        self.output
    }

    pub fn dense_layers(&self) -> impl Iterator<Item = &Dense> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Dense(dense) => Some(dense),
            _ => None,
        })
    }

    pub fn dense_layers_mut(&mut self) -> impl Iterator<Item = &mut Dense> {
        self.layers.iter_mut().filter_map(|layer| match layer {
            Layer::Dense(dense) => Some(dense),
            _ => None,
        })
    }

    /// # Panics
    /// If the network has no dense layer
    pub fn input_dim(&self) -> usize {
        self.dense_layers().next().unwrap().input_dim()
    }

    /// # Panics
    /// If the network has no dense layer
    pub fn output_dim(&self) -> usize {
        self.dense_layers().last().unwrap().output_dim()
    }

    pub fn num_params(&self) -> usize {
        self.dense_layers().map(|d| d.affine().num_params()).sum()
    }

    /// Maps a `(k, input_dim)` batch to `(k, output_dim)`.
    pub fn forward(&self, input: &Array2<GanFloat>) -> Array2<GanFloat> {
        debug_assert_eq!(input.ncols(), self.input_dim());
        let mut layers = self.layers.iter();
        let first = match layers.next() {
            Some(layer) => layer.forward2(&input.view()),
            None => return input.clone(),
        };
        layers.fold(first, |x, layer| layer.forward2(&x.view()))
    }

    /// Forward pass keeping every intermediate activation for [`DNN::backward`].
    pub fn forward_traced(&self, input: &Array2<GanFloat>) -> Trace {
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input.clone());
        for layer in &self.layers {
            let next = layer.forward2(&activations[activations.len() - 1].view());
            activations.push(next);
        }
        Trace { activations }
    }

    /// Backpropagates `grad_output` (gradient of a scalar objective with
    /// respect to the traced output) and returns the parameter gradients and
    /// the gradient with respect to the traced input.
    ///
    /// # Panics
    /// If `trace` was not produced by this network
    pub fn backward(
        &self,
        trace: &Trace,
        grad_output: &Array2<GanFloat>,
    ) -> (Gradients, Array2<GanFloat>) {
        assert_eq!(trace.activations.len(), self.layers.len() + 1);
        debug_assert_eq!(grad_output.shape(), trace.output().shape());
        let mut grad = grad_output.clone();
        let mut dense = Vec::new();
        for (idx, layer) in self.layers.iter().enumerate().rev() {
            let (param_grads, grad_input) = layer.backward2(
                &trace.activations[idx].view(),
                &trace.activations[idx + 1].view(),
                &grad.view(),
            );
            if let Some(param_grads) = param_grads {
                dense.push(param_grads);
            }
            grad = grad_input;
        }
        dense.reverse();
        trace!("backward through {} dense layers", dense.len());
        (Gradients { dense }, grad)
    }

    /// Clamps every dense weight into `[-bound, bound]`. Biases are left alone.
    pub fn clip_weights(&mut self, bound: GanFloat) {
        self.dense_layers_mut()
            .for_each(|dense| dense.clip_weights(bound));
    }
}

impl fmt::Display for DNN {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let layers: Vec<String> = self.layers.iter().map(|x| format!("{}", x)).collect();
        write!(f, "Input {} => {}", self.input_dim(), layers.join(" => "))
    }
}
