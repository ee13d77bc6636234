#![allow(clippy::module_name_repetitions)]
//! Representation of affine transformations
use crate::GanFloat;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis};
use serde::{Deserialize, Serialize};

/// Affine map `f(x) = Ax + b` with `A` of shape `(output_dim, input_dim)`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Affine2 {
    basis: Array2<GanFloat>,
    shift: Array1<GanFloat>,
}

impl Affine2 {
    /// # Panics
    /// If improper shapes are passed in
    pub fn new(basis: Array2<GanFloat>, shift: Array1<GanFloat>) -> Self {
        debug_assert_eq!(basis.shape()[0], shift.len());
        Self { basis, shift }
    }

    pub fn basis(&self) -> ArrayView2<GanFloat> {
        self.basis.view()
    }

    pub fn basis_mut(&mut self) -> ArrayViewMut2<GanFloat> {
        self.basis.view_mut()
    }

    pub fn shift(&self) -> ArrayView1<GanFloat> {
        self.shift.view()
    }

    pub fn shift_mut(&mut self) -> ArrayViewMut1<GanFloat> {
        self.shift.view_mut()
    }

    pub fn input_dim(&self) -> usize {
        self.basis.shape()[1]
    }

    pub fn output_dim(&self) -> usize {
        self.shift.len()
    }

    pub fn shape(&self) -> &[usize] {
        self.basis.shape()
    }

    /// Apply to a batch stored one sample per row: `(k, input_dim) -> (k, output_dim)`
    pub fn apply_matrix(&self, x: &ArrayView2<GanFloat>) -> Array2<GanFloat> {
        debug_assert_eq!(x.ncols(), self.input_dim());
        x.dot(&self.basis.t()) + &self.shift
    }

    /// Pull a batch of output gradients back to the input: `(k, output_dim) -> (k, input_dim)`
    pub fn pullback(&self, grad: &ArrayView2<GanFloat>) -> Array2<GanFloat> {
        debug_assert_eq!(grad.ncols(), self.output_dim());
        grad.dot(&self.basis)
    }

    /// Parameter gradients given the batch that was fed in and the gradient of
    /// the output. Returns `(d basis, d shift)`.
    pub fn parameter_grads(
        &self,
        input: &ArrayView2<GanFloat>,
        grad: &ArrayView2<GanFloat>,
    ) -> (Array2<GanFloat>, Array1<GanFloat>) {
        debug_assert_eq!(input.nrows(), grad.nrows());
        (grad.t().dot(input), grad.sum_axis(Axis(0)))
    }

    /// Clamp every basis entry into `[-bound, bound]`. The shift is untouched.
    pub fn clamp_basis(&mut self, bound: GanFloat) {
        self.basis.mapv_inplace(|w| w.clamp(-bound, bound));
    }

    pub fn num_params(&self) -> usize {
        self.basis.len() + self.shift.len()
    }
}
