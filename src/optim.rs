//! Gradient-based optimizers
use crate::dnn::{Gradients, DNN};
use crate::GanFloat;
use log::debug;
use ndarray::{Array1, Array2, Zip};

pub trait Optimizer {
    /// Applies one update to `net` from `grads`.
    fn step(&mut self, net: &mut DNN, grads: &Gradients);

    fn learning_rate(&self) -> GanFloat;

    /// Changes the learning rate and discards any accumulated state, so the
    /// next step behaves like the first step of a fresh optimizer.
    fn set_learning_rate(&mut self, lr: GanFloat);

    /// Discards accumulated state without touching the learning rate.
    fn reset(&mut self);
}

/// RMSProp without momentum or centering:
///
/// `v ← α v + (1 - α) g²`, `θ ← θ - lr · g / (√v + ε)`
#[derive(Clone, Debug)]
pub struct RmsProp {
    lr: GanFloat,
    alpha: GanFloat,
    eps: GanFloat,
    /// One `(weight, bias)` accumulator per dense layer, created on the first step
    square_avg: Vec<(Array2<GanFloat>, Array1<GanFloat>)>,
}

impl RmsProp {
    pub const DEFAULT_ALPHA: GanFloat = 0.99;
    pub const DEFAULT_EPS: GanFloat = 1e-8;

    pub fn new(lr: GanFloat) -> Self {
        Self::with_params(lr, Self::DEFAULT_ALPHA, Self::DEFAULT_EPS)
    }

    pub fn with_params(lr: GanFloat, alpha: GanFloat, eps: GanFloat) -> Self {
        Self {
            lr,
            alpha,
            eps,
            square_avg: Vec::new(),
        }
    }

    pub fn square_avg(&self) -> &[(Array2<GanFloat>, Array1<GanFloat>)] {
        &self.square_avg
    }

    fn update<D: ndarray::Dimension>(
        &self,
        param: ndarray::ArrayViewMut<GanFloat, D>,
        avg: &mut ndarray::Array<GanFloat, D>,
        grad: &ndarray::Array<GanFloat, D>,
    ) {
        let (lr, alpha, eps) = (self.lr, self.alpha, self.eps);
        Zip::from(param)
            .and(avg)
            .and(grad)
            .for_each(|p, v, &g| {
                *v = alpha * *v + (1. - alpha) * g * g;
                *p -= lr * g / (v.sqrt() + eps);
            });
    }
}

impl Optimizer for RmsProp {
    /// # Panics
    /// If `grads` does not match the layout of `net`
    fn step(&mut self, net: &mut DNN, grads: &Gradients) {
        if self.square_avg.is_empty() {
            self.square_avg = grads
                .iter()
                .map(|(w, b)| (Array2::zeros(w.raw_dim()), Array1::zeros(b.raw_dim())))
                .collect();
        }
        assert_eq!(self.square_avg.len(), grads.len());
        let mut square_avg = std::mem::take(&mut self.square_avg);
        for ((dense, (avg_w, avg_b)), (grad_w, grad_b)) in net
            .dense_layers_mut()
            .zip(square_avg.iter_mut())
            .zip(grads.iter())
        {
            let aff = dense.affine_mut();
            self.update(aff.basis_mut(), avg_w, grad_w);
            self.update(aff.shift_mut(), avg_b, grad_b);
        }
        self.square_avg = square_avg;
    }

    fn learning_rate(&self) -> GanFloat {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: GanFloat) {
        debug!("rmsprop learning rate {} -> {}, resetting state", self.lr, lr);
        self.lr = lr;
        self.reset();
    }

    fn reset(&mut self) {
        self.square_avg.clear();
    }
}
