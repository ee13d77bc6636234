pub mod activation;
pub mod dense;
pub mod dnn;
pub mod layer;
pub mod relu;

pub use activation::{OutputActivation, Sigmoid};
pub use dense::Dense;
pub use dnn::{Gradients, Trace, DNN};
pub use layer::{Layer, ParamGrads};
pub use relu::ReLU;
