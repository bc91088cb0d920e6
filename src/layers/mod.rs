//! Building blocks of the [`QNetwork`](crate::network::QNetwork) estimator.
//!
//! Every layer keeps what its backward pass needs from the last *recorded*
//! forward pass. [`Layer::infer`] evaluates without recording, which is how
//! bootstrapped targets are kept out of the gradient computation.

pub mod traits;
pub mod dense;
pub mod dropout;
pub mod initialization;

pub use traits::Layer;
pub use dense::DenseLayer;
pub use dropout::DropoutLayer;
pub use initialization::WeightInit;
