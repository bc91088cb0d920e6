//! # Activation Functions Module
//!
//! Element-wise non-linearities used by the dense layers of a [`QNetwork`](crate::network::QNetwork).
//!
//! - **ReLU**: `max(0, x)`, the default for hidden layers
//! - **LeakyReLU**: ReLU with a small negative slope
//! - **Tanh** and **Sigmoid**: bounded outputs
//! - **Linear**: identity, used on the action-value output layer
//!
//! ```rust
//! use perdqn::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.0, -0.5, 0.0, 2.0]];
//! Activation::Relu.apply(&mut data);
//! assert_eq!(data, array![[1.0, 0.0, 0.0, 2.0]]);
//! ```

pub mod functions;

pub use functions::Activation;
