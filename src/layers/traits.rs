use ndarray::{Array2, ArrayD, ArrayView2, ArrayViewD, ArrayViewMutD};
use crate::error::Result;

/// Trait defining the interface for neural network layers
pub trait Layer: Send + Sync {
    /// Forward propagation for a batch of inputs, recording the intermediate
    /// values required by [`Layer::backward`]
    fn forward(&mut self, inputs: ArrayView2<f32>) -> Array2<f32>;

    /// Forward propagation that records nothing
    fn infer(&mut self, inputs: ArrayView2<f32>) -> Array2<f32>;

    /// Backward propagation of the gradient with respect to this layer's output.
    ///
    /// Returns the gradient with respect to the layer input and the gradients
    /// of the parameters, in the same order as [`Layer::parameters`].
    fn backward(&self, output_grad: ArrayView2<f32>) -> Result<(Array2<f32>, Vec<ArrayD<f32>>)>;

    /// Learnable parameters
    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>>;

    /// Mutable views of the learnable parameters
    fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f32>>;

    /// Switch between training and evaluation behavior
    fn set_training(&mut self, _training: bool) {}

    /// Get the input size of the layer
    fn input_size(&self) -> usize;

    /// Get the output size of the layer
    fn output_size(&self) -> usize;

    /// Clone the layer into a boxed trait object
    fn clone_box(&self) -> Box<dyn Layer>;
}

impl Clone for Box<dyn Layer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
