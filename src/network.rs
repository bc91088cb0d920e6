//! Action-value estimators.
//!
//! The agent only talks to estimators through [`ValueFunction`]. [`QNetwork`]
//! is the multilayer perceptron shipped with the crate; anything else that
//! maps a batch of observations to a batch of action-values and can
//! backpropagate a gradient through itself can be injected instead.

use std::fmt;
use ndarray::{Array1, Array2, ArrayD, ArrayView1, ArrayView2, ArrayViewD, ArrayViewMutD, Axis};

use crate::builders::QNetworkBuilder;
use crate::error::{AgentError, Result};
use crate::layers::Layer;

/// A differentiable map from observations to one value per action.
///
/// Parameter gradients returned by [`ValueFunction::backward`] are aligned
/// with [`ValueFunction::parameters`]: the i-th gradient has the shape of the
/// i-th parameter.
pub trait ValueFunction: Send {
    /// Recorded forward pass over a `(batch, input_dim)` array.
    fn forward(&mut self, inputs: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Unrecorded forward pass. Its outputs are plain values: nothing computed
    /// here can receive a gradient.
    fn infer(&mut self, inputs: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Backpropagates `output_grad` (same shape as the last recorded output)
    /// and returns the parameter gradients.
    fn backward(&mut self, output_grad: ArrayView2<f32>) -> Result<Vec<ArrayD<f32>>>;

    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>>;

    fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f32>>;

    /// Enables or disables training-only behavior such as dropout.
    fn set_training(&mut self, training: bool);

    fn is_training(&self) -> bool;

    fn input_dim(&self) -> usize;

    fn output_dim(&self) -> usize;
}

/// Scoped evaluation mode.
///
/// Entering switches the estimator out of training mode; dropping the guard
/// restores the mode it had before, on every exit path.
pub struct InferenceMode<'a, V: ValueFunction + ?Sized> {
    estimator: &'a mut V,
    previous: bool,
}

impl<'a, V: ValueFunction + ?Sized> InferenceMode<'a, V> {
    pub fn enter(estimator: &'a mut V) -> Self {
        let previous = estimator.is_training();
        estimator.set_training(false);
        InferenceMode { estimator, previous }
    }

    /// Action-values for a single observation.
    pub fn predict(&mut self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        let outputs = self.estimator.infer(state.insert_axis(Axis(0)))?;
        Ok(outputs.index_axis_move(Axis(0), 0))
    }
}

impl<'a, V: ValueFunction + ?Sized> Drop for InferenceMode<'a, V> {
    fn drop(&mut self) {
        self.estimator.set_training(self.previous);
    }
}

/// A feed-forward Q-network built from [`Layer`]s.
///
/// # Example
///
/// ```
/// use perdqn::network::{QNetwork, ValueFunction};
/// use ndarray::Array2;
///
/// let mut net = QNetwork::new(4, 2, 1234).unwrap();
/// let q = net.infer(Array2::zeros((8, 4)).view()).unwrap();
/// assert_eq!(q.dim(), (8, 2));
/// ```
#[derive(Clone)]
pub struct QNetwork {
    layers: Vec<Box<dyn Layer>>,
    training: bool,
}

impl QNetwork {
    /// Default architecture: two hidden ReLU layers of 64 units, linear output.
    ///
    /// Initialization is fully determined by `seed`.
    pub fn new(obs_dim: usize, n_actions: usize, seed: u64) -> Result<Self> {
        QNetworkBuilder::new(obs_dim, n_actions).seed(seed).build()
    }

    /// Assemble a network from layers, checking that consecutive sizes chain.
    pub fn from_layers(layers: Vec<Box<dyn Layer>>) -> Result<Self> {
        if layers.is_empty() {
            return Err(AgentError::invalid_parameter("layers", "Network must have at least one layer"));
        }
        for pair in layers.windows(2) {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(AgentError::dimension_mismatch(
                    format!("layer input of {}", pair[0].output_size()),
                    format!("{}", pair[1].input_size()),
                ));
            }
        }
        Ok(QNetwork { layers, training: true })
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    fn check_input(&self, inputs: &ArrayView2<f32>) -> Result<()> {
        if inputs.ncols() != self.input_dim() {
            return Err(AgentError::dimension_mismatch(
                format!("{} input features", self.input_dim()),
                format!("{}", inputs.ncols()),
            ));
        }
        Ok(())
    }
}

impl ValueFunction for QNetwork {
    fn forward(&mut self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(&inputs)?;
        let mut current_output = inputs.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward(current_output.view());
        }
        Ok(current_output)
    }

    fn infer(&mut self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(&inputs)?;
        let mut current_output = inputs.to_owned();
        for layer in &mut self.layers {
            current_output = layer.infer(current_output.view());
        }
        Ok(current_output)
    }

    fn backward(&mut self, output_grad: ArrayView2<f32>) -> Result<Vec<ArrayD<f32>>> {
        let mut current_grad = output_grad.to_owned();
        let mut per_layer = Vec::with_capacity(self.layers.len());

        for layer in self.layers.iter().rev() {
            let (input_grad, grads) = layer.backward(current_grad.view())?;
            per_layer.push(grads);
            current_grad = input_grad;
        }

        per_layer.reverse();
        Ok(per_layer.into_iter().flatten().collect())
    }

    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>> {
        self.layers.iter().flat_map(|layer| layer.parameters()).collect()
    }

    fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f32>> {
        self.layers.iter_mut().flat_map(|layer| layer.parameters_mut()).collect()
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
        for layer in &mut self.layers {
            layer.set_training(training);
        }
    }

    fn is_training(&self) -> bool {
        self.training
    }

    fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.input_size())
    }

    fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.output_size())
    }
}

impl fmt::Debug for QNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QNetwork")
            .field("input_dim", &self.input_dim())
            .field("output_dim", &self.output_dim())
            .field("layers", &self.layers.len())
            .field("training", &self.training)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_output_shape() {
        let mut net = QNetwork::new(3, 5, 0).unwrap();
        let out = net.forward(Array2::zeros((7, 3)).view()).unwrap();
        assert_eq!(out.dim(), (7, 5));
        assert_eq!(net.input_dim(), 3);
        assert_eq!(net.output_dim(), 5);
    }

    #[test]
    fn test_seed_determinism() {
        let a = QNetwork::new(4, 2, 42).unwrap();
        let b = QNetwork::new(4, 2, 42).unwrap();
        let c = QNetwork::new(4, 2, 43).unwrap();
        assert_eq!(a.parameters(), b.parameters());
        assert_ne!(a.parameters(), c.parameters());
    }

    #[test]
    fn test_wrong_input_dimension() {
        let mut net = QNetwork::new(4, 2, 0).unwrap();
        let result = net.infer(Array2::zeros((1, 3)).view());
        assert!(matches!(result, Err(AgentError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_gradients_align_with_parameters() {
        let mut net = QNetwork::new(4, 3, 0).unwrap();
        let inputs = array![[0.1, -0.2, 0.3, 0.4], [1.0, 0.5, -0.5, 0.0]];
        let out = net.forward(inputs.view()).unwrap();
        let grads = net.backward(Array2::ones(out.dim()).view()).unwrap();
        let params = net.parameters();
        assert_eq!(grads.len(), params.len());
        for (g, p) in grads.iter().zip(params.iter()) {
            assert_eq!(g.shape(), p.shape());
        }
    }

    #[test]
    fn test_numerical_gradient() {
        // d(sum of outputs)/d(first weight) by central differences
        let mut net = QNetworkBuilder::new(2, 2)
            .hidden_sizes(&[3])
            .activation(crate::activations::Activation::Tanh)
            .seed(5)
            .build()
            .unwrap();
        let inputs = array![[0.3, -0.7]];
        let out = net.forward(inputs.view()).unwrap();
        let grads = net.backward(Array2::ones(out.dim()).view()).unwrap();

        let eps = 1e-3;
        let original = net.parameters()[0].iter().copied().next().unwrap();
        set_first(&mut net, original + eps);
        let plus = net.infer(inputs.view()).unwrap().sum();
        set_first(&mut net, original - eps);
        let minus = net.infer(inputs.view()).unwrap().sum();
        set_first(&mut net, original);

        let numerical = (plus - minus) / (2.0 * eps);
        let analytical = grads[0].iter().copied().next().unwrap();
        assert!((numerical - analytical).abs() < 1e-2);
    }

    fn set_first(net: &mut QNetwork, value: f32) {
        if let Some(w) = net.parameters_mut()[0].iter_mut().next() {
            *w = value;
        }
    }

    #[test]
    fn test_inference_mode_restores_training() {
        let mut net = QNetworkBuilder::new(4, 2).dropout(0.5).seed(1).build().unwrap();
        assert!(net.is_training());
        {
            let mut guard = InferenceMode::enter(&mut net);
            let a = guard.predict(array![1.0, 1.0, 1.0, 1.0].view()).unwrap();
            let b = guard.predict(array![1.0, 1.0, 1.0, 1.0].view()).unwrap();
            // dropout is off, so evaluation is deterministic
            assert_eq!(a, b);
        }
        assert!(net.is_training());
    }

    #[test]
    fn test_inference_mode_restores_on_error() {
        let mut net = QNetwork::new(4, 2, 0).unwrap();
        let result = {
            let mut guard = InferenceMode::enter(&mut net);
            guard.predict(array![1.0].view())
        };
        assert!(result.is_err());
        assert!(net.is_training());
    }

    #[test]
    fn test_from_layers_rejects_broken_chain() {
        let a = QNetwork::new(4, 3, 0).unwrap();
        let b = QNetwork::new(2, 2, 0).unwrap();
        let layers = vec![a.layers()[0].clone(), b.layers()[0].clone()];
        assert!(QNetwork::from_layers(layers).is_err());
        assert!(QNetwork::from_layers(Vec::new()).is_err());
    }
}
