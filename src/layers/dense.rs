use ndarray::{Array1, Array2, ArrayD, ArrayView2, ArrayViewD, ArrayViewMutD, Axis};
use rand::Rng;
use crate::activations::Activation;
use crate::error::{AgentError, Result};
use super::initialization::WeightInit;
use super::traits::Layer;

/// A fully connected (dense) layer in a neural network
#[derive(Clone, Debug)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    pre_activation_output: Option<Array2<f32>>,
    inputs: Option<Array2<f32>>,
}

impl DenseLayer {
    /// Create a new dense layer with the given input size, output size and
    /// activation function, drawing the initial parameters from `rng`.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: &WeightInit,
        rng: &mut R,
    ) -> Result<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(AgentError::invalid_parameter(
                "layer size".to_string(),
                format!("layer sizes must be positive, got {}x{}", input_size, output_size),
            ));
        }
        let weights = init.initialize_weights((input_size, output_size), rng)?;
        let biases = init.initialize_biases(input_size, output_size, rng)?;
        Ok(DenseLayer {
            weights,
            biases,
            activation,
            pre_activation_output: None,
            inputs: None,
        })
    }

    pub fn with_weights(mut self, weights: Array2<f32>) -> Result<Self> {
        if weights.dim() != self.weights.dim() {
            return Err(AgentError::dimension_mismatch(
                format!("{:?}", self.weights.dim()),
                format!("{:?}", weights.dim()),
            ));
        }
        self.weights = weights;
        Ok(self)
    }

    pub fn with_biases(mut self, biases: Array1<f32>) -> Result<Self> {
        if biases.dim() != self.biases.dim() {
            return Err(AgentError::dimension_mismatch(
                format!("{:?}", self.biases.dim()),
                format!("{:?}", biases.dim()),
            ));
        }
        self.biases = biases;
        Ok(self)
    }

    fn pre_activation(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0))
    }
}

impl Layer for DenseLayer {
    fn forward(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let pre_activation = self.pre_activation(inputs);
        let mut outputs = pre_activation.clone();
        self.activation.apply(&mut outputs);
        self.inputs = Some(inputs.to_owned());
        self.pre_activation_output = Some(pre_activation);
        outputs
    }

    fn infer(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = self.pre_activation(inputs);
        self.activation.apply(&mut outputs);
        outputs
    }

    fn backward(&self, output_grad: ArrayView2<f32>) -> Result<(Array2<f32>, Vec<ArrayD<f32>>)> {
        let pre_activation_output = self.pre_activation_output.as_ref().ok_or_else(|| {
            AgentError::TrainingError("forward() must be called before backward()".to_string())
        })?;
        let inputs = self.inputs.as_ref().ok_or_else(|| {
            AgentError::TrainingError("forward() must be called before backward()".to_string())
        })?;
        if output_grad.dim() != pre_activation_output.dim() {
            return Err(AgentError::dimension_mismatch(
                format!("{:?}", pre_activation_output.dim()),
                format!("{:?}", output_grad.dim()),
            ));
        }

        let activation_deriv = self.activation.derivative(pre_activation_output.view());
        let adjusted_error = &output_grad * &activation_deriv;
        let weight_gradients = inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));
        let input_gradients = adjusted_error.dot(&self.weights.t());

        Ok((input_gradients, vec![weight_gradients.into_dyn(), bias_gradients.into_dyn()]))
    }

    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>> {
        vec![self.weights.view().into_dyn(), self.biases.view().into_dyn()]
    }

    fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f32>> {
        vec![self.weights.view_mut().into_dyn(), self.biases.view_mut().into_dyn()]
    }

    fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }
}
