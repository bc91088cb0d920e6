use ndarray::{Array2, ArrayD, ArrayView2, ArrayViewD, ArrayViewMutD};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::error::{AgentError, Result};
use super::traits::Layer;

/// Dropout Layer
///
/// Randomly sets input units to 0 with probability p during training,
/// which helps prevent overfitting. In evaluation mode it is the identity.
#[derive(Clone, Debug)]
pub struct DropoutLayer {
    /// Dropout probability (probability of dropping a unit)
    pub dropout_rate: f32,

    /// Whether we're in training mode
    pub training: bool,

    size: usize,
    rng: StdRng,

    /// Mask of the last recorded forward pass, `None` when it ran in evaluation mode
    cached_mask: Option<Array2<f32>>,
    recorded: bool,
}

impl DropoutLayer {
    /// Create a new dropout layer
    pub fn new(size: usize, dropout_rate: f32, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&dropout_rate) {
            return Err(AgentError::invalid_parameter(
                "dropout_rate".to_string(),
                format!("must be in [0, 1), got {}", dropout_rate),
            ));
        }

        Ok(DropoutLayer {
            dropout_rate,
            training: true,
            size,
            rng: StdRng::seed_from_u64(seed),
            cached_mask: None,
            recorded: false,
        })
    }

    fn mask(&mut self, dim: (usize, usize)) -> Option<Array2<f32>> {
        if !self.training || self.dropout_rate == 0.0 {
            return None;
        }

        let keep = 1.0 - self.dropout_rate;
        let scale = 1.0 / keep;
        let rng = &mut self.rng;
        Some(Array2::from_shape_simple_fn(dim, || {
            if rng.gen::<f32>() < keep { scale } else { 0.0 }
        }))
    }
}

impl Layer for DropoutLayer {
    fn forward(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mask = self.mask(inputs.dim());
        let outputs = match &mask {
            Some(mask) => &inputs * mask,
            None => inputs.to_owned(),
        };
        self.cached_mask = mask;
        self.recorded = true;
        outputs
    }

    fn infer(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        match self.mask(inputs.dim()) {
            Some(mask) => &inputs * &mask,
            None => inputs.to_owned(),
        }
    }

    fn backward(&self, output_grad: ArrayView2<f32>) -> Result<(Array2<f32>, Vec<ArrayD<f32>>)> {
        if !self.recorded {
            return Err(AgentError::TrainingError(
                "forward() must be called before backward()".to_string(),
            ));
        }
        let input_grad = match &self.cached_mask {
            Some(mask) => &output_grad * mask,
            None => output_grad.to_owned(),
        };

        // Dropout has no learnable parameters
        Ok((input_grad, Vec::new()))
    }

    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f32>> {
        Vec::new()
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    fn input_size(&self) -> usize {
        self.size
    }

    fn output_size(&self) -> usize {
        self.size
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }
}
