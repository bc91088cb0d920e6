use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use rand_distr::{Normal, Uniform};
use rand::Rng;
use serde::{Serialize, Deserialize};
use crate::activations::Activation;
use crate::error::{AgentError, Result};

/// Weight initialization strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeightInit {
    /// Xavier/Glorot uniform initialization
    XavierUniform,

    /// Xavier/Glorot normal initialization
    XavierNormal,

    /// He/Kaiming uniform initialization (for ReLU)
    HeUniform,

    /// He/Kaiming normal initialization (for ReLU)
    HeNormal,

    /// Weights and biases drawn from `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`
    FanInUniform,

    /// Uniform distribution with custom range
    Uniform { min: f32, max: f32 },

    /// All zeros
    Zeros,
}

impl WeightInit {
    /// Initialize weights of shape `(fan_in, fan_out)`
    pub fn initialize_weights<R: Rng + ?Sized>(&self, shape: (usize, usize), rng: &mut R) -> Result<Array2<f32>> {
        let (fan_in, fan_out) = shape;

        let weights = match self {
            WeightInit::XavierUniform => {
                let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
                Array2::random_using(shape, Uniform::new_inclusive(-limit, limit), rng)
            }

            WeightInit::XavierNormal => {
                let std = (2.0 / (fan_in + fan_out) as f32).sqrt();
                Array2::random_using(shape, normal(0.0, std)?, rng)
            }

            WeightInit::HeUniform => {
                let limit = (6.0 / fan_in as f32).sqrt();
                Array2::random_using(shape, Uniform::new_inclusive(-limit, limit), rng)
            }

            WeightInit::HeNormal => {
                let std = (2.0 / fan_in as f32).sqrt();
                Array2::random_using(shape, normal(0.0, std)?, rng)
            }

            WeightInit::FanInUniform => {
                let limit = 1.0 / (fan_in as f32).sqrt();
                Array2::random_using(shape, Uniform::new_inclusive(-limit, limit), rng)
            }

            WeightInit::Uniform { min, max } => {
                Array2::random_using(shape, uniform(*min, *max)?, rng)
            }

            WeightInit::Zeros => {
                Array2::zeros(shape)
            }
        };

        Ok(weights)
    }

    /// Initialize biases for a layer with `fan_in` inputs
    pub fn initialize_biases<R: Rng + ?Sized>(&self, fan_in: usize, size: usize, rng: &mut R) -> Result<Array1<f32>> {
        let biases = match self {
            WeightInit::FanInUniform => {
                let limit = 1.0 / (fan_in as f32).sqrt();
                Array1::random_using(size, Uniform::new_inclusive(-limit, limit), rng)
            }

            WeightInit::Uniform { min, max } => {
                Array1::random_using(size, uniform(*min, *max)?, rng)
            }

            _ => Array1::zeros(size),
        };

        Ok(biases)
    }

    /// Get the recommended initialization for an activation function
    pub fn for_activation(activation: &Activation) -> Self {
        match activation {
            Activation::Relu | Activation::LeakyRelu { .. } => WeightInit::HeUniform,
            Activation::Sigmoid | Activation::Tanh => WeightInit::XavierUniform,
            Activation::Linear => WeightInit::FanInUniform,
        }
    }
}

fn normal(mean: f32, std: f32) -> Result<Normal<f32>> {
    Normal::new(mean, std).map_err(|e| {
        AgentError::invalid_parameter("std".to_string(), e.to_string())
    })
}

fn uniform(min: f32, max: f32) -> Result<Uniform<f32>> {
    if !(min < max) {
        return Err(AgentError::invalid_parameter(
            "Uniform".to_string(),
            format!("min ({}) must be less than max ({})", min, max),
        ));
    }
    Ok(Uniform::new(min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_same_seed_same_weights() {
        let a = WeightInit::HeUniform
            .initialize_weights((4, 8), &mut StdRng::seed_from_u64(7))
            .unwrap();
        let b = WeightInit::HeUniform
            .initialize_weights((4, 8), &mut StdRng::seed_from_u64(7))
            .unwrap();
        let c = WeightInit::HeUniform
            .initialize_weights((4, 8), &mut StdRng::seed_from_u64(8))
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_he_uniform_bounds() {
        let w = WeightInit::HeUniform
            .initialize_weights((6, 10), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(w.iter().all(|&x| x.abs() <= 1.0));
    }

    #[test]
    fn test_invalid_uniform_range() {
        let init = WeightInit::Uniform { min: 1.0, max: -1.0 };
        assert!(init.initialize_weights((2, 2), &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn test_zero_biases_by_default() {
        let b = WeightInit::HeNormal
            .initialize_biases(4, 3, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(b, Array1::<f32>::zeros(3));
    }
}
