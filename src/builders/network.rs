use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activations::Activation;
use crate::error::{AgentError, Result};
use crate::layers::{DenseLayer, DropoutLayer, Layer, WeightInit};
use crate::network::QNetwork;

/// Builder for [`QNetwork`] with a fluent API
///
/// ```
/// use perdqn::builders::QNetworkBuilder;
/// use perdqn::activations::Activation;
///
/// let net = QNetworkBuilder::new(8, 4)
///     .hidden_sizes(&[128, 128])
///     .activation(Activation::LeakyRelu { alpha: 0.01 })
///     .seed(7)
///     .build()
///     .unwrap();
/// assert_eq!(net.layers().len(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct QNetworkBuilder {
    input_dim: usize,
    output_dim: usize,
    hidden_sizes: Vec<usize>,
    activation: Activation,
    output_activation: Activation,
    dropout: f32,
    init: Option<WeightInit>,
    seed: u64,
}

impl QNetworkBuilder {
    pub fn new(input_dim: usize, output_dim: usize) -> Self {
        QNetworkBuilder {
            input_dim,
            output_dim,
            hidden_sizes: vec![64, 64],
            activation: Activation::Relu,
            output_activation: Activation::Linear,
            dropout: 0.0,
            init: None,
            seed: 0,
        }
    }

    /// Hidden layer widths. An empty slice gives a single linear map.
    pub fn hidden_sizes(mut self, sizes: &[usize]) -> Self {
        self.hidden_sizes = sizes.to_vec();
        self
    }

    /// Activation of the hidden layers
    pub fn activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn output_activation(mut self, activation: Activation) -> Self {
        self.output_activation = activation;
        self
    }

    /// Dropout rate applied after every hidden layer while training
    pub fn dropout(mut self, rate: f32) -> Self {
        self.dropout = rate;
        self
    }

    /// Overrides the per-activation default initialization
    pub fn init(mut self, init: WeightInit) -> Self {
        self.init = Some(init);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the network
    pub fn build(self) -> Result<QNetwork> {
        if self.input_dim == 0 || self.output_dim == 0 {
            return Err(AgentError::invalid_parameter(
                "dimensions".to_string(),
                format!("input and output dimensions must be positive, got {} and {}", self.input_dim, self.output_dim),
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut sizes = Vec::with_capacity(self.hidden_sizes.len() + 2);
        sizes.push(self.input_dim);
        sizes.extend_from_slice(&self.hidden_sizes);
        sizes.push(self.output_dim);

        let n_dense = sizes.len() - 1;
        let mut layers: Vec<Box<dyn Layer>> = Vec::new();
        for (i, window) in sizes.windows(2).enumerate() {
            let is_output = i + 1 == n_dense;
            let activation = if is_output { self.output_activation } else { self.activation };
            let init = self.init.clone().unwrap_or_else(|| WeightInit::for_activation(&activation));
            layers.push(Box::new(DenseLayer::new(window[0], window[1], activation, &init, &mut rng)?));

            if !is_output && self.dropout > 0.0 {
                let dropout_seed = self.seed.wrapping_add(i as u64 + 1);
                layers.push(Box::new(DropoutLayer::new(window[1], self.dropout, dropout_seed)?));
            }
        }

        QNetwork::from_layers(layers)
    }
}
