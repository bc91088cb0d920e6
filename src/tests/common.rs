use std::cell::Cell;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activations::Activation;
use crate::error::Result;
use crate::layers::{DenseLayer, Layer, WeightInit};
use crate::network::QNetwork;
use crate::replay_buffer::{PrioritizedReplay, SampledBatch, Transition};

/// A single linear layer with the given parameters, so `Q(s) = s·W + b`.
pub fn linear_net(weights: Array2<f32>, biases: Array1<f32>) -> Result<QNetwork> {
    let (input_size, output_size) = weights.dim();
    let layer = DenseLayer::new(
        input_size,
        output_size,
        Activation::Linear,
        &WeightInit::Zeros,
        &mut StdRng::seed_from_u64(0),
    )?
    .with_weights(weights)?
    .with_biases(biases)?;
    let layers: Vec<Box<dyn Layer>> = vec![Box::new(layer)];
    QNetwork::from_layers(layers)
}

/// Factory returning the first network on its first call and the second one afterwards.
pub fn paired_factory(
    online: (Array2<f32>, Array1<f32>),
    target: (Array2<f32>, Array1<f32>),
) -> impl Fn(usize, usize, u64) -> Result<QNetwork> {
    let calls = Cell::new(0);
    move |_, _, _| {
        let n = calls.get();
        calls.set(n + 1);
        let (w, b) = if n == 0 { &online } else { &target };
        linear_net(w.clone(), b.clone())
    }
}

/// Replay that hands out its first `batch_size` transitions with unit
/// weights and records every priority update.
pub struct RecordingReplay {
    pub transitions: Vec<Transition>,
    pub batch_size: usize,
    pub samples: usize,
    pub priority_updates: Vec<(Vec<usize>, Vec<f32>)>,
}

impl RecordingReplay {
    pub fn new(batch_size: usize) -> Self {
        RecordingReplay {
            transitions: Vec::new(),
            batch_size,
            samples: 0,
            priority_updates: Vec::new(),
        }
    }
}

impl PrioritizedReplay for RecordingReplay {
    fn push(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    fn sample(&mut self) -> Result<SampledBatch> {
        self.samples += 1;
        let n = self.batch_size.min(self.transitions.len());
        let picked: Vec<&Transition> = self.transitions.iter().take(n).collect();
        SampledBatch::from_transitions((0..n).collect(), vec![1.0; n], &picked)
    }

    fn update_priority(&mut self, indices: &[usize], td_errors: &[f32]) {
        self.priority_updates.push((indices.to_vec(), td_errors.to_vec()));
    }

    fn len(&self) -> usize {
        self.transitions.len()
    }
}

/// Owned copies of every parameter, for before/after comparisons.
pub fn snapshot(params: Vec<ndarray::ArrayViewD<'_, f32>>) -> Vec<ndarray::ArrayD<f32>> {
    params.iter().map(|p| p.to_owned()).collect()
}
