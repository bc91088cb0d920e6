//! Proportional prioritized replay.
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{IwScheduler, PrioritizedReplay, SampledBatch, SumTree, Transition};
use crate::config::ReplayConfig;
use crate::error::{AgentError, Result};

/// A ring buffer of transitions sampled proportionally to `(|δ| + eps)^alpha`.
///
/// New transitions enter with the largest priority seen so far, so each one
/// is likely to be replayed at least once before its TD error is known.
/// Importance-sampling weights `(N·P(i))^(-β)` are normalized by the largest
/// weight in the batch; β is annealed by an [`IwScheduler`] over the number
/// of sample calls.
#[derive(Clone, Debug)]
pub struct PrioritizedBuffer {
    storage: Vec<Transition>,
    capacity: usize,
    next: usize,
    batch_size: usize,
    tree: SumTree,
    max_priority: f32,
    alpha: f32,
    eps: f32,
    iw: IwScheduler,
    n_samples: usize,
    rng: StdRng,
}

impl PrioritizedBuffer {
    pub fn new(capacity: usize, batch_size: usize, seed: u64, config: &ReplayConfig) -> Result<Self> {
        if capacity == 0 {
            return Err(AgentError::invalid_parameter("capacity", "Capacity must be greater than 0"));
        }
        if batch_size == 0 {
            return Err(AgentError::invalid_parameter("batch_size", "Batch size must be greater than 0"));
        }
        if !(config.alpha >= 0.0) {
            return Err(AgentError::invalid_parameter(
                "alpha".to_string(),
                format!("must be non-negative, got {}", config.alpha),
            ));
        }
        if !(config.eps > 0.0) {
            return Err(AgentError::invalid_parameter(
                "eps".to_string(),
                format!("must be positive, got {}", config.eps),
            ));
        }

        Ok(PrioritizedBuffer {
            storage: Vec::new(),
            capacity,
            next: 0,
            batch_size,
            tree: SumTree::new(capacity),
            max_priority: 1.0,
            alpha: config.alpha,
            eps: config.eps,
            iw: IwScheduler::new(config.beta_0, config.beta_final, config.n_opts_final),
            n_samples: 0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Current importance-sampling exponent.
    pub fn beta(&self) -> f32 {
        self.iw.beta(self.n_samples)
    }

    /// Sampling probability of slot `ix`.
    pub fn probability(&self, ix: usize) -> f64 {
        let total = self.tree.total();
        if ix >= self.storage.len() || total <= 0.0 {
            0.0
        } else {
            self.tree.get(ix) / total
        }
    }

    fn leaf_value(&self, priority: f32) -> f64 {
        ((priority + self.eps) as f64).powf(self.alpha as f64)
    }
}

impl PrioritizedReplay for PrioritizedBuffer {
    fn push(&mut self, transition: Transition) {
        let ix = self.next;
        if self.storage.len() < self.capacity {
            self.storage.push(transition);
        } else {
            self.storage[ix] = transition;
        }
        let leaf = self.leaf_value(self.max_priority);
        self.tree.set(ix, leaf);
        self.next = (self.next + 1) % self.capacity;
    }

    fn sample(&mut self) -> Result<SampledBatch> {
        let len = self.storage.len();
        let total = self.tree.total();
        if len == 0 || total <= 0.0 {
            return Err(AgentError::EmptyBuffer("cannot sample from an empty replay buffer".to_string()));
        }

        let beta = self.iw.beta(self.n_samples);
        self.n_samples += 1;

        // One draw per equal-mass segment
        let segment = total / self.batch_size as f64;
        let mut indices = Vec::with_capacity(self.batch_size);
        let mut weights = Vec::with_capacity(self.batch_size);
        for i in 0..self.batch_size {
            let mass = segment * (i as f64 + self.rng.gen::<f64>());
            let ix = self.tree.find(mass).min(len - 1);
            let p = self.tree.get(ix) / total;
            indices.push(ix);
            weights.push(((len as f64 * p).powf(-beta as f64)) as f32);
        }

        let w_max = weights.iter().cloned().fold(f32::MIN_POSITIVE, f32::max);
        for w in weights.iter_mut() {
            *w /= w_max;
        }

        let transitions: Vec<&Transition> = indices.iter().map(|&ix| &self.storage[ix]).collect();
        SampledBatch::from_transitions(indices, weights, &transitions)
    }

    fn update_priority(&mut self, indices: &[usize], td_errors: &[f32]) {
        if indices.len() != td_errors.len() {
            warn!(
                "Ignoring priority update: {} indices but {} TD errors",
                indices.len(),
                td_errors.len()
            );
            return;
        }

        let mut skipped = 0;
        for (&ix, &td) in indices.iter().zip(td_errors.iter()) {
            if ix >= self.storage.len() || !td.is_finite() {
                skipped += 1;
                continue;
            }
            let priority = td.abs();
            self.max_priority = self.max_priority.max(priority);
            let leaf = self.leaf_value(priority);
            self.tree.set(ix, leaf);
        }

        if skipped > 0 {
            warn!("Skipped {} priority updates with out-of-range slots or non-finite errors", skipped);
        }
        debug!("Updated {} priorities, max priority {}", indices.len() - skipped, self.max_priority);
    }

    fn len(&self) -> usize {
        self.storage.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn transition(x: f32) -> Transition {
        Transition::new(array![x], 0, x, array![x + 1.0], false)
    }

    fn buffer(capacity: usize, batch_size: usize) -> PrioritizedBuffer {
        PrioritizedBuffer::new(capacity, batch_size, 0, &ReplayConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_sample_fails() {
        let mut buf = buffer(8, 2);
        assert!(buf.is_empty());
        assert!(matches!(buf.sample(), Err(AgentError::EmptyBuffer(_))));
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let mut buf = buffer(3, 3);
        for i in 0..5 {
            buf.push(transition(i as f32));
        }
        assert_eq!(buf.len(), 3);

        // slots 0 and 1 were overwritten by transitions 3 and 4
        let stored: Vec<f32> = buf.storage.iter().map(|t| t.reward).collect();
        assert_eq!(stored, vec![3.0, 4.0, 2.0]);
    }

    #[test]
    fn test_new_transitions_get_max_priority() {
        let mut buf = buffer(4, 2);
        buf.push(transition(0.0));
        buf.push(transition(1.0));
        buf.update_priority(&[0, 1], &[5.0, 0.1]);
        buf.push(transition(2.0));
        assert!((buf.tree.get(2) - buf.tree.get(0)).abs() < 1e-9);
    }

    #[test]
    fn test_weights_are_normalized() {
        let mut buf = buffer(16, 8);
        for i in 0..16 {
            buf.push(transition(i as f32));
        }
        let td: Vec<f32> = (0..16).map(|i| i as f32 * 0.5).collect();
        let ix: Vec<usize> = (0..16).collect();
        buf.update_priority(&ix, &td);

        let batch = buf.sample().unwrap();
        assert_eq!(batch.len(), 8);
        assert!(batch.weights.iter().all(|&w| w > 0.0 && w <= 1.0));
        let w_max = batch.weights.iter().cloned().fold(0.0, f32::max);
        assert!((w_max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sampling_is_proportional_to_priority() {
        let config = ReplayConfig { alpha: 1.0, ..ReplayConfig::default() };
        let mut buf = PrioritizedBuffer::new(2, 1, 7, &config).unwrap();
        buf.push(transition(0.0));
        buf.push(transition(1.0));
        buf.update_priority(&[0, 1], &[1.0, 3.0]);

        let n = 4000;
        let mut hits = 0;
        for _ in 0..n {
            if buf.sample().unwrap().indices[0] == 1 {
                hits += 1;
            }
        }
        // expected share is 3/4
        let share = hits as f64 / n as f64;
        assert!((share - 0.75).abs() < 0.05, "share = {}", share);
    }

    #[test]
    fn test_priority_update_shifts_distribution() {
        let mut buf = buffer(4, 1);
        for i in 0..4 {
            buf.push(transition(i as f32));
        }
        let before = buf.probability(3);
        buf.update_priority(&[0, 1, 2], &[0.0, 0.0, 0.0]);
        assert!(buf.probability(3) > before);
        assert!(buf.probability(0) > 0.0);
    }

    #[test]
    fn test_non_finite_updates_are_skipped() {
        let mut buf = buffer(4, 1);
        buf.push(transition(0.0));
        let before = buf.tree.get(0);
        buf.update_priority(&[0, 9], &[f32::NAN, 1.0]);
        assert_eq!(buf.tree.get(0), before);
        assert_eq!(buf.max_priority, 1.0);
    }

    #[test]
    fn test_beta_anneals_with_sampling() {
        let config = ReplayConfig { n_opts_final: 2, ..ReplayConfig::default() };
        let mut buf = PrioritizedBuffer::new(4, 1, 0, &config).unwrap();
        buf.push(transition(0.0));
        assert_eq!(buf.beta(), 0.4);
        buf.sample().unwrap();
        buf.sample().unwrap();
        assert_eq!(buf.beta(), 1.0);
    }
}
