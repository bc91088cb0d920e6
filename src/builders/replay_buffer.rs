use crate::config::ReplayConfig;
use crate::error::{AgentError, Result};
use crate::replay_buffer::PrioritizedBuffer;

/// Builder for PrioritizedBuffer
pub struct PrioritizedBufferBuilder {
    capacity: Option<usize>,
    batch_size: usize,
    seed: u64,
    config: ReplayConfig,
}

impl PrioritizedBufferBuilder {
    /// Create a new prioritized buffer builder
    pub fn new() -> Self {
        PrioritizedBufferBuilder {
            capacity: None,
            batch_size: 64,
            seed: 0,
            config: ReplayConfig::default(),
        }
    }

    /// Set the capacity
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Number of transitions per sampled batch
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Priority exponent
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.config.alpha = alpha;
        self
    }

    /// Set epsilon added to every priority
    pub fn epsilon(mut self, eps: f32) -> Self {
        self.config.eps = eps;
        self
    }

    /// Anneal beta linearly from `beta_0` to `beta_final` over `n_opts_final` samples
    pub fn beta(mut self, beta_0: f32, beta_final: f32, n_opts_final: usize) -> Self {
        self.config.beta_0 = beta_0;
        self.config.beta_final = beta_final;
        self.config.n_opts_final = n_opts_final;
        self
    }

    /// Build the prioritized buffer
    pub fn build(self) -> Result<PrioritizedBuffer> {
        let capacity = self.capacity.ok_or_else(|| {
            AgentError::invalid_parameter("capacity", "Capacity not specified")
        })?;

        if self.batch_size > capacity {
            return Err(AgentError::invalid_parameter(
                "batch_size".to_string(),
                format!("must not exceed capacity ({}), got {}", capacity, self.batch_size),
            ));
        }

        PrioritizedBuffer::new(capacity, self.batch_size, self.seed, &self.config)
    }
}

impl Default for PrioritizedBufferBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prioritized_buffer_builder() {
        let buffer = PrioritizedBufferBuilder::new()
            .capacity(500)
            .batch_size(32)
            .alpha(0.7)
            .epsilon(1e-5)
            .beta(0.5, 1.0, 1000)
            .build()
            .unwrap();

        assert_eq!(buffer.capacity(), 500);
        assert_eq!(buffer.batch_size(), 32);
        assert_eq!(buffer.beta(), 0.5);
    }

    #[test]
    fn test_builder_errors() {
        // No capacity
        assert!(PrioritizedBufferBuilder::new().build().is_err());

        // Zero capacity
        assert!(PrioritizedBufferBuilder::new().capacity(0).batch_size(0).build().is_err());

        // Batch larger than the buffer
        assert!(PrioritizedBufferBuilder::new().capacity(8).batch_size(16).build().is_err());

        // Invalid epsilon
        let result = PrioritizedBufferBuilder::new()
            .capacity(100)
            .epsilon(0.0)
            .build();
        assert!(result.is_err());
    }
}
