use serde::{Deserialize, Serialize};

/// Linear annealing of the importance-sampling exponent β.
///
/// β moves from `beta_0` to `beta_final` over the first `n_opts_final`
/// sample calls and stays at `beta_final` afterwards.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct IwScheduler {
    pub beta_0: f32,
    pub beta_final: f32,
    pub n_opts_final: usize,
}

impl IwScheduler {
    pub fn new(beta_0: f32, beta_final: f32, n_opts_final: usize) -> Self {
        IwScheduler { beta_0, beta_final, n_opts_final }
    }

    /// β after `n_samples` sample calls.
    pub fn beta(&self, n_samples: usize) -> f32 {
        if n_samples >= self.n_opts_final {
            return self.beta_final;
        }
        let progress = n_samples as f32 / self.n_opts_final as f32;
        self.beta_0 + (self.beta_final - self.beta_0) * progress
    }
}

#[cfg(test)]
mod tests {
    use super::IwScheduler;

    #[test]
    fn test_linear_annealing() {
        let scheduler = IwScheduler::new(0.4, 1.0, 100);
        assert_eq!(scheduler.beta(0), 0.4);
        assert!((scheduler.beta(50) - 0.7).abs() < 1e-6);
        assert_eq!(scheduler.beta(100), 1.0);
        assert_eq!(scheduler.beta(1000), 1.0);
    }

    #[test]
    fn test_zero_horizon_starts_final() {
        assert_eq!(IwScheduler::new(0.4, 1.0, 0).beta(0), 1.0);
    }
}
