use serde::{Serialize, Deserialize};

/// Step decay: lr = initial_lr * decay_rate^(epoch / step_size)
///
/// A pure function of an epoch counter owned by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearningRateScheduler {
    pub initial_lr: f32,
    pub decay_rate: f32,
    pub step_size: usize,
}

impl LearningRateScheduler {
    /// Create a step decay scheduler
    pub fn step_decay(initial_lr: f32, decay_rate: f32, step_size: usize) -> Self {
        LearningRateScheduler {
            initial_lr,
            decay_rate,
            step_size,
        }
    }

    /// Get the learning rate for a given epoch
    pub fn get_lr(&self, epoch: usize) -> f32 {
        let num_decays = (epoch / self.step_size.max(1)) as i32;
        self.initial_lr * self.decay_rate.powi(num_decays)
    }
}
