use ndarray::{Array1, ArrayView1, Zip};

/// Trait defining the interface for elementwise loss functions
pub trait Loss: Send + Sync {
    /// Loss of each prediction against its target
    fn elementwise(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32>;

    /// Derivative of each elementwise loss with respect to its prediction
    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32>;
}

/// Squared error
#[derive(Clone, Copy, Debug, Default)]
pub struct MseLoss;

impl Loss for MseLoss {
    fn elementwise(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        Zip::from(&predictions).and(&targets).map_collect(|&p, &t| (p - t) * (p - t))
    }

    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        Zip::from(&predictions).and(&targets).map_collect(|&p, &t| 2.0 * (p - t))
    }
}

/// Huber loss (smooth L1)
///
/// Quadratic for errors below `delta`, linear above, so a single large TD
/// error cannot dominate the gradient.
#[derive(Clone, Copy, Debug)]
pub struct HuberLoss {
    pub delta: f32,
}

impl HuberLoss {
    pub fn new(delta: f32) -> Self {
        HuberLoss { delta }
    }
}

impl Default for HuberLoss {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Loss for HuberLoss {
    fn elementwise(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        let delta = self.delta;
        Zip::from(&predictions).and(&targets).map_collect(|&p, &t| {
            let abs_x = (p - t).abs();
            if abs_x < delta {
                0.5 * abs_x * abs_x
            } else {
                delta * (abs_x - 0.5 * delta)
            }
        })
    }

    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        let delta = self.delta;
        Zip::from(&predictions).and(&targets).map_collect(|&p, &t| {
            let x = p - t;
            if x.abs() < delta {
                x
            } else {
                delta * x.signum()
            }
        })
    }
}
