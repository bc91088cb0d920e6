use ndarray::ArrayD;

/// Rescales all gradients together so their joint L2 norm is at most `max_norm`
#[derive(Clone, Debug, PartialEq)]
pub struct GradientClipper {
    pub max_norm: f32,
}

impl GradientClipper {
    pub fn new(max_norm: f32) -> Self {
        GradientClipper { max_norm }
    }

    /// Clip `grads` in place and return their global norm before clipping.
    pub fn clip(&self, grads: &mut [ArrayD<f32>]) -> f32 {
        let global_norm = Self::global_norm(grads);

        // A non-finite norm is left for the caller to detect
        if global_norm.is_finite() && global_norm > self.max_norm {
            let scale = self.max_norm / (global_norm + 1e-6);
            for grad in grads.iter_mut() {
                grad.mapv_inplace(|g| g * scale);
            }
        }

        global_norm
    }

    /// Joint L2 norm of all gradients
    pub fn global_norm(grads: &[ArrayD<f32>]) -> f32 {
        let norm_sq: f64 = grads
            .iter()
            .map(|g| g.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>())
            .sum();
        norm_sq.sqrt() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn test_global_norm_clipping() {
        let mut grads = vec![array![3.0f32, 0.0].into_dyn(), array![[0.0f32, 4.0]].into_dyn()];
        let clipper = GradientClipper::new(1.0);
        let before = clipper.clip(&mut grads);
        assert!((before - 5.0).abs() < 1e-6);
        let after = GradientClipper::global_norm(&grads);
        assert!(after <= 1.0 && after > 0.999);
    }

    #[test]
    fn test_small_gradients_untouched() {
        let mut grads = vec![Array1::from(vec![0.1f32, 0.2]).into_dyn()];
        let original = grads.clone();
        GradientClipper::new(10.0).clip(&mut grads);
        assert_eq!(grads, original);
    }

    #[test]
    fn test_non_finite_norm_is_reported_unclipped() {
        let mut grads = vec![array![f32::INFINITY, 1.0].into_dyn()];
        let norm = GradientClipper::new(1.0).clip(&mut grads);
        assert!(!norm.is_finite());
        assert_eq!(grads[0][[1]], 1.0);
    }
}
