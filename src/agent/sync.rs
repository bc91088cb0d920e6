use log::trace;
use ndarray::Zip;

use crate::error::{AgentError, Result};
use crate::network::ValueFunction;

/// Polyak averaging: `θ_target ← (1 − τ)·θ_target + τ·θ_source` for every parameter.
///
/// Shapes are checked for all parameters before any of them is written.
pub fn soft_update<T, S>(target: &mut T, source: &S, tau: f32) -> Result<()>
where
    T: ValueFunction + ?Sized,
    S: ValueFunction + ?Sized,
{
    let source_params = source.parameters();
    let mut target_params = target.parameters_mut();

    if source_params.len() != target_params.len() {
        return Err(AgentError::dimension_mismatch(
            format!("{} parameters", source_params.len()),
            format!("{}", target_params.len()),
        ));
    }
    for (i, (t, s)) in target_params.iter().zip(source_params.iter()).enumerate() {
        if t.shape() != s.shape() {
            return Err(AgentError::dimension_mismatch(
                format!("parameter {} of shape {:?}", i, s.shape()),
                format!("{:?}", t.shape()),
            ));
        }
    }

    for (t, s) in target_params.iter_mut().zip(source_params.iter()) {
        Zip::from(t).and(s).for_each(|t, &s| *t = (1.0 - tau) * *t + tau * s);
    }
    trace!("Soft update of target estimator with tau = {}", tau);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::QNetwork;

    #[test]
    fn test_soft_update_formula() {
        let source = QNetwork::new(3, 2, 1).unwrap();
        let mut target = QNetwork::new(3, 2, 2).unwrap();
        let before: Vec<_> = target.parameters().iter().map(|p| p.to_owned()).collect();

        soft_update(&mut target, &source, 0.25).unwrap();

        for ((t, old), s) in target.parameters().iter().zip(before.iter()).zip(source.parameters().iter()) {
            let expected = old * 0.75 + &(s * 0.25);
            for (a, b) in t.iter().zip(expected.iter()) {
                assert!((a - b).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_tau_one_copies() {
        let source = QNetwork::new(3, 2, 1).unwrap();
        let mut target = QNetwork::new(3, 2, 2).unwrap();
        soft_update(&mut target, &source, 1.0).unwrap();
        assert_eq!(target.parameters(), source.parameters());
    }

    #[test]
    fn test_shape_mismatch_leaves_target_untouched() {
        let source = QNetwork::new(3, 2, 1).unwrap();
        let mut target = QNetwork::new(3, 4, 2).unwrap();
        let before: Vec<_> = target.parameters().iter().map(|p| p.to_owned()).collect();
        assert!(soft_update(&mut target, &source, 0.5).is_err());
        let after: Vec<_> = target.parameters().iter().map(|p| p.to_owned()).collect();
        assert_eq!(before, after);
    }
}
