//! Parameter update rules, gradient clipping and learning-rate schedules.
//!
//! Optimizers work on the flat parameter list of a
//! [`ValueFunction`](crate::network::ValueFunction): the i-th gradient updates
//! the i-th parameter, and per-parameter state (moments) is sized from the
//! parameters the optimizer was created for.

pub mod gradient_clipper;
pub mod lr_scheduler;

use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, Zip};
use serde::{Deserialize, Serialize};

use crate::config::OptimizerConfig;
use crate::error::{AgentError, Result};

pub use gradient_clipper::GradientClipper;
pub use lr_scheduler::LearningRateScheduler;

pub trait Optimizer {
    /// Apply one update with the given learning rate.
    fn step(&mut self, params: &mut [ArrayViewMutD<'_, f32>], grads: &[ArrayD<f32>], learning_rate: f32) -> Result<()>;
}

fn check_alignment(params: &[ArrayViewMutD<'_, f32>], grads: &[ArrayD<f32>], state: Option<&[ArrayD<f32>]>) -> Result<()> {
    if params.len() != grads.len() {
        return Err(AgentError::dimension_mismatch(
            format!("{} gradients", params.len()),
            format!("{}", grads.len()),
        ));
    }
    for (i, (p, g)) in params.iter().zip(grads.iter()).enumerate() {
        let state_shape = state.map(|s| s.get(i).map(|m| m.shape()));
        if p.shape() != g.shape() || state_shape.map_or(false, |s| s != Some(p.shape())) {
            return Err(AgentError::dimension_mismatch(
                format!("parameter {} of shape {:?}", i, p.shape()),
                format!("gradient of shape {:?}", g.shape()),
            ));
        }
    }
    Ok(())
}

fn zeros_like(params: &[ArrayViewD<'_, f32>]) -> Vec<ArrayD<f32>> {
    params.iter().map(|p| ArrayD::zeros(p.raw_dim())).collect()
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
    RMSProp(RMSProp),
}

impl OptimizerWrapper {
    /// Create the configured optimizer with state for `params`.
    pub fn from_config(config: &OptimizerConfig, params: &[ArrayViewD<'_, f32>]) -> Self {
        match *config {
            OptimizerConfig::Sgd => OptimizerWrapper::SGD(SGD::new()),
            OptimizerConfig::Adam { beta1, beta2, epsilon } => {
                OptimizerWrapper::Adam(Adam::new(params, beta1, beta2, epsilon))
            }
            OptimizerConfig::RmsProp { beta, epsilon } => {
                OptimizerWrapper::RMSProp(RMSProp::new(params, beta, epsilon))
            }
        }
    }
}

impl Optimizer for OptimizerWrapper {
    fn step(&mut self, params: &mut [ArrayViewMutD<'_, f32>], grads: &[ArrayD<f32>], learning_rate: f32) -> Result<()> {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.step(params, grads, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.step(params, grads, learning_rate),
            OptimizerWrapper::RMSProp(optimizer) => optimizer.step(params, grads, learning_rate),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Default for SGD {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &mut [ArrayViewMutD<'_, f32>], grads: &[ArrayD<f32>], learning_rate: f32) -> Result<()> {
        check_alignment(params, grads, None)?;
        for (param, grad) in params.iter_mut().zip(grads.iter()) {
            param.zip_mut_with(grad, |w, &g| *w -= learning_rate * g);
        }
        Ok(())
    }
}

/// Adam with bias-corrected moment estimates.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    m: Vec<ArrayD<f32>>,
    v: Vec<ArrayD<f32>>,
    pub t: i32,
}

impl Adam {
    pub fn new(params: &[ArrayViewD<'_, f32>], beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            m: zeros_like(params),
            v: zeros_like(params),
            t: 0,
        }
    }

    pub fn default(params: &[ArrayViewD<'_, f32>]) -> Self {
        Self::new(params, 0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [ArrayViewMutD<'_, f32>], grads: &[ArrayD<f32>], learning_rate: f32) -> Result<()> {
        check_alignment(params, grads, Some(self.m.as_slice()))?;
        self.t += 1;

        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let bias1 = 1.0 - beta1.powi(self.t);
        let bias2 = 1.0 - beta2.powi(self.t);

        for (((param, grad), m), v) in params
            .iter_mut()
            .zip(grads.iter())
            .zip(self.m.iter_mut())
            .zip(self.v.iter_mut())
        {
            Zip::from(param).and(grad).and(m).and(v).for_each(|w, &g, m, v| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                let m_hat = *m / bias1;
                let v_hat = *v / bias2;
                *w -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
            });
        }
        Ok(())
    }
}

/// RMSProp optimizer
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RMSProp {
    pub beta: f32,
    pub epsilon: f32,
    v: Vec<ArrayD<f32>>,
}

impl RMSProp {
    pub fn new(params: &[ArrayViewD<'_, f32>], beta: f32, epsilon: f32) -> Self {
        RMSProp {
            beta,
            epsilon,
            v: zeros_like(params),
        }
    }

    pub fn default(params: &[ArrayViewD<'_, f32>]) -> Self {
        Self::new(params, 0.99, 1e-8)
    }
}

impl Optimizer for RMSProp {
    fn step(&mut self, params: &mut [ArrayViewMutD<'_, f32>], grads: &[ArrayD<f32>], learning_rate: f32) -> Result<()> {
        check_alignment(params, grads, Some(self.v.as_slice()))?;
        let (beta, epsilon) = (self.beta, self.epsilon);

        for ((param, grad), v) in params.iter_mut().zip(grads.iter()).zip(self.v.iter_mut()) {
            // Moving average of squared gradients
            Zip::from(param).and(grad).and(v).for_each(|w, &g, v| {
                *v = beta * *v + (1.0 - beta) * g * g;
                *w -= learning_rate * g / (v.sqrt() + epsilon);
            });
        }
        Ok(())
    }
}
