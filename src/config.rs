//! Configuration of the agent.
//!
//! All hyperparameters are fixed when the agent is constructed. Configurations
//! can be written to and read from JSON files.
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

use crate::error::{AgentError, Result};
use crate::loss::{HuberLoss, Loss, MseLoss};

/// Critic loss type.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy, Default)]
pub enum CriticLoss {
    /// Mean squared error.
    Mse,

    /// Smooth L1 (Huber) loss with unit threshold.
    #[default]
    SmoothL1,
}

impl CriticLoss {
    pub fn build(&self) -> Box<dyn Loss> {
        match self {
            CriticLoss::Mse => Box::new(MseLoss),
            CriticLoss::SmoothL1 => Box::new(HuberLoss::new(1.0)),
        }
    }
}

/// Optimizer applied to the online estimator.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum OptimizerConfig {
    Sgd,
    Adam { beta1: f32, beta2: f32, epsilon: f32 },
    RmsProp { beta: f32, epsilon: f32 },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Adam { beta1: 0.9, beta2: 0.999, epsilon: 1e-8 }
    }
}

/// Prioritization parameters of the default replay buffer.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct ReplayConfig {
    /// Priority exponent; 0 gives uniform sampling.
    pub alpha: f32,

    /// Initial importance-sampling exponent.
    pub beta_0: f32,

    /// Final importance-sampling exponent.
    pub beta_final: f32,

    /// Number of sample calls over which beta is annealed.
    pub n_opts_final: usize,

    /// Added to every priority so no transition becomes unreachable.
    pub eps: f32,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            beta_0: 0.4,
            beta_final: 1.0,
            n_opts_final: 100_000,
            eps: 1e-5,
        }
    }
}

/// Hyperparameters of [`PerAgent`](crate::agent::PerAgent).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct AgentConfig {
    pub obs_dim: usize,
    pub n_actions: usize,
    pub lr: f32,
    /// Number of schedule epochs between learning-rate decays.
    pub lr_step_size: usize,
    /// Multiplicative learning-rate decay applied every `lr_step_size` epochs.
    pub lr_decay: f32,
    pub batch_size: usize,
    pub gamma: f32,
    pub tau: f32,
    pub buffer_size: usize,
    /// Environment steps between learning updates.
    pub update_every: usize,
    pub seed: u64,
    /// One of `"dqn"`, `"ddqn"`, `"double dqn"`, `"doubledqn"` (case-insensitive).
    pub algorithm: String,
    pub max_grad_norm: f32,
    pub critic_loss: CriticLoss,
    pub optimizer: OptimizerConfig,
    pub replay: ReplayConfig,
    /// Abort an update whose loss or gradient norm is NaN or infinite.
    pub fail_on_non_finite: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            obs_dim: 0,
            n_actions: 0,
            lr: 1e-3,
            lr_step_size: 3,
            lr_decay: 0.1,
            batch_size: 64,
            gamma: 0.99,
            tau: 0.001,
            buffer_size: 1_000_000,
            update_every: 10,
            seed: 1234,
            algorithm: "dqn".to_string(),
            max_grad_norm: 10.0,
            critic_loss: CriticLoss::default(),
            optimizer: OptimizerConfig::default(),
            replay: ReplayConfig::default(),
            fail_on_non_finite: true,
        }
    }
}

impl AgentConfig {
    /// Default hyperparameters for the given observation dimension and action count.
    pub fn new(obs_dim: usize, n_actions: usize) -> Self {
        Self {
            obs_dim,
            n_actions,
            ..Self::default()
        }
    }

    /// Learning rate.
    pub fn lr(mut self, v: f32) -> Self {
        self.lr = v;
        self
    }

    /// Learning-rate schedule step size.
    pub fn lr_step_size(mut self, v: usize) -> Self {
        self.lr_step_size = v;
        self
    }

    pub fn lr_decay(mut self, v: f32) -> Self {
        self.lr_decay = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Soft update coefficient.
    pub fn tau(mut self, v: f32) -> Self {
        self.tau = v;
        self
    }

    /// Replay capacity.
    pub fn buffer_size(mut self, v: usize) -> Self {
        self.buffer_size = v;
        self
    }

    pub fn update_every(mut self, v: usize) -> Self {
        self.update_every = v;
        self
    }

    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Algorithm tag, checked when the agent is built.
    pub fn algorithm(mut self, v: impl Into<String>) -> Self {
        self.algorithm = v.into();
        self
    }

    pub fn max_grad_norm(mut self, v: f32) -> Self {
        self.max_grad_norm = v;
        self
    }

    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    pub fn optimizer(mut self, v: OptimizerConfig) -> Self {
        self.optimizer = v;
        self
    }

    pub fn replay(mut self, v: ReplayConfig) -> Self {
        self.replay = v;
        self
    }

    pub fn fail_on_non_finite(mut self, v: bool) -> Self {
        self.fail_on_non_finite = v;
        self
    }

    /// Checks the numeric hyperparameters. The algorithm tag is checked by
    /// [`Algorithm`](crate::agent::Algorithm) parsing.
    pub fn validate(&self) -> Result<()> {
        fn check(ok: bool, name: &str, reason: String) -> Result<()> {
            if ok {
                Ok(())
            } else {
                Err(AgentError::invalid_parameter(name.to_string(), reason))
            }
        }

        check(self.obs_dim > 0, "obs_dim", "must be positive".to_string())?;
        check(self.n_actions > 0, "n_actions", "must be positive".to_string())?;
        check(self.lr > 0.0 && self.lr.is_finite(), "lr", format!("must be positive, got {}", self.lr))?;
        check(self.lr_step_size > 0, "lr_step_size", "must be positive".to_string())?;
        check(
            self.lr_decay > 0.0 && self.lr_decay <= 1.0,
            "lr_decay",
            format!("must be in (0, 1], got {}", self.lr_decay),
        )?;
        check(self.batch_size > 0, "batch_size", "must be positive".to_string())?;
        check(
            self.gamma > 0.0 && self.gamma <= 1.0,
            "gamma",
            format!("must be in (0, 1], got {}", self.gamma),
        )?;
        check(
            self.tau > 0.0 && self.tau <= 1.0,
            "tau",
            format!("must be in (0, 1], got {}", self.tau),
        )?;
        check(
            self.buffer_size > self.batch_size,
            "buffer_size",
            format!("must exceed batch_size ({}), got {}", self.batch_size, self.buffer_size),
        )?;
        check(self.update_every > 0, "update_every", "must be positive".to_string())?;
        check(
            self.max_grad_norm > 0.0,
            "max_grad_norm",
            format!("must be positive, got {}", self.max_grad_norm),
        )?;
        check(
            self.replay.alpha >= 0.0 && self.replay.eps > 0.0,
            "replay",
            format!("alpha must be non-negative and eps positive, got {:?}", self.replay),
        )?;
        Ok(())
    }

    /// Constructs [`AgentConfig`] from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let config = serde_json::from_reader(rdr)?;
        info!("Load config of PER agent from {}", path_.to_str().unwrap_or("<non-utf8 path>"));
        Ok(config)
    }

    /// Saves [`AgentConfig`] as a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        info!("Save config of PER agent into {}", path_.to_str().unwrap_or("<non-utf8 path>"));
        Ok(())
    }
}
