use log::{debug, info, warn};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::algorithm::Algorithm;
use super::sync::soft_update;
use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::loss::Loss;
use crate::network::{InferenceMode, ValueFunction};
use crate::optimizer::{GradientClipper, LearningRateScheduler, Optimizer, OptimizerWrapper};
use crate::replay_buffer::{PrioritizedBuffer, PrioritizedReplay, SampledBatch, Transition};

/// Diagnostics of one learning update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpdateStats {
    /// Importance-weighted mean loss.
    pub loss: f32,
    /// Global gradient norm before clipping.
    pub grad_norm: f32,
    /// Global gradient norm actually applied.
    pub clipped_grad_norm: f32,
    pub learning_rate: f32,
    /// Mean action-value of the taken actions.
    pub mean_q: f32,
}

/// DQN / Double DQN agent learning from prioritized replay.
///
/// The agent owns an online and a target estimator of the same architecture.
/// Environment transitions go in through [`PerAgent::step`]; once the replay
/// holds more than `batch_size` transitions, every `update_every`-th step
/// samples a batch and performs one gradient update of the online estimator,
/// after which the target estimator is moved towards it by a soft update.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use perdqn::agent::PerAgent;
/// use perdqn::config::AgentConfig;
/// use perdqn::network::QNetwork;
///
/// let config = AgentConfig::new(2, 3).batch_size(4).buffer_size(100).update_every(2);
/// let mut agent = PerAgent::new(QNetwork::new, config).unwrap();
///
/// let state = array![0.1, -0.2];
/// let action = agent.get_action(state.view(), 0.1).unwrap();
/// agent.step(state, action, 1.0, array![0.0, 0.3], false).unwrap();
/// assert_eq!(agent.iter(), 0);
/// ```
pub struct PerAgent<V, R = PrioritizedBuffer>
where
    V: ValueFunction,
    R: PrioritizedReplay,
{
    config: AgentConfig,
    algorithm: Algorithm,
    online: V,
    target: V,
    optimizer: OptimizerWrapper,
    scheduler: LearningRateScheduler,
    lr_epoch: usize,
    clipper: GradientClipper,
    loss: Box<dyn Loss>,
    replay: R,
    rng: StdRng,
    t_step: usize,
    iter: usize,
}

impl<V: ValueFunction> PerAgent<V, PrioritizedBuffer> {
    /// Build an agent with the default prioritized buffer.
    ///
    /// `factory(obs_dim, n_actions, seed)` is called twice, first for the
    /// online estimator and then for the target estimator. The algorithm tag
    /// is checked before the factory is called.
    pub fn new<F>(factory: F, config: AgentConfig) -> Result<Self>
    where
        F: Fn(usize, usize, u64) -> Result<V>,
    {
        let algorithm = config.algorithm.parse::<Algorithm>()?;
        config.validate()?;
        let replay = PrioritizedBuffer::new(config.buffer_size, config.batch_size, config.seed, &config.replay)?;
        Self::build(factory, config, algorithm, replay)
    }
}

impl<V, R> PerAgent<V, R>
where
    V: ValueFunction,
    R: PrioritizedReplay,
{
    /// Build an agent around a caller-provided replay.
    pub fn with_replay<F>(factory: F, config: AgentConfig, replay: R) -> Result<Self>
    where
        F: Fn(usize, usize, u64) -> Result<V>,
    {
        let algorithm = config.algorithm.parse::<Algorithm>()?;
        config.validate()?;
        Self::build(factory, config, algorithm, replay)
    }

    fn build<F>(factory: F, config: AgentConfig, algorithm: Algorithm, replay: R) -> Result<Self>
    where
        F: Fn(usize, usize, u64) -> Result<V>,
    {
        let online = factory(config.obs_dim, config.n_actions, config.seed)?;
        let target = factory(config.obs_dim, config.n_actions, config.seed)?;
        check_estimator(&online, &config, "online")?;
        check_estimator(&target, &config, "target")?;

        let online_shapes: Vec<Vec<usize>> = online.parameters().iter().map(|p| p.shape().to_vec()).collect();
        let target_shapes: Vec<Vec<usize>> = target.parameters().iter().map(|p| p.shape().to_vec()).collect();
        if online_shapes != target_shapes {
            return Err(AgentError::dimension_mismatch(
                format!("target parameters {:?}", online_shapes),
                format!("{:?}", target_shapes),
            ));
        }

        let optimizer = OptimizerWrapper::from_config(&config.optimizer, &online.parameters());
        let scheduler = LearningRateScheduler::step_decay(config.lr, config.lr_decay, config.lr_step_size);
        let clipper = GradientClipper::new(config.max_grad_norm);
        let loss = config.critic_loss.build();

        info!(
            "PER agent: algorithm={}, obs_dim={}, n_actions={}, lr={}, batch_size={}, gamma={}, tau={}, buffer_size={}, update_every={}, seed={}",
            algorithm,
            config.obs_dim,
            config.n_actions,
            config.lr,
            config.batch_size,
            config.gamma,
            config.tau,
            config.buffer_size,
            config.update_every,
            config.seed
        );

        Ok(PerAgent {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            algorithm,
            online,
            target,
            optimizer,
            scheduler,
            lr_epoch: 0,
            clipper,
            loss,
            replay,
            t_step: 0,
            iter: 0,
        })
    }

    /// ε-greedy action for one observation.
    ///
    /// With probability `eps` a uniformly random action, otherwise the first
    /// action with the largest online value. The online estimator is
    /// evaluated in inference mode and its previous mode is restored.
    pub fn get_action(&mut self, state: ArrayView1<f32>, eps: f32) -> Result<usize> {
        if !(0.0..=1.0).contains(&eps) {
            return Err(AgentError::invalid_parameter(
                "eps".to_string(),
                format!("must be in [0, 1], got {}", eps),
            ));
        }
        self.check_state(state.len(), "state")?;

        if self.rng.gen::<f32>() < eps {
            return Ok(self.rng.gen_range(0..self.config.n_actions));
        }
        let q_values = InferenceMode::enter(&mut self.online).predict(state)?;
        Ok(argmax(q_values.view()))
    }

    /// Greedy action, same as `get_action(state, 0.0)`.
    pub fn greedy_action(&mut self, state: ArrayView1<f32>) -> Result<usize> {
        self.get_action(state, 0.0)
    }

    /// Record a transition and learn when the cadence allows it.
    ///
    /// Out-of-range actions, mismatched dimensions and non-finite values are
    /// rejected before anything is stored. Once past warm-up, `t_step`
    /// advances on every call, including one whose update fails.
    pub fn step(
        &mut self,
        state: Array1<f32>,
        action: usize,
        reward: f32,
        next_state: Array1<f32>,
        done: bool,
    ) -> Result<()> {
        if action >= self.config.n_actions {
            return Err(AgentError::InvalidAction { action, n_actions: self.config.n_actions });
        }
        self.check_state(state.len(), "state")?;
        self.check_state(next_state.len(), "next_state")?;
        // Non-finite transitions are never stored
        if !reward.is_finite() {
            return Err(AgentError::invalid_parameter(
                "reward".to_string(),
                format!("must be finite, got {}", reward),
            ));
        }
        check_finite(&state, "state")?;
        check_finite(&next_state, "next_state")?;

        self.replay.push(Transition::new(state, action, reward, next_state, done));

        // Warm-up: no learning and no cadence progress until the buffer
        // holds more than one batch
        if self.replay.len() <= self.config.batch_size {
            return Ok(());
        }

        // The cadence advances even when the update fails
        let learn = self.t_step % self.config.update_every == 0;
        self.t_step += 1;
        if learn {
            let batch = self.replay.sample()?;
            self.update(batch)?;
            self.iter += 1;
        }
        Ok(())
    }

    /// Bootstrapped targets `r + γ·Q_next·(1 − done)` for a batch.
    ///
    /// Neither estimator records anything here; the targets are plain values.
    pub fn compute_targets(&mut self, batch: &SampledBatch) -> Result<Array1<f32>> {
        let next_states = batch.next_states.view();
        let q_next: Array1<f32> = match self.algorithm {
            Algorithm::Dqn => {
                let next_q = self.target.infer(next_states)?;
                next_q.map_axis(Axis(1), |row| row[argmax(row)])
            }
            Algorithm::DoubleDqn => {
                let online_next = self.online.infer(next_states)?;
                let target_next = self.target.infer(next_states)?;
                online_next
                    .outer_iter()
                    .zip(target_next.outer_iter())
                    .map(|(online_row, target_row)| target_row[argmax(online_row)])
                    .collect()
            }
        };

        let not_done = batch.dones.mapv(|d| 1.0 - d);
        Ok(&batch.rewards + &(q_next * self.config.gamma * &not_done))
    }

    /// One gradient update of the online estimator on `batch`.
    ///
    /// Order: targets, importance-weighted loss, backward, gradient clipping,
    /// optimizer step, priority feedback, soft update of the target. A
    /// non-finite loss or gradient norm aborts before the optimizer step when
    /// `fail_on_non_finite` is set.
    pub fn update(&mut self, batch: SampledBatch) -> Result<UpdateStats> {
        let n = batch.len();
        if n == 0 {
            return Err(AgentError::EmptyBuffer("cannot update on an empty batch".to_string()));
        }
        if batch.weights.len() != n || batch.rewards.len() != n || batch.dones.len() != n {
            return Err(AgentError::dimension_mismatch(
                format!("{} weights, rewards and dones", n),
                format!("{}, {} and {}", batch.weights.len(), batch.rewards.len(), batch.dones.len()),
            ));
        }
        if let Some(&action) = batch.actions.iter().find(|&&a| a >= self.config.n_actions) {
            return Err(AgentError::InvalidAction { action, n_actions: self.config.n_actions });
        }

        let q_targets = self.compute_targets(&batch)?;

        let q_all = self.online.forward(batch.states.view())?;
        let q_expected: Array1<f32> = batch
            .actions
            .iter()
            .enumerate()
            .map(|(i, &a)| q_all[[i, a]])
            .collect();

        let td_errors = self.loss.elementwise(q_expected.view(), q_targets.view());
        let loss = (&td_errors * &batch.weights).sum() / n as f32;

        // d(loss)/d(q_all) is zero except at the taken actions
        let dq = self.loss.gradient(q_expected.view(), q_targets.view()) * &batch.weights / n as f32;
        let mut output_grad = Array2::<f32>::zeros(q_all.raw_dim());
        for (i, &a) in batch.actions.iter().enumerate() {
            output_grad[[i, a]] = dq[i];
        }
        let mut grads = self.online.backward(output_grad.view())?;
        let grad_norm = self.clipper.clip(&mut grads);

        if !loss.is_finite() || !grad_norm.is_finite() {
            let msg = format!("loss = {}, grad_norm = {} at iteration {}", loss, grad_norm, self.iter);
            if self.config.fail_on_non_finite {
                return Err(AgentError::NonFinite(msg));
            }
            warn!("Non-finite update: {}", msg);
        }
        let clipped_grad_norm = GradientClipper::global_norm(&grads);

        let learning_rate = self.learning_rate();
        {
            let mut params = self.online.parameters_mut();
            self.optimizer.step(&mut params, &grads, learning_rate)?;
        }

        self.replay.update_priority(&batch.indices, &td_errors.to_vec());
        soft_update(&mut self.target, &self.online, self.config.tau)?;

        let stats = UpdateStats {
            loss,
            grad_norm,
            clipped_grad_norm,
            learning_rate,
            mean_q: q_expected.mean().unwrap_or(0.0),
        };
        debug!(
            "iter {}: loss={:.6}, grad_norm={:.4}, clipped={:.4}, lr={}, mean_q={:.4}",
            self.iter, stats.loss, stats.grad_norm, stats.clipped_grad_norm, stats.learning_rate, stats.mean_q
        );
        Ok(stats)
    }

    /// Advance the learning-rate schedule by one epoch.
    pub fn step_lr_schedule(&mut self) {
        let before = self.learning_rate();
        self.lr_epoch += 1;
        let after = self.learning_rate();
        if after != before {
            info!("Learning rate decayed from {} to {} at epoch {}", before, after, self.lr_epoch);
        }
    }

    /// Learning rate of the next update.
    pub fn learning_rate(&self) -> f32 {
        self.scheduler.get_lr(self.lr_epoch)
    }

    /// Steps counted after warm-up.
    pub fn t_step(&self) -> usize {
        self.t_step
    }

    /// Number of learning updates performed.
    pub fn iter(&self) -> usize {
        self.iter
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn online(&self) -> &V {
        &self.online
    }

    pub fn target(&self) -> &V {
        &self.target
    }

    pub fn replay(&self) -> &R {
        &self.replay
    }

    pub fn replay_mut(&mut self) -> &mut R {
        &mut self.replay
    }

    fn check_state(&self, len: usize, name: &str) -> Result<()> {
        if len != self.config.obs_dim {
            return Err(AgentError::dimension_mismatch(
                format!("{} of size {}", name, self.config.obs_dim),
                format!("{}", len),
            ));
        }
        Ok(())
    }
}

fn check_estimator<V: ValueFunction>(estimator: &V, config: &AgentConfig, which: &str) -> Result<()> {
    if estimator.input_dim() != config.obs_dim || estimator.output_dim() != config.n_actions {
        return Err(AgentError::dimension_mismatch(
            format!("{} estimator mapping {} -> {}", which, config.obs_dim, config.n_actions),
            format!("{} -> {}", estimator.input_dim(), estimator.output_dim()),
        ));
    }
    Ok(())
}

fn check_finite(values: &Array1<f32>, name: &str) -> Result<()> {
    if let Some(v) = values.iter().find(|v| !v.is_finite()) {
        return Err(AgentError::invalid_parameter(
            name.to_string(),
            format!("must be finite, found {}", v),
        ));
    }
    Ok(())
}

/// Index of the first maximum. NaN entries never win.
pub(crate) fn argmax(values: ArrayView1<f32>) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_argmax_takes_first_maximum() {
        assert_eq!(argmax(array![1.0, 3.0, 3.0, 2.0].view()), 1);
        assert_eq!(argmax(array![-1.0, -1.0].view()), 0);
        assert_eq!(argmax(array![f32::NAN, 0.5].view()), 1);
    }
}
