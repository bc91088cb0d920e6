//! # Experience Replay Module
//!
//! The agent consumes replay through the four operations of
//! [`PrioritizedReplay`]: `push`, `sample`, `update_priority` and `len`.
//! [`PrioritizedBuffer`] is the proportional prioritized buffer used by
//! default; any other implementation can be injected with
//! [`PerAgent::with_replay`](crate::agent::PerAgent::with_replay).

mod iw_scheduler;
mod prioritized;
mod sum_tree;

pub use iw_scheduler::IwScheduler;
pub use prioritized::PrioritizedBuffer;
pub use sum_tree::SumTree;

use ndarray::{Array1, Array2};
use crate::error::{AgentError, Result};

/// One environment transition. Immutable once stored.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
}

impl Transition {
    pub fn new(state: Array1<f32>, action: usize, reward: f32, next_state: Array1<f32>, done: bool) -> Self {
        Transition { state, action, reward, next_state, done }
    }
}

/// A batch drawn for one learning update.
///
/// All fields are parallel: row `i` of `states` belongs with `actions[i]`,
/// `weights[i]` and buffer slot `indices[i]`. `dones` holds `1.0` for
/// terminal transitions and `0.0` otherwise.
#[derive(Clone, Debug)]
pub struct SampledBatch {
    pub indices: Vec<usize>,
    pub weights: Array1<f32>,
    pub states: Array2<f32>,
    pub actions: Vec<usize>,
    pub rewards: Array1<f32>,
    pub next_states: Array2<f32>,
    pub dones: Array1<f32>,
}

impl SampledBatch {
    /// Stack transitions into a batch.
    pub fn from_transitions(indices: Vec<usize>, weights: Vec<f32>, transitions: &[&Transition]) -> Result<Self> {
        let batch_size = transitions.len();
        if batch_size == 0 {
            return Err(AgentError::EmptyBuffer("cannot build a batch from no transitions".to_string()));
        }
        if indices.len() != batch_size || weights.len() != batch_size {
            return Err(AgentError::dimension_mismatch(
                format!("{} indices and weights", batch_size),
                format!("{} indices and {} weights", indices.len(), weights.len()),
            ));
        }

        let state_size = transitions[0].state.len();
        let mut states = Array2::zeros((batch_size, state_size));
        let mut next_states = Array2::zeros((batch_size, state_size));
        let mut actions = Vec::with_capacity(batch_size);
        let mut rewards = Array1::zeros(batch_size);
        let mut dones = Array1::zeros(batch_size);

        for (i, transition) in transitions.iter().enumerate() {
            if transition.state.len() != state_size || transition.next_state.len() != state_size {
                return Err(AgentError::dimension_mismatch(
                    format!("states of size {}", state_size),
                    format!("{} and {}", transition.state.len(), transition.next_state.len()),
                ));
            }
            states.row_mut(i).assign(&transition.state);
            next_states.row_mut(i).assign(&transition.next_state);
            actions.push(transition.action);
            rewards[i] = transition.reward;
            dones[i] = if transition.done { 1.0 } else { 0.0 };
        }

        Ok(SampledBatch {
            indices,
            weights: Array1::from_vec(weights),
            states,
            actions,
            rewards,
            next_states,
            dones,
        })
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Replay storage with priority-proportional sampling.
pub trait PrioritizedReplay {
    /// Store a transition, evicting the oldest one when full.
    fn push(&mut self, transition: Transition);

    /// Draw one batch together with importance-sampling weights.
    fn sample(&mut self) -> Result<SampledBatch>;

    /// Replace the priorities of the given slots from fresh TD errors.
    fn update_priority(&mut self, indices: &[usize], td_errors: &[f32]);

    /// Number of stored transitions.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
