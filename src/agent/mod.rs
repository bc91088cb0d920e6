//! # Prioritized Experience Replay Agent
//!
//! [`PerAgent`] is a value-based agent for discrete action spaces. It learns
//! an action-value estimator from replayed transitions using either the
//! standard DQN target or the Double DQN target (see [`Algorithm`]).
//!
//! ## Learning update
//!
//! For a sampled batch with importance-sampling weights `w`:
//!
//! 1. targets `y = r + γ·Q_next·(1 − done)`, computed without recording
//! 2. `q = Q_online(s)[a]`, recorded
//! 3. elementwise loss `l = L(q, y)`, scalar loss `mean(w·l)`
//! 4. backward, global-norm gradient clipping, optimizer step
//! 5. `l` goes back to the replay as the new priorities
//! 6. soft update of the target estimator

mod algorithm;
mod per_agent;
mod sync;

pub use algorithm::Algorithm;
pub use per_agent::{PerAgent, UpdateStats};
pub use sync::soft_update;
