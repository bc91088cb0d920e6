//! # perdqn - Prioritized Experience Replay for DQN and Double DQN
//!
//! perdqn is a value-based reinforcement-learning agent for environments with
//! a continuous observation vector and a discrete action set. It keeps an
//! online and a target action-value estimator, stores transitions in a
//! prioritized replay buffer, and learns with either the DQN or the Double
//! DQN bootstrap target.
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::array;
//! use perdqn::agent::PerAgent;
//! use perdqn::config::AgentConfig;
//! use perdqn::network::QNetwork;
//!
//! let config = AgentConfig::new(4, 2)
//!     .algorithm("ddqn")
//!     .batch_size(8)
//!     .buffer_size(1_000)
//!     .update_every(4);
//! let mut agent = PerAgent::new(QNetwork::new, config).unwrap();
//!
//! let state = array![0.0, 0.1, -0.1, 0.0];
//! let action = agent.get_action(state.view(), 0.05).unwrap();
//! agent.step(state, action, 1.0, array![0.0, 0.2, -0.1, 0.1], false).unwrap();
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions
//! - [`agent`] - The PER agent, its algorithms and the soft target update
//! - [`builders`] - Builders for networks and replay buffers
//! - [`config`] - Hyperparameters, loadable from JSON
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense and dropout layers, weight initialization
//! - [`loss`] - Elementwise critic losses
//! - [`network`] - The estimator trait, the inference guard and the Q-network
//! - [`optimizer`] - Optimizers, gradient clipping and learning-rate schedules
//! - [`replay_buffer`] - Prioritized experience replay

pub mod activations;
pub mod agent;
pub mod builders;
pub mod config;
pub mod error;
pub mod layers;
pub mod loss;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;

#[cfg(test)]
mod tests;
