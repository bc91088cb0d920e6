//! Fluent constructors for the estimator and the replay buffer.

pub mod network;
pub mod replay_buffer;

pub use network::QNetworkBuilder;
pub use replay_buffer::PrioritizedBufferBuilder;
