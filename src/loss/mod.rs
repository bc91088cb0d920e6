//! Critic losses.
//!
//! Losses are elementwise: the agent needs the per-sample values both to
//! weight them by importance-sampling weights and to feed them back to the
//! replay buffer as new priorities.

mod functions;

pub use functions::{HuberLoss, Loss, MseLoss};
