use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// How the bootstrap value of the next state is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// The target estimator both selects and evaluates the next action.
    Dqn,

    /// The online estimator selects the next action, the target estimator
    /// evaluates it.
    DoubleDqn,
}

impl FromStr for Algorithm {
    type Err = AgentError;

    /// Parses `"dqn"`, `"ddqn"`, `"double dqn"` or `"doubledqn"`, ignoring case
    /// and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dqn" => Ok(Algorithm::Dqn),
            "ddqn" | "double dqn" | "doubledqn" => Ok(Algorithm::DoubleDqn),
            _ => Err(AgentError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Dqn => write!(f, "dqn"),
            Algorithm::DoubleDqn => write!(f, "ddqn"),
        }
    }
}
