use thiserror::Error;

/// Result type for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum AgentError {
    /// The algorithm tag did not match a known alias
    #[error("Unsupported algorithm '{0}': expected one of \"dqn\", \"ddqn\", \"double dqn\", \"doubledqn\"")]
    UnsupportedAlgorithm(String),

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Invalid dimensions for operations
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Action index outside of the action space
    #[error("Invalid action {action}: must be less than {n_actions}")]
    InvalidAction {
        action: usize,
        n_actions: usize,
    },

    /// Empty buffer or container
    #[error("Empty buffer: {0}")]
    EmptyBuffer(String),

    /// Loss or gradients became NaN or infinite
    #[error("Non-finite value: {0}")]
    NonFinite(String),

    /// Training error
    #[error("Training error: {0}")]
    TrainingError(String),

    /// IO errors (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper functions for common error patterns
impl AgentError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        AgentError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        AgentError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AgentError::UnsupportedAlgorithm("banana".to_string());
        assert!(err.to_string().contains("banana"));

        let err = AgentError::invalid_parameter("gamma", "must be in (0, 1]");
        assert_eq!(err.to_string(), "Invalid parameter 'gamma': must be in (0, 1]");

        let err = AgentError::InvalidAction { action: 5, n_actions: 2 };
        assert_eq!(err.to_string(), "Invalid action 5: must be less than 2");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AgentError = io.into();
        assert!(matches!(err, AgentError::Io(_)));
    }
}
