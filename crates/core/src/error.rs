//! Error types for policybot.
//!
//! A single error enum covers configuration, I/O, the two external services
//! (text generation and semantic search), prompts and user input.

use thiserror::Error;

/// Unified error type for policybot.
///
/// `Llm` and `Index` are the service errors: failures that originate in a
/// network-backed dependency. Everything else is local.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text-generation service errors (transport, status, timeout, bad body)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Semantic index errors (transport, status, timeout, bad body)
    #[error("Index error: {0}")]
    Index(String),

    /// Prompt loading and rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Rejected user input
    #[error("Invalid input: {0}")]
    Input(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error came from one of the external services.
    pub fn is_service_error(&self) -> bool {
        matches!(self, AppError::Llm(_) | AppError::Index(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_classification() {
        assert!(AppError::Llm("rate limited".to_string()).is_service_error());
        assert!(AppError::Index("connection refused".to_string()).is_service_error());
        assert!(!AppError::Input("empty".to_string()).is_service_error());
        assert!(!AppError::Config("bad".to_string()).is_service_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
