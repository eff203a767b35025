//! Text-generation provider implementations.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use policybot_core::{AppError, AppResult};
use std::time::Duration;

/// Build the shared HTTP client, optionally with a whole-request timeout.
pub(crate) fn http_client(timeout: Option<Duration>) -> AppResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))
}

/// Map a reqwest send failure, calling out timeouts.
pub(crate) fn send_error(provider: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Llm(format!("{} request timed out: {}", provider, err))
    } else {
        AppError::Llm(format!("Failed to send request to {}: {}", provider, err))
    }
}

/// Turn a non-success HTTP response into an error carrying the body text.
pub(crate) async fn status_error(provider: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    AppError::Llm(format!("{} API error ({}): {}", provider, status, error_text))
}
