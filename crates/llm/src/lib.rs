//! Text-generation integration for policybot.
//!
//! A provider-agnostic `LlmClient` trait with two HTTP implementations:
//! - **Ollama**: local runtime (default)
//! - **OpenAI**: chat completions API
//!
//! # Example
//! ```no_run
//! use policybot_llm::{create_client, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("ollama", None, None, None)?;
//! let request = LlmRequest::new("What is a term plan?", "llama3.2").with_temperature(0.0);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
