//! Command handlers for the policybot CLI.

pub mod ask;
pub mod chat;
pub mod prompts;
pub mod search;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use prompts::PromptsCommand;
pub use search::SearchCommand;

use policybot_core::config::{AppConfig, ProviderConfig};
use policybot_core::AppResult;
use policybot_llm::create_client;
use policybot_rag::{HttpSemanticIndex, InMemoryIndex, RagPipeline, SemanticIndex};
use std::sync::Arc;
use std::time::Duration;

/// Wire the configured provider and search service into a pipeline.
pub(crate) fn build_pipeline(config: &AppConfig) -> AppResult<RagPipeline> {
    config.validate()?;

    let provider_config = config.get_provider_config(&config.provider);
    let timeout = provider_config
        .and_then(ProviderConfig::timeout)
        .map(Duration::from_secs);
    let api_key = config.resolve_api_key(&config.provider);

    let client = create_client(
        &config.provider,
        config.provider_endpoint(),
        api_key.as_deref(),
        timeout,
    )?;
    let index = build_index(config)?;

    tracing::debug!(provider = client.provider_name(), "Pipeline ready");

    RagPipeline::from_config(config, client, index)
}

/// The local passages file when configured, the search service otherwise.
fn build_index(config: &AppConfig) -> AppResult<Arc<dyn SemanticIndex>> {
    if let Some(path) = config.passages_path() {
        tracing::info!(path = ?path, "Using in-memory index");
        return Ok(Arc::new(InMemoryIndex::load(&path)?));
    }

    let index = match config.index.timeout_secs {
        Some(secs) => {
            HttpSemanticIndex::with_timeout(&config.index.endpoint, Duration::from_secs(secs))?
        }
        None => HttpSemanticIndex::new(&config.index.endpoint),
    };
    tracing::info!(endpoint = %config.index.endpoint, "Using search service");
    Ok(Arc::new(index))
}

/// Serialize `value` as pretty JSON to stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use policybot_core::AppError;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_build_index_prefers_passages_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("plans.txt"),
            "The gold plan offers whole life cover.\n\nThe cash back plan pays every 5 years.\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.workspace = temp_dir.path().to_path_buf();
        config.index.passages_file = Some("plans.txt".into());

        let index = build_index(&config).unwrap();
        let results = index.search("gold plan", 5).await.unwrap();
        assert_eq!(results[0].text(), "The gold plan offers whole life cover.");
    }

    #[test]
    fn test_build_index_missing_passages_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.workspace = temp_dir.path().to_path_buf();
        config.index.passages_file = Some("missing.txt".into());

        assert!(matches!(build_index(&config), Err(AppError::Index(_))));
    }
}
