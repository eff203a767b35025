//! Configuration management for policybot.
//!
//! Configuration is merged from several layers, later ones winning:
//! - Built-in defaults
//! - Config file (`.policybot/config.yaml` or `POLICYBOT_CONFIG`)
//! - Environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "openai"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .policybot/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Text-generation provider ("ollama", "openai")
    pub provider: String,

    /// Model identifier used for both expansion and synthesis
    pub model: String,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Semantic index connection
    pub index: IndexConfig,

    /// Retrieval pipeline tuning
    pub retrieval: RetrievalConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        timeout: Option<u64>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Custom endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }

    /// HTTP timeout in seconds, if configured.
    pub fn timeout(&self) -> Option<u64> {
        match self {
            Self::OpenAI { timeout, .. } | Self::Ollama { timeout, .. } => *timeout,
        }
    }
}

/// Semantic index connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Base URL of the search service
    #[serde(default = "default_index_endpoint")]
    pub endpoint: String,

    /// HTTP timeout in seconds for the whole search request
    #[serde(rename = "timeoutSecs", default)]
    pub timeout_secs: Option<u64>,

    /// Serve passages from a local paragraph file instead of the search
    /// service. Relative paths resolve against the workspace.
    #[serde(rename = "passagesFile", default)]
    pub passages_file: Option<PathBuf>,
}

fn default_index_endpoint() -> String {
    "http://localhost:8900".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            endpoint: default_index_endpoint(),
            timeout_secs: None,
            passages_file: None,
        }
    }
}

/// Retrieval pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    /// Passages requested from the index per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Reciprocal rank fusion constant
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f64,

    /// Fused passages handed to the answer prompt
    #[serde(default = "default_max_context_passages")]
    pub max_context_passages: usize,

    /// Search the user's own question alongside the expansions
    #[serde(default = "default_true")]
    pub include_original_query: bool,

    /// Upper bound on expanded queries (none = whatever the model returns)
    #[serde(default)]
    pub max_expanded_queries: Option<usize>,

    /// Index searches in flight at once
    #[serde(default = "default_search_concurrency")]
    pub search_concurrency: usize,

    /// Per-search timeout
    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: u64,

    /// Per-completion timeout
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    /// Bot-only opening turn
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_top_k() -> usize {
    50
}

fn default_rrf_k() -> f64 {
    60.0
}

fn default_max_context_passages() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn default_search_concurrency() -> usize {
    8
}

fn default_search_timeout_secs() -> u64 {
    30
}

fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_greeting() -> String {
    "How can I assist you with your insurance queries?".to_string()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            rrf_k: default_rrf_k(),
            max_context_passages: default_max_context_passages(),
            include_original_query: default_true(),
            max_expanded_queries: None,
            search_concurrency: default_search_concurrency(),
            search_timeout_secs: default_search_timeout_secs(),
            llm_timeout_secs: default_llm_timeout_secs(),
            greeting: default_greeting(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    index: Option<IndexConfig>,
    retrieval: Option<RetrievalConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            index: IndexConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `POLICYBOT_WORKSPACE`: Override workspace path
    /// - `POLICYBOT_CONFIG`: Path to config file
    /// - `POLICYBOT_PROVIDER`: LLM provider
    /// - `POLICYBOT_MODEL`: Model identifier
    /// - `POLICYBOT_API_KEY`: API key
    /// - `POLICYBOT_INDEX_URL`: Semantic index endpoint
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("POLICYBOT_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("POLICYBOT_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.policybot_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        if let Ok(provider) = std::env::var("POLICYBOT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("POLICYBOT_MODEL") {
            config.model = model;
        }

        if let Ok(index_url) = std::env::var("POLICYBOT_INDEX_URL") {
            config.index.endpoint = index_url;
        }

        config.api_key = std::env::var("POLICYBOT_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(index) = config_file.index {
            result.index = index;
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        index_url: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(index_url) = index_url {
            self.index.endpoint = index_url;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .policybot directory.
    pub fn policybot_dir(&self) -> PathBuf {
        self.workspace.join(".policybot")
    }

    /// Resolved path of the local passages file, when one is configured.
    pub fn passages_path(&self) -> Option<PathBuf> {
        self.index
            .passages_file
            .as_ref()
            .map(|path| self.workspace.join(path))
    }

    /// Get the active provider configuration.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint for the active provider, when configured.
    pub fn provider_endpoint(&self) -> Option<&str> {
        self.get_provider_config(&self.provider)
            .and_then(ProviderConfig::endpoint)
    }

    /// Resolve the API key: `POLICYBOT_API_KEY` first, then the provider's key env var.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => std::env::var(api_key_env).ok(),
            _ => None,
        }
    }

    /// Validate configuration for the active provider and the retrieval settings.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.to_lowercase();

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "openai" && self.resolve_api_key(&self.provider).is_none() {
            return Err(AppError::Config(
                "OpenAI provider requires an API key (POLICYBOT_API_KEY or apiKeyEnv)".to_string(),
            ));
        }

        let retrieval = &self.retrieval;

        if !retrieval.rrf_k.is_finite() || retrieval.rrf_k < 0.0 {
            return Err(AppError::Config(format!(
                "retrieval.rrfK must be a finite, non-negative number, got {}",
                retrieval.rrf_k
            )));
        }

        if retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.topK must be at least 1".to_string(),
            ));
        }

        if retrieval.search_concurrency == 0 {
            return Err(AppError::Config(
                "retrieval.searchConcurrency must be at least 1".to_string(),
            ));
        }

        if retrieval.search_timeout_secs == 0 {
            return Err(AppError::Config(
                "retrieval.searchTimeoutSecs must be at least 1".to_string(),
            ));
        }

        if retrieval.llm_timeout_secs == 0 {
            return Err(AppError::Config(
                "retrieval.llmTimeoutSecs must be at least 1".to_string(),
            ));
        }

        if !(1..=3).contains(&retrieval.max_context_passages) {
            return Err(AppError::Config(format!(
                "retrieval.maxContextPassages must be between 1 and 3, got {}",
                retrieval.max_context_passages
            )));
        }

        Ok(())
    }
}
