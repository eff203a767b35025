//! HTTP client for a remote search service.
//!
//! Wire format:
//! - request: `POST <endpoint>/search` with `{"query": "...", "top_k": 50}`
//! - response: `{"results": [{"text": "...", "source": "...", "score": 0.8}, ...]}`,
//!   best match first. Only `text` is required.

use super::SemanticIndex;
use crate::passage::Passage;
use policybot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    text: String,
    #[serde(default)]
    source: Option<String>,
}

/// Semantic index reached over HTTP.
pub struct HttpSemanticIndex {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSemanticIndex {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Like `new`, with a whole-request timeout on the HTTP client.
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Index(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn convert_response(response: SearchResponse, top_k: usize) -> Vec<Passage> {
        response
            .results
            .into_iter()
            .filter(|hit| !hit.text.trim().is_empty())
            .take(top_k)
            .map(|hit| {
                tracing::trace!(source = ?hit.source, "Search hit");
                Passage::new(hit.text)
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl SemanticIndex for HttpSemanticIndex {
    fn name(&self) -> &str {
        "http"
    }

    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<Passage>> {
        let url = format!("{}/search", self.endpoint);

        let response = self
            .client
            .post(&url)
            .json(&SearchRequest { query, top_k })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Index(format!("Search request timed out: {}", e))
                } else {
                    AppError::Index(format!("Failed to reach search service: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Index(format!(
                "Search service error ({}): {}",
                status, error_text
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Index(format!("Failed to parse search response: {}", e)))?;

        Ok(Self::convert_response(parsed, top_k))
    }
}
