//! Query expansion.
//!
//! One user question becomes several alternative search queries via a
//! text-generation call. The model decides how many; zero is a valid outcome.

use crate::deadline::with_deadline;
use policybot_core::{AppError, AppResult};
use policybot_llm::{LlmClient, LlmRequest};
use policybot_prompt::{build_prompt, PromptDefinition};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Queries derived from one original question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedQuerySet {
    /// The user's question as asked
    pub original: String,

    /// Model-generated alternatives, in model order (possibly empty)
    pub expansions: Vec<String>,
}

impl ExpandedQuerySet {
    pub fn new(original: impl Into<String>, expansions: Vec<String>) -> Self {
        Self {
            original: original.into(),
            expansions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expansions.is_empty()
    }

    /// Queries to fan out.
    ///
    /// With `include_original`, the original question goes first and any
    /// expansion equal to it (ignoring case) is skipped.
    pub fn search_queries(&self, include_original: bool) -> Vec<String> {
        if !include_original {
            return self.expansions.clone();
        }

        let original_key = self.original.trim().to_lowercase();
        let mut queries = Vec::with_capacity(self.expansions.len() + 1);
        queries.push(self.original.trim().to_string());
        queries.extend(
            self.expansions
                .iter()
                .filter(|q| q.to_lowercase() != original_key)
                .cloned(),
        );
        queries
    }
}

/// Turns a question into alternative search queries.
pub struct QueryExpander {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    timeout: Duration,
    max_queries: Option<usize>,
}

impl QueryExpander {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            prompt,
            model: model.into(),
            timeout,
            max_queries: None,
        }
    }

    /// Keep at most `max` expansions.
    pub fn with_max_queries(mut self, max: Option<usize>) -> Self {
        self.max_queries = max;
        self
    }

    fn build_request(&self, original: &str) -> AppResult<LlmRequest> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), original.to_string());
        let built = build_prompt(&self.prompt, variables)?;

        let mut request = LlmRequest::new(built.user, &self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        Ok(request)
    }

    /// Ask the model for alternative queries.
    ///
    /// Service failures propagate unchanged; an empty or unusable reply gives
    /// an empty set.
    pub async fn expand(&self, original: &str) -> AppResult<ExpandedQuerySet> {
        if original.trim().is_empty() {
            return Err(AppError::Input("Question must not be empty".to_string()));
        }

        let request = self.build_request(original)?;
        let timeout = self.timeout;
        let response = with_deadline(timeout, self.client.complete(&request), || {
            AppError::Llm(format!("Query expansion timed out after {:?}", timeout))
        })
        .await?;

        let mut expansions = parse_expansion(&response.content);
        if let Some(max) = self.max_queries {
            expansions.truncate(max);
        }

        if expansions.is_empty() {
            tracing::warn!("Query expansion returned no usable queries");
        } else {
            tracing::info!(count = expansions.len(), "Expanded question into search queries");
            tracing::debug!(queries = ?expansions, "Expanded queries");
        }

        Ok(ExpandedQuerySet::new(original, expansions))
    }
}

/// Split model output into queries: one per non-blank line, list markers and
/// wrapping quotes removed, repeats (ignoring case) dropped.
pub fn parse_expansion(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    text.lines()
        .map(|line| strip_quotes(strip_list_marker(line.trim())).trim())
        .filter(|query| !query.is_empty())
        .filter(|query| seen.insert(query.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Remove a leading `-`, `*`, `•`, `1.`, `2)` or `3:` marker.
fn strip_list_marker(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix(|c: char| matches!(c, '-' | '*' | '•')) {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return rest.trim_start();
        }
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(|c: char| matches!(c, '.' | ')' | ':')) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return rest.trim_start();
            }
        }
    }

    line
}

fn strip_quotes(query: &str) -> &str {
    for (open, close) in [('"', '"'), ('\'', '\''), ('“', '”')] {
        if let Some(inner) = query
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner;
        }
    }
    query
}
