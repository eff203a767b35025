//! Scripted stand-ins for the model and the index.

use crate::index::SemanticIndex;
use crate::passage::Passage;
use policybot_core::{AppError, AppResult};
use policybot_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Replies with queued results in order and records every request.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<AppResult<String>>>,
    requests: Mutex<Vec<LlmRequest>>,
    delay: Option<Duration>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<AppResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Llm("no scripted reply left".to_string())))?;

        Ok(LlmResponse {
            content: reply,
            model: request.model.clone(),
            usage: LlmUsage::new(10, 10),
            done: true,
        })
    }
}

/// Returns fixed passages, optionally per query, and records queries searched.
pub struct StaticIndex {
    default: Vec<Passage>,
    per_query: HashMap<String, Vec<Passage>>,
    failures: HashSet<String>,
    delays: HashMap<String, Duration>,
    searched: Mutex<Vec<String>>,
}

impl StaticIndex {
    pub fn new(default: &[&str]) -> Self {
        Self {
            default: to_passages(default),
            per_query: HashMap::new(),
            failures: HashSet::new(),
            delays: HashMap::new(),
            searched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_results(mut self, query: &str, passages: &[&str]) -> Self {
        self.per_query
            .insert(query.to_string(), to_passages(passages));
        self
    }

    pub fn with_failure(mut self, query: &str) -> Self {
        self.failures.insert(query.to_string());
        self
    }

    pub fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    pub fn searched(&self) -> Vec<String> {
        self.searched.lock().unwrap().clone()
    }
}

fn to_passages(texts: &[&str]) -> Vec<Passage> {
    texts.iter().map(|t| Passage::from(*t)).collect()
}

#[async_trait::async_trait]
impl SemanticIndex for StaticIndex {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<Passage>> {
        self.searched.lock().unwrap().push(query.to_string());

        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }

        if self.failures.contains(query) {
            return Err(AppError::Index(format!("search failed for '{}'", query)));
        }

        let passages = self.per_query.get(query).unwrap_or(&self.default);
        Ok(passages.iter().take(top_k).cloned().collect())
    }
}
