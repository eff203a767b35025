//! Retrieval-augmented answering for one question.
//!
//! expand -> fan out searches -> fuse rankings -> synthesize from the top
//! passages. Each stage is usable on its own; `RagPipeline` wires them with
//! the configured limits.

use crate::expansion::{ExpandedQuerySet, QueryExpander};
use crate::fanout::RetrievalFanout;
use crate::fusion::{ReciprocalRankFusion, ScoredPassage};
use crate::index::SemanticIndex;
use crate::passage::Passage;
use crate::synthesis::AnswerSynthesizer;
use policybot_core::{AppConfig, AppError, AppResult, RetrievalConfig};
use policybot_llm::LlmClient;
use policybot_prompt::{load_prompt, PromptDefinition, ANSWER_PROMPT_ID, EXPAND_PROMPT_ID};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Fused retrieval output for one question.
#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    /// Expansion result; `expansions` is empty when expansion was skipped
    pub expansion: ExpandedQuerySet,

    /// Queries actually sent to the index, in order
    pub queries: Vec<String>,

    /// Fused passages, best first
    pub fused: Vec<ScoredPassage>,
}

impl Retrieval {
    pub fn passages(&self) -> Vec<Passage> {
        self.fused.iter().map(|sp| sp.passage.clone()).collect()
    }
}

/// A finished answer and what produced it.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,

    /// Queries sent to the index
    pub queries: Vec<String>,

    /// Every fused passage with its score
    pub fused: Vec<ScoredPassage>,

    /// The passages the answer was generated from
    pub context: Vec<Passage>,
}

/// The full question-to-answer pipeline.
pub struct RagPipeline {
    expander: QueryExpander,
    fanout: RetrievalFanout,
    fusion: ReciprocalRankFusion,
    synthesizer: AnswerSynthesizer,
    include_original: bool,
}

impl RagPipeline {
    pub fn new(
        client: Arc<dyn LlmClient>,
        index: Arc<dyn SemanticIndex>,
        expand_prompt: PromptDefinition,
        answer_prompt: PromptDefinition,
        model: &str,
        settings: &RetrievalConfig,
    ) -> AppResult<Self> {
        let llm_timeout = Duration::from_secs(settings.llm_timeout_secs);

        let expander = QueryExpander::new(client.clone(), expand_prompt, model, llm_timeout)
            .with_max_queries(settings.max_expanded_queries);
        let fanout = RetrievalFanout::new(index, settings.top_k)
            .with_concurrency(settings.search_concurrency)
            .with_timeout(Duration::from_secs(settings.search_timeout_secs));
        let fusion = ReciprocalRankFusion::new(settings.rrf_k)?;
        let synthesizer = AnswerSynthesizer::new(client, answer_prompt, model, llm_timeout)
            .with_max_passages(settings.max_context_passages);

        Ok(Self {
            expander,
            fanout,
            fusion,
            synthesizer,
            include_original: settings.include_original_query,
        })
    }

    /// Build from loaded configuration, resolving prompt overrides in the workspace.
    pub fn from_config(
        config: &AppConfig,
        client: Arc<dyn LlmClient>,
        index: Arc<dyn SemanticIndex>,
    ) -> AppResult<Self> {
        let expand_prompt = load_prompt(&config.workspace, EXPAND_PROMPT_ID)?;
        let answer_prompt = load_prompt(&config.workspace, ANSWER_PROMPT_ID)?;

        Self::new(
            client,
            index,
            expand_prompt,
            answer_prompt,
            &config.model,
            &config.retrieval,
        )
    }

    /// Expand the question, search every query and fuse the results.
    pub async fn retrieve(&self, question: &str) -> AppResult<Retrieval> {
        let question = validate_question(question)?;
        let expansion = self.expander.expand(question).await?;
        let queries = expansion.search_queries(self.include_original);
        self.search(expansion, queries).await
    }

    /// Search the question as-is, without expansion.
    pub async fn retrieve_direct(&self, question: &str) -> AppResult<Retrieval> {
        let question = validate_question(question)?;
        let expansion = ExpandedQuerySet::new(question, Vec::new());
        let queries = expansion.search_queries(true);
        self.search(expansion, queries).await
    }

    async fn search(
        &self,
        expansion: ExpandedQuerySet,
        queries: Vec<String>,
    ) -> AppResult<Retrieval> {
        let lists = self.fanout.fanout(&queries).await?;
        let fused = self.fusion.fuse(&lists);

        Ok(Retrieval {
            expansion,
            queries,
            fused,
        })
    }

    /// Answer one question end to end.
    pub async fn answer(&self, question: &str) -> AppResult<RagAnswer> {
        let retrieval = self.retrieve(question).await?;
        let passages = retrieval.passages();

        let answer = self.synthesizer.synthesize(question.trim(), &passages).await?;
        let context = self.synthesizer.context_passages(&passages).to_vec();

        tracing::info!(
            queries = retrieval.queries.len(),
            fused = retrieval.fused.len(),
            context = context.len(),
            "Answered question"
        );

        Ok(RagAnswer {
            answer,
            queries: retrieval.queries,
            fused: retrieval.fused,
            context,
        })
    }
}

fn validate_question(question: &str) -> AppResult<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::Input("Question must not be empty".to_string()));
    }
    Ok(question)
}
