//! Answer synthesis from the best fused passages.

use crate::deadline::with_deadline;
use crate::passage::Passage;
use policybot_core::{AppError, AppResult};
use policybot_llm::{LlmClient, LlmRequest};
use policybot_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on passages placed in the answer context.
pub const MAX_CONTEXT_PASSAGES: usize = 3;

/// Separator between passages in the rendered context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Reply used when retrieval produced nothing to answer from.
pub const NO_CONTEXT_ANSWER: &str = "I could not find any information about that in the available plan documents. Could you rephrase the question or ask about a specific plan?";

/// Generates the final answer from a question and its context passages.
pub struct AnswerSynthesizer {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    timeout: Duration,
    max_passages: usize,
}

impl AnswerSynthesizer {
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
            max_passages: MAX_CONTEXT_PASSAGES,
        }
    }

    /// Use fewer context passages; clamped to `1..=MAX_CONTEXT_PASSAGES`.
    pub fn with_max_passages(mut self, max: usize) -> Self {
        self.max_passages = max.clamp(1, MAX_CONTEXT_PASSAGES);
        self
    }

    pub fn max_passages(&self) -> usize {
        self.max_passages
    }

    /// The leading passages that go into the context, in fused order.
    pub fn context_passages<'a>(&self, passages: &'a [Passage]) -> &'a [Passage] {
        &passages[..passages.len().min(self.max_passages)]
    }

    /// Render the answer request for `question` over `passages`.
    pub fn build_request(&self, question: &str, passages: &[Passage]) -> AppResult<LlmRequest> {
        let context = self
            .context_passages(passages)
            .iter()
            .map(Passage::text)
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("context".to_string(), context);
        let built = build_prompt(&self.prompt, variables)?;

        let mut request = LlmRequest::new(built.user, &self.model).with_temperature(0.0);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        Ok(request)
    }

    /// Answer `question` from the leading `passages`.
    ///
    /// With no passages at all the model is not consulted and a fixed decline
    /// is returned.
    pub async fn synthesize(&self, question: &str, passages: &[Passage]) -> AppResult<String> {
        if passages.is_empty() {
            tracing::info!("No passages retrieved, declining to answer");
            return Ok(NO_CONTEXT_ANSWER.to_string());
        }

        let request = self.build_request(question, passages)?;
        tracing::debug!(
            passages = self.context_passages(passages).len(),
            model = %self.model,
            "Synthesizing answer"
        );

        let timeout = self.timeout;
        let response = with_deadline(timeout, self.client.complete(&request), || {
            AppError::Llm(format!("Answer generation timed out after {:?}", timeout))
        })
        .await?;

        tracing::info!(
            completion_tokens = response.usage.completion_tokens,
            "Answer generated"
        );

        Ok(response.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::ScriptedLlm;
    use policybot_prompt::{builtin_prompt, ANSWER_PROMPT_ID};

    fn synthesizer(llm: Arc<ScriptedLlm>) -> AnswerSynthesizer {
        AnswerSynthesizer::new(
            llm,
            builtin_prompt(ANSWER_PROMPT_ID).unwrap(),
            "test-model",
            Duration::from_secs(5),
        )
    }

    fn passages(n: usize) -> Vec<Passage> {
        (0..n).map(|i| Passage::new(format!("passage-{}", i))).collect()
    }

    #[test]
    fn test_context_capped_at_three() {
        let llm = Arc::new(ScriptedLlm::new(Vec::new()));
        let synth = synthesizer(llm);
        let all = passages(10);

        assert_eq!(synth.context_passages(&all), &all[..3]);
        assert_eq!(synth.context_passages(&all[..2]), &all[..2]);

        let request = synth.build_request("q", &all).unwrap();
        assert!(request
            .prompt
            .contains("passage-0\n\npassage-1\n\npassage-2"));
        assert!(!request.prompt.contains("passage-3"));
    }

    #[test]
    fn test_max_passages_clamped() {
        let llm = Arc::new(ScriptedLlm::new(Vec::new()));
        assert_eq!(synthesizer(llm.clone()).with_max_passages(0).max_passages(), 1);
        assert_eq!(synthesizer(llm.clone()).with_max_passages(2).max_passages(), 2);
        assert_eq!(synthesizer(llm).with_max_passages(9).max_passages(), 3);
    }

    #[test]
    fn test_request_is_deterministic_and_carries_question() {
        let llm = Arc::new(ScriptedLlm::new(Vec::new()));
        let request = synthesizer(llm)
            .build_request("Is the gold plan taxable?", &passages(1))
            .unwrap();

        assert_eq!(request.temperature, Some(0.0));
        assert!(request.prompt.contains("Question: Is the gold plan taxable?"));
        assert!(request.prompt.contains("Context: passage-0"));
        assert!(request
            .system
            .as_deref()
            .unwrap_or_default()
            .contains("insurance chatbot"));
    }

    #[tokio::test]
    async fn test_synthesize_returns_trimmed_answer() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(
            "  The gold plan covers you up to age 99.\n".to_string(),
        )]));
        let answer = synthesizer(llm.clone())
            .synthesize("How long is the cover?", &passages(5))
            .await
            .unwrap();

        assert_eq!(answer, "The gold plan covers you up to age 99.");
        assert_eq!(llm.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_context_declines_without_call() {
        let llm = Arc::new(ScriptedLlm::new(Vec::new()));
        let answer = synthesizer(llm.clone())
            .synthesize("anything", &[])
            .await
            .unwrap();

        assert_eq!(answer, NO_CONTEXT_ANSWER);
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_service_error_propagates() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(AppError::Llm(
            "connection refused".to_string(),
        ))]));
        let err = synthesizer(llm)
            .synthesize("q", &passages(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_llm_error() {
        let llm = Arc::new(
            ScriptedLlm::new(vec![Ok("late".to_string())]).with_delay(Duration::from_millis(500)),
        );
        let synth = AnswerSynthesizer::new(
            llm,
            builtin_prompt(ANSWER_PROMPT_ID).unwrap(),
            "test-model",
            Duration::from_millis(20),
        );

        let err = synth.synthesize("q", &passages(1)).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }
}
