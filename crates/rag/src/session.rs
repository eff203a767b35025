//! Conversation state for an interactive chat.
//!
//! The bot speaks first with a greeting, so there is always at least one more
//! response than there are requests. History is append-only and a turn is
//! recorded only once its answer exists.

use crate::pipeline::{RagAnswer, RagPipeline};
use chrono::{DateTime, Utc};
use policybot_core::{AppError, AppResult};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

/// One side of a conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Message {
    fn now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// A request paired with its response. The greeting has no request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turn<'a> {
    pub question: Option<&'a Message>,
    pub answer: &'a Message,
}

/// A chat session with ordered, append-only history.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    requests: Vec<Message>,
    responses: Vec<Message>,
}

impl ConversationSession {
    /// Start a session; `greeting` becomes the first response.
    pub fn new(greeting: impl Into<String>) -> Self {
        let greeting = Message::now(greeting);
        Self {
            id: Uuid::new_v4(),
            started_at: greeting.at,
            requests: Vec::new(),
            responses: vec![greeting],
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn greeting(&self) -> &str {
        &self.responses[0].text
    }

    pub fn requests(&self) -> &[Message] {
        &self.requests
    }

    pub fn responses(&self) -> &[Message] {
        &self.responses
    }

    /// Number of answered questions.
    pub fn turn_count(&self) -> usize {
        self.requests.len()
    }

    /// History as turns: the greeting first, then each question with its answer.
    pub fn turns(&self) -> Vec<Turn<'_>> {
        let greeting = Turn {
            question: None,
            answer: &self.responses[0],
        };

        std::iter::once(greeting)
            .chain(
                self.requests
                    .iter()
                    .zip(&self.responses[1..])
                    .map(|(question, answer)| Turn {
                        question: Some(question),
                        answer,
                    }),
            )
            .collect()
    }

    /// Run one question through `pipeline` and record the exchange.
    ///
    /// On failure nothing is recorded and the session stays usable.
    pub async fn submit_turn(
        &mut self,
        pipeline: &RagPipeline,
        question: &str,
    ) -> AppResult<RagAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Input("Question must not be empty".to_string()));
        }

        let span = tracing::info_span!("turn", session = %self.id, turn = self.requests.len() + 1);
        let asked = Message::now(question);
        let answer = pipeline.answer(question).instrument(span).await?;

        self.record(asked, Message::now(answer.answer.clone()));
        Ok(answer)
    }

    fn record(&mut self, request: Message, response: Message) {
        self.requests.push(request);
        self.responses.push(response);
        debug_assert!(self.responses.len() == self.requests.len() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_has_only_greeting() {
        let session = ConversationSession::new("How can I assist you with your insurance queries?");

        assert_eq!(session.greeting(), "How can I assist you with your insurance queries?");
        assert!(session.requests().is_empty());
        assert_eq!(session.responses().len(), 1);
        assert_eq!(session.turn_count(), 0);

        let turns = session.turns();
        assert_eq!(turns.len(), 1);
        assert!(turns[0].question.is_none());
        assert_eq!(turns[0].answer.text, session.greeting());
    }

    #[test]
    fn test_record_pairs_question_with_its_answer() {
        let mut session = ConversationSession::new("hello");
        session.record(Message::now("q1"), Message::now("a1"));
        session.record(Message::now("q2"), Message::now("a2"));

        let turns = session.turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].question.map(|m| m.text.as_str()), Some("q1"));
        assert_eq!(turns[1].answer.text, "a1");
        assert_eq!(turns[2].question.map(|m| m.text.as_str()), Some("q2"));
        assert_eq!(turns[2].answer.text, "a2");
        assert!(session.responses().len() >= session.requests().len());
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        assert_ne!(
            ConversationSession::new("hi").id(),
            ConversationSession::new("hi").id()
        );
    }
}
