//! Retrieval-augmented answering over insurance plan documents.
//!
//! A question is expanded into several search queries, each query is searched
//! against a semantic index, the ranked lists are merged with reciprocal rank
//! fusion, and the best few passages are handed to the model for the answer.
//! `ConversationSession` keeps the chat history around that loop.

mod deadline;
pub mod expansion;
pub mod fanout;
pub mod fusion;
pub mod index;
pub mod passage;
pub mod pipeline;
pub mod session;
pub mod synthesis;

#[cfg(test)]
mod tests;

pub use expansion::{parse_expansion, ExpandedQuerySet, QueryExpander};
pub use fanout::RetrievalFanout;
pub use fusion::{reciprocal_rank_fusion, ReciprocalRankFusion, ScoredPassage, DEFAULT_RRF_K};
pub use index::{HttpSemanticIndex, InMemoryIndex, SemanticIndex};
pub use passage::{Passage, RankedList};
pub use pipeline::{RagAnswer, RagPipeline, Retrieval};
pub use session::{ConversationSession, Message, Turn};
pub use synthesis::{AnswerSynthesizer, MAX_CONTEXT_PASSAGES, NO_CONTEXT_ANSWER};
