//! Semantic index abstraction.
//!
//! The index is read-only from the pipeline's point of view: it is assumed to
//! hold the ingested plan documents already.

pub mod http;
pub mod memory;

pub use http::HttpSemanticIndex;
pub use memory::InMemoryIndex;

use crate::passage::Passage;
use policybot_core::AppResult;

/// Trait for semantic search backends.
///
/// Implementations return passages best match first and report failures as
/// `AppError::Index`.
#[async_trait::async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Search for the `top_k` passages most relevant to `query`.
    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<Passage>>;
}
