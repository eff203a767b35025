//! Concurrent retrieval of one ranked list per query.

use crate::deadline::with_deadline;
use crate::index::SemanticIndex;
use crate::passage::RankedList;
use futures::stream::{self, StreamExt};
use policybot_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Issues one index search per query, bounded in concurrency.
pub struct RetrievalFanout {
    index: Arc<dyn SemanticIndex>,
    top_k: usize,
    concurrency: usize,
    timeout: Duration,
}

impl RetrievalFanout {
    pub fn new(index: Arc<dyn SemanticIndex>, top_k: usize) -> Self {
        Self {
            index,
            top_k: top_k.max(1),
            concurrency: 8,
            timeout: Duration::from_secs(30),
        }
    }

    /// Maximum searches in flight at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Deadline for each individual search.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    async fn search_one(&self, query: &str) -> AppResult<RankedList> {
        let timeout = self.timeout;
        let passages = with_deadline(timeout, self.index.search(query, self.top_k), || {
            AppError::Index(format!(
                "Search for '{}' timed out after {:?}",
                query, timeout
            ))
        })
        .await?;

        tracing::debug!(
            index = self.index.name(),
            query = %query,
            hits = passages.len(),
            "Search complete"
        );

        Ok(RankedList::new(query, passages))
    }

    /// Retrieve a ranked list for every query.
    ///
    /// Lists come back in query order regardless of completion order. A
    /// failed search is logged and left out; if every search fails the last
    /// error is returned.
    pub async fn fanout(&self, queries: &[String]) -> AppResult<Vec<RankedList>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let results: Vec<AppResult<RankedList>> = stream::iter(queries)
            .map(|query| self.search_one(query))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut lists = Vec::with_capacity(results.len());
        let mut last_error = None;

        for (query, result) in queries.iter().zip(results) {
            match result {
                Ok(list) => lists.push(list),
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "Search failed, skipping query");
                    last_error = Some(e);
                }
            }
        }

        if lists.is_empty() {
            if let Some(err) = last_error {
                return Err(err);
            }
        }

        tracing::info!(
            queries = queries.len(),
            lists = lists.len(),
            "Retrieved ranked lists"
        );

        Ok(lists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::StaticIndex;

    fn queries(items: &[&str]) -> Vec<String> {
        items.iter().map(|q| q.to_string()).collect()
    }

    #[tokio::test]
    async fn test_one_list_per_query_in_order() {
        let index = Arc::new(
            StaticIndex::new(&["generic"])
                .with_results("q1", &["A", "B"])
                .with_results("q2", &["B", "C"]),
        );
        let fanout = RetrievalFanout::new(index.clone(), 50);

        let lists = fanout.fanout(&queries(&["q1", "q2", "q3"])).await.unwrap();

        let order: Vec<&str> = lists.iter().map(RankedList::query).collect();
        assert_eq!(order, vec!["q1", "q2", "q3"]);
        assert_eq!(lists[0].passages()[0].text(), "A");
        assert_eq!(lists[2].passages()[0].text(), "generic");

        let mut searched = index.searched();
        searched.sort();
        assert_eq!(searched, queries(&["q1", "q2", "q3"]));
    }

    #[tokio::test]
    async fn test_order_kept_when_later_queries_finish_first() {
        let index = Arc::new(
            StaticIndex::new(&["p"])
                .with_delay("slow", Duration::from_millis(80))
                .with_results("slow", &["S"])
                .with_results("fast", &["F"]),
        );
        let fanout = RetrievalFanout::new(index, 10).with_concurrency(4);

        let lists = fanout.fanout(&queries(&["slow", "fast"])).await.unwrap();
        assert_eq!(lists[0].query(), "slow");
        assert_eq!(lists[1].query(), "fast");
    }

    #[tokio::test]
    async fn test_top_k_forwarded() {
        let index = Arc::new(StaticIndex::new(&["a", "b", "c", "d"]));
        let lists = RetrievalFanout::new(index, 2)
            .fanout(&queries(&["q"]))
            .await
            .unwrap();
        assert_eq!(lists[0].len(), 2);
    }

    #[tokio::test]
    async fn test_empty_queries() {
        let index = Arc::new(StaticIndex::new(&["a"]));
        let lists = RetrievalFanout::new(index.clone(), 5)
            .fanout(&[])
            .await
            .unwrap();
        assert!(lists.is_empty());
        assert!(index.searched().is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_drops_list() {
        let index = Arc::new(StaticIndex::new(&["a"]).with_failure("broken"));
        let lists = RetrievalFanout::new(index, 5)
            .fanout(&queries(&["ok", "broken"]))
            .await
            .unwrap();

        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].query(), "ok");
    }

    #[tokio::test]
    async fn test_total_failure_is_error() {
        let index = Arc::new(
            StaticIndex::new(&["a"])
                .with_failure("x")
                .with_failure("y"),
        );
        let err = RetrievalFanout::new(index, 5)
            .fanout(&queries(&["x", "y"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Index(_)));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_index_error() {
        let index = Arc::new(
            StaticIndex::new(&["a"]).with_delay("stuck", Duration::from_millis(500)),
        );
        let err = RetrievalFanout::new(index, 5)
            .with_timeout(Duration::from_millis(20))
            .fanout(&queries(&["stuck"]))
            .await
            .unwrap_err();

        match err {
            AppError::Index(msg) => assert!(msg.contains("timed out")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
