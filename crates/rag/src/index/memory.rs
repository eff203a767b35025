//! In-process index with term-overlap scoring.
//!
//! Not semantic in any real sense, but deterministic and content-dependent,
//! which is what offline runs and tests need.
//!
//! Passages files are plain text, one passage per paragraph (blocks separated
//! by blank lines).

use super::SemanticIndex;
use crate::passage::Passage;
use policybot_core::{AppError, AppResult};
use std::collections::HashSet;
use std::path::Path;

const STOP_WORDS: [&str; 32] = [
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "what", "does", "how",
];

struct Entry {
    passage: Passage,
    terms: HashSet<String>,
}

/// Passages held in memory, searched by shared terms.
#[derive(Default)]
pub struct InMemoryIndex {
    entries: Vec<Entry>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a passages file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Index(format!("Failed to read passages file {:?}: {}", path, e))
        })?;

        let mut index = Self::new();
        index.insert(split_paragraphs(&contents));

        if index.is_empty() {
            return Err(AppError::Index(format!(
                "Passages file {:?} contains no passages",
                path
            )));
        }

        tracing::info!(passages = index.len(), path = ?path, "Loaded in-memory index");
        Ok(index)
    }

    /// Add passages; a passage already present is skipped.
    pub fn insert<I, P>(&mut self, passages: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<Passage>,
    {
        for passage in passages {
            let passage = passage.into();
            if self.entries.iter().any(|e| e.passage == passage) {
                continue;
            }

            let terms = terms(passage.text());
            self.entries.push(Entry { passage, terms });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn split_paragraphs(contents: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in contents.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
}

fn terms(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 1 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

#[async_trait::async_trait]
impl SemanticIndex for InMemoryIndex {
    fn name(&self) -> &str {
        "memory"
    }

    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<Passage>> {
        let query_terms = terms(query);

        let mut scored: Vec<(usize, &Passage)> = self
            .entries
            .iter()
            .map(|entry| (entry.terms.intersection(&query_terms).count(), &entry.passage))
            .filter(|(overlap, _)| *overlap > 0)
            .collect();

        // Stable: equal overlap keeps insertion order
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(top_k);

        tracing::trace!(
            query = %query,
            hits = scored.len(),
            "In-memory search"
        );

        Ok(scored.into_iter().map(|(_, p)| p.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_index() -> InMemoryIndex {
        let mut index = InMemoryIndex::new();
        index.insert([
            "The cash back plan pays 15% of the sum assured every 5 years.",
            "The gold plan offers whole life cover up to age 99.",
            "Premiums for the guaranteed monthly income plan are paid for 10 years.",
            "The gold plan pays a cash bonus on maturity.",
        ]);
        index
    }

    #[tokio::test]
    async fn test_search_ranks_by_overlap() {
        let index = plan_index();
        let results = index.search("gold plan cash bonus", 10).await.unwrap();

        assert_eq!(
            results[0].text(),
            "The gold plan pays a cash bonus on maturity."
        );
        assert_eq!(results.len(), 4);
        assert!(results[3].text().contains("guaranteed monthly income"));
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let index = plan_index();
        let results = index.search("plan", 10).await.unwrap();

        assert_eq!(results.len(), 4);
        assert!(results[0].text().starts_with("The cash back plan"));
        assert!(results[3].text().starts_with("The gold plan pays"));
    }

    #[tokio::test]
    async fn test_top_k_and_no_match() {
        let index = plan_index();
        assert_eq!(index.search("plan", 2).await.unwrap().len(), 2);
        assert!(index.search("motorcycle", 10).await.unwrap().is_empty());
    }

    #[test]
    fn test_split_paragraphs() {
        let text = "\n  Gold plan covers life.\nUp to age 99.\n\n\nCash back every 5 years.  \n";
        assert_eq!(
            split_paragraphs(text),
            vec!["Gold plan covers life.\nUp to age 99.", "Cash back every 5 years."]
        );
        assert!(split_paragraphs("\n \n").is_empty());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plans.txt");
        std::fs::write(
            &path,
            "The gold plan offers whole life cover.\n\nThe cash back plan pays every 5 years.\n\nThe gold plan offers whole life cover.\n",
        )
        .unwrap();

        let index = InMemoryIndex::load(&path).unwrap();
        assert_eq!(index.len(), 2);

        let results = index.search("cash back", 5).await.unwrap();
        assert_eq!(results[0].text(), "The cash back plan pays every 5 years.");
    }

    #[test]
    fn test_load_rejects_missing_and_empty_files() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            InMemoryIndex::load(&dir.path().join("missing.txt")),
            Err(AppError::Index(_))
        ));

        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "\n\n").unwrap();
        assert!(matches!(InMemoryIndex::load(&empty), Err(AppError::Index(_))));
    }

    #[test]
    fn test_insert_skips_duplicates() {
        let mut index = plan_index();
        index.insert(["The gold plan offers whole life cover up to age 99."]);
        assert_eq!(index.len(), 4);
    }
}
