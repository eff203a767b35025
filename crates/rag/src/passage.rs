//! Passage and ranked-list types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

/// A unit of retrieved text considered as a ranking candidate.
///
/// Identity is the text itself: two passages with the same text are the same
/// passage no matter which query or index call produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Passage(String);

impl Passage {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    pub fn into_text(self) -> String {
        self.0
    }
}

impl fmt::Display for Passage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Passage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Passage {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for Passage {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Passage {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// One index search's output for one query, best match first.
///
/// Rank is the 0-based position. A list never holds the same passage twice;
/// repeats from the index keep their best (earliest) rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedList {
    query: String,
    passages: Vec<Passage>,
}

impl RankedList {
    pub fn new(query: impl Into<String>, passages: Vec<Passage>) -> Self {
        let query = query.into();
        let returned = passages.len();

        let mut seen = HashSet::with_capacity(returned);
        let passages: Vec<Passage> = passages
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .collect();

        if passages.len() < returned {
            tracing::debug!(
                query = %query,
                dropped = returned - passages.len(),
                "Dropped repeated passages from ranked list"
            );
        }

        Self { query, passages }
    }

    /// The query this list was retrieved for.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Passages paired with their 0-based rank.
    pub fn ranked(&self) -> impl Iterator<Item = (usize, &Passage)> {
        self.passages.iter().enumerate()
    }
}
