//! Reciprocal Rank Fusion.
//!
//! Merges independently ranked lists into one ordering of unique passages:
//!
//! score(p) = Σ 1 / (rank_i(p) + 1 + k)
//!
//! over every list i that contains p, with 0-based ranks. Passages absent from
//! every list get no entry at all. Larger `k` flattens the distribution.

use crate::passage::{Passage, RankedList};
use policybot_core::{AppError, AppResult};
use serde::Serialize;
use std::collections::HashMap;

/// Conventional RRF constant.
pub const DEFAULT_RRF_K: f64 = 60.0;

/// A fused passage with its cumulative score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f64,
}

/// Reciprocal rank fusion with a fixed `k`.
#[derive(Debug, Clone, Copy)]
pub struct ReciprocalRankFusion {
    k: f64,
}

impl Default for ReciprocalRankFusion {
    fn default() -> Self {
        Self { k: DEFAULT_RRF_K }
    }
}

impl ReciprocalRankFusion {
    /// Create a fuser; `k` must be finite and non-negative.
    pub fn new(k: f64) -> AppResult<Self> {
        if !k.is_finite() || k < 0.0 {
            return Err(AppError::Config(format!(
                "RRF k must be a finite, non-negative number, got {}",
                k
            )));
        }

        Ok(Self { k })
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    /// Contribution of a single appearance at 0-based `rank`.
    pub fn contribution(&self, rank: usize) -> f64 {
        1.0 / (rank as f64 + 1.0 + self.k)
    }

    /// Fuse ranked lists into unique passages, best first.
    ///
    /// Equal scores keep first-seen order: lists are scanned in the order
    /// given, passages in rank order, and the sort is stable.
    pub fn fuse(&self, lists: &[RankedList]) -> Vec<ScoredPassage> {
        let mut fused: Vec<ScoredPassage> = Vec::new();
        let mut positions: HashMap<&Passage, usize> = HashMap::new();

        for list in lists {
            for (rank, passage) in list.ranked() {
                let contribution = self.contribution(rank);

                match positions.get(passage) {
                    Some(&idx) => fused[idx].score += contribution,
                    None => {
                        positions.insert(passage, fused.len());
                        fused.push(ScoredPassage {
                            passage: passage.clone(),
                            score: contribution,
                        });
                    }
                }
            }
        }

        fused.sort_by(|a, b| b.score.total_cmp(&a.score));

        tracing::debug!(
            lists = lists.len(),
            unique_passages = fused.len(),
            k = self.k,
            "Fused ranked lists"
        );

        fused
    }

    /// Raw score mapping, keyed by passage.
    pub fn scores(&self, lists: &[RankedList]) -> HashMap<Passage, f64> {
        self.fuse(lists)
            .into_iter()
            .map(|sp| (sp.passage, sp.score))
            .collect()
    }
}

/// Fuse with an explicit `k`, returning only the ordered passages.
pub fn reciprocal_rank_fusion(lists: &[RankedList], k: f64) -> AppResult<Vec<Passage>> {
    let fusion = ReciprocalRankFusion::new(k)?;
    Ok(fusion
        .fuse(lists)
        .into_iter()
        .map(|sp| sp.passage)
        .collect())
}
