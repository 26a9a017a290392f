//! Weighted Reciprocal Rank Fusion.
//!
//! Merges the dense and lexical hit lists into one ranking using only rank
//! positions: a hit at 0-based rank `r` contributes `w / (k + r + 1)` to its
//! accumulated score. Dense similarity scores and lexical relevance scores
//! live on incomparable scales, so raw scores never enter the computation.

use std::collections::HashMap;

use crate::config::SearchConfig;
use crate::types::{FusedHit, Hit};

/// Reciprocal Rank Fusion over a semantic and a lexical ranked list.
#[derive(Debug, Clone)]
pub struct RrfFusion {
    /// Damping constant; larger values flatten the influence of top ranks
    /// from any single list.
    k: f32,
    /// Weight applied to dense-list contributions.
    semantic_weight: f32,
    /// Weight applied to lexical-list contributions.
    lexical_weight: f32,
}

impl Default for RrfFusion {
    fn default() -> Self {
        Self {
            k: 60.0,
            semantic_weight: 0.5,
            lexical_weight: 0.5,
        }
    }
}

impl RrfFusion {
    /// Create a fusion with explicit parameters. The weights are independent
    /// and need not sum to one.
    pub fn new(k: f32, semantic_weight: f32, lexical_weight: f32) -> Self {
        Self {
            k,
            semantic_weight,
            lexical_weight,
        }
    }

    /// Build from the search configuration section.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.rrf_k, config.semantic_weight, config.lexical_weight)
    }

    /// Fuse two ranked lists into at most `limit` results.
    ///
    /// A hit appearing in both lists accumulates the sum of its two weighted
    /// contributions, which is what rewards agreement between the retrieval
    /// modalities. Ties break by first-seen order, semantic list first.
    pub fn fuse(&self, semantic: &[Hit], lexical: &[Hit], limit: usize) -> Vec<FusedHit> {
        struct Entry {
            score: f32,
            first_seen: usize,
            content: String,
            metadata: std::collections::BTreeMap<String, String>,
        }

        let mut entries: HashMap<&str, Entry> = HashMap::new();
        let mut order = 0usize;

        for (weight, list) in [(self.semantic_weight, semantic), (self.lexical_weight, lexical)] {
            for (rank, hit) in list.iter().enumerate() {
                let contribution = weight / (self.k + rank as f32 + 1.0);
                match entries.get_mut(hit.chunk_id.as_str()) {
                    Some(entry) => entry.score += contribution,
                    None => {
                        entries.insert(
                            hit.chunk_id.as_str(),
                            Entry {
                                score: contribution,
                                first_seen: order,
                                content: hit.content.clone(),
                                metadata: hit.metadata.clone(),
                            },
                        );
                        order += 1;
                    }
                }
            }
        }

        let mut fused: Vec<(String, Entry)> = entries
            .into_iter()
            .map(|(id, entry)| (id.to_string(), entry))
            .collect();
        fused.sort_by(|a, b| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.first_seen.cmp(&b.1.first_seen))
        });
        fused.truncate(limit);

        fused
            .into_iter()
            .map(|(chunk_id, entry)| FusedHit {
                chunk_id,
                content: entry.content,
                metadata: entry.metadata,
                fusion_score: entry.score,
            })
            .collect()
    }
}
