//! Hybrid passage retrieval.
//!
//! Runs lexical and dense search concurrently, de-duplicates by passage
//! chunk identity, then scores the merged pool either with the rerank
//! endpoint (when configured) or with Reciprocal Rank Fusion:
//!
//! ```text
//! score(d) = Σ  1 / (k + rank(d, list_i))
//!           i
//! ```
//! with `k = 60` (standard default).
//!
//! Lexical search is the primary source: its failure fails the retrieval.
//! Dense search and reranking are enrichment and degrade quietly.

use async_trait::async_trait;
use loreqa_core::{Passage, PassageRetriever};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::{Candidate, EmbeddingClient, LexicalClient, RerankClient, VectorStore};

/// RRF constant (standard value from the original paper).
const RRF_K: f64 = 60.0;

/// How many candidates each source contributes before fusion.
const FETCH_K: usize = 30;

/// Cap on documents sent to the rerank endpoint per query.
const RERANK_POOL: usize = 50;

pub struct HybridRetriever {
    lexical: LexicalClient,
    embedding: EmbeddingClient,
    vector: VectorStore,
    rerank: Option<RerankClient>,
}

impl HybridRetriever {
    pub fn new(
        lexical: LexicalClient,
        embedding: EmbeddingClient,
        vector: VectorStore,
        rerank: Option<RerankClient>,
    ) -> Self {
        Self {
            lexical,
            embedding,
            vector,
            rerank,
        }
    }

    async fn dense_search(&self, query: &str) -> anyhow::Result<Vec<Candidate>> {
        let query_vector = self.embedding.embed(query).await?;
        self.vector.search(query_vector, FETCH_K).await
    }
}

#[async_trait]
impl PassageRetriever for HybridRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<Passage>> {
        let (lexical_res, dense_res) = tokio::join!(
            self.lexical.search(query, FETCH_K),
            self.dense_search(query)
        );

        let lexical = lexical_res?;
        let dense = dense_res.unwrap_or_else(|e| {
            warn!(error = %e, "dense search failed, continuing lexical-only");
            Vec::new()
        });

        debug!(
            lexical = lexical.len(),
            dense = dense.len(),
            "retrieval candidates"
        );

        if let Some(reranker) = &self.rerank {
            let pool = dedup(&lexical, &dense);
            let texts: Vec<String> = pool
                .iter()
                .take(RERANK_POOL)
                .map(|c| c.text.clone())
                .collect();
            match reranker.rerank(query, &texts, top_k.max(10)).await {
                Ok(scores) => return Ok(rerank_select(&pool, &scores, top_k)),
                Err(e) => warn!(error = %e, "rerank failed, falling back to rank fusion"),
            }
        }

        Ok(rrf_fuse(&lexical, &dense, top_k))
    }
}

/// Merge the two candidate lists preserving order, dropping duplicate
/// passage chunks (first occurrence wins).
fn dedup(lexical: &[Candidate], dense: &[Candidate]) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    lexical
        .iter()
        .chain(dense.iter())
        .filter(|c| seen.insert(c.key()))
        .cloned()
        .collect()
}

fn to_passage(candidate: &Candidate, score: f32) -> Passage {
    Passage {
        title: candidate.title.clone(),
        section: candidate.section.clone(),
        text: candidate.text.clone(),
        score,
        url: candidate.url.clone(),
    }
}

/// Fuse two ranked lists with RRF and return the top passages, ordered by
/// descending fused score with stable ties (merged input order).
fn rrf_fuse(lexical: &[Candidate], dense: &[Candidate], top_k: usize) -> Vec<Passage> {
    let mut scores: HashMap<(String, String, i64), f64> = HashMap::new();
    for list in [lexical, dense] {
        for (rank, candidate) in list.iter().enumerate() {
            *scores.entry(candidate.key()).or_insert(0.0) += 1.0 / (RRF_K + rank as f64 + 1.0);
        }
    }

    let mut passages: Vec<Passage> = dedup(lexical, dense)
        .iter()
        .map(|c| to_passage(c, scores.get(&c.key()).copied().unwrap_or(0.0) as f32))
        .collect();

    // sort_by is stable, so equal scores keep merged input order.
    passages.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    passages.truncate(top_k);
    passages
}

/// Apply rerank endpoint scores to the candidate pool.
fn rerank_select(pool: &[Candidate], scores: &[(usize, f32)], top_k: usize) -> Vec<Passage> {
    let mut passages: Vec<Passage> = scores
        .iter()
        .filter_map(|&(index, score)| pool.get(index).map(|c| to_passage(c, score)))
        .collect();

    passages.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    passages.truncate(top_k);
    passages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str, offset: i64) -> Candidate {
        Candidate {
            title: title.to_string(),
            section: "Overview".to_string(),
            text: format!("text about {}", title),
            url: format!("wiki:{}", title),
            offset,
            score: 0.0,
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let lexical = vec![candidate("Ventrue", 0), candidate("Clans", 0)];
        let dense = vec![candidate("Ventrue", 0), candidate("Dominate", 0)];

        let merged = dedup(&lexical, &dense);
        let titles: Vec<&str> = merged.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Ventrue", "Clans", "Dominate"]);
    }

    #[test]
    fn dedup_distinguishes_chunks_by_offset() {
        let lexical = vec![candidate("Ventrue", 0), candidate("Ventrue", 600)];
        let merged = dedup(&lexical, &[]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn rrf_ranks_doc_present_in_both_lists_first() {
        let lexical = vec![candidate("Clans", 0), candidate("Ventrue", 0)];
        let dense = vec![candidate("Ventrue", 0), candidate("Dominate", 0)];

        let passages = rrf_fuse(&lexical, &dense, 10);
        assert_eq!(passages[0].title, "Ventrue");
        assert!(passages[0].score > passages[1].score);
    }

    #[test]
    fn rrf_ties_keep_merged_input_order() {
        // Each appears only in one list at rank 0: identical fused scores.
        let lexical = vec![candidate("Clans", 0)];
        let dense = vec![candidate("Dominate", 0)];

        let passages = rrf_fuse(&lexical, &dense, 10);
        assert_eq!(passages[0].title, "Clans");
        assert_eq!(passages[1].title, "Dominate");
        assert_eq!(passages[0].score, passages[1].score);
    }

    #[test]
    fn rrf_truncates_to_top_k() {
        let lexical: Vec<Candidate> = (0..8).map(|i| candidate(&format!("p{}", i), 0)).collect();
        let passages = rrf_fuse(&lexical, &[], 3);
        assert_eq!(passages.len(), 3);
        assert_eq!(passages[0].title, "p0");
    }

    #[test]
    fn rerank_select_orders_by_relevance() {
        let pool = vec![candidate("a", 0), candidate("b", 0), candidate("c", 0)];
        let scores = vec![(2, 0.9), (0, 0.7), (1, 0.1)];

        let passages = rerank_select(&pool, &scores, 2);
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].title, "c");
        assert_eq!(passages[1].title, "a");
    }
}
