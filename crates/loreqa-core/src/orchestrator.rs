//! Hybrid answer orchestration.
//!
//! Fans a question out to passage retrieval and (optionally) graph fact
//! fetching, then merges the two into a single [`AnswerResult`]. The
//! orchestrator is a pure merge/shape layer: passages come back exactly as
//! ranked by the retriever, and graph rows ride along as a side channel
//! because text relevance and structural match scores are not comparable.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{QaError, QaResult};
use crate::model::{AnswerResult, GraphRow, Passage};

/// Ranked passage retrieval for a natural-language query.
#[async_trait]
pub trait PassageRetriever: Send + Sync {
    /// Return up to `top_k` passages ordered by descending relevance.
    async fn retrieve(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<Passage>>;
}

/// Structurally related graph facts for a question.
#[async_trait]
pub trait GraphFactFetcher: Send + Sync {
    /// Return graph rows relevant to the question, or an empty list when
    /// no structural pattern applies.
    async fn fetch(&self, question: &str) -> anyhow::Result<Vec<GraphRow>>;
}

/// Merges passage search with graph-derived facts into one answer payload.
pub struct AnswerOrchestrator {
    retriever: Arc<dyn PassageRetriever>,
    facts: Arc<dyn GraphFactFetcher>,
    max_top_k: usize,
    timeout: Duration,
}

impl AnswerOrchestrator {
    pub fn new(
        retriever: Arc<dyn PassageRetriever>,
        facts: Arc<dyn GraphFactFetcher>,
        max_top_k: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            retriever,
            facts,
            max_top_k,
            timeout,
        }
    }

    /// Answer a question with ranked passages plus optional graph facts.
    ///
    /// `top_k` must be positive; values above the configured ceiling are
    /// clamped. The passage fetch and the graph fetch run concurrently
    /// under a single deadline. Retriever failure fails the whole call
    /// (`RetrievalUnavailable`); fact-fetch failure degrades to an empty
    /// graph list since graph augmentation is supplementary evidence.
    pub async fn answer(
        &self,
        question: &str,
        top_k: usize,
        use_graph: bool,
    ) -> QaResult<AnswerResult> {
        if top_k == 0 {
            return Err(QaError::validation("top_k must be a positive integer"));
        }
        let top_k = top_k.min(self.max_top_k);

        let passages_fut = self.retriever.retrieve(question, top_k);
        let facts_fut = async {
            if use_graph {
                self.facts.fetch(question).await
            } else {
                Ok(Vec::new())
            }
        };

        let joined = tokio::time::timeout(self.timeout, async {
            tokio::join!(passages_fut, facts_fut)
        })
        .await
        .map_err(|_| QaError::RetrievalTimeout)?;

        let (passages_res, facts_res) = joined;

        let passages = passages_res
            .map_err(|e| QaError::RetrievalUnavailable(e.to_string()))?;

        let graph = match facts_res {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "graph fact fetch failed, degrading to passages only");
                Vec::new()
            }
        };

        debug!(
            question,
            passages = passages.len(),
            graph_rows = graph.len(),
            "composed answer"
        );

        Ok(AnswerResult {
            query: question.to_string(),
            passages,
            graph,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRetriever {
        passages: Vec<Passage>,
    }

    #[async_trait]
    impl PassageRetriever for FixedRetriever {
        async fn retrieve(&self, _query: &str, top_k: usize) -> anyhow::Result<Vec<Passage>> {
            Ok(self.passages.iter().take(top_k).cloned().collect())
        }
    }

    struct FailingRetriever;

    #[async_trait]
    impl PassageRetriever for FailingRetriever {
        async fn retrieve(&self, _query: &str, _top_k: usize) -> anyhow::Result<Vec<Passage>> {
            anyhow::bail!("opensearch is down")
        }
    }

    struct FixedFacts {
        rows: Vec<GraphRow>,
    }

    #[async_trait]
    impl GraphFactFetcher for FixedFacts {
        async fn fetch(&self, _question: &str) -> anyhow::Result<Vec<GraphRow>> {
            Ok(self.rows.clone())
        }
    }

    struct FailingFacts;

    #[async_trait]
    impl GraphFactFetcher for FailingFacts {
        async fn fetch(&self, _question: &str) -> anyhow::Result<Vec<GraphRow>> {
            anyhow::bail!("neo4j unreachable")
        }
    }

    struct SlowRetriever;

    #[async_trait]
    impl PassageRetriever for SlowRetriever {
        async fn retrieve(&self, _query: &str, _top_k: usize) -> anyhow::Result<Vec<Passage>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    fn passage(title: &str, score: f32) -> Passage {
        Passage {
            title: title.to_string(),
            section: "Overview".to_string(),
            text: format!("about {}", title),
            score,
            url: format!("wiki:{}", title),
        }
    }

    fn ventrue_row() -> GraphRow {
        let mut row = GraphRow::new();
        row.insert("clan".into(), serde_json::json!("Ventrue"));
        row.insert(
            "disciplines".into(),
            serde_json::json!(["Dominate", "Presence", "Fortitude"]),
        );
        row
    }

    fn orchestrator(
        retriever: Arc<dyn PassageRetriever>,
        facts: Arc<dyn GraphFactFetcher>,
    ) -> AnswerOrchestrator {
        AnswerOrchestrator::new(retriever, facts, 25, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn preserves_passage_order_and_appends_graph_rows() {
        let retriever = Arc::new(FixedRetriever {
            passages: vec![
                passage("Ventrue", 0.91),
                passage("Disciplines", 0.80),
                passage("Clans", 0.65),
            ],
        });
        let facts = Arc::new(FixedFacts {
            rows: vec![ventrue_row()],
        });

        let result = orchestrator(retriever, facts)
            .answer("What disciplines do Ventrue have?", 3, true)
            .await
            .unwrap();

        let scores: Vec<f32> = result.passages.iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![0.91, 0.80, 0.65]);
        assert_eq!(result.graph.len(), 1);
        assert_eq!(result.graph[0]["clan"], "Ventrue");
    }

    #[tokio::test]
    async fn failing_fact_fetch_degrades_to_passages_only() {
        let passages = vec![passage("Ventrue", 0.91), passage("Clans", 0.65)];

        let with_graph = orchestrator(
            Arc::new(FixedRetriever {
                passages: passages.clone(),
            }),
            Arc::new(FailingFacts),
        )
        .answer("question", 5, true)
        .await
        .unwrap();

        let without_graph = orchestrator(
            Arc::new(FixedRetriever { passages }),
            Arc::new(FixedFacts { rows: Vec::new() }),
        )
        .answer("question", 5, false)
        .await
        .unwrap();

        assert_eq!(with_graph.passages.len(), without_graph.passages.len());
        assert!(with_graph.graph.is_empty());
    }

    #[tokio::test]
    async fn retriever_failure_is_fatal() {
        let result = orchestrator(
            Arc::new(FailingRetriever),
            Arc::new(FixedFacts { rows: Vec::new() }),
        )
        .answer("question", 5, true)
        .await;

        assert!(matches!(result, Err(QaError::RetrievalUnavailable(_))));
    }

    #[tokio::test]
    async fn zero_top_k_is_rejected() {
        let result = orchestrator(
            Arc::new(FixedRetriever { passages: vec![] }),
            Arc::new(FixedFacts { rows: Vec::new() }),
        )
        .answer("question", 0, false)
        .await;

        assert!(matches!(result, Err(QaError::Validation(_))));
    }

    #[tokio::test]
    async fn top_k_above_ceiling_is_clamped() {
        let passages: Vec<Passage> = (0..30)
            .map(|i| passage(&format!("p{}", i), 1.0 - i as f32 * 0.01))
            .collect();
        let orchestrator = AnswerOrchestrator::new(
            Arc::new(FixedRetriever { passages }),
            Arc::new(FixedFacts { rows: Vec::new() }),
            10,
            Duration::from_secs(5),
        );

        let result = orchestrator.answer("question", 1000, false).await.unwrap();
        assert_eq!(result.passages.len(), 10);
    }

    #[tokio::test]
    async fn top_k_larger_than_available_returns_all() {
        let result = orchestrator(
            Arc::new(FixedRetriever {
                passages: vec![passage("only", 0.5)],
            }),
            Arc::new(FixedFacts { rows: Vec::new() }),
        )
        .answer("question", 10, false)
        .await
        .unwrap();

        assert_eq!(result.passages.len(), 1);
    }

    #[tokio::test]
    async fn slow_retriever_times_out() {
        let orchestrator = AnswerOrchestrator::new(
            Arc::new(SlowRetriever),
            Arc::new(FixedFacts { rows: Vec::new() }),
            25,
            Duration::from_millis(20),
        );

        let result = orchestrator.answer("question", 5, false).await;
        assert!(matches!(result, Err(QaError::RetrievalTimeout)));
    }
}
