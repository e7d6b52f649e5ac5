//! Cross-encoder rerank client.
//!
//! POSTs `{query, documents, top_n}` to a Cohere-shaped `/rerank`
//! endpoint and returns `(index, relevance_score)` pairs. Reranking is
//! optional; when the endpoint is absent or failing, the hybrid retriever
//! falls back to rank fusion.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankHit>,
}

#[derive(Deserialize)]
struct RerankHit {
    index: usize,
    relevance_score: f32,
}

/// Rerank endpoint client.
#[derive(Clone)]
pub struct RerankClient {
    url: String,
    client: reqwest::Client,
}

impl RerankClient {
    pub fn new(url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .unwrap_or_default();

        Self {
            url: url.to_string(),
            client,
        }
    }

    /// Score `documents` against `query`, best first.
    pub async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<(usize, f32)>> {
        let request = RerankRequest {
            query,
            documents,
            top_n,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .context("Failed to connect to rerank endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Rerank API error ({}): {}", status, body);
        }

        let result: RerankResponse = response
            .json()
            .await
            .context("Failed to parse rerank response")?;

        Ok(result
            .results
            .into_iter()
            .map(|hit| (hit.index, hit.relevance_score))
            .collect())
    }
}
