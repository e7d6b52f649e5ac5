//! OpenSearch lexical search client.
//!
//! Issues a `match` query on the passage `text` field via the `_search`
//! HTTP API and maps hits back to candidates. This is the primary passage
//! source; failures propagate to the caller.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::Candidate;

#[derive(Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Deserialize)]
struct Hits {
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_score", default)]
    score: f32,
    #[serde(rename = "_source")]
    source: Candidate,
}

/// Full-text search client against the passage index.
#[derive(Clone)]
pub struct LexicalClient {
    base_url: String,
    index: String,
    client: reqwest::Client,
}

impl LexicalClient {
    pub fn new(base_url: &str, index: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
            client,
        }
    }

    /// Top `k` passages matching the query text lexically.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<Candidate>> {
        let body = json!({
            "size": k,
            "query": { "match": { "text": query } },
            "_source": ["title", "section", "url", "text", "offset"],
        });

        let response = self
            .client
            .post(format!("{}/{}/_search", self.base_url, self.index))
            .json(&body)
            .send()
            .await
            .context("Failed to connect to OpenSearch")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenSearch error ({}): {}", status, body);
        }

        let result: SearchResponse = response
            .json()
            .await
            .context("Failed to parse OpenSearch response")?;

        let candidates: Vec<Candidate> = result
            .hits
            .hits
            .into_iter()
            .map(|hit| Candidate {
                score: hit.score,
                ..hit.source
            })
            .collect();

        debug!(query, count = candidates.len(), "lexical search results");
        Ok(candidates)
    }
}
