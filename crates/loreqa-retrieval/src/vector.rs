//! Qdrant dense vector search.
//!
//! Read-only client over the passage collection populated by the
//! ingestion pipeline; payloads carry the same fields as the lexical
//! index (`title`, `section`, `text`, `url`, `offset`).

use anyhow::{Context, Result};
use qdrant_client::qdrant::{value::Kind, SearchPointsBuilder, Value};
use qdrant_client::Qdrant;
use tracing::debug;

use crate::Candidate;

/// Dense similarity search client.
pub struct VectorStore {
    client: Qdrant,
    collection: String,
}

impl VectorStore {
    pub fn new(url: &str, collection: &str) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .context("Failed to create Qdrant client")?;

        Ok(Self {
            client,
            collection: collection.to_string(),
        })
    }

    /// Top `k` passages nearest to the query vector.
    pub async fn search(&self, query_vector: Vec<f32>, k: usize) -> Result<Vec<Candidate>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(self.collection.as_str(), query_vector, k as u64)
                    .with_payload(true),
            )
            .await
            .context("Failed to search points")?;

        let candidates: Vec<Candidate> = response
            .result
            .into_iter()
            .map(|point| {
                let payload = &point.payload;
                Candidate {
                    title: payload_str(payload, "title"),
                    section: payload_str(payload, "section"),
                    text: payload_str(payload, "text"),
                    url: payload_str(payload, "url"),
                    offset: payload_int(payload, "offset"),
                    score: point.score,
                }
            })
            .collect();

        debug!(count = candidates.len(), "dense search results");
        Ok(candidates)
    }
}

fn payload_str(payload: &std::collections::HashMap<String, Value>, key: &str) -> String {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => s.clone(),
        _ => String::new(),
    }
}

fn payload_int(payload: &std::collections::HashMap<String, Value>, key: &str) -> i64 {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::IntegerValue(i)) => *i,
        Some(Kind::DoubleValue(f)) => *f as i64,
        _ => 0,
    }
}
