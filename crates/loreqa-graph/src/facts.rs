//! Question-pattern graph fact fetching.
//!
//! Matches a small set of structural question patterns (clan disciplines,
//! clan sect membership) and answers them with Cypher `collect()`
//! aggregations. Questions that match no pattern yield no rows; this is
//! supplementary evidence, not an error.

use async_trait::async_trait;
use loreqa_core::{GraphFactFetcher, GraphRow};
use neo4rs::Query;
use regex::Regex;
use tracing::debug;

use crate::client::GraphClient;

const DISCIPLINES_CYPHER: &str = "\
    MATCH (c:Entity {id: $cid, type:'Clan'})-[:REL {rel:'HAS_DISCIPLINE'}]->(d:Entity {type:'Discipline'})
    RETURN c.name AS clan, collect(d.name) AS disciplines";

const SECTS_CYPHER: &str = "\
    MATCH (c:Entity {id: $cid, type:'Clan'})-[:REL {rel:'MEMBER_OF'}]->(s:Entity {type:'Sect'})
    RETURN c.name AS clan, collect(s.name) AS sects";

/// Regex-driven fact fetcher over the entity graph.
pub struct PatternFactFetcher {
    client: GraphClient,
    disciplines_re: Regex,
    sect_re: Regex,
}

impl PatternFactFetcher {
    pub fn new(client: GraphClient) -> Self {
        // Pattern tails are cleaned by `subject_to_id`, so a greedy capture
        // of the rest of the sentence is fine here.
        Self {
            client,
            disciplines_re: Regex::new(r"(?i)disciplines?\s+(?:of|do|da|de)\s+([a-z0-9\- ]+)")
                .expect("valid regex"),
            sect_re: Regex::new(r"(?i)(?:sect|faction)s?\s+(?:of|do|da|de)\s+([a-z0-9\- ]+)")
                .expect("valid regex"),
        }
    }

    async fn rows_for(&self, cypher: &str, cid: &str) -> anyhow::Result<Vec<GraphRow>> {
        let query = Query::new(cypher.to_string()).param("cid", cid);
        let rows = self.client.query(query).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let value: serde_json::Value = row
                .to()
                .map_err(|e| anyhow::anyhow!("unexpected fact row shape: {}", e))?;
            if let serde_json::Value::Object(map) = value {
                out.push(map);
            }
        }
        Ok(out)
    }
}

/// Normalize a captured question subject to an entity id: drop auxiliary
/// tail words and punctuation, lowercase, join on '-'.
fn subject_to_id(raw: &str) -> String {
    let words: Vec<&str> = raw
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '-'))
        .take_while(|w| !matches!(w.to_ascii_lowercase().as_str(), "have" | "has" | "belong"))
        .filter(|w| !w.is_empty())
        .collect();
    words.join("-").to_lowercase()
}

#[async_trait]
impl GraphFactFetcher for PatternFactFetcher {
    async fn fetch(&self, question: &str) -> anyhow::Result<Vec<GraphRow>> {
        let mut rows = Vec::new();

        if let Some(cap) = self.disciplines_re.captures(question) {
            let cid = subject_to_id(&cap[1]);
            if !cid.is_empty() {
                debug!(%cid, "matched disciplines pattern");
                rows.extend(self.rows_for(DISCIPLINES_CYPHER, &cid).await?);
            }
        }

        if let Some(cap) = self.sect_re.captures(question) {
            let cid = subject_to_id(&cap[1]);
            if !cid.is_empty() {
                debug!(%cid, "matched sect pattern");
                rows.extend(self.rows_for(SECTS_CYPHER, &cid).await?);
            }
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_normalizes_to_entity_id() {
        assert_eq!(subject_to_id("Ventrue have"), "ventrue");
        assert_eq!(subject_to_id("the Banu Haqim"), "the-banu-haqim");
        assert_eq!(subject_to_id("Ventrue?"), "ventrue");
        assert_eq!(subject_to_id("  "), "");
    }

    #[test]
    fn discipline_pattern_matches_question_forms() {
        let fetcher_re =
            Regex::new(r"(?i)disciplines?\s+(?:of|do|da|de)\s+([a-z0-9\- ]+)").unwrap();
        let cap = fetcher_re
            .captures("What disciplines do Ventrue have?")
            .unwrap();
        assert_eq!(subject_to_id(&cap[1]), "ventrue");

        let cap = fetcher_re.captures("disciplines of toreador").unwrap();
        assert_eq!(subject_to_id(&cap[1]), "toreador");

        assert!(fetcher_re.captures("who founded the camarilla").is_none());
    }
}
