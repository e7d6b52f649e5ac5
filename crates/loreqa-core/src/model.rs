//! Core data model: entities, edges, passages, and answer payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QaError;

/// Curation status of an extracted edge.
///
/// `Low` edges form the human review worklist; `High` is the approved state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = QaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            other => Err(QaError::Validation(format!(
                "unknown confidence '{}', expected low|medium|high",
                other
            ))),
        }
    }
}

/// Identity of an edge: the `(src, rel, dst)` triple.
///
/// A change to `rel` or `dst` is a key change and is modeled as retiring
/// the old triple and creating a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub src: String,
    pub rel: String,
    pub dst: String,
}

impl EdgeKey {
    pub fn new(src: impl Into<String>, rel: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            rel: rel.into(),
            dst: dst.into(),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})-[{}]->({})", self.src, self.rel, self.dst)
    }
}

/// A directed, labeled relationship between two entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    #[serde(flatten)]
    pub key: EdgeKey,
    pub confidence: Confidence,
    pub evidence: Vec<String>,
}

/// A named node in the knowledge graph. Read model only; the store owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub name: String,
}

/// A retrieved text passage with its source citation.
///
/// Produced fresh per query; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub title: String,
    #[serde(default)]
    pub section: String,
    pub text: String,
    pub score: f32,
    #[serde(default)]
    pub url: String,
}

/// A graph result row: column alias to scalar or list of scalars
/// (the Cypher `collect()` aggregation shape).
pub type GraphRow = serde_json::Map<String, serde_json::Value>;

/// The unified answer payload: ranked passages plus graph-derived facts.
///
/// Passages are ordered by descending score (stable on ties); graph rows are
/// a side channel and never interleaved into the passage ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub query: String,
    pub passages: Vec<Passage>,
    pub graph: Vec<GraphRow>,
}

/// A low-confidence edge as presented on the curation worklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationItem {
    pub src: String,
    pub rel: String,
    pub dst: String,
    pub confidence: Confidence,
    pub evidence: Vec<String>,
}

impl From<Edge> for CurationItem {
    fn from(edge: Edge) -> Self {
        Self {
            src: edge.key.src,
            rel: edge.key.rel,
            dst: edge.key.dst,
            confidence: edge.confidence,
            evidence: edge.evidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_parses_case_insensitively() {
        assert_eq!("LOW".parse::<Confidence>().unwrap(), Confidence::Low);
        assert_eq!(" high ".parse::<Confidence>().unwrap(), Confidence::High);
        assert!("certain".parse::<Confidence>().is_err());
    }

    #[test]
    fn confidence_serializes_lowercase() {
        let json = serde_json::to_string(&Confidence::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }

    #[test]
    fn edge_serializes_with_flattened_key() {
        let edge = Edge {
            key: EdgeKey::new("ventrue", "HAS_DISCIPLINE", "dominate"),
            confidence: Confidence::Low,
            evidence: vec!["wiki:Ventrue#Disciplines".to_string()],
        };
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value["src"], "ventrue");
        assert_eq!(value["confidence"], "low");
    }
}
