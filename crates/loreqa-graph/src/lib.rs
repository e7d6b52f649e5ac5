//! # loreqa-graph
//!
//! Neo4j knowledge graph integration: connection client, the read-only
//! query sandbox, question-pattern fact fetching, and the transactional
//! edge curation store.
//!
//! Graph schema (written by the ingestion pipeline, not this crate):
//! `(:Entity {id, type, name})-[:REL {rel, confidence, evidence}]->(:Entity)`.

pub mod client;
pub mod curation;
pub mod facts;
pub mod sandbox;

pub use client::GraphClient;
pub use curation::Neo4jCurationStore;
pub use facts::PatternFactFetcher;
pub use sandbox::GraphSandbox;
