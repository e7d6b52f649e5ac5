//! # loreqa-core
//!
//! Shared data model, error taxonomy, and the two orchestration layers of
//! loreqa: the hybrid answer orchestrator and the edge curation service.
//!
//! Collaborators (passage retrieval, graph fact fetching, the curation
//! store) are consumed through traits so the logic here stays independent
//! of OpenSearch/Qdrant/Neo4j wiring.

pub mod config;
pub mod curation;
pub mod error;
pub mod model;
pub mod orchestrator;

pub use config::Config;
pub use curation::{CurationBackend, CurationService, ReplaceOutcome};
pub use error::{QaError, QaResult};
pub use model::{AnswerResult, Confidence, CurationItem, Edge, EdgeKey, Entity, GraphRow, Passage};
pub use orchestrator::{AnswerOrchestrator, GraphFactFetcher, PassageRetriever};
