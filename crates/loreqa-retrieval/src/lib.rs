//! # loreqa-retrieval
//!
//! Passage retrieval over the wiki corpus: lexical search (OpenSearch),
//! dense vector search (Qdrant + an embedding endpoint), optional
//! reranking, and the hybrid retriever that fuses the ranked lists.

pub mod embedding;
pub mod hybrid;
pub mod lexical;
pub mod rerank;
pub mod vector;

pub use embedding::EmbeddingClient;
pub use hybrid::HybridRetriever;
pub use lexical::LexicalClient;
pub use rerank::RerankClient;
pub use vector::VectorStore;

use serde::Deserialize;

/// A raw retrieval candidate before fusion/reranking.
///
/// `offset` is the chunk offset within the source page; together with
/// title and section it identifies a passage for de-duplication.
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub title: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub score: f32,
}

impl Candidate {
    /// De-duplication identity of a passage chunk.
    pub fn key(&self) -> (String, String, i64) {
        (self.title.clone(), self.section.clone(), self.offset)
    }
}
