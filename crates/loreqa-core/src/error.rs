//! Centralized error taxonomy for loreqa.

use thiserror::Error;

/// Main error type for QA and curation operations.
///
/// Every failure a request can surface maps to exactly one of these kinds;
/// the web layer translates them to HTTP statuses. Graph-fact fetch failure
/// during an answer call is the one failure recovered locally (degrades to
/// passages-only) and therefore has no variant here.
#[derive(Error, Debug)]
pub enum QaError {
    /// The sandbox detected a mutating or malformed graph query.
    #[error("Query rejected: {0}")]
    RejectedQuery(String),

    /// The store refused a syntactically-valid read query.
    #[error("Graph query failed: {0}")]
    QueryError(String),

    /// The primary passage source failed; the answer cannot be produced.
    #[error("Passage retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// The bounded wait for retrieval expired.
    #[error("Retrieval timed out")]
    RetrievalTimeout,

    /// Missing or invalid admin credential; no mutation was attempted.
    #[error("Unauthorized")]
    Unauthorized,

    /// The curation target triple does not exist.
    #[error("Edge not found: ({src})-[{rel}]->({dst})")]
    NotFound {
        src: String,
        rel: String,
        dst: String,
    },

    /// A concurrent-mutation precondition failed; re-fetch and retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid request parameters.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type for loreqa operations.
pub type QaResult<T> = Result<T, QaError>;

impl QaError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not-found error for an edge triple.
    pub fn not_found(key: &crate::model::EdgeKey) -> Self {
        Self::NotFound {
            src: key.src.clone(),
            rel: key.rel.clone(),
            dst: key.dst.clone(),
        }
    }
}
