//! Environment-driven service configuration.

use serde::Deserialize;
use std::env;
use std::time::Duration;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Connection settings for the passage index (OpenSearch).
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub url: String,
    pub index: String,
}

/// Connection settings for the vector store and embedding endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorConfig {
    pub qdrant_url: String,
    pub collection: String,
    pub embedding_url: String,
    pub embedding_model: String,
    /// Optional rerank endpoint; when unset, ranked lists are RRF-fused.
    pub rerank_url: Option<String>,
}

/// Connection settings for Neo4j.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "please_change_me".to_string(),
        }
    }
}

/// Top-level service configuration, assembled from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub search: SearchConfig,
    pub vector: VectorConfig,
    pub graph: GraphConfig,
    /// Admin credential for curation endpoints. When unset, every admin
    /// call is refused.
    pub admin_token: Option<String>,
    pub host: String,
    pub port: u16,
    /// Ceiling for the `top_k` answer parameter; larger values are clamped.
    pub max_top_k: usize,
    /// Hard row cap for sandboxed graph queries.
    pub sandbox_max_rows: usize,
    /// Hard execution-time cap for sandboxed graph queries.
    pub sandbox_timeout: Duration,
    /// Overall deadline for a single answer call.
    pub answer_timeout: Duration,
}

impl Config {
    /// Build a configuration from environment variables, falling back to
    /// local-development defaults.
    pub fn from_env() -> Self {
        Self {
            search: SearchConfig {
                url: env_or("OPENSEARCH_URL", "http://localhost:9200"),
                index: env_or("OPENSEARCH_INDEX", "passages-wod"),
            },
            vector: VectorConfig {
                qdrant_url: env_or("QDRANT_URL", "http://localhost:6334"),
                collection: env_or("QDRANT_COLLECTION", "passages-wod"),
                embedding_url: env_or("EMBEDDING_URL", "http://localhost:11434"),
                embedding_model: env_or("EMBEDDING_MODEL", "nomic-embed-text"),
                rerank_url: env::var("RERANK_URL").ok().filter(|v| !v.is_empty()),
            },
            graph: GraphConfig {
                uri: env_or("NEO4J_URI", "bolt://localhost:7687"),
                user: env_or("NEO4J_USER", "neo4j"),
                password: env_or("NEO4J_PASSWORD", "please_change_me"),
            },
            admin_token: env::var("ADMIN_TOKEN").ok().filter(|v| !v.is_empty()),
            host: env_or("QA_HOST", "0.0.0.0"),
            port: env_parse("QA_PORT", 8000),
            max_top_k: env_parse("QA_MAX_TOP_K", 25),
            sandbox_max_rows: env_parse("SANDBOX_MAX_ROWS", 200),
            sandbox_timeout: Duration::from_secs(env_parse("SANDBOX_TIMEOUT_SECS", 10)),
            answer_timeout: Duration::from_secs(env_parse("ANSWER_TIMEOUT_SECS", 30)),
        }
    }
}
