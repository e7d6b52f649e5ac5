//! Neo4j connection client.

use anyhow::{Context, Result};
use loreqa_core::config::GraphConfig;
use neo4rs::{ConfigBuilder, Graph, Query};

/// Client for Neo4j knowledge graph operations.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Create a new GraphClient from config.
    ///
    /// Note: neo4rs uses a lazy deadpool — `Graph::connect` only creates the
    /// pool object and does NOT establish a real bolt connection yet. We run
    /// a cheap `RETURN 1` ping immediately so that callers can wrap this in
    /// a timeout and get a fast failure when Neo4j is unreachable instead of
    /// hanging silently.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db("neo4j")
            .max_connections(8)
            .fetch_size(50)
            .build()
            .context("Failed to build Neo4j config")?;

        let graph = Graph::connect(neo4j_config)
            .await
            .context("Failed to create Neo4j connection pool")?;

        // Ping to force an actual TCP+bolt handshake so the caller's timeout works.
        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .context("Neo4j is not responding to queries")?;

        Ok(Self { graph })
    }

    /// Execute a Cypher query that returns no results.
    pub async fn execute(&self, query: Query) -> Result<()> {
        self.graph
            .run(query)
            .await
            .context("Neo4j query execution failed")?;
        Ok(())
    }

    /// Execute a Cypher query and return results as rows.
    ///
    /// A stream error mid-drain is a transport failure, not an exhausted
    /// result set; it must propagate so callers never mistake a partial
    /// read for an empty or complete one.
    pub async fn query(&self, query: Query) -> Result<Vec<neo4rs::Row>> {
        let mut result = self
            .graph
            .execute(query)
            .await
            .context("Neo4j query failed")?;

        let mut rows = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .context("Neo4j result stream failed")?
        {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Get a reference to the underlying neo4rs Graph.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}
