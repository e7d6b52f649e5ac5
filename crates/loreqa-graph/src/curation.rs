//! Neo4j-backed edge curation store.
//!
//! Implements [`CurationBackend`] with each primitive as a single atomic
//! unit at the store: one-statement conditional writes where Cypher can
//! express them, and an explicit transaction for the read-check-write
//! dance of `replace`. No application-level locks; concurrent curators are
//! serialized by the store, and a lost race surfaces as a conflict or a
//! missing triple, never a torn write.
//!
//! Every mutation records an `:AuditLog` node in the same transaction.

use async_trait::async_trait;
use chrono::Utc;
use loreqa_core::{
    Confidence, CurationBackend, CurationItem, Edge, EdgeKey, ReplaceOutcome,
    curation::EdgeUpdate,
};
use neo4rs::Query;
use tracing::debug;

use crate::client::GraphClient;

/// Actor recorded on audit log entries for token-authenticated calls.
const AUDIT_ACTOR: &str = "admin";

pub struct Neo4jCurationStore {
    client: GraphClient,
}

impl Neo4jCurationStore {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    fn audit_query(action: &str, key: &EdgeKey) -> Query {
        Query::new(
            "CREATE (:AuditLog {ts: $ts, actor: $actor, action: $action, \
             src: $src, rel: $rel, dst: $dst})"
                .to_string(),
        )
        .param("ts", Utc::now().to_rfc3339())
        .param("actor", AUDIT_ACTOR)
        .param("action", action)
        .param("src", key.src.as_str())
        .param("rel", key.rel.as_str())
        .param("dst", key.dst.as_str())
    }
}

fn edge_query(cypher: &str, key: &EdgeKey) -> Query {
    Query::new(cypher.to_string())
        .param("src", key.src.as_str())
        .param("rel", key.rel.as_str())
        .param("dst", key.dst.as_str())
}

fn parse_confidence(raw: &str) -> Confidence {
    raw.parse().unwrap_or(Confidence::Low)
}

#[async_trait]
impl CurationBackend for Neo4jCurationStore {
    async fn list_low(&self, limit: usize) -> anyhow::Result<Vec<CurationItem>> {
        let query = Query::new(
            "MATCH (a:Entity)-[r:REL]->(b:Entity)
             WHERE coalesce(r.confidence, 'low') = 'low'
             RETURN a.id AS src, r.rel AS rel, b.id AS dst,
                    coalesce(r.evidence, []) AS evidence,
                    coalesce(r.confidence, 'low') AS confidence
             LIMIT $limit"
                .to_string(),
        )
        .param("limit", limit as i64);

        let rows = self.client.query(query).await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let confidence: String = row.get("confidence")?;
            items.push(CurationItem {
                src: row.get("src")?,
                rel: row.get("rel")?,
                dst: row.get("dst")?,
                confidence: parse_confidence(&confidence),
                evidence: row.get("evidence")?,
            });
        }
        Ok(items)
    }

    async fn approve(&self, key: &EdgeKey) -> anyhow::Result<Option<Confidence>> {
        // Conditional raise in one statement so two concurrent approvals
        // cannot interleave; non-low confidence is left as-is.
        let query = edge_query(
            "MATCH (a:Entity {id: $src})-[r:REL {rel: $rel}]->(b:Entity {id: $dst})
             SET r.confidence = CASE
                 WHEN coalesce(r.confidence, 'low') = 'low' THEN 'high'
                 ELSE r.confidence
             END
             WITH r
             CREATE (:AuditLog {ts: $ts, actor: $actor, action: 'approve',
                                src: $src, rel: $rel, dst: $dst})
             RETURN r.confidence AS confidence",
            key,
        )
        .param("ts", Utc::now().to_rfc3339())
        .param("actor", AUDIT_ACTOR);

        let rows = self.client.query(query).await?;
        match rows.into_iter().next() {
            Some(row) => {
                let confidence: String = row.get("confidence")?;
                Ok(Some(parse_confidence(&confidence)))
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, key: &EdgeKey) -> anyhow::Result<bool> {
        let query = edge_query(
            "MATCH (a:Entity {id: $src})-[r:REL {rel: $rel}]->(b:Entity {id: $dst})
             DELETE r
             WITH 1 AS removed
             CREATE (:AuditLog {ts: $ts, actor: $actor, action: 'delete',
                                src: $src, rel: $rel, dst: $dst})
             RETURN removed",
            key,
        )
        .param("ts", Utc::now().to_rfc3339())
        .param("actor", AUDIT_ACTOR);

        let rows = self.client.query(query).await?;
        Ok(!rows.is_empty())
    }

    async fn replace(&self, key: &EdgeKey, update: &EdgeUpdate) -> anyhow::Result<ReplaceOutcome> {
        let target = update.target_key(key);
        let mut txn = self.client.inner().start_txn().await?;

        // Read current state inside the transaction.
        let read = edge_query(
            "MATCH (a:Entity {id: $src})-[r:REL {rel: $rel}]->(b:Entity {id: $dst})
             RETURN coalesce(r.confidence, 'low') AS confidence,
                    coalesce(r.evidence, []) AS evidence",
            key,
        );
        let mut stream = txn.execute(read).await?;
        let Some(row) = stream.next(txn.handle()).await? else {
            txn.rollback().await?;
            return Ok(ReplaceOutcome::Missing);
        };
        let current_confidence: String = row.get("confidence")?;
        let evidence: Vec<String> = row.get("evidence")?;
        let confidence = update
            .confidence
            .unwrap_or_else(|| parse_confidence(&current_confidence));

        if target != *key {
            // The key changes: precondition checks before retiring the triple.
            let conflict_check = edge_query(
                "MATCH (a:Entity {id: $src})-[r:REL {rel: $rel}]->(b:Entity {id: $dst})
                 RETURN r.rel AS rel",
                &target,
            );
            let mut stream = txn.execute(conflict_check).await?;
            if stream.next(txn.handle()).await?.is_some() {
                txn.rollback().await?;
                return Ok(ReplaceOutcome::Conflict(target));
            }

            let dst_check = Query::new("MATCH (c:Entity {id: $id}) RETURN c.id AS id".to_string())
                .param("id", target.dst.as_str());
            let mut stream = txn.execute(dst_check).await?;
            if stream.next(txn.handle()).await?.is_none() {
                txn.rollback().await?;
                return Ok(ReplaceOutcome::MissingDst(target.dst));
            }

            // Retire the old triple and create its replacement, carrying
            // evidence over.
            let rewrite = edge_query(
                "MATCH (a:Entity {id: $src})-[r:REL {rel: $rel}]->(b:Entity {id: $dst})
                 MATCH (c:Entity {id: $new_dst})
                 DELETE r
                 CREATE (a)-[:REL {rel: $new_rel, confidence: $confidence,
                                   evidence: $evidence}]->(c)",
                key,
            )
            .param("new_rel", target.rel.as_str())
            .param("new_dst", target.dst.as_str())
            .param("confidence", confidence.as_str())
            .param("evidence", evidence.clone());
            txn.run(rewrite).await?;
        } else {
            // Key unchanged: confidence-only update in place.
            let set = edge_query(
                "MATCH (a:Entity {id: $src})-[r:REL {rel: $rel}]->(b:Entity {id: $dst})
                 SET r.confidence = $confidence",
                key,
            )
            .param("confidence", confidence.as_str());
            txn.run(set).await?;
        }

        txn.run(Self::audit_query("update", key)).await?;
        txn.commit().await?;

        debug!(from = %key, to = %target, "replaced edge");
        Ok(ReplaceOutcome::Replaced(Edge {
            key: target,
            confidence,
            evidence,
        }))
    }
}
