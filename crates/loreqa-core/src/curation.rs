//! Edge curation: the low-confidence worklist and its state machine.
//!
//! The backing store is the single source of truth; nothing is cached
//! across requests. Each backend primitive is one atomic unit at the store
//! (a transaction for the Neo4j implementation), so concurrent curators
//! cannot interleave field-by-field writes. [`CurationService`] layers
//! authorization and the transition rules on top.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::error::{QaError, QaResult};
use crate::model::{Confidence, CurationItem, Edge, EdgeKey};

/// Optional replacement fields for an edge update. Absent fields mean
/// "unchanged"; a confidence-only update is valid.
#[derive(Debug, Clone, Default)]
pub struct EdgeUpdate {
    pub new_rel: Option<String>,
    pub new_dst: Option<String>,
    pub confidence: Option<Confidence>,
}

impl EdgeUpdate {
    /// The key the edge will have after this update is applied to `key`.
    pub fn target_key(&self, key: &EdgeKey) -> EdgeKey {
        EdgeKey {
            src: key.src.clone(),
            rel: self.new_rel.clone().unwrap_or_else(|| key.rel.clone()),
            dst: self.new_dst.clone().unwrap_or_else(|| key.dst.clone()),
        }
    }
}

/// Outcome of an atomic replace at the store.
#[derive(Debug, Clone)]
pub enum ReplaceOutcome {
    /// The full replacement was committed.
    Replaced(Edge),
    /// The source triple no longer exists.
    Missing,
    /// The replacement's destination entity does not exist.
    MissingDst(String),
    /// The replacement triple is already owned by a different edge.
    Conflict(EdgeKey),
}

/// Atomic store primitives for curation.
///
/// Implementations must make each call a single transactional unit:
/// read-current-state, check precondition, write-new-state commit together
/// or not at all.
#[async_trait]
pub trait CurationBackend: Send + Sync {
    /// Edges currently at `low` confidence, up to `limit`.
    async fn list_low(&self, limit: usize) -> anyhow::Result<Vec<CurationItem>>;

    /// Raise `low` to `high` for the triple, leaving any other confidence
    /// untouched. Returns the resulting confidence, or `None` when the
    /// triple is absent.
    async fn approve(&self, key: &EdgeKey) -> anyhow::Result<Option<Confidence>>;

    /// Remove the triple in any state. Returns whether an edge existed.
    async fn remove(&self, key: &EdgeKey) -> anyhow::Result<bool>;

    /// Replace the triple per `update`, carrying evidence over.
    async fn replace(&self, key: &EdgeKey, update: &EdgeUpdate) -> anyhow::Result<ReplaceOutcome>;
}

/// Receipt for an approve action.
#[derive(Debug, Clone, Serialize)]
pub struct ApproveReceipt {
    pub src: String,
    pub rel: String,
    pub dst: String,
    pub confidence: Confidence,
}

/// Receipt for a delete action. `deleted` is false when the triple was
/// already gone (repeated delete is idempotent success).
#[derive(Debug, Clone, Serialize)]
pub struct DeleteReceipt {
    pub src: String,
    pub rel: String,
    pub dst: String,
    pub deleted: bool,
}

/// Authorized list/approve/delete/update operations over the curation store.
pub struct CurationService {
    backend: Arc<dyn CurationBackend>,
    admin_token: Option<String>,
}

/// Listing cap; a larger requested limit is clamped, not rejected.
const MAX_LIST_LIMIT: usize = 500;

impl CurationService {
    pub fn new(backend: Arc<dyn CurationBackend>, admin_token: Option<String>) -> Self {
        Self {
            backend,
            admin_token,
        }
    }

    /// Validate the caller's credential before touching the store.
    ///
    /// A service with no configured token refuses every admin call.
    fn check_admin(&self, token: Option<&str>) -> QaResult<()> {
        match (&self.admin_token, token) {
            (Some(expected), Some(given)) if expected == given => Ok(()),
            _ => Err(QaError::Unauthorized),
        }
    }

    /// The low-confidence worklist, up to `limit` items.
    pub async fn list_low(&self, token: Option<&str>, limit: usize) -> QaResult<Vec<CurationItem>> {
        self.check_admin(token)?;
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        Ok(self.backend.list_low(limit).await?)
    }

    /// Approve a low-confidence edge, raising it to `high`.
    ///
    /// Approving an edge that is no longer `low` is a no-op success.
    pub async fn approve(&self, token: Option<&str>, key: &EdgeKey) -> QaResult<ApproveReceipt> {
        self.check_admin(token)?;
        match self.backend.approve(key).await? {
            Some(confidence) => {
                info!(edge = %key, %confidence, "approved edge");
                Ok(ApproveReceipt {
                    src: key.src.clone(),
                    rel: key.rel.clone(),
                    dst: key.dst.clone(),
                    confidence,
                })
            }
            None => Err(QaError::not_found(key)),
        }
    }

    /// Delete an edge in any state. Idempotent: deleting an absent triple
    /// succeeds with `deleted: false`.
    pub async fn delete(&self, token: Option<&str>, key: &EdgeKey) -> QaResult<DeleteReceipt> {
        self.check_admin(token)?;
        let deleted = self.backend.remove(key).await?;
        if deleted {
            info!(edge = %key, "deleted edge");
        }
        Ok(DeleteReceipt {
            src: key.src.clone(),
            rel: key.rel.clone(),
            dst: key.dst.clone(),
            deleted,
        })
    }

    /// Replace an edge's rel/dst/confidence atomically. Absent fields stay
    /// unchanged. Fails with `Conflict` when the replacement triple already
    /// belongs to a different edge, leaving both edges untouched.
    pub async fn update(
        &self,
        token: Option<&str>,
        key: &EdgeKey,
        update: EdgeUpdate,
    ) -> QaResult<Edge> {
        self.check_admin(token)?;
        match self.backend.replace(key, &update).await? {
            ReplaceOutcome::Replaced(edge) => {
                info!(from = %key, to = %edge.key, "updated edge");
                Ok(edge)
            }
            ReplaceOutcome::Missing => Err(QaError::not_found(key)),
            ReplaceOutcome::MissingDst(dst) => Err(QaError::Validation(format!(
                "target entity '{}' does not exist",
                dst
            ))),
            ReplaceOutcome::Conflict(target) => Err(QaError::Conflict(format!(
                "edge {} already exists",
                target
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory backend mirroring the store's transactional contract.
    #[derive(Default)]
    struct MemBackend {
        edges: Mutex<HashMap<EdgeKey, (Confidence, Vec<String>)>>,
        calls: Mutex<usize>,
    }

    impl MemBackend {
        fn with_edge(key: EdgeKey, confidence: Confidence, evidence: Vec<String>) -> Self {
            let backend = Self::default();
            backend
                .edges
                .lock()
                .unwrap()
                .insert(key, (confidence, evidence));
            backend
        }

        fn confidence_of(&self, key: &EdgeKey) -> Option<Confidence> {
            self.edges.lock().unwrap().get(key).map(|(c, _)| *c)
        }
    }

    #[async_trait]
    impl CurationBackend for MemBackend {
        async fn list_low(&self, limit: usize) -> anyhow::Result<Vec<CurationItem>> {
            *self.calls.lock().unwrap() += 1;
            let edges = self.edges.lock().unwrap();
            Ok(edges
                .iter()
                .filter(|(_, (c, _))| *c == Confidence::Low)
                .take(limit)
                .map(|(k, (c, ev))| CurationItem {
                    src: k.src.clone(),
                    rel: k.rel.clone(),
                    dst: k.dst.clone(),
                    confidence: *c,
                    evidence: ev.clone(),
                })
                .collect())
        }

        async fn approve(&self, key: &EdgeKey) -> anyhow::Result<Option<Confidence>> {
            *self.calls.lock().unwrap() += 1;
            let mut edges = self.edges.lock().unwrap();
            Ok(edges.get_mut(key).map(|(c, _)| {
                if *c == Confidence::Low {
                    *c = Confidence::High;
                }
                *c
            }))
        }

        async fn remove(&self, key: &EdgeKey) -> anyhow::Result<bool> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.edges.lock().unwrap().remove(key).is_some())
        }

        async fn replace(
            &self,
            key: &EdgeKey,
            update: &EdgeUpdate,
        ) -> anyhow::Result<ReplaceOutcome> {
            *self.calls.lock().unwrap() += 1;
            let mut edges = self.edges.lock().unwrap();
            let Some((confidence, evidence)) = edges.get(key).cloned() else {
                return Ok(ReplaceOutcome::Missing);
            };
            let target = update.target_key(key);
            if target != *key && edges.contains_key(&target) {
                return Ok(ReplaceOutcome::Conflict(target));
            }
            edges.remove(key);
            let confidence = update.confidence.unwrap_or(confidence);
            edges.insert(target.clone(), (confidence, evidence.clone()));
            Ok(ReplaceOutcome::Replaced(Edge {
                key: target,
                confidence,
                evidence,
            }))
        }
    }

    /// Backend whose store connection is gone mid-request.
    struct BrokenBackend;

    #[async_trait]
    impl CurationBackend for BrokenBackend {
        async fn list_low(&self, _limit: usize) -> anyhow::Result<Vec<CurationItem>> {
            anyhow::bail!("bolt stream reset")
        }

        async fn approve(&self, _key: &EdgeKey) -> anyhow::Result<Option<Confidence>> {
            anyhow::bail!("bolt stream reset")
        }

        async fn remove(&self, _key: &EdgeKey) -> anyhow::Result<bool> {
            anyhow::bail!("bolt stream reset")
        }

        async fn replace(
            &self,
            _key: &EdgeKey,
            _update: &EdgeUpdate,
        ) -> anyhow::Result<ReplaceOutcome> {
            anyhow::bail!("bolt stream reset")
        }
    }

    fn ventrue_key() -> EdgeKey {
        EdgeKey::new("ventrue", "HAS_DISCIPLINE", "dominate")
    }

    fn service_with(backend: MemBackend) -> (CurationService, Arc<MemBackend>) {
        let backend = Arc::new(backend);
        let service = CurationService::new(backend.clone(), Some("s3cret".to_string()));
        (service, backend)
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized_without_store_call() {
        let (service, backend) = service_with(MemBackend::default());

        let result = service.list_low(None, 50).await;
        assert!(matches!(result, Err(QaError::Unauthorized)));
        assert_eq!(*backend.calls.lock().unwrap(), 0);

        let result = service.approve(Some("wrong"), &ventrue_key()).await;
        assert!(matches!(result, Err(QaError::Unauthorized)));
        assert_eq!(*backend.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn unconfigured_token_refuses_everything() {
        let backend = Arc::new(MemBackend::default());
        let service = CurationService::new(backend, None);
        let result = service.list_low(Some("anything"), 50).await;
        assert!(matches!(result, Err(QaError::Unauthorized)));
    }

    #[tokio::test]
    async fn store_failure_is_internal_never_not_found() {
        // A dropped connection must not masquerade as a missing triple or
        // an empty worklist: the write may already have committed.
        let service = CurationService::new(Arc::new(BrokenBackend), Some("s3cret".to_string()));
        let token = Some("s3cret");

        let result = service.approve(token, &ventrue_key()).await;
        assert!(matches!(result, Err(QaError::Internal(_))));

        let result = service.list_low(token, 50).await;
        assert!(matches!(result, Err(QaError::Internal(_))));

        let result = service.delete(token, &ventrue_key()).await;
        assert!(matches!(result, Err(QaError::Internal(_))));
    }

    #[tokio::test]
    async fn approve_removes_edge_from_worklist() {
        let (service, _) = service_with(MemBackend::with_edge(
            ventrue_key(),
            Confidence::Low,
            vec!["wiki:Ventrue#Disciplines".to_string()],
        ));
        let token = Some("s3cret");

        let items = service.list_low(token, 50).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].src, "ventrue");
        assert_eq!(items[0].evidence, vec!["wiki:Ventrue#Disciplines"]);

        let receipt = service.approve(token, &ventrue_key()).await.unwrap();
        assert_eq!(receipt.confidence, Confidence::High);

        let items = service.list_low(token, 50).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn approve_is_idempotent() {
        let (service, backend) = service_with(MemBackend::with_edge(
            ventrue_key(),
            Confidence::Low,
            vec![],
        ));
        let token = Some("s3cret");

        service.approve(token, &ventrue_key()).await.unwrap();
        let receipt = service.approve(token, &ventrue_key()).await.unwrap();
        assert_eq!(receipt.confidence, Confidence::High);
        assert_eq!(backend.confidence_of(&ventrue_key()), Some(Confidence::High));
    }

    #[tokio::test]
    async fn approve_leaves_medium_untouched() {
        let (service, backend) = service_with(MemBackend::with_edge(
            ventrue_key(),
            Confidence::Medium,
            vec![],
        ));

        let receipt = service.approve(Some("s3cret"), &ventrue_key()).await.unwrap();
        assert_eq!(receipt.confidence, Confidence::Medium);
        assert_eq!(
            backend.confidence_of(&ventrue_key()),
            Some(Confidence::Medium)
        );
    }

    #[tokio::test]
    async fn approve_absent_triple_is_not_found() {
        let (service, _) = service_with(MemBackend::default());
        let result = service.approve(Some("s3cret"), &ventrue_key()).await;
        assert!(matches!(result, Err(QaError::NotFound { .. })));
    }

    #[tokio::test]
    async fn double_delete_is_idempotent() {
        let (service, _) = service_with(MemBackend::with_edge(
            ventrue_key(),
            Confidence::High,
            vec![],
        ));
        let token = Some("s3cret");

        let first = service.delete(token, &ventrue_key()).await.unwrap();
        assert!(first.deleted);
        let second = service.delete(token, &ventrue_key()).await.unwrap();
        assert!(!second.deleted);
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let (service, _) = service_with(MemBackend::with_edge(
            ventrue_key(),
            Confidence::Low,
            vec!["wiki:Ventrue".to_string()],
        ));

        // Confidence-only update keeps the key.
        let edge = service
            .update(
                Some("s3cret"),
                &ventrue_key(),
                EdgeUpdate {
                    confidence: Some(Confidence::Medium),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edge.key, ventrue_key());
        assert_eq!(edge.confidence, Confidence::Medium);
        assert_eq!(edge.evidence, vec!["wiki:Ventrue"]);
    }

    #[tokio::test]
    async fn update_replaces_triple_key() {
        let (service, backend) = service_with(MemBackend::with_edge(
            ventrue_key(),
            Confidence::Low,
            vec![],
        ));

        let edge = service
            .update(
                Some("s3cret"),
                &ventrue_key(),
                EdgeUpdate {
                    new_dst: Some("presence".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edge.key.dst, "presence");
        assert_eq!(backend.confidence_of(&ventrue_key()), None);
    }

    #[tokio::test]
    async fn update_conflict_leaves_both_edges_unchanged() {
        let backend = MemBackend::with_edge(ventrue_key(), Confidence::Low, vec![]);
        let other = EdgeKey::new("ventrue", "HAS_DISCIPLINE", "presence");
        backend
            .edges
            .lock()
            .unwrap()
            .insert(other.clone(), (Confidence::High, vec![]));
        let (service, backend) = service_with(backend);

        let result = service
            .update(
                Some("s3cret"),
                &ventrue_key(),
                EdgeUpdate {
                    new_dst: Some("presence".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(QaError::Conflict(_))));
        assert_eq!(backend.confidence_of(&ventrue_key()), Some(Confidence::Low));
        assert_eq!(backend.confidence_of(&other), Some(Confidence::High));
    }

    #[tokio::test]
    async fn update_absent_triple_is_not_found() {
        let (service, _) = service_with(MemBackend::default());
        let result = service
            .update(Some("s3cret"), &ventrue_key(), EdgeUpdate::default())
            .await;
        assert!(matches!(result, Err(QaError::NotFound { .. })));
    }
}
