//! Application state.

use loreqa_core::{AnswerOrchestrator, CurationService};
use loreqa_graph::GraphSandbox;
use std::sync::Arc;

/// Application state shared across handlers.
///
/// Everything here is read-only wiring; no request-scoped state is
/// retained between calls.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnswerOrchestrator>,
    pub sandbox: Arc<GraphSandbox>,
    pub curation: Arc<CurationService>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<AnswerOrchestrator>,
        sandbox: Arc<GraphSandbox>,
        curation: Arc<CurationService>,
    ) -> Self {
        Self {
            orchestrator,
            sandbox,
            curation,
        }
    }
}
