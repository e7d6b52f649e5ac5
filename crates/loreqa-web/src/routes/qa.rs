//! QA route handler.

use axum::{
    extract::{Query, State},
    Json,
};
use loreqa_core::AnswerResult;
use serde::Deserialize;

use crate::routes::ApiError;
use crate::state::AppState;

fn default_top_k() -> usize {
    5
}

fn default_use_graph() -> bool {
    true
}

#[derive(Deserialize)]
pub struct QaParams {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_use_graph")]
    pub use_graph: bool,
}

pub async fn answer(
    State(state): State<AppState>,
    Query(params): Query<QaParams>,
) -> Result<Json<AnswerResult>, ApiError> {
    let result = state
        .orchestrator
        .answer(&params.query, params.top_k, params.use_graph)
        .await?;

    Ok(Json(result))
}
