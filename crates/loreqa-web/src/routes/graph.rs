//! Sandboxed graph query route handler.

use axum::{
    extract::{Query, State},
    Json,
};
use loreqa_core::GraphRow;
use serde::{Deserialize, Serialize};

use crate::routes::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GraphParams {
    pub query: String,
}

#[derive(Serialize)]
pub struct GraphResponse {
    pub rows: Vec<GraphRow>,
}

pub async fn query(
    State(state): State<AppState>,
    Query(params): Query<GraphParams>,
) -> Result<Json<GraphResponse>, ApiError> {
    let rows = state.sandbox.execute(&params.query).await?;
    Ok(Json(GraphResponse { rows }))
}
