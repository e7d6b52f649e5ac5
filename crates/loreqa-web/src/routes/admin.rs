//! Admin curation route handlers.
//!
//! All handlers take the admin credential from the `x-admin-token` header
//! and pass it through to the curation service, which is the single
//! authorization gate; a missing or wrong token never reaches the store.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use loreqa_core::curation::{ApproveReceipt, DeleteReceipt, EdgeUpdate};
use loreqa_core::{Confidence, CurationItem, Edge, EdgeKey};
use serde::{Deserialize, Serialize};

use crate::routes::{non_blank, ApiError};
use crate::state::AppState;

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

fn admin_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(ADMIN_TOKEN_HEADER).and_then(|v| v.to_str().ok())
}

fn default_limit() -> usize {
    100
}

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub items: Vec<CurationItem>,
}

#[derive(Deserialize)]
pub struct EdgeParams {
    pub src: String,
    pub rel: String,
    pub dst: String,
}

impl EdgeParams {
    fn key(&self) -> EdgeKey {
        EdgeKey::new(&self.src, &self.rel, &self.dst)
    }
}

#[derive(Deserialize)]
pub struct UpdateParams {
    pub src: String,
    pub rel: String,
    pub dst: String,
    pub new_rel: Option<String>,
    pub new_dst: Option<String>,
    pub confidence: Option<String>,
}

pub async fn list_low(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let items = state
        .curation
        .list_low(admin_token(&headers), params.limit)
        .await?;
    Ok(Json(ListResponse { items }))
}

pub async fn approve(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<EdgeParams>,
) -> Result<Json<ApproveReceipt>, ApiError> {
    let receipt = state
        .curation
        .approve(admin_token(&headers), &params.key())
        .await?;
    Ok(Json(receipt))
}

pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<EdgeParams>,
) -> Result<Json<DeleteReceipt>, ApiError> {
    let receipt = state
        .curation
        .delete(admin_token(&headers), &params.key())
        .await?;
    Ok(Json(receipt))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<UpdateParams>,
) -> Result<Json<Edge>, ApiError> {
    let key = EdgeKey::new(&params.src, &params.rel, &params.dst);
    let confidence = match non_blank(params.confidence) {
        Some(raw) => Some(raw.parse::<Confidence>()?),
        None => None,
    };
    let update = EdgeUpdate {
        new_rel: non_blank(params.new_rel),
        new_dst: non_blank(params.new_dst),
        confidence,
    };

    let edge = state
        .curation
        .update(admin_token(&headers), &key, update)
        .await?;
    Ok(Json(edge))
}
