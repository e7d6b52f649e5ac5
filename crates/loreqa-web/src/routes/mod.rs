//! Route handlers and error-to-status mapping.

pub mod admin;
pub mod graph;
pub mod qa;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use loreqa_core::QaError;
use serde_json::json;

/// Health check endpoint.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

/// Wrapper translating the domain error taxonomy into HTTP responses.
pub struct ApiError(pub QaError);

impl From<QaError> for ApiError {
    fn from(err: QaError) -> Self {
        Self(err)
    }
}

/// Stable HTTP status per error kind.
pub fn status_for(err: &QaError) -> StatusCode {
    match err {
        QaError::RejectedQuery(_) | QaError::Validation(_) => StatusCode::BAD_REQUEST,
        QaError::Unauthorized => StatusCode::UNAUTHORIZED,
        QaError::NotFound { .. } => StatusCode::NOT_FOUND,
        QaError::Conflict(_) => StatusCode::CONFLICT,
        QaError::QueryError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        QaError::RetrievalTimeout => StatusCode::GATEWAY_TIMEOUT,
        QaError::RetrievalUnavailable(_) => StatusCode::BAD_GATEWAY,
        QaError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Query-string optional fields arrive as empty strings from the admin UI;
/// treat blank as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreqa_core::EdgeKey;

    #[test]
    fn error_kinds_map_to_stable_statuses() {
        assert_eq!(
            status_for(&QaError::RejectedQuery("create".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&QaError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(&QaError::not_found(&EdgeKey::new("a", "R", "b"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&QaError::Conflict("taken".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&QaError::RetrievalTimeout),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&QaError::RetrievalUnavailable("down".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn blank_optional_params_become_none() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(String::new())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("MEMBER_OF".into())), Some("MEMBER_OF".into()));
    }
}
