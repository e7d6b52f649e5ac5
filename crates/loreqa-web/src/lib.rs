//! loreqa HTTP surface
//!
//! Axum-based server exposing the QA, sandboxed graph query, and admin
//! curation endpoints.

pub mod routes;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/qa", get(routes::qa::answer))
        .route("/graph", get(routes::graph::query))
        .route("/admin/edges/low", get(routes::admin::list_low))
        .route("/admin/edges/approve", post(routes::admin::approve))
        .route("/admin/edges/delete", post(routes::admin::delete))
        .route("/admin/edges/update", post(routes::admin::update))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server.
pub async fn run_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("QA service listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}
