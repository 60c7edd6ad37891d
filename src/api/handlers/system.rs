//! System endpoints: health check and caller echo.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::auth::Caller;
use crate::error::ErrorResponse;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    /// Live WebSocket connections.
    connections: usize,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp and the number of live WebSocket connections.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let connections = state.dispatcher.registry().connection_count().await;
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            connections,
        }),
    )
}

/// `GET /auth/me`: Echo the verified caller.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "System",
    summary = "Current identity",
    responses(
        (status = 200, description = "Verified caller", body = Caller),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn me_handler(caller: Caller) -> Json<Caller> {
    Json(caller)
}

/// System routes mounted at the root level (not under /api).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/me", get(me_handler))
}
