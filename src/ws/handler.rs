//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::auth::bearer_token;
use crate::error::ServiceError;

/// Query parameters accepted on upgrade.
#[derive(Debug, Deserialize)]
pub struct UpgradeParams {
    /// Bearer token for clients that cannot set headers on upgrade.
    pub access_token: Option<String>,
}

/// `GET /ws`: Verify the caller, then upgrade to a notification stream.
///
/// The token comes from `Authorization: Bearer` or, failing that, the
/// `access_token` query parameter.
///
/// # Errors
///
/// Returns [`ServiceError::Unauthorized`] before upgrading if no valid
/// token is presented.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<UpgradeParams>,
    headers: HeaderMap,
) -> Result<Response, ServiceError> {
    let token = bearer_token(&headers)
        .or(params.access_token.as_deref())
        .ok_or_else(|| ServiceError::Unauthorized("bearer token required".to_string()))?;
    let caller = state.verifier.verify(token)?;

    let dispatcher = state.dispatcher.clone();
    let hub = state.hub;
    Ok(ws
        .max_message_size(hub.max_message_bytes)
        .on_upgrade(move |socket| run_connection(socket, caller, dispatcher, hub)))
}
