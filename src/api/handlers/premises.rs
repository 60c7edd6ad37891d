//! Premise handlers.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::auth::Caller;
use crate::domain::{Camera, Premise, PremiseId};
use crate::error::{ErrorResponse, ServiceError};

/// `GET /api/premises`: List every premise.
///
/// # Errors
///
/// Returns [`ServiceError::PermissionDenied`] for guards.
#[utoipa::path(
    get,
    path = "/api/premises",
    tag = "Premises",
    summary = "List premises",
    responses(
        (status = 200, description = "Premise list", body = Vec<Premise>),
        (status = 403, description = "Operators only", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_premises(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Premise>>, ServiceError> {
    Ok(Json(state.directory.premises(&caller).await?))
}

/// `GET /api/premises/{id}`: Get one premise.
///
/// # Errors
///
/// Returns [`ServiceError`] for guards or an unknown premise.
#[utoipa::path(
    get,
    path = "/api/premises/{id}",
    tag = "Premises",
    summary = "Get premise",
    params(("id" = uuid::Uuid, Path, description = "Premise UUID")),
    responses(
        (status = 200, description = "Premise", body = Premise),
        (status = 403, description = "Operators only", body = ErrorResponse),
        (status = 404, description = "Premise not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_premise(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Premise>, ServiceError> {
    let id: PremiseId = id.parse()?;
    Ok(Json(state.directory.premise(&caller, id).await?))
}

/// `GET /api/premises/{id}/cameras`: Cameras installed on a premise.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] for an unknown premise.
#[utoipa::path(
    get,
    path = "/api/premises/{id}/cameras",
    tag = "Premises",
    summary = "List premise cameras",
    params(("id" = uuid::Uuid, Path, description = "Premise UUID")),
    responses(
        (status = 200, description = "Camera list", body = Vec<Camera>),
        (status = 404, description = "Premise not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn premise_cameras(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Vec<Camera>>, ServiceError> {
    let id: PremiseId = id.parse()?;
    Ok(Json(state.directory.premise_cameras(id).await?))
}

/// Premise routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/premises", get(list_premises))
        .route("/premises/{id}", get(get_premise))
        .route("/premises/{id}/cameras", get(premise_cameras))
}
