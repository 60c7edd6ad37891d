//! User directory handlers. Operators only.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::auth::Caller;
use crate::domain::{CameraId, IncidentId, User};
use crate::error::{ErrorResponse, ServiceError};

/// `GET /api/users`: List every user.
///
/// # Errors
///
/// Returns [`ServiceError::PermissionDenied`] for guards.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    summary = "List users",
    responses(
        (status = 200, description = "User list", body = Vec<User>),
        (status = 403, description = "Operators only", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<User>>, ServiceError> {
    Ok(Json(state.directory.users(&caller).await?))
}

/// `GET /api/users/assigned/camera/{id}`: Guards watching a camera.
///
/// # Errors
///
/// Returns [`ServiceError::PermissionDenied`] for guards.
#[utoipa::path(
    get,
    path = "/api/users/assigned/camera/{id}",
    tag = "Users",
    summary = "List camera guards",
    params(("id" = uuid::Uuid, Path, description = "Camera UUID")),
    responses(
        (status = 200, description = "Guard list", body = Vec<User>),
        (status = 403, description = "Operators only", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn users_by_camera(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Vec<User>>, ServiceError> {
    let id: CameraId = id.parse()?;
    Ok(Json(state.directory.users_by_camera(&caller, id).await?))
}

/// `GET /api/users/assigned/incident/{id}`: Guards on an incident.
///
/// # Errors
///
/// Returns [`ServiceError::PermissionDenied`] for guards.
#[utoipa::path(
    get,
    path = "/api/users/assigned/incident/{id}",
    tag = "Users",
    summary = "List incident guards",
    params(("id" = uuid::Uuid, Path, description = "Incident UUID")),
    responses(
        (status = 200, description = "Guard list", body = Vec<User>),
        (status = 403, description = "Operators only", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn users_by_incident(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Vec<User>>, ServiceError> {
    let id: IncidentId = id.parse()?;
    Ok(Json(state.directory.users_by_incident(&caller, id).await?))
}

/// User routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/assigned/camera/{id}", get(users_by_camera))
        .route("/users/assigned/incident/{id}", get(users_by_incident))
}
