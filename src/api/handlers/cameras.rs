//! Camera handlers.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::StatusUpdateRequest;
use crate::app_state::AppState;
use crate::auth::Caller;
use crate::domain::{Camera, CameraId, PremiseId};
use crate::error::{ErrorResponse, ServiceError};

/// `GET /api/cameras`: List every camera.
///
/// # Errors
///
/// Returns [`ServiceError::PermissionDenied`] for guards.
#[utoipa::path(
    get,
    path = "/api/cameras",
    tag = "Cameras",
    summary = "List cameras",
    responses(
        (status = 200, description = "Camera list", body = Vec<Camera>),
        (status = 403, description = "Operators only", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_cameras(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Camera>>, ServiceError> {
    Ok(Json(state.directory.cameras(&caller).await?))
}

/// `GET /api/cameras/premise/{id}`: Cameras on a premise.
///
/// # Errors
///
/// Returns [`ServiceError::PermissionDenied`] for guards.
#[utoipa::path(
    get,
    path = "/api/cameras/premise/{id}",
    tag = "Cameras",
    summary = "List cameras by premise",
    params(("id" = uuid::Uuid, Path, description = "Premise UUID")),
    responses(
        (status = 200, description = "Camera list", body = Vec<Camera>),
        (status = 403, description = "Operators only", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn cameras_by_premise(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Vec<Camera>>, ServiceError> {
    let id: PremiseId = id.parse()?;
    Ok(Json(state.directory.cameras_by_premise(&caller, id).await?))
}

/// `GET /api/cameras/assigned`: Cameras the calling guard watches.
///
/// # Errors
///
/// Returns [`ServiceError::PermissionDenied`] for operators.
#[utoipa::path(
    get,
    path = "/api/cameras/assigned",
    tag = "Cameras",
    summary = "List my cameras",
    responses(
        (status = 200, description = "Camera list", body = Vec<Camera>),
        (status = 403, description = "Guards only", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn assigned_cameras(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Camera>>, ServiceError> {
    Ok(Json(state.directory.assigned_cameras(&caller).await?))
}

/// `GET /api/cameras/{id}`: Get one camera.
///
/// # Errors
///
/// Returns [`ServiceError`] for an unknown camera, or a guard who does not
/// watch it.
#[utoipa::path(
    get,
    path = "/api/cameras/{id}",
    tag = "Cameras",
    summary = "Get camera",
    params(("id" = uuid::Uuid, Path, description = "Camera UUID")),
    responses(
        (status = 200, description = "Camera", body = Camera),
        (status = 403, description = "Not assigned to caller", body = ErrorResponse),
        (status = 404, description = "Camera not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_camera(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Camera>, ServiceError> {
    let id: CameraId = id.parse()?;
    Ok(Json(state.directory.camera(&caller, id).await?))
}

/// `PUT /api/cameras/{id}/status`: Change a camera's operational status.
///
/// # Errors
///
/// Returns [`ServiceError`] for guards, an unknown status or an unknown
/// camera.
#[utoipa::path(
    put,
    path = "/api/cameras/{id}/status",
    tag = "Cameras",
    summary = "Update camera status",
    params(("id" = uuid::Uuid, Path, description = "Camera UUID")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Updated camera", body = Camera),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 403, description = "Operators only", body = ErrorResponse),
        (status = 404, description = "Camera not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_camera_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Camera>, ServiceError> {
    let id: CameraId = id.parse()?;
    let status = req.parse()?;
    Ok(Json(state.directory.set_camera_status(&caller, id, status).await?))
}

/// Camera routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cameras", get(list_cameras))
        .route("/cameras/assigned", get(assigned_cameras))
        .route("/cameras/premise/{id}", get(cameras_by_premise))
        .route("/cameras/{id}", get(get_camera))
        .route("/cameras/{id}/status", put(update_camera_status))
}
