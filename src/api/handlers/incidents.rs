//! Incident handlers: list, get, status, field reports, lookup by alert.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{IncidentQuery, StatusUpdateRequest};
use crate::app_state::AppState;
use crate::auth::Caller;
use crate::domain::{AlertId, Incident, IncidentId, IncidentUpdate, NewIncidentUpdate};
use crate::error::{ErrorResponse, ServiceError};

/// `GET /api/incidents`: List visible incidents, newest first.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidInput`] on an unknown status filter.
#[utoipa::path(
    get,
    path = "/api/incidents",
    tag = "Incidents",
    summary = "List incidents",
    params(IncidentQuery),
    responses(
        (status = 200, description = "Incident list", body = Vec<Incident>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_incidents(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<IncidentQuery>,
) -> Result<Json<Vec<Incident>>, ServiceError> {
    let status = query.status()?;
    Ok(Json(state.incidents.list(&caller, status).await?))
}

/// `GET /api/incidents/assigned/me`: Incidents the calling guard is on.
///
/// # Errors
///
/// Returns [`ServiceError::PermissionDenied`] for operators.
#[utoipa::path(
    get,
    path = "/api/incidents/assigned/me",
    tag = "Incidents",
    summary = "List my incidents",
    responses(
        (status = 200, description = "Assigned incidents", body = Vec<Incident>),
        (status = 403, description = "Guards only", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn assigned_incidents(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Incident>>, ServiceError> {
    Ok(Json(state.incidents.assigned_to_me(&caller).await?))
}

/// `GET /api/incidents/{id}`: Get one incident with roster and log.
///
/// # Errors
///
/// Returns [`ServiceError`] if the incident does not exist or the calling
/// guard is not assigned to it.
#[utoipa::path(
    get,
    path = "/api/incidents/{id}",
    tag = "Incidents",
    summary = "Get incident",
    params(("id" = uuid::Uuid, Path, description = "Incident UUID")),
    responses(
        (status = 200, description = "Incident", body = Incident),
        (status = 403, description = "Not assigned to caller", body = ErrorResponse),
        (status = 404, description = "Incident not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_incident(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Incident>, ServiceError> {
    let id: IncidentId = id.parse()?;
    Ok(Json(state.incidents.get(&caller, id).await?))
}

/// `PUT /api/incidents/{id}`: Change an incident's status.
///
/// # Errors
///
/// Returns [`ServiceError`] if the status is unknown, the incident does
/// not exist, or the calling guard is not assigned to it.
#[utoipa::path(
    put,
    path = "/api/incidents/{id}",
    tag = "Incidents",
    summary = "Update incident status",
    params(("id" = uuid::Uuid, Path, description = "Incident UUID")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Updated incident", body = Incident),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 403, description = "Not assigned to caller", body = ErrorResponse),
        (status = 404, description = "Incident not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_incident(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Incident>, ServiceError> {
    let id: IncidentId = id.parse()?;
    let status = req.parse()?;
    Ok(Json(state.incidents.update_status(&caller, id, status).await?))
}

/// `POST /api/incidents/{id}/updates`: File a field report.
///
/// # Errors
///
/// Returns [`ServiceError`] if the message is blank, the incident does not
/// exist, or the calling guard is not assigned to it.
#[utoipa::path(
    post,
    path = "/api/incidents/{id}/updates",
    tag = "Incidents",
    summary = "Add incident update",
    description = "Appends a report authored by the caller. A `resolution` report also resolves the incident.",
    params(("id" = uuid::Uuid, Path, description = "Incident UUID")),
    request_body = NewIncidentUpdate,
    responses(
        (status = 201, description = "Report filed", body = IncidentUpdate),
        (status = 400, description = "Invalid report", body = ErrorResponse),
        (status = 403, description = "Not assigned to caller", body = ErrorResponse),
        (status = 404, description = "Incident not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn add_incident_update(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(input): Json<NewIncidentUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    let id: IncidentId = id.parse()?;
    let update = state.incidents.add_update(&caller, id, input).await?;
    Ok((StatusCode::CREATED, Json(update)))
}

/// `GET /api/incidents/by-alert/{id}`: Incident opened for an alert.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] if the alert has no incident.
#[utoipa::path(
    get,
    path = "/api/incidents/by-alert/{id}",
    tag = "Incidents",
    summary = "Get incident by alert",
    params(("id" = uuid::Uuid, Path, description = "Alert UUID")),
    responses(
        (status = 200, description = "Incident", body = Incident),
        (status = 404, description = "No incident for alert", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn incident_by_alert(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Incident>, ServiceError> {
    let alert_id: AlertId = id.parse()?;
    Ok(Json(state.incidents.get_by_alert(&caller, alert_id).await?))
}

/// Incident routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/incidents", get(list_incidents))
        .route("/incidents/assigned/me", get(assigned_incidents))
        .route("/incidents/by-alert/{id}", get(incident_by_alert))
        .route("/incidents/{id}", get(get_incident).put(update_incident))
        .route("/incidents/{id}/updates", post(add_incident_update))
}
