//! Alert handlers: create, list, get, acknowledge, assign, status overwrite.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{AlertQuery, AssignAlertRequest, StatusUpdateRequest};
use crate::app_state::AppState;
use crate::auth::Caller;
use crate::domain::{Alert, AlertFilter, AlertId, NewAlert};
use crate::error::{ErrorResponse, ServiceError};
use crate::service::AssignmentOutcome;

/// `POST /api/alerts`: Raise a new alert.
///
/// # Errors
///
/// Returns [`ServiceError`] if the caller is not an operator, a required
/// field is blank, or the premise or camera does not exist.
#[utoipa::path(
    post,
    path = "/api/alerts",
    tag = "Alerts",
    summary = "Raise an alert",
    description = "Creates an alert in status `pending` and notifies connected operators.",
    request_body = NewAlert,
    responses(
        (status = 201, description = "Alert created", body = Alert),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Operators only", body = ErrorResponse),
        (status = 404, description = "Premise or camera not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_alert(
    State(state): State<AppState>,
    caller: Caller,
    Json(input): Json<NewAlert>,
) -> Result<impl IntoResponse, ServiceError> {
    let alert = state.alerts.create(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

/// `GET /api/alerts`: List visible alerts, newest first.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidInput`] on a malformed filter value.
#[utoipa::path(
    get,
    path = "/api/alerts",
    tag = "Alerts",
    summary = "List alerts",
    description = "Operators see every alert; guards only alerts they are assigned to.",
    params(AlertQuery),
    responses(
        (status = 200, description = "Alert list", body = Vec<Alert>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<AlertQuery>,
) -> Result<Json<Vec<Alert>>, ServiceError> {
    let filter = AlertFilter::try_from(query)?;
    Ok(Json(state.alerts.list(&caller, &filter).await?))
}

/// `GET /api/alerts/{id}`: Get one alert.
///
/// # Errors
///
/// Returns [`ServiceError`] if the alert does not exist or is not visible
/// to the caller.
#[utoipa::path(
    get,
    path = "/api/alerts/{id}",
    tag = "Alerts",
    summary = "Get alert",
    params(("id" = uuid::Uuid, Path, description = "Alert UUID")),
    responses(
        (status = 200, description = "Alert", body = Alert),
        (status = 403, description = "Not assigned to caller", body = ErrorResponse),
        (status = 404, description = "Alert not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_alert(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Alert>, ServiceError> {
    let id: AlertId = id.parse()?;
    Ok(Json(state.alerts.get(&caller, id).await?))
}

/// `PUT /api/alerts/{id}`: Overwrite an alert's status.
///
/// # Errors
///
/// Returns [`ServiceError`] if the caller is not an operator, the status
/// is unknown, or the alert does not exist.
#[utoipa::path(
    put,
    path = "/api/alerts/{id}",
    tag = "Alerts",
    summary = "Overwrite alert status",
    description = "Operator override; sets any status and notifies every connection.",
    params(("id" = uuid::Uuid, Path, description = "Alert UUID")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Updated alert", body = Alert),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 403, description = "Operators only", body = ErrorResponse),
        (status = 404, description = "Alert not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_alert(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Alert>, ServiceError> {
    let id: AlertId = id.parse()?;
    let status = req.parse()?;
    Ok(Json(state.alerts.update_status(&caller, id, status).await?))
}

/// `POST /api/alerts/{id}/acknowledge`: Acknowledge a pending alert.
///
/// # Errors
///
/// Returns [`ServiceError`] if the caller is not an operator, the alert
/// does not exist, or it is no longer pending.
#[utoipa::path(
    post,
    path = "/api/alerts/{id}/acknowledge",
    tag = "Alerts",
    summary = "Acknowledge alert",
    params(("id" = uuid::Uuid, Path, description = "Alert UUID")),
    responses(
        (status = 200, description = "Acknowledged alert", body = Alert),
        (status = 400, description = "Alert is not pending", body = ErrorResponse),
        (status = 403, description = "Operators only", body = ErrorResponse),
        (status = 404, description = "Alert not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Alert>, ServiceError> {
    let id: AlertId = id.parse()?;
    Ok(Json(state.alerts.acknowledge(&caller, id).await?))
}

/// `POST /api/alerts/{id}/assign`: Dispatch guards to an alert.
///
/// # Errors
///
/// Returns [`ServiceError`] if the guard list is empty or malformed, the
/// caller is not an operator, the alert or every guard is unknown, or an
/// incident already exists.
#[utoipa::path(
    post,
    path = "/api/alerts/{id}/assign",
    tag = "Alerts",
    summary = "Assign alert to guards",
    description = "Opens the alert's incident and links every valid guard in one transaction, then notifies each guard and the operators.",
    params(("id" = uuid::Uuid, Path, description = "Alert UUID")),
    request_body = AssignAlertRequest,
    responses(
        (status = 200, description = "Alert assigned", body = AssignmentOutcome),
        (status = 400, description = "Empty or malformed guard list", body = ErrorResponse),
        (status = 403, description = "Operators only", body = ErrorResponse),
        (status = 404, description = "Alert or guards not found", body = ErrorResponse),
        (status = 409, description = "Alert already assigned", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn assign_alert(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(req): Json<AssignAlertRequest>,
) -> Result<Json<AssignmentOutcome>, ServiceError> {
    let id: AlertId = id.parse()?;
    let guard_ids = req.guard_ids()?;
    Ok(Json(state.alerts.assign(&caller, id, &guard_ids).await?))
}

/// Alert routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/alerts", post(create_alert).get(list_alerts))
        .route("/alerts/{id}", get(get_alert).put(update_alert))
        .route("/alerts/{id}/acknowledge", post(acknowledge_alert))
        .route("/alerts/{id}/assign", post(assign_alert))
}
