//! Service error types with HTTP status code mapping.
//!
//! [`ServiceError`] is the single error currency of the lifecycle services
//! and the store collaborator. The transport adapter decides how a kind is
//! shown to users; the mapping below is the REST adapter's choice.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "not found: alert 6f1c...",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error taxonomy surfaced by the lifecycle services.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status               |
/// |-----------|---------------------|---------------------------|
/// | 1000–1999 | Validation          | 400 Bad Request           |
/// | 2000–2999 | State / Not Found   | 404 Not Found / 409       |
/// | 3000–3999 | Server / Store      | 500 / 503                 |
/// | 4000–4999 | Identity and Access | 401 / 403                 |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Entity or referenced foreign key is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed identifier, bad enum value, or empty required collection.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Role or assignment-scope check failed.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Write would violate the one-incident-per-alert uniqueness.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Underlying store call failed (timeout, connection loss, aborted
    /// transaction).
    #[error("store unavailable: {0}")]
    TransientStore(String),

    /// No verified identity accompanied the request.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidInput(_) => 1001,
            Self::NotFound(_) => 2001,
            Self::Conflict(_) => 2002,
            Self::Internal(_) => 3000,
            Self::TransientStore(_) => 3001,
            Self::Unauthorized(_) => 4001,
            Self::PermissionDenied(_) => 4003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::TransientStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for a [`ServiceError::NotFound`] naming an entity.
    #[must_use]
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} {id}"))
    }
}

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some(UNIQUE_VIOLATION) => Self::Conflict(db.message().to_string()),
                Some(FOREIGN_KEY_VIOLATION) => Self::NotFound(db.message().to_string()),
                _ => Self::TransientStore(err.to_string()),
            },
            _ => Self::TransientStore(err.to_string()),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
