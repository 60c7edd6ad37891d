//! Incident endpoint DTOs.

use serde::Deserialize;
use utoipa::IntoParams;

use super::common_dto::parse_optional;
use crate::domain::IncidentStatus;
use crate::error::ServiceError;

/// Query parameters for `GET /api/incidents`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IncidentQuery {
    /// Only incidents in this status.
    pub status: Option<String>,
}

impl IncidentQuery {
    /// Parses the status filter.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidInput`] on an unknown status.
    pub fn status(&self) -> Result<Option<IncidentStatus>, ServiceError> {
        parse_optional(self.status.as_deref())
    }
}
