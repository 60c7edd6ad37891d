//! Alert endpoint DTOs.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::common_dto::parse_optional;
use crate::domain::{AlertFilter, UserId};
use crate::error::ServiceError;

/// Query parameters for `GET /api/alerts`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlertQuery {
    /// Only alerts in this status.
    pub status: Option<String>,
    /// Only alerts of this severity.
    pub severity: Option<String>,
    /// Only alerts of this type.
    #[serde(rename = "type")]
    pub alert_type: Option<String>,
    /// Only alerts raised at this premise.
    pub premise_id: Option<String>,
}

impl TryFrom<AlertQuery> for AlertFilter {
    type Error = ServiceError;

    fn try_from(query: AlertQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            status: parse_optional(query.status.as_deref())?,
            severity: parse_optional(query.severity.as_deref())?,
            alert_type: parse_optional(query.alert_type.as_deref())?,
            premise_id: parse_optional(query.premise_id.as_deref())?,
        })
    }
}

/// Request body for `POST /api/alerts/{id}/assign`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignAlertRequest {
    /// Guards to dispatch. Ids that do not name an active guard are
    /// skipped.
    #[serde(default)]
    pub guard_id: Vec<String>,
}

impl AssignAlertRequest {
    /// Parses every guard id.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidInput`] on the first malformed id.
    pub fn guard_ids(&self) -> Result<Vec<UserId>, ServiceError> {
        self.guard_id.iter().map(|raw| raw.trim().parse()).collect()
    }
}
