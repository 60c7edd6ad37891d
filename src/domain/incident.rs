//! Incidents: dispatched investigations derived from assigned alerts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Alert, AlertId, IncidentId, UpdateId, User, UserId};
use crate::error::ServiceError;

wire_enum! {
    /// Incident status, in lifecycle order.
    pub enum IncidentStatus {
        /// Created at assignment; guards en route.
        Open => "open",
        /// Guards on site.
        InProgress => "in_progress",
        /// Investigation concluded.
        Resolved => "resolved",
        /// Archived.
        Closed => "closed",
    }
}

wire_enum! {
    /// Kind of field report a guard files against an incident.
    pub enum UpdateType {
        /// Guard reached the location.
        Arrival => "arrival",
        /// Progress report.
        Investigation => "investigation",
        /// Closing report.
        Resolution => "resolution",
    }
}

impl UpdateType {
    /// Status an incident is forced into when an update of this type is
    /// appended to it.
    ///
    /// A `resolution` update always resolves the incident, whatever its
    /// prior status and whether or not a separate status call follows.
    #[must_use]
    pub const fn forced_incident_status(self) -> Option<IncidentStatus> {
        match self {
            Self::Resolution => Some(IncidentStatus::Resolved),
            Self::Arrival | Self::Investigation => None,
        }
    }
}

/// An immutable field report attached to an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IncidentUpdate {
    /// Update identifier.
    pub id: UpdateId,
    /// Owning incident.
    pub incident_id: IncidentId,
    /// Authoring user.
    pub guard_id: UserId,
    /// Report kind.
    #[serde(rename = "type")]
    pub update_type: UpdateType,
    /// Free-text report.
    pub message: String,
    /// Attached media references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_urls: Vec<String>,
    /// Where the report was filed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for filing a field report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct NewIncidentUpdate {
    /// Report kind.
    #[serde(rename = "type")]
    pub update_type: UpdateType,
    /// Free-text report.
    pub message: String,
    /// Attached media references.
    #[serde(default)]
    pub media_urls: Vec<String>,
    /// Where the report was filed from.
    #[serde(default)]
    pub location: Option<String>,
}

impl NewIncidentUpdate {
    /// Stamps the report with its incident, author and creation time.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidInput`] if the message is blank.
    pub fn into_update(
        self,
        incident_id: IncidentId,
        author: UserId,
        now: DateTime<Utc>,
    ) -> Result<IncidentUpdate, ServiceError> {
        if self.message.trim().is_empty() {
            return Err(ServiceError::InvalidInput("message is required".to_string()));
        }
        Ok(IncidentUpdate {
            id: UpdateId::new(),
            incident_id,
            guard_id: author,
            update_type: self.update_type,
            message: self.message,
            media_urls: self.media_urls,
            location: self.location.filter(|l| !l.trim().is_empty()),
            created_at: now,
        })
    }
}

/// An investigation record with its guard roster and update log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Incident {
    /// Incident identifier.
    pub id: IncidentId,
    /// Originating alert (unique).
    pub alert_id: AlertId,
    /// Lifecycle status.
    pub status: IncidentStatus,
    /// Copied from the alert at creation.
    pub location: String,
    /// Copied from the alert at creation.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Guards dispatched to this incident.
    #[serde(default)]
    pub assigned_guards: Vec<User>,
    /// Field reports, oldest first.
    #[serde(default)]
    pub updates: Vec<IncidentUpdate>,
}

impl Incident {
    /// Opens a new incident for `alert`, copying its location and
    /// description.
    #[must_use]
    pub fn open_for(alert: &Alert, now: DateTime<Utc>) -> Self {
        Self {
            id: IncidentId::new(),
            alert_id: alert.id,
            status: IncidentStatus::Open,
            location: alert.location.clone(),
            description: alert.description.clone(),
            created_at: now,
            updated_at: now,
            assigned_guards: Vec::new(),
            updates: Vec::new(),
        }
    }

    /// Returns `true` if `guard` is on this incident's roster.
    #[must_use]
    pub fn has_guard(&self, guard: UserId) -> bool {
        self.assigned_guards.iter().any(|g| g.id == guard)
    }
}
