//! Alerts: raised security events awaiting triage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AlertId, CameraId, PremiseId, UserId};
use crate::error::ServiceError;

wire_enum! {
    /// What kind of event raised the alert.
    pub enum AlertType {
        /// Someone entered a restricted area.
        UnauthorizedAccess => "unauthorized_access",
        /// Behaviour flagged as suspicious.
        SuspiciousActivity => "suspicious_activity",
        /// Physical damage to monitored equipment.
        EquipmentDamage => "equipment_damage",
        /// Monitoring system malfunction.
        SystemFailure => "system_failure",
    }
}

wire_enum! {
    /// Triage severity.
    pub enum AlertSeverity {
        /// Informational.
        Low => "low",
        /// Needs attention.
        Medium => "medium",
        /// Needs prompt response.
        High => "high",
        /// Needs immediate response.
        Critical => "critical",
    }
}

wire_enum! {
    /// Alert status, in lifecycle order.
    pub enum AlertStatus {
        /// Raised, not yet seen by an operator.
        Pending => "pending",
        /// Seen by an operator.
        Acknowledged => "acknowledged",
        /// Guards dispatched; an incident exists.
        Assigned => "assigned",
        /// Investigation concluded.
        Resolved => "resolved",
        /// Archived.
        Closed => "closed",
    }
}

impl AlertStatus {
    /// Returns `true` if `next` lies strictly later in the lifecycle.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        next.ordinal() > self.ordinal()
    }

    /// Checks that alert `id`, currently in this status, may move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidInput`] unless `next` lies later in
    /// the lifecycle.
    pub fn ensure_advance(self, id: AlertId, next: Self) -> Result<(), ServiceError> {
        if self.can_advance_to(next) {
            Ok(())
        } else {
            Err(ServiceError::InvalidInput(format!(
                "alert {id} is {self} and cannot move to {next}"
            )))
        }
    }
}

/// A raised security event. Always belongs to exactly one premise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    /// Alert identifier.
    pub id: AlertId,
    /// Event kind.
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// Triage severity.
    pub severity: AlertSeverity,
    /// Short headline.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Where the event happened.
    pub location: String,
    /// Lifecycle status.
    pub status: AlertStatus,
    /// Camera that captured the event, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<CameraId>,
    /// Owning premise.
    pub premise_id: PremiseId,
    /// Lead guard set when the alert was assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_guard_id: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for raising a new alert.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct NewAlert {
    /// Event kind.
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// Triage severity.
    pub severity: AlertSeverity,
    /// Short headline.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Where the event happened.
    pub location: String,
    /// Owning premise.
    pub premise_id: PremiseId,
    /// Camera that captured the event, if any.
    #[serde(default)]
    pub camera_id: Option<CameraId>,
}

impl NewAlert {
    /// Rejects blank required text fields.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidInput`] naming the first blank field.
    pub fn validate(&self) -> Result<(), ServiceError> {
        for (field, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("location", &self.location),
        ] {
            if value.trim().is_empty() {
                return Err(ServiceError::InvalidInput(format!("{field} is required")));
            }
        }
        Ok(())
    }

    /// Materialises the alert with status [`AlertStatus::Pending`].
    #[must_use]
    pub fn into_alert(self, now: DateTime<Utc>) -> Alert {
        Alert {
            id: AlertId::new(),
            alert_type: self.alert_type,
            severity: self.severity,
            title: self.title,
            description: self.description,
            location: self.location,
            status: AlertStatus::Pending,
            camera_id: self.camera_id,
            premise_id: self.premise_id,
            assigned_guard_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Pure query predicate for alert listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFilter {
    /// Match this status only.
    pub status: Option<AlertStatus>,
    /// Match this severity only.
    pub severity: Option<AlertSeverity>,
    /// Match this type only.
    pub alert_type: Option<AlertType>,
    /// Match this premise only.
    pub premise_id: Option<PremiseId>,
}

impl AlertFilter {
    /// Returns `true` if the alert satisfies every set predicate.
    #[must_use]
    pub fn matches(&self, alert: &Alert) -> bool {
        self.status.is_none_or(|s| alert.status == s)
            && self.severity.is_none_or(|s| alert.severity == s)
            && self.alert_type.is_none_or(|t| alert.alert_type == t)
            && self.premise_id.is_none_or(|p| alert.premise_id == p)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn sample() -> NewAlert {
        NewAlert {
            alert_type: AlertType::UnauthorizedAccess,
            severity: AlertSeverity::High,
            title: "Door forced".to_string(),
            description: "Rear door sensor tripped".to_string(),
            location: "Loading bay".to_string(),
            premise_id: PremiseId::new(),
            camera_id: None,
        }
    }

    #[test]
    fn status_only_advances_forward() {
        assert!(AlertStatus::Pending.can_advance_to(AlertStatus::Acknowledged));
        assert!(AlertStatus::Acknowledged.can_advance_to(AlertStatus::Closed));
        assert!(!AlertStatus::Assigned.can_advance_to(AlertStatus::Acknowledged));
        assert!(!AlertStatus::Resolved.can_advance_to(AlertStatus::Resolved));
    }

    #[test]
    fn new_alert_starts_pending() {
        let alert = sample().into_alert(Utc::now());
        assert_eq!(alert.status, AlertStatus::Pending);
        assert!(alert.assigned_guard_id.is_none());
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut input = sample();
        input.title = "   ".to_string();
        let Err(ServiceError::InvalidInput(msg)) = input.validate() else {
            panic!("expected InvalidInput");
        };
        assert!(msg.contains("title"));
    }

    #[test]
    fn filter_combines_predicates() {
        let alert = sample().into_alert(Utc::now());
        let mut filter = AlertFilter {
            severity: Some(AlertSeverity::High),
            ..AlertFilter::default()
        };
        assert!(filter.matches(&alert));
        filter.status = Some(AlertStatus::Closed);
        assert!(!filter.matches(&alert));
    }

    #[test]
    fn type_field_serializes_as_type() {
        let alert = sample().into_alert(Utc::now());
        let Ok(json) = serde_json::to_value(&alert) else {
            panic!("serialization failed");
        };
        assert_eq!(json["type"], "unauthorized_access");
        assert_eq!(json["status"], "pending");
    }
}
