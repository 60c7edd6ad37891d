//! Typed events pushed to connected clients.
//!
//! Every lifecycle transition emits a [`HubEvent`] through the
//! [`super::EventDispatcher`]. The enum is closed: producers cannot emit a
//! payload the catalogue does not describe. On the wire each variant is
//! `{"type": <event-name>, "payload": <variant body>}`.

use serde::Serialize;

use super::{Alert, AlertId, AlertSeverity, Incident, IncidentId, IncidentUpdate, User, UserId};

/// Event catalogue of the notification hub.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum HubEvent {
    /// A new alert was raised. Sent to operators.
    AlertCreated(Alert),

    /// An operator acknowledged an alert. Sent to everyone.
    AlertAcknowledged(Alert),

    /// Guards were dispatched for an alert. Sent to operators.
    AlertAssigned {
        /// Assigned alert.
        alert_id: AlertId,
        /// Incident opened by the assignment.
        incident_id: IncidentId,
        /// Every guard on the new incident's roster.
        guards: Vec<User>,
    },

    /// An operator overwrote an alert's status. Sent to everyone.
    AlertUpdated(Alert),

    /// A guard was dispatched. Sent to that guard only.
    GuardDispatched {
        /// Originating alert.
        alert_id: AlertId,
        /// Incident the guard now belongs to.
        incident_id: IncidentId,
        /// Alert headline.
        title: String,
        /// Alert description.
        description: String,
        /// Where to go.
        location: String,
        /// Alert severity.
        severity: AlertSeverity,
    },

    /// An incident's status changed. Sent to everyone.
    IncidentUpdated(Incident),

    /// A field report was filed. Sent to operators.
    IncidentUpdateReceived {
        /// Incident the report belongs to.
        incident_id: IncidentId,
        /// The stored report.
        update: IncidentUpdate,
        /// Author of the report.
        guard_id: UserId,
    },

    /// Reply to a client `ping`.
    Pong,
}

impl HubEvent {
    /// Returns the wire event name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::AlertCreated(_) => "alert_created",
            Self::AlertAcknowledged(_) => "alert_acknowledged",
            Self::AlertAssigned { .. } => "alert_assigned",
            Self::AlertUpdated(_) => "alert_updated",
            Self::GuardDispatched { .. } => "guard_dispatched",
            Self::IncidentUpdated(_) => "incident_updated",
            Self::IncidentUpdateReceived { .. } => "incident_update_received",
            Self::Pong => "pong",
        }
    }
}

/// A client-originated message re-broadcast by the hub without passing
/// through the lifecycle services.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelayedMessage {
    /// Wire event name.
    #[serde(rename = "type")]
    pub event_type: &'static str,
    /// Payload exactly as the client sent it.
    pub payload: serde_json::Value,
    /// Identity of the sending connection.
    pub user_id: UserId,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{AlertType, NewAlert, PremiseId};
    use chrono::Utc;

    fn alert() -> Alert {
        NewAlert {
            alert_type: AlertType::SystemFailure,
            severity: AlertSeverity::Critical,
            title: "NVR offline".to_string(),
            description: "Recorder stopped responding".to_string(),
            location: "Server room".to_string(),
            premise_id: PremiseId::new(),
            camera_id: None,
        }
        .into_alert(Utc::now())
    }

    #[test]
    fn event_type_matches_serialized_tag() {
        let event = HubEvent::AlertCreated(alert());
        let Ok(json) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(json["type"], event.event_type());
        assert_eq!(json["payload"]["status"], "pending");
    }

    #[test]
    fn dispatch_payload_has_flat_fields() {
        let a = alert();
        let event = HubEvent::GuardDispatched {
            alert_id: a.id,
            incident_id: IncidentId::new(),
            title: a.title.clone(),
            description: a.description.clone(),
            location: a.location.clone(),
            severity: a.severity,
        };
        let Ok(json) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(json["type"], "guard_dispatched");
        assert_eq!(json["payload"]["severity"], "critical");
        assert_eq!(json["payload"]["location"], "Server room");
    }

    #[test]
    fn pong_has_no_payload() {
        let Ok(json) = serde_json::to_string(&HubEvent::Pong) else {
            panic!("serialization failed");
        };
        assert_eq!(json, r#"{"type":"pong"}"#);
    }

    #[test]
    fn relayed_message_carries_sender() {
        let sender = UserId::new();
        let msg = RelayedMessage {
            event_type: "alert_acknowledged",
            payload: serde_json::json!({"alert_id": "abc"}),
            user_id: sender,
        };
        let Ok(json) = serde_json::to_value(&msg) else {
            panic!("serialization failed");
        };
        assert_eq!(json["type"], "alert_acknowledged");
        assert_eq!(json["user_id"], sender.to_string());
        assert_eq!(json["payload"]["alert_id"], "abc");
    }
}
