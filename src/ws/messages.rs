//! Inbound WebSocket messages and their routing.
//!
//! Clients send `{"type": ..., "payload": ...}`. `ping` is answered with a
//! `pong` on the same connection; `incident_update` and
//! `alert_acknowledge` are re-broadcast verbatim without touching the
//! lifecycle services. Anything else is ignored.

use serde::Deserialize;

use crate::domain::{RelayedMessage, Role, Selector, UserId};

/// Wire envelope of a client message.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub kind: InboundKind,
    /// Type-specific payload, passed through untouched.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Discriminator for client messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundKind {
    /// Application-level keep-alive.
    Ping,
    /// Field report relayed to operators as `incident_updated`.
    IncidentUpdate,
    /// Acknowledgement relayed to everyone as `alert_acknowledged`.
    AlertAcknowledge,
    /// Any type this server does not handle.
    #[serde(other)]
    Unknown,
}

/// What the inbound worker should do with one text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundAction {
    /// Reply `pong` to the sender only.
    Pong,
    /// Re-broadcast to the selected connections.
    Relay {
        /// Frame to broadcast.
        message: RelayedMessage,
        /// Recipients.
        selector: Selector,
    },
    /// The frame was not valid JSON of the envelope shape.
    Malformed(String),
    /// The envelope named a type this server does not handle.
    Unknown,
}

/// Decides how to handle a text frame received from `sender`.
#[must_use]
pub fn route_inbound(text: &str, sender: UserId) -> InboundAction {
    let message = match serde_json::from_str::<InboundMessage>(text) {
        Ok(message) => message,
        Err(err) => return InboundAction::Malformed(err.to_string()),
    };
    let (event_type, selector) = match message.kind {
        InboundKind::Ping => return InboundAction::Pong,
        InboundKind::Unknown => return InboundAction::Unknown,
        InboundKind::IncidentUpdate => ("incident_updated", Selector::ByRole(Role::Operator)),
        InboundKind::AlertAcknowledge => ("alert_acknowledged", Selector::All),
    };
    InboundAction::Relay {
        message: RelayedMessage {
            event_type,
            payload: message.payload,
            user_id: sender,
        },
        selector,
    }
}
