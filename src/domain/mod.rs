//! Domain layer: entities, hub events, and the notification hub.
//!
//! This module contains the server-side domain model (alerts, incidents,
//! users, premises), the typed events published to connected clients,
//! and the connection registry plus dispatcher that fan those events out.

/// Declares a closed string-valued enum with its wire spelling.
///
/// Generates `as_str`, `Display`, `FromStr` (failing with
/// [`crate::error::ServiceError::InvalidInput`]), `ALL`, and `ordinal`
/// (declaration order).
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize, utoipa::ToSchema,
        )]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant, )+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the wire spelling of this variant.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            /// Position of this variant in declaration order.
            #[must_use]
            pub fn ordinal(self) -> usize {
                Self::ALL.iter().position(|v| *v == self).unwrap_or(0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::ServiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(crate::error::ServiceError::InvalidInput(format!(
                        "unknown {} value: {other}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

pub mod alert;
pub mod connection_registry;
pub mod event_dispatcher;
pub mod hub_event;
pub mod ids;
pub mod incident;
pub mod premise;
pub mod scope;
pub mod selector;
pub mod user;

pub use alert::{Alert, AlertFilter, AlertSeverity, AlertStatus, AlertType, NewAlert};
pub use connection_registry::{Connection, ConnectionRegistry, DeliveryReport, Frame, OutboundQueue};
pub use event_dispatcher::EventDispatcher;
pub use hub_event::{HubEvent, RelayedMessage};
pub use ids::{AlertId, CameraId, ConnectionId, IncidentId, PremiseId, UpdateId, UserId};
pub use incident::{Incident, IncidentStatus, IncidentUpdate, NewIncidentUpdate, UpdateType};
pub use premise::{Camera, CameraStatus, Premise, PremiseType};
pub use scope::Scope;
pub use selector::Selector;
pub use user::{Role, User};
