//! Type-safe entity identifiers.
//!
//! Each identifier is a newtype wrapper around [`uuid::Uuid`] (v4) so that
//! an alert id can never be passed where an incident id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ServiceError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Creates an identifier from an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ServiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| ServiceError::InvalidInput(format!("invalid {} id: {s}", $label)))
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Identifier of an [`super::Alert`].
    AlertId,
    "alert"
);
entity_id!(
    /// Identifier of an [`super::Incident`].
    IncidentId,
    "incident"
);
entity_id!(
    /// Identifier of an [`super::IncidentUpdate`].
    UpdateId,
    "incident update"
);
entity_id!(
    /// Identifier of a [`super::User`]; also the identity a connection is
    /// tagged with.
    UserId,
    "user"
);
entity_id!(
    /// Identifier of a [`super::Premise`].
    PremiseId,
    "premise"
);
entity_id!(
    /// Identifier of a [`super::Camera`].
    CameraId,
    "camera"
);
entity_id!(
    /// Server-generated identifier of one live WebSocket connection.
    ConnectionId,
    "connection"
);

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        assert_ne!(AlertId::new(), AlertId::new());
    }

    #[test]
    fn parse_accepts_uuid_text() {
        let uuid = uuid::Uuid::new_v4();
        let Ok(id) = uuid.to_string().parse::<IncidentId>() else {
            panic!("valid uuid rejected");
        };
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn parse_rejects_garbage_as_invalid_input() {
        let err = "not-a-uuid".parse::<UserId>();
        let Err(ServiceError::InvalidInput(msg)) = err else {
            panic!("expected InvalidInput");
        };
        assert!(msg.contains("user"));
    }

    #[test]
    fn serializes_as_bare_string() {
        let id = PremiseId::new();
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn hash_works_in_hashmap() {
        use std::collections::HashMap;
        let id = ConnectionId::new();
        let mut map = HashMap::new();
        map.insert(id, "conn");
        assert_eq!(map.get(&id), Some(&"conn"));
    }
}
