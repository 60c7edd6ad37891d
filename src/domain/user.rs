//! Users and their roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

wire_enum! {
    /// Role carried by a verified identity.
    pub enum Role {
        /// Security control station operator; sees and manages everything.
        Operator => "scs_operator",
        /// Field guard; restricted to entities assigned to them.
        Guard => "security_guard",
    }
}

/// A user account as seen by the core. Credentials never leave the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Role granted to this user.
    pub role: Role,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact phone number.
    #[serde(default)]
    pub phone: String,
    /// Disabled accounts cannot be dispatched.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns `true` if this user may be dispatched to an incident.
    #[must_use]
    pub fn is_dispatchable_guard(&self) -> bool {
        self.role == Role::Guard && self.is_active
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_to_wire_names() {
        assert_eq!(Role::Operator.as_str(), "scs_operator");
        let Ok(role) = "security_guard".parse::<Role>() else {
            panic!("guard role should parse");
        };
        assert_eq!(role, Role::Guard);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn role_serde_matches_as_str() {
        let Ok(json) = serde_json::to_string(&Role::Guard) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"security_guard\"");
    }
}
