//! Delivery targets for the notification hub.

use super::{Role, UserId};

/// Which live connections a published frame is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Every registered connection.
    All,
    /// Connections whose identity carries this role.
    ByRole(Role),
    /// Connections opened by this identity (any number of tabs/devices).
    ByIdentity(UserId),
}

impl Selector {
    /// Returns `true` if a connection tagged with `role` and `user_id`
    /// is targeted by this selector.
    #[must_use]
    pub fn matches(&self, role: Role, user_id: UserId) -> bool {
        match self {
            Self::All => true,
            Self::ByRole(target) => *target == role,
            Self::ByIdentity(target) => *target == user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_matches_everything() {
        assert!(Selector::All.matches(Role::Operator, UserId::new()));
        assert!(Selector::All.matches(Role::Guard, UserId::new()));
    }

    #[test]
    fn by_role_matches_only_that_role() {
        let sel = Selector::ByRole(Role::Operator);
        assert!(sel.matches(Role::Operator, UserId::new()));
        assert!(!sel.matches(Role::Guard, UserId::new()));
    }

    #[test]
    fn by_identity_ignores_role() {
        let id = UserId::new();
        let sel = Selector::ByIdentity(id);
        assert!(sel.matches(Role::Guard, id));
        assert!(sel.matches(Role::Operator, id));
        assert!(!sel.matches(Role::Guard, UserId::new()));
    }
}
