//! Row-level visibility for read paths.

use super::{Role, UserId};

/// Which rows a caller may see.
///
/// Operators see everything; guards only rows linked to them through an
/// assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// No row-level restriction.
    All,
    /// Restricted to rows assigned to this guard.
    Guard(UserId),
}

impl Scope {
    /// Derives the scope for a verified identity.
    #[must_use]
    pub const fn for_identity(role: Role, user_id: UserId) -> Self {
        match role {
            Role::Operator => Self::All,
            Role::Guard => Self::Guard(user_id),
        }
    }

    /// The guard this scope is restricted to, if any.
    #[must_use]
    pub const fn guard(&self) -> Option<UserId> {
        match self {
            Self::All => None,
            Self::Guard(id) => Some(*id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_are_unscoped() {
        assert_eq!(Scope::for_identity(Role::Operator, UserId::new()), Scope::All);
    }

    #[test]
    fn guards_are_scoped_to_themselves() {
        let id = UserId::new();
        let scope = Scope::for_identity(Role::Guard, id);
        assert_eq!(scope.guard(), Some(id));
    }
}
