//! The resolved identity attached to each request.
//!
//! Authentication is an external collaborator: by the time a request
//! reaches the order engine, a gateway has already verified the caller
//! and the API layer has built a [`Principal`] from it. Handlers and
//! services ask the principal capability questions; nothing below the
//! middleware cares how the role was represented upstream.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Permission granting full order management, independent of role.
pub const PERM_MANAGE_ORDERS: &str = "orders:manage";

/// Permission granting catalog write access, independent of role.
pub const PERM_MANAGE_CATALOG: &str = "catalog:manage";

/// A caller's role as resolved by the auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// A verified caller identity with its capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The caller's user ID.
    pub id: UserId,
    /// The caller's role.
    pub role: Role,
    /// Extra fine-grained permissions granted upstream.
    pub permissions: HashSet<String>,
}

impl Principal {
    /// A plain customer with no extra permissions.
    #[must_use]
    pub fn customer(id: UserId) -> Self {
        Self {
            id,
            role: Role::Customer,
            permissions: HashSet::new(),
        }
    }

    /// An administrator.
    #[must_use]
    pub fn admin(id: UserId) -> Self {
        Self {
            id,
            role: Role::Admin,
            permissions: HashSet::new(),
        }
    }

    /// Whether the caller holds elevated privilege.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether the caller may manage any order (list all, change status).
    #[must_use]
    pub fn can_manage_orders(&self) -> bool {
        self.is_admin() || self.permissions.contains(PERM_MANAGE_ORDERS)
    }

    /// Whether the caller may write to the catalog.
    #[must_use]
    pub fn can_manage_catalog(&self) -> bool {
        self.is_admin() || self.permissions.contains(PERM_MANAGE_CATALOG)
    }

    /// Whether the caller may act on a resource owned by `owner`.
    ///
    /// Owners may always act on their own resources; order managers may
    /// act on anyone's.
    #[must_use]
    pub fn can_act_on(&self, owner: UserId) -> bool {
        self.id == owner || self.can_manage_orders()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_only_acts_on_own_resources() {
        let principal = Principal::customer(UserId::new(1));
        assert!(principal.can_act_on(UserId::new(1)));
        assert!(!principal.can_act_on(UserId::new(2)));
        assert!(!principal.can_manage_orders());
    }

    #[test]
    fn test_admin_acts_on_any_resource() {
        let principal = Principal::admin(UserId::new(9));
        assert!(principal.can_act_on(UserId::new(1)));
        assert!(principal.can_manage_orders());
        assert!(principal.can_manage_catalog());
    }

    #[test]
    fn test_permission_grants_without_admin_role() {
        let mut principal = Principal::customer(UserId::new(3));
        principal.permissions.insert(PERM_MANAGE_ORDERS.to_owned());
        assert!(!principal.is_admin());
        assert!(principal.can_manage_orders());
        assert!(principal.can_act_on(UserId::new(8)));
        assert!(!principal.can_manage_catalog());
    }

    #[test]
    fn test_role_text_roundtrip() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("customer".parse::<Role>(), Ok(Role::Customer));
        assert!("super_admin".parse::<Role>().is_err());
    }
}
