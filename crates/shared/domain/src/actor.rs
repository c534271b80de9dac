//! Caller identity handed to every engine operation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{ROLE_ADMIN, ROLE_CLIENT};
use crate::error::{DomainError, DomainResult};

/// Profile roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Admin,
}

impl Role {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Client => ROLE_CLIENT,
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => Role::Admin,
            _ => Role::Client,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated caller: the profile identifier and role claim issued by
/// the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorContext {
    pub profile_id: Uuid,
    pub role: Role,
}

impl ActorContext {
    pub fn new(profile_id: Uuid, role: Role) -> Self {
        Self { profile_id, role }
    }

    pub fn client(profile_id: Uuid) -> Self {
        Self::new(profile_id, Role::Client)
    }

    pub fn admin(profile_id: Uuid) -> Self {
        Self::new(profile_id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fail unless the caller is an admin.
    pub fn require_admin(&self) -> DomainResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(DomainError::forbidden("Admin role required"))
        }
    }

    /// Fail unless the caller owns `profile_id` or is an admin.
    pub fn require_self_or_admin(&self, profile_id: Uuid) -> DomainResult<()> {
        if self.is_admin() || self.profile_id == profile_id {
            Ok(())
        } else {
            Err(DomainError::forbidden("Cannot act on another profile"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_defaults_to_client() {
        assert_eq!(Role::from("admin"), Role::Admin);
        assert_eq!(Role::from("client"), Role::Client);
        assert_eq!(Role::from("authenticated"), Role::Client);
    }

    #[test]
    fn test_self_or_admin() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(ActorContext::client(me).require_self_or_admin(me).is_ok());
        assert!(ActorContext::client(me).require_self_or_admin(other).is_err());
        assert!(ActorContext::admin(me).require_self_or_admin(other).is_ok());
    }
}
