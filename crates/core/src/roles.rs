//! Well-known role names and the privilege ordering between them.
//!
//! These must match the `ck_users_role` check constraint in
//! `20260301000001_create_users_and_sessions.sql`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SUPERADMIN: &str = "superadmin";

/// A user's role. Ordered by privilege: `User < Admin < SuperAdmin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    #[serde(rename = "superadmin")]
    SuperAdmin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => ROLE_USER,
            Role::Admin => ROLE_ADMIN,
            Role::SuperAdmin => ROLE_SUPERADMIN,
        }
    }

    /// Admin-gated operations accept both `admin` and `superadmin`.
    pub fn is_admin(self) -> bool {
        self >= Role::Admin
    }

    pub fn is_superadmin(self) -> bool {
        self == Role::SuperAdmin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_USER => Ok(Role::User),
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_SUPERADMIN => Ok(Role::SuperAdmin),
            other => Err(CoreError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privilege_ordering() {
        assert!(!Role::User.is_admin());
        assert!(Role::Admin.is_admin());
        assert!(Role::SuperAdmin.is_admin());
        assert!(!Role::Admin.is_superadmin());
        assert!(Role::SuperAdmin.is_superadmin());
    }

    #[test]
    fn parse_round_trips_through_as_str() {
        for role in [Role::User, Role::Admin, Role::SuperAdmin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_a_validation_error() {
        let err = "owner".parse::<Role>().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"superadmin\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}
