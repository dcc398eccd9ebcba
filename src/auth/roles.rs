// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles carried in bearer tokens.
///
/// ## Roles
///
/// - `Student` - regular user, granted at signup
/// - `Admin` - full access, including course management
///
/// `Undefined` is the uninitialized sentinel. It never serializes and never
/// parses, so a token cannot carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Uninitialized role value (invalid)
    #[default]
    #[serde(skip)]
    Undefined,
    /// Regular user
    Student,
    /// Administrator
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("undefined role: {0:?}")]
pub struct RoleParseError(pub String);

impl Role {
    /// Lowercase wire name. `Undefined` has none.
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            Role::Student => Some("student"),
            Role::Admin => Some("admin"),
            Role::Undefined => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Role::Undefined)
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    /// Parse a role name. Case-sensitive, matching the wire format.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str().unwrap_or("undefined_role"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Container {
        my_role: Role,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Many {
        my_roles: Vec<Role>,
    }

    #[test]
    fn from_str_parses_known_roles() {
        assert_eq!("student".parse::<Role>(), Ok(Role::Student));
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
    }

    #[test]
    fn from_str_rejects_unknown_roles() {
        assert!("".parse::<Role>().is_err());
        assert!("SomeOtherRole".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
        assert!("undefined_role".parse::<Role>().is_err());
    }

    #[test]
    fn default_role_is_undefined() {
        assert_eq!(Role::default(), Role::Undefined);
        assert!(!Role::default().is_valid());
        assert!(Role::Student.is_valid());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Container { my_role: Role::Admin }).unwrap();
        assert_eq!(json, r#"{"my_role":"admin"}"#);

        let json = serde_json::to_string(&Many {
            my_roles: vec![Role::Student, Role::Admin],
        })
        .unwrap();
        assert_eq!(json, r#"{"my_roles":["student","admin"]}"#);
    }

    #[test]
    fn undefined_does_not_serialize() {
        assert!(serde_json::to_string(&Role::Undefined).is_err());
        assert!(serde_json::to_string(&vec![Role::Student, Role::Undefined]).is_err());
    }

    #[test]
    fn deserializes_known_roles() {
        let c: Container = serde_json::from_str(r#"{"my_role":"student"}"#).unwrap();
        assert_eq!(c.my_role, Role::Student);

        let m: Many = serde_json::from_str(r#"{"my_roles":["student","admin"]}"#).unwrap();
        assert_eq!(m.my_roles, vec![Role::Student, Role::Admin]);

        let empty: Many = serde_json::from_str(r#"{"my_roles":[]}"#).unwrap();
        assert!(empty.my_roles.is_empty());
    }

    #[test]
    fn unknown_role_fails_to_deserialize() {
        assert!(serde_json::from_str::<Container>(r#"{"my_role":"SomeOtherRole"}"#).is_err());
        assert!(serde_json::from_str::<Container>(r#"{"my_role":"undefined"}"#).is_err());
        assert!(serde_json::from_str::<Many>(r#"{"my_roles":["student","root"]}"#).is_err());
    }

    #[test]
    fn display_uses_wire_name() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::Student.to_string(), "student");
        assert_eq!(Role::Undefined.to_string(), "undefined_role");
    }
}
