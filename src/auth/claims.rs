// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token claims and the authenticated principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Identity carried by a bearer token.
///
/// This is the primary type used throughout the application to represent
/// the user making a request. It is inserted into the request extensions by
/// the authentication middleware.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct UserPrincipal {
    /// Canonical user ID
    pub user_id: String,

    /// Granted roles
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl UserPrincipal {
    pub fn new(user_id: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            user_id: user_id.into(),
            roles,
        }
    }

    /// Check if the user holds the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| *r == role)
    }

    /// Check if this user is an admin.
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// Claims as they appear in the signed token payload.
///
/// The principal is flattened into the top level (`user_id`, `roles`) rather
/// than mapped onto `sub`. Registered claims are optional on the way in so
/// that a missing claim can be reported as a validation failure instead of a
/// decode error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BearerTokenClaims {
    #[serde(flatten)]
    pub principal: UserPrincipal,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iss: String,

    /// Always emitted as an array; a bare string is accepted on input.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_audience"
    )]
    pub aud: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AudienceRepr {
    One(String),
    Many(Vec<String>),
}

fn deserialize_audience<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<AudienceRepr>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(AudienceRepr::One(aud)) => vec![aud],
        Some(AudienceRepr::Many(aud)) => aud,
    })
}

/// Validated contents of a bearer token.
///
/// Only produced by a successful parse, so every timestamp is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtPayload {
    principal: UserPrincipal,
    issuer: String,
    audience: Vec<String>,
    issued_at: DateTime<Utc>,
    not_before: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl JwtPayload {
    pub(crate) fn new(
        principal: UserPrincipal,
        issuer: String,
        audience: Vec<String>,
        issued_at: DateTime<Utc>,
        not_before: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            principal,
            issuer,
            audience,
            issued_at,
            not_before,
            expires_at,
        }
    }

    pub fn principal(&self) -> &UserPrincipal {
        &self.principal
    }

    pub fn into_principal(self) -> UserPrincipal {
        self.principal
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}
