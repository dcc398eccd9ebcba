// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures for the REST API plus the stored domain
//! records. All API types derive `Serialize`, `Deserialize`, and `ToSchema`
//! for automatic JSON handling and OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Users**: stored user record, signup/login/profile payloads
//! - **Courses**: course record and creation payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;

// =============================================================================
// User Models
// =============================================================================

/// A registered user as persisted by the user repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub registration_date: DateTime<Utc>,
    /// Argon2 PHC string. Empty for seeded users that cannot log in.
    pub hashed_password: String,
    pub roles: Vec<Role>,
}

/// Profile fields a user may change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
}

/// Request to register a new account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[schema(example = "doe.j@example.com")]
    pub email: String,
    /// 8 to 20 characters.
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub display_name: String,
}

/// Email and password credentials.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "doe.j@example.com")]
    pub email: String,
    pub password: String,
}

/// Response for POST /api/v1/auth/login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LoginResponse {
    pub user_id: String,
    /// Bearer token for the `Authorization` header.
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// Response for GET /api/v1/user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserInfoResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub registration_date: DateTime<Utc>,
    pub roles: Vec<Role>,
}

impl From<User> for UserInfoResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            display_name: user.display_name,
            registration_date: user.registration_date,
            roles: user.roles,
        }
    }
}

/// Request body for PUT /api/v1/user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserInfoRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub display_name: String,
}

impl From<UpdateUserInfoRequest> for UserUpdate {
    fn from(request: UpdateUserInfoRequest) -> Self {
        Self {
            first_name: request.first_name,
            last_name: request.last_name,
            display_name: request.display_name,
        }
    }
}

// =============================================================================
// Course Models
// =============================================================================

/// A course.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Course {
    /// Unique identifier (UUID).
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for POST /api/v1/courses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: "1582550893222432768".to_string(),
            email: "doe.j@example.com".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            display_name: "JonnyD".to_string(),
            registration_date: DateTime::from_timestamp(1_500_658_348, 0).unwrap(),
            hashed_password: "$argon2id$secret".to_string(),
            roles: vec![Role::Student],
        }
    }

    #[test]
    fn user_info_omits_password_hash() {
        let info: UserInfoResponse = sample_user().into();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["id"], "1582550893222432768");
        assert_eq!(json["roles"], serde_json::json!(["student"]));
        assert_eq!(json["registration_date"], "2017-07-21T17:32:28Z");
        assert!(json.get("hashed_password").is_none());
    }

    #[test]
    fn display_name_is_optional_on_input() {
        let request: UpdateUserInfoRequest =
            serde_json::from_str(r#"{"first_name":"Jane","last_name":"Doe"}"#).unwrap();
        let update: UserUpdate = request.into();
        assert_eq!(update.display_name, "");
        assert_eq!(update.first_name, "Jane");
    }

    #[test]
    fn login_response_field_names() {
        let response = LoginResponse {
            user_id: "1".to_string(),
            access_token: "a.b.c".to_string(),
            expires_in: 3600,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"user_id":"1","access_token":"a.b.c","expires_in":3600}"#);
    }
}
