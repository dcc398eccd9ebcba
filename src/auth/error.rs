// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::roles::Role;

/// Authentication error type returned to HTTP clients.
///
/// Every token failure collapses into `Unauthorized`: the client never learns
/// which check failed. The cause is logged where the token is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing, malformed or rejected bearer token
    Unauthorized,
    /// Authenticated, but missing the required role
    Forbidden(Role),
}

/// Failure to read the principal stored by the authentication middleware.
///
/// Both variants mean the route was not wired behind the middleware. They
/// are programming errors, not security events.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrincipalError {
    #[error("no authenticated principal in request; is the authentication middleware installed?")]
    Missing,
    #[error("authenticated principal has an empty user id")]
    Invalid,
}

#[derive(Serialize)]
struct AuthErrorBody {
    message: String,
}

impl AuthError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Unauthorized => write!(f, "Unauthorized"),
            AuthError::Forbidden(role) => write!(f, "Forbidden. Required user role: {role}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}
