// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access to the principal stored by the authentication middleware.
//!
//! Use the `CurrentUser` extractor in handlers behind
//! [`BearerAuth::require_authentication`](super::BearerAuth::require_authentication):
//!
//! ```rust,ignore
//! async fn my_handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
//!     // user is UserPrincipal
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Extensions},
};

use super::{claims::UserPrincipal, error::PrincipalError, roles::Role, AuthError};

/// Read the authenticated principal from the request extensions.
///
/// `Missing` means no authentication middleware ran for this route;
/// `Invalid` means one ran but stored an unusable principal.
pub fn get_authenticated_user(extensions: &Extensions) -> Result<&UserPrincipal, PrincipalError> {
    let principal = extensions
        .get::<UserPrincipal>()
        .ok_or(PrincipalError::Missing)?;
    if principal.user_id.is_empty() {
        return Err(PrincipalError::Invalid);
    }
    Ok(principal)
}

/// Secondary role check for use inside a handler.
///
/// Returns the principal when it holds `role`, otherwise
/// [`AuthError::Forbidden`]. Handlers propagate the error with `?`, so no
/// handler code runs past a failed check.
pub fn ensure_authorized_user(extensions: &Extensions, role: Role) -> Result<&UserPrincipal, AuthError> {
    match get_authenticated_user(extensions) {
        Ok(principal) if principal.has_role(role) => Ok(principal),
        Ok(principal) => {
            tracing::warn!(
                user_id = %principal.user_id,
                required_role = %role,
                "request lacks required role"
            );
            Err(AuthError::Forbidden(role))
        }
        Err(e) => {
            tracing::error!(error = %e, "role check without authenticated principal");
            Err(AuthError::Forbidden(role))
        }
    }
}

/// Extractor for the authenticated user.
///
/// A missing principal is a wiring bug: it is logged as an error and the
/// request is answered with 401 rather than panicking.
pub struct CurrentUser(pub UserPrincipal);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match get_authenticated_user(&parts.extensions) {
            Ok(principal) => Ok(CurrentUser(principal.clone())),
            Err(e) => {
                tracing::error!(error = %e, path = %parts.uri.path(), "authenticated user unavailable");
                Err(AuthError::Unauthorized)
            }
        }
    }
}

/// Extractor that requires admin role.
pub struct AdminOnly(pub UserPrincipal);

impl<S: Send + Sync> FromRequestParts<S> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        ensure_authorized_user(&parts.extensions, Role::Admin)
            .map(|principal| AdminOnly(principal.clone()))
    }
}
