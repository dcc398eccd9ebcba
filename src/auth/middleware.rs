// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer authentication and role authorization middleware for Axum.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let auth = BearerAuth::new(Arc::new(JwtHandler::new(config)));
//!
//! let user_routes = auth.require_authentication(
//!     Router::new().route("/user", get(get_user_info)),
//! );
//! let admin_routes = auth.require_role(
//!     Router::new().route("/courses", post(create_course)),
//!     Role::Admin,
//! );
//! ```
//!
//! Rejection is an early `Err` return from the middleware, so the wrapped
//! handler never runs for an unauthenticated or unauthorized request.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::{self, Next},
    response::Response,
    Router,
};

use super::{
    claims::UserPrincipal,
    jwt::{BearerTokenHandler, TokenError},
    roles::Role,
    AuthError,
};

/// Shared bearer authentication state.
#[derive(Clone)]
pub struct BearerAuth {
    tokens: Arc<dyn BearerTokenHandler>,
}

impl BearerAuth {
    pub fn new(tokens: Arc<dyn BearerTokenHandler>) -> Self {
        Self { tokens }
    }

    /// Mint an access token for a freshly authenticated user.
    pub fn generate_token(&self, principal: &UserPrincipal) -> Result<String, TokenError> {
        self.tokens.generate(principal)
    }

    /// Lifetime of issued tokens, reported to clients as `expires_in`.
    pub fn token_ttl(&self) -> Duration {
        self.tokens.token_ttl()
    }

    /// Validate the `Authorization` header and return the token's principal.
    ///
    /// Every failure is reported as [`AuthError::Unauthorized`]; the reason is
    /// only logged.
    pub fn authenticate_headers(&self, headers: &HeaderMap) -> Result<UserPrincipal, AuthError> {
        let token = bearer_token(headers)?;
        match self.tokens.parse(token) {
            Ok(payload) => {
                let principal = payload.into_principal();
                tracing::debug!(user_id = %principal.user_id, "bearer token accepted");
                Ok(principal)
            }
            Err(e) => {
                tracing::warn!(error = %e, "bearer token rejected");
                Err(AuthError::Unauthorized)
            }
        }
    }

    /// Wrap every route of `router` with [`authenticate`].
    pub fn require_authentication<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(self.clone(), authenticate))
    }

    /// Wrap every route of `router` with [`authorize`] for `role`.
    pub fn require_role<S>(&self, router: Router<S>, role: Role) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let guard = RoleGuard {
            auth: self.clone(),
            role,
        };
        router.route_layer(middleware::from_fn_with_state(guard, authorize))
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The header must split on spaces into exactly two parts: the `Bearer`
/// scheme and a non-empty token.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        tracing::debug!("missing authorization header");
        return Err(AuthError::Unauthorized);
    };
    let value = value.to_str().map_err(|_| AuthError::Unauthorized)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => {
            tracing::debug!("malformed authorization header");
            Err(AuthError::Unauthorized)
        }
    }
}

/// Authentication middleware function.
///
/// Inserts the [`UserPrincipal`] into the request extensions on success.
pub async fn authenticate(
    State(auth): State<BearerAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = auth.authenticate_headers(request.headers())?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// State for [`authorize`]: the authenticator plus the role to require.
#[derive(Clone)]
pub struct RoleGuard {
    auth: BearerAuth,
    role: Role,
}

/// Authenticate, then require a role.
///
/// An authentication failure returns 401 before the role is looked at.
pub async fn authorize(
    State(guard): State<RoleGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = guard.auth.authenticate_headers(request.headers())?;

    if !principal.has_role(guard.role) {
        tracing::warn!(
            user_id = %principal.user_id,
            required_role = %guard.role,
            "request lacks required role"
        );
        return Err(AuthError::Forbidden(guard.role));
    }

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
