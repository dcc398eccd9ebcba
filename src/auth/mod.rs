// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer token authentication and role-based authorization for the
//! Course Watch API.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with email and password (`POST /api/v1/auth/login`)
//! 2. Server mints an HS256 JWT carrying the user id and roles
//! 3. Client sends `Authorization: Bearer <token>` on later requests
//! 4. Middleware:
//!    - Verifies algorithm and signature
//!    - Checks expiry, issued-at, not-before, issuer and audience
//!    - Inserts the `UserPrincipal` into the request extensions
//! 5. Handlers read the principal with the `CurrentUser` extractor
//!
//! ## Security
//!
//! - Only HS256 is accepted; `alg: none` and asymmetric algorithms are rejected
//! - Missing time claims fail closed; no clock leeway
//! - Every token failure is reported to the client as a bare 401
//! - The signing key is derived from `SIGNING_KEY` with HKDF-SHA384

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwt;
pub mod keygen;
pub mod middleware;
pub mod password;
pub mod roles;

pub use claims::{JwtPayload, UserPrincipal};
pub use error::{AuthError, PrincipalError};
pub use extractor::{ensure_authorized_user, get_authenticated_user, AdminOnly, CurrentUser};
pub use jwt::{BearerTokenHandler, JwtConfig, JwtHandler, TokenError, TokenErrorKind};
pub use keygen::{KeyGen, KeyGenError, KeySalt};
pub use middleware::BearerAuth;
pub use roles::Role;
