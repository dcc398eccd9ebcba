// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HS256 bearer token issuance and validation.
//!
//! ## Validation Order
//!
//! 1. Header `alg` must be exactly `HS256` (rejects `none` and asymmetric algorithms)
//! 2. HMAC signature must verify against the signing key
//! 3. `exp` present and in the future
//! 4. `iat` present and not in the future
//! 5. `nbf` present and not in the future
//! 6. `iss` equal to the configured issuer
//! 7. `aud` contains the configured audience
//! 8. `user_id` is not empty
//!
//! Steps 1–2 stop at the first failure. Steps 3–8 are all evaluated and every
//! failing check is reported in the same [`TokenError`]. Missing time claims
//! fail closed. No clock leeway is applied.

use std::{fmt, time::Duration};

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize};

use super::{
    claims::{BearerTokenClaims, JwtPayload, UserPrincipal},
    roles::Role,
};

/// HKDF context label for the token signing key.
pub const JWT_SIGNATURE_KEY_CONTEXT: &str = "JWT signature key";

/// Signing key length derived for HS256.
pub const JWT_SIGNATURE_KEY_LEN: usize = 32;

const EXPECTED_ALG: &str = "HS256";

// =============================================================================
// Errors
// =============================================================================

/// Individual reasons a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenErrorKind {
    /// Not a three-segment JWS, or undecodable header/claims
    Malformed,
    /// Wrong algorithm or signature mismatch
    InvalidSignature,
    /// `exp` missing or in the past
    TokenExpired,
    /// `iat` missing or in the future
    UsedBeforeIssued,
    /// `iat` or `nbf` missing or in the future
    TokenNotYetValid,
    /// `iss` mismatch
    InvalidIssuer,
    /// `aud` does not contain the expected audience
    InvalidAudience,
    /// Token could not be produced
    Signing,
}

impl TokenErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenErrorKind::Malformed => "malformed_token",
            TokenErrorKind::InvalidSignature => "invalid_signature",
            TokenErrorKind::TokenExpired => "token_expired",
            TokenErrorKind::UsedBeforeIssued => "used_before_issued",
            TokenErrorKind::TokenNotYetValid => "token_not_yet_valid",
            TokenErrorKind::InvalidIssuer => "invalid_issuer",
            TokenErrorKind::InvalidAudience => "invalid_audience",
            TokenErrorKind::Signing => "signing_failed",
        }
    }
}

impl fmt::Display for TokenErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token rejection carrying one or more [`TokenErrorKind`]s.
#[derive(Debug, thiserror::Error)]
#[error("token rejected: {}", join_kinds(.kinds))]
pub struct TokenError {
    kinds: Vec<TokenErrorKind>,
    #[source]
    source: Option<jsonwebtoken::errors::Error>,
}

fn join_kinds(kinds: &[TokenErrorKind]) -> String {
    kinds
        .iter()
        .map(TokenErrorKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl TokenError {
    pub(crate) fn new(kind: TokenErrorKind) -> Self {
        Self {
            kinds: vec![kind],
            source: None,
        }
    }

    fn with_source(kind: TokenErrorKind, source: jsonwebtoken::errors::Error) -> Self {
        Self {
            kinds: vec![kind],
            source: Some(source),
        }
    }

    fn from_kinds(mut kinds: Vec<TokenErrorKind>) -> Self {
        kinds.dedup();
        Self {
            kinds,
            source: None,
        }
    }

    /// Whether this rejection includes `kind`.
    pub fn is(&self, kind: TokenErrorKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn kinds(&self) -> &[TokenErrorKind] {
        &self.kinds
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Token policy and signing key.
#[derive(Clone)]
pub struct JwtConfig {
    /// Issuer written into and required from tokens
    pub issuer: String,
    /// Audience value a token must contain to be accepted
    pub audience_expected: String,
    /// Audience list written into generated tokens
    pub audience_generated: Vec<String>,
    /// Lifetime of generated tokens
    pub token_ttl: Duration,
    /// HMAC-SHA256 key
    pub signing_key: Vec<u8>,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience_expected", &self.audience_expected)
            .field("audience_generated", &self.audience_generated)
            .field("token_ttl", &self.token_ttl)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Handler
// =============================================================================

/// Token operations the HTTP layer depends on.
pub trait BearerTokenHandler: Send + Sync {
    /// Mint a signed token for `principal`.
    fn generate(&self, principal: &UserPrincipal) -> Result<String, TokenError>;

    /// Verify and validate a token.
    fn parse(&self, token: &str) -> Result<JwtPayload, TokenError>;

    /// Lifetime of generated tokens.
    fn token_ttl(&self) -> Duration;
}

/// HS256 token codec. Immutable after construction.
pub struct JwtHandler {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

struct TokenSegments<'a> {
    header: &'a str,
    claims: &'a str,
}

impl<'a> TokenSegments<'a> {
    fn split(token: &'a str) -> Result<Self, TokenError> {
        let mut parts = token.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(claims), Some(_signature), None) => Ok(Self { header, claims }),
            _ => Err(TokenError::new(TokenErrorKind::Malformed)),
        }
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(segment)
        .map_err(|_| TokenError::new(TokenErrorKind::Malformed))?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::new(TokenErrorKind::Malformed))
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, TokenError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| TokenError::new(TokenErrorKind::Malformed))
}

impl JwtHandler {
    pub fn new(config: JwtConfig) -> Self {
        // jsonwebtoken only checks the algorithm and signature here; every
        // registered claim is validated by `validate_claims`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Self {
            encoding_key: EncodingKey::from_secret(&config.signing_key),
            decoding_key: DecodingKey::from_secret(&config.signing_key),
            validation,
            config,
        }
    }

    fn claims_for(&self, principal: &UserPrincipal, now: i64) -> BearerTokenClaims {
        let ttl = i64::try_from(self.config.token_ttl.as_secs()).unwrap_or(i64::MAX);
        BearerTokenClaims {
            principal: principal.clone(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience_generated.clone(),
            iat: Some(now),
            nbf: Some(now),
            exp: Some(now.saturating_add(ttl)),
        }
    }

    fn sign(&self, claims: &BearerTokenClaims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::with_source(TokenErrorKind::Signing, e))
    }

    fn verify_signature(&self, token: &str) -> Result<BearerTokenClaims, TokenError> {
        let segments = TokenSegments::split(token)?;
        let header: RawHeader = decode_segment(segments.header)?;
        if header.alg != EXPECTED_ALG {
            return Err(TokenError::new(TokenErrorKind::InvalidSignature));
        }

        jsonwebtoken::decode::<BearerTokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let kind = match e.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        TokenErrorKind::InvalidSignature
                    }
                    _ => TokenErrorKind::Malformed,
                };
                TokenError::with_source(kind, e)
            })
    }

    fn validate_claims(&self, claims: BearerTokenClaims, now: i64) -> Result<JwtPayload, TokenError> {
        let mut kinds = Vec::new();

        match claims.exp {
            Some(exp) if now < exp => {}
            _ => kinds.push(TokenErrorKind::TokenExpired),
        }
        match claims.iat {
            Some(iat) if iat <= now => {}
            _ => {
                kinds.push(TokenErrorKind::UsedBeforeIssued);
                kinds.push(TokenErrorKind::TokenNotYetValid);
            }
        }
        match claims.nbf {
            Some(nbf) if nbf <= now => {}
            _ => kinds.push(TokenErrorKind::TokenNotYetValid),
        }
        if claims.iss != self.config.issuer {
            kinds.push(TokenErrorKind::InvalidIssuer);
        }
        if !claims.aud.iter().any(|aud| *aud == self.config.audience_expected) {
            kinds.push(TokenErrorKind::InvalidAudience);
        }
        if claims.principal.user_id.is_empty() {
            kinds.push(TokenErrorKind::Malformed);
        }

        match (claims.iat, claims.nbf, claims.exp) {
            (Some(iat), Some(nbf), Some(exp)) if kinds.is_empty() => Ok(JwtPayload::new(
                claims.principal,
                claims.iss,
                claims.aud,
                timestamp(iat)?,
                timestamp(nbf)?,
                timestamp(exp)?,
            )),
            _ => Err(TokenError::from_kinds(kinds)),
        }
    }

    /// Validate claims WITHOUT checking the algorithm or signature.
    ///
    /// # Danger
    ///
    /// Anyone can forge a token that passes this check. Use it only to
    /// inspect a token while debugging. It is compiled only for tests and the
    /// `dev` feature and is deliberately absent from [`BearerTokenHandler`].
    #[cfg(any(test, feature = "dev"))]
    pub fn dangerous_parse_without_signature(&self, token: &str) -> Result<JwtPayload, TokenError> {
        let segments = TokenSegments::split(token)?;
        let claims: BearerTokenClaims = decode_segment(segments.claims)?;
        self.validate_claims(claims, Utc::now().timestamp())
    }
}

impl BearerTokenHandler for JwtHandler {
    fn generate(&self, principal: &UserPrincipal) -> Result<String, TokenError> {
        if principal.user_id.is_empty() || !principal.roles.iter().all(Role::is_valid) {
            return Err(TokenError::new(TokenErrorKind::Signing));
        }
        self.sign(&self.claims_for(principal, Utc::now().timestamp()))
    }

    fn parse(&self, token: &str) -> Result<JwtPayload, TokenError> {
        let claims = self.verify_signature(token)?;
        self.validate_claims(claims, Utc::now().timestamp())
    }

    fn token_ttl(&self) -> Duration {
        self.config.token_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const ISSUER: &str = "course-watch";
    const AUDIENCE: &str = "course-watch-api";
    const TTL: Duration = Duration::from_secs(3600);
    const TTL_SECS: i64 = 3600;

    fn config_with_key(key: &[u8]) -> JwtConfig {
        JwtConfig {
            issuer: ISSUER.to_string(),
            audience_expected: AUDIENCE.to_string(),
            audience_generated: vec![AUDIENCE.to_string()],
            token_ttl: TTL,
            signing_key: key.to_vec(),
        }
    }

    fn handler() -> JwtHandler {
        JwtHandler::new(config_with_key(b"test-signing-key-1234"))
    }

    fn student() -> UserPrincipal {
        UserPrincipal::new("1111111", vec![Role::Student])
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    /// Claims for `student()` with every timestamp shifted by `offset` seconds.
    fn shifted_claims(h: &JwtHandler, offset: i64) -> BearerTokenClaims {
        h.claims_for(&student(), now() + offset)
    }

    fn encode_segment(value: &serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    fn tamper_claims(token: &str, f: impl FnOnce(&mut serde_json::Value)) -> String {
        let parts: Vec<&str> = token.split('.').collect();
        let mut claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        f(&mut claims);
        format!("{}.{}.{}", parts[0], encode_segment(&claims), parts[2])
    }

    fn unsigned_token(alg: &str, claims: &BearerTokenClaims) -> String {
        let header = serde_json::json!({ "alg": alg, "typ": "JWT" });
        let claims = serde_json::to_value(claims).unwrap();
        format!("{}.{}.", encode_segment(&header), encode_segment(&claims))
    }

    #[test]
    fn round_trip_preserves_principal() {
        let h = handler();
        let token = h.generate(&student()).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let payload = h.parse(&token).unwrap();
        assert_eq!(payload.principal(), &student());
        assert_eq!(payload.issuer(), ISSUER);
        assert_eq!(payload.audience(), [AUDIENCE.to_string()]);
        assert_eq!(payload.issued_at(), payload.not_before());
        assert_eq!(
            payload.expires_at() - payload.issued_at(),
            chrono::Duration::seconds(TTL_SECS)
        );
        assert!((payload.issued_at().timestamp() - now()).abs() <= 5);
    }

    #[test]
    fn round_trip_with_multiple_roles() {
        let h = handler();
        let admin = UserPrincipal::new("2222222", vec![Role::Student, Role::Admin]);
        let payload = h.parse(&h.generate(&admin).unwrap()).unwrap();
        assert!(payload.principal().is_admin());
        assert_eq!(payload.into_principal(), admin);
    }

    #[test]
    fn claims_use_custom_identity_fields() {
        let h = handler();
        let token = h.generate(&student()).unwrap();
        let payload_segment = token.split('.').nth(1).unwrap();
        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload_segment).unwrap()).unwrap();

        assert_eq!(claims["user_id"], "1111111");
        assert_eq!(claims["roles"], serde_json::json!(["student"]));
        assert_eq!(claims["aud"], serde_json::json!([AUDIENCE]));
        assert!(claims.get("sub").is_none());
    }

    #[test]
    fn tampered_roles_fail_signature_check() {
        let h = handler();
        let token = h.generate(&student()).unwrap();
        let forged = tamper_claims(&token, |claims| {
            claims["roles"] = serde_json::json!(["admin"]);
        });

        let err = h.parse(&forged).unwrap_err();
        assert!(err.is(TokenErrorKind::InvalidSignature));

        let unchecked = h.dangerous_parse_without_signature(&forged).unwrap();
        assert!(unchecked.principal().is_admin());
    }

    #[test]
    fn altered_signature_is_rejected() {
        let h = handler();
        let token = h.generate(&student()).unwrap();
        let (body, signature) = token.rsplit_once('.').unwrap();
        let mut signature: Vec<char> = signature.chars().collect();
        signature[0] = if signature[0] == 'A' { 'B' } else { 'A' };
        let altered = format!("{body}.{}", signature.into_iter().collect::<String>());

        let err = h.parse(&altered).unwrap_err();
        assert!(err.is(TokenErrorKind::InvalidSignature));
    }

    #[test]
    fn alg_none_is_rejected() {
        let h = handler();
        let token = unsigned_token("none", &shifted_claims(&h, 0));

        let err = h.parse(&token).unwrap_err();
        assert!(err.is(TokenErrorKind::InvalidSignature));

        let unchecked = h.dangerous_parse_without_signature(&token).unwrap();
        assert_eq!(unchecked.principal(), &student());
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let h = handler();
        for alg in ["RS256", "ES256", "HS512", "hs256"] {
            let token = unsigned_token(alg, &shifted_claims(&h, 0));
            let err = h.parse(&token).unwrap_err();
            assert!(err.is(TokenErrorKind::InvalidSignature), "alg {alg}");
        }
    }

    #[test]
    fn different_key_is_rejected() {
        let token = handler().generate(&student()).unwrap();
        let other = JwtHandler::new(config_with_key(b"42-42-42-other-key"));

        let err = other.parse(&token).unwrap_err();
        assert!(err.is(TokenErrorKind::InvalidSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let h = handler();
        let token = h.sign(&shifted_claims(&h, -2 * TTL_SECS)).unwrap();

        let err = h.parse(&token).unwrap_err();
        assert!(err.is(TokenErrorKind::TokenExpired));
        assert!(!err.is(TokenErrorKind::TokenNotYetValid));
        assert!(!err.is(TokenErrorKind::InvalidSignature));
    }

    #[test]
    fn future_token_is_not_yet_valid_and_used_before_issued() {
        let h = handler();
        let token = h.sign(&shifted_claims(&h, TTL_SECS)).unwrap();

        let err = h.parse(&token).unwrap_err();
        assert!(err.is(TokenErrorKind::TokenNotYetValid));
        assert!(err.is(TokenErrorKind::UsedBeforeIssued));
        assert!(!err.is(TokenErrorKind::TokenExpired));
    }

    #[test]
    fn missing_exp_fails_closed() {
        let h = handler();
        let mut claims = shifted_claims(&h, 0);
        claims.exp = None;

        let err = h.parse(&h.sign(&claims).unwrap()).unwrap_err();
        assert!(err.is(TokenErrorKind::TokenExpired));
    }

    #[test]
    fn missing_iat_fails_closed() {
        let h = handler();
        let mut claims = shifted_claims(&h, 0);
        claims.iat = None;

        let err = h.parse(&h.sign(&claims).unwrap()).unwrap_err();
        assert!(err.is(TokenErrorKind::UsedBeforeIssued));
        assert!(err.is(TokenErrorKind::TokenNotYetValid));
    }

    #[test]
    fn missing_nbf_fails_closed() {
        let h = handler();
        let mut claims = shifted_claims(&h, 0);
        claims.nbf = None;

        let err = h.parse(&h.sign(&claims).unwrap()).unwrap_err();
        assert!(err.is(TokenErrorKind::TokenNotYetValid));
        assert!(!err.is(TokenErrorKind::UsedBeforeIssued));
    }

    #[test]
    fn issuer_must_match() {
        let h = handler();

        let mut claims = shifted_claims(&h, 0);
        claims.iss = "some-other-issuer".to_string();
        let err = h.parse(&h.sign(&claims).unwrap()).unwrap_err();
        assert!(err.is(TokenErrorKind::InvalidIssuer));

        claims.iss = String::new();
        let err = h.parse(&h.sign(&claims).unwrap()).unwrap_err();
        assert!(err.is(TokenErrorKind::InvalidIssuer));
    }

    #[test]
    fn audience_must_contain_expected_value() {
        let h = handler();
        let cases: [(&[&str], bool); 5] = [
            (&[AUDIENCE], true),
            (&[AUDIENCE, "other"], true),
            (&["other", "another"], false),
            (&["other"], false),
            (&[], false),
        ];

        for (aud, accepted) in cases {
            let mut claims = shifted_claims(&h, 0);
            claims.aud = aud.iter().map(|a| a.to_string()).collect();
            let result = h.parse(&h.sign(&claims).unwrap());
            match result {
                Ok(_) => assert!(accepted, "audience {aud:?} should be rejected"),
                Err(e) => {
                    assert!(!accepted, "audience {aud:?} should be accepted");
                    assert!(e.is(TokenErrorKind::InvalidAudience));
                }
            }
        }
    }

    #[test]
    fn missing_audience_is_rejected() {
        let h = handler();
        let token = h.generate(&student()).unwrap();
        let stripped = tamper_claims(&token, |claims| {
            claims.as_object_mut().unwrap().remove("aud");
        });

        let err = h.dangerous_parse_without_signature(&stripped).unwrap_err();
        assert!(err.is(TokenErrorKind::InvalidAudience));
        assert_eq!(err.kinds(), [TokenErrorKind::InvalidAudience]);
    }

    #[test]
    fn claim_failures_accumulate() {
        let h = handler();
        let mut claims = shifted_claims(&h, -2 * TTL_SECS);
        claims.iss = "wrong".to_string();
        claims.aud = vec!["wrong".to_string()];

        let err = h.parse(&h.sign(&claims).unwrap()).unwrap_err();
        assert!(err.is(TokenErrorKind::TokenExpired));
        assert!(err.is(TokenErrorKind::InvalidIssuer));
        assert!(err.is(TokenErrorKind::InvalidAudience));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let h = handler();
        for token in ["", "42", "a.b", "a.b.c.d", "!!!.???.###"] {
            let err = h.parse(token).unwrap_err();
            assert!(err.is(TokenErrorKind::Malformed), "token {token:?}");
        }
    }

    #[test]
    fn undefined_role_cannot_be_signed() {
        let h = handler();
        let principal = UserPrincipal::new("1111111", vec![Role::Undefined]);
        let err = h.generate(&principal).unwrap_err();
        assert!(err.is(TokenErrorKind::Signing));
    }

    #[test]
    fn empty_user_id_cannot_be_signed() {
        let h = handler();
        let err = h.generate(&UserPrincipal::new("", vec![Role::Student])).unwrap_err();
        assert!(err.is(TokenErrorKind::Signing));
    }

    #[test]
    fn signed_token_with_empty_user_id_is_malformed() {
        let h = handler();
        let claims = h.claims_for(&UserPrincipal::new("", vec![Role::Admin]), now());
        let token = h.sign(&claims).unwrap();

        let err = h.parse(&token).unwrap_err();
        assert_eq!(err.kinds(), [TokenErrorKind::Malformed]);

        let err = h.dangerous_parse_without_signature(&token).unwrap_err();
        assert!(err.is(TokenErrorKind::Malformed));
    }

    #[test]
    fn token_ttl_is_exposed() {
        assert_eq!(handler().token_ttl(), TTL);
    }

    #[test]
    fn debug_redacts_signing_key() {
        let rendered = format!("{:?}", config_with_key(b"super-secret"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("super-secret"));
    }
}
