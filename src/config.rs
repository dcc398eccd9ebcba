// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup and passed
//! down explicitly; nothing reads the environment after `main` has built the
//! application.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SIGNING_KEY` | Operator secret the JWT signing key is derived from | Required |
//! | `JWT_ISSUER` | Issuer written into and required from tokens | `course-watch` |
//! | `JWT_AUDIENCE` | Audience generated into and required from tokens | `course-watch-api` |
//! | `ACCESS_TOKEN_TTL_SECS` | Access token lifetime in seconds | `3600` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `READ_TIMEOUT` | Longest wait for a request body (`500ms`, `5s`, `1m`) | `5s` |
//! | `WRITE_TIMEOUT` | Longest time to produce a response | `5s` |
//! | `MAX_HEADER_MEGABYTES` | Request head size limit in MiB | `1` |
//! | `DATA_DIR` | Directory holding the redb database | Unset (in-memory) |
//! | `TLS_CERT_PATH` | PEM certificate chain; enables HTTPS with `TLS_KEY_PATH` | Unset |
//! | `TLS_KEY_PATH` | PEM private key | Unset |
//! | `LOG_LEVEL` | Default log level when `RUST_LOG` is unset | `info` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Full log filter, overrides `LOG_LEVEL` | Unset |

use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::auth::{
    jwt::{JWT_SIGNATURE_KEY_CONTEXT, JWT_SIGNATURE_KEY_LEN},
    keygen, JwtConfig, KeyGenError, KeySalt,
};

/// Operator secret the signing key is derived from.
pub const SIGNING_KEY_ENV: &str = "SIGNING_KEY";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWT_AUDIENCE_ENV: &str = "JWT_AUDIENCE";
pub const ACCESS_TOKEN_TTL_ENV: &str = "ACCESS_TOKEN_TTL_SECS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const READ_TIMEOUT_ENV: &str = "READ_TIMEOUT";
pub const WRITE_TIMEOUT_ENV: &str = "WRITE_TIMEOUT";
pub const MAX_HEADER_MEGABYTES_ENV: &str = "MAX_HEADER_MEGABYTES";

/// Environment variable name for the database directory.
///
/// When unset the server keeps users and courses in memory and seeds the
/// sample user.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_ISSUER: &str = "course-watch";
pub const DEFAULT_AUDIENCE: &str = "course-watch-api";
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_HEADER_MEGABYTES: usize = 1;

/// Request body size limit; bodies here are small JSON documents.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// File name of the redb database inside `DATA_DIR`.
pub const DATABASE_FILE: &str = "course-watch.redb";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,

    #[error("signing key derivation failed: {0}")]
    KeyDerivation(#[from] KeyGenError),
}

/// PEM files for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Per-request bounds applied by the router and the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpLimits {
    /// Longest wait for the request body.
    pub read_timeout: Duration,
    /// Longest time from request to response; exceeding it answers 408.
    pub write_timeout: Duration,
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
}

impl Default for HttpLimits {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            max_header_bytes: DEFAULT_MAX_HEADER_MEGABYTES << 20,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub signing_key: String,
    pub issuer: String,
    pub audience: String,
    pub token_ttl: Duration,
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub tls: Option<TlsPaths>,
    pub limits: HttpLimits,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("signing_key", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("token_ttl", &self.token_ttl)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("tls", &self.tls)
            .field("limits", &self.limits)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let signing_key = get(SIGNING_KEY_ENV).ok_or(ConfigError::Missing(SIGNING_KEY_ENV))?;
        let ttl_secs: u64 = parse_or(get(ACCESS_TOKEN_TTL_ENV), ACCESS_TOKEN_TTL_ENV, DEFAULT_TOKEN_TTL_SECS)?;
        if ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                name: ACCESS_TOKEN_TTL_ENV,
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let header_megabytes: usize = parse_or(
            get(MAX_HEADER_MEGABYTES_ENV),
            MAX_HEADER_MEGABYTES_ENV,
            DEFAULT_MAX_HEADER_MEGABYTES,
        )?;
        if header_megabytes == 0 || header_megabytes > 1024 {
            return Err(ConfigError::Invalid {
                name: MAX_HEADER_MEGABYTES_ENV,
                value: header_megabytes.to_string(),
                reason: "must be between 1 and 1024".to_string(),
            });
        }
        let limits = HttpLimits {
            read_timeout: duration_or(get(READ_TIMEOUT_ENV), READ_TIMEOUT_ENV, DEFAULT_READ_TIMEOUT)?,
            write_timeout: duration_or(get(WRITE_TIMEOUT_ENV), WRITE_TIMEOUT_ENV, DEFAULT_WRITE_TIMEOUT)?,
            max_header_bytes: header_megabytes << 20,
            max_body_bytes: MAX_BODY_BYTES,
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        Ok(Self {
            signing_key,
            issuer: get(JWT_ISSUER_ENV).unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            audience: get(JWT_AUDIENCE_ENV).unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
            token_ttl: Duration::from_secs(ttl_secs),
            host: parse_or(get(HOST_ENV), HOST_ENV, IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            port: parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT)?,
            data_dir: get(DATA_DIR_ENV).map(PathBuf::from),
            tls,
            limits,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Path of the redb database, when persistent storage is configured.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(DATABASE_FILE))
    }

    /// Token policy with the signing key derived from `SIGNING_KEY` and `salt`.
    pub fn jwt_config(&self, salt: &KeySalt) -> Result<JwtConfig, ConfigError> {
        let signing_key = keygen::generate(
            salt,
            &self.signing_key,
            JWT_SIGNATURE_KEY_CONTEXT,
            JWT_SIGNATURE_KEY_LEN,
        )?;
        Ok(JwtConfig {
            issuer: self.issuer.clone(),
            audience_expected: self.audience.clone(),
            audience_generated: vec![self.audience.clone()],
            token_ttl: self.token_ttl,
            signing_key,
        })
    }
}

fn parse_or<T>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value: raw,
        }),
    }
}

/// Like [`parse_or`] for durations written as `<n><unit>` with unit
/// `ms`, `s`, `m` or `h`. Zero is rejected.
fn duration_or(value: Option<String>, name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    let invalid = |reason: &str| ConfigError::Invalid {
        name,
        value: raw.clone(),
        reason: reason.to_string(),
    };

    let s = raw.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (num_str, unit) = s.split_at(split);
    let num: u64 = num_str.parse().map_err(|_| invalid("expected a number followed by ms, s, m or h"))?;

    let duration = match unit {
        "ms" => Duration::from_millis(num),
        "s" => Duration::from_secs(num),
        "m" => Duration::from_secs(num.saturating_mul(60)),
        "h" => Duration::from_secs(num.saturating_mul(3600)),
        _ => return Err(invalid("unit must be ms, s, m or h")),
    };
    if duration.is_zero() {
        return Err(invalid("must be positive"));
    }
    Ok(duration)
}

// =============================================================================
// Logging
// =============================================================================

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `LOG_LEVEL` (default `info`) with
/// `tower_http=debug`. `LOG_FORMAT=json` selects JSON output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
        EnvFilter::new(default_filter(&level))
    });

    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.pretty().try_init()
    };
}

fn default_filter(level: &str) -> String {
    format!("{level},tower_http=debug")
}
