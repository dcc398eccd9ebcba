// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTPS listener configuration from PEM files.

use std::io;

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

use crate::config::TlsPaths;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to install rustls crypto provider")]
    Provider,

    #[error("failed to load TLS credentials from {cert} / {key}: {source}")]
    Load {
        cert: String,
        key: String,
        #[source]
        source: io::Error,
    },
}

/// Install the ring crypto provider for rustls.
///
/// Must run before any TLS operation. A provider that is already installed
/// is accepted.
pub fn install_crypto_provider() -> Result<(), TlsError> {
    match rustls::crypto::ring::default_provider().install_default() {
        Ok(()) => Ok(()),
        Err(_) if rustls::crypto::CryptoProvider::get_default().is_some() => Ok(()),
        Err(_) => Err(TlsError::Provider),
    }
}

/// Build the rustls server config from the certificate chain and key files.
pub async fn load_rustls_config(paths: &TlsPaths) -> Result<RustlsConfig, TlsError> {
    let config = RustlsConfig::from_pem_file(&paths.cert, &paths.key)
        .await
        .map_err(|source| TlsError::Load {
            cert: paths.cert.display().to_string(),
            key: paths.key.display().to_string(),
            source,
        })?;
    tracing::info!(cert = %paths.cert.display(), "loaded TLS credentials");
    Ok(config)
}
