// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{process::ExitCode, sync::Arc, time::Duration};

use course_watch_server::{
    api::router,
    auth::{JwtHandler, KeySalt},
    config::{self, Config},
    state::AppState,
    storage::RedbStore,
    tls,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    config::init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), BoxError> {
    let config = Config::from_env()?;
    tracing::info!(?config, "configuration loaded");

    // Signing key: HKDF over SIGNING_KEY with the embedded salt
    let salt = KeySalt::embedded()?;
    let tokens = Arc::new(JwtHandler::new(config.jwt_config(&salt)?));

    let state = match config.database_path() {
        Some(path) => {
            let store = Arc::new(RedbStore::open(&path)?);
            tracing::info!(path = %path.display(), "using redb storage");
            AppState::new(tokens, store.clone(), store)
        }
        None => {
            tracing::warn!("DATA_DIR not set, using in-memory storage");
            AppState::in_memory(tokens)
        }
    };
    let app = router(state, &config.limits);
    let max_header_bytes = config.limits.max_header_bytes;
    let addr = config.bind_addr();

    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    match &config.tls {
        Some(paths) => {
            tls::install_crypto_provider()?;
            let rustls_config = tls::load_rustls_config(paths).await?;
            tracing::info!(%addr, "Course Watch server listening on https (docs at /docs)");
            let mut server = axum_server::bind_rustls(addr, rustls_config).handle(handle);
            server.http_builder().http1().max_buf_size(max_header_bytes);
            server.serve(app.into_make_service()).await?;
        }
        None => {
            tracing::info!(%addr, "Course Watch server listening on http (docs at /docs)");
            let mut server = axum_server::bind(addr).handle(handle);
            server.http_builder().http1().max_buf_size(max_header_bytes);
            server.serve(app.into_make_service()).await?;
        }
    }

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
