// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signup and login endpoints.
//!
//! Password hashing is CPU-bound, so both handlers run the service call on
//! the blocking pool.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

use crate::{
    error::ApiError,
    models::{LoginRequest, LoginResponse, SignupRequest, UserInfoResponse},
    service::ServiceResult,
    state::AppState,
};

async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            tracing::error!(error = %e, "blocking task failed");
            Err(ApiError::internal())
        }
    }
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = UserInfoResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered"),
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserInfoResponse>), ApiError> {
    let Json(request) = payload?;
    let users = state.users.clone();
    let info = run_blocking(move || users.signup(request)).await?;
    Ok((StatusCode::CREATED, Json(info)))
}

/// Exchange email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued", body = LoginResponse),
        (status = 401, description = "Mail or password are incorrect"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    let users = state.users.clone();
    let response = run_blocking(move || users.login(request)).await?;
    Ok(Json(response))
}
