// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile endpoints for the authenticated user.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::{
    auth::CurrentUser,
    error::ApiError,
    models::{UpdateUserInfoRequest, UserInfoResponse},
    state::AppState,
};

/// Get the current user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/user",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserInfoResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "User no longer exists"),
    )
)]
pub async fn get_user_info(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserInfoResponse>, ApiError> {
    Ok(Json(state.users.get_user_info(&user.user_id)?))
}

/// Replace the current user's profile fields.
#[utoipa::path(
    put,
    path = "/api/v1/user",
    tag = "Users",
    security(("bearer" = [])),
    request_body = UpdateUserInfoRequest,
    responses(
        (status = 200, description = "Updated user information", body = UserInfoResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn update_user_info(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UpdateUserInfoRequest>, JsonRejection>,
) -> Result<Json<UserInfoResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.users.update_user_info(&user.user_id, request)?))
}
