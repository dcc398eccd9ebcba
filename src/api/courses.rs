// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    auth::AdminOnly,
    error::ApiError,
    models::{Course, CreateCourseRequest},
    state::AppState,
};

/// Fetch a course by id.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    tag = "Courses",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course", body = Course),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Course not found"),
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Course>, ApiError> {
    Ok(Json(state.courses.get_by_id(&id)?))
}

/// Create a course. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/courses",
    tag = "Courses",
    security(("bearer" = [])),
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Forbidden - admin role required"),
    )
)]
pub async fn create_course(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
    payload: Result<Json<CreateCourseRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let course = state.courses.create(request)?;
    tracing::info!(course_id = %course.id, admin_id = %admin.user_id, "course created by admin");

    let location = format!("/api/v1/courses/{}", course.id);
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(course)).into_response())
}
