// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{HeaderName, StatusCode},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Role,
    config::HttpLimits,
    models::{
        Course, CreateCourseRequest, LoginRequest, LoginResponse, SignupRequest,
        UpdateUserInfoRequest, UserInfoResponse,
    },
    state::AppState,
};

pub mod auth;
pub mod courses;
pub mod health;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState, limits: &HttpLimits) -> Router {
    let bearer = state.auth.clone();

    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login));

    let authenticated_routes = bearer.require_authentication(
        Router::new()
            .route(
                "/user",
                get(users::get_user_info).put(users::update_user_info),
            )
            .route("/courses/{id}", get(courses::get_course)),
    );

    let admin_routes = bearer.require_role(
        Router::new().route("/courses", post(courses::create_course)),
        Role::Admin,
    );

    let v1_routes = Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(admin_routes)
        .with_state(state);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let app = Router::new()
        .nest("/api/v1", v1_routes)
        .route("/health", get(health::health))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()));

    apply_http_limits(app, limits)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

/// Bound request body size, body read time and total handling time.
///
/// A request still running after `write_timeout` is answered with 408.
pub fn apply_http_limits(router: Router, limits: &HttpLimits) -> Router {
    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            limits.write_timeout,
        ))
        .layer(RequestBodyTimeoutLayer::new(limits.read_timeout))
        .layer(RequestBodyLimitLayer::new(limits.max_body_bytes))
}

/// Registers the `bearer` scheme referenced by protected operations.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup,
        auth::login,
        users::get_user_info,
        users::update_user_info,
        courses::get_course,
        courses::create_course,
        health::health
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            LoginResponse,
            UserInfoResponse,
            UpdateUserInfoRequest,
            Course,
            CreateCourseRequest,
            Role,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Signup and login"),
        (name = "Users", description = "Current user profile"),
        (name = "Courses", description = "Course catalogue"),
        (name = "Health", description = "Liveness check")
    )
)]
struct ApiDoc;
