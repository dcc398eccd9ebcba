// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::{
    auth::{BearerAuth, BearerTokenHandler},
    service::{CoursesService, UsersService},
    storage::{CourseRepository, InMemoryCourses, InMemoryUsers, UserRepository},
};

#[derive(Clone)]
pub struct AppState {
    pub users: UsersService,
    pub courses: CoursesService,
    pub auth: BearerAuth,
}

impl AppState {
    pub fn new(
        tokens: Arc<dyn BearerTokenHandler>,
        users: Arc<dyn UserRepository>,
        courses: Arc<dyn CourseRepository>,
    ) -> Self {
        let auth = BearerAuth::new(tokens);
        Self {
            users: UsersService::new(users, auth.clone()),
            courses: CoursesService::new(courses),
            auth,
        }
    }

    /// State backed by in-memory repositories seeded with the sample user.
    pub fn in_memory(tokens: Arc<dyn BearerTokenHandler>) -> Self {
        Self::new(
            tokens,
            Arc::new(InMemoryUsers::with_sample_user()),
            Arc::new(InMemoryCourses::new()),
        )
    }
}
