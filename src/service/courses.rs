// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::{ServiceError, ServiceResult, Validator};
use crate::models::{Course, CreateCourseRequest};
use crate::storage::CourseRepository;

#[derive(Clone)]
pub struct CoursesService {
    repo: Arc<dyn CourseRepository>,
}

impl CoursesService {
    pub fn new(repo: Arc<dyn CourseRepository>) -> Self {
        Self { repo }
    }

    pub fn get_by_id(&self, id: &str) -> ServiceResult<Course> {
        match self.repo.get_by_id(id) {
            Ok(course) => Ok(course),
            Err(e) if e.is_not_found() => Err(ServiceError::NotFound(format!("course {id}"))),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a course with a generated id.
    pub fn create(&self, request: CreateCourseRequest) -> ServiceResult<Course> {
        Validator::new().not_blank("title", &request.title).finish()?;

        let course = Course {
            id: Uuid::new_v4().to_string(),
            title: request.title,
            description: request.description,
            created_at: Utc::now(),
        };
        self.repo.insert(&course)?;

        tracing::info!(course_id = %course.id, "course created");
        Ok(course)
    }
}
