// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Business logic between the HTTP handlers and the repositories.
//!
//! Services validate input, own password hashing, and translate storage
//! outcomes into [`ServiceError`] variants the API layer maps to statuses.

pub mod courses;
pub mod users;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::auth::TokenError;
use crate::storage::StorageError;

pub use courses::CoursesService;
pub use users::UsersService;

/// Field name → reason for every field that failed validation.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("user already exist with given mailId")]
    UserAlreadyExists,

    #[error("mail or password are incorrect")]
    InvalidCredentials,

    #[error("invalid input")]
    Validation(FieldErrors),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Token(#[from] TokenError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Collects per-field validation failures; the first failure per field wins.
#[derive(Debug, Default)]
pub(crate) struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail(&mut self, field: &str, reason: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| reason.to_string());
    }

    pub(crate) fn not_blank(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, "cannot be blank");
        }
        self
    }

    pub(crate) fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, "cannot be blank");
        } else if !is_valid_email(value) {
            self.fail(field, "must be a valid email address");
        }
        self
    }

    pub(crate) fn length_between(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.chars().count();
        if len < min || len > max {
            self.fail(field, &format!("the length must be between {min} and {max}"));
        }
        self
    }

    pub(crate) fn finish(&mut self) -> ServiceResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}
