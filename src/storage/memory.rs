// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory repositories.
//!
//! Data lives for the lifetime of the process. Used when no `DATA_DIR` is
//! configured, and as the backing store in tests.

use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::DateTime;

use super::{CourseRepository, StorageError, StorageResult, UserRepository};
use crate::auth::Role;
use crate::models::{Course, User, UserUpdate};

fn read<T>(lock: &RwLock<T>) -> StorageResult<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| StorageError::Poisoned)
}

fn write<T>(lock: &RwLock<T>) -> StorageResult<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| StorageError::Poisoned)
}

/// Reference account seeded into development stores.
///
/// Has no password hash, so it can be looked up but never logged into.
pub fn sample_user() -> User {
    User {
        id: "1582550893222432768".to_string(),
        email: "doe.j@example.com".to_string(),
        first_name: "John".to_string(),
        last_name: "Doe".to_string(),
        display_name: "JonnyD".to_string(),
        registration_date: DateTime::from_timestamp(1_500_658_348, 0).unwrap_or_default(),
        hashed_password: String::new(),
        roles: vec![Role::Student],
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Default)]
struct UserTables {
    by_id: HashMap<String, User>,
    id_by_email: HashMap<String, String>,
}

/// Users indexed by id and by email.
#[derive(Default)]
pub struct InMemoryUsers {
    tables: RwLock<UserTables>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with [`sample_user`].
    pub fn with_sample_user() -> Self {
        let user = sample_user();
        let mut tables = UserTables::default();
        tables.id_by_email.insert(user.email.clone(), user.id.clone());
        tables.by_id.insert(user.id.clone(), user);
        Self {
            tables: RwLock::new(tables),
        }
    }
}

impl UserRepository for InMemoryUsers {
    fn get_by_id(&self, id: &str) -> StorageResult<User> {
        read(&self.tables)?
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("user {id}")))
    }

    fn get_by_email(&self, email: &str) -> StorageResult<User> {
        let tables = read(&self.tables)?;
        tables
            .id_by_email
            .get(email)
            .and_then(|id| tables.by_id.get(id))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("user with email {email}")))
    }

    fn insert(&self, user: &User) -> StorageResult<()> {
        let mut tables = write(&self.tables)?;
        if tables.by_id.contains_key(&user.id) {
            return Err(StorageError::AlreadyExists(format!("user {}", user.id)));
        }
        if tables.id_by_email.contains_key(&user.email) {
            return Err(StorageError::AlreadyExists(format!(
                "user with email {}",
                user.email
            )));
        }
        tables
            .id_by_email
            .insert(user.email.clone(), user.id.clone());
        tables.by_id.insert(user.id.clone(), user.clone());
        Ok(())
    }

    fn update(&self, id: &str, update: &UserUpdate) -> StorageResult<()> {
        let mut tables = write(&self.tables)?;
        let user = tables
            .by_id
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("user {id}")))?;
        user.first_name = update.first_name.clone();
        user.last_name = update.last_name.clone();
        user.display_name = update.display_name.clone();
        Ok(())
    }
}

// =============================================================================
// Courses
// =============================================================================

#[derive(Default)]
pub struct InMemoryCourses {
    courses: RwLock<HashMap<String, Course>>,
}

impl InMemoryCourses {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CourseRepository for InMemoryCourses {
    fn get_by_id(&self, id: &str) -> StorageResult<Course> {
        read(&self.courses)?
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("course {id}")))
    }

    fn insert(&self, course: &Course) -> StorageResult<()> {
        let mut courses = write(&self.courses)?;
        if courses.contains_key(&course.id) {
            return Err(StorageError::AlreadyExists(format!("course {}", course.id)));
        }
        courses.insert(course.id.clone(), course.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            first_name: "Jane".to_string(),
            last_name: "Roe".to_string(),
            display_name: String::new(),
            registration_date: Utc::now(),
            hashed_password: "hash".to_string(),
            roles: vec![Role::Student],
        }
    }

    #[test]
    fn sample_user_is_seeded() {
        let repo = InMemoryUsers::with_sample_user();
        let by_id = repo.get_by_id("1582550893222432768").unwrap();
        let by_email = repo.get_by_email("doe.j@example.com").unwrap();
        assert_eq!(by_id, by_email);
        assert_eq!(by_id.display_name, "JonnyD");
        assert_eq!(by_id.registration_date.to_rfc3339(), "2017-07-21T17:32:28+00:00");
    }

    #[test]
    fn missing_user_is_not_found() {
        let repo = InMemoryUsers::new();
        assert!(repo.get_by_id("nope").unwrap_err().is_not_found());
        assert!(repo.get_by_email("nobody@example.com").unwrap_err().is_not_found());
    }

    #[test]
    fn insert_then_lookup() {
        let repo = InMemoryUsers::new();
        repo.insert(&user("u1", "jane@example.com")).unwrap();
        assert_eq!(repo.get_by_email("jane@example.com").unwrap().id, "u1");
        assert_eq!(repo.get_by_id("u1").unwrap().email, "jane@example.com");
    }

    #[test]
    fn duplicate_email_or_id_is_rejected() {
        let repo = InMemoryUsers::new();
        repo.insert(&user("u1", "jane@example.com")).unwrap();

        let dup_email = repo.insert(&user("u2", "jane@example.com")).unwrap_err();
        assert!(matches!(dup_email, StorageError::AlreadyExists(_)));

        let dup_id = repo.insert(&user("u1", "other@example.com")).unwrap_err();
        assert!(matches!(dup_id, StorageError::AlreadyExists(_)));
    }

    #[test]
    fn update_changes_profile_fields_only() {
        let repo = InMemoryUsers::new();
        repo.insert(&user("u1", "jane@example.com")).unwrap();
        repo.update(
            "u1",
            &UserUpdate {
                first_name: "Janet".to_string(),
                last_name: "Roe".to_string(),
                display_name: "JR".to_string(),
            },
        )
        .unwrap();

        let updated = repo.get_by_id("u1").unwrap();
        assert_eq!(updated.first_name, "Janet");
        assert_eq!(updated.display_name, "JR");
        assert_eq!(updated.email, "jane@example.com");
        assert_eq!(updated.hashed_password, "hash");
    }

    #[test]
    fn update_missing_user_is_not_found() {
        let repo = InMemoryUsers::new();
        let err = repo.update("ghost", &UserUpdate::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn courses_round_trip() {
        let repo = InMemoryCourses::new();
        let course = Course {
            id: "c1".to_string(),
            title: "Rust".to_string(),
            description: "Ownership and borrowing".to_string(),
            created_at: Utc::now(),
        };
        repo.insert(&course).unwrap();
        assert_eq!(repo.get_by_id("c1").unwrap(), course);
        assert!(repo.get_by_id("c2").unwrap_err().is_not_found());
        assert!(matches!(
            repo.insert(&course).unwrap_err(),
            StorageError::AlreadyExists(_)
        ));
    }
}
