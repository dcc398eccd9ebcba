// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded user/course database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized User (JSON bytes)
//! - `user_emails`: email → user_id
//! - `courses`: course_id → serialized Course (JSON bytes)

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;

use super::{CourseRepository, StorageError, StorageResult, UserRepository};
use crate::models::{Course, User, UserUpdate};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: user_id → serialized User (JSON bytes).
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Unique index: email → user_id.
const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// Primary table: course_id → serialized Course (JSON bytes).
const COURSES: TableDefinition<&str, &[u8]> = TableDefinition::new("courses");

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

// =============================================================================
// RedbStore
// =============================================================================

/// Embedded ACID store implementing both repositories.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAILS)?;
            let _ = write_txn.open_table(COURSES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

impl UserRepository for RedbStore {
    fn get_by_id(&self, id: &str) -> StorageResult<User> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(value) => decode(value.value()),
            None => Err(StorageError::NotFound(format!("user {id}"))),
        }
    }

    fn get_by_email(&self, email: &str) -> StorageResult<User> {
        let read_txn = self.db.begin_read()?;
        let emails = read_txn.open_table(USER_EMAILS)?;
        let users = read_txn.open_table(USERS)?;

        let Some(id) = emails.get(email)? else {
            return Err(StorageError::NotFound(format!("user with email {email}")));
        };
        match users.get(id.value())? {
            Some(value) => decode(value.value()),
            None => Err(StorageError::NotFound(format!("user with email {email}"))),
        }
    }

    fn insert(&self, user: &User) -> StorageResult<()> {
        let json = serde_json::to_vec(user)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            let mut emails = write_txn.open_table(USER_EMAILS)?;

            if users.get(user.id.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!("user {}", user.id)));
            }
            if emails.get(user.email.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "user with email {}",
                    user.email
                )));
            }

            users.insert(user.id.as_str(), json.as_slice())?;
            emails.insert(user.email.as_str(), user.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn update(&self, id: &str, update: &UserUpdate) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;

            let mut user: User = match users.get(id)? {
                Some(value) => decode(value.value())?,
                None => return Err(StorageError::NotFound(format!("user {id}"))),
            };
            user.first_name = update.first_name.clone();
            user.last_name = update.last_name.clone();
            user.display_name = update.display_name.clone();

            let json = serde_json::to_vec(&user)?;
            users.insert(id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl CourseRepository for RedbStore {
    fn get_by_id(&self, id: &str) -> StorageResult<Course> {
        let read_txn = self.db.begin_read()?;
        let courses = read_txn.open_table(COURSES)?;
        match courses.get(id)? {
            Some(value) => decode(value.value()),
            None => Err(StorageError::NotFound(format!("course {id}"))),
        }
    }

    fn insert(&self, course: &Course) -> StorageResult<()> {
        let json = serde_json::to_vec(course)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut courses = write_txn.open_table(COURSES)?;
            if courses.get(course.id.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!("course {}", course.id)));
            }
            courses.insert(course.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
