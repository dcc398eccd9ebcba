// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Repository traits for users and courses, with two backends:
//!
//! - [`memory`]: process-local maps, used when `DATA_DIR` is unset and in tests
//! - [`database`]: embedded redb database under `DATA_DIR`
//!
//! Every lookup reports a missing record as [`StorageError::NotFound`] so
//! callers can tell it apart from real failures.

pub mod database;
pub mod memory;

pub use database::RedbStore;
pub use memory::{InMemoryCourses, InMemoryUsers};

use crate::models::{Course, User, UserUpdate};

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Repository Traits
// =============================================================================

/// User persistence.
pub trait UserRepository: Send + Sync {
    fn get_by_id(&self, id: &str) -> StorageResult<User>;

    /// Exact-match lookup on the email address.
    fn get_by_email(&self, email: &str) -> StorageResult<User>;

    /// Fails with `AlreadyExists` when the id or email is taken.
    fn insert(&self, user: &User) -> StorageResult<()>;

    fn update(&self, id: &str, update: &UserUpdate) -> StorageResult<()>;
}

/// Course persistence.
pub trait CourseRepository: Send + Sync {
    fn get_by_id(&self, id: &str) -> StorageResult<Course>;

    fn insert(&self, course: &Course) -> StorageResult<()>;
}
