// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Course Watch - course tracking API server
//!
//! Users sign up and log in with email and password; every other call
//! carries an HS256 bearer token whose signing key is derived from an
//! operator secret.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token codec, key derivation, authentication and authorization
//! - `service` - Signup, login, profile and course logic
//! - `storage` - User and course repositories (in-memory or redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod state;
pub mod storage;
pub mod tls;
