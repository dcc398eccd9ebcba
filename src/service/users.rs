// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account lifecycle: signup, login, and profile access.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::{ServiceError, ServiceResult, Validator};
use crate::auth::{
    password::{hash_password, verify_password},
    BearerAuth, Role, UserPrincipal,
};
use crate::models::{
    LoginRequest, LoginResponse, SignupRequest, UpdateUserInfoRequest, User, UserInfoResponse,
    UserUpdate,
};
use crate::storage::{StorageError, UserRepository};

const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_MAX_LEN: usize = 20;

#[derive(Clone)]
pub struct UsersService {
    repo: Arc<dyn UserRepository>,
    auth: BearerAuth,
}

impl UsersService {
    pub fn new(repo: Arc<dyn UserRepository>, auth: BearerAuth) -> Self {
        Self { repo, auth }
    }

    /// Register a new student account.
    pub fn signup(&self, request: SignupRequest) -> ServiceResult<UserInfoResponse> {
        Validator::new()
            .email("email", &request.email)
            .length_between("password", &request.password, PASSWORD_MIN_LEN, PASSWORD_MAX_LEN)
            .not_blank("first_name", &request.first_name)
            .not_blank("last_name", &request.last_name)
            .finish()?;

        match self.repo.get_by_email(&request.email) {
            Ok(_) => return Err(ServiceError::UserAlreadyExists),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let hashed_password =
            hash_password(&request.password).map_err(|e| ServiceError::PasswordHash(e.to_string()))?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            display_name: request.display_name,
            registration_date: Utc::now(),
            hashed_password,
            roles: vec![Role::Student],
        };

        match self.repo.insert(&user) {
            Ok(()) => {}
            Err(StorageError::AlreadyExists(_)) => return Err(ServiceError::UserAlreadyExists),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.id, "user signed up");
        Ok(user.into())
    }

    /// Check credentials and mint an access token.
    pub fn login(&self, request: LoginRequest) -> ServiceResult<LoginResponse> {
        let user = match self.repo.get_by_email(&request.email) {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                tracing::info!("login attempt for unknown email");
                return Err(ServiceError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if user.hashed_password.is_empty() || !verify_password(&request.password, &user.hashed_password) {
            tracing::info!(user_id = %user.id, "login rejected: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let principal = UserPrincipal::new(user.id.clone(), user.roles);
        let access_token = self.auth.generate_token(&principal)?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse {
            user_id: user.id,
            access_token,
            expires_in: self.auth.token_ttl().as_secs(),
        })
    }

    pub fn get_user_info(&self, id: &str) -> ServiceResult<UserInfoResponse> {
        match self.repo.get_by_id(id) {
            Ok(user) => Ok(user.into()),
            Err(e) if e.is_not_found() => Err(ServiceError::NotFound(format!("user {id}"))),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the profile fields; names are required.
    pub fn update_user_info(&self, id: &str, request: UpdateUserInfoRequest) -> ServiceResult<UserInfoResponse> {
        Validator::new()
            .not_blank("first_name", &request.first_name)
            .not_blank("last_name", &request.last_name)
            .finish()?;

        let update = UserUpdate::from(request);
        match self.repo.update(id, &update) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Err(ServiceError::NotFound(format!("user {id}"))),
            Err(e) => return Err(e.into()),
        }
        self.get_user_info(id)
    }
}
