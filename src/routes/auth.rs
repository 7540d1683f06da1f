// ABOUTME: Authentication routes for registration, login, and profile management
// ABOUTME: Issues bearer tokens and guards the current-user operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthManager;
use crate::database::users::{CreateUserRequest, UpdateProfileRequest};
use crate::errors::{AppError, AppResult, ValidationErrors};
use crate::models::User;
use crate::routes::{
    api_created, api_message, api_success, api_success_message, authenticate, ServerResources,
};

/// Minimum accepted password length
const MIN_PASSWORD_LEN: usize = 8;

/// Registration payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Unique login handle
    #[serde(default)]
    pub username: Option<String>,
    /// Unique email address
    #[serde(default)]
    pub email: Option<String>,
    /// Plain password, hashed before storage
    #[serde(default)]
    pub password: Option<String>,
    /// Optional profile text
    #[serde(default)]
    pub bio: Option<String>,
}

/// Login payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login handle
    #[serde(default)]
    pub username: String,
    /// Plain password
    #[serde(default)]
    pub password: String,
}

/// Profile update payload; absent fields are left unchanged
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    /// New display name
    pub name: Option<String>,
    /// New login handle
    pub username: Option<String>,
    /// New email address
    pub email: Option<String>,
    /// New profile text
    pub bio: Option<String>,
    /// New avatar URL
    pub avatar_url: Option<String>,
}

/// Password change payload
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password, verified before the change
    #[serde(default)]
    pub current_password: String,
    /// Replacement password
    #[serde(default)]
    pub new_password: String,
}

/// User plus freshly issued token
#[derive(Debug, Serialize)]
struct AuthSession<'a> {
    user: &'a User,
    token: String,
}

/// Authentication and profile routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Routes under `/auth`
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/auth/register", post(Self::register))
            .route("/auth/login", post(Self::login))
            .route("/auth/me", get(Self::me))
            .route("/auth/profile", put(Self::profile))
            .route("/auth/change-password", put(Self::change_password))
            .route("/auth/logout", post(Self::logout))
            .with_state(resources)
    }

    /// POST `/auth/register`
    async fn register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        validate_registration(&request)?;
        let password = request.password.unwrap_or_default();
        let password_hash = AuthManager::hash_password(password).await?;

        let user = resources
            .user_manager
            .create(&CreateUserRequest {
                name: request.name.unwrap_or_default(),
                username: request.username.unwrap_or_default(),
                email: request.email.unwrap_or_default(),
                password_hash,
                bio: request.bio,
            })
            .await?;

        let token = resources.auth_manager.generate_token(user.id)?;
        api_created("User registered successfully", &AuthSession { user: &user, token })
    }

    /// POST `/auth/login`
    async fn login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        // Missing user and wrong password are indistinguishable to callers
        let user = resources
            .user_manager
            .get_by_username(&request.username)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Invalid credentials"))?;

        let valid =
            AuthManager::verify_password(request.password, user.password_hash.clone()).await?;
        if !valid {
            return Err(AppError::auth_invalid("Invalid credentials"));
        }

        let token = resources.auth_manager.generate_token(user.id)?;
        tracing::info!(user_id = %user.id, "user logged in");
        api_success(&AuthSession { user: &user, token })
    }

    /// GET `/auth/me`
    async fn me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let user = resources
            .user_manager
            .get_by_id(auth.user_id)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Unknown user"))?;
        api_success(&user)
    }

    /// PUT `/auth/profile`
    async fn profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ProfileRequest>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        validate_profile(&request)?;
        let user = resources
            .user_manager
            .update_profile(
                auth.user_id,
                &UpdateProfileRequest {
                    name: request.name,
                    username: request.username,
                    email: request.email,
                    bio: request.bio,
                    avatar_url: request.avatar_url,
                },
            )
            .await?;
        api_success_message("Profile updated successfully", &user)
    }

    /// PUT `/auth/change-password`
    async fn change_password(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ChangePasswordRequest>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let user = resources
            .user_manager
            .get_by_id(auth.user_id)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Unknown user"))?;

        if request.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::invalid_field(
                "new_password",
                format!("The new password must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }

        let valid = AuthManager::verify_password(
            request.current_password,
            user.password_hash.clone(),
        )
        .await?;
        if !valid {
            return Err(AppError::invalid_field(
                "current_password",
                "The current password is incorrect",
            ));
        }

        let password_hash = AuthManager::hash_password(request.new_password).await?;
        resources
            .user_manager
            .update_password(auth.user_id, &password_hash)
            .await?;
        api_message("Password changed successfully")
    }

    /// POST `/auth/logout`
    ///
    /// Tokens are stateless; the client discards its copy.
    async fn logout(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        authenticate(&resources, &headers)?;
        api_message("Logged out successfully")
    }
}

fn push_error(errors: &mut ValidationErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_owned()).or_default().push(message.into());
}

fn validate_registration(request: &RegisterRequest) -> AppResult<()> {
    let mut errors = ValidationErrors::new();

    if request.name.as_deref().is_none_or(|v| v.trim().is_empty()) {
        push_error(&mut errors, "name", "The name is required");
    }
    match request.username.as_deref() {
        Some(username) if !username.trim().is_empty() => {
            if username.chars().count() < 3 || username.chars().count() > 50 {
                push_error(&mut errors, "username", "The username must be 3 to 50 characters");
            }
            if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                push_error(
                    &mut errors,
                    "username",
                    "The username may only contain letters, digits, and underscores",
                );
            }
        }
        _ => push_error(&mut errors, "username", "The username is required"),
    }
    match request.email.as_deref() {
        Some(email) if !email.trim().is_empty() => {
            if !email.contains('@') {
                push_error(&mut errors, "email", "The email must be a valid email address");
            }
        }
        _ => push_error(&mut errors, "email", "The email is required"),
    }
    if request
        .password
        .as_deref()
        .is_none_or(|v| v.chars().count() < MIN_PASSWORD_LEN)
    {
        push_error(
            &mut errors,
            "password",
            format!("The password must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(errors))
    }
}

fn validate_profile(request: &ProfileRequest) -> AppResult<()> {
    let mut errors = ValidationErrors::new();

    if let Some(name) = request.name.as_deref() {
        if name.trim().is_empty() {
            push_error(&mut errors, "name", "The name may not be empty");
        }
    }
    if let Some(username) = request.username.as_deref() {
        if username.chars().count() < 3 || username.chars().count() > 50 {
            push_error(&mut errors, "username", "The username must be 3 to 50 characters");
        } else if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            push_error(
                &mut errors,
                "username",
                "The username may only contain letters, digits, and underscores",
            );
        }
    }
    if let Some(email) = request.email.as_deref() {
        if !email.contains('@') {
            push_error(&mut errors, "email", "The email must be a valid email address");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(errors))
    }
}
