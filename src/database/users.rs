// ABOUTME: Database operations for user accounts
// ABOUTME: Handles registration, lookup, profile updates, and password changes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::database::is_unique_violation;
use crate::errors::{AppError, AppResult};
use crate::models::User;

/// Fields for creating a user; the password arrives already hashed
#[derive(Debug)]
pub struct CreateUserRequest {
    /// Display name
    pub name: String,
    /// Unique login handle
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Bcrypt hash of the password
    pub password_hash: String,
    /// Optional profile text
    pub bio: Option<String>,
}

/// Partial profile update; absent fields are left unchanged
#[derive(Debug, Default)]
pub struct UpdateProfileRequest {
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

/// User database operations
pub struct UserManager {
    pool: SqlitePool,
}

impl UserManager {
    /// Create a new user manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user
    ///
    /// Uniqueness of username and email is enforced by the store; a
    /// violation surfaces as a per-field validation error.
    ///
    /// # Errors
    ///
    /// Returns `Validation` on duplicate username/email, `Database` on
    /// other persistence failures.
    pub async fn create(&self, request: &CreateUserRequest) -> AppResult<User> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        sqlx::query(
            r"
            INSERT INTO users (id, name, username, email, password_hash, bio, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            ",
        )
        .bind(id.to_string())
        .bind(&request.name)
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(&request.bio)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_user_unique_violation(&e, "Failed to create user"))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("User vanished after insert"))
    }

    /// Fetch a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, username, email, password_hash, bio, avatar_url, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Fetch a user by username
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, username, email, password_hash, bio, avatar_url, created_at, updated_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Apply a partial profile update
    ///
    /// # Errors
    ///
    /// Returns `Validation` on duplicate username/email, `NotFound` when the
    /// user does not exist.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: &UpdateProfileRequest,
    ) -> AppResult<User> {
        let current = self
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let name = request.name.as_ref().unwrap_or(&current.name);
        let username = request.username.as_ref().unwrap_or(&current.username);
        let email = request.email.as_ref().unwrap_or(&current.email);
        let bio = request.bio.as_ref().or(current.bio.as_ref());
        let avatar_url = request.avatar_url.as_ref().or(current.avatar_url.as_ref());

        sqlx::query(
            r"
            UPDATE users
            SET name = $1, username = $2, email = $3, bio = $4, avatar_url = $5, updated_at = $6
            WHERE id = $7
            ",
        )
        .bind(name)
        .bind(username)
        .bind(email)
        .bind(bio)
        .bind(avatar_url)
        .bind(Utc::now().to_rfc3339())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| map_user_unique_violation(&e, "Failed to update profile"))?;

        self.get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Replace the stored password hash
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
            .bind(password_hash)
            .bind(Utc::now().to_rfc3339())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update password: {e}")))?;
        Ok(())
    }
}

fn map_user_unique_violation(err: &sqlx::Error, context: &str) -> AppError {
    if is_unique_violation(err) {
        let message = err.to_string();
        let field = if message.contains("users.email") {
            "email"
        } else {
            "username"
        };
        AppError::invalid_field(field, format!("The {field} has already been taken"))
    } else {
        AppError::database(format!("{context}: {err}"))
    }
}

pub(crate) fn parse_uuid(row: &SqliteRow, column: &str) -> AppResult<Uuid> {
    let raw: String = row.get(column);
    Uuid::parse_str(&raw).map_err(|e| AppError::internal(format!("Invalid UUID in {column}: {e}")))
}

pub(crate) fn parse_datetime(row: &SqliteRow, column: &str) -> AppResult<DateTime<Utc>> {
    let raw: String = row.get(column);
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::internal(format!("Invalid datetime in {column}: {e}")))
}

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    Ok(User {
        id: parse_uuid(row, "id")?,
        name: row.get("name"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        bio: row.get("bio"),
        avatar_url: row.get("avatar_url"),
        created_at: parse_datetime(row, "created_at")?,
        updated_at: parse_datetime(row, "updated_at")?,
    })
}
