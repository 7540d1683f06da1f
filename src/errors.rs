// ABOUTME: Application error taxonomy with HTTP status mapping for all API failures
// ABOUTME: Provides AppError, AppResult, and the uniform JSON error envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

//! Error handling for the Recetario API
//!
//! All fallible operations return [`AppResult`]. Route handlers surface
//! failures through the uniform envelope `{success, message, errors?}`;
//! errors are never returned as unhandled faults. Validation and
//! authorization failures occur before any mutation begins, so an error
//! response always implies no partial state was persisted.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Convenience alias used throughout the crate
pub type AppResult<T> = Result<T, AppError>;

/// Per-field validation messages, keyed by input field name
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

/// Application error taxonomy
///
/// Each variant maps to exactly one HTTP status category:
///
/// | Variant | Status |
/// |---|---|
/// | `Validation` | 422 |
/// | `AuthRequired` / `AuthInvalid` | 401 |
/// | `Forbidden` | 403 |
/// | `NotFound` | 404 |
/// | `Conflict` | 400 |
/// | `Database` / `Internal` | 500 |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// One or more input fields violate format/range/uniqueness constraints
    #[error("Validation errors")]
    Validation(ValidationErrors),

    /// Credentials missing on a protected operation
    #[error("{0}")]
    AuthRequired(String),

    /// Credentials present but invalid or expired
    #[error("{0}")]
    AuthInvalid(String),

    /// Authenticated actor lacks ownership/authorship for the mutation
    #[error("{0}")]
    Forbidden(String),

    /// Resource absent, or present but not visible to this actor
    #[error("{0} not found")]
    NotFound(String),

    /// Domain-rule violation that is not a field-format issue
    #[error("{0}")]
    Conflict(String),

    /// Persistence layer failure; any in-flight transaction was rolled back
    #[error("Database error: {0}")]
    Database(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation failure with a single offending field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        Self::Validation(errors)
    }

    /// Validation failure with a full per-field error map
    #[must_use]
    pub const fn validation(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }

    /// Missing credentials on a protected operation
    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::AuthRequired(message.into())
    }

    /// Invalid or expired credentials
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::AuthInvalid(message.into())
    }

    /// Ownership/authorship check failed
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Resource absent or not visible to the actor
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Domain-rule conflict (duplicate rating, referenced catalog entry, ...)
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Persistence failure
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Unexpected internal failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status code for this error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AuthRequired(_) | Self::AuthInvalid(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("Serialization failed: {err}"))
    }
}

/// Error body rendered through the uniform envelope
#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<ValidationErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {self}");
        }
        let body = match self {
            Self::Validation(errors) => ErrorEnvelope {
                success: false,
                message: "Validation errors".to_owned(),
                errors: Some(errors),
            },
            // Operator detail stays in the log line above; callers get a
            // generic message so internal state never leaks.
            Self::Database(_) | Self::Internal(_) => ErrorEnvelope {
                success: false,
                message: "Internal server error".to_owned(),
                errors: None,
            },
            other => ErrorEnvelope {
                success: false,
                message: other.to_string(),
                errors: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
