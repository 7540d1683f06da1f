// ABOUTME: Authentication manager for bearer token issuance and validation
// ABOUTME: Handles bcrypt password hashing and JWT encode/decode for request actors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

//! Identity provider
//!
//! Issues an opaque bearer token on register/login and resolves it back to
//! the same actor id on later requests. Tokens are HS256 JWTs; password
//! hashing runs on the blocking pool so bcrypt work never stalls the
//! async runtime.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::task;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Resolved actor for an authenticated request
#[derive(Debug, Clone, Copy)]
pub struct AuthResult {
    /// The authenticated user's id
    pub user_id: Uuid,
}

/// JWT claims carried by issued tokens
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id
    sub: String,
    /// Issued-at (seconds since epoch)
    iat: i64,
    /// Expiry (seconds since epoch)
    exp: i64,
}

/// Token issuance and validation
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl AuthManager {
    /// Create a manager from the configured signing secret
    #[must_use]
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        }
    }

    /// Issue a bearer token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails.
    pub fn generate_token(&self, user_id: Uuid) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))
    }

    /// Resolve a raw token (without the `Bearer ` prefix) to an actor
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` if the token is malformed, tampered with, or
    /// expired.
    pub fn validate_token(&self, token: &str) -> AppResult<AuthResult> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AppError::auth_invalid(format!("Invalid token: {e}")))?;
        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::auth_invalid("Invalid token subject"))?;
        Ok(AuthResult { user_id })
    }

    /// Hash a password on the blocking pool
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails or the blocking task is cancelled.
    pub async fn hash_password(password: String) -> AppResult<String> {
        task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| AppError::internal(format!("Hashing task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
    }

    /// Verify a password against a stored hash on the blocking pool
    ///
    /// # Errors
    ///
    /// Returns an error if verification fails to run; a wrong password is
    /// `Ok(false)`, not an error.
    pub async fn verify_password(password: String, password_hash: String) -> AppResult<bool> {
        task::spawn_blocking(move || bcrypt::verify(&password, &password_hash))
            .await
            .map_err(|e| AppError::internal(format!("Verification task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))
    }
}
