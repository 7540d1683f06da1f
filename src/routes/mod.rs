// ABOUTME: HTTP route layer shared plumbing and router assembly
// ABOUTME: Owns ServerResources, bearer authentication, and the success envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

//! HTTP routes
//!
//! Every response, success or failure, goes through the same envelope
//! `{success, message?, data?, errors?}`. Handlers return
//! `Result<Response, AppError>`; the error half renders through
//! [`AppError::into_response`]. Authentication is a bearer token in the
//! `Authorization` header; listing and detail reads accept anonymous
//! requests and only use the token, when present, to widen visibility.

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::auth::{AuthManager, AuthResult};
use crate::config::environment::ServerConfig;
use crate::database::{
    CategoryManager, CommentManager, Database, FavoriteManager, IngredientManager, RatingManager,
    RecipeManager, UserManager,
};
use crate::errors::{AppError, AppResult};
use crate::projection::PhotoStorage;

pub mod auth;
pub mod catalog;
pub mod comments;
pub mod ratings;
pub mod recipes;

/// Shared state for all route handlers
pub struct ServerResources {
    /// User accounts
    pub user_manager: UserManager,
    /// Recipe aggregates
    pub recipe_manager: RecipeManager,
    /// Category catalog
    pub category_manager: CategoryManager,
    /// Ingredient catalog
    pub ingredient_manager: IngredientManager,
    /// Comments
    pub comment_manager: CommentManager,
    /// Ratings
    pub rating_manager: RatingManager,
    /// Favorites
    pub favorite_manager: FavoriteManager,
    /// Token issuance and validation
    pub auth_manager: AuthManager,
}

impl ServerResources {
    /// Build managers over the shared pool
    #[must_use]
    pub fn new(database: &Database, config: &ServerConfig) -> Self {
        let pool = database.pool().clone();
        let storage = PhotoStorage::new(config.photo_base_url.clone());
        Self {
            user_manager: UserManager::new(pool.clone()),
            recipe_manager: RecipeManager::new(pool.clone(), storage),
            category_manager: CategoryManager::new(pool.clone()),
            ingredient_manager: IngredientManager::new(pool.clone()),
            comment_manager: CommentManager::new(pool.clone()),
            rating_manager: RatingManager::new(pool.clone()),
            favorite_manager: FavoriteManager::new(pool),
            auth_manager: AuthManager::new(&config.jwt_secret, config.jwt_expiry_hours),
        }
    }
}

/// Assemble the full API router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    let api = Router::new()
        .merge(auth::AuthRoutes::routes(resources.clone()))
        .merge(recipes::RecipeRoutes::routes(resources.clone()))
        .merge(comments::CommentRoutes::routes(resources.clone()))
        .merge(ratings::RatingRoutes::routes(resources.clone()))
        .merge(catalog::CatalogRoutes::routes(resources));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Success body rendered through the uniform envelope
#[derive(Debug, Serialize)]
struct SuccessEnvelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

/// 200 with data
pub(crate) fn api_success<T: Serialize>(data: &T) -> AppResult<Response> {
    envelope(StatusCode::OK, None, Some(data))
}

/// 200 with message and data
pub(crate) fn api_success_message<T: Serialize>(message: &str, data: &T) -> AppResult<Response> {
    envelope(StatusCode::OK, Some(message), Some(data))
}

/// 201 with message and data
pub(crate) fn api_created<T: Serialize>(message: &str, data: &T) -> AppResult<Response> {
    envelope(StatusCode::CREATED, Some(message), Some(data))
}

/// 200 with message only
pub(crate) fn api_message(message: &str) -> AppResult<Response> {
    envelope::<()>(StatusCode::OK, Some(message), None)
}

fn envelope<T: Serialize>(
    status: StatusCode,
    message: Option<&str>,
    data: Option<&T>,
) -> AppResult<Response> {
    let body = SuccessEnvelope {
        success: true,
        message: message.map(ToOwned::to_owned),
        data: data.map(serde_json::to_value).transpose()?,
    };
    Ok((status, Json(body)).into_response())
}

/// Resolve the bearer token; missing or invalid credentials are errors
pub(crate) fn authenticate(
    resources: &ServerResources,
    headers: &HeaderMap,
) -> AppResult<AuthResult> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::auth_required("Authentication required"))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::auth_invalid("Invalid authorization header"))?;
    resources.auth_manager.validate_token(token)
}

/// Resolve the bearer token when present
///
/// A missing header is anonymous; a header that is present but invalid is
/// still an error, so a caller with an expired token learns about it
/// instead of silently losing access to their private recipes.
pub(crate) fn maybe_authenticate(
    resources: &ServerResources,
    headers: &HeaderMap,
) -> AppResult<Option<AuthResult>> {
    if headers.get(header::AUTHORIZATION).is_none() {
        return Ok(None);
    }
    authenticate(resources, headers).map(Some)
}

/// Parse a path id; malformed ids behave like missing resources
pub(crate) fn parse_id(raw: &str, resource: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(resource))
}
