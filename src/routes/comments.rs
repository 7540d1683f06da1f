// ABOUTME: Comment routes nested under recipes plus direct comment mutation
// ABOUTME: Creation and listing respect recipe visibility; deletion allows the recipe owner
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::pagination::{PageRequest, DEFAULT_SOCIAL_PER_PAGE};
use crate::routes::{
    api_created, api_message, api_success, api_success_message, authenticate, maybe_authenticate,
    parse_id, ServerResources,
};

/// Comment payload for creation and edits
#[derive(Debug, Deserialize)]
pub struct CommentBody {
    /// Comment text, 1..=1000 chars
    #[serde(default)]
    pub content: String,
}

/// Pagination query for comment listings
#[derive(Debug, Default, Deserialize)]
pub struct CommentListQuery {
    /// 1-based page number
    pub page: Option<u32>,
    /// Page size
    pub per_page: Option<u32>,
}

/// Comment routes
pub struct CommentRoutes;

impl CommentRoutes {
    /// Routes under `/recipes/:id/comments` and `/comments`
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/recipes/:id/comments",
                get(Self::index).post(Self::store),
            )
            .route(
                "/comments/:id",
                put(Self::update).delete(Self::destroy),
            )
            .with_state(resources)
    }

    /// GET `/recipes/:id/comments`
    async fn index(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Query(query): Query<CommentListQuery>,
    ) -> Result<Response, AppError> {
        let viewer = maybe_authenticate(&resources, &headers)?.map(|a| a.user_id);
        let recipe_id = parse_id(&id, "Recipe")?;
        let page = PageRequest::new(query.page, query.per_page, DEFAULT_SOCIAL_PER_PAGE);
        let result = resources
            .comment_manager
            .list(recipe_id, viewer, page)
            .await?;
        api_success(&result)
    }

    /// POST `/recipes/:id/comments`
    async fn store(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(body): Json<CommentBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let recipe_id = parse_id(&id, "Recipe")?;
        let comment = resources
            .comment_manager
            .add(recipe_id, auth.user_id, &body.content)
            .await?;
        api_created("Comment added successfully", &comment)
    }

    /// PUT `/comments/:id`
    async fn update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(body): Json<CommentBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let comment_id = parse_id(&id, "Comment")?;
        let comment = resources
            .comment_manager
            .update(comment_id, auth.user_id, &body.content)
            .await?;
        api_success_message("Comment updated successfully", &comment)
    }

    /// DELETE `/comments/:id`
    async fn destroy(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let comment_id = parse_id(&id, "Comment")?;
        resources
            .comment_manager
            .delete(comment_id, auth.user_id)
            .await?;
        api_message("Comment deleted successfully")
    }
}
