// ABOUTME: Rating routes nested under recipes plus direct rating mutation
// ABOUTME: One rating per user per recipe; a duplicate surfaces as a conflict, never an upsert
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

/// Rating payload for creation and edits
#[derive(Debug, Deserialize)]
pub struct RatingBody {
    /// Value in [1, 5]
    #[serde(default)]
    pub rating: i64,
}

/// Pagination query for rating listings
#[derive(Debug, Default, Deserialize)]
pub struct RatingListQuery {
    /// 1-based page number
    pub page: Option<u32>,
    /// Page size
    pub per_page: Option<u32>,
}

/// Rating routes
pub struct RatingRoutes;

impl RatingRoutes {
    /// Routes under `/recipes/:id/ratings` and `/ratings`
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/recipes/:id/ratings",
                get(Self::index).post(Self::store),
            )
            .route("/recipes/:id/my-rating", get(Self::my_rating))
            .route("/ratings/:id", put(Self::update).delete(Self::destroy))
            .with_state(resources)
    }

    /// GET `/recipes/:id/ratings`
    async fn index(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Query(query): Query<RatingListQuery>,
    ) -> Result<Response, AppError> {
        let viewer = maybe_authenticate(&resources, &headers)?.map(|a| a.user_id);
        let recipe_id = parse_id(&id, "Recipe")?;
        let page = PageRequest::new(query.page, query.per_page, DEFAULT_SOCIAL_PER_PAGE);
        let result = resources.rating_manager.list(recipe_id, viewer, page).await?;
        api_success(&result)
    }

    /// POST `/recipes/:id/ratings`
    async fn store(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(body): Json<RatingBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let recipe_id = parse_id(&id, "Recipe")?;
        let rating = resources
            .rating_manager
            .add(recipe_id, auth.user_id, body.rating)
            .await?;
        api_created("Rating added successfully", &rating)
    }

    /// GET `/recipes/:id/my-rating`
    async fn my_rating(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let recipe_id = parse_id(&id, "Recipe")?;
        let rating = resources
            .rating_manager
            .get_user_rating(recipe_id, auth.user_id)
            .await?;
        api_success(&rating)
    }

    /// PUT `/ratings/:id`
    async fn update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(body): Json<RatingBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let rating_id = parse_id(&id, "Rating")?;
        let rating = resources
            .rating_manager
            .update(rating_id, auth.user_id, body.rating)
            .await?;
        api_success_message("Rating updated successfully", &rating)
    }

    /// DELETE `/ratings/:id`
    async fn destroy(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let rating_id = parse_id(&id, "Rating")?;
        resources.rating_manager.delete(rating_id, auth.user_id).await?;
        api_message("Rating deleted successfully")
    }
}
