// ABOUTME: Catalog routes for the shared category and ingredient vocabularies
// ABOUTME: Reads are public; mutations require authentication
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
use crate::pagination::{PageRequest, DEFAULT_INGREDIENTS_PER_PAGE};
use crate::routes::{
    api_created, api_message, api_success, api_success_message, authenticate, parse_id,
    ServerResources,
};

/// Category payload
#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    /// Unique display name; the slug is derived from it
    #[serde(default)]
    pub name: String,
}

/// Ingredient payload
#[derive(Debug, Deserialize)]
pub struct IngredientBody {
    /// Unique display name
    pub name: Option<String>,
    /// Optional default measurement unit
    pub default_unit: Option<String>,
}

/// Query for the paginated ingredient listing
#[derive(Debug, Default, Deserialize)]
pub struct IngredientListQuery {
    /// Case-insensitive name filter
    pub search: Option<String>,
    /// 1-based page number
    pub page: Option<u32>,
    /// Page size
    pub per_page: Option<u32>,
}

/// Query for the typeahead search
#[derive(Debug, Default, Deserialize)]
pub struct IngredientSearchQuery {
    /// Search term
    #[serde(default)]
    pub q: String,
}

/// Category and ingredient catalog routes
pub struct CatalogRoutes;

impl CatalogRoutes {
    /// Routes under `/categories` and `/ingredients`
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/categories",
                get(Self::categories_index).post(Self::categories_store),
            )
            .route(
                "/categories/:id",
                get(Self::categories_show)
                    .put(Self::categories_update)
                    .delete(Self::categories_destroy),
            )
            .route(
                "/ingredients",
                get(Self::ingredients_index).post(Self::ingredients_store),
            )
            .route("/ingredients/search", get(Self::ingredients_search))
            .route(
                "/ingredients/:id",
                get(Self::ingredients_show)
                    .put(Self::ingredients_update)
                    .delete(Self::ingredients_destroy),
            )
            .with_state(resources)
    }

    /// GET `/categories`
    async fn categories_index(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let categories = resources.category_manager.list().await?;
        api_success(&categories)
    }

    /// GET `/categories/:id`
    async fn categories_show(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let category_id = parse_id(&id, "Category")?;
        let category = resources
            .category_manager
            .get_by_id(category_id)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))?;
        api_success(&category)
    }

    /// POST `/categories`
    async fn categories_store(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CategoryBody>,
    ) -> Result<Response, AppError> {
        authenticate(&resources, &headers)?;
        let category = resources.category_manager.create(&body.name).await?;
        api_created("Category created successfully", &category)
    }

    /// PUT `/categories/:id`
    async fn categories_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(body): Json<CategoryBody>,
    ) -> Result<Response, AppError> {
        authenticate(&resources, &headers)?;
        let category_id = parse_id(&id, "Category")?;
        let category = resources
            .category_manager
            .update(category_id, &body.name)
            .await?;
        api_success_message("Category updated successfully", &category)
    }

    /// DELETE `/categories/:id`
    async fn categories_destroy(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        authenticate(&resources, &headers)?;
        let category_id = parse_id(&id, "Category")?;
        resources.category_manager.delete(category_id).await?;
        api_message("Category deleted successfully")
    }

    /// GET `/ingredients`
    async fn ingredients_index(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<IngredientListQuery>,
    ) -> Result<Response, AppError> {
        let page = PageRequest::new(query.page, query.per_page, DEFAULT_INGREDIENTS_PER_PAGE);
        let result = resources
            .ingredient_manager
            .list(query.search.as_deref(), page)
            .await?;
        api_success(&result)
    }

    /// GET `/ingredients/search?q=`
    async fn ingredients_search(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<IngredientSearchQuery>,
    ) -> Result<Response, AppError> {
        let matches = resources.ingredient_manager.search(&query.q).await?;
        api_success(&matches)
    }

    /// GET `/ingredients/:id`
    async fn ingredients_show(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let ingredient_id = parse_id(&id, "Ingredient")?;
        let ingredient = resources
            .ingredient_manager
            .get_by_id(ingredient_id)
            .await?
            .ok_or_else(|| AppError::not_found("Ingredient"))?;
        api_success(&ingredient)
    }

    /// POST `/ingredients`
    async fn ingredients_store(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<IngredientBody>,
    ) -> Result<Response, AppError> {
        authenticate(&resources, &headers)?;
        let ingredient = resources
            .ingredient_manager
            .create(
                body.name.as_deref().unwrap_or_default(),
                body.default_unit.as_deref(),
            )
            .await?;
        api_created("Ingredient created successfully", &ingredient)
    }

    /// PUT `/ingredients/:id`
    async fn ingredients_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(body): Json<IngredientBody>,
    ) -> Result<Response, AppError> {
        authenticate(&resources, &headers)?;
        let ingredient_id = parse_id(&id, "Ingredient")?;
        let ingredient = resources
            .ingredient_manager
            .update(
                ingredient_id,
                body.name.as_deref(),
                body.default_unit.as_deref(),
            )
            .await?;
        api_success_message("Ingredient updated successfully", &ingredient)
    }

    /// DELETE `/ingredients/:id`
    async fn ingredients_destroy(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        authenticate(&resources, &headers)?;
        let ingredient_id = parse_id(&id, "Ingredient")?;
        resources.ingredient_manager.delete(ingredient_id).await?;
        api_message("Ingredient deleted successfully")
    }
}
