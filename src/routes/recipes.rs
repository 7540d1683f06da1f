// ABOUTME: Recipe routes for the aggregate lifecycle, listing pipeline, and favorites
// ABOUTME: Detail reads go by slug; mutations go by id and require ownership
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::recipes::{
    CreateRecipeRequest, IngredientLinkInput, RecipeFilter, StepInput, UpdateRecipeRequest,
};
use crate::errors::AppError;
use crate::pagination::{PageRequest, DEFAULT_RECIPES_PER_PAGE};
use crate::routes::{
    api_created, api_message, api_success, api_success_message, authenticate, maybe_authenticate,
    parse_id, ServerResources,
};

/// Query parameters for recipe listings
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    /// Substring match on title or description
    pub search: Option<String>,
    /// Difficulty filter; invalid values are ignored
    pub difficulty: Option<String>,
    /// Category filter
    pub category_id: Option<String>,
    /// Upper bound on `prep + cook` minutes
    pub max_time: Option<i64>,
    /// Sort field
    pub sort_by: Option<String>,
    /// Sort direction, `asc` or `desc`
    pub sort_order: Option<String>,
    /// 1-based page number
    pub page: Option<u32>,
    /// Page size
    pub per_page: Option<u32>,
}

/// One step in a recipe payload
#[derive(Debug, Deserialize)]
pub struct StepBody {
    /// Display order, unique within the payload
    pub step_number: i64,
    /// Instruction text
    #[serde(default)]
    pub instruction: String,
}

/// One ingredient link in a recipe payload
#[derive(Debug, Deserialize)]
pub struct IngredientLinkBody {
    /// Catalog ingredient id
    pub ingredient_id: Uuid,
    /// Amount in `unit`
    pub quantity: Option<f64>,
    /// Measurement unit
    pub unit: Option<String>,
    /// Free-form note
    pub note: Option<String>,
}

/// Recipe creation payload
#[derive(Debug, Deserialize)]
pub struct CreateRecipeBody {
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
    /// Optional description
    pub description: Option<String>,
    /// Preparation minutes
    pub prep_minutes: Option<i64>,
    /// Cooking minutes
    pub cook_minutes: Option<i64>,
    /// Servings
    pub servings: Option<i64>,
    /// Difficulty, one of easy|medium|hard
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Public visibility; defaults to true
    pub is_public: Option<bool>,
    /// Calories
    pub calories: Option<i64>,
    /// Ordered steps
    #[serde(default)]
    pub steps: Vec<StepBody>,
    /// Ingredient links
    #[serde(default)]
    pub ingredients: Vec<IngredientLinkBody>,
    /// Category ids to link
    #[serde(default)]
    pub categories: Vec<Uuid>,
}

/// Recipe update payload; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecipeBody {
    /// New title; the slug is not regenerated
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New preparation minutes
    pub prep_minutes: Option<i64>,
    /// New cooking minutes
    pub cook_minutes: Option<i64>,
    /// New servings
    pub servings: Option<i64>,
    /// New difficulty
    pub difficulty: Option<String>,
    /// New visibility
    pub is_public: Option<bool>,
    /// New calories
    pub calories: Option<i64>,
    /// Full replacement step set
    pub steps: Option<Vec<StepBody>>,
    /// Full replacement ingredient link set
    pub ingredients: Option<Vec<IngredientLinkBody>>,
    /// Exact category id set
    pub categories: Option<Vec<Uuid>>,
}

/// Photo attachment payload
#[derive(Debug, Deserialize)]
pub struct AddPhotoBody {
    /// Storage path of the uploaded file
    #[serde(default)]
    pub path: String,
    /// Whether this becomes the cover photo
    #[serde(default)]
    pub is_cover: bool,
}

/// Favorite toggle result
#[derive(Debug, Serialize)]
struct FavoriteState {
    is_favorite: bool,
}

/// Recipe lifecycle and favorites routes
pub struct RecipeRoutes;

impl RecipeRoutes {
    /// Routes under `/recipes`
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/recipes", get(Self::index).post(Self::store))
            .route("/recipes/my-recipes", get(Self::my_recipes))
            .route("/recipes/favorites", get(Self::favorites))
            // GET interprets the captured segment as a slug; PUT/DELETE take
            // the recipe id. All sibling routes must share the param name.
            .route(
                "/recipes/:id",
                get(Self::show).put(Self::update).delete(Self::destroy),
            )
            .route("/recipes/:id/toggle-favorite", post(Self::toggle_favorite))
            .route("/recipes/:id/photos", post(Self::add_photo))
            .with_state(resources)
    }

    /// GET `/recipes`
    async fn index(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<RecipeListQuery>,
    ) -> Result<Response, AppError> {
        let viewer = maybe_authenticate(&resources, &headers)?.map(|a| a.user_id);
        let page = PageRequest::new(query.page, query.per_page, DEFAULT_RECIPES_PER_PAGE);
        let filter = filter_from_query(&query);
        let result = resources.recipe_manager.list(&filter, page, viewer).await?;
        api_success(&result)
    }

    /// GET `/recipes/my-recipes`
    async fn my_recipes(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<RecipeListQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let page = PageRequest::new(query.page, query.per_page, DEFAULT_RECIPES_PER_PAGE);
        let result = resources
            .recipe_manager
            .list_by_owner(auth.user_id, page)
            .await?;
        api_success(&result)
    }

    /// GET `/recipes/favorites`
    async fn favorites(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<RecipeListQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let page = PageRequest::new(query.page, query.per_page, DEFAULT_RECIPES_PER_PAGE);
        let result = resources
            .recipe_manager
            .list_favorites(auth.user_id, page)
            .await?;
        api_success(&result)
    }

    /// GET `/recipes/:slug`
    async fn show(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(slug): Path<String>,
    ) -> Result<Response, AppError> {
        let viewer = maybe_authenticate(&resources, &headers)?.map(|a| a.user_id);
        let detail = resources
            .recipe_manager
            .get_by_slug(&slug, viewer)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe"))?;
        api_success(&detail)
    }

    /// POST `/recipes`
    async fn store(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CreateRecipeBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let request = CreateRecipeRequest {
            title: body.title.unwrap_or_default(),
            description: body.description,
            prep_minutes: body.prep_minutes,
            cook_minutes: body.cook_minutes,
            servings: body.servings,
            difficulty: body.difficulty.unwrap_or_default(),
            is_public: body.is_public.unwrap_or(true),
            calories: body.calories,
            steps: steps_from_body(body.steps),
            ingredients: links_from_body(body.ingredients),
            categories: body.categories,
        };
        let detail = resources.recipe_manager.create(auth.user_id, &request).await?;
        api_created("Recipe created successfully", &detail)
    }

    /// PUT `/recipes/:id`
    async fn update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(body): Json<UpdateRecipeBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let recipe_id = parse_id(&id, "Recipe")?;
        let request = UpdateRecipeRequest {
            title: body.title,
            description: body.description,
            prep_minutes: body.prep_minutes,
            cook_minutes: body.cook_minutes,
            servings: body.servings,
            difficulty: body.difficulty,
            is_public: body.is_public,
            calories: body.calories,
            steps: body.steps.map(steps_from_body),
            ingredients: body.ingredients.map(links_from_body),
            categories: body.categories,
        };
        let detail = resources
            .recipe_manager
            .update(recipe_id, auth.user_id, &request)
            .await?;
        api_success_message("Recipe updated successfully", &detail)
    }

    /// DELETE `/recipes/:id`
    async fn destroy(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let recipe_id = parse_id(&id, "Recipe")?;
        resources.recipe_manager.delete(recipe_id, auth.user_id).await?;
        api_message("Recipe deleted successfully")
    }

    /// POST `/recipes/:id/toggle-favorite`
    async fn toggle_favorite(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let recipe_id = parse_id(&id, "Recipe")?;
        let is_favorite = resources
            .favorite_manager
            .toggle(recipe_id, auth.user_id)
            .await?;
        let message = if is_favorite {
            "Recipe added to favorites"
        } else {
            "Recipe removed from favorites"
        };
        api_success_message(message, &FavoriteState { is_favorite })
    }

    /// POST `/recipes/:id/photos`
    async fn add_photo(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(body): Json<AddPhotoBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers)?;
        let recipe_id = parse_id(&id, "Recipe")?;
        let photo = resources
            .recipe_manager
            .add_photo(recipe_id, auth.user_id, &body.path, body.is_cover)
            .await?;
        api_created("Photo added successfully", &photo)
    }
}

fn filter_from_query(query: &RecipeListQuery) -> RecipeFilter {
    RecipeFilter {
        search: query.search.clone(),
        difficulty: query.difficulty.clone(),
        // Malformed ids cannot match anything; treat them as no filter
        category_id: query
            .category_id
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw).ok()),
        max_time: query.max_time,
        sort_by: query.sort_by.clone(),
        sort_order: query.sort_order.clone(),
    }
}

fn steps_from_body(steps: Vec<StepBody>) -> Vec<StepInput> {
    steps
        .into_iter()
        .map(|s| StepInput {
            step_number: s.step_number,
            instruction: s.instruction,
        })
        .collect()
}

fn links_from_body(links: Vec<IngredientLinkBody>) -> Vec<IngredientLinkInput> {
    links
        .into_iter()
        .map(|l| IngredientLinkInput {
            ingredient_id: l.ingredient_id,
            quantity: l.quantity,
            unit: l.unit,
            note: l.note,
        })
        .collect()
}
