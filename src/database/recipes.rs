// ABOUTME: Aggregate repository for recipes with their steps, ingredient links, and categories
// ABOUTME: Handles transactional multi-entity writes and the listing filter/sort pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

//! Recipe aggregate repository
//!
//! A recipe and its owned collections are one consistency unit: creation
//! and update run inside a single transaction, so a failure anywhere
//! leaves nothing persisted. Update semantics are deliberately asymmetric
//! and must stay that way:
//!
//! - `steps` / `ingredients` supplied: destructive replace (delete all,
//!   recreate from the supplied set)
//! - `categories` supplied: reconcile to exactly the supplied id set by
//!   adding and removing only the delta

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::database::transactions::SqliteTransactionGuard;
use crate::database::users::{parse_datetime, parse_uuid};
use crate::database::is_unique_violation;
use crate::errors::{AppError, AppResult, ValidationErrors};
use crate::models::{
    Category, Comment, Difficulty, IngredientLink, Photo, Rating, Recipe, RecipeStep,
};
use crate::pagination::{Page, PageRequest};
use crate::projection::{
    average_rating, total_time, PhotoStorage, PhotoView, RecipeDetail, RecipeMetrics,
    RecipeSummary,
};
use crate::utils::slugify;
use crate::visibility::can_view_recipe;

/// Maximum title length accepted at creation and update
const MAX_TITLE_LEN: usize = 150;

/// One step of a create/update payload
#[derive(Debug, Clone)]
pub struct StepInput {
    /// Display order, unique within the payload, >= 1
    pub step_number: i64,
    /// Instruction text
    pub instruction: String,
}

/// One ingredient link of a create/update payload
#[derive(Debug, Clone)]
pub struct IngredientLinkInput {
    /// Catalog ingredient id; must exist
    pub ingredient_id: Uuid,
    /// Amount in `unit`
    pub quantity: Option<f64>,
    /// Measurement unit for this recipe
    pub unit: Option<String>,
    /// Free-form note
    pub note: Option<String>,
}

/// Fields for creating a recipe aggregate
#[derive(Debug)]
pub struct CreateRecipeRequest {
    /// Display title; the slug is derived from it once
    pub title: String,
    /// Optional description
    pub description: Option<String>,
    /// Preparation minutes, >= 0
    pub prep_minutes: Option<i64>,
    /// Cooking minutes, >= 0
    pub cook_minutes: Option<i64>,
    /// Servings, >= 1
    pub servings: Option<i64>,
    /// Difficulty; must be one of easy|medium|hard
    pub difficulty: String,
    /// Public visibility; defaults to true at the route layer
    pub is_public: bool,
    /// Calories, >= 0
    pub calories: Option<i64>,
    /// Ordered steps
    pub steps: Vec<StepInput>,
    /// Ingredient links
    pub ingredients: Vec<IngredientLinkInput>,
    /// Category ids to link
    pub categories: Vec<Uuid>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Default)]
pub struct UpdateRecipeRequest {
    /// New title; does NOT regenerate the slug
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
    pub steps: Option<Vec<StepInput>>,
    /// Full replacement ingredient link set
    pub ingredients: Option<Vec<IngredientLinkInput>>,
    /// Exact category id set to reconcile to
    pub categories: Option<Vec<Uuid>>,
}

/// Filters for the public listing pipeline
#[derive(Debug, Default)]
pub struct RecipeFilter {
    /// Case-insensitive substring match on title or description
    pub search: Option<String>,
    /// Difficulty filter; invalid values are ignored, not rejected
    pub difficulty: Option<String>,
    /// Recipe must be linked to this category
    pub category_id: Option<Uuid>,
    /// `prep + cook <= max_time`
    pub max_time: Option<i64>,
    /// Sort field; only {created_at, title, average_rating,
    /// favorites_count} are honored, anything else falls back to the
    /// default `created_at desc`
    pub sort_by: Option<String>,
    /// `asc` or `desc`; default desc
    pub sort_order: Option<String>,
}

enum Bind {
    Text(String),
    Int(i64),
}

/// ORDER BY clause from the allow-listed sort fields
///
/// `average_rating` and `favorites_count` refer to the SELECT aliases of
/// the listing query. Anything outside the allow-list falls back to the
/// default ordering rather than erroring.
fn order_clause(filter: &RecipeFilter) -> String {
    let column = match filter.sort_by.as_deref() {
        Some("title") => "r.title COLLATE NOCASE",
        Some("average_rating") => "average_rating",
        Some("favorites_count") => "favorites_count",
        _ => "r.created_at",
    };
    let direction = match filter.sort_order.as_deref() {
        Some("asc") => "ASC",
        _ => "DESC",
    };
    format!("{column} {direction}")
}

/// Recipe aggregate database operations
pub struct RecipeManager {
    pool: SqlitePool,
    storage: PhotoStorage,
}

impl RecipeManager {
    /// Create a new recipe manager
    #[must_use]
    pub const fn new(pool: SqlitePool, storage: PhotoStorage) -> Self {
        Self { pool, storage }
    }

    /// Create a recipe with its steps, ingredient links, and category links
    /// as one atomic transaction
    ///
    /// The slug is derived from the title; a collision fails the whole
    /// creation (no silent suffixing). Duplicate step numbers in the batch
    /// are rejected before any write.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for field errors, duplicate slug, or unknown
    /// ingredient/category ids; `Database` on persistence failure. On any
    /// error nothing is persisted.
    pub async fn create(&self, owner: Uuid, request: &CreateRecipeRequest) -> AppResult<RecipeDetail> {
        let mut errors = ValidationErrors::new();
        validate_title(Some(request.title.as_str()), true, &mut errors);
        let difficulty =
            validate_difficulty(Some(request.difficulty.as_str()), true, &mut errors);
        validate_numbers(
            request.prep_minutes,
            request.cook_minutes,
            request.servings,
            request.calories,
            &mut errors,
        );
        validate_steps(&request.steps, &mut errors);
        validate_ingredient_links(&request.ingredients, &mut errors);
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }
        let difficulty = difficulty.unwrap_or(Difficulty::Easy);

        let slug = slugify(&request.title);

        let now = Utc::now();
        let recipe_id = Uuid::new_v4();

        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;
        let mut guard = SqliteTransactionGuard::new(tx);

        Self::ensure_catalog_ids(&mut guard, &request.ingredients, &request.categories).await?;

        let slug_taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM recipes WHERE slug = $1)")
                .bind(&slug)
                .fetch_one(guard.executor()?)
                .await
                .map_err(|e| AppError::database(format!("Failed to check slug: {e}")))?;
        if slug_taken {
            return Err(AppError::invalid_field(
                "slug",
                "A recipe with this title already exists",
            ));
        }

        sqlx::query(
            r"
            INSERT INTO recipes (
                id, user_id, title, slug, description, prep_minutes, cook_minutes,
                servings, difficulty, is_public, calories, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            ",
        )
        .bind(recipe_id.to_string())
        .bind(owner.to_string())
        .bind(&request.title)
        .bind(&slug)
        .bind(&request.description)
        .bind(request.prep_minutes)
        .bind(request.cook_minutes)
        .bind(request.servings)
        .bind(difficulty.as_str())
        .bind(request.is_public)
        .bind(request.calories)
        .bind(now.to_rfc3339())
        .execute(guard.executor()?)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::invalid_field("slug", "A recipe with this title already exists")
            } else {
                AppError::database(format!("Failed to create recipe: {e}"))
            }
        })?;

        Self::insert_steps(&mut guard, recipe_id, &request.steps).await?;
        Self::insert_ingredient_links(&mut guard, recipe_id, &request.ingredients).await?;
        for category_id in &request.categories {
            sqlx::query("INSERT INTO recipe_categories (recipe_id, category_id) VALUES ($1, $2)")
                .bind(recipe_id.to_string())
                .bind(category_id.to_string())
                .execute(guard.executor()?)
                .await
                .map_err(|e| AppError::database(format!("Failed to link category: {e}")))?;
        }

        guard.commit().await?;
        tracing::info!(recipe_id = %recipe_id, owner = %owner, slug = %slug, "recipe created");

        let recipe = self
            .get_by_id(recipe_id)
            .await?
            .ok_or_else(|| AppError::internal("Recipe vanished after insert"))?;
        self.load_detail(recipe, Some(owner)).await
    }

    /// Apply a partial update to a recipe aggregate
    ///
    /// Requires ownership. Steps and ingredient links, when supplied, are
    /// destructively replaced; categories are reconciled to exactly the
    /// supplied set. The slug never changes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when absent, `Forbidden` for non-owners,
    /// `Validation` for field errors; on error the transaction is rolled
    /// back entirely.
    pub async fn update(
        &self,
        recipe_id: Uuid,
        actor: Uuid,
        request: &UpdateRecipeRequest,
    ) -> AppResult<RecipeDetail> {
        let current = self
            .get_by_id(recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe"))?;
        crate::visibility::ensure_recipe_owner(&current, actor)?;

        let mut errors = ValidationErrors::new();
        validate_title(request.title.as_deref(), false, &mut errors);
        let difficulty = validate_difficulty(request.difficulty.as_deref(), false, &mut errors);
        validate_numbers(
            request.prep_minutes,
            request.cook_minutes,
            request.servings,
            request.calories,
            &mut errors,
        );
        if let Some(steps) = &request.steps {
            validate_steps(steps, &mut errors);
        }
        if let Some(links) = &request.ingredients {
            validate_ingredient_links(links, &mut errors);
        }
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;
        let mut guard = SqliteTransactionGuard::new(tx);

        let empty_links = Vec::new();
        let empty_categories = Vec::new();
        Self::ensure_catalog_ids(
            &mut guard,
            request.ingredients.as_ref().unwrap_or(&empty_links),
            request.categories.as_ref().unwrap_or(&empty_categories),
        )
        .await?;

        let title = request.title.as_ref().unwrap_or(&current.title);
        let description = request.description.as_ref().or(current.description.as_ref());
        let prep_minutes = request.prep_minutes.or(current.prep_minutes);
        let cook_minutes = request.cook_minutes.or(current.cook_minutes);
        let servings = request.servings.or(current.servings);
        let difficulty = difficulty.unwrap_or(current.difficulty);
        let is_public = request.is_public.unwrap_or(current.is_public);
        let calories = request.calories.or(current.calories);

        sqlx::query(
            r"
            UPDATE recipes SET
                title = $1, description = $2, prep_minutes = $3, cook_minutes = $4,
                servings = $5, difficulty = $6, is_public = $7, calories = $8, updated_at = $9
            WHERE id = $10
            ",
        )
        .bind(title)
        .bind(description)
        .bind(prep_minutes)
        .bind(cook_minutes)
        .bind(servings)
        .bind(difficulty.as_str())
        .bind(is_public)
        .bind(calories)
        .bind(Utc::now().to_rfc3339())
        .bind(recipe_id.to_string())
        .execute(guard.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to update recipe: {e}")))?;

        // Destructive replace for steps and ingredient links
        if let Some(steps) = &request.steps {
            sqlx::query("DELETE FROM recipe_steps WHERE recipe_id = $1")
                .bind(recipe_id.to_string())
                .execute(guard.executor()?)
                .await
                .map_err(|e| AppError::database(format!("Failed to delete steps: {e}")))?;
            Self::insert_steps(&mut guard, recipe_id, steps).await?;
        }

        if let Some(links) = &request.ingredients {
            sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
                .bind(recipe_id.to_string())
                .execute(guard.executor()?)
                .await
                .map_err(|e| AppError::database(format!("Failed to delete ingredient links: {e}")))?;
            Self::insert_ingredient_links(&mut guard, recipe_id, links).await?;
        }

        // Delta reconciliation for categories
        if let Some(target) = &request.categories {
            let rows = sqlx::query("SELECT category_id FROM recipe_categories WHERE recipe_id = $1")
                .bind(recipe_id.to_string())
                .fetch_all(guard.executor()?)
                .await
                .map_err(|e| AppError::database(format!("Failed to load category links: {e}")))?;
            let mut existing = HashSet::new();
            for row in rows {
                existing.insert(parse_uuid(&row, "category_id")?);
            }
            let target_set: HashSet<Uuid> = target.iter().copied().collect();

            for category_id in target_set.difference(&existing) {
                sqlx::query(
                    "INSERT INTO recipe_categories (recipe_id, category_id) VALUES ($1, $2)",
                )
                .bind(recipe_id.to_string())
                .bind(category_id.to_string())
                .execute(guard.executor()?)
                .await
                .map_err(|e| AppError::database(format!("Failed to link category: {e}")))?;
            }
            for category_id in existing.difference(&target_set) {
                sqlx::query(
                    "DELETE FROM recipe_categories WHERE recipe_id = $1 AND category_id = $2",
                )
                .bind(recipe_id.to_string())
                .bind(category_id.to_string())
                .execute(guard.executor()?)
                .await
                .map_err(|e| AppError::database(format!("Failed to unlink category: {e}")))?;
            }
        }

        guard.commit().await?;
        tracing::info!(recipe_id = %recipe_id, actor = %actor, "recipe updated");

        let recipe = self
            .get_by_id(recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe"))?;
        self.load_detail(recipe, Some(actor)).await
    }

    /// Delete a recipe; owned child rows cascade
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when absent, `Forbidden` for non-owners.
    pub async fn delete(&self, recipe_id: Uuid, actor: Uuid) -> AppResult<()> {
        let recipe = self
            .get_by_id(recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe"))?;
        crate::visibility::ensure_recipe_owner(&recipe, actor)?;

        sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete recipe: {e}")))?;
        tracing::info!(recipe_id = %recipe_id, actor = %actor, "recipe deleted");
        Ok(())
    }

    /// Fetch a bare recipe row by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_by_id(&self, recipe_id: Uuid) -> AppResult<Option<Recipe>> {
        let row = sqlx::query(
            "SELECT id, user_id, title, slug, description, prep_minutes, cook_minutes, servings, difficulty, is_public, calories, created_at, updated_at FROM recipes WHERE id = $1",
        )
        .bind(recipe_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get recipe: {e}")))?;
        row.map(|r| row_to_recipe(&r)).transpose()
    }

    /// Load the full aggregate by slug, applying visibility
    ///
    /// A private recipe read by a non-owner is `Ok(None)`, exactly like a
    /// nonexistent slug, so the response cannot confirm its existence.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn get_by_slug(
        &self,
        slug: &str,
        viewer: Option<Uuid>,
    ) -> AppResult<Option<RecipeDetail>> {
        let row = sqlx::query(
            "SELECT id, user_id, title, slug, description, prep_minutes, cook_minutes, servings, difficulty, is_public, calories, created_at, updated_at FROM recipes WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get recipe: {e}")))?;

        let Some(row) = row else { return Ok(None) };
        let recipe = row_to_recipe(&row)?;
        if !can_view_recipe(&recipe, viewer) {
            return Ok(None);
        }
        Ok(Some(self.load_detail(recipe, viewer).await?))
    }

    /// Public listing with the filter/sort pipeline
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn list(
        &self,
        filter: &RecipeFilter,
        page: PageRequest,
        viewer: Option<Uuid>,
    ) -> AppResult<Page<RecipeSummary>> {
        let mut conditions = vec!["r.is_public = 1".to_owned()];
        let mut binds = Vec::new();
        Self::push_filter_conditions(filter, &mut conditions, &mut binds);
        self.fetch_page(&conditions, binds, order_clause(filter), page, viewer)
            .await
    }

    /// All recipes owned by a user, private included, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn list_by_owner(&self, owner: Uuid, page: PageRequest) -> AppResult<Page<RecipeSummary>> {
        let conditions = vec!["r.user_id = ?".to_owned()];
        let binds = vec![Bind::Text(owner.to_string())];
        self.fetch_page(
            &conditions,
            binds,
            "r.created_at DESC".to_owned(),
            page,
            Some(owner),
        )
        .await
    }

    /// Recipes a user has favorited, restricted to ones still visible to them
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn list_favorites(&self, user_id: Uuid, page: PageRequest) -> AppResult<Page<RecipeSummary>> {
        let conditions = vec![
            "EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ?)".to_owned(),
            "(r.is_public = 1 OR r.user_id = ?)".to_owned(),
        ];
        let binds = vec![
            Bind::Text(user_id.to_string()),
            Bind::Text(user_id.to_string()),
        ];
        self.fetch_page(
            &conditions,
            binds,
            "r.created_at DESC".to_owned(),
            page,
            Some(user_id),
        )
        .await
    }

    /// Attach a photo to a recipe
    ///
    /// Requires ownership. A new cover photo demotes the previous cover in
    /// the same transaction, so at most one cover exists per recipe.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when absent, `Forbidden` for non-owners.
    pub async fn add_photo(
        &self,
        recipe_id: Uuid,
        actor: Uuid,
        path: &str,
        is_cover: bool,
    ) -> AppResult<PhotoView> {
        let recipe = self
            .get_by_id(recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe"))?;
        crate::visibility::ensure_recipe_owner(&recipe, actor)?;
        if path.trim().is_empty() {
            return Err(AppError::invalid_field("path", "The path is required"));
        }

        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;
        let mut guard = SqliteTransactionGuard::new(tx);

        if is_cover {
            sqlx::query("UPDATE photos SET is_cover = 0 WHERE recipe_id = $1")
                .bind(recipe_id.to_string())
                .execute(guard.executor()?)
                .await
                .map_err(|e| AppError::database(format!("Failed to demote cover photo: {e}")))?;
        }

        let photo = Photo {
            id: Uuid::new_v4(),
            recipe_id,
            user_id: actor,
            path: path.to_owned(),
            is_cover,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO photos (id, recipe_id, user_id, path, is_cover, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(photo.id.to_string())
        .bind(photo.recipe_id.to_string())
        .bind(photo.user_id.to_string())
        .bind(&photo.path)
        .bind(photo.is_cover)
        .bind(photo.created_at.to_rfc3339())
        .execute(guard.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to add photo: {e}")))?;

        guard.commit().await?;
        Ok(PhotoView::from_photo(&photo, &self.storage))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn push_filter_conditions(
        filter: &RecipeFilter,
        conditions: &mut Vec<String>,
        binds: &mut Vec<Bind>,
    ) {
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            conditions.push("(r.title LIKE ? OR r.description LIKE ?)".to_owned());
            let pattern = format!("%{search}%");
            binds.push(Bind::Text(pattern.clone()));
            binds.push(Bind::Text(pattern));
        }
        // Invalid difficulty values are ignored, not rejected
        if let Some(difficulty) = filter.difficulty.as_deref().and_then(Difficulty::parse) {
            conditions.push("r.difficulty = ?".to_owned());
            binds.push(Bind::Text(difficulty.as_str().to_owned()));
        }
        if let Some(category_id) = filter.category_id {
            conditions.push(
                "EXISTS (SELECT 1 FROM recipe_categories rc WHERE rc.recipe_id = r.id AND rc.category_id = ?)".to_owned(),
            );
            binds.push(Bind::Text(category_id.to_string()));
        }
        if let Some(max_time) = filter.max_time {
            conditions.push(
                "(COALESCE(r.prep_minutes, 0) + COALESCE(r.cook_minutes, 0)) <= ?".to_owned(),
            );
            binds.push(Bind::Int(max_time));
        }
    }

    async fn fetch_page(
        &self,
        conditions: &[String],
        binds: Vec<Bind>,
        order: String,
        page: PageRequest,
        viewer: Option<Uuid>,
    ) -> AppResult<Page<RecipeSummary>> {
        let where_clause = conditions.join(" AND ");

        let count_sql = format!("SELECT COUNT(*) FROM recipes r WHERE {where_clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for bind in &binds {
            count_query = match bind {
                Bind::Text(v) => count_query.bind(v.clone()),
                Bind::Int(v) => count_query.bind(*v),
            };
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count recipes: {e}")))?;

        let list_sql = format!(
            r"
            SELECT r.id, r.user_id, r.title, r.slug, r.description, r.prep_minutes,
                   r.cook_minutes, r.servings, r.difficulty, r.is_public, r.calories,
                   r.created_at, r.updated_at,
                   u.username AS author,
                   (SELECT COALESCE(AVG(rating), 0.0) FROM ratings WHERE recipe_id = r.id) AS average_rating,
                   (SELECT COUNT(*) FROM ratings WHERE recipe_id = r.id) AS ratings_count,
                   (SELECT COUNT(*) FROM favorites WHERE recipe_id = r.id) AS favorites_count,
                   (SELECT COUNT(*) FROM comments WHERE recipe_id = r.id) AS comments_count,
                   (SELECT path FROM photos WHERE recipe_id = r.id AND is_cover = 1 LIMIT 1) AS cover_path
            FROM recipes r
            JOIN users u ON u.id = r.user_id
            WHERE {where_clause}
            ORDER BY {order}
            LIMIT ? OFFSET ?
            "
        );
        let mut list_query = sqlx::query(&list_sql);
        for bind in &binds {
            list_query = match bind {
                Bind::Text(v) => list_query.bind(v.clone()),
                Bind::Int(v) => list_query.bind(*v),
            };
        }
        list_query = list_query.bind(page.limit()).bind(page.offset());

        let rows = list_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list recipes: {e}")))?;

        let mut recipe_ids = Vec::with_capacity(rows.len());
        for row in &rows {
            recipe_ids.push(parse_uuid(row, "id")?);
        }
        let mut categories_map = self.categories_batch(&recipe_ids).await?;
        let favorited = match viewer {
            Some(viewer) => self.favorited_among(viewer, &recipe_ids).await?,
            None => HashSet::new(),
        };

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let recipe = row_to_recipe(&row)?;
            let metrics = RecipeMetrics {
                total_time: total_time(recipe.prep_minutes, recipe.cook_minutes),
                average_rating: row.get("average_rating"),
                ratings_count: row.get("ratings_count"),
                favorites_count: row.get("favorites_count"),
                comments_count: row.get("comments_count"),
                is_favorite: favorited.contains(&recipe.id),
            };
            let cover_path: Option<String> = row.get("cover_path");
            items.push(RecipeSummary {
                categories: categories_map.remove(&recipe.id).unwrap_or_default(),
                author: row.get("author"),
                cover_url: cover_path.map(|p| self.storage.url(&p)),
                recipe,
                metrics,
            });
        }

        Ok(Page::new(items, total, page))
    }

    /// Batch fetch category links for a page of recipes (2 queries, no N+1)
    async fn categories_batch(
        &self,
        recipe_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<Category>>> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders = vec!["?"; recipe_ids.len()].join(", ");
        let sql = format!(
            r"
            SELECT rc.recipe_id, c.id, c.name, c.slug, c.created_at, c.updated_at
            FROM recipe_categories rc
            JOIN categories c ON c.id = rc.category_id
            WHERE rc.recipe_id IN ({placeholders})
            ORDER BY c.name
            "
        );
        let mut query = sqlx::query(&sql);
        for id in recipe_ids {
            query = query.bind(id.to_string());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to batch fetch categories: {e}")))?;

        let mut map: HashMap<Uuid, Vec<Category>> = HashMap::with_capacity(recipe_ids.len());
        for row in rows {
            let recipe_id = parse_uuid(&row, "recipe_id")?;
            map.entry(recipe_id).or_default().push(row_to_category(&row)?);
        }
        Ok(map)
    }

    /// Which of the given recipes the viewer has favorited
    async fn favorited_among(&self, viewer: Uuid, recipe_ids: &[Uuid]) -> AppResult<HashSet<Uuid>> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let placeholders = vec!["?"; recipe_ids.len()].join(", ");
        let sql = format!(
            "SELECT recipe_id FROM favorites WHERE user_id = ? AND recipe_id IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql).bind(viewer.to_string());
        for id in recipe_ids {
            query = query.bind(id.to_string());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to fetch favorites: {e}")))?;
        let mut set = HashSet::with_capacity(rows.len());
        for row in rows {
            set.insert(parse_uuid(&row, "recipe_id")?);
        }
        Ok(set)
    }

    /// Assemble the full aggregate for a recipe the viewer may read
    async fn load_detail(&self, recipe: Recipe, viewer: Option<Uuid>) -> AppResult<RecipeDetail> {
        let recipe_id_str = recipe.id.to_string();

        let author: String = sqlx::query_scalar("SELECT username FROM users WHERE id = $1")
            .bind(recipe.user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get author: {e}")))?;

        let step_rows = sqlx::query(
            "SELECT id, recipe_id, step_number, instruction FROM recipe_steps WHERE recipe_id = $1 ORDER BY step_number",
        )
        .bind(&recipe_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get steps: {e}")))?;
        let mut steps = Vec::with_capacity(step_rows.len());
        for row in step_rows {
            steps.push(RecipeStep {
                id: parse_uuid(&row, "id")?,
                recipe_id: parse_uuid(&row, "recipe_id")?,
                step_number: row.get("step_number"),
                instruction: row.get("instruction"),
            });
        }

        let link_rows = sqlx::query(
            r"
            SELECT ri.ingredient_id, i.name, ri.quantity, ri.unit, ri.note
            FROM recipe_ingredients ri
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = $1
            ORDER BY ri.sort_order
            ",
        )
        .bind(&recipe_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get ingredient links: {e}")))?;
        let mut ingredients = Vec::with_capacity(link_rows.len());
        for row in link_rows {
            ingredients.push(IngredientLink {
                ingredient_id: parse_uuid(&row, "ingredient_id")?,
                name: row.get("name"),
                quantity: row.get("quantity"),
                unit: row.get("unit"),
                note: row.get("note"),
            });
        }

        let category_rows = sqlx::query(
            r"
            SELECT c.id, c.name, c.slug, c.created_at, c.updated_at
            FROM recipe_categories rc
            JOIN categories c ON c.id = rc.category_id
            WHERE rc.recipe_id = $1
            ORDER BY c.name
            ",
        )
        .bind(&recipe_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get categories: {e}")))?;
        let mut categories = Vec::with_capacity(category_rows.len());
        for row in category_rows {
            categories.push(row_to_category(&row)?);
        }

        let photo_rows = sqlx::query(
            "SELECT id, recipe_id, user_id, path, is_cover, created_at FROM photos WHERE recipe_id = $1 ORDER BY is_cover DESC, created_at",
        )
        .bind(&recipe_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get photos: {e}")))?;
        let mut photos = Vec::with_capacity(photo_rows.len());
        for row in photo_rows {
            let photo = Photo {
                id: parse_uuid(&row, "id")?,
                recipe_id: parse_uuid(&row, "recipe_id")?,
                user_id: parse_uuid(&row, "user_id")?,
                path: row.get("path"),
                is_cover: row.get("is_cover"),
                created_at: parse_datetime(&row, "created_at")?,
            };
            photos.push(PhotoView::from_photo(&photo, &self.storage));
        }

        let comment_rows = sqlx::query(
            r"
            SELECT c.id, c.recipe_id, c.user_id, u.username AS author, c.content, c.created_at, c.updated_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.recipe_id = $1
            ORDER BY c.created_at DESC
            ",
        )
        .bind(&recipe_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get comments: {e}")))?;
        let mut comments = Vec::with_capacity(comment_rows.len());
        for row in comment_rows {
            comments.push(Comment {
                id: parse_uuid(&row, "id")?,
                recipe_id: parse_uuid(&row, "recipe_id")?,
                user_id: parse_uuid(&row, "user_id")?,
                author: row.get("author"),
                content: row.get("content"),
                created_at: parse_datetime(&row, "created_at")?,
                updated_at: parse_datetime(&row, "updated_at")?,
            });
        }

        let rating_rows = sqlx::query(
            r"
            SELECT rt.id, rt.recipe_id, rt.user_id, u.username AS author, rt.rating, rt.created_at, rt.updated_at
            FROM ratings rt
            JOIN users u ON u.id = rt.user_id
            WHERE rt.recipe_id = $1
            ORDER BY rt.created_at DESC
            ",
        )
        .bind(&recipe_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get ratings: {e}")))?;
        let mut ratings = Vec::with_capacity(rating_rows.len());
        for row in rating_rows {
            ratings.push(Rating {
                id: parse_uuid(&row, "id")?,
                recipe_id: parse_uuid(&row, "recipe_id")?,
                user_id: parse_uuid(&row, "user_id")?,
                author: row.get("author"),
                rating: row.get("rating"),
                created_at: parse_datetime(&row, "created_at")?,
                updated_at: parse_datetime(&row, "updated_at")?,
            });
        }

        let favorites_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE recipe_id = $1")
                .bind(&recipe_id_str)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to count favorites: {e}")))?;

        let is_favorite = match viewer {
            Some(viewer) => {
                sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS (SELECT 1 FROM favorites WHERE user_id = $1 AND recipe_id = $2)",
                )
                .bind(viewer.to_string())
                .bind(&recipe_id_str)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to check favorite: {e}")))?
            }
            None => false,
        };

        let rating_values: Vec<i64> = ratings.iter().map(|r| r.rating).collect();
        let metrics = RecipeMetrics {
            total_time: total_time(recipe.prep_minutes, recipe.cook_minutes),
            average_rating: average_rating(&rating_values),
            ratings_count: ratings.len() as i64,
            favorites_count,
            comments_count: comments.len() as i64,
            is_favorite,
        };

        Ok(RecipeDetail {
            recipe,
            author,
            steps,
            ingredients,
            categories,
            photos,
            comments,
            ratings,
            metrics,
        })
    }

    /// Verify that all referenced ingredient and category ids exist
    async fn ensure_catalog_ids(
        guard: &mut SqliteTransactionGuard<'_>,
        links: &[IngredientLinkInput],
        categories: &[Uuid],
    ) -> AppResult<()> {
        for link in links {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM ingredients WHERE id = $1)")
                    .bind(link.ingredient_id.to_string())
                    .fetch_one(guard.executor()?)
                    .await
                    .map_err(|e| AppError::database(format!("Failed to check ingredient: {e}")))?;
            if !exists {
                return Err(AppError::invalid_field(
                    "ingredients",
                    format!("Unknown ingredient {}", link.ingredient_id),
                ));
            }
        }
        for category_id in categories {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
                    .bind(category_id.to_string())
                    .fetch_one(guard.executor()?)
                    .await
                    .map_err(|e| AppError::database(format!("Failed to check category: {e}")))?;
            if !exists {
                return Err(AppError::invalid_field(
                    "categories",
                    format!("Unknown category {category_id}"),
                ));
            }
        }
        Ok(())
    }

    async fn insert_steps(
        guard: &mut SqliteTransactionGuard<'_>,
        recipe_id: Uuid,
        steps: &[StepInput],
    ) -> AppResult<()> {
        for step in steps {
            sqlx::query(
                "INSERT INTO recipe_steps (id, recipe_id, step_number, instruction) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(recipe_id.to_string())
            .bind(step.step_number)
            .bind(&step.instruction)
            .execute(guard.executor()?)
            .await
            .map_err(|e| AppError::database(format!("Failed to create step: {e}")))?;
        }
        Ok(())
    }

    async fn insert_ingredient_links(
        guard: &mut SqliteTransactionGuard<'_>,
        recipe_id: Uuid,
        links: &[IngredientLinkInput],
    ) -> AppResult<()> {
        for (idx, link) in links.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO recipe_ingredients (id, recipe_id, ingredient_id, quantity, unit, note, sort_order)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(recipe_id.to_string())
            .bind(link.ingredient_id.to_string())
            .bind(link.quantity)
            .bind(&link.unit)
            .bind(&link.note)
            .bind(idx as i64)
            .execute(guard.executor()?)
            .await
            .map_err(|e| AppError::database(format!("Failed to link ingredient: {e}")))?;
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------
// Field validation
// ----------------------------------------------------------------------

fn push_error(errors: &mut ValidationErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_owned()).or_default().push(message.into());
}

fn validate_title(title: Option<&str>, required: bool, errors: &mut ValidationErrors) {
    match title {
        Some(title) => {
            if title.trim().is_empty() {
                push_error(errors, "title", "The title is required");
            } else if title.chars().count() > MAX_TITLE_LEN {
                push_error(
                    errors,
                    "title",
                    format!("The title may not be greater than {MAX_TITLE_LEN} characters"),
                );
            } else if slugify(title).is_empty() {
                push_error(errors, "title", "The title must contain letters or digits");
            }
        }
        None if required => push_error(errors, "title", "The title is required"),
        None => {}
    }
}

fn validate_difficulty(
    difficulty: Option<&str>,
    required: bool,
    errors: &mut ValidationErrors,
) -> Option<Difficulty> {
    match difficulty {
        Some(raw) => {
            let parsed = Difficulty::parse(raw);
            if parsed.is_none() {
                push_error(errors, "difficulty", "The difficulty must be easy, medium, or hard");
            }
            parsed
        }
        None if required => {
            push_error(errors, "difficulty", "The difficulty is required");
            None
        }
        None => None,
    }
}

fn validate_numbers(
    prep_minutes: Option<i64>,
    cook_minutes: Option<i64>,
    servings: Option<i64>,
    calories: Option<i64>,
    errors: &mut ValidationErrors,
) {
    if prep_minutes.is_some_and(|v| v < 0) {
        push_error(errors, "prep_minutes", "The prep minutes must be at least 0");
    }
    if cook_minutes.is_some_and(|v| v < 0) {
        push_error(errors, "cook_minutes", "The cook minutes must be at least 0");
    }
    if servings.is_some_and(|v| v < 1) {
        push_error(errors, "servings", "The servings must be at least 1");
    }
    if calories.is_some_and(|v| v < 0) {
        push_error(errors, "calories", "The calories must be at least 0");
    }
}

fn validate_steps(steps: &[StepInput], errors: &mut ValidationErrors) {
    let mut seen = HashSet::new();
    for step in steps {
        if step.step_number < 1 {
            push_error(errors, "steps", "Each step number must be at least 1");
        }
        if step.instruction.trim().is_empty() {
            push_error(errors, "steps", "Each step requires an instruction");
        }
        if !seen.insert(step.step_number) {
            push_error(
                errors,
                "steps",
                format!("Duplicate step number {}", step.step_number),
            );
        }
    }
}

fn validate_ingredient_links(links: &[IngredientLinkInput], errors: &mut ValidationErrors) {
    for link in links {
        if link.quantity.is_some_and(|q| q < 0.0) {
            push_error(errors, "ingredients", "Quantities must be at least 0");
        }
        if link.unit.as_deref().is_some_and(|u| u.chars().count() > 20) {
            push_error(errors, "ingredients", "Units may not exceed 20 characters");
        }
        if link.note.as_deref().is_some_and(|n| n.chars().count() > 255) {
            push_error(errors, "ingredients", "Notes may not exceed 255 characters");
        }
    }
}

// ----------------------------------------------------------------------
// Row conversion
// ----------------------------------------------------------------------

pub(crate) fn row_to_recipe(row: &SqliteRow) -> AppResult<Recipe> {
    let difficulty_raw: String = row.get("difficulty");
    Ok(Recipe {
        id: parse_uuid(row, "id")?,
        user_id: parse_uuid(row, "user_id")?,
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        prep_minutes: row.get("prep_minutes"),
        cook_minutes: row.get("cook_minutes"),
        servings: row.get("servings"),
        difficulty: Difficulty::parse(&difficulty_raw)
            .ok_or_else(|| AppError::internal(format!("Invalid difficulty: {difficulty_raw}")))?,
        is_public: row.get("is_public"),
        calories: row.get("calories"),
        created_at: parse_datetime(row, "created_at")?,
        updated_at: parse_datetime(row, "updated_at")?,
    })
}

pub(crate) fn row_to_category(row: &SqliteRow) -> AppResult<Category> {
    Ok(Category {
        id: parse_uuid(row, "id")?,
        name: row.get("name"),
        slug: row.get("slug"),
        created_at: parse_datetime(row, "created_at")?,
        updated_at: parse_datetime(row, "updated_at")?,
    })
}
