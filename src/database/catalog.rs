// ABOUTME: Database operations for the shared category and ingredient catalogs
// ABOUTME: Enforces name uniqueness and blocks deletion while recipes still reference an entry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

//! Catalog managers
//!
//! Categories and ingredients are shared vocabulary, not owned by any
//! recipe. Reads are public; mutations require authentication at the route
//! layer. An entry referenced by at least one recipe cannot be deleted.

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::database::recipes::row_to_category;
use crate::database::users::{parse_datetime, parse_uuid};
use crate::database::is_unique_violation;
use crate::errors::{AppError, AppResult};
use crate::models::{Category, Ingredient};
use crate::pagination::{Page, PageRequest};
use crate::utils::slugify;

/// Maximum name length for catalog entries
const MAX_NAME_LEN: usize = 100;

/// Number of matches returned by the quick ingredient search
const SEARCH_LIMIT: i64 = 10;

/// Category listing entry with usage counts
#[derive(Debug, serde::Serialize)]
pub struct CategoryWithCounts {
    /// The category itself
    #[serde(flatten)]
    pub category: Category,
    /// Recipes linked to this category, any visibility
    pub recipes_count: i64,
    /// Public recipes linked to this category
    pub public_recipes_count: i64,
}

/// Category database operations
pub struct CategoryManager {
    pool: SqlitePool,
}

impl CategoryManager {
    /// Create a new category manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a category; the slug is derived from the name
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty/overlong name or a duplicate
    /// name/slug.
    pub async fn create(&self, name: &str) -> AppResult<Category> {
        validate_name(name)?;
        let now = Utc::now();
        let id = Uuid::new_v4();
        let slug = slugify(name);

        sqlx::query(
            "INSERT INTO categories (id, name, slug, created_at, updated_at) VALUES ($1, $2, $3, $4, $4)",
        )
        .bind(id.to_string())
        .bind(name)
        .bind(&slug)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_name_unique_violation(&e, "Failed to create category"))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Category vanished after insert"))
    }

    /// Rename a category; the slug follows the new name
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when absent, `Validation` for an invalid or
    /// duplicate name.
    pub async fn update(&self, id: Uuid, name: &str) -> AppResult<Category> {
        validate_name(name)?;
        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))?;

        sqlx::query("UPDATE categories SET name = $1, slug = $2, updated_at = $3 WHERE id = $4")
            .bind(name)
            .bind(slugify(name))
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_name_unique_violation(&e, "Failed to update category"))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))
    }

    /// Delete a category unless any recipe still links to it
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when absent, `Conflict` while referenced.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))?;

        let references: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM recipe_categories WHERE category_id = $1")
                .bind(id.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to count references: {e}")))?;
        if references > 0 {
            return Err(AppError::conflict(
                "Cannot delete a category that is in use by recipes",
            ));
        }

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete category: {e}")))?;
        Ok(())
    }

    /// Fetch a category by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Category>> {
        let row = sqlx::query(
            "SELECT id, name, slug, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get category: {e}")))?;
        row.map(|r| row_to_category(&r)).transpose()
    }

    /// All categories ordered by name, with usage counts
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> AppResult<Vec<CategoryWithCounts>> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.name, c.slug, c.created_at, c.updated_at,
                   (SELECT COUNT(*) FROM recipe_categories rc WHERE rc.category_id = c.id) AS recipes_count,
                   (SELECT COUNT(*) FROM recipe_categories rc
                    JOIN recipes r ON r.id = rc.recipe_id
                    WHERE rc.category_id = c.id AND r.is_public = 1) AS public_recipes_count
            FROM categories c
            ORDER BY c.name
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list categories: {e}")))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(CategoryWithCounts {
                category: row_to_category(&row)?,
                recipes_count: row.get("recipes_count"),
                public_recipes_count: row.get("public_recipes_count"),
            });
        }
        Ok(items)
    }
}

/// Ingredient database operations
pub struct IngredientManager {
    pool: SqlitePool,
}

impl IngredientManager {
    /// Create a new ingredient manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an ingredient
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an invalid or duplicate name.
    pub async fn create(&self, name: &str, default_unit: Option<&str>) -> AppResult<Ingredient> {
        validate_name(name)?;
        let now = Utc::now();
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO ingredients (id, name, default_unit, created_at, updated_at) VALUES ($1, $2, $3, $4, $4)",
        )
        .bind(id.to_string())
        .bind(name)
        .bind(default_unit)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_name_unique_violation(&e, "Failed to create ingredient"))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Ingredient vanished after insert"))
    }

    /// Update an ingredient's name and default unit
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when absent, `Validation` for an invalid or
    /// duplicate name.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        default_unit: Option<&str>,
    ) -> AppResult<Ingredient> {
        let current = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Ingredient"))?;
        if let Some(name) = name {
            validate_name(name)?;
        }

        let name = name.unwrap_or(&current.name);
        let default_unit = default_unit.or(current.default_unit.as_deref());

        sqlx::query(
            "UPDATE ingredients SET name = $1, default_unit = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(name)
        .bind(default_unit)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| map_name_unique_violation(&e, "Failed to update ingredient"))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Ingredient"))
    }

    /// Delete an ingredient unless any recipe still links to it
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when absent, `Conflict` while referenced.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Ingredient"))?;

        let references: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM recipe_ingredients WHERE ingredient_id = $1")
                .bind(id.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to count references: {e}")))?;
        if references > 0 {
            return Err(AppError::conflict(
                "Cannot delete an ingredient that is in use by recipes",
            ));
        }

        sqlx::query("DELETE FROM ingredients WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete ingredient: {e}")))?;
        Ok(())
    }

    /// Fetch an ingredient by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Ingredient>> {
        let row = sqlx::query(
            "SELECT id, name, default_unit, created_at, updated_at FROM ingredients WHERE id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get ingredient: {e}")))?;
        row.map(|r| row_to_ingredient(&r)).transpose()
    }

    /// Paginated ingredient listing ordered by name, with optional
    /// case-insensitive name filter
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn list(&self, search: Option<&str>, page: PageRequest) -> AppResult<Page<Ingredient>> {
        let pattern = search
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let total: i64 = match &pattern {
            Some(pattern) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM ingredients WHERE name LIKE $1")
                    .bind(pattern)
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM ingredients")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(|e| AppError::database(format!("Failed to count ingredients: {e}")))?;

        let rows = match &pattern {
            Some(pattern) => {
                sqlx::query(
                    "SELECT id, name, default_unit, created_at, updated_at FROM ingredients WHERE name LIKE $1 ORDER BY name LIMIT $2 OFFSET $3",
                )
                .bind(pattern)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, name, default_unit, created_at, updated_at FROM ingredients ORDER BY name LIMIT $1 OFFSET $2",
                )
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| AppError::database(format!("Failed to list ingredients: {e}")))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(row_to_ingredient(&row)?);
        }
        Ok(Page::new(items, total, page))
    }

    /// Quick typeahead search, capped at 10 matches
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn search(&self, term: &str) -> AppResult<Vec<Ingredient>> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            "SELECT id, name, default_unit, created_at, updated_at FROM ingredients WHERE name LIKE $1 ORDER BY name LIMIT $2",
        )
        .bind(format!("%{term}%"))
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to search ingredients: {e}")))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(row_to_ingredient(&row)?);
        }
        Ok(items)
    }
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::invalid_field("name", "The name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::invalid_field(
            "name",
            format!("The name may not be greater than {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(())
}

fn map_name_unique_violation(err: &sqlx::Error, context: &str) -> AppError {
    if is_unique_violation(err) {
        AppError::invalid_field("name", "The name has already been taken")
    } else {
        AppError::database(format!("{context}: {err}"))
    }
}

fn row_to_ingredient(row: &SqliteRow) -> AppResult<Ingredient> {
    Ok(Ingredient {
        id: parse_uuid(row, "id")?,
        name: row.get("name"),
        default_unit: row.get("default_unit"),
        created_at: parse_datetime(row, "created_at")?,
        updated_at: parse_datetime(row, "updated_at")?,
    })
}
