// ABOUTME: Database operations for comments, ratings, and favorites on recipes
// ABOUTME: One rating per user per recipe is enforced by a store constraint, not check-then-act
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

//! Social interaction managers
//!
//! Every operation first resolves the target recipe and applies the
//! visibility rule: a private recipe of another user behaves exactly like
//! a missing one, including for writes. Comment deletion is allowed for
//! the comment author and for the recipe owner moderating their own page.

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::database::recipes::row_to_recipe;
use crate::database::users::{parse_datetime, parse_uuid};
use crate::database::is_unique_violation;
use crate::errors::{AppError, AppResult};
use crate::models::{Comment, Rating, Recipe};
use crate::pagination::{Page, PageRequest};
use crate::visibility::{
    ensure_comment_author, ensure_comment_deletable, ensure_rating_author, ensure_recipe_visible,
};

/// Maximum comment length
const MAX_COMMENT_LEN: usize = 1000;

/// Comment database operations
pub struct CommentManager {
    pool: SqlitePool,
}

impl CommentManager {
    /// Create a new comment manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a comment to a visible recipe
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing or invisible recipe, `Validation`
    /// for empty or overlong content.
    pub async fn add(&self, recipe_id: Uuid, actor: Uuid, content: &str) -> AppResult<Comment> {
        visible_recipe(&self.pool, recipe_id, Some(actor)).await?;
        validate_content(content)?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO comments (id, recipe_id, user_id, content, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $5)",
        )
        .bind(id.to_string())
        .bind(recipe_id.to_string())
        .bind(actor.to_string())
        .bind(content)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add comment: {e}")))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Comment vanished after insert"))
    }

    /// Edit a comment's content; authors only
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when absent, `Forbidden` for non-authors,
    /// `Validation` for invalid content.
    pub async fn update(&self, comment_id: Uuid, actor: Uuid, content: &str) -> AppResult<Comment> {
        let comment = self
            .get_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))?;
        ensure_comment_author(&comment, actor)?;
        validate_content(content)?;

        sqlx::query("UPDATE comments SET content = $1, updated_at = $2 WHERE id = $3")
            .bind(content)
            .bind(Utc::now().to_rfc3339())
            .bind(comment_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update comment: {e}")))?;

        self.get_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))
    }

    /// Delete a comment; allowed for its author or the recipe owner
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when absent, `Forbidden` for anyone else.
    pub async fn delete(&self, comment_id: Uuid, actor: Uuid) -> AppResult<()> {
        let comment = self
            .get_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))?;
        let recipe = recipe_by_id(&self.pool, comment.recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe"))?;
        ensure_comment_deletable(&comment, &recipe, actor)?;

        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete comment: {e}")))?;
        Ok(())
    }

    /// Comments on a visible recipe, newest first, paginated
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing or invisible recipe.
    pub async fn list(
        &self,
        recipe_id: Uuid,
        viewer: Option<Uuid>,
        page: PageRequest,
    ) -> AppResult<Page<Comment>> {
        visible_recipe(&self.pool, recipe_id, viewer).await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE recipe_id = $1")
            .bind(recipe_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count comments: {e}")))?;

        let rows = sqlx::query(
            r"
            SELECT c.id, c.recipe_id, c.user_id, u.username AS author, c.content, c.created_at, c.updated_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.recipe_id = $1
            ORDER BY c.created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(recipe_id.to_string())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list comments: {e}")))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(row_to_comment(&row)?);
        }
        Ok(Page::new(items, total, page))
    }

    /// Fetch a comment by id with its author's username
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_by_id(&self, comment_id: Uuid) -> AppResult<Option<Comment>> {
        let row = sqlx::query(
            r"
            SELECT c.id, c.recipe_id, c.user_id, u.username AS author, c.content, c.created_at, c.updated_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.id = $1
            ",
        )
        .bind(comment_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get comment: {e}")))?;
        row.map(|r| row_to_comment(&r)).transpose()
    }
}

/// Rating database operations
pub struct RatingManager {
    pool: SqlitePool,
}

impl RatingManager {
    /// Create a new rating manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Rate a visible recipe once
    ///
    /// Uniqueness is enforced by the `(recipe_id, user_id)` constraint, so
    /// two concurrent inserts by the same user cannot both succeed; the
    /// loser surfaces as `Conflict`, never as a silent upsert.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing or invisible recipe, `Validation`
    /// for a value outside 1..=5, `Conflict` when the user already rated.
    pub async fn add(&self, recipe_id: Uuid, actor: Uuid, rating: i64) -> AppResult<Rating> {
        visible_recipe(&self.pool, recipe_id, Some(actor)).await?;
        validate_rating(rating)?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO ratings (id, recipe_id, user_id, rating, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $5)",
        )
        .bind(id.to_string())
        .bind(recipe_id.to_string())
        .bind(actor.to_string())
        .bind(rating)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("You have already rated this recipe")
            } else {
                AppError::database(format!("Failed to add rating: {e}"))
            }
        })?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Rating vanished after insert"))
    }

    /// Change a rating's value; authors only
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when absent, `Forbidden` for non-authors,
    /// `Validation` for a value outside 1..=5.
    pub async fn update(&self, rating_id: Uuid, actor: Uuid, rating: i64) -> AppResult<Rating> {
        let current = self
            .get_by_id(rating_id)
            .await?
            .ok_or_else(|| AppError::not_found("Rating"))?;
        ensure_rating_author(&current, actor)?;
        validate_rating(rating)?;

        sqlx::query("UPDATE ratings SET rating = $1, updated_at = $2 WHERE id = $3")
            .bind(rating)
            .bind(Utc::now().to_rfc3339())
            .bind(rating_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update rating: {e}")))?;

        self.get_by_id(rating_id)
            .await?
            .ok_or_else(|| AppError::not_found("Rating"))
    }

    /// Remove a rating; authors only
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when absent, `Forbidden` for non-authors.
    pub async fn delete(&self, rating_id: Uuid, actor: Uuid) -> AppResult<()> {
        let current = self
            .get_by_id(rating_id)
            .await?
            .ok_or_else(|| AppError::not_found("Rating"))?;
        ensure_rating_author(&current, actor)?;

        sqlx::query("DELETE FROM ratings WHERE id = $1")
            .bind(rating_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete rating: {e}")))?;
        Ok(())
    }

    /// The acting user's own rating of a recipe, if any
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing or invisible recipe.
    pub async fn get_user_rating(
        &self,
        recipe_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Rating>> {
        visible_recipe(&self.pool, recipe_id, Some(user_id)).await?;
        let row = sqlx::query(
            r"
            SELECT rt.id, rt.recipe_id, rt.user_id, u.username AS author, rt.rating, rt.created_at, rt.updated_at
            FROM ratings rt
            JOIN users u ON u.id = rt.user_id
            WHERE rt.recipe_id = $1 AND rt.user_id = $2
            ",
        )
        .bind(recipe_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get rating: {e}")))?;
        row.map(|r| row_to_rating(&r)).transpose()
    }

    /// Ratings of a visible recipe, newest first, paginated
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing or invisible recipe.
    pub async fn list(
        &self,
        recipe_id: Uuid,
        viewer: Option<Uuid>,
        page: PageRequest,
    ) -> AppResult<Page<Rating>> {
        visible_recipe(&self.pool, recipe_id, viewer).await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ratings WHERE recipe_id = $1")
            .bind(recipe_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count ratings: {e}")))?;

        let rows = sqlx::query(
            r"
            SELECT rt.id, rt.recipe_id, rt.user_id, u.username AS author, rt.rating, rt.created_at, rt.updated_at
            FROM ratings rt
            JOIN users u ON u.id = rt.user_id
            WHERE rt.recipe_id = $1
            ORDER BY rt.created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(recipe_id.to_string())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list ratings: {e}")))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(row_to_rating(&row)?);
        }
        Ok(Page::new(items, total, page))
    }

    /// Fetch a rating by id with its author's username
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_by_id(&self, rating_id: Uuid) -> AppResult<Option<Rating>> {
        let row = sqlx::query(
            r"
            SELECT rt.id, rt.recipe_id, rt.user_id, u.username AS author, rt.rating, rt.created_at, rt.updated_at
            FROM ratings rt
            JOIN users u ON u.id = rt.user_id
            WHERE rt.id = $1
            ",
        )
        .bind(rating_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get rating: {e}")))?;
        row.map(|r| row_to_rating(&r)).transpose()
    }
}

/// Favorite database operations
pub struct FavoriteManager {
    pool: SqlitePool,
}

impl FavoriteManager {
    /// Create a new favorite manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Toggle a favorite; returns whether the recipe is favorited afterwards
    ///
    /// Toggling twice returns to the starting state.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing or invisible recipe.
    pub async fn toggle(&self, recipe_id: Uuid, actor: Uuid) -> AppResult<bool> {
        visible_recipe(&self.pool, recipe_id, Some(actor)).await?;

        let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(actor.to_string())
            .bind(recipe_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to remove favorite: {e}")))?
            .rows_affected();
        if removed > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO favorites (user_id, recipe_id, created_at) VALUES ($1, $2, $3)")
            .bind(actor.to_string())
            .bind(recipe_id.to_string())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to add favorite: {e}")))?;
        Ok(true)
    }

    /// Whether a user has favorited a recipe
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn is_favorite(&self, recipe_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM favorites WHERE user_id = $1 AND recipe_id = $2)",
        )
        .bind(user_id.to_string())
        .bind(recipe_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to check favorite: {e}")))
    }
}

/// Resolve a recipe and apply visibility; invisible behaves like missing
async fn visible_recipe(
    pool: &SqlitePool,
    recipe_id: Uuid,
    viewer: Option<Uuid>,
) -> AppResult<Recipe> {
    let recipe = recipe_by_id(pool, recipe_id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe"))?;
    ensure_recipe_visible(&recipe, viewer)?;
    Ok(recipe)
}

async fn recipe_by_id(pool: &SqlitePool, recipe_id: Uuid) -> AppResult<Option<Recipe>> {
    let row = sqlx::query(
        "SELECT id, user_id, title, slug, description, prep_minutes, cook_minutes, servings, difficulty, is_public, calories, created_at, updated_at FROM recipes WHERE id = $1",
    )
    .bind(recipe_id.to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::database(format!("Failed to get recipe: {e}")))?;
    row.map(|r| row_to_recipe(&r)).transpose()
}

fn validate_content(content: &str) -> AppResult<()> {
    if content.trim().is_empty() {
        return Err(AppError::invalid_field("content", "The content is required"));
    }
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::invalid_field(
            "content",
            format!("The content may not be greater than {MAX_COMMENT_LEN} characters"),
        ));
    }
    Ok(())
}

fn validate_rating(rating: i64) -> AppResult<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::invalid_field(
            "rating",
            "The rating must be between 1 and 5",
        ))
    }
}

fn row_to_comment(row: &SqliteRow) -> AppResult<Comment> {
    Ok(Comment {
        id: parse_uuid(row, "id")?,
        recipe_id: parse_uuid(row, "recipe_id")?,
        user_id: parse_uuid(row, "user_id")?,
        author: row.get("author"),
        content: row.get("content"),
        created_at: parse_datetime(row, "created_at")?,
        updated_at: parse_datetime(row, "updated_at")?,
    })
}

fn row_to_rating(row: &SqliteRow) -> AppResult<Rating> {
    Ok(Rating {
        id: parse_uuid(row, "id")?,
        recipe_id: parse_uuid(row, "recipe_id")?,
        user_id: parse_uuid(row, "user_id")?,
        author: row.get("author"),
        rating: row.get("rating"),
        created_at: parse_datetime(row, "created_at")?,
        updated_at: parse_datetime(row, "updated_at")?,
    })
}
