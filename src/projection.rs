// ABOUTME: Read-model projections computed after loading raw aggregates
// ABOUTME: Derived metrics, photo URL mapping, and the recipe response shapes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

//! Derived metrics and read models
//!
//! Nothing here is stored. Every value is recomputed from current
//! association state on each read; staleness is not possible because there
//! is no cache to invalidate. The stored entities in [`crate::models`]
//! stay free of response-shaping concerns.

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Category, Comment, IngredientLink, Photo, Rating, Recipe, RecipeStep};

/// Metrics derived from a recipe's associations at read time
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecipeMetrics {
    /// `prep_minutes + cook_minutes`, missing values treated as 0
    pub total_time: i64,
    /// Arithmetic mean of rating values; 0 when unrated, never null
    pub average_rating: f64,
    /// Number of ratings
    pub ratings_count: i64,
    /// Number of users who favorited this recipe
    pub favorites_count: i64,
    /// Number of comments
    pub comments_count: i64,
    /// Whether the current viewer has favorited this recipe; always false
    /// for anonymous viewers
    pub is_favorite: bool,
}

/// Total time with missing components treated as zero
#[must_use]
pub const fn total_time(prep_minutes: Option<i64>, cook_minutes: Option<i64>) -> i64 {
    let prep = match prep_minutes {
        Some(v) => v,
        None => 0,
    };
    let cook = match cook_minutes {
        Some(v) => v,
        None => 0,
    };
    prep + cook
}

/// Arithmetic mean of rating values; 0.0 for an empty set
#[must_use]
pub fn average_rating(ratings: &[i64]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().sum();
    sum as f64 / ratings.len() as f64
}

/// Maps stored photo paths to publicly resolvable URLs
#[derive(Debug, Clone)]
pub struct PhotoStorage {
    base_url: String,
}

impl PhotoStorage {
    /// Create a mapper rooted at the configured base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Public URL for a stored path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Photo as shaped for responses
#[derive(Debug, Clone, Serialize)]
pub struct PhotoView {
    /// Unique identifier
    pub id: Uuid,
    /// Publicly resolvable URL
    pub url: String,
    /// Whether this is the cover photo
    pub is_cover: bool,
}

impl PhotoView {
    /// Shape a stored photo for a response
    #[must_use]
    pub fn from_photo(photo: &Photo, storage: &PhotoStorage) -> Self {
        Self {
            id: photo.id,
            url: storage.url(&photo.path),
            is_cover: photo.is_cover,
        }
    }
}

/// Listing projection: recipe row plus derived metrics and display extras
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    /// The stored recipe fields
    #[serde(flatten)]
    pub recipe: Recipe,
    /// Owner's username
    pub author: String,
    /// Categories linked to the recipe
    pub categories: Vec<Category>,
    /// Cover photo URL, when one exists
    pub cover_url: Option<String>,
    /// Derived metrics
    #[serde(flatten)]
    pub metrics: RecipeMetrics,
}

/// Full aggregate projection returned by the detail read
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    /// The stored recipe fields
    #[serde(flatten)]
    pub recipe: Recipe,
    /// Owner's username
    pub author: String,
    /// Ordered steps
    pub steps: Vec<RecipeStep>,
    /// Ingredient links with catalog names
    pub ingredients: Vec<IngredientLink>,
    /// Linked categories
    pub categories: Vec<Category>,
    /// Photos with public URLs
    pub photos: Vec<PhotoView>,
    /// Comments, newest first
    pub comments: Vec<Comment>,
    /// Ratings, newest first
    pub ratings: Vec<Rating>,
    /// Derived metrics
    #[serde(flatten)]
    pub metrics: RecipeMetrics,
}
