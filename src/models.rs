// ABOUTME: Plain domain records for users, recipes, and their associations
// ABOUTME: Entities carry no persistence methods; managers own all store access
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

//! Domain models
//!
//! These are the stored shapes. Derived attributes (total time, average
//! rating, favorite status) are never stored here; they are computed in
//! [`crate::projection`] at read time from current association state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Unique login handle
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Bcrypt hash; never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Optional profile text
    pub bio: Option<String>,
    /// Optional avatar URL
    pub avatar_url: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Recipe difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Suitable for beginners
    Easy,
    /// Some technique required
    Medium,
    /// Advanced technique required
    Hard,
}

impl Difficulty {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Parse a storage/query value; unknown values yield `None`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// A recipe row as stored, without its owned collections
#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Display title
    pub title: String,
    /// URL-safe unique slug, derived from the title at creation and
    /// never regenerated by later title edits
    pub slug: String,
    /// Optional description
    pub description: Option<String>,
    /// Preparation time in minutes
    pub prep_minutes: Option<i64>,
    /// Cooking time in minutes
    pub cook_minutes: Option<i64>,
    /// Number of servings
    pub servings: Option<i64>,
    /// Difficulty level
    pub difficulty: Difficulty,
    /// Whether the recipe is readable by everyone
    pub is_public: bool,
    /// Calorie count per serving
    pub calories: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// An ordered instruction belonging to exactly one recipe
#[derive(Debug, Clone, Serialize)]
pub struct RecipeStep {
    /// Unique identifier
    pub id: Uuid,
    /// Parent recipe
    pub recipe_id: Uuid,
    /// Display order, unique within the recipe, starts at 1
    pub step_number: i64,
    /// Instruction text
    pub instruction: String,
}

/// Global catalog ingredient
#[derive(Debug, Clone, Serialize)]
pub struct Ingredient {
    /// Unique identifier
    pub id: Uuid,
    /// Unique name
    pub name: String,
    /// Optional default measurement unit
    pub default_unit: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// A recipe's link to a catalog ingredient, carrying per-recipe payload
#[derive(Debug, Clone, Serialize)]
pub struct IngredientLink {
    /// Catalog ingredient id
    pub ingredient_id: Uuid,
    /// Ingredient name (joined from the catalog for display)
    pub name: String,
    /// Amount in `unit`
    pub quantity: Option<f64>,
    /// Measurement unit for this recipe
    pub unit: Option<String>,
    /// Free-form preparation note
    pub note: Option<String>,
}

/// Global catalog category
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    /// Unique identifier
    pub id: Uuid,
    /// Unique name
    pub name: String,
    /// URL-safe slug derived from the name
    pub slug: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// A user comment on a recipe
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    /// Unique identifier
    pub id: Uuid,
    /// Parent recipe
    pub recipe_id: Uuid,
    /// Author
    pub user_id: Uuid,
    /// Author's username (joined for display)
    pub author: String,
    /// Comment text, 1..=1000 chars
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// A user rating of a recipe; at most one per (recipe, user) pair
#[derive(Debug, Clone, Serialize)]
pub struct Rating {
    /// Unique identifier
    pub id: Uuid,
    /// Rated recipe
    pub recipe_id: Uuid,
    /// Rating author
    pub user_id: Uuid,
    /// Author's username (joined for display)
    pub author: String,
    /// Value in [1, 5]
    pub rating: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// A photo attached to a recipe
#[derive(Debug, Clone, Serialize)]
pub struct Photo {
    /// Unique identifier
    pub id: Uuid,
    /// Parent recipe
    pub recipe_id: Uuid,
    /// Uploading user
    pub user_id: Uuid,
    /// Storage path; mapped to a public URL at read time
    pub path: String,
    /// Whether this is the recipe's cover photo
    pub is_cover: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::Difficulty;

    #[test]
    fn difficulty_round_trips_known_values() {
        for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(Difficulty::parse(d.as_str()), Some(d));
        }
    }

    #[test]
    fn difficulty_rejects_unknown_values() {
        assert_eq!(Difficulty::parse("extreme"), None);
        assert_eq!(Difficulty::parse(""), None);
        assert_eq!(Difficulty::parse("EASY"), None);
    }
}
