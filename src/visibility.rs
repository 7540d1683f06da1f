// ABOUTME: Pure visibility and ownership decisions for recipes, comments, and ratings
// ABOUTME: Encodes the public/private read rules and owner/author mutation rules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

//! Visibility & ownership guard
//!
//! Pure decision functions with no side effects. The one deliberate
//! asymmetry: failed *reads* of private recipes (and failed creates of
//! comments/ratings on them) yield `NotFound`, never `Forbidden`, so the
//! response does not confirm that a private recipe exists. Failed
//! *mutations* by an authenticated non-owner yield `Forbidden`.

use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{Comment, Rating, Recipe};

/// Whether a viewer (possibly anonymous) may read a recipe
#[must_use]
pub fn can_view_recipe(recipe: &Recipe, viewer: Option<Uuid>) -> bool {
    recipe.is_public || viewer == Some(recipe.user_id)
}

/// Require read visibility; private + non-owner is indistinguishable from absent
///
/// # Errors
///
/// Returns `NotFound` when the viewer may not read the recipe.
pub fn ensure_recipe_visible(recipe: &Recipe, viewer: Option<Uuid>) -> AppResult<()> {
    if can_view_recipe(recipe, viewer) {
        Ok(())
    } else {
        Err(AppError::not_found("Recipe"))
    }
}

/// Require recipe ownership for write/delete
///
/// # Errors
///
/// Returns `Forbidden` when the actor does not own the recipe.
pub fn ensure_recipe_owner(recipe: &Recipe, actor: Uuid) -> AppResult<()> {
    if recipe.user_id == actor {
        Ok(())
    } else {
        Err(AppError::forbidden("Unauthorized"))
    }
}

/// Require comment authorship for edits
///
/// # Errors
///
/// Returns `Forbidden` when the actor is not the comment author.
pub fn ensure_comment_author(comment: &Comment, actor: Uuid) -> AppResult<()> {
    if comment.user_id == actor {
        Ok(())
    } else {
        Err(AppError::forbidden("Unauthorized"))
    }
}

/// Allow comment deletion by its author or by the recipe owner
///
/// # Errors
///
/// Returns `Forbidden` when the actor is neither.
pub fn ensure_comment_deletable(comment: &Comment, recipe: &Recipe, actor: Uuid) -> AppResult<()> {
    if comment.user_id == actor || recipe.user_id == actor {
        Ok(())
    } else {
        Err(AppError::forbidden("Unauthorized"))
    }
}

/// Require rating authorship for edits and deletes
///
/// # Errors
///
/// Returns `Forbidden` when the actor is not the rating author.
pub fn ensure_rating_author(rating: &Rating, actor: Uuid) -> AppResult<()> {
    if rating.user_id == actor {
        Ok(())
    } else {
        Err(AppError::forbidden("Unauthorized"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::Difficulty;

    fn recipe(owner: Uuid, is_public: bool) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            user_id: owner,
            title: "Test".to_owned(),
            slug: "test".to_owned(),
            description: None,
            prep_minutes: None,
            cook_minutes: None,
            servings: None,
            difficulty: Difficulty::Easy,
            is_public,
            calories: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn comment(recipe_id: Uuid, author: Uuid) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            recipe_id,
            user_id: author,
            author: "someone".to_owned(),
            content: "tasty".to_owned(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn public_recipe_visible_to_everyone() {
        let r = recipe(Uuid::new_v4(), true);
        assert!(can_view_recipe(&r, None));
        assert!(can_view_recipe(&r, Some(Uuid::new_v4())));
    }

    #[test]
    fn private_recipe_visible_only_to_owner() {
        let owner = Uuid::new_v4();
        let r = recipe(owner, false);
        assert!(can_view_recipe(&r, Some(owner)));
        assert!(!can_view_recipe(&r, None));
        assert!(!can_view_recipe(&r, Some(Uuid::new_v4())));
    }

    #[test]
    fn private_read_failure_is_not_found_not_forbidden() {
        let r = recipe(Uuid::new_v4(), false);
        let err = ensure_recipe_visible(&r, Some(Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn mutation_requires_ownership() {
        let owner = Uuid::new_v4();
        let r = recipe(owner, true);
        assert!(ensure_recipe_owner(&r, owner).is_ok());
        let err = ensure_recipe_owner(&r, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn comment_delete_allowed_for_author_and_recipe_owner() {
        let owner = Uuid::new_v4();
        let author = Uuid::new_v4();
        let r = recipe(owner, true);
        let c = comment(r.id, author);
        assert!(ensure_comment_deletable(&c, &r, author).is_ok());
        assert!(ensure_comment_deletable(&c, &r, owner).is_ok());
        assert!(ensure_comment_deletable(&c, &r, Uuid::new_v4()).is_err());
        // Edits stay author-only
        assert!(ensure_comment_author(&c, owner).is_err());
    }
}
