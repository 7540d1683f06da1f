// ABOUTME: Integration tests for the recipe aggregate repository
// ABOUTME: Covers transactional creation, update asymmetry, visibility, and the listing pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{create_test_server_resources, create_test_user};
use recetario::database::recipes::{
    CreateRecipeRequest, IngredientLinkInput, RecipeFilter, StepInput, UpdateRecipeRequest,
};
use recetario::errors::AppError;
use recetario::models::Difficulty;
use recetario::pagination::{PageRequest, DEFAULT_RECIPES_PER_PAGE};
use uuid::Uuid;

fn page() -> PageRequest {
    PageRequest::new(None, None, DEFAULT_RECIPES_PER_PAGE)
}

fn basic_request(title: &str) -> CreateRecipeRequest {
    CreateRecipeRequest {
        title: title.to_owned(),
        description: Some("A test recipe".to_owned()),
        prep_minutes: Some(10),
        cook_minutes: Some(25),
        servings: Some(4),
        difficulty: "medium".to_owned(),
        is_public: true,
        calories: Some(500),
        steps: vec![
            StepInput {
                step_number: 1,
                instruction: "Chop everything".to_owned(),
            },
            StepInput {
                step_number: 2,
                instruction: "Cook it".to_owned(),
            },
        ],
        ingredients: Vec::new(),
        categories: Vec::new(),
    }
}

#[tokio::test]
async fn create_persists_the_whole_aggregate() {
    let resources = create_test_server_resources().await.unwrap();
    let (owner, _) = create_test_user(&resources).await.unwrap();

    let rice = resources
        .ingredient_manager
        .create("Rice", Some("g"))
        .await
        .unwrap();
    let dinner = resources.category_manager.create("Dinner").await.unwrap();

    let mut request = basic_request("My Tasty Paella");
    request.ingredients = vec![IngredientLinkInput {
        ingredient_id: rice.id,
        quantity: Some(400.0),
        unit: Some("g".to_owned()),
        note: Some("bomba if available".to_owned()),
    }];
    request.categories = vec![dinner.id];

    let detail = resources
        .recipe_manager
        .create(owner.id, &request)
        .await
        .unwrap();

    assert_eq!(detail.recipe.slug, "my-tasty-paella");
    assert_eq!(detail.recipe.difficulty, Difficulty::Medium);
    assert_eq!(detail.author, owner.username);
    assert_eq!(detail.steps.len(), 2);
    assert_eq!(detail.steps[0].step_number, 1);
    assert_eq!(detail.ingredients.len(), 1);
    assert_eq!(detail.ingredients[0].name, "Rice");
    assert_eq!(detail.categories.len(), 1);
    assert_eq!(detail.metrics.total_time, 35);
    assert!(detail.metrics.average_rating.abs() < f64::EPSILON);
    assert_eq!(detail.metrics.ratings_count, 0);
}

#[tokio::test]
async fn duplicate_slug_fails_creation() {
    let resources = create_test_server_resources().await.unwrap();
    let (owner, _) = create_test_user(&resources).await.unwrap();
    let (other, _) = create_test_user(&resources).await.unwrap();

    resources
        .recipe_manager
        .create(owner.id, &basic_request("Tortilla de Patatas"))
        .await
        .unwrap();

    // Same slug derives from a differently cased title
    let err = resources
        .recipe_manager
        .create(other.id, &basic_request("Tortilla DE Patatas"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn duplicate_step_numbers_leave_nothing_behind() {
    let resources = create_test_server_resources().await.unwrap();
    let (owner, _) = create_test_user(&resources).await.unwrap();

    let mut request = basic_request("Broken Recipe");
    request.steps = vec![
        StepInput {
            step_number: 1,
            instruction: "First".to_owned(),
        },
        StepInput {
            step_number: 1,
            instruction: "Also first".to_owned(),
        },
    ];

    let err = resources
        .recipe_manager
        .create(owner.id, &request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let listing = resources
        .recipe_manager
        .list(&RecipeFilter::default(), page(), None)
        .await
        .unwrap();
    assert_eq!(listing.total, 0);
}

#[tokio::test]
async fn unknown_catalog_id_rolls_back_creation() {
    let resources = create_test_server_resources().await.unwrap();
    let (owner, _) = create_test_user(&resources).await.unwrap();

    let mut request = basic_request("Phantom Ingredients");
    request.ingredients = vec![IngredientLinkInput {
        ingredient_id: Uuid::new_v4(),
        quantity: None,
        unit: None,
        note: None,
    }];

    let err = resources
        .recipe_manager
        .create(owner.id, &request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let listing = resources
        .recipe_manager
        .list(&RecipeFilter::default(), page(), None)
        .await
        .unwrap();
    assert_eq!(listing.total, 0);
}

#[tokio::test]
async fn update_keeps_slug_replaces_steps_and_reconciles_categories() {
    let resources = create_test_server_resources().await.unwrap();
    let (owner, _) = create_test_user(&resources).await.unwrap();

    let dinner = resources.category_manager.create("Dinner").await.unwrap();
    let lunch = resources.category_manager.create("Lunch").await.unwrap();

    let mut request = basic_request("Original Title");
    request.categories = vec![dinner.id];
    let created = resources
        .recipe_manager
        .create(owner.id, &request)
        .await
        .unwrap();

    let updated = resources
        .recipe_manager
        .update(
            created.recipe.id,
            owner.id,
            &UpdateRecipeRequest {
                title: Some("Renamed Entirely".to_owned()),
                steps: Some(vec![StepInput {
                    step_number: 1,
                    instruction: "One single step now".to_owned(),
                }]),
                categories: Some(vec![lunch.id]),
                ..UpdateRecipeRequest::default()
            },
        )
        .await
        .unwrap();

    // Title changed but the slug never regenerates
    assert_eq!(updated.recipe.title, "Renamed Entirely");
    assert_eq!(updated.recipe.slug, "original-title");
    // Steps were destructively replaced
    assert_eq!(updated.steps.len(), 1);
    assert_eq!(updated.steps[0].instruction, "One single step now");
    // Categories reconciled to exactly the supplied set
    assert_eq!(updated.categories.len(), 1);
    assert_eq!(updated.categories[0].id, lunch.id);
    // Untouched fields survive
    assert_eq!(updated.recipe.servings, Some(4));
}

#[tokio::test]
async fn update_and_delete_require_ownership() {
    let resources = create_test_server_resources().await.unwrap();
    let (owner, _) = create_test_user(&resources).await.unwrap();
    let (stranger, _) = create_test_user(&resources).await.unwrap();

    let created = resources
        .recipe_manager
        .create(owner.id, &basic_request("Owned Recipe"))
        .await
        .unwrap();

    let err = resources
        .recipe_manager
        .update(
            created.recipe.id,
            stranger.id,
            &UpdateRecipeRequest {
                title: Some("Hijacked".to_owned()),
                ..UpdateRecipeRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = resources
        .recipe_manager
        .delete(created.recipe.id, stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    resources
        .recipe_manager
        .delete(created.recipe.id, owner.id)
        .await
        .unwrap();
    assert!(resources
        .recipe_manager
        .get_by_id(created.recipe.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn private_recipes_are_invisible_to_others() {
    let resources = create_test_server_resources().await.unwrap();
    let (owner, _) = create_test_user(&resources).await.unwrap();
    let (stranger, _) = create_test_user(&resources).await.unwrap();

    let mut request = basic_request("Secret Family Recipe");
    request.is_public = false;
    let created = resources
        .recipe_manager
        .create(owner.id, &request)
        .await
        .unwrap();

    // Slug reads behave exactly like a missing recipe
    assert!(resources
        .recipe_manager
        .get_by_slug(&created.recipe.slug, None)
        .await
        .unwrap()
        .is_none());
    assert!(resources
        .recipe_manager
        .get_by_slug(&created.recipe.slug, Some(stranger.id))
        .await
        .unwrap()
        .is_none());
    assert!(resources
        .recipe_manager
        .get_by_slug(&created.recipe.slug, Some(owner.id))
        .await
        .unwrap()
        .is_some());

    // Public listing excludes it even for the owner; my-recipes includes it
    let listing = resources
        .recipe_manager
        .list(&RecipeFilter::default(), page(), Some(owner.id))
        .await
        .unwrap();
    assert_eq!(listing.total, 0);

    let mine = resources
        .recipe_manager
        .list_by_owner(owner.id, page())
        .await
        .unwrap();
    assert_eq!(mine.total, 1);
}

#[tokio::test]
async fn listing_filters_compose() {
    let resources = create_test_server_resources().await.unwrap();
    let (owner, _) = create_test_user(&resources).await.unwrap();

    let mut quick = basic_request("Quick Salad");
    quick.difficulty = "easy".to_owned();
    quick.prep_minutes = Some(10);
    quick.cook_minutes = None;
    resources.recipe_manager.create(owner.id, &quick).await.unwrap();

    let mut slow = basic_request("Slow Roast");
    slow.difficulty = "hard".to_owned();
    slow.prep_minutes = Some(30);
    slow.cook_minutes = Some(180);
    resources.recipe_manager.create(owner.id, &slow).await.unwrap();

    let filter = RecipeFilter {
        difficulty: Some("easy".to_owned()),
        ..RecipeFilter::default()
    };
    let easy = resources
        .recipe_manager
        .list(&filter, page(), None)
        .await
        .unwrap();
    assert_eq!(easy.total, 1);
    assert_eq!(easy.items[0].recipe.title, "Quick Salad");

    // Missing times count as zero toward the bound
    let filter = RecipeFilter {
        max_time: Some(60),
        ..RecipeFilter::default()
    };
    let fast = resources
        .recipe_manager
        .list(&filter, page(), None)
        .await
        .unwrap();
    assert_eq!(fast.total, 1);
    assert_eq!(fast.items[0].metrics.total_time, 10);

    let filter = RecipeFilter {
        search: Some("roast".to_owned()),
        ..RecipeFilter::default()
    };
    let found = resources
        .recipe_manager
        .list(&filter, page(), None)
        .await
        .unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.items[0].recipe.title, "Slow Roast");

    // Invalid difficulty is ignored rather than rejected
    let filter = RecipeFilter {
        difficulty: Some("impossible".to_owned()),
        ..RecipeFilter::default()
    };
    let all = resources
        .recipe_manager
        .list(&filter, page(), None)
        .await
        .unwrap();
    assert_eq!(all.total, 2);
}

#[tokio::test]
async fn unknown_sort_field_falls_back_to_newest_first() {
    let resources = create_test_server_resources().await.unwrap();
    let (owner, _) = create_test_user(&resources).await.unwrap();

    resources
        .recipe_manager
        .create(owner.id, &basic_request("First Recipe"))
        .await
        .unwrap();
    resources
        .recipe_manager
        .create(owner.id, &basic_request("Second Recipe"))
        .await
        .unwrap();

    let filter = RecipeFilter {
        sort_by: Some("password_hash".to_owned()),
        ..RecipeFilter::default()
    };
    let listing = resources
        .recipe_manager
        .list(&filter, page(), None)
        .await
        .unwrap();
    assert_eq!(listing.total, 2);

    let filter = RecipeFilter {
        sort_by: Some("title".to_owned()),
        sort_order: Some("asc".to_owned()),
        ..RecipeFilter::default()
    };
    let by_title = resources
        .recipe_manager
        .list(&filter, page(), None)
        .await
        .unwrap();
    assert_eq!(by_title.items[0].recipe.title, "First Recipe");
    assert_eq!(by_title.items[1].recipe.title, "Second Recipe");
}

#[tokio::test]
async fn cover_photo_is_unique_per_recipe() {
    let resources = create_test_server_resources().await.unwrap();
    let (owner, _) = create_test_user(&resources).await.unwrap();

    let created = resources
        .recipe_manager
        .create(owner.id, &basic_request("Photogenic Dish"))
        .await
        .unwrap();

    resources
        .recipe_manager
        .add_photo(created.recipe.id, owner.id, "photos/a.jpg", true)
        .await
        .unwrap();
    let second = resources
        .recipe_manager
        .add_photo(created.recipe.id, owner.id, "photos/b.jpg", true)
        .await
        .unwrap();
    assert!(second.is_cover);

    let detail = resources
        .recipe_manager
        .get_by_slug(&created.recipe.slug, None)
        .await
        .unwrap()
        .unwrap();
    let covers = detail.photos.iter().filter(|p| p.is_cover).count();
    assert_eq!(covers, 1);
    assert!(detail.photos[0].url.ends_with("photos/b.jpg"));
}
