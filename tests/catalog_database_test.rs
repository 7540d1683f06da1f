// ABOUTME: Integration tests for the category and ingredient catalog managers
// ABOUTME: Covers name uniqueness, slug derivation, search, and referenced-delete protection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{create_test_server_resources, create_test_user};
use recetario::database::recipes::{CreateRecipeRequest, IngredientLinkInput};
use recetario::errors::AppError;
use recetario::pagination::{PageRequest, DEFAULT_INGREDIENTS_PER_PAGE};

#[tokio::test]
async fn category_slug_derives_from_name() {
    let resources = create_test_server_resources().await.unwrap();
    let category = resources
        .category_manager
        .create("Cocina Española")
        .await
        .unwrap();
    assert_eq!(category.slug, "cocina-espanola");
}

#[tokio::test]
async fn duplicate_catalog_names_are_rejected() {
    let resources = create_test_server_resources().await.unwrap();

    resources.category_manager.create("Desserts").await.unwrap();
    let err = resources
        .category_manager
        .create("Desserts")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    resources
        .ingredient_manager
        .create("Flour", Some("g"))
        .await
        .unwrap();
    let err = resources
        .ingredient_manager
        .create("Flour", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn referenced_catalog_entries_cannot_be_deleted() {
    let resources = create_test_server_resources().await.unwrap();
    let (owner, _) = create_test_user(&resources).await.unwrap();

    let flour = resources
        .ingredient_manager
        .create("Flour", Some("g"))
        .await
        .unwrap();
    let baking = resources.category_manager.create("Baking").await.unwrap();

    let recipe = resources
        .recipe_manager
        .create(
            owner.id,
            &CreateRecipeRequest {
                title: "Simple Bread".to_owned(),
                description: None,
                prep_minutes: Some(20),
                cook_minutes: Some(40),
                servings: Some(1),
                difficulty: "easy".to_owned(),
                is_public: true,
                calories: None,
                steps: Vec::new(),
                ingredients: vec![IngredientLinkInput {
                    ingredient_id: flour.id,
                    quantity: Some(500.0),
                    unit: Some("g".to_owned()),
                    note: None,
                }],
                categories: vec![baking.id],
            },
        )
        .await
        .unwrap();

    let err = resources.ingredient_manager.delete(flour.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    let err = resources.category_manager.delete(baking.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Once the referencing recipe is gone the catalog entries free up
    resources
        .recipe_manager
        .delete(recipe.recipe.id, owner.id)
        .await
        .unwrap();
    resources.ingredient_manager.delete(flour.id).await.unwrap();
    resources.category_manager.delete(baking.id).await.unwrap();
}

#[tokio::test]
async fn category_counts_distinguish_public_recipes() {
    let resources = create_test_server_resources().await.unwrap();
    let (owner, _) = create_test_user(&resources).await.unwrap();
    let dinner = resources.category_manager.create("Dinner").await.unwrap();

    for (title, is_public) in [("Public Dish", true), ("Hidden Dish", false)] {
        resources
            .recipe_manager
            .create(
                owner.id,
                &CreateRecipeRequest {
                    title: title.to_owned(),
                    description: None,
                    prep_minutes: None,
                    cook_minutes: None,
                    servings: None,
                    difficulty: "medium".to_owned(),
                    is_public,
                    calories: None,
                    steps: Vec::new(),
                    ingredients: Vec::new(),
                    categories: vec![dinner.id],
                },
            )
            .await
            .unwrap();
    }

    let listing = resources.category_manager.list().await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].recipes_count, 2);
    assert_eq!(listing[0].public_recipes_count, 1);
}

#[tokio::test]
async fn ingredient_search_is_capped_and_fuzzy() {
    let resources = create_test_server_resources().await.unwrap();

    for i in 0..15 {
        resources
            .ingredient_manager
            .create(&format!("Pepper {i:02}"), None)
            .await
            .unwrap();
    }
    resources
        .ingredient_manager
        .create("Salt", None)
        .await
        .unwrap();

    let matches = resources.ingredient_manager.search("pepper").await.unwrap();
    assert_eq!(matches.len(), 10);

    let matches = resources.ingredient_manager.search("alt").await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].name, "Salt");

    assert!(resources
        .ingredient_manager
        .search("  ")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn ingredient_listing_paginates_with_totals() {
    let resources = create_test_server_resources().await.unwrap();

    for i in 0..25 {
        resources
            .ingredient_manager
            .create(&format!("Spice {i:02}"), None)
            .await
            .unwrap();
    }

    let page = PageRequest::new(None, None, DEFAULT_INGREDIENTS_PER_PAGE);
    let first = resources.ingredient_manager.list(None, page).await.unwrap();
    assert_eq!(first.items.len(), 20);
    assert_eq!(first.total, 25);
    assert_eq!(first.total_pages, 2);

    let page = PageRequest::new(Some(2), None, DEFAULT_INGREDIENTS_PER_PAGE);
    let second = resources.ingredient_manager.list(None, page).await.unwrap();
    assert_eq!(second.items.len(), 5);

    let page = PageRequest::new(None, Some(5), DEFAULT_INGREDIENTS_PER_PAGE);
    let filtered = resources
        .ingredient_manager
        .list(Some("Spice 0"), page)
        .await
        .unwrap();
    assert_eq!(filtered.total, 10);
    assert_eq!(filtered.items.len(), 5);
}

#[tokio::test]
async fn catalog_updates_keep_uniqueness() {
    let resources = create_test_server_resources().await.unwrap();

    let soup = resources.category_manager.create("Soups").await.unwrap();
    resources.category_manager.create("Stews").await.unwrap();

    let err = resources
        .category_manager
        .update(soup.id, "Stews")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let renamed = resources
        .category_manager
        .update(soup.id, "Hearty Soups")
        .await
        .unwrap();
    assert_eq!(renamed.name, "Hearty Soups");
    assert_eq!(renamed.slug, "hearty-soups");
}
