// ABOUTME: End-to-end tests for the HTTP API through the full router
// ABOUTME: Exercises auth, the recipe lifecycle, social endpoints, and the response envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{create_test_server_resources, create_test_user};
use helpers::axum_test::AxumTestRequest;
use recetario::routes::{router, ServerResources};
use serde_json::{json, Value};

async fn setup() -> (axum::Router, Arc<ServerResources>) {
    let resources = create_test_server_resources().await.unwrap();
    (router(resources.clone()), resources)
}

#[tokio::test]
async fn register_login_and_me_round_trip() {
    let (app, _resources) = setup().await;

    let response = AxumTestRequest::post("/api/v1/auth/register")
        .json(&json!({
            "name": "Ana Cocinera",
            "username": "ana_cocina",
            "email": "ana@example.com",
            "password": "super-secret-pw",
            "bio": "I cook things"
        }))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["data"]["token"].is_string());
    assert_eq!(body["data"]["user"]["username"], "ana_cocina");
    // The password hash never leaves the server
    assert!(body["data"]["user"].get("password_hash").is_none());

    let response = AxumTestRequest::post("/api/v1/auth/login")
        .json(&json!({"username": "ana_cocina", "password": "super-secret-pw"}))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let token = body["data"]["token"].as_str().unwrap().to_owned();

    let response = AxumTestRequest::get("/api/v1/auth/me")
        .header("authorization", &format!("Bearer {token}"))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["email"], "ana@example.com");

    // Wrong password and unknown user are indistinguishable
    let response = AxumTestRequest::post("/api/v1/auth/login")
        .json(&json!({"username": "ana_cocina", "password": "wrong"}))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let response = AxumTestRequest::post("/api/v1/auth/login")
        .json(&json!({"username": "nobody", "password": "wrong"}))
        .send(app)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_validation_uses_the_error_envelope() {
    let (app, _resources) = setup().await;

    let response = AxumTestRequest::post("/api/v1/auth/register")
        .json(&json!({"username": "x", "password": "short"}))
        .send(app)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["errors"]["name"].is_array());
    assert!(body["errors"]["username"].is_array());
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["password"].is_array());
}

#[tokio::test]
async fn recipe_lifecycle_over_http() {
    let (app, resources) = setup().await;
    let (_owner, auth) = create_test_user(&resources).await.unwrap();

    let dinner = resources.category_manager.create("Dinner").await.unwrap();
    let rice = resources
        .ingredient_manager
        .create("Rice", Some("g"))
        .await
        .unwrap();

    // Creation requires authentication
    let response = AxumTestRequest::post("/api/v1/recipes")
        .json(&json!({"title": "Nope"}))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = AxumTestRequest::post("/api/v1/recipes")
        .header("authorization", &auth)
        .json(&json!({
            "title": "Arroz al Horno",
            "description": "Baked rice",
            "prep_minutes": 20,
            "cook_minutes": 45,
            "servings": 4,
            "difficulty": "medium",
            "steps": [
                {"step_number": 1, "instruction": "Preheat the oven"},
                {"step_number": 2, "instruction": "Bake the rice"}
            ],
            "ingredients": [
                {"ingredient_id": rice.id, "quantity": 400, "unit": "g"}
            ],
            "categories": [dinner.id]
        }))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["slug"], "arroz-al-horno");
    assert_eq!(body["data"]["total_time"], 65);
    let recipe_id = body["data"]["id"].as_str().unwrap().to_owned();

    // Anonymous listing and detail see the public recipe
    let response = AxumTestRequest::get("/api/v1/recipes").send(app.clone()).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["slug"], "arroz-al-horno");

    let response = AxumTestRequest::get("/api/v1/recipes/arroz-al-horno")
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["steps"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["ingredients"][0]["name"], "Rice");

    // Update keeps the slug
    let response = AxumTestRequest::put(&format!("/api/v1/recipes/{recipe_id}"))
        .header("authorization", &auth)
        .json(&json!({"title": "Arroz Renovado"}))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["title"], "Arroz Renovado");
    assert_eq!(body["data"]["slug"], "arroz-al-horno");

    // Delete, then the slug is gone
    let response = AxumTestRequest::delete(&format!("/api/v1/recipes/{recipe_id}"))
        .header("authorization", &auth)
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let response = AxumTestRequest::get("/api/v1/recipes/arroz-al-horno")
        .send(app)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn private_recipes_render_not_found_for_strangers() {
    let (app, resources) = setup().await;
    let (_owner, owner_auth) = create_test_user(&resources).await.unwrap();
    let (_stranger, stranger_auth) = create_test_user(&resources).await.unwrap();

    let response = AxumTestRequest::post("/api/v1/recipes")
        .header("authorization", &owner_auth)
        .json(&json!({
            "title": "Secret Sauce",
            "difficulty": "easy",
            "is_public": false
        }))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    // Anonymous and stranger reads both 404 through the envelope
    for auth in [None, Some(&stranger_auth)] {
        let mut request = AxumTestRequest::get("/api/v1/recipes/secret-sauce");
        if let Some(auth) = auth {
            request = request.header("authorization", auth);
        }
        let response = request.send(app.clone()).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Recipe not found");
    }

    // The owner still reads it
    let response = AxumTestRequest::get("/api/v1/recipes/secret-sauce")
        .header("authorization", &owner_auth)
        .send(app)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn ratings_and_favorites_over_http() {
    let (app, resources) = setup().await;
    let (_owner, owner_auth) = create_test_user(&resources).await.unwrap();
    let (_fan, fan_auth) = create_test_user(&resources).await.unwrap();

    let response = AxumTestRequest::post("/api/v1/recipes")
        .header("authorization", &owner_auth)
        .json(&json!({"title": "Crowd Pleaser", "difficulty": "easy"}))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    let recipe_id = body["data"]["id"].as_str().unwrap().to_owned();

    // First rating lands, the duplicate is a 400 conflict
    let response = AxumTestRequest::post(&format!("/api/v1/recipes/{recipe_id}/ratings"))
        .header("authorization", &fan_auth)
        .json(&json!({"rating": 5}))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let response = AxumTestRequest::post(&format!("/api/v1/recipes/{recipe_id}/ratings"))
        .header("authorization", &fan_auth)
        .json(&json!({"rating": 3}))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "You have already rated this recipe");

    let response = AxumTestRequest::get(&format!("/api/v1/recipes/{recipe_id}/my-rating"))
        .header("authorization", &fan_auth)
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["rating"], 5);

    // Favorite toggle flips state on each call
    let response = AxumTestRequest::post(&format!("/api/v1/recipes/{recipe_id}/toggle-favorite"))
        .header("authorization", &fan_auth)
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["is_favorite"], true);

    let response = AxumTestRequest::get("/api/v1/recipes/favorites")
        .header("authorization", &fan_auth)
        .send(app.clone())
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["total"], 1);

    let response = AxumTestRequest::post(&format!("/api/v1/recipes/{recipe_id}/toggle-favorite"))
        .header("authorization", &fan_auth)
        .send(app.clone())
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["is_favorite"], false);

    // The listing exposes live metrics
    let response = AxumTestRequest::get("/api/v1/recipes").send(app).await;
    let body: Value = response.json();
    assert_eq!(body["data"]["items"][0]["average_rating"], 5.0);
    assert_eq!(body["data"]["items"][0]["ratings_count"], 1);
}

#[tokio::test]
async fn comments_over_http_with_owner_moderation() {
    let (app, resources) = setup().await;
    let (_owner, owner_auth) = create_test_user(&resources).await.unwrap();
    let (_commenter, commenter_auth) = create_test_user(&resources).await.unwrap();

    let response = AxumTestRequest::post("/api/v1/recipes")
        .header("authorization", &owner_auth)
        .json(&json!({"title": "Discussed Dish", "difficulty": "hard"}))
        .send(app.clone())
        .await;
    let body: Value = response.json();
    let recipe_id = body["data"]["id"].as_str().unwrap().to_owned();

    let response = AxumTestRequest::post(&format!("/api/v1/recipes/{recipe_id}/comments"))
        .header("authorization", &commenter_auth)
        .json(&json!({"content": "Needs more salt"}))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    let comment_id = body["data"]["id"].as_str().unwrap().to_owned();

    // Anonymous listing sees it, newest first
    let response = AxumTestRequest::get(&format!("/api/v1/recipes/{recipe_id}/comments"))
        .send(app.clone())
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["total"], 1);

    // The recipe owner moderates it away
    let response = AxumTestRequest::delete(&format!("/api/v1/comments/{comment_id}"))
        .header("authorization", &owner_auth)
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = AxumTestRequest::get(&format!("/api/v1/recipes/{recipe_id}/comments"))
        .send(app)
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn catalog_routes_guard_mutations() {
    let (app, resources) = setup().await;
    let (_user, auth) = create_test_user(&resources).await.unwrap();

    let response = AxumTestRequest::post("/api/v1/categories")
        .json(&json!({"name": "Brunch"}))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = AxumTestRequest::post("/api/v1/categories")
        .header("authorization", &auth)
        .json(&json!({"name": "Brunch"}))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let response = AxumTestRequest::get("/api/v1/categories").send(app.clone()).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"][0]["name"], "Brunch");
    assert_eq!(body["data"][0]["recipes_count"], 0);

    let response = AxumTestRequest::post("/api/v1/ingredients")
        .header("authorization", &auth)
        .json(&json!({"name": "Saffron", "default_unit": "pinch"}))
        .send(app.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let response = AxumTestRequest::get("/api/v1/ingredients/search?q=saf")
        .send(app)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"][0]["name"], "Saffron");
}
