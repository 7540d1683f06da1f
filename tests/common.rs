// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory database, server resources, and user creation helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use recetario::config::environment::ServerConfig;
use recetario::database::users::CreateUserRequest;
use recetario::database::Database;
use recetario::models::User;
use recetario::routes::ServerResources;
use uuid::Uuid;

/// Test configuration pointing at an in-memory database
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        database_url: "sqlite::memory:".to_owned(),
        jwt_secret: "test-jwt-secret".to_owned(),
        jwt_expiry_hours: 1,
        photo_base_url: "http://localhost:8081/storage".to_owned(),
    }
}

/// Fresh in-memory database with the schema applied
pub async fn create_test_database() -> Result<Database> {
    Ok(Database::new("sqlite::memory:").await?)
}

/// Server resources over a fresh in-memory database
pub async fn create_test_server_resources() -> Result<Arc<ServerResources>> {
    let database = create_test_database().await?;
    Ok(Arc::new(ServerResources::new(&database, &test_config())))
}

/// Create a user with a unique username and return it with a bearer token
pub async fn create_test_user(resources: &ServerResources) -> Result<(User, String)> {
    let suffix = Uuid::new_v4().simple().to_string();
    let username = format!("user_{}", &suffix[..8]);
    create_test_user_with_username(resources, &username).await
}

/// Create a user with a specific username and return it with a bearer token
pub async fn create_test_user_with_username(
    resources: &ServerResources,
    username: &str,
) -> Result<(User, String)> {
    let user = resources
        .user_manager
        .create(&CreateUserRequest {
            name: "Test User".to_owned(),
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            // bcrypt of a fixed password is too slow for unit setup; store a
            // placeholder since token auth does not read it
            password_hash: "$2b$12$test-hash-placeholder".to_owned(),
            bio: None,
        })
        .await?;
    let token = resources.auth_manager.generate_token(user.id)?;
    Ok((user, format!("Bearer {token}")))
}
