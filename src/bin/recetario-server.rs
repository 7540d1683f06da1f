// ABOUTME: Recetario server binary entrypoint
// ABOUTME: Loads configuration, connects the database, and serves the API router

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

//! Recetario HTTP server

use std::sync::Arc;

use recetario::config::environment::ServerConfig;
use recetario::database::Database;
use recetario::errors::{AppError, AppResult};
use recetario::routes::{router, ServerResources};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let database = Database::new(&config.database_url).await?;
    tracing::info!(database_url = %config.database_url, "database ready");

    let resources = Arc::new(ServerResources::new(&database, &config));
    let app = router(resources);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!(%addr, "recetario server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))
}
