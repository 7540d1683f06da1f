// ABOUTME: Library root for the Recetario recipe-sharing API
// ABOUTME: Wires the domain, persistence, projection, and HTTP route layers together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

//! Recetario: a recipe-sharing REST API
//!
//! Recipes are aggregates: a recipe row plus its steps, ingredient links,
//! and category links form one consistency unit, created and updated
//! transactionally. Categories and ingredients are shared catalogs.
//! Comments, ratings, and favorites attach to visible recipes. Derived
//! metrics (total time, average rating, counts) are computed at read time
//! and never stored.

/// Token issuing, validation, and password hashing
pub mod auth;

/// Environment-driven server configuration
pub mod config;

/// SQLite persistence layer and per-domain managers
pub mod database;

/// Error taxonomy and the uniform JSON error envelope
pub mod errors;

/// Stored domain records
pub mod models;

/// Page requests and page envelopes
pub mod pagination;

/// Read models and derived metrics
pub mod projection;

/// HTTP route handlers
pub mod routes;

/// Small shared helpers
pub mod utils;

/// Visibility and ownership guard functions
pub mod visibility;
