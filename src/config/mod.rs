// ABOUTME: Configuration module organization
// ABOUTME: Re-exports environment-based server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

//! Configuration management

/// Environment-based server configuration
pub mod environment;
