// ABOUTME: Test helper modules shared by integration tests
// ABOUTME: Re-exports the axum request/response test harness
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario
#![allow(dead_code)]

pub mod axum_test;
