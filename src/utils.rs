// ABOUTME: Small shared helpers used across managers and routes
// ABOUTME: Provides URL-safe slug derivation for recipe and category names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

//! Shared utilities

/// Derive a URL-safe slug from a title or name
///
/// Lowercases, maps accented Latin vowels and `ñ` to their ASCII base,
/// collapses every other non-alphanumeric run into a single hyphen, and
/// trims leading/trailing hyphens. The result is stable: the same input
/// always yields the same slug, so uniqueness is left to the database.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_was_hyphen = true; // suppress leading hyphen
    for ch in input.chars() {
        let mapped = match ch.to_lowercase().next().unwrap_or(ch) {
            'á' | 'à' | 'ä' | 'â' => Some('a'),
            'é' | 'è' | 'ë' | 'ê' => Some('e'),
            'í' | 'ì' | 'ï' | 'î' => Some('i'),
            'ó' | 'ò' | 'ö' | 'ô' => Some('o'),
            'ú' | 'ù' | 'ü' | 'û' => Some('u'),
            'ñ' => Some('n'),
            c if c.is_ascii_alphanumeric() => Some(c),
            _ => None,
        };
        match mapped {
            Some(c) => {
                slug.push(c);
                last_was_hyphen = false;
            }
            None => {
                if !last_was_hyphen {
                    slug.push('-');
                    last_was_hyphen = true;
                }
            }
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
