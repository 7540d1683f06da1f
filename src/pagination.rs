// ABOUTME: Page metadata for offset-based listings
// ABOUTME: Provides Page<T> with totals and per-endpoint default page sizes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

//! Offset pagination
//!
//! Every listing endpoint returns a full [`Page`]: the requested slice of
//! items plus the total count and page metadata, so clients never need a
//! second query to render pagination controls.

use serde::Serialize;

/// Default page size for recipe listings
pub const DEFAULT_RECIPES_PER_PAGE: u32 = 12;

/// Default page size for ingredient listings
pub const DEFAULT_INGREDIENTS_PER_PAGE: u32 = 20;

/// Default page size for comment and rating listings
pub const DEFAULT_SOCIAL_PER_PAGE: u32 = 10;

/// Upper bound on caller-supplied page sizes
pub const MAX_PER_PAGE: u32 = 100;

/// Requested page, normalized from query parameters
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    /// Items per page
    pub per_page: u32,
}

impl PageRequest {
    /// Normalize raw query values against an endpoint default
    ///
    /// Page numbers below 1 become 1; page sizes are clamped to
    /// `1..=MAX_PER_PAGE` and fall back to `default_per_page` when absent.
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>, default_per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(default_per_page)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    /// SQL OFFSET for this page
    #[must_use]
    pub const fn offset(self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    /// SQL LIMIT for this page
    #[must_use]
    pub const fn limit(self) -> i64 {
        self.per_page as i64
    }
}

/// One page of results with totals
#[derive(Debug, Serialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total matching items across all pages
    pub total: i64,
    /// 1-based page number
    pub page: u32,
    /// Items per page
    pub per_page: u32,
    /// Total number of pages (0 when there are no items)
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Assemble a page from a fetched slice and a total count
    #[must_use]
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        let total_pages = if total <= 0 {
            0
        } else {
            ((total + i64::from(request.per_page) - 1) / i64::from(request.per_page)) as u32
        };
        Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_normalizes_bounds() {
        let req = PageRequest::new(None, None, DEFAULT_RECIPES_PER_PAGE);
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 12);

        let req = PageRequest::new(Some(0), Some(0), DEFAULT_SOCIAL_PER_PAGE);
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 1);

        let req = PageRequest::new(Some(3), Some(500), DEFAULT_INGREDIENTS_PER_PAGE);
        assert_eq!(req.per_page, MAX_PER_PAGE);
        assert_eq!(req.offset(), 200);
    }

    #[test]
    fn total_pages_rounds_up() {
        let req = PageRequest::new(Some(1), Some(10), 10);
        let page = Page::new(vec![1, 2, 3], 25, req);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], 0, req);
        assert_eq!(empty.total_pages, 0);
    }
}
