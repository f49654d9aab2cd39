/// Pagination primitives shared by every list endpoint
///
/// Out-of-range values are clamped, never rejected: page is forced to at
/// least 1 and limit to 1..=100, with defaults of 1 and 10.

use serde::{Deserialize, Serialize};

/// Default page size
pub const DEFAULT_LIMIT: i64 = 10;

/// Maximum page size
pub const MAX_LIMIT: i64 = 100;

/// A clamped page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number
    pub page: i64,

    /// Rows per page (1..=100)
    pub limit: i64,
}

impl Page {
    /// Builds a page request from raw query values, clamping out-of-range
    /// input instead of rejecting it
    pub fn clamped(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// Number of rows to skip
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::clamped(None, None)
    }
}

/// Pagination metadata returned alongside every page of results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    /// `ceil(total / limit)`, never less than 1
    pub total_pages: i64,
}

impl Meta {
    pub fn new(page: &Page, total: i64) -> Self {
        let total_pages = ((total + page.limit - 1) / page.limit).max(1);

        Self {
            page: page.page,
            limit: page.limit,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        let page = Page::clamped(None, None);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 10);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_page_clamping() {
        // page below 1 is clamped up, never rejected
        assert_eq!(Page::clamped(Some(0), None).page, 1);
        assert_eq!(Page::clamped(Some(-5), None).page, 1);

        // limit is clamped into 1..=100
        assert_eq!(Page::clamped(None, Some(0)).limit, 1);
        assert_eq!(Page::clamped(None, Some(1000)).limit, 100);
        assert_eq!(Page::clamped(None, Some(50)).limit, 50);
    }

    #[test]
    fn test_offset() {
        let page = Page::clamped(Some(3), Some(25));
        assert_eq!(page.offset(), 50);
    }

    #[test]
    fn test_meta_total_pages_is_ceiling() {
        let page = Page::clamped(Some(1), Some(10));

        assert_eq!(Meta::new(&page, 0).total_pages, 1);
        assert_eq!(Meta::new(&page, 1).total_pages, 1);
        assert_eq!(Meta::new(&page, 10).total_pages, 1);
        assert_eq!(Meta::new(&page, 11).total_pages, 2);
        assert_eq!(Meta::new(&page, 101).total_pages, 11);
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let meta = Meta::new(&Page::default(), 42);
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["page"], 1);
        assert_eq!(json["limit"], 10);
        assert_eq!(json["total"], 42);
        assert_eq!(json["totalPages"], 5);
    }
}
