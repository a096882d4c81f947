//! Page arithmetic shared by every listing

use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
/// Highest page whose offset fits in an `i64` at any allowed limit.
/// Query validators repeat this value as a literal.
pub const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

/// A validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Build from optional query values, falling back to page 1 / limit 10
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination block attached to list responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    /// Total matching rows, ignoring pagination
    pub total: i64,
    /// `ceil(total / limit)`
    pub pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: (total + request.limit - 1) / request.limit,
        }
    }
}

/// One page of rows plus the unpaginated match count
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(rows: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            rows,
            pagination: Pagination::new(request, total),
        }
    }

    /// Cut the requested window out of a fully materialized, ordered listing
    pub fn from_all(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as i64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(request.limit).unwrap_or(0);
        let rows = all.into_iter().skip(offset).take(limit).collect();
        Self::new(rows, request, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_round_up() {
        let p = Pagination::new(PageRequest::new(Some(1), Some(10)), 95);
        assert_eq!(p.pages, 10);
        assert_eq!(Pagination::new(PageRequest::new(None, Some(10)), 100).pages, 10);
        assert_eq!(Pagination::new(PageRequest::new(None, Some(10)), 0).pages, 0);
        assert_eq!(Pagination::new(PageRequest::new(None, Some(1)), 1).pages, 1);
    }

    #[test]
    fn test_last_page_offset() {
        let request = PageRequest::new(Some(10), Some(10));
        assert_eq!(request.offset(), 90);
    }

    #[test]
    fn test_tenth_page_of_95_rows_holds_the_last_five() {
        let rows: Vec<i32> = (1..=95).collect();
        let page = Page::from_all(rows, PageRequest::new(Some(10), Some(10)));

        assert_eq!(page.rows, vec![91, 92, 93, 94, 95]);
        assert_eq!(page.pagination.total, 95);
        assert_eq!(page.pagination.pages, 10);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let rows: Vec<i32> = (1..=95).collect();
        let page = Page::from_all(rows, PageRequest::new(Some(11), Some(10)));
        assert!(page.rows.is_empty());
        assert_eq!(page.pagination.pages, 10);
    }

    #[test]
    fn test_max_page_matches_query_bound() {
        assert_eq!(MAX_PAGE, 92_233_720_368_547_758);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let request = PageRequest::new(Some(i64::MAX), Some(MAX_LIMIT));
        assert_eq!(request.page, MAX_PAGE);
        assert!(request.offset() > 0);

        let request = PageRequest {
            page: i64::MAX,
            limit: MAX_LIMIT,
        };
        assert_eq!(request.offset(), i64::MAX);

        let page = Page::from_all(vec![1, 2, 3], PageRequest::new(Some(i64::MAX), Some(10)));
        assert!(page.rows.is_empty());
        assert_eq!(page.pagination.total, 3);
    }

    #[test]
    fn test_defaults_and_clamping() {
        assert_eq!(PageRequest::default(), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(Some(0), Some(500)), PageRequest { page: 1, limit: 100 });
        assert_eq!(PageRequest::new(Some(-3), Some(0)).offset(), 0);
    }
}
