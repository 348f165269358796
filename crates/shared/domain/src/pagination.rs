//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, MAX_PAGE_NUMBER, MAX_PAGE_SIZE};

/// Pagination query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct PaginationParams {
    /// 1-based page number (capped at 1,000,000)
    #[serde(default = "default_page")]
    pub page: u64,
    /// Items per page (capped at 100)
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

fn default_per_page() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl PaginationParams {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    /// Page number clamped to `1..=MAX_PAGE_NUMBER`
    pub fn page(&self) -> u64 {
        self.page.clamp(1, MAX_PAGE_NUMBER)
    }

    /// Zero-based page index for the database query
    pub fn page_index(&self) -> u64 {
        self.page() - 1
    }

    /// Get limit capped at maximum (and at least one)
    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, MAX_PAGE_SIZE)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE_NUMBER,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(
    feature = "openapi",
    aliases(
        UserPage = Paginated<crate::user::UserResponse>,
        DiaryPage = Paginated<crate::diary::DiaryResponse>,
        NotificationPage = Paginated<crate::notification::NotificationResponse>
    )
)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    /// Create new paginated response
    pub fn new(data: Vec<T>, params: PaginationParams, total: u64) -> Self {
        let per_page = params.limit();
        Self {
            data,
            meta: PaginationMeta {
                page: params.page(),
                per_page,
                total,
                total_pages: total.div_ceil(per_page),
            },
        }
    }

    /// Convert the items, keeping the metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_index_and_limit() {
        let params = PaginationParams::new(3, 10);
        assert_eq!(params.page_index(), 2);
        assert_eq!(params.limit(), 10);

        let params = PaginationParams::new(0, 1000);
        assert_eq!(params.page_index(), 0);
        assert_eq!(params.limit(), MAX_PAGE_SIZE);

        assert_eq!(PaginationParams::new(1, 0).limit(), 1);
    }

    #[test]
    fn test_huge_page_is_capped() {
        let params = PaginationParams::new(u64::MAX, MAX_PAGE_SIZE);
        assert_eq!(params.page(), MAX_PAGE_NUMBER);
        assert_eq!(params.page_index(), MAX_PAGE_NUMBER - 1);
        // the row offset stays far inside i64
        assert!(params.page_index().checked_mul(params.limit()).is_some_and(|o| o < i64::MAX as u64));

        let page: Paginated<u8> = Paginated::new(vec![], params, 3);
        assert_eq!(page.meta.page, MAX_PAGE_NUMBER);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page: Paginated<u8> = Paginated::new(vec![], PaginationParams::new(1, 20), 41);
        assert_eq!(page.meta.total_pages, 3);

        let empty: Paginated<u8> = Paginated::new(vec![], PaginationParams::default(), 0);
        assert_eq!(empty.meta.total_pages, 0);
    }

    #[test]
    fn test_map_keeps_meta() {
        let page = Paginated::new(vec![1, 2], PaginationParams::new(2, 2), 4).map(|n| n * 10);
        assert_eq!(page.data, vec![10, 20]);
        assert_eq!(page.meta.page, 2);
    }
}
