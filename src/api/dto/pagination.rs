//! Pagination-related DTOs for API responses.

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::PageRequest;

/// Generic paged response wrapper: `{list, pagination}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PagedResponse<T> {
    /// The items of the requested page
    pub list: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number (1-based)
    #[schema(example = 1)]
    pub current: u32,

    /// Number of items per page
    #[serde(rename = "pageSize")]
    #[schema(example = 10)]
    pub page_size: u32,

    /// Total number of matching items across all pages
    #[schema(example = 42)]
    pub total: i64,
}

impl<T> PagedResponse<T> {
    /// Creates a new paged response.
    pub fn new(list: Vec<T>, page: PageRequest, total: i64) -> Self {
        Self {
            list,
            pagination: PaginationMeta {
                current: page.current,
                page_size: page.page_size,
                total,
            },
        }
    }
}
