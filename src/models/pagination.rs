//! Page-number pagination shared by list views

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// Items per page of every list view
pub const PAGE_SIZE: i64 = 10;

/// `?page=N` query parameter (1-based, defaults to 1)
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number (default: 1)
    pub page: Option<i64>,
}

/// A validated page position inside a collection of `total` items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: i64,
    pub num_pages: i64,
}

impl PageRequest {
    /// Resolve the requested page against the collection size.
    /// An empty collection still has one (empty) page.
    pub fn resolve(query: PageQuery, total: i64) -> AppResult<Self> {
        let number = query.page.unwrap_or(1);
        let num_pages = ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
        if number < 1 || number > num_pages {
            return Err(AppError::NotFound(format!("Invalid page ({})", number)));
        }
        Ok(Self { number, num_pages })
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * PAGE_SIZE
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Entries of this page
    pub items: Vec<T>,
    /// Total number of entries
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Entries per page
    pub per_page: i64,
    pub num_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.number,
            per_page: PAGE_SIZE,
            num_pages: request.num_pages,
            has_next: request.number < request.num_pages,
            has_previous: request.number > 1,
        }
    }
}
