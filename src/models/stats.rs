//! Home page counters

use serde::Serialize;
use utoipa::ToSchema;

/// Title fragment counted on the home page
pub const TITLE_FRAGMENT: &str = "of";

/// Catalog counts plus the visitor's own visit count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogStats {
    pub num_books: i64,
    pub num_instances: i64,
    /// Copies with status `available`
    pub num_instances_available: i64,
    pub num_authors: i64,
    /// Books whose title contains "of", ignoring case
    pub num_books_title_contains: i64,
    /// Visits of this session before the current one
    pub num_visits: i64,
}
