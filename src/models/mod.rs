//! Data models for the catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod pagination;
pub mod stats;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorDetails, AuthorForm};
pub use book::{Book, BookDetails, BookForm, BookFormChoices, BookFormView, BookListEntry};
pub use book_instance::{BookInstance, LoanEntry, LoanStatus};
pub use genre::{Genre, Language};
pub use pagination::{Page, PageQuery, PageRequest};
pub use stats::CatalogStats;
pub use user::{Permission, User};
