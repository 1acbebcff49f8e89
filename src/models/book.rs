//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    author::Author,
    book_instance::BookInstance,
    genre::{Genre, Language},
};

/// Book row from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    /// 13 character ISBN, unique across the catalog
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
}

impl Book {
    pub fn url(&self) -> String {
        format!("/catalog/books/{}", self.id)
    }
}

/// Book as shown in lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookListEntry {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    /// "Last, First" of the author, if any
    pub author_name: Option<String>,
}

/// Book with its relations resolved
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub author: Option<Author>,
    pub language: Option<Language>,
    pub genres: Vec<Genre>,
    /// First genres joined for display
    pub display_genre: String,
    /// Physical copies of this book
    pub instances: Vec<BookInstance>,
}

/// Create / update book form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(length(min = 1, max = 255, message = "Ensure this value has between 1 and 255 characters."))]
    pub title: String,
    #[validate(length(min = 1, max = 1000, message = "Ensure this value has between 1 and 1000 characters."))]
    pub summary: String,
    #[validate(length(equal = 13, message = "ISBN must have exactly 13 characters."))]
    pub isbn: String,
    #[validate(required(message = "This field is required."))]
    pub author_id: Option<i32>,
    #[validate(required(message = "This field is required."))]
    pub language_id: Option<i32>,
    #[validate(length(min = 1, message = "This field is required."))]
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

impl BookForm {
    pub fn from_book(book: &Book, genres: &[Genre]) -> Self {
        Self {
            title: book.title.clone(),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            author_id: book.author_id,
            language_id: book.language_id,
            genre_ids: genres.iter().map(|g| g.id).collect(),
        }
    }
}

/// Selectable values offered by the book form
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookFormChoices {
    pub authors: Vec<Author>,
    pub genres: Vec<Genre>,
    pub languages: Vec<Language>,
}

/// Book form as displayed: current values and the choices to pick from
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookFormView {
    pub form: BookForm,
    pub choices: BookFormChoices,
}
