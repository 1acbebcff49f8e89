//! Book endpoints: public browsing and management behind `can_add_book`

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{BookDetails, BookForm, BookFormView, BookListEntry},
        pagination::{Page, PageQuery},
    },
    AppState,
};

use super::AuthenticatedUser;

const BOOK_LIST_URL: &str = "/catalog/books/";

/// List books ordered by title
#[utoipa::path(
    get,
    path = "/catalog/books/",
    tag = "books",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = Page<BookListEntry>),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<BookListEntry>>> {
    let page = state.services.catalog.list_books(query).await?;
    Ok(Json(page))
}

/// Get book details with its copies
#[utoipa::path(
    get,
    path = "/catalog/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Empty book form with the available choices
#[utoipa::path(
    get,
    path = "/catalog/book/create",
    tag = "books",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Book form", body = BookFormView),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing can_add_book")
    )
)]
pub async fn create_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<BookFormView>> {
    user.require_add_book()?;

    let view = state.services.catalog.new_book_form().await?;
    Ok(Json(view))
}

/// Create a book, then go to its detail page
#[utoipa::path(
    post,
    path = "/catalog/book/create",
    tag = "books",
    security(("session_cookie" = [])),
    request_body = BookForm,
    responses(
        (status = 303, description = "Book created, redirect to its detail page"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_add_book"),
        (status = 409, description = "ISBN already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(form): Json<BookForm>,
) -> AppResult<Redirect> {
    user.require_add_book()?;

    let book = state.services.catalog.create_book(form).await?;
    Ok(Redirect::to(&book.url()))
}

/// Book form filled with the current values
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/update",
    tag = "books",
    security(("session_cookie" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book form", body = BookFormView),
        (status = 403, description = "Missing can_add_book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookFormView>> {
    user.require_add_book()?;

    let view = state.services.catalog.edit_book_form(id).await?;
    Ok(Json(view))
}

/// Update a book, then go to its detail page
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/update",
    tag = "books",
    security(("session_cookie" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookForm,
    responses(
        (status = 303, description = "Book updated, redirect to its detail page"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_add_book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(form): Json<BookForm>,
) -> AppResult<Redirect> {
    user.require_add_book()?;

    let book = state.services.catalog.update_book(id, form).await?;
    Ok(Redirect::to(&book.url()))
}

/// Book to confirm deletion of
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/delete",
    tag = "books",
    security(("session_cookie" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book to delete", body = BookDetails),
        (status = 403, description = "Missing can_add_book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_confirm(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetails>> {
    user.require_add_book()?;

    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Delete a book without copies, then go to the book list
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/delete",
    tag = "books",
    security(("session_cookie" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 303, description = "Book deleted, redirect to the book list"),
        (status = 403, description = "Missing can_add_book"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book still has copies", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    user.require_add_book()?;

    state.services.catalog.delete_book(id).await?;
    Ok(Redirect::to(BOOK_LIST_URL))
}
