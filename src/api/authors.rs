//! Author endpoints

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        author::{Author, AuthorDetails, AuthorForm},
        pagination::{Page, PageQuery},
    },
    AppState,
};

use super::AuthenticatedUser;

const AUTHOR_LIST_URL: &str = "/catalog/authors/";

/// List authors ordered by last name, then first name
#[utoipa::path(
    get,
    path = "/catalog/authors/",
    tag = "authors",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of authors", body = Page<Author>),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Author>>> {
    let page = state.services.catalog.list_authors(query).await?;
    Ok(Json(page))
}

/// Get author details with their books
#[utoipa::path(
    get,
    path = "/catalog/authors/{id}",
    tag = "authors",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = AuthorDetails),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetails>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Empty author form
#[utoipa::path(
    get,
    path = "/catalog/author/create",
    tag = "authors",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Author form", body = AuthorForm),
        (status = 403, description = "Missing can_mark_returned")
    )
)]
pub async fn create_form(AuthenticatedUser(user): AuthenticatedUser) -> AppResult<Json<AuthorForm>> {
    user.require_mark_returned()?;
    Ok(Json(AuthorForm::default()))
}

/// Create an author, then go to their detail page
#[utoipa::path(
    post,
    path = "/catalog/author/create",
    tag = "authors",
    security(("session_cookie" = [])),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Author created, redirect to their detail page"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_mark_returned")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(form): Json<AuthorForm>,
) -> AppResult<Redirect> {
    user.require_mark_returned()?;

    let author = state.services.catalog.create_author(form).await?;
    Ok(Redirect::to(&author.url()))
}

/// Author form filled with the current values
#[utoipa::path(
    get,
    path = "/catalog/author/{id}/update",
    tag = "authors",
    security(("session_cookie" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author form", body = AuthorForm),
        (status = 403, description = "Missing can_mark_returned"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorForm>> {
    user.require_mark_returned()?;

    let form = state.services.catalog.author_form(id).await?;
    Ok(Json(form))
}

/// Update an author, then go to their detail page
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/update",
    tag = "authors",
    security(("session_cookie" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Author updated, redirect to their detail page"),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_mark_returned"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(form): Json<AuthorForm>,
) -> AppResult<Redirect> {
    user.require_mark_returned()?;

    let author = state.services.catalog.update_author(id, form).await?;
    Ok(Redirect::to(&author.url()))
}

/// Author to confirm deletion of
#[utoipa::path(
    get,
    path = "/catalog/author/{id}/delete",
    tag = "authors",
    security(("session_cookie" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author to delete", body = Author),
        (status = 403, description = "Missing can_mark_returned"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_confirm(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Author>> {
    user.require_mark_returned()?;

    let author = state.services.catalog.get_author_row(id).await?;
    Ok(Json(author))
}

/// Delete an author, then go to the author list. Their books lose their author.
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/delete",
    tag = "authors",
    security(("session_cookie" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 303, description = "Author deleted, redirect to the author list"),
        (status = 403, description = "Missing can_mark_returned"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    user.require_mark_returned()?;

    state.services.catalog.delete_author(id).await?;
    Ok(Redirect::to(AUTHOR_LIST_URL))
}
