//! Loan endpoints: the caller's loans, all loans, renewal and returns

use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book_instance::{LoanEntry, RenewForm, RenewFormView},
    rules, AppState,
};

use super::AuthenticatedUser;

const ALL_LOANS_URL: &str = "/catalog/borrowed/";

/// Copies on loan to the current user, earliest due first
#[utoipa::path(
    get,
    path = "/catalog/mybooks/",
    tag = "loans",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "The caller's loans", body = Vec<LoanEntry>),
        (status = 302, description = "Login required")
    )
)]
pub async fn my_loans(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanEntry>>> {
    let loans = state.services.loans.borrowed_by(user.id, rules::today()).await?;
    Ok(Json(loans))
}

/// Every copy on loan with its borrower, earliest due first
#[utoipa::path(
    get,
    path = "/catalog/borrowed/",
    tag = "loans",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "All loans", body = Vec<LoanEntry>),
        (status = 302, description = "Login required"),
        (status = 403, description = "Missing can_mark_returned")
    )
)]
pub async fn all_loans(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanEntry>>> {
    user.require_mark_returned()?;

    let loans = state.services.loans.all_on_loan(rules::today()).await?;
    Ok(Json(loans))
}

/// Renewal form proposing a date three weeks from today
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/renew",
    tag = "loans",
    security(("session_cookie" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Renewal form", body = RenewFormView),
        (status = 403, description = "Missing can_mark_returned"),
        (status = 404, description = "Book instance not found"),
        (status = 409, description = "Book instance is not on loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn renew_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewFormView>> {
    user.require_mark_returned()?;

    let view = state.services.loans.renewal_form(id, rules::today()).await?;
    Ok(Json(view))
}

/// Set a new due date, then go to the list of all loans
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/renew",
    tag = "loans",
    security(("session_cookie" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = RenewForm,
    responses(
        (status = 303, description = "Renewed, redirect to all loans"),
        (status = 400, description = "Date outside the renewal window", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(form): Json<RenewForm>,
) -> AppResult<Redirect> {
    user.require_mark_returned()?;

    state.services.loans.renew(id, form, rules::today()).await?;
    Ok(Redirect::to(ALL_LOANS_URL))
}

/// Mark a copy as returned, then go to the list of all loans
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/return",
    tag = "loans",
    security(("session_cookie" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 303, description = "Returned, redirect to all loans"),
        (status = 403, description = "Missing can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn mark_returned(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    user.require_mark_returned()?;

    state.services.loans.mark_returned(id).await?;
    Ok(Redirect::to(ALL_LOANS_URL))
}
