//! Account endpoints: login, logout and signup

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::user::{LoginForm, SignupForm, User},
    services::{accounts::LOGIN_REDIRECT_URL, sessions::Session},
    AppState,
};

/// `?next=` carried from a protected page to the login form
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NextQuery {
    /// Page to go back to after login
    pub next: Option<String>,
}

/// Login form as displayed
#[derive(Serialize, ToSchema)]
pub struct LoginPage {
    pub next: Option<String>,
    /// Already logged-in user, if any
    pub user: Option<User>,
}

#[utoipa::path(
    get,
    path = "/accounts/login/",
    tag = "accounts",
    params(NextQuery),
    responses(
        (status = 200, description = "Login form", body = LoginPage)
    )
)]
pub async fn login_form(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NextQuery>,
) -> AppResult<Json<LoginPage>> {
    let user = state.services.accounts.current_user(&session).await?;
    Ok(Json(LoginPage {
        next: query.next,
        user,
    }))
}

/// Log in, then go to `next`.
///
/// The session moves to a new id; `session_layer` sends the new cookie.
#[utoipa::path(
    post,
    path = "/accounts/login/",
    tag = "accounts",
    request_body = LoginForm,
    responses(
        (status = 303, description = "Logged in, redirect to next"),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> AppResult<(Extension<Session>, Redirect)> {
    let logged_in = state.services.accounts.login(&session, form).await?;
    Ok((Extension(logged_in.session), Redirect::to(&logged_in.next)))
}

#[utoipa::path(
    post,
    path = "/accounts/logout/",
    tag = "accounts",
    responses(
        (status = 303, description = "Logged out, redirect to the catalog")
    )
)]
pub async fn logout(State(state): State<AppState>, session: Session) -> AppResult<Redirect> {
    state.services.accounts.logout(&session).await?;
    Ok(Redirect::to(LOGIN_REDIRECT_URL))
}

/// Create an account without permissions
#[utoipa::path(
    post,
    path = "/accounts/signup/",
    tag = "accounts",
    request_body = SignupForm,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 409, description = "Username taken", body = crate::error::ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(form): Json<SignupForm>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.services.accounts.signup(form).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
