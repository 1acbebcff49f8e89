//! HTTP layer: router, session cookie middleware and request extractors

pub mod accounts;
pub mod authors;
pub mod books;
pub mod catalog;
pub mod health;
pub mod loans;
pub mod openapi;

use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri, Request, State},
    http::request::Parts,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{error::AppError, models::user::User, services::sessions::Session, AppState};

/// Attach the session named by the session cookie to the request.
///
/// A cookie that is missing, malformed or names a session the store does not
/// hold starts a new session. A handler that moves the session to another id
/// returns it as a response extension, and the cookie follows it.
pub async fn session_layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = state.config.session.cookie_name.clone();
    let claimed = jar
        .get(&cookie_name)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
        .map(Session::new);

    let existing = match claimed {
        Some(session) => match state.services.sessions.is_known(&session).await {
            Ok(true) => Some(session),
            Ok(false) => None,
            Err(e) => return e.into_response(),
        },
        None => None,
    };

    let session = existing.unwrap_or_else(|| Session::new(Uuid::new_v4()));
    request.extensions_mut().insert(session);

    let response = next.run(request).await;
    let current = response
        .extensions()
        .get::<Session>()
        .copied()
        .unwrap_or(session);
    if Some(current) == existing {
        return response;
    }

    let cookie = Cookie::build((cookie_name, current.id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), response).into_response()
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .copied()
            .ok_or_else(|| AppError::Internal("Session layer is not installed".to_string()))
    }
}

/// Extractor for the user logged into the current session.
///
/// Anonymous visitors are redirected to the login page, which sends them
/// back to the page they asked for.
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;

        match state.services.accounts.current_user(&session).await? {
            Some(user) => Ok(AuthenticatedUser(user)),
            None => {
                let uri = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map(|original| original.0.clone())
                    .unwrap_or_else(|| parts.uri.clone());
                let next = uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| uri.path().to_string());
                Err(AppError::LoginRequired { next })
            }
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cookie_name = state.config.session.cookie_name.clone();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let site = Router::new()
        .route("/", get(|| async { Redirect::permanent("/catalog/") }))
        // Catalog
        .route("/catalog/", get(catalog::index))
        .route("/catalog/books/", get(books::list_books))
        .route("/catalog/books/:id", get(books::get_book))
        .route("/catalog/authors/", get(authors::list_authors))
        .route("/catalog/authors/:id", get(authors::get_author))
        // Loans
        .route("/catalog/mybooks/", get(loans::my_loans))
        .route("/catalog/borrowed/", get(loans::all_loans))
        .route(
            "/catalog/book/:id/renew",
            get(loans::renew_form).post(loans::renew),
        )
        .route("/catalog/book/:id/return", post(loans::mark_returned))
        // Authors management
        .route(
            "/catalog/author/create",
            get(authors::create_form).post(authors::create_author),
        )
        .route(
            "/catalog/author/:id/update",
            get(authors::update_form).post(authors::update_author),
        )
        .route(
            "/catalog/author/:id/delete",
            get(authors::delete_confirm).post(authors::delete_author),
        )
        // Books management
        .route(
            "/catalog/book/create",
            get(books::create_form).post(books::create_book),
        )
        .route(
            "/catalog/book/:id/update",
            get(books::update_form).post(books::update_book),
        )
        .route(
            "/catalog/book/:id/delete",
            get(books::delete_confirm).post(books::delete_book),
        )
        // Accounts
        .route(
            "/accounts/login/",
            get(accounts::login_form).post(accounts::login),
        )
        .route("/accounts/logout/", post(accounts::logout))
        .route("/accounts/signup/", post(accounts::signup))
        .layer(middleware::from_fn_with_state(state.clone(), session_layer))
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router(&cookie_name);

    Router::new()
        .merge(site)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
