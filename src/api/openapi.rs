//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{accounts, authors, books, catalog, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Catalog API",
        version = "0.1.0",
        description = "Books, authors, copies and loans of a small library"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Catalog
        catalog::index,
        // Books
        books::list_books,
        books::get_book,
        books::create_form,
        books::create_book,
        books::update_form,
        books::update_book,
        books::delete_confirm,
        books::delete_book,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_form,
        authors::create_author,
        authors::update_form,
        authors::update_author,
        authors::delete_confirm,
        authors::delete_author,
        // Loans
        loans::my_loans,
        loans::all_loans,
        loans::renew_form,
        loans::renew,
        loans::mark_returned,
        // Accounts
        accounts::login_form,
        accounts::login,
        accounts::logout,
        accounts::signup,
    ),
    components(
        schemas(
            // Catalog
            crate::models::stats::CatalogStats,
            crate::models::genre::Genre,
            crate::models::genre::Language,
            // Books
            crate::models::book::Book,
            crate::models::book::BookListEntry,
            crate::models::book::BookDetails,
            crate::models::book::BookForm,
            crate::models::book::BookFormChoices,
            crate::models::book::BookFormView,
            // Authors
            crate::models::author::Author,
            crate::models::author::AuthorDetails,
            crate::models::author::AuthorForm,
            // Loans
            crate::models::book_instance::LoanStatus,
            crate::models::book_instance::BookInstance,
            crate::models::book_instance::LoanEntry,
            crate::models::book_instance::RenewForm,
            crate::models::book_instance::RenewFormView,
            // Accounts
            crate::models::user::User,
            crate::models::user::Permission,
            crate::models::user::LoginForm,
            crate::models::user::SignupForm,
            accounts::LoginPage,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::FormErrors,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Catalog home page"),
        (name = "books", description = "Books and their management"),
        (name = "authors", description = "Authors and their management"),
        (name = "loans", description = "Loans, renewals and returns"),
        (name = "accounts", description = "Login, logout and signup")
    )
)]
pub struct ApiDoc;

/// Documents the session cookie used by protected endpoints
struct SessionCookie<'a> {
    cookie_name: &'a str,
}

impl Modify for SessionCookie<'_> {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(self.cookie_name))),
            );
        }
    }
}

/// OpenAPI document with the configured session cookie name
pub fn api_doc(cookie_name: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    SessionCookie { cookie_name }.modify(&mut doc);
    doc
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router(cookie_name: &str) -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc(cookie_name)))
}
