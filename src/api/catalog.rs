//! Catalog home page

use axum::{extract::State, Json};

use crate::{error::AppResult, models::stats::CatalogStats, services::sessions::Session, AppState};

/// Catalog counts and the number of earlier visits from this session
#[utoipa::path(
    get,
    path = "/catalog/",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog counts", body = CatalogStats)
    )
)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<CatalogStats>> {
    let num_visits = state.services.sessions.record_visit(&session).await?;
    let stats = state.services.catalog.stats(num_visits).await?;
    Ok(Json(stats))
}
