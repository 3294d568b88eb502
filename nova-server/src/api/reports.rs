//! Dashboard and reports

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use shared::models::extension::EXT_ADVANCED_REPORTS;
use shared::models::{Dashboard, SalesSummary};

use super::ApiResult;
use crate::auth::{CurrentUser, access};
use crate::db;
use crate::state::AppState;
use crate::validation::{AppPath, AppQuery};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/companies/{id}/dashboard", get(dashboard))
        .route("/api/companies/{id}/reports/summary", get(summary))
}

/// GET /api/companies/{id}/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Dashboard> {
    access::member(&state, &user, id).await?;
    Ok(Json(db::reports::dashboard(&state.pool, id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// GET /api/companies/{id}/reports/summary?from&to (requires `advanced_reports`)
pub async fn summary(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppQuery(query): AppQuery<SummaryQuery>,
) -> ApiResult<SalesSummary> {
    access::member(&state, &user, id).await?;
    access::require_extension(&state, id, EXT_ADVANCED_REPORTS).await?;
    Ok(Json(
        db::reports::summary(&state.pool, id, query.from, query.to).await?,
    ))
}
