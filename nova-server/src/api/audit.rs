//! Audit log endpoint

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use shared::models::{Page, Pagination};

use super::ApiResult;
use crate::auth::{CurrentUser, access};
use crate::db;
use crate::db::audit::AuditEntry;
use crate::state::AppState;
use crate::validation::{AppPath, AppQuery};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/companies/{id}/audit", get(list))
}

/// GET /api/companies/{id}/audit?page&per_page (OWNER/ADMIN), newest first
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppQuery(page): AppQuery<Pagination>,
) -> ApiResult<Page<AuditEntry>> {
    access::admin(&state, &user, id).await?;
    let (entries, total) =
        db::audit::query(&state.pool, id, page.per_page(), page.offset()).await?;
    Ok(Json(Page::new(entries, total, page.page(), page.per_page())))
}
