//! Stock movement endpoints
//!
//! Movements are append-only: there is no update or delete.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use shared::models::{MovementCreate, MovementFilter, Page, Pagination, StockMovement};

use super::ApiResult;
use crate::auth::{CurrentUser, access};
use crate::db;
use crate::state::AppState;
use crate::validation::{AppPath, AppQuery, ValidatedJson};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/companies/{id}/movements", get(list).post(create))
        .route(
            "/api/companies/{id}/movements/{movement_id}",
            get(get_by_id),
        )
}

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppQuery(filter): AppQuery<MovementFilter>,
    AppQuery(page): AppQuery<Pagination>,
) -> ApiResult<Page<StockMovement>> {
    access::member(&state, &user, id).await?;
    Ok(Json(db::movements::list(&state.pool, id, &filter, &page).await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, movement_id)): AppPath<(i64, i64)>,
) -> ApiResult<StockMovement> {
    access::member(&state, &user, id).await?;
    Ok(Json(db::movements::get(&state.pool, id, movement_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<MovementCreate>,
) -> ApiResult<StockMovement> {
    access::member(&state, &user, id).await?;
    Ok(Json(db::movements::create(&state.pool, id, user.id, &req).await?))
}
