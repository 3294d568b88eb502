//! Dining table endpoints

use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use shared::models::CompanyRole;
use shared::models::restaurant::{
    DiningTable, DiningTableCreate, DiningTableUpdate, TableStatusUpdate,
};

use crate::api::ApiResult;
use crate::auth::{CurrentUser, access};
use crate::db::restaurant::tables;
use crate::state::AppState;
use crate::validation::{AppJson, AppPath, ValidatedJson};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/companies/{id}/restaurant/tables", get(list).post(create))
        .route(
            "/api/companies/{id}/restaurant/tables/{table_id}",
            get(get_by_id).put(update).delete(delete),
        )
        .route(
            "/api/companies/{id}/restaurant/tables/{table_id}/status",
            put(change_status),
        )
}

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Vec<DiningTable>> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(tables::list(&state.pool, id).await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, table_id)): AppPath<(i64, i64)>,
) -> ApiResult<DiningTable> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(tables::get(&state.pool, id, table_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<DiningTableCreate>,
) -> ApiResult<DiningTable> {
    access::restaurant(&state, &user, id)
        .await?
        .require(CompanyRole::Admin)?;
    Ok(Json(tables::create(&state.pool, id, &req).await?))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, table_id)): AppPath<(i64, i64)>,
    ValidatedJson(req): ValidatedJson<DiningTableUpdate>,
) -> ApiResult<DiningTable> {
    access::restaurant(&state, &user, id)
        .await?
        .require(CompanyRole::Admin)?;
    Ok(Json(tables::update(&state.pool, id, table_id, &req).await?))
}

/// DELETE rejected while the table has an open order
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, table_id)): AppPath<(i64, i64)>,
) -> ApiResult<bool> {
    access::restaurant(&state, &user, id)
        .await?
        .require(CompanyRole::Admin)?;
    tables::delete(&state.pool, id, table_id).await?;
    Ok(Json(true))
}

/// PUT .../tables/{table_id}/status
pub async fn change_status(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, table_id)): AppPath<(i64, i64)>,
    AppJson(req): AppJson<TableStatusUpdate>,
) -> ApiResult<DiningTable> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(
        tables::change_status(&state.pool, id, table_id, req.status).await?,
    ))
}
