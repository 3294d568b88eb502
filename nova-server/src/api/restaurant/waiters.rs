//! Waiter endpoints

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use shared::models::CompanyRole;
use shared::models::restaurant::{Waiter, WaiterCreate, WaiterUpdate};

use crate::api::ApiResult;
use crate::auth::{CurrentUser, access};
use crate::db::restaurant::waiters;
use crate::state::AppState;
use crate::validation::{AppPath, AppQuery, MAX_NAME_LEN, ValidatedJson, validate_required_text};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/companies/{id}/restaurant/waiters", get(list).post(create))
        .route(
            "/api/companies/{id}/restaurant/waiters/{waiter_id}",
            get(get_by_id).put(update).delete(delete),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct WaiterQuery {
    pub active: Option<bool>,
}

/// GET .../waiters?active=
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppQuery(query): AppQuery<WaiterQuery>,
) -> ApiResult<Vec<Waiter>> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(waiters::list(&state.pool, id, query.active).await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, waiter_id)): AppPath<(i64, i64)>,
) -> ApiResult<Waiter> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(waiters::get(&state.pool, id, waiter_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<WaiterCreate>,
) -> ApiResult<Waiter> {
    access::restaurant(&state, &user, id)
        .await?
        .require(CompanyRole::Admin)?;
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
    Ok(Json(waiters::create(&state.pool, id, &req).await?))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, waiter_id)): AppPath<(i64, i64)>,
    ValidatedJson(req): ValidatedJson<WaiterUpdate>,
) -> ApiResult<Waiter> {
    access::restaurant(&state, &user, id)
        .await?
        .require(CompanyRole::Admin)?;
    if let Some(name) = &req.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    Ok(Json(waiters::update(&state.pool, id, waiter_id, &req).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, waiter_id)): AppPath<(i64, i64)>,
) -> ApiResult<bool> {
    access::restaurant(&state, &user, id)
        .await?
        .require(CompanyRole::Admin)?;
    waiters::delete(&state.pool, id, waiter_id).await?;
    Ok(Json(true))
}
