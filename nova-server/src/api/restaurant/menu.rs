//! Menu item endpoints

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use shared::models::CompanyRole;
use shared::models::restaurant::{MenuItem, MenuItemCreate, MenuItemFilter, MenuItemUpdate};

use crate::api::ApiResult;
use crate::auth::{CurrentUser, access};
use crate::db::restaurant::menu::{self, MenuDeleteOutcome};
use crate::state::AppState;
use crate::validation::{AppPath, AppQuery, MAX_NAME_LEN, ValidatedJson, validate_required_text};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/companies/{id}/restaurant/menu", get(list).post(create))
        .route(
            "/api/companies/{id}/restaurant/menu/{item_id}",
            get(get_by_id).put(update).delete(delete),
        )
}

/// GET .../menu?available&category
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppQuery(filter): AppQuery<MenuItemFilter>,
) -> ApiResult<Vec<MenuItem>> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(menu::list(&state.pool, id, &filter).await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, item_id)): AppPath<(i64, i64)>,
) -> ApiResult<MenuItem> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(menu::get(&state.pool, id, item_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<MenuItemCreate>,
) -> ApiResult<MenuItem> {
    access::restaurant(&state, &user, id)
        .await?
        .require(CompanyRole::Admin)?;
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
    Ok(Json(menu::create(&state.pool, id, &req).await?))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, item_id)): AppPath<(i64, i64)>,
    ValidatedJson(req): ValidatedJson<MenuItemUpdate>,
) -> ApiResult<MenuItem> {
    access::restaurant(&state, &user, id)
        .await?
        .require(CompanyRole::Admin)?;
    if let Some(name) = &req.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    Ok(Json(menu::update(&state.pool, id, item_id, &req).await?))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub outcome: MenuDeleteOutcome,
}

/// Items already ordered are disabled instead of removed
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, item_id)): AppPath<(i64, i64)>,
) -> ApiResult<DeleteResponse> {
    access::restaurant(&state, &user, id)
        .await?
        .require(CompanyRole::Admin)?;
    let outcome = menu::delete(&state.pool, id, item_id).await?;
    Ok(Json(DeleteResponse { outcome }))
}
