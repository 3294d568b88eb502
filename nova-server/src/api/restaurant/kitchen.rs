//! Kitchen display endpoints

use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use shared::models::restaurant::{KitchenItem, KitchenItemUpdate, OrderDetail};

use crate::api::ApiResult;
use crate::auth::{CurrentUser, access};
use crate::db::restaurant::orders;
use crate::state::AppState;
use crate::validation::{AppJson, AppPath};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/companies/{id}/restaurant/kitchen", get(queue))
        .route(
            "/api/companies/{id}/restaurant/kitchen/items/{item_id}",
            put(update_item),
        )
}

/// Items still being worked on, oldest first
pub async fn queue(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Vec<KitchenItem>> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(orders::kitchen(&state.pool, id).await?))
}

pub async fn update_item(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, item_id)): AppPath<(i64, i64)>,
    AppJson(req): AppJson<KitchenItemUpdate>,
) -> ApiResult<OrderDetail> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(
        orders::update_kitchen_item(&state.pool, id, item_id, req.status).await?,
    ))
}
