//! Order endpoints

use axum::extract::State;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use shared::models::restaurant::{
    Order, OrderCreate, OrderDetail, OrderFilter, OrderItemInput, OrderStatusUpdate,
};

use crate::api::ApiResult;
use crate::auth::{CurrentUser, access};
use crate::db::restaurant::orders;
use crate::state::AppState;
use crate::validation::{AppJson, AppPath, AppQuery, ValidatedJson};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/companies/{id}/restaurant/orders", get(list).post(create))
        .route("/api/companies/{id}/restaurant/orders/{order_id}", get(get_by_id))
        .route(
            "/api/companies/{id}/restaurant/orders/{order_id}/items",
            post(add_item),
        )
        .route(
            "/api/companies/{id}/restaurant/orders/{order_id}/items/{item_id}",
            delete(remove_item),
        )
        .route(
            "/api/companies/{id}/restaurant/orders/{order_id}/status",
            put(change_status),
        )
}

/// GET .../orders?status&table_id
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppQuery(filter): AppQuery<OrderFilter>,
) -> ApiResult<Vec<Order>> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(orders::list(&state.pool, id, &filter).await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, order_id)): AppPath<(i64, i64)>,
) -> ApiResult<OrderDetail> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(orders::get(&state.pool, id, order_id).await?))
}

/// Opens an order and marks the table OCCUPIED
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<OrderCreate>,
) -> ApiResult<OrderDetail> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(orders::create(&state.pool, id, &req).await?))
}

pub async fn add_item(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, order_id)): AppPath<(i64, i64)>,
    ValidatedJson(req): ValidatedJson<OrderItemInput>,
) -> ApiResult<OrderDetail> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(orders::add_item(&state.pool, id, order_id, &req).await?))
}

/// Only PENDING items can be removed
pub async fn remove_item(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, order_id, item_id)): AppPath<(i64, i64, i64)>,
) -> ApiResult<OrderDetail> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(
        orders::remove_item(&state.pool, id, order_id, item_id).await?,
    ))
}

/// PUT .../orders/{order_id}/status
///
/// Closing with a `payment_method` also records a sale.
pub async fn change_status(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, order_id)): AppPath<(i64, i64)>,
    AppJson(req): AppJson<OrderStatusUpdate>,
) -> ApiResult<OrderDetail> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(
        orders::change_status(
            &state.pool,
            id,
            user.id,
            order_id,
            req.status,
            req.payment_method,
        )
        .await?,
    ))
}
