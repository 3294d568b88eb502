//! Reservation endpoints

use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use shared::models::restaurant::{
    Reservation, ReservationCreate, ReservationFilter, ReservationStatusUpdate, ReservationUpdate,
};

use crate::api::ApiResult;
use crate::auth::{CurrentUser, access};
use crate::db::restaurant::reservations;
use crate::state::AppState;
use crate::validation::{
    AppJson, AppPath, AppQuery, MAX_NAME_LEN, ValidatedJson, validate_required_text,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/companies/{id}/restaurant/reservations",
            get(list).post(create),
        )
        .route(
            "/api/companies/{id}/restaurant/reservations/{reservation_id}",
            get(get_by_id).put(update).delete(delete),
        )
        .route(
            "/api/companies/{id}/restaurant/reservations/{reservation_id}/status",
            put(change_status),
        )
}

/// GET .../reservations?status&table_id&from&to
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppQuery(filter): AppQuery<ReservationFilter>,
) -> ApiResult<Vec<Reservation>> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(reservations::list(&state.pool, id, &filter).await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, reservation_id)): AppPath<(i64, i64)>,
) -> ApiResult<Reservation> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(reservations::get(&state.pool, id, reservation_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<ReservationCreate>,
) -> ApiResult<Reservation> {
    access::restaurant(&state, &user, id).await?;
    validate_required_text(&req.customer_name, "customer_name", MAX_NAME_LEN)?;
    Ok(Json(reservations::create(&state.pool, id, &req).await?))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, reservation_id)): AppPath<(i64, i64)>,
    ValidatedJson(req): ValidatedJson<ReservationUpdate>,
) -> ApiResult<Reservation> {
    access::restaurant(&state, &user, id).await?;
    if let Some(name) = &req.customer_name {
        validate_required_text(name, "customer_name", MAX_NAME_LEN)?;
    }
    Ok(Json(
        reservations::update(&state.pool, id, reservation_id, &req).await?,
    ))
}

pub async fn change_status(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, reservation_id)): AppPath<(i64, i64)>,
    AppJson(req): AppJson<ReservationStatusUpdate>,
) -> ApiResult<Reservation> {
    access::restaurant(&state, &user, id).await?;
    Ok(Json(
        reservations::change_status(&state.pool, id, reservation_id, req.status).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, reservation_id)): AppPath<(i64, i64)>,
) -> ApiResult<bool> {
    access::restaurant(&state, &user, id).await?;
    reservations::delete(&state.pool, id, reservation_id).await?;
    Ok(Json(true))
}
