//! Product unit endpoints

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use shared::models::{ProductUnit, ProductUnitCreate, ProductUnitUpdate};

use super::ApiResult;
use crate::auth::{CurrentUser, access};
use crate::db;
use crate::state::AppState;
use crate::validation::{AppPath, ValidatedJson};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/companies/{id}/units", get(list).post(create))
        .route(
            "/api/companies/{id}/units/{unit_id}",
            get(get_by_id).put(update).delete(delete),
        )
}

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Vec<ProductUnit>> {
    access::member(&state, &user, id).await?;
    Ok(Json(db::units::list(&state.pool, id).await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, unit_id)): AppPath<(i64, i64)>,
) -> ApiResult<ProductUnit> {
    access::member(&state, &user, id).await?;
    Ok(Json(db::units::get(&state.pool, id, unit_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<ProductUnitCreate>,
) -> ApiResult<ProductUnit> {
    access::admin(&state, &user, id).await?;
    Ok(Json(db::units::create(&state.pool, id, &req).await?))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, unit_id)): AppPath<(i64, i64)>,
    ValidatedJson(req): ValidatedJson<ProductUnitUpdate>,
) -> ApiResult<ProductUnit> {
    access::admin(&state, &user, id).await?;
    Ok(Json(db::units::update(&state.pool, id, unit_id, &req).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, unit_id)): AppPath<(i64, i64)>,
) -> ApiResult<bool> {
    access::admin(&state, &user, id).await?;
    db::units::delete(&state.pool, id, unit_id).await?;
    Ok(Json(true))
}
