//! Category endpoints

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use shared::models::{Category, CategoryCreate, CategoryUpdate};

use super::ApiResult;
use crate::auth::{CurrentUser, access};
use crate::db;
use crate::state::AppState;
use crate::validation::{AppPath, AppQuery, MAX_NAME_LEN, ValidatedJson, validate_required_text};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/companies/{id}/categories", get(list).post(create))
        .route(
            "/api/companies/{id}/categories/{category_id}",
            get(get_by_id).put(update).delete(delete),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub is_service: Option<bool>,
}

/// GET /api/companies/{id}/categories?is_service=
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppQuery(query): AppQuery<CategoryQuery>,
) -> ApiResult<Vec<Category>> {
    access::member(&state, &user, id).await?;
    let categories = db::categories::list(&state.pool, id, query.is_service).await?;
    Ok(Json(categories))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, category_id)): AppPath<(i64, i64)>,
) -> ApiResult<Category> {
    access::member(&state, &user, id).await?;
    Ok(Json(db::categories::get(&state.pool, id, category_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<CategoryCreate>,
) -> ApiResult<Category> {
    access::admin(&state, &user, id).await?;
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
    Ok(Json(db::categories::create(&state.pool, id, &req).await?))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, category_id)): AppPath<(i64, i64)>,
    ValidatedJson(req): ValidatedJson<CategoryUpdate>,
) -> ApiResult<Category> {
    access::admin(&state, &user, id).await?;
    if let Some(name) = &req.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    Ok(Json(
        db::categories::update(&state.pool, id, category_id, &req).await?,
    ))
}

/// DELETE rejected while products reference the category
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, category_id)): AppPath<(i64, i64)>,
) -> ApiResult<bool> {
    access::admin(&state, &user, id).await?;
    db::categories::delete(&state.pool, id, category_id).await?;
    Ok(Json(true))
}
