//! Product and service endpoints
//!
//! Services (`is_service = true`) can only be created while the company has
//! the `services_management` extension.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use shared::models::extension::EXT_SERVICES;
use shared::models::{Page, Pagination, Product, ProductCreate, ProductFilter, ProductUpdate};

use super::ApiResult;
use crate::auth::{CurrentUser, access};
use crate::db;
use crate::db::products::DeleteOutcome;
use crate::state::AppState;
use crate::validation::{AppPath, AppQuery, MAX_NAME_LEN, ValidatedJson, validate_required_text};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/companies/{id}/products", get(list).post(create))
        .route(
            "/api/companies/{id}/products/{product_id}",
            get(get_by_id).put(update).delete(delete),
        )
}

/// GET /api/companies/{id}/products?is_service&category_id&search&low_stock&active&page&per_page
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppQuery(filter): AppQuery<ProductFilter>,
    AppQuery(page): AppQuery<Pagination>,
) -> ApiResult<Page<Product>> {
    access::member(&state, &user, id).await?;
    Ok(Json(db::products::list(&state.pool, id, &filter, &page).await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, product_id)): AppPath<(i64, i64)>,
) -> ApiResult<Product> {
    access::member(&state, &user, id).await?;
    Ok(Json(db::products::get(&state.pool, id, product_id).await?))
}

/// POST /api/companies/{id}/products
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<ProductCreate>,
) -> ApiResult<Product> {
    access::admin(&state, &user, id).await?;
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
    if req.is_service {
        access::require_extension(&state, id, EXT_SERVICES).await?;
    }
    let product = db::products::create(&state.pool, id, user.id, &req).await?;
    tracing::info!(company_id = id, product_id = product.id, is_service = product.is_service, "Product created");
    Ok(Json(product))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, product_id)): AppPath<(i64, i64)>,
    ValidatedJson(req): ValidatedJson<ProductUpdate>,
) -> ApiResult<Product> {
    access::admin(&state, &user, id).await?;
    if let Some(name) = &req.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    Ok(Json(
        db::products::update(&state.pool, id, product_id, &req).await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub outcome: DeleteOutcome,
}

/// DELETE keeps products with history (deactivates them)
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, product_id)): AppPath<(i64, i64)>,
) -> ApiResult<DeleteResponse> {
    access::admin(&state, &user, id).await?;
    let outcome = db::products::delete(&state.pool, id, product_id).await?;
    Ok(Json(DeleteResponse { outcome }))
}
