//! Sale endpoints

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use shared::error::AppError;
use shared::models::{
    Page, Pagination, Sale, SaleCancel, SaleCreate, SaleDetail, SaleFilter,
};
use validator::Validate;

use super::ApiResult;
use crate::auth::{CurrentUser, access};
use crate::db;
use crate::state::AppState;
use crate::validation::{AppJson, AppPath, AppQuery, ValidatedJson, normalize_optional};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/companies/{id}/sales", get(list).post(create))
        .route("/api/companies/{id}/sales/{sale_id}", get(get_by_id))
        .route("/api/companies/{id}/sales/{sale_id}/cancel", post(cancel))
}

/// GET /api/companies/{id}/sales?from&to&status&page&per_page
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppQuery(filter): AppQuery<SaleFilter>,
    AppQuery(page): AppQuery<Pagination>,
) -> ApiResult<Page<Sale>> {
    access::member(&state, &user, id).await?;
    Ok(Json(db::sales::list(&state.pool, id, &filter, &page).await?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, sale_id)): AppPath<(i64, i64)>,
) -> ApiResult<SaleDetail> {
    access::member(&state, &user, id).await?;
    Ok(Json(db::sales::get(&state.pool, id, sale_id).await?))
}

/// POST /api/companies/{id}/sales
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    ValidatedJson(mut req): ValidatedJson<SaleCreate>,
) -> ApiResult<SaleDetail> {
    access::member(&state, &user, id).await?;
    req.customer_name = normalize_optional(req.customer_name.as_deref());
    req.notes = normalize_optional(req.notes.as_deref());
    Ok(Json(db::sales::create(&state.pool, id, user.id, &req).await?))
}

/// POST /api/companies/{id}/sales/{sale_id}/cancel (OWNER/ADMIN)
///
/// The body `{reason?}` is optional.
pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, sale_id)): AppPath<(i64, i64)>,
    body: Option<AppJson<SaleCancel>>,
) -> ApiResult<SaleDetail> {
    access::admin(&state, &user, id).await?;
    let req = body.map(|AppJson(b)| b).unwrap_or_default();
    req.validate().map_err(|e| AppError::validation_errors(&e))?;
    let sale = db::sales::cancel(&state.pool, id, user.id, sale_id, &req).await?;

    db::audit::record(
        &state.pool,
        id,
        user.id,
        db::audit::SALE_CANCELLED,
        json!({ "sale_id": sale_id, "total": sale.sale.total, "reason": req.reason }),
    )
    .await;
    Ok(Json(sale))
}
