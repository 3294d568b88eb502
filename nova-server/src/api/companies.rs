//! Company endpoints

use axum::extract::{Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::models::{Company, CompanyCreate, CompanyRole, CompanyUpdate, CompanyWithRole};

use super::{ApiResult, upload_body_limit, uploads};
use crate::auth::{CurrentUser, access};
use crate::db;
use crate::state::AppState;
use crate::storage::public_url;
use crate::validation::{AppPath, ValidatedJson};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/companies", get(list).post(create))
        .route(
            "/api/companies/{id}",
            get(get_by_id).put(update).delete(delete),
        )
        .route(
            "/api/companies/{id}/logo",
            post(upload_logo).layer(upload_body_limit(state.max_upload_bytes)),
        )
}

fn not_found() -> AppError {
    AppError::new(ErrorCode::CompanyNotFound)
}

/// POST /api/companies - the creator becomes OWNER
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CompanyCreate>,
) -> ApiResult<Company> {
    let company = db::companies::create(&state.pool, user.id, &req).await?;
    tracing::info!(company_id = company.id, user_id = user.id, "Company created");
    Ok(Json(company))
}

/// GET /api/companies
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Vec<CompanyWithRole>> {
    let companies = db::companies::list_for_user(&state.pool, user.id).await?;
    Ok(Json(companies))
}

/// GET /api/companies/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> ApiResult<CompanyWithRole> {
    let membership = access::member(&state, &user, id).await?;
    let company = db::companies::find(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(CompanyWithRole {
        company,
        role: membership.role,
    }))
}

/// PUT /api/companies/{id} (OWNER/ADMIN)
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<CompanyUpdate>,
) -> ApiResult<Company> {
    access::admin(&state, &user, id).await?;
    let company = db::companies::update(&state.pool, id, &req)
        .await?
        .ok_or_else(not_found)?;

    db::audit::record(
        &state.pool,
        id,
        user.id,
        db::audit::COMPANY_UPDATED,
        serde_json::to_value(&req).unwrap_or_default(),
    )
    .await;
    Ok(Json(company))
}

/// DELETE /api/companies/{id} (OWNER only)
///
/// All company data cascades. Clients export a backup first.
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> ApiResult<bool> {
    let membership = access::member(&state, &user, id).await?;
    membership.require(CompanyRole::Owner)?;

    if !db::companies::delete(&state.pool, id).await? {
        return Err(not_found());
    }
    // Audit rows cascade with the company; keep the trail in the service log
    tracing::warn!(company_id = id, user_id = user.id, "Company deleted");
    Ok(Json(true))
}

/// POST /api/companies/{id}/logo (OWNER/ADMIN, multipart)
pub async fn upload_logo(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    mut multipart: Multipart,
) -> ApiResult<Company> {
    access::admin(&state, &user, id).await?;
    let (filename, data) = uploads::read_file_field(&mut multipart).await?;
    let stored = state
        .images
        .save(&filename, &data, state.max_upload_bytes)
        .await?;
    let company = db::companies::set_logo(&state.pool, id, &public_url(&stored))
        .await?
        .ok_or_else(not_found)?;

    db::audit::record(
        &state.pool,
        id,
        user.id,
        db::audit::COMPANY_UPDATED,
        json!({ "logo_url": company.logo_url }),
    )
    .await;
    Ok(Json(company))
}
