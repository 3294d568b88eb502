//! Extension catalog and per-company activation

use axum::extract::State;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use shared::models::{CompanyExtension, Extension};

use super::ApiResult;
use crate::auth::{CurrentUser, access};
use crate::db;
use crate::state::AppState;
use crate::validation::AppPath;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/extensions", get(catalog))
        .route("/api/companies/{id}/extensions", get(list_for_company))
        .route(
            "/api/companies/{id}/extensions/{key}/purchase",
            post(purchase),
        )
        .route("/api/companies/{id}/extensions/{key}", delete(deactivate))
}

/// GET /api/extensions
pub async fn catalog(State(state): State<AppState>, _user: CurrentUser) -> ApiResult<Vec<Extension>> {
    Ok(Json(db::extensions::list_catalog(&state.pool).await?))
}

/// GET /api/companies/{id}/extensions
pub async fn list_for_company(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Vec<CompanyExtension>> {
    access::member(&state, &user, id).await?;
    Ok(Json(db::extensions::list_for_company(&state.pool, id).await?))
}

/// POST /api/companies/{id}/extensions/{key}/purchase (OWNER/ADMIN)
///
/// Billing is outside this service; purchasing activates immediately.
pub async fn purchase(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, key)): AppPath<(i64, String)>,
) -> ApiResult<Extension> {
    access::admin(&state, &user, id).await?;
    let extension = db::extensions::activate(&state.pool, id, &key).await?;

    db::audit::record(
        &state.pool,
        id,
        user.id,
        db::audit::EXTENSION_PURCHASED,
        json!({ "key": extension.key, "price": extension.price }),
    )
    .await;
    tracing::info!(company_id = id, extension = %extension.key, "Extension activated");
    Ok(Json(extension))
}

/// DELETE /api/companies/{id}/extensions/{key} (OWNER/ADMIN)
pub async fn deactivate(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, key)): AppPath<(i64, String)>,
) -> ApiResult<Extension> {
    access::admin(&state, &user, id).await?;
    let extension = db::extensions::deactivate(&state.pool, id, &key).await?;

    db::audit::record(
        &state.pool,
        id,
        user.id,
        db::audit::EXTENSION_DEACTIVATED,
        json!({ "key": extension.key }),
    )
    .await;
    Ok(Json(extension))
}
