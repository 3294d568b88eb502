//! Backup export endpoint

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use http::header;
use serde_json::json;
use shared::error::AppError;
use shared::models::extension::EXT_RESTAURANT;

use crate::auth::{CurrentUser, access};
use crate::backup::{archive_name, build_zip};
use crate::db;
use crate::state::AppState;
use crate::validation::AppPath;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/companies/{id}/backup", get(export))
}

/// GET /api/companies/{id}/backup (OWNER/ADMIN) → `application/zip`
pub async fn export(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    access::admin(&state, &user, id).await?;

    let include_restaurant = db::extensions::is_active(&state.pool, id, EXT_RESTAURANT).await?;
    let files = db::backup::export_company(&state.pool, id, include_restaurant).await?;
    let archive = build_zip(&files)?;

    db::audit::record(
        &state.pool,
        id,
        user.id,
        db::audit::BACKUP_EXPORTED,
        json!({ "files": files.len(), "bytes": archive.len() }),
    )
    .await;
    tracing::info!(company_id = id, bytes = archive.len(), "Backup exported");

    let disposition = format!(
        "attachment; filename=\"{}\"",
        archive_name(id, shared::util::now_millis())
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive,
    ))
}
