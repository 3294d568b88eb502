//! Audit log operations

use serde::Serialize;
use sqlx::PgPool;

use super::now_millis;
use crate::error::ServiceResult;

pub const COMPANY_UPDATED: &str = "company.updated";
pub const MEMBER_ADDED: &str = "member.added";
pub const MEMBER_ROLE_CHANGED: &str = "member.role_changed";
pub const MEMBER_REMOVED: &str = "member.removed";
pub const EXTENSION_PURCHASED: &str = "extension.purchased";
pub const EXTENSION_DEACTIVATED: &str = "extension.deactivated";
pub const SALE_CANCELLED: &str = "sale.cancelled";
pub const BACKUP_EXPORTED: &str = "backup.exported";

/// Write an audit log entry
pub async fn log(
    pool: &PgPool,
    company_id: i64,
    user_id: i64,
    action: &str,
    detail: Option<serde_json::Value>,
) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO audit_logs (company_id, user_id, action, detail, created_at) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(company_id)
    .bind(user_id)
    .bind(action)
    .bind(detail)
    .bind(now_millis())
    .execute(pool)
    .await?;
    Ok(())
}

/// Best-effort audit: a failed write is logged, never surfaced to the client
pub async fn record(
    pool: &PgPool,
    company_id: i64,
    user_id: i64,
    action: &str,
    detail: serde_json::Value,
) {
    if let Err(e) = log(pool, company_id, user_id, action, Some(detail)).await {
        tracing::warn!(company_id, action, error = ?e, "Failed to write audit log");
    }
}

#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub action: String,
    pub detail: Option<serde_json::Value>,
    pub created_at: i64,
}

pub async fn query(
    pool: &PgPool,
    company_id: i64,
    limit: i64,
    offset: i64,
) -> ServiceResult<(Vec<AuditEntry>, i64)> {
    let rows = sqlx::query_as::<_, AuditEntry>(
        r#"
        SELECT a.id, a.user_id, u.name AS user_name, a.action, a.detail, a.created_at
        FROM audit_logs a
        LEFT JOIN users u ON u.id = a.user_id
        WHERE a.company_id = $1
        ORDER BY a.created_at DESC, a.id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(company_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_logs WHERE company_id = $1")
        .bind(company_id)
        .fetch_one(pool)
        .await?;
    Ok((rows, total))
}
