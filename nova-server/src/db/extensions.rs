//! Extension catalog and per-company activation

use shared::error::{AppError, ErrorCode};
use shared::models::{CompanyExtension, Extension};
use sqlx::PgPool;

use super::now_millis;
use crate::error::ServiceResult;

pub async fn list_catalog(pool: &PgPool) -> ServiceResult<Vec<Extension>> {
    let rows = sqlx::query_as::<_, Extension>(
        "SELECT id, key, name, description, price, is_available FROM extensions ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_key(pool: &PgPool, key: &str) -> ServiceResult<Option<Extension>> {
    let row = sqlx::query_as::<_, Extension>(
        "SELECT id, key, name, description, price, is_available FROM extensions WHERE key = $1",
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Catalog with the company's activation state
pub async fn list_for_company(pool: &PgPool, company_id: i64) -> ServiceResult<Vec<CompanyExtension>> {
    let rows = sqlx::query_as::<_, CompanyExtension>(
        r#"
        SELECT e.id, e.key, e.name, e.description, e.price, e.is_available,
               COALESCE(ce.is_active, FALSE) AS active,
               CASE WHEN ce.is_active THEN ce.activated_at END AS activated_at
        FROM extensions e
        LEFT JOIN company_extensions ce ON ce.extension_id = e.id AND ce.company_id = $1
        ORDER BY e.id
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn is_active(pool: &PgPool, company_id: i64, key: &str) -> ServiceResult<bool> {
    let (active,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM company_extensions ce
            JOIN extensions e ON e.id = ce.extension_id
            WHERE ce.company_id = $1 AND e.key = $2 AND ce.is_active
        )
        "#,
    )
    .bind(company_id)
    .bind(key)
    .fetch_one(pool)
    .await?;
    Ok(active)
}

/// Activate an extension. Purchasing an already active one is a conflict.
pub async fn activate(pool: &PgPool, company_id: i64, key: &str) -> ServiceResult<Extension> {
    let ext = find_by_key(pool, key)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ExtensionNotFound))?;
    if !ext.is_available {
        return Err(AppError::with_message(
            ErrorCode::ExtensionNotFound,
            "Extension is not available for purchase",
        )
        .into());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO company_extensions (company_id, extension_id, is_active, activated_at)
        VALUES ($1, $2, TRUE, $3)
        ON CONFLICT (company_id, extension_id)
        DO UPDATE SET is_active = TRUE, activated_at = EXCLUDED.activated_at
        WHERE NOT company_extensions.is_active
        "#,
    )
    .bind(company_id)
    .bind(ext.id)
    .bind(now_millis())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::ExtensionAlreadyActive).into());
    }
    Ok(ext)
}

pub async fn deactivate(pool: &PgPool, company_id: i64, key: &str) -> ServiceResult<Extension> {
    let ext = find_by_key(pool, key)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ExtensionNotFound))?;

    let result = sqlx::query(
        "UPDATE company_extensions SET is_active = FALSE \
         WHERE company_id = $1 AND extension_id = $2 AND is_active",
    )
    .bind(company_id)
    .bind(ext.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::ExtensionNotActive).into());
    }
    Ok(ext)
}
