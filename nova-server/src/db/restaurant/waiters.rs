//! Waiters

use shared::error::{AppError, ErrorCode};
use shared::models::restaurant::{Waiter, WaiterCreate, WaiterUpdate};
use sqlx::PgPool;

use super::super::{now_millis, snowflake_id};
use crate::error::ServiceResult;

const COLUMNS: &str = "id, company_id, name, phone, is_active, created_at, updated_at";

pub async fn list(pool: &PgPool, company_id: i64, active: Option<bool>) -> ServiceResult<Vec<Waiter>> {
    let rows = sqlx::query_as::<_, Waiter>(&format!(
        "SELECT {COLUMNS} FROM waiters \
         WHERE company_id = $1 AND ($2::bool IS NULL OR is_active = $2) ORDER BY name"
    ))
    .bind(company_id)
    .bind(active)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<Waiter> {
    sqlx::query_as::<_, Waiter>(&format!(
        "SELECT {COLUMNS} FROM waiters WHERE company_id = $1 AND id = $2"
    ))
    .bind(company_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::WaiterNotFound).into())
}

pub async fn create(pool: &PgPool, company_id: i64, data: &WaiterCreate) -> ServiceResult<Waiter> {
    let now = now_millis();
    let row = sqlx::query_as::<_, Waiter>(&format!(
        "INSERT INTO waiters ({COLUMNS}) VALUES ($1, $2, $3, $4, TRUE, $5, $5) RETURNING {COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(company_id)
    .bind(data.name.trim())
    .bind(&data.phone)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update(
    pool: &PgPool,
    company_id: i64,
    id: i64,
    data: &WaiterUpdate,
) -> ServiceResult<Waiter> {
    sqlx::query_as::<_, Waiter>(&format!(
        "UPDATE waiters SET \
            name = COALESCE($1, name), \
            phone = COALESCE($2, phone), \
            is_active = COALESCE($3, is_active), \
            updated_at = $4 \
         WHERE company_id = $5 AND id = $6 RETURNING {COLUMNS}"
    ))
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.phone)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(company_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::WaiterNotFound).into())
}

/// Orders keep their history; the FK sets `waiter_id` to NULL
pub async fn delete(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<()> {
    let result = sqlx::query("DELETE FROM waiters WHERE company_id = $1 AND id = $2")
        .bind(company_id)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::WaiterNotFound).into());
    }
    Ok(())
}
