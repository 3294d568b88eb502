//! Dining tables

use shared::error::{AppError, ErrorCode};
use shared::models::restaurant::{
    DiningTable, DiningTableCreate, DiningTableUpdate, ReservationStatus, TableStatus,
    check_party_size,
};
use sqlx::{PgPool, Postgres, Transaction};

use super::super::{now_millis, snowflake_id};
use crate::error::{ServiceError, ServiceResult};

const COLUMNS: &str = "id, company_id, number, name, capacity, status, created_at, updated_at";
const NUMBER_KEY: &str = "restaurant_tables_company_number_key";

pub async fn list(pool: &PgPool, company_id: i64) -> ServiceResult<Vec<DiningTable>> {
    let rows = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM restaurant_tables WHERE company_id = $1 ORDER BY number"
    ))
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<DiningTable> {
    sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM restaurant_tables WHERE company_id = $1 AND id = $2"
    ))
    .bind(company_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::TableNotFound).into())
}

/// Lock a table row for a status change
pub async fn lock(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    id: i64,
) -> ServiceResult<DiningTable> {
    sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM restaurant_tables WHERE company_id = $1 AND id = $2 FOR UPDATE"
    ))
    .bind(company_id)
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::TableNotFound).into())
}

/// Write a table status without transition checks (side effects of orders
/// and reservations)
pub async fn set_status(
    tx: &mut Transaction<'_, Postgres>,
    table_id: i64,
    status: TableStatus,
) -> ServiceResult<()> {
    sqlx::query("UPDATE restaurant_tables SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(status.as_str())
        .bind(now_millis())
        .bind(table_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn has_open_order(tx: &mut Transaction<'_, Postgres>, table_id: i64) -> ServiceResult<bool> {
    let (open,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM orders \
         WHERE table_id = $1 AND status NOT IN ('CLOSED', 'CANCELLED'))",
    )
    .bind(table_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(open)
}

pub async fn create(
    pool: &PgPool,
    company_id: i64,
    data: &DiningTableCreate,
) -> ServiceResult<DiningTable> {
    let now = now_millis();
    sqlx::query_as::<_, DiningTable>(&format!(
        "INSERT INTO restaurant_tables ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
         RETURNING {COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(company_id)
    .bind(data.number)
    .bind(data.name.as_deref().map(str::trim).filter(|s| !s.is_empty()))
    .bind(data.capacity)
    .bind(TableStatus::Free.as_str())
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| ServiceError::on_unique(e, NUMBER_KEY, ErrorCode::TableNumberExists))
}

pub async fn update(
    pool: &PgPool,
    company_id: i64,
    id: i64,
    data: &DiningTableUpdate,
) -> ServiceResult<DiningTable> {
    let mut tx = pool.begin().await?;
    lock(&mut tx, company_id, id).await?;
    if let Some(capacity) = data.capacity
        && let Some(largest) = largest_active_party(&mut tx, id).await?
    {
        check_party_size(largest, capacity)?;
    }

    let table = sqlx::query_as::<_, DiningTable>(&format!(
        "UPDATE restaurant_tables SET \
            number = COALESCE($1, number), \
            name = COALESCE($2, name), \
            capacity = COALESCE($3, capacity), \
            updated_at = $4 \
         WHERE company_id = $5 AND id = $6 RETURNING {COLUMNS}"
    ))
    .bind(data.number)
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.capacity)
    .bind(now_millis())
    .bind(company_id)
    .bind(id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| ServiceError::on_unique(e, NUMBER_KEY, ErrorCode::TableNumberExists))?;
    tx.commit().await?;
    Ok(table)
}

/// Largest party among the pending and confirmed reservations on a table
async fn largest_active_party(
    tx: &mut Transaction<'_, Postgres>,
    table_id: i64,
) -> ServiceResult<Option<i32>> {
    let active: Vec<&str> = ReservationStatus::ACTIVE.iter().map(|s| s.as_str()).collect();
    let (largest,): (Option<i32>,) = sqlx::query_as(
        "SELECT MAX(party_size) FROM reservations WHERE table_id = $1 AND status = ANY($2)",
    )
    .bind(table_id)
    .bind(&active)
    .fetch_one(&mut **tx)
    .await?;
    Ok(largest)
}

/// Manual status change, validated against the table state machine
pub async fn change_status(
    pool: &PgPool,
    company_id: i64,
    id: i64,
    next: TableStatus,
) -> ServiceResult<DiningTable> {
    let mut tx = pool.begin().await?;
    let table = lock(&mut tx, company_id, id).await?;
    if table.status == next {
        return Ok(table);
    }
    table.status.transition(next)?;
    if next == TableStatus::Free && has_open_order(&mut tx, id).await? {
        return Err(AppError::new(ErrorCode::TableHasOpenOrder).into());
    }
    set_status(&mut tx, id, next).await?;
    tx.commit().await?;

    tracing::debug!(company_id, table_id = id, from = %table.status, to = %next, "Table status changed");
    get(pool, company_id, id).await
}

pub async fn delete(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;
    lock(&mut tx, company_id, id).await?;
    if has_open_order(&mut tx, id).await? {
        return Err(AppError::new(ErrorCode::TableHasOpenOrder).into());
    }
    sqlx::query("DELETE FROM restaurant_tables WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}
