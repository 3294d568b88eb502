//! Menu items

use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::restaurant::{MenuItem, MenuItemCreate, MenuItemFilter, MenuItemUpdate};
use sqlx::PgPool;

use super::super::{now_millis, snowflake_id};
use crate::error::ServiceResult;

const COLUMNS: &str = "id, company_id, name, description, price, category, is_available, \
                       product_id, preparation_minutes, created_at, updated_at";

pub async fn list(
    pool: &PgPool,
    company_id: i64,
    filter: &MenuItemFilter,
) -> ServiceResult<Vec<MenuItem>> {
    let rows = sqlx::query_as::<_, MenuItem>(&format!(
        "SELECT {COLUMNS} FROM menu_items \
         WHERE company_id = $1 \
           AND ($2::bool IS NULL OR is_available = $2) \
           AND ($3::text IS NULL OR category = $3) \
         ORDER BY category NULLS LAST, name"
    ))
    .bind(company_id)
    .bind(filter.available)
    .bind(&filter.category)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<MenuItem> {
    sqlx::query_as::<_, MenuItem>(&format!(
        "SELECT {COLUMNS} FROM menu_items WHERE company_id = $1 AND id = $2"
    ))
    .bind(company_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::MenuItemNotFound).into())
}

/// Linked product must belong to the same company
async fn check_product(pool: &PgPool, company_id: i64, product_id: i64) -> ServiceResult<()> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM products WHERE company_id = $1 AND id = $2)",
    )
    .bind(company_id)
    .bind(product_id)
    .fetch_one(pool)
    .await?;
    if !exists {
        return Err(AppError::new(ErrorCode::ProductNotFound)
            .with_detail("product_id", product_id)
            .into());
    }
    Ok(())
}

pub async fn create(pool: &PgPool, company_id: i64, data: &MenuItemCreate) -> ServiceResult<MenuItem> {
    if let Some(product_id) = data.product_id {
        check_product(pool, company_id, product_id).await?;
    }
    let now = now_millis();
    let row = sqlx::query_as::<_, MenuItem>(&format!(
        "INSERT INTO menu_items ({COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) RETURNING {COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(company_id)
    .bind(data.name.trim())
    .bind(&data.description)
    .bind(data.price)
    .bind(data.category.as_deref().map(str::trim).filter(|s| !s.is_empty()))
    .bind(data.is_available)
    .bind(data.product_id)
    .bind(data.preparation_minutes)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update(
    pool: &PgPool,
    company_id: i64,
    id: i64,
    data: &MenuItemUpdate,
) -> ServiceResult<MenuItem> {
    if let Some(product_id) = data.product_id {
        check_product(pool, company_id, product_id).await?;
    }
    sqlx::query_as::<_, MenuItem>(&format!(
        "UPDATE menu_items SET \
            name = COALESCE($1, name), \
            description = COALESCE($2, description), \
            price = COALESCE($3, price), \
            category = COALESCE($4, category), \
            is_available = COALESCE($5, is_available), \
            product_id = COALESCE($6, product_id), \
            preparation_minutes = COALESCE($7, preparation_minutes), \
            updated_at = $8 \
         WHERE company_id = $9 AND id = $10 RETURNING {COLUMNS}"
    ))
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(data.price)
    .bind(data.category.as_deref().map(str::trim))
    .bind(data.is_available)
    .bind(data.product_id)
    .bind(data.preparation_minutes)
    .bind(now_millis())
    .bind(company_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::MenuItemNotFound).into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuDeleteOutcome {
    Deleted,
    /// Referenced by past orders; marked unavailable instead
    Disabled,
}

pub async fn delete(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<MenuDeleteOutcome> {
    get(pool, company_id, id).await?;

    let (referenced,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM order_items WHERE menu_item_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;

    if referenced {
        sqlx::query("UPDATE menu_items SET is_available = FALSE, updated_at = $1 WHERE id = $2")
            .bind(now_millis())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(MenuDeleteOutcome::Disabled)
    } else {
        sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(MenuDeleteOutcome::Deleted)
    }
}
