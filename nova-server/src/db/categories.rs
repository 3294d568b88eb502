//! Product and service categories

use shared::error::{AppError, ErrorCode};
use shared::models::{Category, CategoryCreate, CategoryUpdate};
use sqlx::PgPool;

use super::{now_millis, snowflake_id};
use crate::error::{ServiceError, ServiceResult};

const COLUMNS: &str = "id, company_id, name, description, is_service, created_at, updated_at";
const NAME_KEY: &str = "categories_company_name_kind_key";

pub async fn list(
    pool: &PgPool,
    company_id: i64,
    is_service: Option<bool>,
) -> ServiceResult<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM categories \
         WHERE company_id = $1 AND ($2::bool IS NULL OR is_service = $2) \
         ORDER BY name"
    ))
    .bind(company_id)
    .bind(is_service)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<Option<Category>> {
    let row = sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM categories WHERE company_id = $1 AND id = $2"
    ))
    .bind(company_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Find or fail with `CategoryNotFound`
pub async fn get(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<Category> {
    find(pool, company_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound).into())
}

pub async fn create(pool: &PgPool, company_id: i64, data: &CategoryCreate) -> ServiceResult<Category> {
    let now = now_millis();
    sqlx::query_as::<_, Category>(&format!(
        "INSERT INTO categories (id, company_id, name, description, is_service, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING {COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(company_id)
    .bind(data.name.trim())
    .bind(&data.description)
    .bind(data.is_service)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| ServiceError::on_unique(e, NAME_KEY, ErrorCode::CategoryNameExists))
}

pub async fn update(
    pool: &PgPool,
    company_id: i64,
    id: i64,
    data: &CategoryUpdate,
) -> ServiceResult<Category> {
    sqlx::query_as::<_, Category>(&format!(
        "UPDATE categories SET name = COALESCE($1, name), description = COALESCE($2, description), \
         updated_at = $3 WHERE company_id = $4 AND id = $5 RETURNING {COLUMNS}"
    ))
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(now_millis())
    .bind(company_id)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| ServiceError::on_unique(e, NAME_KEY, ErrorCode::CategoryNameExists))?
    .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound).into())
}

/// Delete a category that no product references
pub async fn delete(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;
    let (in_use,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM products WHERE company_id = $1 AND category_id = $2",
    )
    .bind(company_id)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    if in_use > 0 {
        return Err(AppError::new(ErrorCode::CategoryHasProducts)
            .with_detail("products", in_use)
            .into());
    }

    let result = sqlx::query("DELETE FROM categories WHERE company_id = $1 AND id = $2")
        .bind(company_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::CategoryNotFound).into());
    }
    tx.commit().await?;
    Ok(())
}
