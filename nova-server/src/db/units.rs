//! Product units of measure

use shared::error::{AppError, ErrorCode};
use shared::models::{ProductUnit, ProductUnitCreate, ProductUnitUpdate};
use sqlx::PgPool;

use super::{now_millis, snowflake_id};
use crate::error::{ServiceError, ServiceResult};

const COLUMNS: &str = "id, company_id, name, abbreviation, created_at";
const ABBREVIATION_KEY: &str = "product_units_company_abbreviation_key";

pub async fn list(pool: &PgPool, company_id: i64) -> ServiceResult<Vec<ProductUnit>> {
    let rows = sqlx::query_as::<_, ProductUnit>(&format!(
        "SELECT {COLUMNS} FROM product_units WHERE company_id = $1 ORDER BY name"
    ))
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<ProductUnit> {
    sqlx::query_as::<_, ProductUnit>(&format!(
        "SELECT {COLUMNS} FROM product_units WHERE company_id = $1 AND id = $2"
    ))
    .bind(company_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::UnitNotFound).into())
}

pub async fn create(
    pool: &PgPool,
    company_id: i64,
    data: &ProductUnitCreate,
) -> ServiceResult<ProductUnit> {
    sqlx::query_as::<_, ProductUnit>(&format!(
        "INSERT INTO product_units (id, company_id, name, abbreviation, created_at) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(company_id)
    .bind(data.name.trim())
    .bind(data.abbreviation.trim())
    .bind(now_millis())
    .fetch_one(pool)
    .await
    .map_err(|e| ServiceError::on_unique(e, ABBREVIATION_KEY, ErrorCode::AlreadyExists))
}

pub async fn update(
    pool: &PgPool,
    company_id: i64,
    id: i64,
    data: &ProductUnitUpdate,
) -> ServiceResult<ProductUnit> {
    sqlx::query_as::<_, ProductUnit>(&format!(
        "UPDATE product_units SET name = COALESCE($1, name), abbreviation = COALESCE($2, abbreviation) \
         WHERE company_id = $3 AND id = $4 RETURNING {COLUMNS}"
    ))
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.abbreviation.as_deref().map(str::trim))
    .bind(company_id)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| ServiceError::on_unique(e, ABBREVIATION_KEY, ErrorCode::AlreadyExists))?
    .ok_or_else(|| AppError::new(ErrorCode::UnitNotFound).into())
}

pub async fn delete(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;
    let (in_use,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM products WHERE company_id = $1 AND unit_id = $2")
            .bind(company_id)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
    if in_use > 0 {
        return Err(AppError::new(ErrorCode::UnitInUse)
            .with_detail("products", in_use)
            .into());
    }

    let result = sqlx::query("DELETE FROM product_units WHERE company_id = $1 AND id = $2")
        .bind(company_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::UnitNotFound).into());
    }
    tx.commit().await?;
    Ok(())
}
