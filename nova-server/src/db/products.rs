//! Products and services

use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    MovementType, Page, Pagination, Product, ProductCreate, ProductFilter, ProductUpdate,
    ensure_category_kind,
};
use sqlx::{PgPool, Postgres, Transaction};

use super::movements::{self, NewMovement};
use super::{now_millis, snowflake_id};
use crate::error::{ServiceError, ServiceResult};

const SKU_KEY: &str = "products_company_sku_key";

const SELECT_JOINED: &str = r#"
    SELECT p.id, p.company_id, p.category_id, p.unit_id, p.name, p.description, p.sku, p.barcode,
           p.is_service, p.cost_price, p.sale_price, p.stock_quantity, p.min_stock, p.is_active,
           p.image_url, p.created_at, p.updated_at,
           c.name AS category_name, u.abbreviation AS unit_abbreviation
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN product_units u ON u.id = p.unit_id
"#;

/// Shared WHERE clause for list and count ($1 = company, $2..$6 = filters)
const FILTER_CLAUSE: &str = r#"
    WHERE p.company_id = $1
      AND ($2::bool IS NULL OR p.is_service = $2)
      AND ($3::bigint IS NULL OR p.category_id = $3)
      AND ($4::text IS NULL
           OR p.name ILIKE '%' || $4 || '%'
           OR p.sku ILIKE '%' || $4 || '%'
           OR p.barcode ILIKE '%' || $4 || '%')
      AND ($5::bool IS NOT TRUE OR (NOT p.is_service AND p.stock_quantity <= p.min_stock))
      AND ($6::bool IS NULL OR p.is_active = $6)
"#;

/// Escape LIKE wildcards in user search text
fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_"))
}

pub async fn list(
    pool: &PgPool,
    company_id: i64,
    filter: &ProductFilter,
    page: &Pagination,
) -> ServiceResult<Page<Product>> {
    let search = search_pattern(filter.search.as_deref());

    let rows = sqlx::query_as::<_, Product>(&format!(
        "{SELECT_JOINED} {FILTER_CLAUSE} ORDER BY p.name, p.id LIMIT $7 OFFSET $8"
    ))
    .bind(company_id)
    .bind(filter.is_service)
    .bind(filter.category_id)
    .bind(&search)
    .bind(filter.low_stock)
    .bind(filter.active)
    .bind(page.per_page())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) =
        sqlx::query_as(&format!("SELECT COUNT(*) FROM products p {FILTER_CLAUSE}"))
            .bind(company_id)
            .bind(filter.is_service)
            .bind(filter.category_id)
            .bind(&search)
            .bind(filter.low_stock)
            .bind(filter.active)
            .fetch_one(pool)
            .await?;

    Ok(Page::new(rows, total, page.page(), page.per_page()))
}

pub async fn get(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<Product> {
    sqlx::query_as::<_, Product>(&format!(
        "{SELECT_JOINED} WHERE p.company_id = $1 AND p.id = $2"
    ))
    .bind(company_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound).into())
}

/// Category must exist in the company and match the product kind
async fn check_category(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    category_id: i64,
    is_service: bool,
) -> ServiceResult<()> {
    let row: Option<(bool,)> =
        sqlx::query_as("SELECT is_service FROM categories WHERE company_id = $1 AND id = $2")
            .bind(company_id)
            .bind(category_id)
            .fetch_optional(&mut **tx)
            .await?;
    let (category_is_service,) = row.ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound))?;
    ensure_category_kind(is_service, category_is_service)?;
    Ok(())
}

async fn check_unit(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    unit_id: i64,
) -> ServiceResult<()> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM product_units WHERE company_id = $1 AND id = $2)",
    )
    .bind(company_id)
    .bind(unit_id)
    .fetch_one(&mut **tx)
    .await?;
    if !exists {
        return Err(AppError::new(ErrorCode::UnitNotFound).into());
    }
    Ok(())
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Create a product or service. Initial stock is recorded as an IN movement.
pub async fn create(
    pool: &PgPool,
    company_id: i64,
    user_id: i64,
    data: &ProductCreate,
) -> ServiceResult<Product> {
    data.check_kind_rules()?;

    let mut tx = pool.begin().await?;
    if let Some(category_id) = data.category_id {
        check_category(&mut tx, company_id, category_id, data.is_service).await?;
    }
    if let Some(unit_id) = data.unit_id {
        check_unit(&mut tx, company_id, unit_id).await?;
    }

    let id = snowflake_id();
    let now = now_millis();
    let min_stock = if data.is_service { 0 } else { data.min_stock.unwrap_or(0) };

    sqlx::query(
        r#"
        INSERT INTO products (
            id, company_id, category_id, unit_id, name, description, sku, barcode, is_service,
            cost_price, sale_price, stock_quantity, min_stock, is_active, image_url, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 0, $12, TRUE, $13, $14, $14)
        "#,
    )
    .bind(id)
    .bind(company_id)
    .bind(data.category_id)
    .bind(data.unit_id)
    .bind(data.name.trim())
    .bind(&data.description)
    .bind(blank_to_none(data.sku.as_deref()))
    .bind(blank_to_none(data.barcode.as_deref()))
    .bind(data.is_service)
    .bind(data.cost_price)
    .bind(data.sale_price)
    .bind(min_stock)
    .bind(&data.image_url)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| ServiceError::on_unique(e, SKU_KEY, ErrorCode::SkuExists))?;

    let initial = data.initial_stock();
    if initial > 0 {
        movements::apply_in_tx(
            &mut tx,
            company_id,
            &NewMovement {
                product_id: id,
                movement_type: MovementType::In,
                quantity: initial,
                reason: Some("Initial stock"),
                unit_cost: Some(data.cost_price),
                sale_id: None,
                user_id: Some(user_id),
            },
        )
        .await?;
    }

    tx.commit().await?;
    get(pool, company_id, id).await
}

pub async fn update(
    pool: &PgPool,
    company_id: i64,
    id: i64,
    data: &ProductUpdate,
) -> ServiceResult<Product> {
    let mut tx = pool.begin().await?;
    let current = movements::lock_product(&mut tx, company_id, id).await?;

    current.ensure_kind_unchanged(data.is_service)?;
    if current.is_service && data.min_stock.is_some_and(|m| m != 0) {
        return Err(AppError::field("min_stock", "services do not carry stock").into());
    }
    if let Some(category_id) = data.category_id {
        check_category(&mut tx, company_id, category_id, current.is_service).await?;
    }
    if let Some(unit_id) = data.unit_id {
        check_unit(&mut tx, company_id, unit_id).await?;
    }

    sqlx::query(
        r#"
        UPDATE products SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            sku = COALESCE($3, sku),
            barcode = COALESCE($4, barcode),
            category_id = COALESCE($5, category_id),
            unit_id = COALESCE($6, unit_id),
            cost_price = COALESCE($7, cost_price),
            sale_price = COALESCE($8, sale_price),
            min_stock = COALESCE($9, min_stock),
            is_active = COALESCE($10, is_active),
            image_url = COALESCE($11, image_url),
            updated_at = $12
        WHERE company_id = $13 AND id = $14
        "#,
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(blank_to_none(data.sku.as_deref()))
    .bind(blank_to_none(data.barcode.as_deref()))
    .bind(data.category_id)
    .bind(data.unit_id)
    .bind(data.cost_price)
    .bind(data.sale_price)
    .bind(data.min_stock)
    .bind(data.is_active)
    .bind(&data.image_url)
    .bind(now_millis())
    .bind(company_id)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| ServiceError::on_unique(e, SKU_KEY, ErrorCode::SkuExists))?;

    tx.commit().await?;
    get(pool, company_id, id).await
}

/// How a delete request was carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Row removed
    Deleted,
    /// Product has history; kept and marked inactive
    Deactivated,
}

/// Hard delete when nothing references the product, otherwise deactivate
pub async fn delete(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<DeleteOutcome> {
    let mut tx = pool.begin().await?;
    movements::lock_product(&mut tx, company_id, id).await?;

    let (referenced,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (SELECT 1 FROM stock_movements WHERE product_id = $1)
            OR EXISTS (SELECT 1 FROM sale_items WHERE product_id = $1)
            OR EXISTS (SELECT 1 FROM menu_items WHERE product_id = $1)
        "#,
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    let outcome = if referenced {
        sqlx::query("UPDATE products SET is_active = FALSE, updated_at = $1 WHERE id = $2")
            .bind(now_millis())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        DeleteOutcome::Deactivated
    } else {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        DeleteOutcome::Deleted
    };

    tx.commit().await?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_escapes_like_wildcards() {
        assert_eq!(search_pattern(Some(" 50%_off ")), Some("50\\%\\_off".to_string()));
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(None), None);
    }

    #[test]
    fn blank_codes_are_dropped() {
        assert_eq!(blank_to_none(Some("  ")), None);
        assert_eq!(blank_to_none(Some(" SKU-1 ")), Some("SKU-1"));
    }
}
