//! Stock movements
//!
//! Stock only changes here. Each movement locks its product row
//! (`SELECT ... FOR UPDATE`), computes the new level with
//! [`MovementType::apply`] and records previous/new quantities, all inside
//! the caller's transaction.

use std::collections::{BTreeMap, BTreeSet};

use shared::error::{AppError, ErrorCode};
use shared::models::{MovementCreate, MovementFilter, MovementType, Page, Pagination, StockMovement};
use sqlx::{PgPool, Postgres, Transaction};

use super::{now_millis, snowflake_id};
use crate::error::ServiceResult;

const COLUMNS: &str = "id, company_id, product_id, movement_type, quantity, previous_quantity, \
                       new_quantity, unit_cost, reason, sale_id, user_id, created_at";

/// Product row locked for a stock change
#[derive(Debug, sqlx::FromRow)]
pub struct LockedProduct {
    pub id: i64,
    pub name: String,
    pub is_service: bool,
    pub is_active: bool,
    pub stock_quantity: i64,
    pub sale_price: i64,
}

pub async fn lock_product(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    product_id: i64,
) -> ServiceResult<LockedProduct> {
    sqlx::query_as::<_, LockedProduct>(
        "SELECT id, name, is_service, is_active, stock_quantity, sale_price FROM products \
         WHERE company_id = $1 AND id = $2 FOR UPDATE",
    )
    .bind(company_id)
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| {
        AppError::new(ErrorCode::ProductNotFound)
            .with_detail("product_id", product_id)
            .into()
    })
}

/// Lock every distinct product in ascending id order.
///
/// Multi-product writers go through here so two transactions touching the
/// same products always acquire the row locks in the same order.
pub async fn lock_products(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    product_ids: impl IntoIterator<Item = i64>,
) -> ServiceResult<BTreeMap<i64, LockedProduct>> {
    let ids: BTreeSet<i64> = product_ids.into_iter().collect();
    let mut locked = BTreeMap::new();
    for id in ids {
        locked.insert(id, lock_product(tx, company_id, id).await?);
    }
    Ok(locked)
}

/// A movement to record
#[derive(Debug, Clone)]
pub struct NewMovement<'a> {
    pub product_id: i64,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reason: Option<&'a str>,
    pub unit_cost: Option<i64>,
    pub sale_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// Lock the product, apply the movement and record it
pub async fn apply_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    movement: &NewMovement<'_>,
) -> ServiceResult<StockMovement> {
    let product = lock_product(tx, company_id, movement.product_id).await?;

    if product.is_service && movement.movement_type.affects_stock() {
        return Err(AppError::with_message(
            ErrorCode::ServiceHasNoStock,
            format!("'{}' is a service and has no stock", product.name),
        )
        .with_detail("product_id", product.id)
        .into());
    }

    let previous = product.stock_quantity;
    let next = movement
        .movement_type
        .apply(previous, movement.quantity)
        .map_err(|e| e.with_detail("product_id", product.id))?;

    if next != previous {
        sqlx::query("UPDATE products SET stock_quantity = $1, updated_at = $2 WHERE id = $3")
            .bind(next)
            .bind(now_millis())
            .bind(product.id)
            .execute(&mut **tx)
            .await?;
    }

    let mut row = sqlx::query_as::<_, StockMovement>(&format!(
        "INSERT INTO stock_movements ({COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(company_id)
    .bind(product.id)
    .bind(movement.movement_type.as_str())
    .bind(movement.quantity)
    .bind(previous)
    .bind(next)
    .bind(movement.unit_cost)
    .bind(movement.reason)
    .bind(movement.sale_id)
    .bind(movement.user_id)
    .bind(now_millis())
    .fetch_one(&mut **tx)
    .await?;
    row.product_name = Some(product.name);

    tracing::debug!(
        company_id,
        product_id = product.id,
        movement_type = %movement.movement_type,
        previous,
        next,
        "Stock movement recorded"
    );
    Ok(row)
}

/// Record a manual movement
pub async fn create(
    pool: &PgPool,
    company_id: i64,
    user_id: i64,
    data: &MovementCreate,
) -> ServiceResult<StockMovement> {
    let mut tx = pool.begin().await?;
    let movement = apply_in_tx(
        &mut tx,
        company_id,
        &NewMovement {
            product_id: data.product_id,
            movement_type: data.movement_type,
            quantity: data.quantity,
            reason: data.reason.as_deref(),
            unit_cost: data.unit_cost,
            sale_id: None,
            user_id: Some(user_id),
        },
    )
    .await?;
    tx.commit().await?;
    Ok(movement)
}

pub async fn list(
    pool: &PgPool,
    company_id: i64,
    filter: &MovementFilter,
    page: &Pagination,
) -> ServiceResult<Page<StockMovement>> {
    let movement_type = filter.movement_type.map(|t| t.as_str());
    let rows = sqlx::query_as::<_, StockMovement>(
        r#"
        SELECT m.id, m.company_id, m.product_id, m.movement_type, m.quantity, m.previous_quantity,
               m.new_quantity, m.unit_cost, m.reason, m.sale_id, m.user_id, m.created_at,
               p.name AS product_name
        FROM stock_movements m
        JOIN products p ON p.id = m.product_id
        WHERE m.company_id = $1
          AND ($2::bigint IS NULL OR m.product_id = $2)
          AND ($3::text IS NULL OR m.movement_type = $3)
          AND ($4::bigint IS NULL OR m.created_at >= $4)
          AND ($5::bigint IS NULL OR m.created_at < $5)
        ORDER BY m.created_at DESC, m.id DESC
        LIMIT $6 OFFSET $7
        "#,
    )
    .bind(company_id)
    .bind(filter.product_id)
    .bind(movement_type)
    .bind(filter.from)
    .bind(filter.to)
    .bind(page.per_page())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM stock_movements m
        WHERE m.company_id = $1
          AND ($2::bigint IS NULL OR m.product_id = $2)
          AND ($3::text IS NULL OR m.movement_type = $3)
          AND ($4::bigint IS NULL OR m.created_at >= $4)
          AND ($5::bigint IS NULL OR m.created_at < $5)
        "#,
    )
    .bind(company_id)
    .bind(filter.product_id)
    .bind(movement_type)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_one(pool)
    .await?;

    Ok(Page::new(rows, total, page.page(), page.per_page()))
}

pub async fn get(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<StockMovement> {
    sqlx::query_as::<_, StockMovement>(
        r#"
        SELECT m.id, m.company_id, m.product_id, m.movement_type, m.quantity, m.previous_quantity,
               m.new_quantity, m.unit_cost, m.reason, m.sale_id, m.user_id, m.created_at,
               p.name AS product_name
        FROM stock_movements m
        JOIN products p ON p.id = m.product_id
        WHERE m.company_id = $1 AND m.id = $2
        "#,
    )
    .bind(company_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::MovementNotFound).into())
}
