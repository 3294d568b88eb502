//! Sales
//!
//! A sale and its SALE movements are written in one transaction, so an
//! insufficient-stock line rolls back the whole sale.

use std::collections::BTreeMap;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    MovementType, Page, Pagination, PaymentMethod, Sale, SaleCancel, SaleCreate, SaleDetail,
    SaleFilter, SaleItem, SaleStatus, compute_totals,
};
use sqlx::{PgPool, Postgres, Transaction};

use super::movements::{self, LockedProduct, NewMovement};
use super::{now_millis, snowflake_id};
use crate::error::ServiceResult;

const COLUMNS: &str = "id, company_id, user_id, order_id, status, payment_method, customer_name, \
                       notes, subtotal, discount, total, cancelled_at, cancel_reason, created_at";
const ITEM_COLUMNS: &str =
    "id, sale_id, product_id, product_name, is_service, quantity, unit_price, total";

/// A priced sale line ready to be stored
#[derive(Debug, Clone)]
pub struct SaleLine {
    pub product_id: Option<i64>,
    pub name: String,
    /// Lines without a physical product never move stock
    pub tracks_stock: bool,
    pub is_service: bool,
    pub quantity: i64,
    pub unit_price: i64,
}

/// Sale header fields
#[derive(Debug, Clone)]
pub struct NewSale<'a> {
    pub user_id: Option<i64>,
    pub order_id: Option<i64>,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub discount: i64,
}

/// Store a sale with its lines and SALE movements inside `tx`
pub async fn insert_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    header: &NewSale<'_>,
    lines: &[SaleLine],
) -> ServiceResult<Sale> {
    let priced: Vec<(i64, i64)> = lines.iter().map(|l| (l.quantity, l.unit_price)).collect();
    let totals = compute_totals(&priced, header.discount)?;

    let sale_id = snowflake_id();
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "INSERT INTO sales ({COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NULL, NULL, $12) RETURNING {COLUMNS}"
    ))
    .bind(sale_id)
    .bind(company_id)
    .bind(header.user_id)
    .bind(header.order_id)
    .bind(SaleStatus::Completed.as_str())
    .bind(header.payment_method.as_str())
    .bind(header.customer_name)
    .bind(header.notes)
    .bind(totals.subtotal)
    .bind(totals.discount)
    .bind(totals.total)
    .bind(now_millis())
    .fetch_one(&mut **tx)
    .await?;

    for line in lines {
        sqlx::query(&format!(
            "INSERT INTO sale_items ({ITEM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(snowflake_id())
        .bind(sale_id)
        .bind(line.product_id)
        .bind(&line.name)
        .bind(line.is_service)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.quantity * line.unit_price)
        .execute(&mut **tx)
        .await?;

        if let (Some(product_id), true) = (line.product_id, line.tracks_stock) {
            movements::apply_in_tx(
                tx,
                company_id,
                &NewMovement {
                    product_id,
                    movement_type: MovementType::Sale,
                    quantity: line.quantity,
                    reason: None,
                    unit_cost: None,
                    sale_id: Some(sale_id),
                    user_id: header.user_id,
                },
            )
            .await?;
        }
    }

    Ok(sale)
}

/// Lock the sold products and reject inactive ones
async fn lock_active_products(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    product_ids: impl Iterator<Item = i64>,
) -> ServiceResult<BTreeMap<i64, LockedProduct>> {
    let locked = movements::lock_products(tx, company_id, product_ids).await?;
    if let Some(product) = locked.values().find(|p| !p.is_active) {
        return Err(AppError::with_message(
            ErrorCode::ProductInactive,
            format!("'{}' is inactive", product.name),
        )
        .with_detail("product_id", product.id)
        .into());
    }
    Ok(locked)
}

pub async fn create(
    pool: &PgPool,
    company_id: i64,
    user_id: i64,
    data: &SaleCreate,
) -> ServiceResult<SaleDetail> {
    if data.items.is_empty() {
        return Err(AppError::new(ErrorCode::SaleEmpty).into());
    }

    let mut tx = pool.begin().await?;
    let products = lock_active_products(&mut tx, company_id, data.items.iter().map(|i| i.product_id)).await?;

    let lines: Vec<SaleLine> = data
        .items
        .iter()
        .filter_map(|item| {
            products.get(&item.product_id).map(|p| SaleLine {
                product_id: Some(p.id),
                name: p.name.clone(),
                tracks_stock: !p.is_service,
                is_service: p.is_service,
                quantity: item.quantity,
                unit_price: item.unit_price.unwrap_or(p.sale_price),
            })
        })
        .collect();

    let sale = insert_in_tx(
        &mut tx,
        company_id,
        &NewSale {
            user_id: Some(user_id),
            order_id: None,
            payment_method: data.payment_method,
            customer_name: data.customer_name.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            notes: data.notes.as_deref(),
            discount: data.discount,
        },
        &lines,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(company_id, sale_id = sale.id, total = sale.total, "Sale recorded");
    get(pool, company_id, sale.id).await
}

pub async fn list(
    pool: &PgPool,
    company_id: i64,
    filter: &SaleFilter,
    page: &Pagination,
) -> ServiceResult<Page<Sale>> {
    let status = filter.status.map(|s| s.as_str());
    let rows = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {COLUMNS} FROM sales \
         WHERE company_id = $1 \
           AND ($2::text IS NULL OR status = $2) \
           AND ($3::bigint IS NULL OR created_at >= $3) \
           AND ($4::bigint IS NULL OR created_at < $4) \
         ORDER BY created_at DESC, id DESC LIMIT $5 OFFSET $6"
    ))
    .bind(company_id)
    .bind(status)
    .bind(filter.from)
    .bind(filter.to)
    .bind(page.per_page())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sales \
         WHERE company_id = $1 \
           AND ($2::text IS NULL OR status = $2) \
           AND ($3::bigint IS NULL OR created_at >= $3) \
           AND ($4::bigint IS NULL OR created_at < $4)",
    )
    .bind(company_id)
    .bind(status)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_one(pool)
    .await?;

    Ok(Page::new(rows, total, page.page(), page.per_page()))
}

async fn items(pool: &PgPool, sale_id: i64) -> ServiceResult<Vec<SaleItem>> {
    let rows = sqlx::query_as::<_, SaleItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = $1 ORDER BY id"
    ))
    .bind(sale_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<SaleDetail> {
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {COLUMNS} FROM sales WHERE company_id = $1 AND id = $2"
    ))
    .bind(company_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::SaleNotFound))?;

    let items = items(pool, sale.id).await?;
    Ok(SaleDetail { sale, items })
}

/// Cancel a sale: RETURN restores stock of physical lines, REFUND records
/// the money going back for every line with a product.
pub async fn cancel(
    pool: &PgPool,
    company_id: i64,
    user_id: i64,
    id: i64,
    data: &SaleCancel,
) -> ServiceResult<SaleDetail> {
    let mut tx = pool.begin().await?;

    let status: Option<(String,)> =
        sqlx::query_as("SELECT status FROM sales WHERE company_id = $1 AND id = $2 FOR UPDATE")
            .bind(company_id)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let (status,) = status.ok_or_else(|| AppError::new(ErrorCode::SaleNotFound))?;
    if status == SaleStatus::Cancelled.as_str() {
        return Err(AppError::new(ErrorCode::SaleAlreadyCancelled).into());
    }

    let lines = sqlx::query_as::<_, SaleItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = $1 ORDER BY product_id, id"
    ))
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;

    let reason = data.reason.as_deref().map(str::trim).filter(|s| !s.is_empty());
    for line in &lines {
        let Some(product_id) = line.product_id else {
            continue;
        };
        // Only lines that actually moved stock are returned
        let (moved,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM stock_movements \
             WHERE sale_id = $1 AND product_id = $2 AND movement_type = 'SALE')",
        )
        .bind(id)
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut kinds = Vec::with_capacity(2);
        if moved && !line.is_service {
            kinds.push(MovementType::Return);
        }
        kinds.push(MovementType::Refund);

        for movement_type in kinds {
            movements::apply_in_tx(
                &mut tx,
                company_id,
                &NewMovement {
                    product_id,
                    movement_type,
                    quantity: line.quantity,
                    reason: reason.or(Some("Sale cancelled")),
                    unit_cost: None,
                    sale_id: Some(id),
                    user_id: Some(user_id),
                },
            )
            .await?;
        }
    }

    sqlx::query(
        "UPDATE sales SET status = $1, cancelled_at = $2, cancel_reason = $3 WHERE id = $4",
    )
    .bind(SaleStatus::Cancelled.as_str())
    .bind(now_millis())
    .bind(reason)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(company_id, sale_id = id, "Sale cancelled");
    get(pool, company_id, id).await
}
