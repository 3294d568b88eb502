//! Restaurant orders and the kitchen display
//!
//! Every write locks the order row first. Table side effects and the sale
//! recorded on close happen in the same transaction as the status change.

use shared::error::{AppError, ErrorCode};
use shared::models::PaymentMethod;
use shared::models::restaurant::{
    KitchenItem, Order, OrderCreate, OrderDetail, OrderFilter, OrderItem, OrderItemInput,
    OrderItemStatus, OrderStatus, TableStatus, derive_order_status,
};
use sqlx::{PgPool, Postgres, Transaction};

use super::super::movements;
use super::super::sales::{self, NewSale, SaleLine};
use super::super::{now_millis, snowflake_id};
use super::tables;
use crate::error::{ServiceError, ServiceResult};

const ONE_OPEN_PER_TABLE: &str = "orders_one_open_per_table";

const ORDER_COLUMNS: &str =
    "id, company_id, table_id, waiter_id, status, notes, total, sale_id, created_at, updated_at, closed_at";
const ITEM_COLUMNS: &str =
    "id, order_id, menu_item_id, name, quantity, unit_price, notes, status, created_at, updated_at";

const SELECT_JOINED: &str = r#"
    SELECT o.id, o.company_id, o.table_id, o.waiter_id, o.status, o.notes, o.total, o.sale_id,
           o.created_at, o.updated_at, o.closed_at,
           t.number AS table_number, w.name AS waiter_name
    FROM orders o
    JOIN restaurant_tables t ON t.id = o.table_id
    LEFT JOIN waiters w ON w.id = o.waiter_id
"#;

pub async fn list(pool: &PgPool, company_id: i64, filter: &OrderFilter) -> ServiceResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, Order>(&format!(
        "{SELECT_JOINED} WHERE o.company_id = $1 \
           AND ($2::text IS NULL OR o.status = $2) \
           AND ($3::bigint IS NULL OR o.table_id = $3) \
         ORDER BY o.created_at DESC, o.id DESC"
    ))
    .bind(company_id)
    .bind(filter.status.map(|s| s.as_str()))
    .bind(filter.table_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<OrderDetail> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "{SELECT_JOINED} WHERE o.company_id = $1 AND o.id = $2"
    ))
    .bind(company_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY created_at, id"
    ))
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(OrderDetail { order, items })
}

async fn lock_order(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    id: i64,
) -> ServiceResult<Order> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE company_id = $1 AND id = $2 FOR UPDATE"
    ))
    .bind(company_id)
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).into())
}

async fn item_statuses(
    tx: &mut Transaction<'_, Postgres>,
    order_id: i64,
) -> ServiceResult<Vec<OrderItemStatus>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT status FROM order_items WHERE order_id = $1")
        .bind(order_id)
        .fetch_all(&mut **tx)
        .await?;
    rows.into_iter()
        .map(|(s,)| {
            s.parse::<OrderItemStatus>()
                .map_err(|e| ServiceError::Db(Box::new(e)))
        })
        .collect()
}

/// Recompute `orders.total` from its lines
async fn refresh_total(tx: &mut Transaction<'_, Postgres>, order_id: i64) -> ServiceResult<()> {
    sqlx::query(
        "UPDATE orders SET \
            total = COALESCE((SELECT SUM(quantity * unit_price) FROM order_items WHERE order_id = $1), 0), \
            updated_at = $2 \
         WHERE id = $1",
    )
    .bind(order_id)
    .bind(now_millis())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Snapshot the menu item name and price into a new PENDING line
async fn insert_item(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    order_id: i64,
    input: &OrderItemInput,
) -> ServiceResult<()> {
    let menu_item: Option<(String, i64, bool)> = sqlx::query_as(
        "SELECT name, price, is_available FROM menu_items WHERE company_id = $1 AND id = $2",
    )
    .bind(company_id)
    .bind(input.menu_item_id)
    .fetch_optional(&mut **tx)
    .await?;
    let (name, price, available) = menu_item.ok_or_else(|| {
        AppError::new(ErrorCode::MenuItemNotFound).with_detail("menu_item_id", input.menu_item_id)
    })?;
    if !available {
        return Err(AppError::with_message(
            ErrorCode::MenuItemUnavailable,
            format!("'{name}' is not available"),
        )
        .with_detail("menu_item_id", input.menu_item_id)
        .into());
    }

    let now = now_millis();
    sqlx::query(&format!(
        "INSERT INTO order_items ({ITEM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)"
    ))
    .bind(snowflake_id())
    .bind(order_id)
    .bind(input.menu_item_id)
    .bind(&name)
    .bind(input.quantity)
    .bind(price)
    .bind(input.notes.as_deref().map(str::trim).filter(|s| !s.is_empty()))
    .bind(OrderItemStatus::Pending.as_str())
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Open an order on a table; the table becomes OCCUPIED
pub async fn create(pool: &PgPool, company_id: i64, data: &OrderCreate) -> ServiceResult<OrderDetail> {
    let mut tx = pool.begin().await?;
    let table = tables::lock(&mut tx, company_id, data.table_id).await?;

    if let Some(waiter_id) = data.waiter_id {
        let waiter: Option<(bool,)> =
            sqlx::query_as("SELECT is_active FROM waiters WHERE company_id = $1 AND id = $2")
                .bind(company_id)
                .bind(waiter_id)
                .fetch_optional(&mut *tx)
                .await?;
        match waiter {
            None => return Err(AppError::new(ErrorCode::WaiterNotFound).into()),
            Some((false,)) => return Err(AppError::new(ErrorCode::WaiterInactive).into()),
            Some((true,)) => {}
        }
    }

    let id = snowflake_id();
    let now = now_millis();
    sqlx::query(&format!(
        "INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, 0, NULL, $7, $7, NULL)"
    ))
    .bind(id)
    .bind(company_id)
    .bind(table.id)
    .bind(data.waiter_id)
    .bind(OrderStatus::Open.as_str())
    .bind(data.notes.as_deref().map(str::trim).filter(|s| !s.is_empty()))
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| ServiceError::on_unique(e, ONE_OPEN_PER_TABLE, ErrorCode::TableHasOpenOrder))?;

    for item in &data.items {
        insert_item(&mut tx, company_id, id, item).await?;
    }
    refresh_total(&mut tx, id).await?;

    if table.status != TableStatus::Occupied {
        tables::set_status(&mut tx, table.id, TableStatus::Occupied).await?;
    }
    tx.commit().await?;

    tracing::info!(company_id, order_id = id, table_id = table.id, "Order opened");
    get(pool, company_id, id).await
}

pub async fn add_item(
    pool: &PgPool,
    company_id: i64,
    order_id: i64,
    input: &OrderItemInput,
) -> ServiceResult<OrderDetail> {
    let mut tx = pool.begin().await?;
    let order = lock_order(&mut tx, company_id, order_id).await?;
    if !order.status.accepts_items() {
        return Err(AppError::with_message(
            ErrorCode::OrderClosed,
            format!("Order is {} and no longer accepts items", order.status),
        )
        .into());
    }
    insert_item(&mut tx, company_id, order_id, input).await?;
    refresh_total(&mut tx, order_id).await?;
    tx.commit().await?;
    get(pool, company_id, order_id).await
}

/// Remove a line that the kitchen has not started
pub async fn remove_item(
    pool: &PgPool,
    company_id: i64,
    order_id: i64,
    item_id: i64,
) -> ServiceResult<OrderDetail> {
    let mut tx = pool.begin().await?;
    let order = lock_order(&mut tx, company_id, order_id).await?;
    if order.status.is_terminal() {
        return Err(AppError::new(ErrorCode::OrderClosed).into());
    }

    let status: Option<(String,)> =
        sqlx::query_as("SELECT status FROM order_items WHERE order_id = $1 AND id = $2")
            .bind(order_id)
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?;
    let (status,) = status.ok_or_else(|| AppError::new(ErrorCode::OrderItemNotFound))?;
    if status != OrderItemStatus::Pending.as_str() {
        return Err(AppError::new(ErrorCode::OrderItemLocked)
            .with_detail("status", status)
            .into());
    }

    sqlx::query("DELETE FROM order_items WHERE id = $1")
        .bind(item_id)
        .execute(&mut *tx)
        .await?;
    refresh_total(&mut tx, order_id).await?;

    // Remaining lines may already be further along
    let statuses = item_statuses(&mut tx, order_id).await?;
    let derived = derive_order_status(order.status, &statuses);
    if derived != order.status {
        apply_status(&mut tx, &order, derived).await?;
    }

    tx.commit().await?;
    get(pool, company_id, order_id).await
}

/// Persist an order status and its table side effect
async fn apply_status(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
    next: OrderStatus,
) -> ServiceResult<()> {
    let now = now_millis();
    let closed_at = next.is_terminal().then_some(now);
    sqlx::query("UPDATE orders SET status = $1, updated_at = $2, closed_at = COALESCE($3, closed_at) WHERE id = $4")
        .bind(next.as_str())
        .bind(now)
        .bind(closed_at)
        .bind(order.id)
        .execute(&mut **tx)
        .await?;

    let table_status = match next {
        OrderStatus::Closed | OrderStatus::Cancelled => Some(TableStatus::Free),
        OrderStatus::Delivered => Some(TableStatus::Payment),
        _ => None,
    };
    if let Some(status) = table_status {
        tables::set_status(tx, order.table_id, status).await?;
    }

    tracing::debug!(order_id = order.id, from = %order.status, to = %next, "Order status changed");
    Ok(())
}

/// Build sale lines from the order; menu items linked to a product carry it
async fn sale_lines(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    order_id: i64,
) -> ServiceResult<Vec<SaleLine>> {
    let rows: Vec<(String, i64, i64, Option<i64>)> = sqlx::query_as(
        "SELECT i.name, i.quantity, i.unit_price, m.product_id \
         FROM order_items i JOIN menu_items m ON m.id = i.menu_item_id \
         WHERE i.order_id = $1 ORDER BY i.created_at, i.id",
    )
    .bind(order_id)
    .fetch_all(&mut **tx)
    .await?;

    let products =
        movements::lock_products(tx, company_id, rows.iter().filter_map(|r| r.3)).await?;

    let lines = rows
        .into_iter()
        .map(|(name, quantity, unit_price, product_id)| {
            let is_service = product_id
                .and_then(|pid| products.get(&pid))
                .is_none_or(|p| p.is_service);
            SaleLine {
                product_id,
                name,
                tracks_stock: product_id.is_some() && !is_service,
                is_service,
                quantity,
                unit_price,
            }
        })
        .collect();
    Ok(lines)
}

/// Manual status change. Closing with a payment method records a sale.
pub async fn change_status(
    pool: &PgPool,
    company_id: i64,
    user_id: i64,
    order_id: i64,
    next: OrderStatus,
    payment_method: Option<PaymentMethod>,
) -> ServiceResult<OrderDetail> {
    let mut tx = pool.begin().await?;
    let order = lock_order(&mut tx, company_id, order_id).await?;
    order.status.transition(next)?;

    if next == OrderStatus::SentToKitchen {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM order_items WHERE order_id = $1")
                .bind(order_id)
                .fetch_one(&mut *tx)
                .await?;
        if count == 0 {
            return Err(AppError::new(ErrorCode::OrderEmpty).into());
        }
    }

    if let (OrderStatus::Closed, Some(method)) = (next, payment_method) {
        let lines = sale_lines(&mut tx, company_id, order_id).await?;
        if !lines.is_empty() {
            let sale = sales::insert_in_tx(
                &mut tx,
                company_id,
                &NewSale {
                    user_id: Some(user_id),
                    order_id: Some(order_id),
                    payment_method: method,
                    customer_name: None,
                    notes: None,
                    discount: 0,
                },
                &lines,
            )
            .await?;
            sqlx::query("UPDATE orders SET sale_id = $1 WHERE id = $2")
                .bind(sale.id)
                .bind(order_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    apply_status(&mut tx, &order, next).await?;
    tx.commit().await?;

    tracing::info!(company_id, order_id, status = %next, "Order status updated");
    get(pool, company_id, order_id).await
}

/// Pending and in-progress lines of orders in the kitchen, oldest first
pub async fn kitchen(pool: &PgPool, company_id: i64) -> ServiceResult<Vec<KitchenItem>> {
    let rows = sqlx::query_as::<_, KitchenItem>(
        r#"
        SELECT i.id AS item_id, i.order_id, o.table_id, t.number AS table_number,
               i.name, i.quantity, i.notes, i.status, o.status AS order_status, i.created_at
        FROM order_items i
        JOIN orders o ON o.id = i.order_id
        JOIN restaurant_tables t ON t.id = o.table_id
        WHERE o.company_id = $1
          AND o.status IN ('SENT_TO_KITCHEN', 'PREPARING', 'READY')
          AND i.status IN ('PENDING', 'PREPARING', 'READY')
        ORDER BY i.created_at, i.id
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;

    let now = now_millis();
    Ok(rows.into_iter().map(|item| item.with_wait(now)).collect())
}

/// Advance one kitchen line and derive the order status from its lines
pub async fn update_kitchen_item(
    pool: &PgPool,
    company_id: i64,
    item_id: i64,
    next: OrderItemStatus,
) -> ServiceResult<OrderDetail> {
    let mut tx = pool.begin().await?;

    let owner: Option<(i64,)> = sqlx::query_as(
        "SELECT i.order_id FROM order_items i JOIN orders o ON o.id = i.order_id \
         WHERE o.company_id = $1 AND i.id = $2",
    )
    .bind(company_id)
    .bind(item_id)
    .fetch_optional(&mut *tx)
    .await?;
    let (order_id,) = owner.ok_or_else(|| AppError::new(ErrorCode::OrderItemNotFound))?;

    let order = lock_order(&mut tx, company_id, order_id).await?;
    if !order.status.in_kitchen() {
        return Err(AppError::with_message(
            ErrorCode::OrderItemLocked,
            format!("Order is {} and not in the kitchen", order.status),
        )
        .into());
    }

    let (current,): (String,) = sqlx::query_as("SELECT status FROM order_items WHERE id = $1")
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;
    let current: OrderItemStatus = current.parse().map_err(|e| ServiceError::Db(Box::new(e)))?;
    current.transition(next)?;

    if current != next {
        sqlx::query("UPDATE order_items SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(next.as_str())
            .bind(now_millis())
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        let statuses = item_statuses(&mut tx, order_id).await?;
        let derived = derive_order_status(order.status, &statuses);
        if derived != order.status {
            apply_status(&mut tx, &order, derived).await?;
        }
    }

    tx.commit().await?;
    get(pool, company_id, order_id).await
}

