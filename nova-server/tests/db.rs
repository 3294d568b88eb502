//! Data-layer tests against a real PostgreSQL.
//!
//! `#[sqlx::test]` creates a fresh database per test (from `DATABASE_URL`)
//! and applies `./migrations` before handing over the pool.

use nova_server::db;
use nova_server::db::restaurant::{menu, orders, reservations, tables};
use nova_server::error::ServiceResult;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::models::restaurant::{
    OrderDetail, OrderItemStatus, OrderStatus, ReservationStatus, TableStatus,
};
use shared::models::{
    CompanyRole, MovementType, Pagination, PaymentMethod, Product, ProductFilter, SaleStatus,
};
use sqlx::PgPool;

fn payload<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).unwrap()
}

fn code<T: std::fmt::Debug>(result: ServiceResult<T>) -> ErrorCode {
    let err: AppError = result.unwrap_err().into();
    err.code
}

/// A user owning a fresh company
async fn tenant(pool: &PgPool, email: &str) -> (i64, i64) {
    let user = db::users::create(pool, "Ana", email, "not-a-real-hash")
        .await
        .unwrap();
    let company = db::companies::create(pool, user.id, &payload(json!({ "name": "Padaria" })))
        .await
        .unwrap();
    (user.id, company.id)
}

async fn product(pool: &PgPool, company: i64, user: i64, name: &str, stock: i64) -> Product {
    db::products::create(
        pool,
        company,
        user,
        &payload(json!({ "name": name, "sale_price": 500, "stock_quantity": stock })),
    )
    .await
    .unwrap()
}

async fn service(pool: &PgPool, company: i64, user: i64, name: &str) -> Product {
    db::products::create(
        pool,
        company,
        user,
        &payload(json!({ "name": name, "sale_price": 3000, "is_service": true })),
    )
    .await
    .unwrap()
}

async fn stock_of(pool: &PgPool, company: i64, id: i64) -> i64 {
    db::products::get(pool, company, id)
        .await
        .unwrap()
        .stock_quantity
}

async fn table(pool: &PgPool, company: i64, number: i32, capacity: i32) -> i64 {
    tables::create(
        pool,
        company,
        &payload(json!({ "number": number, "capacity": capacity })),
    )
    .await
    .unwrap()
    .id
}

async fn table_status(pool: &PgPool, company: i64, id: i64) -> TableStatus {
    tables::get(pool, company, id).await.unwrap().status
}

/// Send an order to the kitchen and deliver every line
async fn serve(pool: &PgPool, company: i64, user: i64, order: &OrderDetail) {
    orders::change_status(pool, company, user, order.order.id, OrderStatus::SentToKitchen, None)
        .await
        .unwrap();
    for step in [
        OrderItemStatus::Preparing,
        OrderItemStatus::Ready,
        OrderItemStatus::Delivered,
    ] {
        for item in &order.items {
            orders::update_kitchen_item(pool, company, item.id, step)
                .await
                .unwrap();
        }
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn product_list_separates_products_from_services(pool: PgPool) {
    let (user, company) = tenant(&pool, "ana@example.com").await;
    let flour = product(&pool, company, user, "Farinha", 2).await;
    let delivery = service(&pool, company, user, "Entrega").await;
    sqlx::query("UPDATE products SET min_stock = 5 WHERE id = $1")
        .bind(flour.id)
        .execute(&pool)
        .await
        .unwrap();

    let list = |filter: Value| {
        let pool = pool.clone();
        async move {
            let filter: ProductFilter = payload(filter);
            db::products::list(&pool, company, &filter, &Pagination::default())
                .await
                .unwrap()
        }
    };

    let goods = list(json!({ "is_service": false })).await;
    assert_eq!(goods.total, 1);
    assert_eq!(goods.items[0].id, flour.id);

    let services = list(json!({ "is_service": true })).await;
    assert_eq!(services.total, 1);
    assert_eq!(services.items[0].id, delivery.id);
    assert_eq!(services.items[0].stock_quantity, 0);

    assert_eq!(list(json!({})).await.total, 2);

    // Services never count as low stock
    let low = list(json!({ "low_stock": true })).await;
    assert_eq!(low.total, 1);
    assert_eq!(low.items[0].id, flour.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn product_kind_is_fixed_after_creation(pool: PgPool) {
    let (user, company) = tenant(&pool, "ana@example.com").await;
    let flour = product(&pool, company, user, "Farinha", 2).await;

    let result =
        db::products::update(&pool, company, flour.id, &payload(json!({ "is_service": true })))
            .await;
    assert_eq!(code(result), ErrorCode::ProductKindImmutable);

    let updated =
        db::products::update(&pool, company, flour.id, &payload(json!({ "is_service": false })))
            .await
            .unwrap();
    assert!(!updated.is_service);
}

#[sqlx::test(migrations = "./migrations")]
async fn stock_never_goes_negative(pool: PgPool) {
    let (user, company) = tenant(&pool, "ana@example.com").await;
    let flour = product(&pool, company, user, "Farinha", 3).await;

    let out = |quantity: i64| {
        payload(json!({ "product_id": flour.id, "movement_type": "OUT", "quantity": quantity }))
    };

    let result = db::movements::create(&pool, company, user, &out(5)).await;
    assert_eq!(code(result), ErrorCode::InsufficientStock);
    assert_eq!(stock_of(&pool, company, flour.id).await, 3);

    let movement = db::movements::create(&pool, company, user, &out(3)).await.unwrap();
    assert_eq!((movement.previous_quantity, movement.new_quantity), (3, 0));

    let sale = db::sales::create(
        &pool,
        company,
        user,
        &payload(json!({
            "items": [{ "product_id": flour.id, "quantity": 1 }],
            "payment_method": "CASH"
        })),
    )
    .await;
    assert_eq!(code(sale), ErrorCode::InsufficientStock);
    let (sales,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sales")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(sales, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn cancelling_a_sale_returns_stock_exactly_once(pool: PgPool) {
    let (user, company) = tenant(&pool, "ana@example.com").await;
    let flour = product(&pool, company, user, "Farinha", 10).await;
    let delivery = service(&pool, company, user, "Entrega").await;

    let sale = db::sales::create(
        &pool,
        company,
        user,
        &payload(json!({
            "items": [
                { "product_id": flour.id, "quantity": 4 },
                { "product_id": delivery.id, "quantity": 1 }
            ],
            "discount": 500,
            "payment_method": "PIX"
        })),
    )
    .await
    .unwrap();
    assert_eq!(sale.sale.total, 4 * 500 + 3000 - 500);
    assert_eq!(stock_of(&pool, company, flour.id).await, 6);

    let cancel = payload(json!({ "reason": "Cliente desistiu" }));
    let cancelled = db::sales::cancel(&pool, company, user, sale.sale.id, &cancel)
        .await
        .unwrap();
    assert_eq!(cancelled.sale.status, SaleStatus::Cancelled);
    assert_eq!(stock_of(&pool, company, flour.id).await, 10);

    let kinds: Vec<(i64, String)> = sqlx::query_as(
        "SELECT product_id, movement_type FROM stock_movements \
         WHERE sale_id = $1 AND movement_type IN ('RETURN', 'REFUND') \
         ORDER BY product_id, movement_type",
    )
    .bind(sale.sale.id)
    .fetch_all(&pool)
    .await
    .unwrap();
    let mut expected = vec![
        (flour.id, MovementType::Refund.to_string()),
        (flour.id, MovementType::Return.to_string()),
        (delivery.id, MovementType::Refund.to_string()),
    ];
    expected.sort();
    assert_eq!(kinds, expected);

    let again = db::sales::cancel(&pool, company, user, sale.sale.id, &cancel).await;
    let err: AppError = again.unwrap_err().into();
    assert_eq!(err.code, ErrorCode::SaleAlreadyCancelled);
    assert_eq!(err.http_status(), http::StatusCode::CONFLICT);
    assert_eq!(stock_of(&pool, company, flour.id).await, 10);
}

#[sqlx::test(migrations = "./migrations")]
async fn last_owner_cannot_leave(pool: PgPool) {
    let (owner, company) = tenant(&pool, "ana@example.com").await;
    let bia = db::users::create(&pool, "Bia", "bia@example.com", "not-a-real-hash")
        .await
        .unwrap();

    let demote = db::members::update_role(&pool, company, owner, CompanyRole::Admin).await;
    assert_eq!(code(demote), ErrorCode::LastOwner);
    assert_eq!(code(db::members::remove(&pool, company, owner).await), ErrorCode::LastOwner);

    db::members::add(&pool, company, bia.id, CompanyRole::Owner)
        .await
        .unwrap();
    let previous = db::members::update_role(&pool, company, owner, CompanyRole::Admin)
        .await
        .unwrap();
    assert_eq!(previous, CompanyRole::Owner);

    // Bia is now the only owner
    assert_eq!(code(db::members::remove(&pool, company, bia.id).await), ErrorCode::LastOwner);
    db::members::remove(&pool, company, owner).await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn kitchen_progress_moves_the_order_forward(pool: PgPool) {
    let (user, company) = tenant(&pool, "ana@example.com").await;
    let table_id = table(&pool, company, 1, 4).await;
    let soup = menu::create(&pool, company, &payload(json!({ "name": "Sopa", "price": 1200 })))
        .await
        .unwrap();

    let order = orders::create(
        &pool,
        company,
        &payload(json!({
            "table_id": table_id,
            "items": [
                { "menu_item_id": soup.id, "quantity": 1 },
                { "menu_item_id": soup.id, "quantity": 2 }
            ]
        })),
    )
    .await
    .unwrap();
    assert_eq!(order.order.total, 3600);
    assert_eq!(table_status(&pool, company, table_id).await, TableStatus::Occupied);

    orders::change_status(&pool, company, user, order.order.id, OrderStatus::SentToKitchen, None)
        .await
        .unwrap();
    let (first, second) = (order.items[0].id, order.items[1].id);

    let step = |item: i64, status: OrderItemStatus| {
        let pool = pool.clone();
        async move {
            orders::update_kitchen_item(&pool, company, item, status)
                .await
                .unwrap()
                .order
                .status
        }
    };

    assert_eq!(step(first, OrderItemStatus::Preparing).await, OrderStatus::Preparing);
    assert_eq!(step(first, OrderItemStatus::Ready).await, OrderStatus::Preparing);
    assert_eq!(step(second, OrderItemStatus::Preparing).await, OrderStatus::Preparing);
    assert_eq!(step(second, OrderItemStatus::Ready).await, OrderStatus::Ready);
    assert_eq!(step(first, OrderItemStatus::Delivered).await, OrderStatus::Ready);
    assert_eq!(step(second, OrderItemStatus::Delivered).await, OrderStatus::Delivered);
    assert_eq!(table_status(&pool, company, table_id).await, TableStatus::Payment);

    let backwards = orders::update_kitchen_item(&pool, company, first, OrderItemStatus::Preparing).await;
    assert_eq!(code(backwards), ErrorCode::OrderItemLocked);
}

#[sqlx::test(migrations = "./migrations")]
async fn closing_an_order_records_a_sale_and_frees_the_table(pool: PgPool) {
    let (user, company) = tenant(&pool, "ana@example.com").await;
    let table_id = table(&pool, company, 1, 4).await;
    let beer = product(&pool, company, user, "Cerveja", 10).await;
    let linked = menu::create(
        &pool,
        company,
        &payload(json!({ "name": "Cerveja", "price": 900, "product_id": beer.id })),
    )
    .await
    .unwrap();
    let soup = menu::create(&pool, company, &payload(json!({ "name": "Sopa", "price": 1200 })))
        .await
        .unwrap();

    let order = orders::create(
        &pool,
        company,
        &payload(json!({
            "table_id": table_id,
            "items": [
                { "menu_item_id": linked.id, "quantity": 3 },
                { "menu_item_id": soup.id, "quantity": 1 }
            ]
        })),
    )
    .await
    .unwrap();
    serve(&pool, company, user, &order).await;

    let closed = orders::change_status(
        &pool,
        company,
        user,
        order.order.id,
        OrderStatus::Closed,
        Some(PaymentMethod::Card),
    )
    .await
    .unwrap();
    assert_eq!(closed.order.status, OrderStatus::Closed);
    assert!(closed.order.closed_at.is_some());
    assert_eq!(table_status(&pool, company, table_id).await, TableStatus::Free);

    let sale_id = closed.order.sale_id.expect("closing with a payment records a sale");
    let sale = db::sales::get(&pool, company, sale_id).await.unwrap();
    assert_eq!(sale.sale.order_id, Some(order.order.id));
    assert_eq!(sale.sale.total, 3 * 900 + 1200);
    assert_eq!(sale.items.len(), 2);
    // Only the line linked to a physical product moves stock
    assert_eq!(stock_of(&pool, company, beer.id).await, 7);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_order_closes_share_products(pool: PgPool) {
    let (user, company) = tenant(&pool, "ana@example.com").await;
    let beer = product(&pool, company, user, "Cerveja", 50).await;
    let wine = product(&pool, company, user, "Vinho", 50).await;
    let beer_item = menu::create(
        &pool,
        company,
        &payload(json!({ "name": "Cerveja", "price": 900, "product_id": beer.id })),
    )
    .await
    .unwrap();
    let wine_item = menu::create(
        &pool,
        company,
        &payload(json!({ "name": "Vinho", "price": 2500, "product_id": wine.id })),
    )
    .await
    .unwrap();

    // Opposite line order on the two orders
    let mut served = Vec::new();
    for (number, lines) in [(1, [beer_item.id, wine_item.id]), (2, [wine_item.id, beer_item.id])] {
        let table_id = table(&pool, company, number, 4).await;
        let order = orders::create(
            &pool,
            company,
            &payload(json!({
                "table_id": table_id,
                "items": lines.iter().map(|id| json!({ "menu_item_id": id, "quantity": 1 })).collect::<Vec<_>>()
            })),
        )
        .await
        .unwrap();
        serve(&pool, company, user, &order).await;
        served.push(order.order.id);
    }

    let close = |order_id: i64| {
        let pool = pool.clone();
        async move {
            orders::change_status(
                &pool,
                company,
                user,
                order_id,
                OrderStatus::Closed,
                Some(PaymentMethod::Cash),
            )
            .await
        }
    };
    let (a, b) = tokio::join!(close(served[0]), close(served[1]));
    assert!(a.is_ok(), "{a:?}");
    assert!(b.is_ok(), "{b:?}");
    assert_eq!(stock_of(&pool, company, beer.id).await, 48);
    assert_eq!(stock_of(&pool, company, wine.id).await, 48);
}

#[sqlx::test(migrations = "./migrations")]
async fn reservations_on_a_table_keep_two_hours_apart(pool: PgPool) {
    let (_, company) = tenant(&pool, "ana@example.com").await;
    let table_id = table(&pool, company, 1, 4).await;
    let at = 1_900_000_000_000_i64;
    let hour = 60 * 60 * 1000;

    let book = |reserved_for: i64, party_size: i32| {
        let pool = pool.clone();
        async move {
            reservations::create(
                &pool,
                company,
                &payload(json!({
                    "table_id": table_id,
                    "customer_name": "Carla",
                    "party_size": party_size,
                    "reserved_for": reserved_for
                })),
            )
            .await
        }
    };

    let first = book(at, 2).await.unwrap();
    assert_eq!(first.status, ReservationStatus::Pending);
    assert_eq!(code(book(at + hour, 2).await), ErrorCode::ReservationConflict);
    assert_eq!(code(book(at - hour, 2).await), ErrorCode::ReservationConflict);
    assert_eq!(code(book(at + 2 * hour, 6).await), ErrorCode::TableCapacityExceeded);
    book(at + 2 * hour, 2).await.unwrap();

    // A cancelled reservation frees its slot
    reservations::change_status(&pool, company, first.id, ReservationStatus::Cancelled)
        .await
        .unwrap();
    book(at - hour, 3).await.unwrap();
    assert_eq!(code(book(at + hour, 3).await), ErrorCode::ReservationConflict);
}

#[sqlx::test(migrations = "./migrations")]
async fn moving_a_confirmed_reservation_moves_the_table_hold(pool: PgPool) {
    let (_, company) = tenant(&pool, "ana@example.com").await;
    let window = table(&pool, company, 1, 4).await;
    let terrace = table(&pool, company, 2, 6).await;

    let reservation = reservations::create(
        &pool,
        company,
        &payload(json!({
            "table_id": window,
            "customer_name": "Carla",
            "party_size": 4,
            "reserved_for": 1_900_000_000_000_i64
        })),
    )
    .await
    .unwrap();
    reservations::change_status(&pool, company, reservation.id, ReservationStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(table_status(&pool, company, window).await, TableStatus::Reserved);

    let moved = reservations::update(
        &pool,
        company,
        reservation.id,
        &payload(json!({ "table_id": terrace, "party_size": 5 })),
    )
    .await
    .unwrap();
    assert_eq!(moved.table_id, terrace);
    assert_eq!(table_status(&pool, company, window).await, TableStatus::Free);
    assert_eq!(table_status(&pool, company, terrace).await, TableStatus::Reserved);

    // Seating follows the reservation to its new table
    reservations::change_status(&pool, company, reservation.id, ReservationStatus::Seated)
        .await
        .unwrap();
    assert_eq!(table_status(&pool, company, terrace).await, TableStatus::Occupied);
    assert_eq!(table_status(&pool, company, window).await, TableStatus::Free);
}

#[sqlx::test(migrations = "./migrations")]
async fn moving_a_pending_reservation_leaves_tables_alone(pool: PgPool) {
    let (_, company) = tenant(&pool, "ana@example.com").await;
    let window = table(&pool, company, 1, 4).await;
    let terrace = table(&pool, company, 2, 4).await;

    let reservation = reservations::create(
        &pool,
        company,
        &payload(json!({
            "table_id": window,
            "customer_name": "Carla",
            "party_size": 2,
            "reserved_for": 1_900_000_000_000_i64
        })),
    )
    .await
    .unwrap();
    reservations::update(&pool, company, reservation.id, &payload(json!({ "table_id": terrace })))
        .await
        .unwrap();

    assert_eq!(table_status(&pool, company, window).await, TableStatus::Free);
    assert_eq!(table_status(&pool, company, terrace).await, TableStatus::Free);
}

#[sqlx::test(migrations = "./migrations")]
async fn table_capacity_cannot_drop_below_a_booked_party(pool: PgPool) {
    let (_, company) = tenant(&pool, "ana@example.com").await;
    let table_id = table(&pool, company, 1, 6).await;
    let reservation = reservations::create(
        &pool,
        company,
        &payload(json!({
            "table_id": table_id,
            "customer_name": "Carla",
            "party_size": 5,
            "reserved_for": 1_900_000_000_000_i64
        })),
    )
    .await
    .unwrap();

    let shrink = |capacity: i32| {
        let pool = pool.clone();
        async move {
            tables::update(&pool, company, table_id, &payload(json!({ "capacity": capacity })))
                .await
        }
    };

    assert_eq!(code(shrink(4).await), ErrorCode::TableCapacityExceeded);
    assert_eq!(tables::get(&pool, company, table_id).await.unwrap().capacity, 6);
    assert_eq!(shrink(5).await.unwrap().capacity, 5);

    // Finished reservations no longer constrain the table
    reservations::change_status(&pool, company, reservation.id, ReservationStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(shrink(2).await.unwrap().capacity, 2);
}
