//! Table reservations

use shared::error::{AppError, ErrorCode};
use shared::models::restaurant::{
    DiningTable, Reservation, ReservationCreate, ReservationFilter, ReservationStatus,
    ReservationUpdate, check_party_size, slot_bounds,
};
use sqlx::{PgPool, Postgres, Transaction};

use super::super::{now_millis, snowflake_id};
use super::tables;
use crate::error::ServiceResult;

const COLUMNS: &str = "id, company_id, table_id, customer_name, customer_phone, party_size, \
                       reserved_for, notes, status, created_at, updated_at";

const SELECT_JOINED: &str = r#"
    SELECT r.id, r.company_id, r.table_id, r.customer_name, r.customer_phone, r.party_size,
           r.reserved_for, r.notes, r.status, r.created_at, r.updated_at,
           t.number AS table_number
    FROM reservations r
    JOIN restaurant_tables t ON t.id = r.table_id
"#;

pub async fn list(
    pool: &PgPool,
    company_id: i64,
    filter: &ReservationFilter,
) -> ServiceResult<Vec<Reservation>> {
    let rows = sqlx::query_as::<_, Reservation>(&format!(
        "{SELECT_JOINED} WHERE r.company_id = $1 \
           AND ($2::text IS NULL OR r.status = $2) \
           AND ($3::bigint IS NULL OR r.table_id = $3) \
           AND ($4::bigint IS NULL OR r.reserved_for >= $4) \
           AND ($5::bigint IS NULL OR r.reserved_for < $5) \
         ORDER BY r.reserved_for, r.id"
    ))
    .bind(company_id)
    .bind(filter.status.map(|s| s.as_str()))
    .bind(filter.table_id)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<Reservation> {
    sqlx::query_as::<_, Reservation>(&format!(
        "{SELECT_JOINED} WHERE r.company_id = $1 AND r.id = $2"
    ))
    .bind(company_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::ReservationNotFound).into())
}

async fn lock(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    id: i64,
) -> ServiceResult<Reservation> {
    sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {COLUMNS} FROM reservations WHERE company_id = $1 AND id = $2 FOR UPDATE"
    ))
    .bind(company_id)
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::ReservationNotFound).into())
}

/// Another active reservation on the table within the slot window.
///
/// Callers hold the table row lock, which serializes bookings per table.
async fn ensure_slot_free(
    tx: &mut Transaction<'_, Postgres>,
    table_id: i64,
    reserved_for: i64,
    exclude_id: Option<i64>,
) -> ServiceResult<()> {
    let active: Vec<&str> = ReservationStatus::ACTIVE.iter().map(|s| s.as_str()).collect();
    let (lo, hi) = slot_bounds(reserved_for);
    let clash: Option<(i64, i64)> = sqlx::query_as(
        "SELECT id, reserved_for FROM reservations \
         WHERE table_id = $1 AND status = ANY($2) \
           AND ($3::bigint IS NULL OR id <> $3) \
           AND reserved_for > $4 AND reserved_for < $5 \
         LIMIT 1",
    )
    .bind(table_id)
    .bind(&active)
    .bind(exclude_id)
    .bind(lo)
    .bind(hi)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some((other_id, other_time)) = clash {
        return Err(AppError::new(ErrorCode::ReservationConflict)
            .with_detail("reservation_id", other_id)
            .with_detail("reserved_for", other_time)
            .into());
    }
    Ok(())
}

pub async fn create(
    pool: &PgPool,
    company_id: i64,
    data: &ReservationCreate,
) -> ServiceResult<Reservation> {
    let mut tx = pool.begin().await?;
    let table = tables::lock(&mut tx, company_id, data.table_id).await?;
    check_party_size(data.party_size, table.capacity)?;
    ensure_slot_free(&mut tx, table.id, data.reserved_for, None).await?;

    let id = snowflake_id();
    let now = now_millis();
    sqlx::query(&format!(
        "INSERT INTO reservations ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)"
    ))
    .bind(id)
    .bind(company_id)
    .bind(table.id)
    .bind(data.customer_name.trim())
    .bind(&data.customer_phone)
    .bind(data.party_size)
    .bind(data.reserved_for)
    .bind(&data.notes)
    .bind(ReservationStatus::Pending.as_str())
    .bind(now)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    get(pool, company_id, id).await
}

/// Edit details of an active reservation; table, time and party size are
/// re-checked together
pub async fn update(
    pool: &PgPool,
    company_id: i64,
    id: i64,
    data: &ReservationUpdate,
) -> ServiceResult<Reservation> {
    let mut tx = pool.begin().await?;
    let current = lock(&mut tx, company_id, id).await?;
    if !current.status.is_active() {
        return Err(AppError::with_message(
            ErrorCode::InvalidReservationTransition,
            format!("Reservation is {} and can no longer be edited", current.status),
        )
        .into());
    }

    let table_id = data.table_id.unwrap_or(current.table_id);
    let reserved_for = data.reserved_for.unwrap_or(current.reserved_for);
    let party_size = data.party_size.unwrap_or(current.party_size);

    let (table, previous) = lock_tables(&mut tx, company_id, table_id, current.table_id).await?;
    check_party_size(party_size, table.capacity)?;
    ensure_slot_free(&mut tx, table.id, reserved_for, Some(id)).await?;

    sqlx::query(
        "UPDATE reservations SET \
            table_id = $1, reserved_for = $2, party_size = $3, \
            customer_name = COALESCE($4, customer_name), \
            customer_phone = COALESCE($5, customer_phone), \
            notes = COALESCE($6, notes), \
            updated_at = $7 \
         WHERE id = $8",
    )
    .bind(table.id)
    .bind(reserved_for)
    .bind(party_size)
    .bind(data.customer_name.as_deref().map(str::trim))
    .bind(&data.customer_phone)
    .bind(&data.notes)
    .bind(now_millis())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    // A confirmed reservation holds its table; moving it moves the hold
    if let Some(previous) = previous
        && current.status == ReservationStatus::Confirmed
    {
        if let Some(status) = ReservationStatus::Cancelled.table_effect(previous.status) {
            tables::set_status(&mut tx, previous.id, status).await?;
        }
        if let Some(status) = ReservationStatus::Confirmed.table_effect(table.status) {
            tables::set_status(&mut tx, table.id, status).await?;
        }
        tracing::debug!(
            company_id,
            reservation_id = id,
            from_table = previous.id,
            to_table = table.id,
            "Reservation moved to another table"
        );
    }
    tx.commit().await?;

    get(pool, company_id, id).await
}

/// Lock the target table, and the reservation's current table when it
/// differs, in ascending id order. Returns `(target, previous)`.
async fn lock_tables(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    target_id: i64,
    current_id: i64,
) -> ServiceResult<(DiningTable, Option<DiningTable>)> {
    if target_id == current_id {
        let table = tables::lock(tx, company_id, target_id).await?;
        return Ok((table, None));
    }
    let first = tables::lock(tx, company_id, target_id.min(current_id)).await?;
    let second = tables::lock(tx, company_id, target_id.max(current_id)).await?;
    if first.id == target_id {
        Ok((first, Some(second)))
    } else {
        Ok((second, Some(first)))
    }
}

/// Move a reservation along its lifecycle and apply the table side effect
pub async fn change_status(
    pool: &PgPool,
    company_id: i64,
    id: i64,
    next: ReservationStatus,
) -> ServiceResult<Reservation> {
    let mut tx = pool.begin().await?;
    let current = lock(&mut tx, company_id, id).await?;
    current.status.transition(next)?;

    sqlx::query("UPDATE reservations SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(next.as_str())
        .bind(now_millis())
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let table = tables::lock(&mut tx, company_id, current.table_id).await?;
    if let Some(table_status) = next.table_effect(table.status) {
        tables::set_status(&mut tx, table.id, table_status).await?;
    }
    tx.commit().await?;

    tracing::debug!(company_id, reservation_id = id, status = %next, "Reservation status changed");
    get(pool, company_id, id).await
}

/// Delete a reservation, releasing a table it was holding
pub async fn delete(pool: &PgPool, company_id: i64, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;
    let current = lock(&mut tx, company_id, id).await?;

    sqlx::query("DELETE FROM reservations WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if current.status == ReservationStatus::Confirmed {
        let table = tables::lock(&mut tx, company_id, current.table_id).await?;
        if let Some(table_status) = ReservationStatus::Cancelled.table_effect(table.status) {
            tables::set_status(&mut tx, table.id, table_status).await?;
        }
    }
    tx.commit().await?;
    Ok(())
}
