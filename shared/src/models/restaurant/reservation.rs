//! Reservation Model

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::table::TableStatus;
use crate::error::{AppError, ErrorCode};

/// Two active reservations on one table must be at least this far apart
pub const RESERVATION_WINDOW_MS: i64 = 2 * 60 * 60 * 1000;

string_enum! {
    pub enum ReservationStatus {
        Pending => "PENDING",
        Confirmed => "CONFIRMED",
        Seated => "SEATED",
        Cancelled => "CANCELLED",
        NoShow => "NO_SHOW",
    }
}

impl ReservationStatus {
    /// Statuses that still hold the table slot
    pub const ACTIVE: &'static [ReservationStatus] =
        &[ReservationStatus::Pending, ReservationStatus::Confirmed];

    pub const fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    pub fn can_transition(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed | Cancelled) | (Confirmed, Seated | Cancelled | NoShow)
        )
    }

    pub fn transition(&self, next: ReservationStatus) -> Result<ReservationStatus, AppError> {
        if self.can_transition(next) {
            Ok(next)
        } else {
            Err(AppError::with_message(
                ErrorCode::InvalidReservationTransition,
                format!("Cannot change reservation from {self} to {next}"),
            )
            .with_detail("from", self.as_str())
            .with_detail("to", next.as_str()))
        }
    }

    /// Table status to apply after moving a reservation to `self`, if any
    pub fn table_effect(&self, table: TableStatus) -> Option<TableStatus> {
        match (self, table) {
            (ReservationStatus::Confirmed, TableStatus::Free) => Some(TableStatus::Reserved),
            (ReservationStatus::Seated, TableStatus::Occupied) => None,
            (ReservationStatus::Seated, _) => Some(TableStatus::Occupied),
            (ReservationStatus::Cancelled | ReservationStatus::NoShow, TableStatus::Reserved) => {
                Some(TableStatus::Free)
            }
            _ => None,
        }
    }
}

/// Exclusive bounds of the slot around `reserved_for`: another active
/// reservation on the same table strictly inside them conflicts
pub fn slot_bounds(reserved_for: i64) -> (i64, i64) {
    (
        reserved_for.saturating_sub(RESERVATION_WINDOW_MS),
        reserved_for.saturating_add(RESERVATION_WINDOW_MS),
    )
}

/// Party must fit the table
pub fn check_party_size(party_size: i32, capacity: i32) -> Result<(), AppError> {
    if party_size > capacity {
        return Err(AppError::with_message(
            ErrorCode::TableCapacityExceeded,
            format!("Party of {party_size} exceeds table capacity of {capacity}"),
        )
        .with_detail("party_size", party_size)
        .with_detail("capacity", capacity));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Reservation {
    pub id: i64,
    pub company_id: i64,
    pub table_id: i64,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub party_size: i32,
    /// Reserved time (Unix ms)
    pub reserved_for: i64,
    pub notes: Option<String>,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub status: ReservationStatus,
    pub created_at: i64,
    pub updated_at: i64,

    #[cfg_attr(feature = "db", sqlx(default))]
    pub table_number: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReservationCreate {
    pub table_id: i64,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub customer_name: String,
    #[validate(length(max = 40, message = "must be at most 40 characters"))]
    pub customer_phone: Option<String>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub party_size: i32,
    pub reserved_for: i64,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReservationUpdate {
    pub table_id: Option<i64>,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub customer_name: Option<String>,
    #[validate(length(max = 40, message = "must be at most 40 characters"))]
    pub customer_phone: Option<String>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub party_size: Option<i32>,
    pub reserved_for: Option<i64>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationStatusUpdate {
    pub status: ReservationStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationFilter {
    pub status: Option<ReservationStatus>,
    pub table_id: Option<i64>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::ReservationStatus::*;
    use super::*;

    #[test]
    fn lifecycle() {
        assert!(Pending.transition(Confirmed).is_ok());
        assert!(Pending.transition(Cancelled).is_ok());
        assert!(Confirmed.transition(Seated).is_ok());
        assert!(Confirmed.transition(NoShow).is_ok());
        assert_eq!(
            Pending.transition(Seated).unwrap_err().code,
            ErrorCode::InvalidReservationTransition
        );
        assert!(Seated.transition(Cancelled).is_err());
        assert!(NoShow.transition(Confirmed).is_err());
    }

    #[test]
    fn table_follows_reservation() {
        assert_eq!(Confirmed.table_effect(TableStatus::Free), Some(TableStatus::Reserved));
        assert_eq!(Confirmed.table_effect(TableStatus::Occupied), None);
        assert_eq!(Seated.table_effect(TableStatus::Reserved), Some(TableStatus::Occupied));
        assert_eq!(Cancelled.table_effect(TableStatus::Reserved), Some(TableStatus::Free));
        assert_eq!(NoShow.table_effect(TableStatus::Occupied), None);
    }

    #[test]
    fn two_hour_window() {
        let base = 1_710_000_000_000;
        let (lo, hi) = slot_bounds(base);
        let inside = |t: i64| t > lo && t < hi;
        assert!(inside(base + RESERVATION_WINDOW_MS - 1));
        assert!(!inside(base + RESERVATION_WINDOW_MS));
        assert!(inside(base - 60_000));
        assert!(!inside(base - RESERVATION_WINDOW_MS));
    }

    #[test]
    fn slot_bounds_saturate() {
        assert_eq!(slot_bounds(i64::MAX).1, i64::MAX);
        assert_eq!(slot_bounds(i64::MIN).0, i64::MIN);
    }

    #[test]
    fn party_must_fit() {
        assert!(check_party_size(4, 4).is_ok());
        assert_eq!(
            check_party_size(5, 4).unwrap_err().code,
            ErrorCode::TableCapacityExceeded
        );
    }
}
